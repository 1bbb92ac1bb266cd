//! PubMed record transformation: parsed XML → Paper

use chrono::NaiveDate;

use autolit_core::normalize::{clean_doi, clean_pmid, clean_text};
use autolit_core::paper::Paper;

use crate::parser::{Author, PartialDate, PubmedArticle};

/// Full name in display order, with a three-way fallback: fore name,
/// then initials, then last name alone.
fn author_name(author: &Author) -> String {
    let last = clean_text(author.last_name.as_deref().unwrap_or(""));
    let fore = clean_text(author.fore_name.as_deref().unwrap_or(""));
    let initials = clean_text(author.initials.as_deref().unwrap_or(""));

    if !fore.is_empty() && !last.is_empty() {
        format!("{fore} {last}")
    } else if !initials.is_empty() && !last.is_empty() {
        format!("{initials} {last}")
    } else {
        last
    }
}

/// Missing month/day default to January/1st; an unbuildable date is dropped.
fn resolve_date(candidate: &PartialDate) -> Option<NaiveDate> {
    let year = candidate.year?;
    NaiveDate::from_ymd_opt(
        year,
        candidate.month.unwrap_or(1),
        candidate.day.unwrap_or(1),
    )
}

impl PubmedArticle {
    /// First populated date wins: electronic article date, then the journal
    /// issue date, then the MEDLINE completion and revision dates.
    pub fn publication_date(&self) -> Option<NaiveDate> {
        [
            &self.article_date,
            &self.journal_pub_date,
            &self.date_completed,
            &self.date_revised,
        ]
        .into_iter()
        .flatten()
        .filter(|d| d.is_populated())
        .find_map(resolve_date)
    }

    pub fn into_paper(self) -> Paper {
        let pmid = clean_pmid(&self.pmid);
        let url = if pmid.is_empty() {
            String::new()
        } else {
            format!("https://pubmed.ncbi.nlm.nih.gov/{pmid}/")
        };

        let publication_date = self.publication_date();

        let authors: Vec<String> = self
            .authors
            .iter()
            .map(author_name)
            .filter(|name| !name.is_empty())
            .collect();

        Paper {
            title: clean_text(self.title.as_deref().unwrap_or("")),
            abstract_text: clean_text(self.abstract_text.as_deref().unwrap_or("")),
            authors,
            journal: clean_text(self.journal_title.as_deref().unwrap_or("")),
            publication_date,
            doi: clean_doi(self.doi.as_deref().unwrap_or("")),
            pmid,
            url,
            keywords: self.keywords.iter().map(|k| clean_text(k)).collect(),
            mesh_terms: self.mesh_terms.iter().map(|m| clean_text(m)).collect(),
            source: crate::SOURCE_TAG.to_string(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article() -> PubmedArticle {
        PubmedArticle {
            pmid: "36000001".to_string(),
            doi: Some("10.1136/gutjnl-2023-1".to_string()),
            title: Some("Microbiome shifts".to_string()),
            abstract_text: Some("BACKGROUND: text.".to_string()),
            journal_title: Some("Gut".to_string()),
            authors: vec![
                Author {
                    last_name: Some("Smith".to_string()),
                    fore_name: Some("Jane".to_string()),
                    initials: Some("J".to_string()),
                },
                Author {
                    last_name: Some("Doe".to_string()),
                    fore_name: None,
                    initials: Some("A".to_string()),
                },
                Author {
                    last_name: Some("Solo".to_string()),
                    fore_name: None,
                    initials: None,
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn author_name_fallback_chain() {
        let a = article();
        let p = a.into_paper();
        assert_eq!(p.authors, vec!["Jane Smith", "A Doe", "Solo"]);
    }

    #[test]
    fn pmid_drives_url() {
        let p = article().into_paper();
        assert_eq!(p.pmid, "36000001");
        assert_eq!(p.url, "https://pubmed.ncbi.nlm.nih.gov/36000001/");
        assert_eq!(p.source, "pubmed");
    }

    #[test]
    fn date_priority_order() {
        let mut a = article();
        a.date_revised = Some(PartialDate {
            year: Some(2024),
            month: Some(5),
            day: Some(1),
        });
        a.journal_pub_date = Some(PartialDate {
            year: Some(2023),
            month: Some(3),
            day: None,
        });
        // journal date beats the revision date
        assert_eq!(
            a.publication_date(),
            NaiveDate::from_ymd_opt(2023, 3, 1)
        );

        a.article_date = Some(PartialDate {
            year: Some(2023),
            month: Some(2),
            day: Some(15),
        });
        assert_eq!(
            a.publication_date(),
            NaiveDate::from_ymd_opt(2023, 2, 15)
        );
    }

    #[test]
    fn year_only_date_defaults_to_january_first() {
        let mut a = article();
        a.journal_pub_date = Some(PartialDate {
            year: Some(2020),
            month: None,
            day: None,
        });
        assert_eq!(a.publication_date(), NaiveDate::from_ymd_opt(2020, 1, 1));
    }

    #[test]
    fn no_dates_yields_none() {
        assert_eq!(article().publication_date(), None);
    }
}
