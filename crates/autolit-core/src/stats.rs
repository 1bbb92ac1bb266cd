//! Aggregate statistics over a paper collection

use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::paper::Paper;

/// Identifier coverage as percentages of the total.
#[derive(Debug, Clone, Serialize, Default)]
pub struct Coverage {
    pub doi_percentage: f64,
    pub pmid_percentage: f64,
}

/// Earliest and latest known publication dates.
#[derive(Debug, Clone, Serialize, Default)]
pub struct DateRange {
    pub earliest: Option<NaiveDate>,
    pub latest: Option<NaiveDate>,
}

/// Collection-level statistics embedded in the run summary.
#[derive(Debug, Clone, Serialize, Default)]
pub struct CollectionStats {
    pub total_papers: usize,
    pub papers_with_doi: usize,
    pub papers_with_pmid: usize,
    pub coverage: Coverage,
    pub date_range: DateRange,
    /// Record count per source tag.
    pub sources: Vec<(String, usize)>,
    /// Ten most frequent journals, descending.
    pub top_journals: Vec<(String, usize)>,
}

const TOP_JOURNALS: usize = 10;

/// Compute statistics for a collection. Empty input yields all-default.
pub fn collection_stats(papers: &[Paper]) -> CollectionStats {
    if papers.is_empty() {
        return CollectionStats::default();
    }

    let total = papers.len();
    let with_doi = papers.iter().filter(|p| !p.doi.is_empty()).count();
    let with_pmid = papers.iter().filter(|p| !p.pmid.is_empty()).count();

    let dates: Vec<NaiveDate> = papers.iter().filter_map(|p| p.publication_date).collect();
    let date_range = DateRange {
        earliest: dates.iter().min().copied(),
        latest: dates.iter().max().copied(),
    };

    let pct = |n: usize| (n as f64 / total as f64 * 10_000.0).round() / 100.0;

    CollectionStats {
        total_papers: total,
        papers_with_doi: with_doi,
        papers_with_pmid: with_pmid,
        coverage: Coverage {
            doi_percentage: pct(with_doi),
            pmid_percentage: pct(with_pmid),
        },
        date_range,
        sources: count_by(papers.iter().map(|p| p.source.as_str()), None),
        top_journals: count_by(
            papers.iter().map(|p| p.journal.as_str()),
            Some(TOP_JOURNALS),
        ),
    }
}

/// Frequency count, descending, with ties broken by name for stable output.
fn count_by<'a>(values: impl Iterator<Item = &'a str>, limit: Option<usize>) -> Vec<(String, usize)> {
    let mut counts: FxHashMap<&str, usize> = FxHashMap::default();
    for v in values {
        let key = if v.is_empty() { "unknown" } else { v };
        *counts.entry(key).or_insert(0) += 1;
    }
    let mut pairs: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(k, n)| (k.to_string(), n))
        .collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    if let Some(limit) = limit {
        pairs.truncate(limit);
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper(journal: &str, source: &str, doi: &str, date: Option<(i32, u32, u32)>) -> Paper {
        Paper {
            title: "t".to_string(),
            abstract_text: "a".to_string(),
            journal: journal.to_string(),
            source: source.to_string(),
            doi: doi.to_string(),
            publication_date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            ..Default::default()
        }
    }

    #[test]
    fn empty_collection_is_all_zero() {
        let stats = collection_stats(&[]);
        assert_eq!(stats.total_papers, 0);
        assert!(stats.date_range.earliest.is_none());
    }

    #[test]
    fn coverage_percentages() {
        let papers = vec![
            paper("J", "pubmed", "10.1/a", None),
            paper("J", "pubmed", "", None),
            paper("K", "openalex", "10.1/b", None),
            paper("K", "openalex", "10.1/c", None),
        ];
        let stats = collection_stats(&papers);
        assert_eq!(stats.papers_with_doi, 3);
        assert_eq!(stats.coverage.doi_percentage, 75.0);
        assert_eq!(stats.coverage.pmid_percentage, 0.0);
    }

    #[test]
    fn date_range_ignores_unknown() {
        let papers = vec![
            paper("J", "s", "", Some((2019, 3, 1))),
            paper("J", "s", "", None),
            paper("J", "s", "", Some((2023, 7, 15))),
        ];
        let stats = collection_stats(&papers);
        assert_eq!(stats.date_range.earliest, NaiveDate::from_ymd_opt(2019, 3, 1));
        assert_eq!(stats.date_range.latest, NaiveDate::from_ymd_opt(2023, 7, 15));
    }

    #[test]
    fn top_journals_sorted_and_capped() {
        let mut papers = Vec::new();
        for i in 0..12 {
            for _ in 0..=i {
                papers.push(paper(&format!("J{i:02}"), "s", "", None));
            }
        }
        let stats = collection_stats(&papers);
        assert_eq!(stats.top_journals.len(), 10);
        assert_eq!(stats.top_journals[0].0, "J11");
        assert_eq!(stats.top_journals[0].1, 12);
    }

    #[test]
    fn empty_journal_counts_as_unknown() {
        let stats = collection_stats(&[paper("", "s", "", None)]);
        assert_eq!(stats.top_journals[0].0, "unknown");
    }
}
