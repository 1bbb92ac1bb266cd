//! Europe PMC search result transformation: JSON → Paper

use serde::Deserialize;
use serde_json::Value;

use autolit_core::normalize::{
    clean_doi, clean_pmid, clean_text, extract_authors, extract_keywords, normalize_date,
};
use autolit_core::paper::Paper;

use crate::SOURCE_TAG;

/// One `resultList.result` entry from a `resultType=core` search.
#[derive(Debug, Default, Deserialize)]
pub struct ResultRow {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(rename = "abstractText", default)]
    pub abstract_text: Option<String>,

    /// `authorList.author` is usually an array of objects but can
    /// degenerate to a single object; kept raw and resolved by the
    /// polymorphic extractor.
    #[serde(rename = "authorList", default)]
    pub author_list: Option<AuthorList>,

    #[serde(rename = "journalInfo", default)]
    pub journal_info: Option<JournalInfo>,

    #[serde(rename = "firstPublicationDate", default)]
    pub first_publication_date: Option<String>,

    #[serde(default)]
    pub pmid: Option<String>,

    #[serde(default)]
    pub doi: Option<String>,

    #[serde(rename = "keywordList", default)]
    pub keyword_list: Option<KeywordList>,

    #[serde(rename = "meshHeadingList", default)]
    pub mesh_heading_list: Option<MeshHeadingList>,

    #[serde(rename = "citedByCount", default)]
    pub cited_by_count: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuthorList {
    #[serde(default)]
    pub author: Value,
}

#[derive(Debug, Default, Deserialize)]
pub struct JournalInfo {
    #[serde(default)]
    pub journal: Option<Journal>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Journal {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct KeywordList {
    #[serde(default)]
    pub keyword: Value,
}

#[derive(Debug, Default, Deserialize)]
pub struct MeshHeadingList {
    #[serde(rename = "meshHeading", default)]
    pub mesh_heading: Vec<MeshHeading>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MeshHeading {
    #[serde(rename = "descriptorName", default)]
    pub descriptor_name: Option<String>,
}

impl ResultRow {
    pub fn into_paper(self) -> Paper {
        let pmid = clean_pmid(self.pmid.as_deref().unwrap_or(""));
        let url = if pmid.is_empty() {
            String::new()
        } else {
            format!("https://europepmc.org/article/MED/{pmid}")
        };

        let mut metadata = serde_json::Map::new();
        if let Some(n) = self.cited_by_count {
            metadata.insert("cited_by_count".into(), n.into());
        }

        Paper {
            title: clean_text(self.title.as_deref().unwrap_or("")),
            abstract_text: clean_text(self.abstract_text.as_deref().unwrap_or("")),
            authors: self
                .author_list
                .map(|l| extract_authors(&l.author))
                .unwrap_or_default(),
            journal: clean_text(
                self.journal_info
                    .and_then(|j| j.journal)
                    .and_then(|j| j.title)
                    .as_deref()
                    .unwrap_or(""),
            ),
            publication_date: self
                .first_publication_date
                .as_deref()
                .and_then(normalize_date),
            doi: clean_doi(self.doi.as_deref().unwrap_or("")),
            pmid,
            url,
            keywords: self
                .keyword_list
                .map(|l| extract_keywords(&l.keyword))
                .unwrap_or_default(),
            mesh_terms: self
                .mesh_heading_list
                .map(|l| {
                    l.mesh_heading
                        .into_iter()
                        .filter_map(|h| h.descriptor_name)
                        .map(|t| clean_text(&t))
                        .filter(|t| !t.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            source: SOURCE_TAG.to_string(),
            metadata,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn full_result_maps_all_fields() {
        let row: ResultRow = serde_json::from_value(json!({
            "title": "Gut microbiome in  Crohn's disease",
            "abstractText": "We studied the gut.",
            "authorList": {"author": [{"fullName": "Smith J"}, {"fullName": "Doe A"}]},
            "journalInfo": {"journal": {"title": "Gut"}},
            "firstPublicationDate": "2022-11-03",
            "pmid": "36123456",
            "doi": "10.1136/gutjnl-2022-1",
            "keywordList": {"keyword": ["IBD", "microbiome"]},
            "meshHeadingList": {"meshHeading": [{"descriptorName": "Crohn Disease"}]},
            "citedByCount": 7
        }))
        .unwrap();

        let p = row.into_paper();
        assert_eq!(p.title, "Gut microbiome in Crohn's disease");
        assert_eq!(p.authors, vec!["Smith J", "Doe A"]);
        assert_eq!(p.journal, "Gut");
        assert_eq!(p.publication_date, NaiveDate::from_ymd_opt(2022, 11, 3));
        assert_eq!(p.doi, "10.1136/gutjnl-2022-1");
        assert_eq!(p.pmid, "36123456");
        assert_eq!(p.url, "https://europepmc.org/article/MED/36123456");
        assert_eq!(p.mesh_terms, vec!["Crohn Disease"]);
        assert_eq!(p.metadata["cited_by_count"], json!(7));
        assert_eq!(p.source, "europe_pmc");
        assert!(p.is_valid());
    }

    #[test]
    fn sparse_result_constructs_without_error() {
        let row: ResultRow = serde_json::from_value(json!({"title": "Only a title"})).unwrap();
        let p = row.into_paper();
        assert_eq!(p.title, "Only a title");
        assert!(p.abstract_text.is_empty());
        assert!(p.publication_date.is_none());
        assert!(!p.is_valid());
    }

    #[test]
    fn invalid_doi_becomes_empty() {
        let row: ResultRow =
            serde_json::from_value(json!({"title": "T", "doi": "not-a-doi"})).unwrap();
        assert_eq!(row.into_paper().doi, "");
    }
}
