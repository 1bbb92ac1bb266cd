//! OpenAlex work transformation: JSON → Paper
//!
//! OpenAlex ships abstracts as inverted indexes (word → token positions)
//! for legal reasons; the plaintext is rebuilt here by position before
//! normalization.

use serde::Deserialize;
use serde_json::{Map, Value};

use autolit_core::normalize::{clean_doi, clean_text, normalize_date};
use autolit_core::paper::Paper;

use crate::SOURCE_TAG;

/// Concepts below this relevance score are too generic to keep as keywords.
const CONCEPT_SCORE_MIN: f64 = 0.3;

/// OpenAlex Work JSON structure (the fields this pipeline consumes).
#[derive(Debug, Default, Deserialize)]
pub struct WorkRow {
    /// OpenAlex ID (e.g., "https://openalex.org/W2741809807")
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub doi: Option<String>,

    #[serde(default)]
    pub publication_date: Option<String>,

    /// Abstract as inverted index
    #[serde(default)]
    pub abstract_inverted_index: Option<Map<String, Value>>,

    #[serde(default)]
    pub authorships: Vec<Authorship>,

    #[serde(default)]
    pub primary_location: Option<Location>,

    #[serde(default)]
    pub concepts: Vec<Concept>,

    #[serde(default)]
    pub ids: Option<ExternalIds>,

    #[serde(default)]
    pub cited_by_count: i64,

    #[serde(default)]
    pub open_access: Option<OpenAccessInfo>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Authorship {
    #[serde(default)]
    pub author: Option<Author>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub source: Option<Source>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Concept {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub score: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExternalIds {
    #[serde(default)]
    pub pmid: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OpenAccessInfo {
    #[serde(default)]
    pub is_oa: bool,
    #[serde(default)]
    pub oa_url: Option<String>,
}

/// Rebuild plaintext from an inverted index by ascending token position.
pub fn decode_inverted_index(index: &Map<String, Value>) -> String {
    let mut positions: Vec<(u64, &str)> = Vec::new();
    for (word, occurrences) in index {
        let Some(arr) = occurrences.as_array() else {
            continue;
        };
        positions.extend(
            arr.iter()
                .filter_map(Value::as_u64)
                .map(|pos| (pos, word.as_str())),
        );
    }
    positions.sort_unstable_by_key(|&(pos, _)| pos);

    let words: Vec<&str> = positions.into_iter().map(|(_, word)| word).collect();
    words.join(" ")
}

impl WorkRow {
    pub fn into_paper(self) -> Paper {
        let abstract_text = self
            .abstract_inverted_index
            .as_ref()
            .map(|idx| clean_text(&decode_inverted_index(idx)))
            .unwrap_or_default();

        let authors: Vec<String> = self
            .authorships
            .iter()
            .filter_map(|a| a.author.as_ref()?.display_name.as_deref())
            .map(clean_text)
            .filter(|name| !name.is_empty())
            .collect();

        let keywords: Vec<String> = self
            .concepts
            .iter()
            .filter(|c| c.score > CONCEPT_SCORE_MIN)
            .filter_map(|c| c.display_name.as_deref())
            .map(clean_text)
            .filter(|k| !k.is_empty())
            .collect();

        // OpenAlex serves DOIs as full https://doi.org/ URLs
        let doi = clean_doi(self.doi.as_deref().unwrap_or(""));
        // ids.pmid is a full https://pubmed.ncbi.nlm.nih.gov/ URL
        let pmid = self
            .ids
            .as_ref()
            .and_then(|ids| ids.pmid.as_deref())
            .and_then(|s| s.trim_end_matches('/').rsplit('/').next())
            .map(autolit_core::normalize::clean_pmid)
            .unwrap_or_default();

        let url = if !self.id.is_empty() {
            self.id.clone()
        } else if !doi.is_empty() {
            format!("https://doi.org/{doi}")
        } else {
            String::new()
        };

        let mut metadata = serde_json::Map::new();
        metadata.insert("openalex_id".into(), self.id.clone().into());
        metadata.insert("citation_count".into(), self.cited_by_count.into());
        if let Some(oa) = &self.open_access {
            metadata.insert("is_oa".into(), oa.is_oa.into());
            metadata.insert(
                "oa_url".into(),
                oa.oa_url.clone().unwrap_or_default().into(),
            );
        }

        Paper {
            title: clean_text(self.title.as_deref().unwrap_or("")),
            abstract_text,
            authors,
            journal: clean_text(
                self.primary_location
                    .and_then(|l| l.source)
                    .and_then(|s| s.display_name)
                    .as_deref()
                    .unwrap_or(""),
            ),
            publication_date: self.publication_date.as_deref().and_then(normalize_date),
            doi,
            pmid,
            url,
            keywords,
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
    fn decode_empty_index() {
        assert_eq!(decode_inverted_index(&Map::new()), "");
    }

    #[test]
    fn decode_orders_by_position() {
        let index = json!({"world": [1], "Hello": [0]});
        assert_eq!(
            decode_inverted_index(index.as_object().unwrap()),
            "Hello world"
        );
    }

    #[test]
    fn decode_repeated_word() {
        let index = json!({"the": [0, 2], "cat": [1], "sat": [3]});
        assert_eq!(
            decode_inverted_index(index.as_object().unwrap()),
            "the cat the sat"
        );
    }

    #[test]
    fn work_maps_to_paper() {
        let row: WorkRow = serde_json::from_value(json!({
            "id": "https://openalex.org/W123",
            "title": "Lupus nephritis outcomes",
            "doi": "https://doi.org/10.1002/art.12345",
            "publication_date": "2023-02-10",
            "abstract_inverted_index": {"Outcomes": [0], "improved": [1]},
            "authorships": [
                {"author": {"display_name": "Ana Pérez"}},
                {"author": {"display_name": ""}},
                {}
            ],
            "primary_location": {"source": {"display_name": "Arthritis & Rheumatology"}},
            "concepts": [
                {"display_name": "Lupus nephritis", "score": 0.82},
                {"display_name": "Medicine", "score": 0.12}
            ],
            "ids": {"pmid": "https://pubmed.ncbi.nlm.nih.gov/36000000"},
            "cited_by_count": 12,
            "open_access": {"is_oa": true, "oa_url": "https://example.org/pdf"}
        }))
        .unwrap();

        let p = row.into_paper();
        assert_eq!(p.title, "Lupus nephritis outcomes");
        assert_eq!(p.abstract_text, "Outcomes improved");
        assert_eq!(p.authors, vec!["Ana Pérez"]);
        assert_eq!(p.journal, "Arthritis & Rheumatology");
        assert_eq!(p.publication_date, NaiveDate::from_ymd_opt(2023, 2, 10));
        assert_eq!(p.doi, "10.1002/art.12345");
        // PMID arrives as a URL; only the trailing identifier is kept
        assert_eq!(p.pmid, "36000000");
        assert_eq!(p.url, "https://openalex.org/W123");
        assert_eq!(p.keywords, vec!["Lupus nephritis"]);
        assert_eq!(p.metadata["citation_count"], json!(12));
        assert_eq!(p.metadata["is_oa"], json!(true));
    }

    #[test]
    fn low_score_concepts_dropped() {
        let row: WorkRow = serde_json::from_value(json!({
            "id": "https://openalex.org/W1",
            "concepts": [{"display_name": "Biology", "score": 0.3}]
        }))
        .unwrap();
        // 0.3 is not strictly above the threshold
        assert!(row.into_paper().keywords.is_empty());
    }

    #[test]
    fn missing_abstract_index_yields_empty() {
        let row: WorkRow =
            serde_json::from_value(json!({"id": "https://openalex.org/W1", "title": "T"}))
                .unwrap();
        let p = row.into_paper();
        assert!(p.abstract_text.is_empty());
        assert!(!p.is_valid());
    }
}
