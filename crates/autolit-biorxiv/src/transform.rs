//! bioRxiv/medRxiv detail transformation: JSON → Paper

use serde::Deserialize;

use autolit_core::normalize::{clean_doi, clean_text, normalize_date};
use autolit_core::paper::Paper;

/// One `collection` entry from the details endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct CollectionRow {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(rename = "abstract", default)]
    pub abstract_text: Option<String>,

    /// Semicolon-delimited "Last, F." names.
    #[serde(default)]
    pub authors: Option<String>,

    #[serde(default)]
    pub server: Option<String>,

    #[serde(default)]
    pub date: Option<String>,

    #[serde(default)]
    pub doi: Option<String>,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub version: Option<String>,
}

impl CollectionRow {
    pub fn into_paper(self) -> Paper {
        let server = self.server.as_deref().unwrap_or("").to_lowercase();

        // Names contain commas ("Smith, J."), so only the semicolon is a
        // safe author separator here.
        let authors: Vec<String> = self
            .authors
            .as_deref()
            .unwrap_or("")
            .split(';')
            .map(clean_text)
            .filter(|name| !name.is_empty())
            .collect();

        let doi = clean_doi(self.doi.as_deref().unwrap_or(""));
        let url = if doi.is_empty() {
            String::new()
        } else {
            format!("https://doi.org/{doi}")
        };

        let category = clean_text(self.category.as_deref().unwrap_or(""));
        let keywords = if category.is_empty() {
            Vec::new()
        } else {
            vec![category.clone()]
        };

        let (journal, source) = if server.is_empty() {
            ("bioRxiv/medRxiv".to_string(), "biorxiv_preprint".to_string())
        } else {
            (capitalize(&server), format!("{server}_preprint"))
        };

        let mut metadata = serde_json::Map::new();
        metadata.insert("server".into(), server.into());
        metadata.insert("category".into(), category.into());
        metadata.insert(
            "version".into(),
            self.version.unwrap_or_default().into(),
        );
        metadata.insert("type".into(), "preprint".into());

        Paper {
            title: clean_text(self.title.as_deref().unwrap_or("")),
            abstract_text: clean_text(self.abstract_text.as_deref().unwrap_or("")),
            authors,
            journal,
            publication_date: self.date.as_deref().and_then(normalize_date),
            doi,
            url,
            keywords,
            source,
            metadata,
            ..Default::default()
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
