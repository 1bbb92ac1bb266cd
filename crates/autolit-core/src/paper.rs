//! Canonical paper record
//!
//! Every adapter converges on this shape. Records are cheap to construct
//! (missing fields default to empty/absent) and every transform produces a
//! new record; nothing is partially overwritten in place.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Normalized paper metadata from any source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paper {
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub authors: Vec<String>,
    pub journal: String,
    /// ISO-8601 calendar date; `None` means unknown, never an error.
    pub publication_date: Option<NaiveDate>,
    /// Validated `10.<digits>/...` form, or empty.
    pub doi: String,
    /// All-digit identifier, or empty.
    pub pmid: String,
    pub url: String,
    pub keywords: Vec<String>,
    pub mesh_terms: Vec<String>,
    /// Tag of the adapter that produced this record.
    pub source: String,
    /// Disease keys this record matched, first-insertion order, no repeats.
    pub disease_relevance: Vec<String>,
    /// Adapter-specific extras.
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub scraped_at: DateTime<Utc>,
}

impl Default for Paper {
    fn default() -> Self {
        Self {
            title: String::new(),
            abstract_text: String::new(),
            authors: Vec::new(),
            journal: String::new(),
            publication_date: None,
            doi: String::new(),
            pmid: String::new(),
            url: String::new(),
            keywords: Vec::new(),
            mesh_terms: Vec::new(),
            source: String::new(),
            disease_relevance: Vec::new(),
            metadata: Map::new(),
            scraped_at: Utc::now(),
        }
    }
}

impl Paper {
    /// A record is usable only with a non-blank title and abstract.
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty() && !self.abstract_text.trim().is_empty()
    }

    /// Derived dedup key: DOI, else PMID, else the normalized title.
    pub fn identity(&self) -> String {
        if !self.doi.is_empty() {
            format!("doi:{}", self.doi)
        } else if !self.pmid.is_empty() {
            format!("pmid:{}", self.pmid)
        } else {
            self.title.trim().to_lowercase()
        }
    }

    /// Record that this paper matched a disease. Adding the same key twice
    /// is a no-op; first-insertion order is preserved.
    pub fn add_disease_relevance(&mut self, key: &str) {
        if !self.disease_relevance.iter().any(|d| d == key) {
            self.disease_relevance.push(key.to_string());
        }
    }

    /// Combine two records that share an identity into a new record.
    ///
    /// List fields become the order-preserving union; empty scalars on
    /// `self` are filled from `other`; metadata merges key-wise with
    /// `other` winning on collision.
    pub fn merged(&self, other: &Paper) -> Paper {
        let mut out = self.clone();

        union_into(&mut out.authors, &other.authors);
        union_into(&mut out.keywords, &other.keywords);
        union_into(&mut out.mesh_terms, &other.mesh_terms);
        union_into(&mut out.disease_relevance, &other.disease_relevance);

        fill_empty(&mut out.title, &other.title);
        fill_empty(&mut out.abstract_text, &other.abstract_text);
        fill_empty(&mut out.journal, &other.journal);
        fill_empty(&mut out.doi, &other.doi);
        fill_empty(&mut out.pmid, &other.pmid);
        fill_empty(&mut out.url, &other.url);
        fill_empty(&mut out.source, &other.source);
        if out.publication_date.is_none() {
            out.publication_date = other.publication_date;
        }

        for (k, v) in &other.metadata {
            out.metadata.insert(k.clone(), v.clone());
        }

        out
    }
}

fn union_into(dst: &mut Vec<String>, src: &[String]) {
    for item in src {
        if !dst.contains(item) {
            dst.push(item.clone());
        }
    }
}

fn fill_empty(dst: &mut String, src: &str) {
    if dst.is_empty() && !src.is_empty() {
        *dst = src.to_string();
    }
}

/// Keep only records passing [`Paper::is_valid`].
pub fn filter_valid(papers: Vec<Paper>) -> Vec<Paper> {
    papers.into_iter().filter(Paper::is_valid).collect()
}

/// Collapse to one record per identity, keeping the first seen.
///
/// This is dedup-by-first-seen; [`Paper::merged`] is a separate, opt-in
/// operation.
pub fn deduplicate(papers: Vec<Paper>) -> Vec<Paper> {
    let mut seen: FxHashSet<String> = FxHashSet::default();
    papers
        .into_iter()
        .filter(|p| seen.insert(p.identity()))
        .collect()
}

/// Stable sort by publication date. Records with unknown dates always sort
/// last, in both directions.
pub fn sort_by_date(papers: &mut [Paper], descending: bool) {
    papers.sort_by(|a, b| match (a.publication_date, b.publication_date) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => {
            if descending {
                y.cmp(&x)
            } else {
                x.cmp(&y)
            }
        }
    });
}

/// Records tagged as relevant to one disease.
pub fn by_disease<'a>(papers: &'a [Paper], key: &str) -> Vec<&'a Paper> {
    papers
        .iter()
        .filter(|p| p.disease_relevance.iter().any(|d| d == key))
        .collect()
}

/// Records produced by one adapter.
pub fn by_source<'a>(papers: &'a [Paper], source: &str) -> Vec<&'a Paper> {
    papers.iter().filter(|p| p.source == source).collect()
}
