//! Autolit Europe PMC - Europe PMC source adapter
//!
//! Single-phase search against the Europe PMC REST API with
//! `resultType=core`, so each hit already carries abstract, authors and
//! MeSH data.

use std::time::Duration;

use anyhow::Context;
use serde_json::Value;

use autolit_core::diseases::{self, Disease};
use autolit_core::http::{RateLimiter, RetryPolicy, get_json, with_retry};
use autolit_core::paper::Paper;

pub mod transform;

pub use transform::ResultRow;

/// Source tag stamped on every record this adapter produces.
pub const SOURCE_TAG: &str = "europe_pmc";

const BASE_URL: &str = "https://www.ebi.ac.uk/europepmc/webservices/rest/search";

/// Europe PMC asks for at most one request per second from anonymous users.
const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// API-side cap on pageSize.
const PAGE_SIZE_CAP: usize = 1000;

/// Quoted OR-query over all search terms and synonyms.
pub fn build_query(disease: &Disease) -> String {
    format!("({})", disease.format_query("OR"))
}

/// Europe PMC client owning its throttle state.
pub struct Client {
    base_url: String,
    limiter: RateLimiter,
    retry: RetryPolicy,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    pub fn new() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            limiter: RateLimiter::new(MIN_INTERVAL),
            retry: RetryPolicy::default(),
        }
    }

    fn search(&mut self, query: &str, max_results: usize) -> anyhow::Result<Vec<Value>> {
        let params = [
            ("query", query.to_string()),
            ("resultType", "core".to_string()),
            ("pageSize", max_results.min(PAGE_SIZE_CAP).to_string()),
            ("format", "json".to_string()),
            ("synonym", "true".to_string()),
            ("sort", "relevance".to_string()),
        ];

        let retry = self.retry;
        let limiter = &mut self.limiter;
        let base_url = &self.base_url;
        let body = with_retry(&retry, "europe_pmc search", || {
            limiter.wait();
            get_json(base_url, &params)
        })
        .context("Europe PMC search failed")?;

        Ok(result_items(&body))
    }

    /// Fetch and parse papers for one disease. Items that fail to parse or
    /// lack title/abstract are skipped, and a search that still fails after
    /// retries skips the disease; neither is fatal.
    pub fn scrape_disease(
        &mut self,
        disease: &Disease,
        max_results: usize,
    ) -> anyhow::Result<Vec<Paper>> {
        let query = build_query(disease);
        let items = match self.search(&query, max_results) {
            Ok(items) => items,
            Err(e) => {
                log::warn!("europe_pmc: {}: {e:#}, skipping disease", disease.key);
                return Ok(Vec::new());
            }
        };

        let mut papers = Vec::new();
        for item in items {
            let row: ResultRow = match serde_json::from_value(item) {
                Ok(row) => row,
                Err(e) => {
                    log::debug!("europe_pmc: skipping unparseable result: {e}");
                    continue;
                }
            };
            let mut paper = row.into_paper();
            if paper.title.is_empty() || paper.abstract_text.is_empty() {
                continue;
            }
            paper.add_disease_relevance(disease.key);
            papers.push(paper);
        }
        papers.truncate(max_results);

        log::info!("europe_pmc: {} papers for {}", papers.len(), disease.key);
        Ok(papers)
    }

    /// Sequentially scrape several diseases; unknown keys are skipped.
    pub fn scrape_diseases(
        &mut self,
        disease_keys: &[String],
        max_results_per_disease: usize,
    ) -> anyhow::Result<Vec<Paper>> {
        let mut all = Vec::new();
        for key in disease_keys {
            let Some(disease) = diseases::get(key) else {
                log::warn!("europe_pmc: unknown disease key {key}, skipping");
                continue;
            };
            all.extend(self.scrape_disease(disease, max_results_per_disease)?);
        }
        Ok(all)
    }
}

/// `resultList.result` is a list, but a single-hit response may inline one
/// object; coerce either shape to a vec.
fn result_items(body: &Value) -> Vec<Value> {
    match &body["resultList"]["result"] {
        Value::Array(items) => items.clone(),
        Value::Null => Vec::new(),
        single => vec![single.clone()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_wraps_or_terms_in_parens() {
        let d = diseases::get("crohns").unwrap();
        let q = build_query(d);
        assert!(q.starts_with("(\"crohn's disease\" OR "));
        assert!(q.ends_with(")"));
    }

    #[test]
    fn result_items_handles_list_scalar_and_missing() {
        let list = json!({"resultList": {"result": [{"title": "a"}, {"title": "b"}]}});
        assert_eq!(result_items(&list).len(), 2);

        let single = json!({"resultList": {"result": {"title": "a"}}});
        assert_eq!(result_items(&single).len(), 1);

        let missing = json!({"version": "6.6"});
        assert!(result_items(&missing).is_empty());
    }

    #[test]
    fn failed_search_skips_disease_without_error() {
        let mut client = Client {
            base_url: "http://127.0.0.1:9/search".to_string(),
            limiter: RateLimiter::new(Duration::ZERO),
            retry: RetryPolicy {
                max_retries: 0,
                backoff: Duration::from_millis(1),
            },
        };
        let keys = vec!["crohns".to_string(), "systemic_lupus".to_string()];
        let papers = client.scrape_diseases(&keys, 5).unwrap();
        assert!(papers.is_empty());
    }
}
