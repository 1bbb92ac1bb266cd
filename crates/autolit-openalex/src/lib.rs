//! Autolit OpenAlex - OpenAlex source adapter
//!
//! Paginated search over the works endpoint. Registering a contact email
//! (`mailto`) moves requests into the polite pool with higher limits.

use std::time::Duration;

use anyhow::Context;
use serde_json::Value;

use autolit_core::diseases::{self, Disease};
use autolit_core::http::{RateLimiter, RetryPolicy, get_json, with_retry};
use autolit_core::paper::Paper;

pub mod transform;

pub use transform::{WorkRow, decode_inverted_index};

/// Source tag stamped on every record this adapter produces.
pub const SOURCE_TAG: &str = "openalex";

const WORKS_URL: &str = "https://api.openalex.org/works";

/// Polite pool allows ~10 req/s.
const MIN_INTERVAL: Duration = Duration::from_millis(100);

/// API-side cap on per-page.
const PER_PAGE_CAP: usize = 200;

/// Pagination ceiling per disease, independent of max_results.
const MAX_PAGES: usize = 10;

/// Quoted OR-query over all search terms and synonyms.
pub fn build_query(disease: &Disease) -> String {
    disease.format_query("OR")
}

/// OpenAlex client owning its throttle state and contact email.
pub struct Client {
    works_url: String,
    email: Option<String>,
    limiter: RateLimiter,
    retry: RetryPolicy,
}

impl Client {
    pub fn new(email: Option<String>) -> Self {
        Self {
            works_url: WORKS_URL.to_string(),
            email,
            limiter: RateLimiter::new(MIN_INTERVAL),
            retry: RetryPolicy::default(),
        }
    }

    fn fetch_page(
        &mut self,
        query: &str,
        per_page: usize,
        page: usize,
    ) -> anyhow::Result<Value> {
        let mut params = vec![
            ("search", query.to_string()),
            ("per-page", per_page.to_string()),
            ("page", page.to_string()),
            ("sort", "relevance_score:desc".to_string()),
            ("filter", "type:article".to_string()),
        ];
        if let Some(email) = &self.email {
            params.push(("mailto", email.clone()));
        }

        let retry = self.retry;
        let limiter = &mut self.limiter;
        let works_url = &self.works_url;
        with_retry(&retry, "openalex search", || {
            limiter.wait();
            get_json(works_url, &params)
        })
        .with_context(|| format!("OpenAlex search failed on page {page}"))
    }

    /// Page through results until `max_results` collected, the page ceiling
    /// is hit, or the API's reported total is covered.
    ///
    /// A page that still fails after retries ends pagination; the pages
    /// already collected are kept.
    pub fn scrape_disease(
        &mut self,
        disease: &Disease,
        max_results: usize,
    ) -> anyhow::Result<Vec<Paper>> {
        let query = build_query(disease);
        let per_page = max_results.clamp(1, PER_PAGE_CAP);

        let mut papers = Vec::new();
        let mut page = 1;
        while papers.len() < max_results && page <= MAX_PAGES {
            let body = match self.fetch_page(&query, per_page, page) {
                Ok(body) => body,
                Err(e) => {
                    log::warn!(
                        "openalex: {}: {e:#}, keeping {} papers",
                        disease.key,
                        papers.len()
                    );
                    break;
                }
            };
            let Some(results) = body["results"].as_array() else {
                break;
            };
            if results.is_empty() {
                break;
            }

            for item in results {
                let row: WorkRow = match serde_json::from_value(item.clone()) {
                    Ok(row) => row,
                    Err(e) => {
                        log::debug!("openalex: skipping unparseable work: {e}");
                        continue;
                    }
                };
                let mut paper = row.into_paper();
                if paper.title.is_empty() {
                    continue;
                }
                paper.add_disease_relevance(disease.key);
                papers.push(paper);
            }

            let total = body["meta"]["count"].as_u64().unwrap_or(0) as usize;
            if page * per_page >= total {
                break;
            }
            page += 1;
        }
        papers.truncate(max_results);

        log::info!("openalex: {} papers for {}", papers.len(), disease.key);
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
                log::warn!("openalex: unknown disease key {key}, skipping");
                continue;
            };
            all.extend(self.scrape_disease(disease, max_results_per_disease)?);
        }
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_quotes_every_term() {
        let d = diseases::get("type1_diabetes").unwrap();
        let q = build_query(d);
        assert!(q.contains("\"type 1 diabetes\""));
        assert!(q.contains(" OR \"brittle diabetes\""));
    }

    #[test]
    fn unreachable_endpoint_yields_empty_not_error() {
        let mut client = Client {
            works_url: "http://127.0.0.1:9/works".to_string(),
            email: None,
            limiter: RateLimiter::new(Duration::ZERO),
            retry: RetryPolicy {
                max_retries: 0,
                backoff: Duration::from_millis(1),
            },
        };
        let d = diseases::get("crohns").unwrap();
        // a dead endpoint ends pagination, it does not fail the disease
        let papers = client.scrape_disease(d, 5).unwrap();
        assert!(papers.is_empty());
    }
}
