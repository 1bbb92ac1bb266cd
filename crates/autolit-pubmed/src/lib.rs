//! Autolit PubMed - NCBI E-utilities source adapter
//!
//! Two-phase flow: esearch returns PMIDs as JSON, efetch returns full
//! records as XML, fetched in chunks and parsed with [`parser`].

use std::time::Duration;

use anyhow::Context;

use autolit_core::diseases::{self, Disease};
use autolit_core::http::{RateLimiter, RetryPolicy, get_json, get_text, with_retry};
use autolit_core::paper::Paper;

pub mod parser;
pub mod transform;

pub use parser::PubmedArticle;

pub const SOURCE_TAG: &str = "pubmed";

const ESEARCH_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi";
const EFETCH_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi";

/// NCBI allows 3 requests per second without an API key.
const MIN_INTERVAL: Duration = Duration::from_millis(340);

/// PMIDs per efetch request.
const FETCH_CHUNK: usize = 200;

/// esearch retmax hard cap.
const RETMAX_CAP: usize = 10_000;

const TOOL: &str = "autolit";

/// Parenthesized OR query over the disease's primary search terms.
pub fn build_query(disease: &Disease) -> String {
    format!("({})", disease.format_query("OR"))
}

/// E-utilities client. Search and fetch throttle independently.
pub struct Client {
    search_url: String,
    fetch_url: String,
    email: Option<String>,
    search_limiter: RateLimiter,
    fetch_limiter: RateLimiter,
    retry: RetryPolicy,
}

impl Client {
    pub fn new(email: Option<String>) -> Self {
        Self {
            search_url: ESEARCH_URL.to_string(),
            fetch_url: EFETCH_URL.to_string(),
            email,
            search_limiter: RateLimiter::new(MIN_INTERVAL),
            fetch_limiter: RateLimiter::new(MIN_INTERVAL),
            retry: RetryPolicy::default(),
        }
    }

    fn identify(&self, params: &mut Vec<(&'static str, String)>) {
        params.push(("tool", TOOL.to_string()));
        if let Some(email) = &self.email {
            params.push(("email", email.clone()));
        }
    }

    /// esearch phase: relevance-sorted PMIDs for one disease.
    pub fn search_ids(
        &mut self,
        disease: &Disease,
        max_results: usize,
    ) -> anyhow::Result<Vec<String>> {
        let mut params = vec![
            ("db", "pubmed".to_string()),
            ("term", build_query(disease)),
            ("retmax", max_results.min(RETMAX_CAP).to_string()),
            ("retmode", "json".to_string()),
            ("sort", "relevance".to_string()),
        ];
        self.identify(&mut params);

        let retry = self.retry;
        let limiter = &mut self.search_limiter;
        let url = self.search_url.clone();
        let body = with_retry(&retry, "pubmed esearch", || {
            limiter.wait();
            get_json(&url, &params)
        })
        .with_context(|| format!("PubMed search failed for {}", disease.key))?;

        let ids: Vec<String> = body["esearchresult"]["idlist"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|id| id.as_str())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        log::info!("pubmed: {} ids for {}", ids.len(), disease.key);
        Ok(ids)
    }

    /// efetch phase: full records for the given PMIDs, in chunks.
    ///
    /// A chunk that fails to fetch or parse is logged and dropped; the
    /// other chunks still contribute.
    pub fn fetch_articles(&mut self, pmids: &[String]) -> Vec<PubmedArticle> {
        let mut articles = Vec::with_capacity(pmids.len());

        for chunk in pmids.chunks(FETCH_CHUNK) {
            let mut params = vec![
                ("db", "pubmed".to_string()),
                ("id", chunk.join(",")),
                ("retmode", "xml".to_string()),
            ];
            self.identify(&mut params);

            let retry = self.retry;
            let limiter = &mut self.fetch_limiter;
            let url = self.fetch_url.clone();
            let xml = match with_retry(&retry, "pubmed efetch", || {
                limiter.wait();
                get_text(&url, &params)
            }) {
                Ok(xml) => xml,
                Err(e) => {
                    log::warn!("pubmed: dropping chunk of {}: {e}", chunk.len());
                    continue;
                }
            };

            match parser::parse_efetch_xml(&xml) {
                Ok(parsed) => articles.extend(parsed),
                Err(e) => log::warn!("pubmed: dropping chunk of {}: {e}", chunk.len()),
            }
        }

        articles
    }

    pub fn scrape_disease(
        &mut self,
        disease: &Disease,
        max_results: usize,
    ) -> anyhow::Result<Vec<Paper>> {
        let ids = match self.search_ids(disease, max_results) {
            Ok(ids) => ids,
            Err(e) => {
                log::warn!("pubmed: {}: {e:#}, skipping disease", disease.key);
                return Ok(Vec::new());
            }
        };
        if ids.is_empty() {
            log::info!("pubmed: no results for {}", disease.key);
            return Ok(Vec::new());
        }

        let mut papers = Vec::new();
        for article in self.fetch_articles(&ids) {
            let mut paper = article.into_paper();
            if paper.title.is_empty() || paper.abstract_text.is_empty() {
                continue;
            }
            paper.add_disease_relevance(disease.key);
            papers.push(paper);
        }
        papers.truncate(max_results);

        log::info!("pubmed: {} papers for {}", papers.len(), disease.key);
        Ok(papers)
    }

    pub fn scrape_diseases(
        &mut self,
        disease_keys: &[String],
        max_results: usize,
    ) -> anyhow::Result<Vec<Paper>> {
        let mut all = Vec::new();
        for key in disease_keys {
            let Some(disease) = diseases::get(key) else {
                log::warn!("pubmed: unknown disease key {key}, skipping");
                continue;
            };
            all.extend(self.scrape_disease(disease, max_results)?);
        }
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_wraps_terms_in_quotes() {
        let d = diseases::get("crohns").unwrap();
        let q = build_query(d);
        assert!(q.starts_with('('));
        assert!(q.ends_with(')'));
        assert!(q.contains("\"crohn's disease\""));
        assert!(q.contains(" OR "));
    }

    #[test]
    fn email_appended_when_present() {
        let client = Client::new(Some("a@b.org".to_string()));
        let mut params = Vec::new();
        client.identify(&mut params);
        assert!(params.contains(&("email", "a@b.org".to_string())));

        let anon = Client::new(None);
        let mut params = Vec::new();
        anon.identify(&mut params);
        assert_eq!(params, vec![("tool", "autolit".to_string())]);
    }

    fn unreachable_client() -> Client {
        Client {
            search_url: "http://127.0.0.1:9/esearch".to_string(),
            fetch_url: "http://127.0.0.1:9/efetch".to_string(),
            email: None,
            search_limiter: RateLimiter::new(Duration::ZERO),
            fetch_limiter: RateLimiter::new(Duration::ZERO),
            retry: RetryPolicy {
                max_retries: 0,
                backoff: Duration::from_millis(1),
            },
        }
    }

    #[test]
    fn failed_search_skips_disease_without_error() {
        let mut client = unreachable_client();
        let keys = vec!["crohns".to_string(), "systemic_lupus".to_string()];
        let papers = client.scrape_diseases(&keys, 5).unwrap();
        assert!(papers.is_empty());
    }

    #[test]
    fn failed_fetch_chunk_drops_only_that_chunk() {
        let mut client = unreachable_client();
        let pmids: Vec<String> = (0..2).map(|i| format!("3600000{i}")).collect();
        assert!(client.fetch_articles(&pmids).is_empty());
    }
}
