//! Autolit bioRxiv - bioRxiv/medRxiv source adapter
//!
//! The preprint API has no search endpoint, so this adapter bulk-fetches a
//! date window per server and matches disease terms client-side over
//! title, abstract and keywords.

use std::time::Duration;

use anyhow::Context;
use chrono::{Days, Utc};
use serde_json::Value;

use autolit_core::diseases::{self, Disease};
use autolit_core::http::{RateLimiter, RetryPolicy, get_json, with_retry};
use autolit_core::paper::Paper;

pub mod transform;

pub use transform::CollectionRow;

/// Source tag prefix; records carry `<server>_preprint`.
pub const SOURCE_TAG: &str = "biorxiv";

const BASE_URL: &str = "https://api.biorxiv.org/details";

/// Conservative throttle; this also spaces the two server fetches.
const MIN_INTERVAL: Duration = Duration::from_secs(1);

const SERVERS: &[&str] = &["biorxiv", "medrxiv"];

/// `YYYY-MM-DD/YYYY-MM-DD` window ending today.
pub fn build_date_interval(years_back: u32) -> String {
    let end = Utc::now().date_naive();
    let start = end
        .checked_sub_days(Days::new(u64::from(years_back) * 365))
        .unwrap_or(end);
    format!("{start}/{end}")
}

/// Case-insensitive substring match against the disease's full term list.
pub fn matches_disease_terms(text: &str, disease: &Disease) -> bool {
    if text.is_empty() {
        return false;
    }
    let haystack = text.to_lowercase();
    disease
        .all_search_terms()
        .iter()
        .any(|term| haystack.contains(&term.to_lowercase()))
}

fn paper_matches(paper: &Paper, disease: &Disease) -> bool {
    let full_text = format!(
        "{} {} {}",
        paper.title,
        paper.abstract_text,
        paper.keywords.join(" ")
    );
    matches_disease_terms(&full_text, disease)
}

/// bioRxiv/medRxiv client owning its throttle state.
pub struct Client {
    base_url: String,
    limiter: RateLimiter,
    retry: RetryPolicy,
    include_medrxiv: bool,
}

impl Client {
    pub fn new(include_medrxiv: bool) -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            limiter: RateLimiter::new(MIN_INTERVAL),
            retry: RetryPolicy::default(),
            include_medrxiv,
        }
    }

    fn servers(&self) -> &'static [&'static str] {
        if self.include_medrxiv {
            SERVERS
        } else {
            &SERVERS[..1]
        }
    }

    /// Unfiltered window fetch for one server.
    fn fetch_server(&mut self, server: &str, interval: &str) -> anyhow::Result<Vec<Paper>> {
        let url = format!("{}/{server}/{interval}", self.base_url);

        let retry = self.retry;
        let limiter = &mut self.limiter;
        let body = with_retry(&retry, "biorxiv details", || {
            limiter.wait();
            get_json(&url, &[])
        })
        .with_context(|| format!("bioRxiv details fetch failed for {server}"))?;

        let items = match &body["collection"] {
            Value::Array(items) => items.clone(),
            Value::Null => Vec::new(),
            single => vec![single.clone()],
        };

        let mut papers = Vec::new();
        for item in items {
            let row: CollectionRow = match serde_json::from_value(item) {
                Ok(row) => row,
                Err(e) => {
                    log::debug!("biorxiv: skipping unparseable entry: {e}");
                    continue;
                }
            };
            let paper = row.into_paper();
            if paper.title.is_empty() || paper.abstract_text.is_empty() {
                continue;
            }
            papers.push(paper);
        }
        log::info!("{server}: {} preprints in window {interval}", papers.len());
        Ok(papers)
    }

    pub fn scrape_disease(
        &mut self,
        disease: &Disease,
        years_back: u32,
    ) -> anyhow::Result<Vec<Paper>> {
        self.scrape_diseases(&[disease.key.to_string()], years_back)
    }

    /// Fetch each server's window once, then filter per disease, so N
    /// diseases still cost one request per server. A server that fails
    /// after retries is skipped; the other server's window is kept.
    pub fn scrape_diseases(
        &mut self,
        disease_keys: &[String],
        years_back: u32,
    ) -> anyhow::Result<Vec<Paper>> {
        let interval = build_date_interval(years_back);

        let mut fetched = Vec::new();
        for server in self.servers() {
            match self.fetch_server(server, &interval) {
                Ok(papers) => fetched.extend(papers),
                Err(e) => log::warn!("{server}: {e:#}, skipping server"),
            }
        }

        let mut all = Vec::new();
        for key in disease_keys {
            let Some(disease) = diseases::get(key) else {
                log::warn!("biorxiv: unknown disease key {key}, skipping");
                continue;
            };
            let mut matched = 0usize;
            for paper in &fetched {
                if paper_matches(paper, disease) {
                    let mut paper = paper.clone();
                    paper.add_disease_relevance(disease.key);
                    all.push(paper);
                    matched += 1;
                }
            }
            log::info!("biorxiv: {matched} preprints matched {key}");
        }
        Ok(all)
    }
}
