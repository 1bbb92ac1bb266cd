//! Synchronous HTTP layer over a shared async client
//!
//! Uses async reqwest internally on a shared tokio runtime but presents a
//! blocking interface; the whole pipeline is a single sequential flow, so
//! the only suspension points are deliberate rate-limit and backoff sleeps.

use std::sync::LazyLock;
use std::time::{Duration, Instant};

use serde_json::Value;

/// Connect timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Total per-request timeout; exceeding it is a plain request failure.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("autolit/", env!("CARGO_PKG_VERSION"));

/// Error from one outbound GET.
#[derive(Debug)]
pub enum HttpError {
    /// Network or HTTP-status failure, with the status when one was received
    Http {
        status: Option<u16>,
        message: String,
    },
    /// Response body did not decode as the expected format
    Decode(String),
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http {
                status: Some(s),
                message,
            } => write!(f, "HTTP {s}: {message}"),
            Self::Http {
                status: None,
                message,
            } => write!(f, "HTTP error: {message}"),
            Self::Decode(msg) => write!(f, "decode error: {msg}"),
        }
    }
}

impl std::error::Error for HttpError {}

impl HttpError {
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        Self::Http {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }

    /// Client errors signal a malformed request and are terminal; 429 is the
    /// rate-limit response and stays retryable. Everything else (timeouts,
    /// connection failures, 5xx) is transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http {
                status: Some(s), ..
            } => *s == 429 || !(400..500).contains(s),
            Self::Http { status: None, .. } => true,
            Self::Decode(_) => false,
        }
    }
}

/// Shared async HTTP client with connection pooling.
static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .expect("failed to build HTTP client")
});

/// Get shared HTTP client.
pub fn http_client() -> &'static reqwest::Client {
    &SHARED_CLIENT
}

/// Shared tokio runtime for HTTP operations.
pub static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// Blocking GET returning the parsed JSON body.
pub fn get_json(url: &str, params: &[(&str, String)]) -> Result<Value, HttpError> {
    SHARED_RUNTIME.block_on(async {
        let resp = http_client()
            .get(url)
            .query(params)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| HttpError::from_reqwest(&e))?
            .error_for_status()
            .map_err(|e| HttpError::from_reqwest(&e))?;
        resp.json()
            .await
            .map_err(|e| HttpError::Decode(e.to_string()))
    })
}

/// Blocking GET returning the raw body (PubMed efetch XML).
pub fn get_text(url: &str, params: &[(&str, String)]) -> Result<String, HttpError> {
    SHARED_RUNTIME.block_on(async {
        let resp = http_client()
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| HttpError::from_reqwest(&e))?
            .error_for_status()
            .map_err(|e| HttpError::from_reqwest(&e))?;
        resp.text()
            .await
            .map_err(|e| HttpError::Decode(e.to_string()))
    })
}

/// Minimum-interval throttle, owned by each adapter client.
///
/// Tracks the start of the last call and sleeps off any remaining deficit
/// before the next one. Process-local, single flow; no cross-process
/// coordination.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Option<Instant>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: None,
        }
    }

    /// Block until at least `min_interval` has passed since the previous
    /// `wait`, then record the new call start.
    pub fn wait(&mut self) {
        if let Some(last) = self.last_call {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                std::thread::sleep(self.min_interval - elapsed);
            }
        }
        self.last_call = Some(Instant::now());
    }
}

/// Bounded exponential-backoff retry policy.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Base delay; attempt `n` sleeps `backoff * 2^n`.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff * 2u32.pow(attempt)
    }
}

/// Retry a fallible request with exponential backoff.
///
/// Non-retryable errors (4xx other than 429, decode failures) return
/// immediately; exhausting the budget returns the last error.
pub fn with_retry<T>(
    policy: &RetryPolicy,
    label: &str,
    mut attempt_fn: impl FnMut() -> Result<T, HttpError>,
) -> Result<T, HttpError> {
    let mut attempt = 0u32;
    loop {
        match attempt_fn() {
            Ok(v) => return Ok(v),
            Err(e) if attempt < policy.max_retries && e.is_retryable() => {
                let delay = policy.delay(attempt);
                attempt += 1;
                log::debug!(
                    "{label}: attempt {attempt}/{} failed: {e}, retrying in {delay:?}",
                    policy.max_retries
                );
                std::thread::sleep(delay);
            }
            Err(e) => {
                log::warn!("{label}: failed permanently: {e}");
                return Err(e);
            }
        }
    }
}
