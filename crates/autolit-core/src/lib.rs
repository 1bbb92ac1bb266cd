//! Autolit Core - Common infrastructure for the autoimmune literature pipeline
//!
//! This crate provides the canonical paper record, the static disease
//! descriptor table, text/field normalization, the rate-limited HTTP layer,
//! and the statistics and export helpers shared by all source adapters.

pub mod diseases;
pub mod export;
pub mod http;
pub mod logging;
pub mod normalize;
pub mod paper;
pub mod stats;

// Re-exports for convenience
pub use diseases::{DISEASES, Disease, DiseaseSummary};
pub use http::{HttpError, RateLimiter, RetryPolicy, get_json, get_text, with_retry};
pub use logging::init_logging;
pub use paper::{Paper, deduplicate, filter_valid, sort_by_date};
pub use stats::{CollectionStats, collection_stats};
