//! Retry policy and the retrying fetcher.
//!
//! Lookup failures are classified (timeouts, throttling, connection
//! failures) for reporting, and every failure is retried on a fixed delay
//! until the attempt budget runs out. Callers above [`RetryingFetcher`]
//! never see a lookup error.

mod classify;
mod fetcher;
mod policy;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use fetcher::{FetchOutcome, RetryNotice, RetryingFetcher};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
