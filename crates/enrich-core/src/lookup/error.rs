//! Errors a lookup client may fail with.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LookupError {
    /// Request exceeded its deadline.
    #[error("request timed out")]
    Timeout,
    /// Network-level failure (DNS, refused, reset).
    #[error("connection failed: {0}")]
    Connection(String),
    /// Service asked us to slow down (quota or rate limit).
    #[error("throttled: {0}")]
    Throttled(String),
    /// Non-2xx HTTP status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Response body could not be understood.
    #[error("malformed response: {0}")]
    Malformed(String),
    /// Service reported an error other than "not found".
    #[error("service error: {0}")]
    Service(String),
    #[error("curl: {0}")]
    Curl(#[from] curl::Error),
}
