//! Remote rating lookup.
//!
//! The pipeline only sees the [`LookupClient`] trait: key in, rating or
//! nothing out, or a [`LookupError`]. `OmdbClient` is the HTTP-backed
//! implementation used by the CLI; tests substitute in-process fakes.

mod error;
mod omdb;

pub use error::LookupError;
pub use omdb::OmdbClient;

/// Rating value returned by the lookup service.
pub type Rating = f64;

/// A remote key → rating service.
///
/// `Ok(None)` means the service answered and had no match (not retried).
/// Any `Err` is treated as transient by [`crate::retry::RetryingFetcher`].
/// Implementations are shared by all workers, so they must be `Send + Sync`.
pub trait LookupClient: Send + Sync {
    fn lookup(&self, key: &str) -> Result<Option<Rating>, LookupError>;
}
