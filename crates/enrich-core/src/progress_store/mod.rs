//! Durable progress file.
//!
//! One CSV record per processed row (`Index,Title,Rating`), keyed by row
//! index. Loaded once at startup to skip already-processed rows and to seed
//! the final result; appended once per completed batch.

pub mod store;
pub mod types;

pub use store::ProgressStore;
pub use types::*;

#[cfg(test)]
mod tests;
