//! CLI command handlers.

mod enrich;
mod merge;

pub use enrich::run_enrich;
#[cfg(test)]
pub(crate) use enrich::describe_event;
pub use merge::run_merge;
