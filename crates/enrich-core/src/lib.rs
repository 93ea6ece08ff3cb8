pub mod config;
pub mod logging;

pub mod assemble;
pub mod lookup;
pub mod merge;
pub mod pipeline;
pub mod progress_store;
pub mod retry;
pub mod scheduler;
pub mod table;
