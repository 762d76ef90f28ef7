//! Batch orchestration: discover articles, summarize them with a bounded
//! worker pool, write records and the batch index.

mod discovery;
mod orchestrator;

pub use discovery::discover_articles;
pub use orchestrator::BatchOrchestrator;
