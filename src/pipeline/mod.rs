// file: src/pipeline/mod.rs
// description: publish pipeline module exports

pub mod orchestrator;
pub mod outcome;
pub mod progress;

pub use orchestrator::PublishOrchestrator;
pub use outcome::{BatchReport, DocumentOutcome, DocumentReport, SkipReason};
pub use progress::{BatchStats, ProgressTracker};
