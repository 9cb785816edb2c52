// file: src/lib.rs
// description: library entry point and public api exports
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod cache;
pub mod config;
pub mod document;
pub mod error;
pub mod images;
pub mod pipeline;
pub mod platform;
pub mod source;
pub mod utils;

pub use cache::{CacheEntry, PublishCache};
pub use config::{CacheConfig, Config, ImageConfig, PipelineConfig, SourceConfig};
pub use document::{Document, Fingerprint, FrontMatter};
pub use error::{Result, SyncError};
pub use images::{ImageResolver, RetryPolicy};
pub use pipeline::{BatchReport, DocumentOutcome, ProgressTracker, PublishOrchestrator, SkipReason};
pub use platform::{ArticleSubmission, HttpPlatform, Platform};
pub use source::{MarkdownScanner, ScannedFile};
