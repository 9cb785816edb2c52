// file: src/source/mod.rs
// description: source tree discovery module

pub mod scanner;

pub use scanner::{MarkdownScanner, ScannedFile};
