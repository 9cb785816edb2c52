// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Front matter parse error in {file}: {message}")]
    Parse { file: String, message: String },

    #[error("Missing local image {reference} (resolved to {path})")]
    MissingImage { reference: String, path: PathBuf },

    #[error("Failed to download image {url} after {attempts} attempts: {message}")]
    NetworkImage {
        url: String,
        attempts: u32,
        message: String,
    },

    #[error("Image upload failed for {filename}: {message}")]
    Upload { filename: String, message: String },

    #[error("Publish failed for {document}: {message}")]
    Publish { document: String, message: String },

    #[error("Cache store error at {path}: {message}")]
    CacheIo { path: PathBuf, message: String },

    #[error("File operation failed for {path}: {source}")]
    FileOperation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}
