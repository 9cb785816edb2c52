// file: src/platform/mod.rs
// description: remote content platform seam: trait and submission payload

pub mod http;

pub use http::HttpPlatform;

use crate::error::Result;

/// A normalized document ready for the platform's renderer, together with the
/// media ids its image references map to. This crate never builds
/// platform-specific HTML; that stays on the far side of this boundary.
#[derive(Debug, Clone)]
pub struct ArticleSubmission {
    pub title: String,
    /// Canonical front matter text.
    pub front_matter: String,
    pub body: String,
    pub images: Vec<ImageBinding>,
}

/// Mapping from an image reference as written in the body to the remote media
/// identifier its bytes were uploaded under.
#[derive(Debug, Clone)]
pub struct ImageBinding {
    pub reference: String,
    pub content_hash: String,
    pub media_id: String,
}

/// The remote image/content platform. Implementations are opaque upload and
/// publish services; errors are per-call and never batch-fatal.
#[allow(async_fn_in_trait)]
pub trait Platform: Send + Sync {
    fn name(&self) -> &str;

    /// Upload image bytes, returning the remote media identifier.
    async fn upload_image(&self, bytes: Vec<u8>, filename: &str) -> Result<String>;

    /// Submit the article as a draft, returning the remote article identifier.
    async fn publish_draft(&self, submission: &ArticleSubmission) -> Result<String>;
}
