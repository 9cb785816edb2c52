// file: src/images/resolver.rs
// description: image resolution: local hashing, remote download, placeholder substitution
// reference: https://docs.rs/reqwest

use crate::config::ImageConfig;
use crate::document::Document;
use crate::error::{Result, SyncError};
use crate::images::reference::{self, ClassifiedReference, ImageKind, ImageReference};
use crate::images::retry::RetryPolicy;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Fallback image substituted for missing local references so downstream
/// rendering never sees a dangling path.
pub const PLACEHOLDER_BYTES: &[u8] = include_bytes!("../../assets/placeholder.png");
const PLACEHOLDER_NAME: &str = "img_unavailable.png";

/// One image reference after resolution: a readable local file plus the hash
/// of its bytes.
#[derive(Debug, Clone)]
pub struct ResolvedImage {
    pub reference: ImageReference,
    pub kind: ImageKind,
    pub local_path: PathBuf,
    pub content_hash: String,
    /// True when the placeholder stands in for a missing local file. The
    /// original path stays available through `reference.target`.
    pub substituted: bool,
}

/// Outcome of resolving one document's references. A failing reference never
/// aborts its siblings; failures accumulate here instead.
#[derive(Debug, Default)]
pub struct ResolutionReport {
    pub resolved: Vec<ResolvedImage>,
    pub failures: Vec<SyncError>,
}

impl ResolutionReport {
    pub fn fully_resolved(&self) -> bool {
        self.failures.is_empty()
    }

    /// Content hashes in document order, duplicates included. Fingerprint
    /// input.
    pub fn content_hashes(&self) -> Vec<String> {
        self.resolved.iter().map(|r| r.content_hash.clone()).collect()
    }
}

pub struct ImageResolver {
    http: reqwest::Client,
    retry: RetryPolicy,
    download_dir: String,
}

impl ImageResolver {
    pub fn new(config: &ImageConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            retry: RetryPolicy::from_config(config),
            download_dir: config.download_dir.clone(),
        }
    }

    /// Resolve every reference in the document body, in document order.
    pub async fn resolve(&self, document: &Document) -> ResolutionReport {
        let mut report = ResolutionReport::default();

        for raw in reference::extract(&document.body) {
            let classified = reference::classify(raw, &document.source_dir);
            match classified.kind {
                ImageKind::Local => match resolve_local(&classified).await {
                    Ok(resolved) => report.resolved.push(resolved),
                    Err(err) => report.failures.push(err),
                },
                ImageKind::Missing => {
                    match self.substitute_placeholder(&document.source_dir, &classified).await {
                        Ok(resolved) => report.resolved.push(resolved),
                        Err(err) => report.failures.push(err),
                    }
                }
                ImageKind::Remote => {
                    match self.resolve_remote(&document.source_dir, &classified.reference).await {
                        Ok(resolved) => report.resolved.push(resolved),
                        Err(err) => report.failures.push(err),
                    }
                }
            }
        }

        report
    }

    /// Check contract: report missing local references only. Remote
    /// availability is verified at resolve time, not here.
    pub fn check(document: &Document) -> Vec<SyncError> {
        reference::extract(&document.body)
            .into_iter()
            .map(|raw| reference::classify(raw, &document.source_dir))
            .filter(|classified| classified.kind == ImageKind::Missing)
            .map(|classified| {
                let path = classified
                    .local_path
                    .unwrap_or_else(|| document.source_dir.join(&classified.reference.target));
                SyncError::MissingImage {
                    reference: classified.reference.target,
                    path,
                }
            })
            .collect()
    }

    async fn resolve_remote(
        &self,
        source_dir: &Path,
        reference: &ImageReference,
    ) -> Result<ResolvedImage> {
        let url = &reference.target;
        let target = self.download_target(source_dir, url);

        if fs::try_exists(&target).await.unwrap_or(false) {
            debug!("Reusing downloaded image for {}", url);
            let bytes = fs::read(&target).await.map_err(|e| SyncError::FileOperation {
                path: target.clone(),
                source: e,
            })?;
            return Ok(ResolvedImage {
                reference: reference.clone(),
                kind: ImageKind::Remote,
                local_path: target,
                content_hash: content_hash(&bytes),
                substituted: false,
            });
        }

        let bytes = self
            .retry
            .run(&format!("download {}", url), || self.fetch(url))
            .await
            .map_err(|(attempts, err)| SyncError::NetworkImage {
                url: url.clone(),
                attempts,
                message: err.to_string(),
            })?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&target, &bytes).await.map_err(|e| SyncError::FileOperation {
            path: target.clone(),
            source: e,
        })?;
        info!("Downloaded {} -> {}", url, target.display());

        Ok(ResolvedImage {
            reference: reference.clone(),
            kind: ImageKind::Remote,
            local_path: target,
            content_hash: content_hash(&bytes),
            substituted: false,
        })
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Download location inside the source tree. The file name carries the
    /// URL digest so a re-run finds the previous download without fetching.
    fn download_target(&self, source_dir: &Path, url: &str) -> PathBuf {
        let digest = content_hash(url.as_bytes());
        let extension = url
            .rsplit('/')
            .next()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext)
            .filter(|ext| ext.len() <= 4 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("png");

        source_dir
            .join(&self.download_dir)
            .join(format!("{}.{}", &digest[..16], extension))
    }

    async fn substitute_placeholder(
        &self,
        source_dir: &Path,
        classified: &ClassifiedReference,
    ) -> Result<ResolvedImage> {
        let target = source_dir.join(&self.download_dir).join(PLACEHOLDER_NAME);

        if !fs::try_exists(&target).await.unwrap_or(false) {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::write(&target, PLACEHOLDER_BYTES).await.map_err(|e| {
                SyncError::FileOperation {
                    path: target.clone(),
                    source: e,
                }
            })?;
        }

        info!(
            "Substituting placeholder for missing image {}",
            classified.reference.target
        );

        Ok(ResolvedImage {
            reference: classified.reference.clone(),
            kind: ImageKind::Missing,
            local_path: target,
            content_hash: content_hash(PLACEHOLDER_BYTES),
            substituted: true,
        })
    }
}

async fn resolve_local(classified: &ClassifiedReference) -> Result<ResolvedImage> {
    let path = classified
        .local_path
        .clone()
        .expect("local reference carries a path");

    let bytes = fs::read(&path).await.map_err(|e| SyncError::FileOperation {
        path: path.clone(),
        source: e,
    })?;

    Ok(ResolvedImage {
        reference: classified.reference.clone(),
        kind: ImageKind::Local,
        local_path: path,
        content_hash: content_hash(&bytes),
        substituted: false,
    })
}

pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use pretty_assertions::assert_eq;
    use std::fs as std_fs;
    use tempfile::TempDir;

    fn write_doc(dir: &Path, body: &str) -> Document {
        let path = dir.join("post.md");
        std_fs::write(
            &path,
            format!("+++\ntitle=\"t\"\ndraft=false\n+++\n\n{}\n", body),
        )
        .unwrap();
        Document::parse(&path).unwrap()
    }

    fn resolver() -> ImageResolver {
        ImageResolver::new(&Config::default_config().images)
    }

    #[test]
    fn test_check_reports_only_missing_local_paths() {
        let temp = TempDir::new().unwrap();
        std_fs::create_dir_all(temp.path().join("images")).unwrap();
        std_fs::write(temp.path().join("images/b.jpg"), b"present").unwrap();

        let doc = write_doc(
            temp.path(),
            "![a](images/a.jpg)\n\n![b](images/b.jpg)\n\n![r](https://example.com/c.png)",
        );

        let missing = ImageResolver::check(&doc);
        assert_eq!(missing.len(), 1);
        match &missing[0] {
            SyncError::MissingImage { reference, path } => {
                assert_eq!(reference, "images/a.jpg");
                assert_eq!(path, &temp.path().join("images/a.jpg"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_check_clean_document_reports_nothing() {
        let temp = TempDir::new().unwrap();
        std_fs::write(temp.path().join("b.jpg"), b"present").unwrap();

        let doc = write_doc(temp.path(), "![b](b.jpg)");
        assert!(ImageResolver::check(&doc).is_empty());
    }

    #[tokio::test]
    async fn test_resolve_local_hashes_file_bytes() {
        let temp = TempDir::new().unwrap();
        std_fs::write(temp.path().join("pic.png"), b"image-bytes").unwrap();

        let doc = write_doc(temp.path(), "![p](pic.png)");
        let report = resolver().resolve(&doc).await;

        assert!(report.fully_resolved());
        assert_eq!(report.resolved.len(), 1);
        assert_eq!(report.resolved[0].content_hash, content_hash(b"image-bytes"));
        assert!(!report.resolved[0].substituted);
    }

    #[tokio::test]
    async fn test_missing_local_substituted_with_placeholder() {
        let temp = TempDir::new().unwrap();
        let doc = write_doc(temp.path(), "![gone](images/gone.jpg)");

        let report = resolver().resolve(&doc).await;

        assert!(report.fully_resolved());
        let resolved = &report.resolved[0];
        assert!(resolved.substituted);
        assert_eq!(resolved.reference.target, "images/gone.jpg");
        assert_eq!(resolved.content_hash, content_hash(PLACEHOLDER_BYTES));
        assert!(resolved.local_path.exists());
    }

    #[tokio::test]
    async fn test_unreachable_remote_is_isolated_failure() {
        let temp = TempDir::new().unwrap();
        std_fs::write(temp.path().join("ok.png"), b"fine").unwrap();

        let doc = write_doc(
            temp.path(),
            "![ok](ok.png)\n\n![bad](http://127.0.0.1:1/nope.png)",
        );

        let mut config = Config::default_config().images;
        config.max_attempts = 1;
        config.retry_base_ms = 1;
        let report = ImageResolver::new(&config).resolve(&doc).await;

        assert_eq!(report.resolved.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            report.failures[0],
            SyncError::NetworkImage { .. }
        ));
    }

    #[test]
    fn test_download_target_is_stable_per_url() {
        let temp = TempDir::new().unwrap();
        let r = resolver();
        let a = r.download_target(temp.path(), "https://example.com/x/photo.jpeg");
        let b = r.download_target(temp.path(), "https://example.com/x/photo.jpeg");
        assert_eq!(a, b);
        assert!(a.to_string_lossy().ends_with(".jpeg"));
    }
}
