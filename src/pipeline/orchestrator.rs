// file: src/pipeline/orchestrator.rs
// description: per-document publish state machine and batch driver
// reference: orchestrates asynchronous publish workflow

use crate::cache::{CacheEntry, PublishCache};
use crate::config::{Config, PipelineConfig};
use crate::document::{Document, Fingerprint};
use crate::error::Result;
use crate::images::{ImageResolver, ResolvedImage};
use crate::pipeline::outcome::{BatchReport, DocumentOutcome, DocumentReport, SkipReason};
use crate::pipeline::progress::ProgressTracker;
use crate::platform::{ArticleSubmission, ImageBinding, Platform};
use crate::source::ScannedFile;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell, Semaphore};
use tracing::{info, warn};

/// Drives each document through
/// parse -> validate -> resolve images -> fingerprint -> skip/upload/publish.
///
/// Documents run concurrently under a bounded pool. The cache and the
/// batch-wide upload map are the only shared mutable state; the upload map
/// guarantees a byte-identical image is uploaded at most once per batch, with
/// later waiters reusing the first upload's media id.
pub struct PublishOrchestrator<P: Platform> {
    pipeline: PipelineConfig,
    platform: Arc<P>,
    resolver: Arc<ImageResolver>,
    cache: Arc<Mutex<PublishCache>>,
    uploads: Mutex<HashMap<String, Arc<OnceCell<String>>>>,
    max_concurrent: usize,
}

impl<P: Platform> PublishOrchestrator<P> {
    pub fn new(config: &Config, platform: P, cache: PublishCache) -> Self {
        Self {
            pipeline: config.pipeline.clone(),
            platform: Arc::new(platform),
            resolver: Arc::new(ImageResolver::new(&config.images)),
            cache: Arc::new(Mutex::new(cache)),
            uploads: Mutex::new(HashMap::new()),
            max_concurrent: config.pipeline.parallel_workers.max(1),
        }
    }

    /// Process the whole batch. Always yields one outcome per document; a
    /// failure in one document never stops the others.
    pub async fn run(&self, files: Vec<ScannedFile>, force: bool) -> BatchReport {
        info!(
            "Publishing {} documents with {} workers (target: {})",
            files.len(),
            self.max_concurrent,
            self.platform.name()
        );

        let progress = Arc::new(ProgressTracker::new(files.len()));
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));

        let tasks = files.into_iter().map(|file| {
            let semaphore = semaphore.clone();
            let progress = progress.clone();

            async move {
                // Closed only on runtime shutdown.
                let _permit = semaphore.acquire().await.expect("semaphore closed");
                progress.set_message(format!("Processing {}", file.relative_path));

                let outcome = self.process_document(&file, force).await;
                match &outcome {
                    DocumentOutcome::Published { .. } => progress.inc_published(),
                    DocumentOutcome::Skipped { .. } => progress.inc_skipped(),
                    DocumentOutcome::Failed { reason } => {
                        warn!("{}: {}", file.relative_path, reason);
                        progress.inc_failed();
                    }
                }

                DocumentReport {
                    path: file.path.clone(),
                    relative_path: file.relative_path.clone(),
                    outcome,
                }
            }
        });

        let documents: Vec<DocumentReport> = stream::iter(tasks)
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        progress.finish();
        let stats = progress.get_stats();
        info!(
            "Batch complete in {}s: {} published, {} skipped, {} failed ({:.1}% ok)",
            stats.duration_secs,
            stats.published,
            stats.skipped,
            stats.failed,
            stats.success_rate()
        );

        BatchReport { documents }
    }

    async fn process_document(&self, file: &ScannedFile, force: bool) -> DocumentOutcome {
        // Parsed
        let document = match Document::parse(&file.path) {
            Ok(document) => document,
            Err(err) => {
                return DocumentOutcome::Failed {
                    reason: err.to_string(),
                };
            }
        };

        // Validated: drafts are skipped, never failed.
        if document.draft() {
            return DocumentOutcome::Skipped {
                reason: SkipReason::Draft,
            };
        }

        let missing = document.validate(&self.pipeline.required_fields);
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(|m| m.field.as_str()).collect();
            if self.pipeline.tolerate_missing_fields {
                warn!(
                    "{}: missing fields tolerated: {}",
                    file.relative_path,
                    names.join(", ")
                );
            } else {
                return DocumentOutcome::Failed {
                    reason: format!("Missing required fields: {}", names.join(", ")),
                };
            }
        }

        // ImagesResolved: every reference present, downloaded or substituted.
        let resolution = self.resolver.resolve(&document).await;
        if !resolution.fully_resolved() {
            let reasons: Vec<String> =
                resolution.failures.iter().map(|e| e.to_string()).collect();
            return DocumentOutcome::Failed {
                reason: reasons.join("; "),
            };
        }

        // Fingerprinted: an unchanged document never touches the platform.
        let fingerprint = Fingerprint::compute(&document, &resolution.content_hashes());
        if !force && self.cache.lock().await.lookup(&fingerprint).is_some() {
            return DocumentOutcome::Skipped {
                reason: SkipReason::Unchanged,
            };
        }

        // Uploading
        match self
            .upload_and_publish(file, &document, &resolution.resolved, fingerprint)
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => DocumentOutcome::Failed {
                reason: err.to_string(),
            },
        }
    }

    async fn upload_and_publish(
        &self,
        file: &ScannedFile,
        document: &Document,
        resolved: &[ResolvedImage],
        fingerprint: Fingerprint,
    ) -> Result<DocumentOutcome> {
        let mut media_by_hash: HashMap<String, String> = HashMap::new();
        let mut bindings = Vec::with_capacity(resolved.len());

        for image in resolved {
            let media_id = match media_by_hash.get(&image.content_hash) {
                Some(media_id) => media_id.clone(),
                None => {
                    let media_id = self.media_id_for(image).await?;
                    media_by_hash.insert(image.content_hash.clone(), media_id.clone());
                    media_id
                }
            };
            bindings.push(ImageBinding {
                reference: image.reference.raw.clone(),
                content_hash: image.content_hash.clone(),
                media_id,
            });
        }

        let normalized = document.normalize();
        let title = normalized
            .title()
            .map(str::to_string)
            .unwrap_or_else(|| file.relative_path.clone());

        let submission = ArticleSubmission {
            title,
            front_matter: normalized.front_matter.to_canonical(),
            body: normalized.body.clone(),
            images: bindings,
        };

        let article_id = self.platform.publish_draft(&submission).await?;

        // The entry is written only now that the platform accepted the
        // article; image uploads alone never populate the cache.
        let entry = CacheEntry {
            article_id: article_id.clone(),
            images: media_by_hash,
            published_at: Utc::now(),
        };

        if let Err(err) = self.cache.lock().await.put(fingerprint, entry).await {
            // The remote side effect is irreversible; report, do not retry.
            return Ok(DocumentOutcome::Failed {
                reason: format!(
                    "Published as article {} but cache write failed: {}",
                    article_id, err
                ),
            });
        }

        Ok(DocumentOutcome::Published { article_id })
    }

    /// Media id for an image's bytes: a prior run's cache entry wins, then
    /// the batch-wide upload map. The per-hash cell makes concurrent callers
    /// wait for the first upload instead of repeating it.
    async fn media_id_for(&self, image: &ResolvedImage) -> Result<String> {
        if let Some(media_id) = self.cache.lock().await.media_id_for(&image.content_hash) {
            return Ok(media_id);
        }

        let cell = {
            let mut uploads = self.uploads.lock().await;
            uploads
                .entry(image.content_hash.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let media_id = cell
            .get_or_try_init(|| async {
                let bytes = tokio::fs::read(&image.local_path).await?;
                let filename = image
                    .local_path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| format!("{}.png", &image.content_hash[..12]));
                self.platform.upload_image(bytes, &filename).await
            })
            .await?;

        Ok(media_id.clone())
    }
}
