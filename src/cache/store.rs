// file: src/cache/store.rs
// description: persistent fingerprint-keyed publish cache with atomic replace
// reference: https://docs.rs/serde_json

use crate::document::Fingerprint;
use crate::error::{Result, SyncError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info, warn};

/// Remote artifacts produced by one fully successful publish. Written only
/// after the platform accepted the article; a partial upload never creates an
/// entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub article_id: String,
    /// image content hash -> remote media id
    pub images: HashMap<String, String>,
    pub published_at: DateTime<Utc>,
}

/// Fingerprint-keyed store backed by a single JSON file. Constructed once per
/// run and passed into the orchestrator; reads degrade to empty so the cache
/// is acceleration, never a correctness dependency.
pub struct PublishCache {
    path: PathBuf,
    entries: HashMap<String, CacheEntry>,
}

impl PublishCache {
    /// Open the store, treating a missing, unreadable or corrupt file as
    /// empty. Never fails: an empty cache is always a legal state.
    pub async fn open(path: PathBuf) -> Self {
        let entries = match fs::read_to_string(&path).await {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(
                        "Cache file {} is corrupt, starting empty: {}",
                        path.display(),
                        e
                    );
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No cache file at {}", path.display());
                HashMap::new()
            }
            Err(e) => {
                warn!(
                    "Cache file {} is unreadable, starting empty: {}",
                    path.display(),
                    e
                );
                HashMap::new()
            }
        };

        info!("Loaded {} cache entries", entries.len());
        Self { path, entries }
    }

    pub fn lookup(&self, fingerprint: &Fingerprint) -> Option<&CacheEntry> {
        self.entries.get(fingerprint.as_str())
    }

    /// Insert an entry and persist the whole store atomically.
    pub async fn put(&mut self, fingerprint: Fingerprint, entry: CacheEntry) -> Result<()> {
        self.entries.insert(fingerprint.as_str().to_string(), entry);
        self.persist().await
    }

    /// Drop every entry. The explicit clear operation is the only removal
    /// path; entries never auto-expire.
    pub async fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.persist().await
    }

    /// Search all entries for a previously uploaded image with the given
    /// content hash, regardless of which document uploaded it.
    pub fn media_id_for(&self, content_hash: &str) -> Option<String> {
        self.entries
            .values()
            .find_map(|entry| entry.images.get(content_hash).cloned())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whole-file rewrite through a temporary sibling plus rename, so a crash
    /// mid-write leaves the previous valid file in place.
    async fn persist(&self) -> Result<()> {
        let contents = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| SyncError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await.map_err(|e| SyncError::CacheIo {
                path: self.path.clone(),
                message: e.to_string(),
            })?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, contents).await.map_err(|e| SyncError::CacheIo {
            path: tmp.clone(),
            message: e.to_string(),
        })?;
        fs::rename(&tmp, &self.path).await.map_err(|e| SyncError::CacheIo {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        debug!("Persisted {} cache entries", self.entries.len());
        Ok(())
    }
}
