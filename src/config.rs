// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{Result, SyncError};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub source: SourceConfig,
    pub pipeline: PipelineConfig,
    pub images: ImageConfig,
    pub cache: CacheConfig,
    #[serde(default)]
    pub platforms: HashMap<String, PlatformConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    pub dir: PathBuf,
    pub skip_patterns: Vec<String>,
    pub max_file_size_mb: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    pub parallel_workers: usize,
    pub required_fields: Vec<String>,
    pub tolerate_missing_fields: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImageConfig {
    pub download_dir: String,
    pub max_attempts: u32,
    pub retry_base_ms: u64,
    pub retry_max_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    pub file_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlatformConfig {
    pub api_base: String,
    pub app_id: String,
    pub app_secret: String,
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(config::File::from(Path::new("config/default.toml")));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("ARTICLE_SYNC")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| SyncError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| SyncError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            source: SourceConfig {
                dir: PathBuf::from("./articles"),
                skip_patterns: vec![
                    "node_modules/*".to_string(),
                    ".git/*".to_string(),
                    "*.draft.md".to_string(),
                ],
                max_file_size_mb: 10,
            },
            pipeline: PipelineConfig {
                parallel_workers: 4,
                required_fields: vec!["title".to_string()],
                tolerate_missing_fields: false,
            },
            images: ImageConfig {
                download_dir: "assets".to_string(),
                max_attempts: 3,
                retry_base_ms: 500,
                retry_max_ms: 8000,
            },
            cache: CacheConfig {
                file_name: "publish-cache.json".to_string(),
            },
            platforms: HashMap::new(),
        }
    }

    pub fn platform(&self, target: &str) -> Result<&PlatformConfig> {
        self.platforms.get(target).ok_or_else(|| {
            SyncError::Config(format!("No platform configured for target '{}'", target))
        })
    }

    fn validate(&self) -> Result<()> {
        if self.pipeline.parallel_workers == 0 {
            return Err(SyncError::Config(
                "parallel_workers must be greater than 0".to_string(),
            ));
        }

        if self.images.max_attempts == 0 {
            return Err(SyncError::Config(
                "images.max_attempts must be greater than 0".to_string(),
            ));
        }

        if self.cache.file_name.trim().is_empty() {
            return Err(SyncError::Config(
                "cache.file_name must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
