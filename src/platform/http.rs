// file: src/platform/http.rs
// description: HTTP implementation of the publish platform
// reference: https://docs.rs/reqwest

use crate::config::PlatformConfig;
use crate::error::{Result, SyncError};
use crate::images::RetryPolicy;
use crate::platform::{ArticleSubmission, Platform};
use serde_json::{Value, json};
use tracing::{debug, info};

/// Reqwest-backed platform client. The wire format is the platform's concern;
/// this type only carries credentials, retries transient failures, and maps
/// responses to media/article identifiers.
pub struct HttpPlatform {
    name: String,
    http: reqwest::Client,
    config: PlatformConfig,
    retry: RetryPolicy,
}

impl HttpPlatform {
    pub fn new(name: String, config: PlatformConfig, retry: RetryPolicy) -> Self {
        Self {
            name,
            http: reqwest::Client::new(),
            config,
            retry,
        }
    }

    async fn post_upload(&self, bytes: &[u8], filename: &str) -> Result<Value> {
        let response = self
            .http
            .post(format!("{}/media/upload", self.config.api_base))
            .query(&[
                ("app_id", self.config.app_id.as_str()),
                ("filename", filename),
            ])
            .bearer_auth(&self.config.app_secret)
            .body(bytes.to_vec())
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    async fn post_draft(&self, payload: &Value) -> Result<Value> {
        let response = self
            .http
            .post(format!("{}/draft/add", self.config.api_base))
            .query(&[("app_id", self.config.app_id.as_str())])
            .bearer_auth(&self.config.app_secret)
            .json(payload)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}

impl Platform for HttpPlatform {
    fn name(&self) -> &str {
        &self.name
    }

    async fn upload_image(&self, bytes: Vec<u8>, filename: &str) -> Result<String> {
        debug!("Uploading image {} ({} bytes)", filename, bytes.len());

        let response = self
            .retry
            .run(&format!("upload {}", filename), || {
                self.post_upload(&bytes, filename)
            })
            .await
            .map_err(|(_, err)| SyncError::Upload {
                filename: filename.to_string(),
                message: err.to_string(),
            })?;

        response
            .get("media_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| SyncError::Upload {
                filename: filename.to_string(),
                message: "Response carried no media_id".to_string(),
            })
    }

    async fn publish_draft(&self, submission: &ArticleSubmission) -> Result<String> {
        let payload = json!({
            "title": submission.title,
            "front_matter": submission.front_matter,
            "content": submission.body,
            "images": submission.images.iter().map(|binding| json!({
                "reference": binding.reference,
                "media_id": binding.media_id,
            })).collect::<Vec<_>>(),
        });

        let response = self
            .retry
            .run(&format!("publish '{}'", submission.title), || {
                self.post_draft(&payload)
            })
            .await
            .map_err(|(_, err)| SyncError::Publish {
                document: submission.title.clone(),
                message: err.to_string(),
            })?;

        let article_id = response
            .get("article_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| SyncError::Publish {
                document: submission.title.clone(),
                message: "Response carried no article_id".to_string(),
            })?;

        info!(
            "Published '{}' to {} as {}",
            submission.title, self.name, article_id
        );
        Ok(article_id)
    }
}
