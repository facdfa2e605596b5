//! Asset host configuration

use crate::error::{MediaError, MediaResult};
use crate::models::HostedAsset;

/// Asset host configuration
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Bucket that receives uploaded media
    pub bucket_name: String,
    /// Public URL prefix under which bucket keys are served
    pub public_base_url: String,
    /// Key prefix for every object this service writes
    pub key_prefix: String,
    /// Custom S3-compatible endpoint (MinIO, LocalStack)
    pub endpoint_url: Option<String>,
}

impl MediaConfig {
    /// Create a new MediaConfig from environment variables
    ///
    /// # Environment Variables
    /// - `MEDIA_BUCKET_NAME`: bucket name (default: "media-bucket")
    /// - `MEDIA_PUBLIC_BASE_URL`: public URL prefix (default: virtual-hosted S3 URL of the bucket)
    /// - `MEDIA_KEY_PREFIX`: object key prefix (default: "events")
    /// - `MEDIA_S3_ENDPOINT`: optional custom endpoint
    pub fn from_env() -> MediaResult<Self> {
        let bucket_name =
            std::env::var("MEDIA_BUCKET_NAME").unwrap_or_else(|_| "media-bucket".to_string());
        if bucket_name.trim().is_empty() {
            return Err(MediaError::Configuration(
                "MEDIA_BUCKET_NAME must not be empty".to_string(),
            ));
        }

        let public_base_url = std::env::var("MEDIA_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("https://{}.s3.amazonaws.com", bucket_name));

        let key_prefix = std::env::var("MEDIA_KEY_PREFIX").unwrap_or_else(|_| "events".to_string());

        let endpoint_url = std::env::var("MEDIA_S3_ENDPOINT")
            .ok()
            .filter(|url| !url.trim().is_empty());

        Ok(Self {
            bucket_name,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            key_prefix: key_prefix.trim_matches('/').to_string(),
            endpoint_url,
        })
    }

    /// Public URL for an object key
    pub fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    /// Asset every new profile starts with
    pub fn placeholder_avatar(&self) -> HostedAsset {
        let id = "avatars/placeholder.jpg".to_string();
        HostedAsset {
            url: self.url_for(&id),
            id,
        }
    }
}
