//! Media Uploader: pushes staged files to the S3 asset host

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{Client, error::DisplayErrorContext, primitives::ByteStream};
use tracing::{error, info};
use uuid::Uuid;

use crate::config::MediaConfig;
use crate::error::{MediaError, MediaResult};
use crate::models::{HostedAsset, StagedFile};

/// Remote asset host
#[async_trait]
pub trait MediaUploader: Send + Sync {
    /// Host a staged file and return its generated id and stable URL
    async fn upload(&self, file: &StagedFile) -> MediaResult<HostedAsset>;

    /// Remove a previously hosted asset
    async fn discard(&self, asset_id: &str) -> MediaResult<()>;
}

/// S3-backed asset host
#[derive(Clone)]
pub struct S3MediaUploader {
    s3_client: Client,
    config: MediaConfig,
}

impl S3MediaUploader {
    pub fn new(s3_client: Client, config: MediaConfig) -> Self {
        Self { s3_client, config }
    }

    /// Build a client from the default AWS credential chain
    pub async fn from_config(config: MediaConfig) -> Self {
        let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;

        let s3_client = match &config.endpoint_url {
            Some(endpoint) => {
                info!("Using custom S3 endpoint: {}", endpoint);
                let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
                    .endpoint_url(endpoint)
                    .force_path_style(true)
                    .build();
                Client::from_conf(s3_config)
            }
            None => Client::new(&sdk_config),
        };

        Self::new(s3_client, config)
    }

    fn object_key(&self, file: &StagedFile) -> String {
        let key = format!(
            "{}/{}.{}",
            file.kind.folder(),
            Uuid::new_v4(),
            file.extension()
        );
        if self.config.key_prefix.is_empty() {
            key
        } else {
            format!("{}/{}", self.config.key_prefix, key)
        }
    }
}

#[async_trait]
impl MediaUploader for S3MediaUploader {
    async fn upload(&self, file: &StagedFile) -> MediaResult<HostedAsset> {
        let key = self.object_key(file);

        let body = ByteStream::from_path(&file.path)
            .await
            .map_err(|e| MediaError::Upload {
                key: key.clone(),
                reason: e.to_string(),
            })?;

        self.s3_client
            .put_object()
            .bucket(&self.config.bucket_name)
            .key(&key)
            .content_type(&file.content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                error!("Upload of {} to {} failed", key, self.config.bucket_name);
                MediaError::Upload {
                    key: key.clone(),
                    reason: DisplayErrorContext(&e).to_string(),
                }
            })?;

        info!("Uploaded {} ({} bytes)", key, file.size);
        Ok(HostedAsset {
            url: self.config.url_for(&key),
            id: key,
        })
    }

    async fn discard(&self, asset_id: &str) -> MediaResult<()> {
        self.s3_client
            .delete_object()
            .bucket(&self.config.bucket_name)
            .key(asset_id)
            .send()
            .await
            .map_err(|e| MediaError::Delete {
                key: asset_id.to_string(),
                reason: DisplayErrorContext(&e).to_string(),
            })?;

        info!("Deleted {} from {}", asset_id, self.config.bucket_name);
        Ok(())
    }
}
