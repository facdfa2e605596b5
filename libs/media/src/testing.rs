//! In-memory asset host for exercising upload flows without S3

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::error::{MediaError, MediaResult};
use crate::models::{HostedAsset, StagedFile};
use crate::uploader::MediaUploader;

#[derive(Debug, Default)]
struct Recorded {
    hosted: Vec<String>,
    discarded: Vec<String>,
    removed: Vec<String>,
    failing_names: HashSet<String>,
    stalling_names: HashSet<String>,
    fail_discards: bool,
}

/// Uploader double that records hosted and discarded assets
#[derive(Debug, Clone, Default)]
pub struct RecordingUploader {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any upload whose original file name matches
    pub fn fail_on(self, file_name: &str) -> Self {
        self.lock().failing_names.insert(file_name.to_string());
        self
    }

    /// Never complete uploads whose original file name matches
    pub fn stall_on(self, file_name: &str) -> Self {
        self.lock().stalling_names.insert(file_name.to_string());
        self
    }

    /// Make every discard call fail
    pub fn fail_discards(self) -> Self {
        self.lock().fail_discards = true;
        self
    }

    /// Ids of every asset uploaded so far, in completion order
    pub fn hosted(&self) -> Vec<String> {
        self.lock().hosted.clone()
    }

    /// Ids passed to `discard`, in call order
    pub fn discarded(&self) -> Vec<String> {
        self.lock().discarded.clone()
    }

    /// Assets still hosted: uploaded and not successfully discarded
    pub fn live(&self) -> Vec<String> {
        let recorded = self.lock();
        recorded
            .hosted
            .iter()
            .filter(|id| !recorded.removed.contains(id))
            .cloned()
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl MediaUploader for RecordingUploader {
    async fn upload(&self, file: &StagedFile) -> MediaResult<HostedAsset> {
        let id = format!("{}/{}.{}", file.kind.folder(), Uuid::new_v4(), file.extension());

        let name = file.original_name.as_deref().unwrap_or_default();
        let stalls = self.lock().stalling_names.contains(name);
        if stalls {
            futures::future::pending::<()>().await;
        }

        let mut recorded = self.lock();
        if let Some(name) = &file.original_name {
            if recorded.failing_names.contains(name) {
                return Err(MediaError::Upload {
                    key: id,
                    reason: format!("asset host rejected {}", name),
                });
            }
        }

        recorded.hosted.push(id.clone());
        Ok(HostedAsset {
            url: format!("https://media.test/{}", id),
            id,
        })
    }

    async fn discard(&self, asset_id: &str) -> MediaResult<()> {
        let mut recorded = self.lock();
        recorded.discarded.push(asset_id.to_string());
        if recorded.fail_discards {
            return Err(MediaError::Delete {
                key: asset_id.to_string(),
                reason: "asset host unavailable".to_string(),
            });
        }
        recorded.removed.push(asset_id.to_string());
        Ok(())
    }
}
