//! Moderation workflow: submission, review and resolution of event requests
//!
//! A request moves from pending to exactly one of published or discarded.
//! Every operation takes the caller explicitly; role checks happen here, not
//! in the HTTP layer.

use chrono::Utc;
use common::auth::Role;
use futures::future::join_all;
use media::{MediaBundle, MediaUploader, StagedFile, StagingArea};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::models::{EventRequest, PendingRequest, Publication, SubmissionForm};
use crate::repositories::RequestStore;

/// Orchestrates request stores and the asset host
#[derive(Clone)]
pub struct Moderation {
    requests: Arc<dyn RequestStore>,
    uploader: Arc<dyn MediaUploader>,
    staging: StagingArea,
}

impl Moderation {
    pub fn new(
        requests: Arc<dyn RequestStore>,
        uploader: Arc<dyn MediaUploader>,
        staging: StagingArea,
    ) -> Self {
        Self {
            requests,
            uploader,
            staging,
        }
    }

    /// Create a pending request from a form and its staged media
    ///
    /// All uploads and the insert succeed together or nothing is stored.
    /// Staged files are released once the store step has settled, whatever
    /// the outcome; if the future is dropped first they remove themselves.
    pub async fn submit(
        &self,
        caller: &AuthUser,
        form: SubmissionForm,
        files: Vec<StagedFile>,
    ) -> ApiResult<EventRequest> {
        let result = self.try_submit(caller, form, &files).await;
        self.staging.release(files).await;
        result
    }

    async fn try_submit(
        &self,
        caller: &AuthUser,
        form: SubmissionForm,
        files: &[StagedFile],
    ) -> ApiResult<EventRequest> {
        caller.require(Role::User, "submit event requests")?;
        let submission = form.validate()?;

        let medias = self.host_all(files).await?;

        let request = EventRequest {
            id: Uuid::new_v4(),
            details: submission.into_details(caller.id, medias),
            created_at: Utc::now(),
        };

        if let Err(e) = self.requests.insert(&request).await {
            error!("Failed to store request from user {}: {}", caller.id, e);
            self.discard_all(&request.details.medias).await;
            return Err(e.into());
        }

        info!(
            "User {} submitted request {} with {} media file(s)",
            caller.id,
            request.id,
            files.len()
        );
        Ok(request)
    }

    /// Upload every staged file concurrently
    ///
    /// Waits for all uploads to settle. If any failed, the ones that
    /// succeeded are discarded and the first failure is returned.
    async fn host_all(&self, files: &[StagedFile]) -> ApiResult<MediaBundle> {
        let results = join_all(files.iter().map(|file| self.uploader.upload(file))).await;

        let mut bundle = MediaBundle::default();
        let mut failure = None;
        for (file, result) in files.iter().zip(results) {
            match result {
                Ok(asset) => bundle.push(file.kind, asset),
                Err(e) => {
                    warn!(
                        "Upload of {} failed: {}",
                        file.original_name.as_deref().unwrap_or("unnamed file"),
                        e
                    );
                    if failure.is_none() {
                        failure = Some(e);
                    }
                }
            }
        }

        match failure {
            None => Ok(bundle),
            Some(e) => {
                self.discard_all(&bundle).await;
                Err(e.into())
            }
        }
    }

    /// Best-effort removal of hosted assets
    async fn discard_all(&self, bundle: &MediaBundle) {
        let ids: Vec<&str> = bundle.asset_ids().collect();
        let results = join_all(ids.iter().map(|id| self.uploader.discard(id))).await;
        for (id, result) in ids.iter().zip(results) {
            if let Err(e) = result {
                warn!("Failed to discard orphaned asset {}: {}", id, e);
            }
        }
    }

    /// Every pending request, oldest first
    pub async fn list_pending(&self, caller: &AuthUser) -> ApiResult<Vec<PendingRequest>> {
        caller.require(Role::Admin, "review event requests")?;
        Ok(self.requests.list_pending().await?)
    }

    /// A single pending request
    pub async fn get_pending(&self, caller: &AuthUser, request_id: Uuid) -> ApiResult<EventRequest> {
        caller.require(Role::Admin, "review event requests")?;
        self.requests
            .find(request_id)
            .await?
            .ok_or_else(|| not_found(request_id))
    }

    /// Publish a pending request under a new identity
    pub async fn accept(&self, caller: &AuthUser, request_id: Uuid) -> ApiResult<Publication> {
        caller.require(Role::Admin, "accept event requests")?;

        let publication = self
            .requests
            .promote(request_id, Uuid::new_v4(), Utc::now())
            .await?
            .ok_or_else(|| not_found(request_id))?;

        info!(
            "Admin {} accepted request {} as publication {}",
            caller.id, request_id, publication.id
        );
        Ok(publication)
    }

    /// Discard a pending request and its hosted media
    pub async fn deny(&self, caller: &AuthUser, request_id: Uuid) -> ApiResult<()> {
        caller.require(Role::Admin, "deny event requests")?;

        let request = self
            .requests
            .delete(request_id)
            .await?
            .ok_or_else(|| not_found(request_id))?;

        info!("Admin {} denied request {}", caller.id, request_id);
        self.discard_all(&request.details.medias).await;
        Ok(())
    }
}

fn not_found(request_id: Uuid) -> ApiError {
    ApiError::NotFound(format!("Request {} not found", request_id))
}
