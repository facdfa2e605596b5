//! Application state shared across handlers

use common::auth::TokenVerifier;
use common::cache::TokenDenylist;
use media::StagingArea;
use std::sync::Arc;

use crate::moderation::Moderation;
use crate::repositories::{PublicationStore, UserDirectory};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserDirectory>,
    pub publications: Arc<dyn PublicationStore>,
    pub moderation: Moderation,
    pub staging: StagingArea,
    pub verifier: TokenVerifier,
    pub denylist: Arc<dyn TokenDenylist>,
    /// Body limit for multipart submissions
    pub max_upload_bytes: usize,
}
