//! Application state shared across handlers

use common::cache::TokenDenylist;
use media::{HostedAsset, MediaUploader, StagingArea};
use std::sync::Arc;

use crate::jwt::JwtService;
use crate::repositories::UserRepository;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub user_repository: Arc<dyn UserRepository>,
    pub jwt_service: JwtService,
    pub denylist: Arc<dyn TokenDenylist>,
    pub uploader: Arc<dyn MediaUploader>,
    pub staging: StagingArea,
    /// Picture every new account starts with
    pub placeholder_avatar: HostedAsset,
    /// Mark the session cookie `Secure` and `SameSite=None`
    pub secure_cookies: bool,
    pub max_upload_bytes: usize,
}
