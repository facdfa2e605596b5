//! Layered HTTP settings for the service binaries
//!
//! Defaults are overridden by environment variables carrying the service
//! prefix, e.g. `API_BIND_ADDRESS` or `AUTH_SECURE_COOKIES`.

use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::path::PathBuf;

/// HTTP-facing settings shared by every service
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Socket address the listener binds to
    pub bind_address: String,
    /// Directory where multipart file parts are staged before upload
    pub upload_dir: PathBuf,
    /// Request body limit for multipart routes
    pub max_upload_bytes: usize,
    /// Mark session cookies `Secure` and `SameSite=None`
    pub secure_cookies: bool,
}

impl ServerSettings {
    /// Load settings for the service identified by `prefix`
    pub fn load(prefix: &str, default_bind: &str) -> Result<Self, ConfigError> {
        let upload_dir = std::env::temp_dir().join("event-board-uploads");

        Config::builder()
            .set_default("bind_address", default_bind)?
            .set_default("upload_dir", upload_dir.to_string_lossy().to_string())?
            .set_default("max_upload_bytes", 50_i64 * 1024 * 1024)?
            .set_default("secure_cookies", false)?
            .add_source(Environment::with_prefix(prefix).try_parsing(true))
            .build()?
            .try_deserialize()
    }
}
