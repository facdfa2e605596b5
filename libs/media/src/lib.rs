//! Media handling for event submissions and profile pictures
//!
//! Uploaded parts are staged on local disk ([`staging`]), pushed to the S3
//! asset host ([`uploader`]) and referenced from requests and publications
//! through a [`models::MediaBundle`].

pub mod config;
pub mod error;
pub mod models;
pub mod staging;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod uploader;

pub use config::MediaConfig;
pub use error::{MediaError, MediaResult};
pub use models::{HostedAsset, MediaBundle, MediaKind, StagedFile};
pub use staging::StagingArea;
pub use uploader::{MediaUploader, S3MediaUploader};
