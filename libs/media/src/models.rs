//! Media bundle data types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Kind of media, decided by content type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify a MIME type; `None` for anything but images and videos
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if essence.starts_with("image/") {
            Some(MediaKind::Image)
        } else if essence.starts_with("video/") {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    /// Folder under which assets of this kind are stored
    pub fn folder(&self) -> &'static str {
        match self {
            MediaKind::Image => "photos",
            MediaKind::Video => "videos",
        }
    }
}

/// A hosted asset: generated identifier plus stable URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostedAsset {
    pub id: String,
    pub url: String,
}

/// Photo and video references embedded in a request or publication
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MediaBundle {
    #[serde(default)]
    pub photos: Vec<HostedAsset>,
    #[serde(default)]
    pub videos: Vec<HostedAsset>,
}

impl MediaBundle {
    /// File an asset under the list matching its kind
    pub fn push(&mut self, kind: MediaKind, asset: HostedAsset) {
        match kind {
            MediaKind::Image => self.photos.push(asset),
            MediaKind::Video => self.videos.push(asset),
        }
    }

    /// All asset identifiers, photos first
    pub fn asset_ids(&self) -> impl Iterator<Item = &str> {
        self.photos
            .iter()
            .chain(self.videos.iter())
            .map(|asset| asset.id.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty() && self.videos.is_empty()
    }
}

/// A file part written to local transient storage, awaiting upload
///
/// The value owns its file: dropping it removes the file from disk unless
/// [`StagingArea::release`](crate::StagingArea::release) already did.
#[derive(Debug)]
pub struct StagedFile {
    pub path: PathBuf,
    pub content_type: String,
    pub kind: MediaKind,
    pub original_name: Option<String>,
    pub size: u64,
    released: bool,
}

impl StagedFile {
    pub fn new(
        path: PathBuf,
        content_type: impl Into<String>,
        kind: MediaKind,
        original_name: Option<String>,
        size: u64,
    ) -> Self {
        Self {
            path,
            content_type: content_type.into(),
            kind,
            original_name,
            size,
            released: false,
        }
    }

    pub(crate) fn mark_released(&mut self) {
        self.released = true;
    }

    /// Extension for the hosted object: client file name first, MIME subtype second
    pub fn extension(&self) -> String {
        let from_name = self
            .original_name
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));

        from_name.unwrap_or_else(|| {
            let subtype = self
                .content_type
                .split(';')
                .next()
                .and_then(|essence| essence.split_once('/'))
                .map(|(_, subtype)| subtype.trim().to_ascii_lowercase())
                .unwrap_or_default();
            match subtype.as_str() {
                "jpeg" => "jpg".to_string(),
                "quicktime" => "mov".to_string(),
                "" => "bin".to_string(),
                other if other.chars().all(|c| c.is_ascii_alphanumeric()) => other.to_string(),
                _ => "bin".to_string(),
            }
        })
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed abandoned staged file {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove abandoned staged file {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}
