//! Local transient storage for uploaded file parts
//!
//! Multipart parts are streamed to disk before being pushed to the asset
//! host. Callers hand staged files back to [`StagingArea::release`] once
//! they are done; a [`StagedFile`] dropped on any other path, including a
//! cancelled request, removes its file itself.

use futures::{Stream, StreamExt};
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{MediaError, MediaResult};
use crate::models::{MediaKind, StagedFile};

/// Directory holding staged uploads
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    /// Stream one part to a fresh file in the staging directory
    ///
    /// The content type is checked before anything touches the disk. A
    /// partially written file is removed if the stream fails or the future
    /// is dropped mid-write.
    pub async fn stage<S, B, E>(
        &self,
        original_name: Option<&str>,
        content_type: &str,
        chunks: S,
    ) -> MediaResult<StagedFile>
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: Into<MediaError>,
    {
        let kind = MediaKind::from_content_type(content_type)
            .ok_or_else(|| MediaError::UnsupportedType(content_type.to_string()))?;

        fs::create_dir_all(&self.dir).await?;
        let mut staged = StagedFile::new(
            self.dir.join(Uuid::new_v4().to_string()),
            content_type,
            kind,
            original_name.map(str::to_string),
            0,
        );

        let written = write_stream(&staged.path, chunks).await;
        match written {
            Ok(size) => {
                debug!("Staged {} bytes at {}", size, staged.path.display());
                staged.size = size;
                Ok(staged)
            }
            Err(e) => {
                self.release(vec![staged]).await;
                Err(e)
            }
        }
    }

    /// Delete staged files, logging failures instead of returning them
    pub async fn release(&self, files: Vec<StagedFile>) {
        for mut file in files {
            remove_quietly(&file.path).await;
            file.mark_released();
        }
    }
}

async fn write_stream<S, B, E>(path: &std::path::Path, chunks: S) -> MediaResult<u64>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<MediaError>,
{
    let mut chunks = std::pin::pin!(chunks);
    let mut file = fs::File::create(path).await?;
    let mut size = 0u64;

    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.map_err(Into::into)?;
        let bytes = chunk.as_ref();
        file.write_all(bytes).await?;
        size += bytes.len() as u64;
    }

    file.flush().await?;
    Ok(size)
}

async fn remove_quietly(path: &std::path::Path) {
    match fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove staged file {}: {}", path.display(), e),
    }
}
