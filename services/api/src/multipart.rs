//! Reading event submissions out of a multipart body

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use futures::TryStreamExt;
use media::{MediaError, StagedFile, StagingArea};
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::models::SubmissionForm;

/// Name of the file parts carrying media
pub const MEDIA_FIELD: &str = "media";

/// Collect text fields into a form and stream file parts into staging
///
/// On any failure the files staged so far are released before the error is
/// returned.
pub async fn read_submission(
    staging: &StagingArea,
    mut multipart: Multipart,
) -> ApiResult<(SubmissionForm, Vec<StagedFile>)> {
    let mut form = SubmissionForm::default();
    let mut files = Vec::new();

    match read_fields(staging, &mut multipart, &mut form, &mut files).await {
        Ok(()) => Ok((form, files)),
        Err(e) => {
            staging.release(files).await;
            Err(e)
        }
    }
}

async fn read_fields(
    staging: &StagingArea,
    multipart: &mut Multipart,
    form: &mut SubmissionForm,
    files: &mut Vec<StagedFile>,
) -> ApiResult<()> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| body_error(e, "Malformed multipart body"))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == MEDIA_FIELD || field.file_name().is_some() {
            let file_name = field.file_name().map(str::to_string);
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let staged = staging
                .stage(file_name.as_deref(), &content_type, field.map_err(part_error))
                .await?;
            files.push(staged);
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| body_error(e, &format!("Unreadable field {}", name)))?;
        if !form.set(&name, value) {
            debug!("Ignoring unknown form field {}", name);
        }
    }

    Ok(())
}

fn body_error(e: MultipartError, context: &str) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::Validation(format!("{}: {}", context, e.body_text()))
    }
}

fn part_error(e: MultipartError) -> MediaError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        MediaError::TooLarge(e.body_text())
    } else {
        MediaError::Stream(e.body_text())
    }
}
