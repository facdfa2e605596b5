//! Profile updates: username, email and profile picture

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use futures::TryStreamExt;
use media::{MediaError, StagedFile, StagingArea};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};
use crate::models::{UpdateUser, User};
use crate::state::AppState;
use crate::validation::{validate_email, validate_username};

/// Content types accepted for profile pictures
pub const PICTURE_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

/// Name of the file part carrying the picture
pub const PICTURE_FIELD: &str = "media";

/// Raw profile update as read from the multipart body
#[derive(Debug, Default)]
pub struct ProfileForm {
    pub username: Option<String>,
    pub email: Option<String>,
    pub picture: Option<StagedFile>,
}

/// Read a profile update, staging the picture if one was sent
pub async fn read_profile_form(
    staging: &StagingArea,
    mut multipart: Multipart,
) -> AuthResult<ProfileForm> {
    let mut form = ProfileForm::default();

    match read_fields(staging, &mut multipart, &mut form).await {
        Ok(()) => Ok(form),
        Err(e) => {
            if let Some(picture) = form.picture.take() {
                staging.release(vec![picture]).await;
            }
            Err(e)
        }
    }
}

async fn read_fields(
    staging: &StagingArea,
    multipart: &mut Multipart,
    form: &mut ProfileForm,
) -> AuthResult<()> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| body_error(e, "Malformed multipart body"))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == PICTURE_FIELD {
            if form.picture.is_some() {
                return Err(AuthError::Validation(
                    "Only one profile picture can be uploaded".to_string(),
                ));
            }
            let content_type = field.content_type().unwrap_or_default().to_ascii_lowercase();
            if !PICTURE_TYPES.contains(&content_type.as_str()) {
                return Err(AuthError::Validation(format!(
                    "Profile pictures must be JPEG or PNG, got {}",
                    if content_type.is_empty() { "no content type" } else { content_type.as_str() }
                )));
            }
            let file_name = field.file_name().map(str::to_string);
            let staged = staging
                .stage(file_name.as_deref(), &content_type, field.map_err(part_error))
                .await?;
            form.picture = Some(staged);
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| body_error(e, &format!("Unreadable field {}", name)))?;
        let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
        match name.as_str() {
            "username" => form.username = value,
            "email" => form.email = value,
            other => debug!("Ignoring unknown profile field {}", other),
        }
    }

    Ok(())
}

fn body_error(e: MultipartError, context: &str) -> AuthError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AuthError::PayloadTooLarge
    } else {
        AuthError::Validation(format!("{}: {}", context, e.body_text()))
    }
}

fn part_error(e: MultipartError) -> MediaError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        MediaError::TooLarge(e.body_text())
    } else {
        MediaError::Stream(e.body_text())
    }
}

/// Apply a profile update for `user_id`
///
/// The staged picture, if any, is released whatever the outcome.
pub async fn update_profile(state: &AppState, user_id: Uuid, form: ProfileForm) -> AuthResult<User> {
    let ProfileForm {
        username,
        email,
        picture,
    } = form;

    let result = apply(state, user_id, username, email, picture.as_ref()).await;
    if let Some(picture) = picture {
        state.staging.release(vec![picture]).await;
    }
    result
}

async fn apply(
    state: &AppState,
    user_id: Uuid,
    username: Option<String>,
    email: Option<String>,
    picture: Option<&StagedFile>,
) -> AuthResult<User> {
    if let Some(username) = &username {
        validate_username(username).map_err(AuthError::Validation)?;
        if state.user_repository.username_taken(username, Some(user_id)).await? {
            return Err(AuthError::Conflict("Username already taken".to_string()));
        }
    }
    if let Some(email) = &email {
        validate_email(email).map_err(AuthError::Validation)?;
        if state.user_repository.email_taken(email, Some(user_id)).await? {
            return Err(AuthError::Conflict("Email already registered".to_string()));
        }
    }

    let current = state
        .user_repository
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AuthError::NotFound("User not found".to_string()))?;

    let profile_picture = match picture {
        Some(file) => Some(state.uploader.upload(file).await?),
        None => None,
    };

    let changes = UpdateUser {
        username,
        email,
        profile_picture,
    };
    if changes.is_empty() {
        return Ok(current);
    }

    let updated = match state.user_repository.update(user_id, &changes).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            discard_new_picture(state, &changes).await;
            return Err(AuthError::NotFound("User not found".to_string()));
        }
        Err(e) => {
            discard_new_picture(state, &changes).await;
            if e.is_unique_violation() {
                return Err(AuthError::Conflict(
                    "Username or email already taken".to_string(),
                ));
            }
            return Err(e.into());
        }
    };

    if changes.profile_picture.is_some()
        && current.profile_picture.id != state.placeholder_avatar.id
    {
        if let Err(e) = state.uploader.discard(&current.profile_picture.id).await {
            warn!(
                "Failed to discard previous profile picture {}: {}",
                current.profile_picture.id, e
            );
        }
    }

    info!("Updated profile of user {}", user_id);
    Ok(updated)
}

async fn discard_new_picture(state: &AppState, changes: &UpdateUser) {
    if let Some(picture) = &changes.profile_picture {
        if let Err(e) = state.uploader.discard(&picture.id).await {
            warn!("Failed to discard orphaned picture {}: {}", picture.id, e);
        }
    }
}
