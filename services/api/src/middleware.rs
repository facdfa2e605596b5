//! Authentication middleware for session token validation

use axum::{
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use common::auth::{Role, token_from_headers};
use tracing::{debug, error};
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// Authenticated caller, passed explicitly into workflow operations
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
}

impl AuthUser {
    /// Fail with `Forbidden` unless the caller holds `role`
    pub fn require(&self, role: Role, action: &str) -> Result<(), ApiError> {
        if self.role == role {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!(
                "Only {} accounts may {}",
                role, action
            )))
        }
    }
}

/// Authentication middleware
///
/// Reads the token from the `authToken` cookie or the bearer header, checks
/// its signature, expiry and revocation, and confirms the user still exists.
/// The stored role is authoritative over the role in the claims.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = token_from_headers(req.headers()).ok_or(ApiError::Unauthenticated)?;

    let claims = state.verifier.verify(&token).map_err(|e| {
        debug!("Rejected session token: {}", e);
        ApiError::Unauthenticated
    })?;

    let revoked = state.denylist.is_revoked(&token).await.map_err(|e| {
        error!("Failed to check token denylist: {}", e);
        ApiError::InternalServerError
    })?;
    if revoked {
        debug!("Rejected revoked token for user {}", claims.sub);
        return Err(ApiError::Unauthenticated);
    }

    let user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| {
            debug!("Token refers to unknown user {}", claims.sub);
            ApiError::Unauthenticated
        })?;

    req.extensions_mut().insert(AuthUser {
        id: user.id,
        username: user.username,
        role: user.role,
    });

    Ok(next.run(req).await)
}
