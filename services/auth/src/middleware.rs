//! Middleware for session token validation and authentication

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use common::auth::{Claims, Role, token_from_headers};
use tracing::{debug, error};
use uuid::Uuid;

use crate::{error::AuthError, state::AppState};

/// Authenticated caller
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
}

/// The raw token and claims of the current session
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub claims: Claims,
}

/// Extract and validate the session token from the cookie or Authorization header
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let token = token_from_headers(req.headers()).ok_or(AuthError::Unauthenticated)?;

    let claims = state.jwt_service.verifier().verify(&token).map_err(|e| {
        debug!("Rejected session token: {}", e);
        AuthError::Unauthenticated
    })?;

    let revoked = state.denylist.is_revoked(&token).await.map_err(|e| {
        error!("Failed to check token denylist: {}", e);
        AuthError::InternalServerError
    })?;
    if revoked {
        return Err(AuthError::Unauthenticated);
    }

    let user = state
        .user_repository
        .find_by_id(claims.sub)
        .await?
        .ok_or(AuthError::Unauthenticated)?;

    req.extensions_mut().insert(AuthUser {
        id: user.id,
        username: user.username,
        role: user.role,
    });
    req.extensions_mut().insert(Session { token, claims });

    Ok(next.run(req).await)
}
