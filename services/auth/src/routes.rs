//! Authentication service routes

use axum::{
    Extension, Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use common::auth::{AUTH_COOKIE, Role};
use serde_json::json;
use tracing::{error, info};

use crate::{
    error::{AuthError, AuthResult},
    jwt::remaining_lifetime,
    middleware::{AuthUser, Session, auth_middleware},
    models::{LoginCredentials, NewUser, RegisterRequest, TokenResponse, UserProfile},
    password::{hash_password, verify_password},
    profile::{read_profile_form, update_profile},
    state::AppState,
    validation::{validate_email, validate_password, validate_username},
};

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/access/:role", get(check_access))
        .route("/profile", patch(update_profile_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/register", post(register))
        .route("/login", post(login))
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

/// Register a new account
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AuthResult<impl IntoResponse> {
    let username = payload.username.trim().to_string();
    let email = payload.email.trim().to_string();

    validate_username(&username).map_err(AuthError::Validation)?;
    validate_email(&email).map_err(AuthError::Validation)?;
    validate_password(&payload.password).map_err(AuthError::Validation)?;

    if state.user_repository.username_taken(&username, None).await? {
        return Err(AuthError::Conflict("Username already taken".to_string()));
    }
    if state.user_repository.email_taken(&email, None).await? {
        return Err(AuthError::Conflict("Email already registered".to_string()));
    }

    let new_user = NewUser {
        username,
        email,
        password_hash: hash_password(&payload.password)?,
        role: Role::User,
        profile_picture: state.placeholder_avatar.clone(),
    };

    let user = state
        .user_repository
        .create(&new_user)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                AuthError::Conflict("Username or email already taken".to_string())
            } else {
                e.into()
            }
        })?;

    info!("Registered user {} ({})", user.username, user.id);
    Ok((StatusCode::CREATED, Json(UserProfile::from(user))))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginCredentials>,
) -> AuthResult<impl IntoResponse> {
    let email = payload.email.trim();
    info!("Login attempt for {}", email);

    let user = state
        .user_repository
        .find_by_email(email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(&payload.password, &user.password_hash) {
        return Err(AuthError::InvalidCredentials);
    }

    let issued = state.jwt_service.issue(&user)?;
    let jar = jar.add(session_cookie(issued.token.clone(), state.secure_cookies));

    let response = TokenResponse {
        token: issued.token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_service.token_expiry(),
        user: UserProfile::from(user),
    };

    Ok((StatusCode::OK, jar, Json(response)))
}

/// Logout endpoint: revoke the current token and clear the cookie
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    jar: CookieJar,
) -> AuthResult<impl IntoResponse> {
    let ttl = remaining_lifetime(&session.claims)?;
    state
        .denylist
        .revoke(&session.token, ttl)
        .await
        .map_err(|e| {
            error!("Failed to revoke token: {}", e);
            AuthError::InternalServerError
        })?;

    info!("User {} logged out", session.claims.sub);
    let jar = jar.remove(Cookie::build((AUTH_COOKIE, "")).path("/"));

    Ok((
        StatusCode::OK,
        jar,
        Json(json!({"message": "Logged out successfully"})),
    ))
}

/// Current user's profile
pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AuthResult<impl IntoResponse> {
    let user = state
        .user_repository
        .find_by_id(user.id)
        .await?
        .ok_or(AuthError::Unauthenticated)?;

    Ok(Json(UserProfile::from(user)))
}

/// Check whether the caller holds a role
pub async fn check_access(
    Extension(user): Extension<AuthUser>,
    Path(role): Path<String>,
) -> AuthResult<impl IntoResponse> {
    let role = role
        .parse::<Role>()
        .map_err(|e| AuthError::Validation(e.to_string()))?;

    if user.role != role {
        return Err(AuthError::Forbidden(format!("Requires the {} role", role)));
    }

    Ok(Json(json!({
        "id": user.id,
        "role": user.role
    })))
}

/// Update username, email or profile picture (multipart)
pub async fn update_profile_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> AuthResult<impl IntoResponse> {
    let form = read_profile_form(&state.staging, multipart).await?;
    let updated = update_profile(&state, user.id, form).await?;

    Ok(Json(UserProfile::from(updated)))
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(if secure { SameSite::None } else { SameSite::Lax })
        .build()
}
