//! API service routes

use axum::{
    Extension, Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::{AuthUser, auth_middleware},
    models::{Publication, PublicationListResponse, PublicationQuery},
    multipart::read_submission,
    state::AppState,
};

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/req", post(submit_request).get(list_pending))
        .route(
            "/req/:id",
            get(get_request).post(accept_request).delete(deny_request),
        )
        .route("/req/accept/:id", post(accept_request))
        .route("/req/deny/:id", delete(deny_request))
        .route(
            "/publications/:id/like",
            post(like_publication).delete(unlike_publication),
        )
        .route("/users/me/publications", get(my_publications))
        .route("/users/me/likes", get(my_likes))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/publications", get(list_publications))
        .route("/publications/:id", get(get_publication))
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "api-service"
    }))
}

/// Submit a new event request (multipart: fields plus `media` files)
pub async fn submit_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let (form, files) = read_submission(&state.staging, multipart).await?;
    let request = state.moderation.submit(&user, form, files).await?;

    Ok((StatusCode::CREATED, Json(request)))
}

/// List pending requests
pub async fn list_pending(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let pending = state.moderation.list_pending(&user).await?;
    Ok(Json(pending))
}

/// Get one pending request
pub async fn get_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let request = state.moderation.get_pending(&user, id).await?;
    Ok(Json(request))
}

/// Accept a request, turning it into a publication
pub async fn accept_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let publication = state.moderation.accept(&user, id).await?;
    Ok((StatusCode::CREATED, Json(publication)))
}

/// Deny a request
pub async fn deny_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state.moderation.deny(&user, id).await?;
    Ok(Json(json!({
        "message": "Request denied",
        "id": id
    })))
}

/// List publications with filtering, sorting and pagination
pub async fn list_publications(
    State(state): State<AppState>,
    Query(query): Query<PublicationQuery>,
) -> ApiResult<impl IntoResponse> {
    let filter = query.into_filter(Utc::now())?;
    let (items, total) = state.publications.list(&filter).await?;

    Ok(Json(PublicationListResponse {
        items,
        page: filter.page,
        limit: filter.limit,
        total,
    }))
}

/// Get a publication by ID
pub async fn get_publication(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let publication = state
        .publications
        .find(id)
        .await?
        .ok_or_else(|| publication_not_found(id))?;

    Ok(Json(publication))
}

/// Like a publication
pub async fn like_publication(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    if !state.publications.like(user.id, id).await? {
        return Err(publication_not_found(id));
    }
    current_publication(&state, id).await
}

/// Remove a like from a publication
pub async fn unlike_publication(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    if !state.publications.unlike(user.id, id).await? {
        return Err(publication_not_found(id));
    }
    current_publication(&state, id).await
}

/// Publications owned by the caller
pub async fn my_publications(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.publications.owned_by(user.id).await?))
}

/// Publications liked by the caller
pub async fn my_likes(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.publications.liked_by(user.id).await?))
}

async fn current_publication(state: &AppState, id: Uuid) -> ApiResult<Json<Publication>> {
    state
        .publications
        .find(id)
        .await?
        .map(Json)
        .ok_or_else(|| publication_not_found(id))
}

fn publication_not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("Publication {} not found", id))
}
