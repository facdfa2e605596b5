//! Router harness over in-memory stores, a recording uploader and fixture keys

#![allow(dead_code)]

use api::{AppState, create_router, moderation::Moderation, repositories::UserSummary, testing::MemoryStore};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use common::auth::{Claims, TokenVerifier};
use common::cache::MemoryDenylist;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use media::{StagingArea, testing::RecordingUploader};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;
use uuid::Uuid;

const PRIVATE_KEY: &str = include_str!("../../../../fixtures/jwt/private.pem");
const PUBLIC_KEY: &str = include_str!("../../../../fixtures/jwt/public.pem");

pub const BOUNDARY: &str = "event-board-test-boundary";

pub struct Harness {
    pub app: Router,
    pub store: MemoryStore,
    pub uploader: RecordingUploader,
    pub denylist: MemoryDenylist,
    pub staging_dir: PathBuf,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_uploader(RecordingUploader::new())
    }

    pub fn with_uploader(uploader: RecordingUploader) -> Self {
        let store = MemoryStore::new();
        let denylist = MemoryDenylist::new();
        let staging_dir = std::env::temp_dir().join(format!("api-routes-{}", Uuid::new_v4()));
        let staging = StagingArea::new(staging_dir.clone());

        let state = AppState {
            users: Arc::new(store.clone()),
            publications: Arc::new(store.clone()),
            moderation: Moderation::new(
                Arc::new(store.clone()),
                Arc::new(uploader.clone()),
                staging.clone(),
            ),
            staging,
            verifier: TokenVerifier::from_public_pem(PUBLIC_KEY).unwrap(),
            denylist: Arc::new(denylist.clone()),
            max_upload_bytes: 1024 * 1024,
        };

        Self {
            app: create_router(state),
            store,
            uploader,
            denylist,
            staging_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }

    /// Files left behind in the staging directory
    pub fn staged_leftovers(&self) -> usize {
        std::fs::read_dir(&self.staging_dir)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Session token for a user, as the auth service would issue it
pub fn token_for(user: &UserSummary) -> String {
    let claims = Claims {
        sub: user.id,
        role: user.role,
        iat: now(),
        exp: now() + 604_800,
    };
    let key = EncodingKey::from_rsa_pem(PRIVATE_KEY.as_bytes()).unwrap();
    encode(&Header::new(Algorithm::RS256), &claims, &key).unwrap()
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    with_auth(Request::get(uri), token).body(Body::empty()).unwrap()
}

pub fn post(uri: &str, token: Option<&str>) -> Request<Body> {
    with_auth(Request::post(uri), token).body(Body::empty()).unwrap()
}

pub fn delete(uri: &str, token: Option<&str>) -> Request<Body> {
    with_auth(Request::delete(uri), token).body(Body::empty()).unwrap()
}

fn with_auth(builder: axum::http::request::Builder, token: Option<&str>) -> axum::http::request::Builder {
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, bearer(token)),
        None => builder,
    }
}

/// A file part for [`submission`]
pub struct FilePart<'a> {
    pub name: &'a str,
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub bytes: &'a [u8],
}

/// Multipart `POST /req` carrying the given text fields and files
pub fn submission(token: &str, fields: &[(&str, &str)], files: &[FilePart<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    for file in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, file.name, file.file_name, file.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(file.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::post("/req")
        .header(header::AUTHORIZATION, bearer(token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

/// The client's field set for a complete "Jazz Night" submission
pub fn jazz_night() -> Vec<(&'static str, &'static str)> {
    vec![
        ("titles", "Jazz Night"),
        ("descriptions", "Live music"),
        ("locations", r#"{"lat": 10, "long": 20}"#),
        ("category", "musical"),
        ("startDates", "2030-03-01T20:00:00Z"),
        ("endDates", "2030-03-01T23:00:00Z"),
    ]
}

pub async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn expect_status(response: Response, status: StatusCode) -> Value {
    assert_eq!(response.status(), status);
    json_body(response).await
}
