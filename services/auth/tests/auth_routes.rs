use auth::{
    AppState, create_router,
    jwt::{DEFAULT_TOKEN_EXPIRY, JwtConfig, JwtService},
    testing::MemoryUserRepository,
};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use common::auth::Role;
use common::cache::MemoryDenylist;
use media::{HostedAsset, StagingArea, testing::RecordingUploader};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

const PRIVATE_KEY: &str = include_str!("../../../fixtures/jwt/private.pem");
const PUBLIC_KEY: &str = include_str!("../../../fixtures/jwt/public.pem");
const BOUNDARY: &str = "profile-test-boundary";

struct Harness {
    app: Router,
    users: MemoryUserRepository,
    uploader: RecordingUploader,
}

impl Harness {
    fn new(secure_cookies: bool) -> Self {
        let users = MemoryUserRepository::new();
        let uploader = RecordingUploader::new();
        let jwt_service = JwtService::new(&JwtConfig {
            private_key: PRIVATE_KEY.to_string(),
            public_key: PUBLIC_KEY.to_string(),
            token_expiry: DEFAULT_TOKEN_EXPIRY,
        })
        .unwrap();

        let state = AppState {
            user_repository: Arc::new(users.clone()),
            jwt_service,
            denylist: Arc::new(MemoryDenylist::new()),
            uploader: Arc::new(uploader.clone()),
            staging: StagingArea::new(
                std::env::temp_dir().join(format!("auth-routes-{}", Uuid::new_v4())),
            ),
            placeholder_avatar: HostedAsset {
                id: "avatars/placeholder.jpg".to_string(),
                url: "https://media.test/avatars/placeholder.jpg".to_string(),
            },
            secure_cookies,
            max_upload_bytes: 1024 * 1024,
        };

        Self {
            app: create_router(state),
            users,
            uploader,
        }
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }

    async fn register(&self, username: &str, email: &str) -> Value {
        let response = self
            .send(json_request(
                "POST",
                "/register",
                json!({"username": username, "email": email, "password": "correct horse"}),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body(response).await
    }

    async fn login(&self, email: &str) -> String {
        let response = self
            .send(json_request(
                "POST",
                "/login",
                json!({"email": email, "password": "correct horse"}),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        body(response).await["token"].as_str().unwrap().to_string()
    }
}

fn json_request(method: &str, uri: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

fn authed(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

fn profile_request(token: &str, fields: &[(&str, &str)], picture: Option<(&str, &[u8])>) -> Request<Body> {
    let mut payload = Vec::new();
    for (name, value) in fields {
        payload.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((content_type, bytes)) = picture {
        payload.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"media\"; filename=\"avatar\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, content_type
            )
            .as_bytes(),
        );
        payload.extend_from_slice(bytes);
        payload.extend_from_slice(b"\r\n");
    }
    payload.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::patch("/profile")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(payload))
        .unwrap()
}

async fn body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_register_defaults() {
    let harness = Harness::new(false);
    let user = harness.register("  ana_92 ", " ana@example.com ").await;

    assert_eq!(user["username"], "ana_92");
    assert_eq!(user["email"], "ana@example.com");
    assert_eq!(user["role"], "user");
    assert_eq!(user["profilePicture"]["id"], "avatars/placeholder.jpg");
    assert!(user.get("passwordHash").is_none());
    assert_eq!(harness.users.len(), 1);
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_bad_input() {
    let harness = Harness::new(false);
    harness.register("ana", "ana@example.com").await;

    let response = harness
        .send(json_request(
            "POST",
            "/register",
            json!({"username": "ana", "email": "other@example.com", "password": "correct horse"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = harness
        .send(json_request(
            "POST",
            "/register",
            json!({"username": "ben", "email": "ana@example.com", "password": "correct horse"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = harness
        .send(json_request(
            "POST",
            "/register",
            json!({"username": "ben", "email": "not-an-email", "password": "correct horse"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = harness
        .send(json_request(
            "POST",
            "/register",
            json!({"username": "ben", "email": "ben@example.com", "password": "short"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(harness.users.len(), 1);
}

#[tokio::test]
async fn test_login_sets_cookie_and_returns_token() {
    let harness = Harness::new(false);
    harness.register("ana", "ana@example.com").await;

    let response = harness
        .send(json_request(
            "POST",
            "/login",
            json!({"email": "ana@example.com", "password": "correct horse"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("authToken="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(!cookie.contains("Secure"));

    let body = body(response).await;
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], DEFAULT_TOKEN_EXPIRY);
    assert_eq!(body["user"]["username"], "ana");

    let cookie_value = cookie.split(';').next().unwrap().to_string();
    let response = harness
        .send(
            Request::get("/me")
                .header(header::COOKIE, cookie_value)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_secure_cookie_flags() {
    let harness = Harness::new(true);
    harness.register("ana", "ana@example.com").await;

    let response = harness
        .send(json_request(
            "POST",
            "/login",
            json!({"email": "ana@example.com", "password": "correct horse"}),
        ))
        .await;
    let cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("SameSite=None"));
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let harness = Harness::new(false);
    harness.register("ana", "ana@example.com").await;

    let wrong_password = harness
        .send(json_request(
            "POST",
            "/login",
            json!({"email": "ana@example.com", "password": "wrong horse"}),
        ))
        .await;
    let unknown_email = harness
        .send(json_request(
            "POST",
            "/login",
            json!({"email": "nobody@example.com", "password": "correct horse"}),
        ))
        .await;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body(wrong_password).await, body(unknown_email).await);
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let harness = Harness::new(false);
    harness.register("ana", "ana@example.com").await;
    let token = harness.login("ana@example.com").await;

    let response = harness.send(authed("GET", "/me", &token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = harness.send(authed("POST", "/logout", &token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cleared = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cleared.starts_with("authToken="));

    let response = harness.send(authed("GET", "/me", &token)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = harness.send(authed("POST", "/logout", &token)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_access_check_uses_stored_role() {
    let harness = Harness::new(false);
    let registered = harness.register("ana", "ana@example.com").await;
    let token = harness.login("ana@example.com").await;

    let response = harness.send(authed("GET", "/access/user", &token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = harness.send(authed("GET", "/access/admin", &token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = harness.send(authed("GET", "/access/root", &token)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Promotion takes effect without a new token
    let id: Uuid = registered["id"].as_str().unwrap().parse().unwrap();
    let mut user = harness.users.get(id).unwrap();
    user.role = Role::Admin;
    harness.users.put(user);

    let response = harness.send(authed("GET", "/access/admin", &token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body(response).await["role"], "admin");
}

#[tokio::test]
async fn test_protected_routes_require_a_token() {
    let harness = Harness::new(false);

    let response = harness
        .send(Request::get("/me").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = harness.send(authed("GET", "/me", "garbage")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_update() {
    let harness = Harness::new(false);
    harness.register("ana", "ana@example.com").await;
    harness.register("ben", "ben@example.com").await;
    let token = harness.login("ana@example.com").await;

    let response = harness
        .send(profile_request(
            &token,
            &[("username", "ana_v2")],
            Some(("image/png", b"\x89PNG")),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let profile = body(response).await;
    assert_eq!(profile["username"], "ana_v2");
    assert_eq!(profile["email"], "ana@example.com");
    let first_picture = profile["profilePicture"]["id"].as_str().unwrap().to_string();
    assert!(first_picture.starts_with("photos/"));
    // The placeholder is shared and never discarded
    assert!(harness.uploader.discarded().is_empty());

    let response = harness
        .send(profile_request(&token, &[], Some(("image/jpeg", b"\xff\xd8"))))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(harness.uploader.discarded(), vec![first_picture]);
    assert_eq!(harness.uploader.live().len(), 1);

    let response = harness
        .send(profile_request(&token, &[("email", "ben@example.com")], None))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = harness
        .send(profile_request(&token, &[], Some(("image/gif", b"GIF89a"))))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(harness.uploader.hosted().len(), 2);
}

#[tokio::test]
async fn test_profile_picture_over_the_body_limit_is_rejected() {
    let harness = Harness::new(false);
    harness.register("ana", "ana@example.com").await;
    let token = harness.login("ana@example.com").await;

    let oversized = vec![0u8; 2 * 1024 * 1024];
    let response = harness
        .send(profile_request(&token, &[], Some(("image/png", oversized.as_slice()))))
        .await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(harness.uploader.hosted().is_empty());
}

#[tokio::test]
async fn test_health() {
    let harness = Harness::new(false);
    let response = harness
        .send(Request::get("/health").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body(response).await["service"], "auth-service");
}
