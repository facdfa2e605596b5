mod support;

use axum::body::Body;
use axum::http::{StatusCode, header};
use common::auth::Role;
use common::cache::TokenDenylist;
use media::testing::RecordingUploader;
use support::*;

#[tokio::test]
async fn test_submit_without_media_then_list_pending() {
    let harness = Harness::new();
    let ana = harness.store.add_user("ana", Role::User);
    let admin = harness.store.add_user("root", Role::Admin);

    let response = harness
        .send(submission(&token_for(&ana), &jazz_night(), &[]))
        .await;
    let created = expect_status(response, StatusCode::CREATED).await;
    assert_eq!(created["title"], "Jazz Night");
    assert_eq!(created["ownerId"], ana.id.to_string());
    assert_eq!(created["medias"]["photos"].as_array().unwrap().len(), 0);
    assert_eq!(created["medias"]["videos"].as_array().unwrap().len(), 0);

    let response = harness.send(get("/req", Some(&token_for(&admin)))).await;
    let pending = expect_status(response, StatusCode::OK).await;
    let pending = pending.as_array().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["id"], created["id"]);
    assert_eq!(pending[0]["username"], "ana");
}

#[tokio::test]
async fn test_submit_with_media_releases_staged_files() {
    let harness = Harness::new();
    let ana = harness.store.add_user("ana", Role::User);

    let files = [
        FilePart {
            name: "media",
            file_name: "poster.png",
            content_type: "image/png",
            bytes: b"\x89PNG fake",
        },
        FilePart {
            name: "media",
            file_name: "teaser.mp4",
            content_type: "video/mp4",
            bytes: b"fake mp4",
        },
    ];
    let response = harness
        .send(submission(&token_for(&ana), &jazz_night(), &files))
        .await;
    let created = expect_status(response, StatusCode::CREATED).await;

    assert_eq!(created["medias"]["photos"].as_array().unwrap().len(), 1);
    assert_eq!(created["medias"]["videos"].as_array().unwrap().len(), 1);
    assert!(
        created["medias"]["photos"][0]["url"]
            .as_str()
            .unwrap()
            .starts_with("https://media.test/photos/")
    );
    assert_eq!(harness.uploader.live().len(), 2);
    assert_eq!(harness.staged_leftovers(), 0);
}

#[tokio::test]
async fn test_submit_missing_field_is_rejected() {
    let harness = Harness::new();
    let ana = harness.store.add_user("ana", Role::User);

    let fields: Vec<_> = jazz_night()
        .into_iter()
        .filter(|(name, _)| *name != "category")
        .collect();
    let files = [FilePart {
        name: "media",
        file_name: "poster.png",
        content_type: "image/png",
        bytes: b"png",
    }];
    let response = harness
        .send(submission(&token_for(&ana), &fields, &files))
        .await;
    let body = expect_status(response, StatusCode::BAD_REQUEST).await;

    assert_eq!(body["error"], "category is required");
    assert!(harness.store.request_ids().is_empty());
    assert!(harness.uploader.hosted().is_empty());
    assert_eq!(harness.staged_leftovers(), 0);
}

#[tokio::test]
async fn test_submit_rejects_unsupported_media() {
    let harness = Harness::new();
    let ana = harness.store.add_user("ana", Role::User);

    let files = [
        FilePart {
            name: "media",
            file_name: "poster.png",
            content_type: "image/png",
            bytes: b"png",
        },
        FilePart {
            name: "media",
            file_name: "notes.pdf",
            content_type: "application/pdf",
            bytes: b"%PDF",
        },
    ];
    let response = harness
        .send(submission(&token_for(&ana), &jazz_night(), &files))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(harness.store.request_ids().is_empty());
    assert_eq!(harness.staged_leftovers(), 0);
}

#[tokio::test]
async fn test_submit_over_the_body_limit_is_rejected() {
    let harness = Harness::new();
    let ana = harness.store.add_user("ana", Role::User);

    let oversized = vec![0u8; 2 * 1024 * 1024];
    let files = [FilePart {
        name: "media",
        file_name: "teaser.mp4",
        content_type: "video/mp4",
        bytes: oversized.as_slice(),
    }];
    let response = harness
        .send(submission(&token_for(&ana), &jazz_night(), &files))
        .await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(harness.store.request_ids().is_empty());
    assert!(harness.uploader.hosted().is_empty());
    assert_eq!(harness.staged_leftovers(), 0);
}

#[tokio::test]
async fn test_failed_upload_creates_nothing() {
    let harness = Harness::with_uploader(RecordingUploader::new().fail_on("teaser.mp4"));
    let ana = harness.store.add_user("ana", Role::User);

    let files = [
        FilePart {
            name: "media",
            file_name: "poster.png",
            content_type: "image/png",
            bytes: b"png",
        },
        FilePart {
            name: "media",
            file_name: "teaser.mp4",
            content_type: "video/mp4",
            bytes: b"mp4",
        },
    ];
    let response = harness
        .send(submission(&token_for(&ana), &jazz_night(), &files))
        .await;
    let body = expect_status(response, StatusCode::INTERNAL_SERVER_ERROR).await;

    assert_eq!(body["error"], "Media could not be uploaded");
    assert!(harness.store.request_ids().is_empty());
    assert!(harness.uploader.live().is_empty());
    assert_eq!(harness.staged_leftovers(), 0);
}

#[tokio::test]
async fn test_accept_publishes_request() {
    let harness = Harness::new();
    let ana = harness.store.add_user("ana", Role::User);
    let admin = harness.store.add_user("root", Role::Admin);
    let admin_token = token_for(&admin);

    let response = harness
        .send(submission(&token_for(&ana), &jazz_night(), &[]))
        .await;
    let created = expect_status(response, StatusCode::CREATED).await;
    let request_id = created["id"].as_str().unwrap().to_string();

    let response = harness
        .send(get(&format!("/req/{}", request_id), Some(&admin_token)))
        .await;
    let fetched = expect_status(response, StatusCode::OK).await;
    assert_eq!(fetched["title"], "Jazz Night");

    let response = harness
        .send(post(&format!("/req/accept/{}", request_id), Some(&admin_token)))
        .await;
    let publication = expect_status(response, StatusCode::CREATED).await;
    assert_ne!(publication["id"], created["id"]);
    assert_eq!(publication["title"], "Jazz Night");
    assert_eq!(publication["category"], "musical");
    assert_eq!(publication["submittedAt"], created["createdAt"]);

    let response = harness.send(get("/req", Some(&admin_token))).await;
    let pending = expect_status(response, StatusCode::OK).await;
    assert!(pending.as_array().unwrap().is_empty());

    let response = harness.send(get("/publications", None)).await;
    let listing = expect_status(response, StatusCode::OK).await;
    assert_eq!(listing["total"], 1);
    assert_eq!(listing["items"][0]["id"], publication["id"]);

    let response = harness
        .send(post(&format!("/req/{}", request_id), Some(&admin_token)))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(harness.store.publication_ids().len(), 1);

    let response = harness
        .send(get(&format!("/req/{}", request_id), Some(&admin_token)))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deny_discards_request() {
    let harness = Harness::new();
    let ana = harness.store.add_user("ana", Role::User);
    let admin = harness.store.add_user("root", Role::Admin);
    let admin_token = token_for(&admin);

    let files = [FilePart {
        name: "media",
        file_name: "poster.png",
        content_type: "image/png",
        bytes: b"png",
    }];
    let response = harness
        .send(submission(&token_for(&ana), &jazz_night(), &files))
        .await;
    let created = expect_status(response, StatusCode::CREATED).await;
    let request_id = created["id"].as_str().unwrap().to_string();

    let response = harness
        .send(delete(&format!("/req/deny/{}", request_id), Some(&admin_token)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(harness.store.request_ids().is_empty());
    assert!(harness.store.publication_ids().is_empty());
    assert!(harness.uploader.live().is_empty());

    let response = harness
        .send(delete(&format!("/req/{}", request_id), Some(&admin_token)))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_concurrent_denies_have_one_winner() {
    let harness = Harness::new();
    let ana = harness.store.add_user("ana", Role::User);
    let admin = harness.store.add_user("root", Role::Admin);
    let admin_token = token_for(&admin);

    let response = harness
        .send(submission(&token_for(&ana), &jazz_night(), &[]))
        .await;
    let created = expect_status(response, StatusCode::CREATED).await;
    let uri = format!("/req/{}", created["id"].as_str().unwrap());

    let (first, second) = tokio::join!(
        harness.send(delete(&uri, Some(&admin_token))),
        harness.send(delete(&uri, Some(&admin_token)))
    );
    let mut statuses = [first.status().as_u16(), second.status().as_u16()];
    statuses.sort();
    assert_eq!(statuses, [200, 404]);
}

#[tokio::test]
async fn test_roles_are_enforced() {
    let harness = Harness::new();
    let ana = harness.store.add_user("ana", Role::User);
    let admin = harness.store.add_user("root", Role::Admin);
    let user_token = token_for(&ana);

    let response = harness
        .send(submission(&user_token, &jazz_night(), &[]))
        .await;
    let created = expect_status(response, StatusCode::CREATED).await;
    let request_id = created["id"].as_str().unwrap().to_string();

    let response = harness.send(get("/req", Some(&user_token))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = harness
        .send(post(&format!("/req/{}", request_id), Some(&user_token)))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = harness
        .send(delete(&format!("/req/{}", request_id), Some(&user_token)))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = harness
        .send(submission(&token_for(&admin), &jazz_night(), &[]))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    assert_eq!(harness.store.request_ids().len(), 1);
    assert!(harness.store.publication_ids().is_empty());
}

#[tokio::test]
async fn test_requests_without_a_valid_session_are_rejected() {
    let harness = Harness::new();
    let ana = harness.store.add_user("ana", Role::User);
    let token = token_for(&ana);

    let response = harness.send(get("/req", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = harness.send(get("/req", Some("not-a-token"))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let ghost = api::repositories::UserSummary {
        id: uuid::Uuid::new_v4(),
        username: "ghost".to_string(),
        role: Role::Admin,
    };
    let response = harness.send(get("/req", Some(&token_for(&ghost)))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    harness.denylist.revoke(&token, 60).await.unwrap();
    let response = harness
        .send(submission(&token, &jazz_night(), &[]))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(harness.store.request_ids().is_empty());
}

#[tokio::test]
async fn test_session_cookie_is_accepted() {
    let harness = Harness::new();
    let admin = harness.store.add_user("root", Role::Admin);

    let request = axum::http::Request::get("/req")
        .header(header::COOKIE, format!("authToken={}", token_for(&admin)))
        .body(Body::empty())
        .unwrap();
    let response = harness.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
}
