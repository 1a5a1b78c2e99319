// SPDX-FileCopyrightText: 2026 Zapdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end integration tests for the Zapdesk gateway.
//!
//! Each test builds an isolated router over a temp SQLite database and
//! drives it through in-memory HTTP. Tests are independent and
//! order-insensitive.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use rusqlite::params;
use tower::ServiceExt;

use zapdesk_gateway::{
    build_router, AuthConfig, ChannelRoute, GatewayState, MediaFetcher,
};
use zapdesk_pipeline::{ChannelRules, ContactResolver};
use zapdesk_storage::queries::channel_rows;
use zapdesk_storage::Database;

const TOKEN: &str = "test-token";

struct Harness {
    app: axum::Router,
    db: Database,
    _dir: tempfile::TempDir,
}

async fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("e2e.db").to_str().unwrap())
        .await
        .unwrap();
    channel_rows::ensure_channel_table(&db, "loja_chat")
        .await
        .unwrap();

    let state = GatewayState {
        db: db.clone(),
        resolver: Arc::new(ContactResolver::new()),
        channels: Arc::new(vec![ChannelRoute {
            id: "loja".to_string(),
            label: "Loja Centro".to_string(),
            table: "loja_chat".to_string(),
            rules: ChannelRules::default(),
        }]),
        media: MediaFetcher::new(Duration::from_secs(2), 1024 * 1024).unwrap(),
        auth: AuthConfig {
            bearer_token: Some(TOKEN.to_string()),
        },
        start_time: std::time::Instant::now(),
    };

    Harness {
        app: build_router(state),
        db,
        _dir: dir,
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {TOKEN}"))
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {TOKEN}"))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, body)
}

// ---- Test 1: Webhook-to-dashboard flow ----

#[tokio::test]
async fn test_webhook_messages_surface_as_a_conversation() {
    let h = harness().await;

    let (status, body) = send(
        &h.app,
        post_json(
            "/webhook/loja",
            serde_json::json!({
                "session_id": "5511999998888@s.whatsapp.net",
                "push_name": "Maria",
                "text": "oi, tudo bem?",
                "timestamp": "2026-02-01T10:00:00.000Z"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 1);

    let (status, _) = send(
        &h.app,
        post_json(
            "/webhook/loja",
            serde_json::json!({
                "session_id": "5511999998888@s.whatsapp.net",
                "sender": "atendente",
                "text": "olá Maria, em que posso ajudar?",
                "timestamp": "2026-02-01T10:05:00.000Z"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, conversations) = send(&h.app, get("/v1/conversations/loja")).await;
    assert_eq!(status, StatusCode::OK);
    let list = conversations.as_array().unwrap();
    assert_eq!(list.len(), 1, "both rows belong to one conversation");
    assert_eq!(list[0]["id"], "loja:5511999998888:Maria");
    assert_eq!(list[0]["contact_name"], "Maria");
    assert_eq!(list[0]["contact_phone"], "5511999998888");
    assert_eq!(list[0]["last_message"], "olá Maria, em que posso ajudar?");
    assert_eq!(list[0]["last_message_at"], "2026-02-01T10:05:00.000Z");
    assert_eq!(list[0]["status"], "unread");

    let (status, messages) = send(
        &h.app,
        get("/v1/conversations/loja/5511999998888/messages"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let thread = messages.as_array().unwrap();
    assert_eq!(thread.len(), 2);
    assert_eq!(thread[0]["content"], "oi, tudo bem?");
    assert_eq!(thread[0]["from_agent"], false);
    assert_eq!(thread[0]["sender_name"], "Maria");
    assert_eq!(thread[1]["content"], "olá Maria, em que posso ajudar?");
    assert_eq!(thread[1]["from_agent"], true);
    assert_eq!(thread[1]["sender_name"], "atendente");
}

// ---- Test 2: Read-status persistence ----

#[tokio::test]
async fn test_status_update_survives_regrouping() {
    let h = harness().await;

    send(
        &h.app,
        post_json(
            "/webhook/loja",
            serde_json::json!({
                "session_id": "5511999998888@s.whatsapp.net",
                "push_name": "Maria",
                "text": "oi",
                "timestamp": "2026-02-01T10:00:00.000Z"
            }),
        ),
    )
    .await;

    let (_, conversations) = send(&h.app, get("/v1/conversations/loja")).await;
    let id = conversations[0]["id"].as_str().unwrap().to_string();

    let (status, ack) = send(
        &h.app,
        post_json(
            &format!("/v1/conversations/{id}/status"),
            serde_json::json!({"status": "read"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["id"], id.as_str());
    assert_eq!(ack["status"], "read");

    // Another inbound message regroups from scratch; the persisted
    // status still overlays the fresh summary.
    send(
        &h.app,
        post_json(
            "/webhook/loja",
            serde_json::json!({
                "session_id": "5511999998888@s.whatsapp.net",
                "text": "ainda está aí?",
                "timestamp": "2026-02-01T11:00:00.000Z"
            }),
        ),
    )
    .await;

    let (_, conversations) = send(&h.app, get("/v1/conversations/loja")).await;
    assert_eq!(conversations[0]["id"], id.as_str());
    assert_eq!(conversations[0]["status"], "read");
    assert_eq!(conversations[0]["last_message"], "ainda está aí?");
}

// ---- Test 3: Webhook validation ----

#[tokio::test]
async fn test_webhook_rejects_unknown_channel() {
    let h = harness().await;
    let (status, body) = send(
        &h.app,
        post_json(
            "/webhook/ghost",
            serde_json::json!({"session_id": "x", "text": "oi"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("unknown channel"));
}

#[tokio::test]
async fn test_webhook_rejects_contentless_payloads() {
    let h = harness().await;

    let (status, _) = send(
        &h.app,
        post_json("/webhook/loja", serde_json::json!({"session_id": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &h.app,
        post_json(
            "/webhook/loja",
            serde_json::json!({"session_id": "x", "text": "   "}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &h.app,
        post_json(
            "/webhook/loja",
            serde_json::json!({"session_id": "  ", "text": "oi"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_conversation_routes_reject_unknown_channels() {
    let h = harness().await;
    let (status, _) = send(&h.app, get("/v1/conversations/ghost")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&h.app, get("/v1/conversations/ghost/551100/messages")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---- Test 4: Media intake ----

#[tokio::test]
async fn test_media_webhook_inlines_a_data_url() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let h = harness().await;
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(vec![0xFFu8, 0xD8, 0xFF]),
        )
        .mount(&server)
        .await;

    let (status, _) = send(
        &h.app,
        post_json(
            "/webhook/loja",
            serde_json::json!({
                "session_id": "5511888887777",
                "media_url": format!("{}/img.jpg", server.uri()),
                "media_type": "image"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, messages) = send(
        &h.app,
        get("/v1/conversations/loja/5511888887777/messages"),
    )
    .await;
    let thread = messages.as_array().unwrap();
    assert_eq!(thread.len(), 1);
    let content = thread[0]["content"].as_str().unwrap();
    assert!(content.starts_with("data:image/jpeg;base64,"), "{content}");

    // The conversation preview carries the media payload too.
    let (_, conversations) = send(&h.app, get("/v1/conversations/loja")).await;
    let preview = conversations[0]["last_message"].as_str().unwrap();
    assert!(preview.starts_with("data:image/jpeg;base64,"), "{preview}");
}

#[tokio::test]
async fn test_failed_media_download_stores_the_placeholder() {
    use wiremock::MockServer;

    let h = harness().await;
    // A server with no mounted mocks answers 404 to everything.
    let server = MockServer::start().await;

    let (status, _) = send(
        &h.app,
        post_json(
            "/webhook/loja",
            serde_json::json!({
                "session_id": "5511888887777",
                "text": "escuta isso",
                "media_url": format!("{}/voice.ogg", server.uri()),
                "media_type": "audio"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, messages) = send(
        &h.app,
        get("/v1/conversations/loja/5511888887777/messages"),
    )
    .await;
    let thread = messages.as_array().unwrap();
    assert_eq!(thread.len(), 1);
    assert_eq!(thread[0]["content"], "[Audio]");
}

// ---- Test 5: Conversation list ordering ----

#[tokio::test]
async fn test_conversations_sort_newest_first_with_untimed_last() {
    let h = harness().await;

    send(
        &h.app,
        post_json(
            "/webhook/loja",
            serde_json::json!({
                "session_id": "5511111111111@s.whatsapp.net",
                "text": "janeiro",
                "timestamp": "2026-01-10T09:00:00.000Z"
            }),
        ),
    )
    .await;
    send(
        &h.app,
        post_json(
            "/webhook/loja",
            serde_json::json!({
                "session_id": "5522222222222@s.whatsapp.net",
                "text": "março",
                "timestamp": "2026-03-10T09:00:00.000Z"
            }),
        ),
    )
    .await;
    // A legacy row without any timestamp column value.
    h.db
        .connection()
        .call(|conn| {
            conn.execute(
                "INSERT INTO loja_chat (session_id, message) VALUES (?1, ?2)",
                params!["5533333333333", "sem horário"],
            )?;
            Ok(())
        })
        .await
        .unwrap();

    let (_, conversations) = send(&h.app, get("/v1/conversations/loja")).await;
    let phones: Vec<&str> = conversations
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["contact_phone"].as_str().unwrap())
        .collect();
    assert_eq!(
        phones,
        ["5522222222222", "5511111111111", "5533333333333"],
        "newest first, timestamp-less conversations last"
    );
    assert!(conversations[2]["last_message_at"].is_null());
}

// ---- Test 6: Stored encodings normalize in the thread ----

#[tokio::test]
async fn test_stored_json_encodings_are_normalized_in_the_thread() {
    let h = harness().await;

    h.db
        .connection()
        .call(|conn| {
            conn.execute(
                "INSERT INTO loja_chat (session_id, message) VALUES (?1, ?2)",
                params![
                    "5511999998888@s.whatsapp.net",
                    r#"{"type":"ai","content":"  Hello\n\n\nworld  "}"#
                ],
            )?;
            Ok(())
        })
        .await
        .unwrap();

    let (_, messages) = send(
        &h.app,
        get("/v1/conversations/loja/5511999998888/messages"),
    )
    .await;
    let thread = messages.as_array().unwrap();
    assert_eq!(thread.len(), 1);
    assert_eq!(thread[0]["content"], "Hello\nworld");
    assert_eq!(thread[0]["from_agent"], true);
    assert_eq!(thread[0]["phone"], "5511999998888");
}

#[tokio::test]
async fn test_blank_legacy_rows_never_reach_the_thread() {
    let h = harness().await;

    send(
        &h.app,
        post_json(
            "/webhook/loja",
            serde_json::json!({
                "session_id": "5511999998888@s.whatsapp.net",
                "text": "oi",
                "timestamp": "2026-02-01T10:00:00.000Z"
            }),
        ),
    )
    .await;
    h.db
        .connection()
        .call(|conn| {
            conn.execute(
                "INSERT INTO loja_chat (session_id, message) VALUES (?1, ?2)",
                params!["5511999998888@s.whatsapp.net", "\n\n \n"],
            )?;
            Ok(())
        })
        .await
        .unwrap();

    let (_, messages) = send(
        &h.app,
        get("/v1/conversations/loja/5511999998888/messages"),
    )
    .await;
    assert_eq!(messages.as_array().unwrap().len(), 1);
}

// ---- Test 7: Auth wiring on the composed router ----

#[tokio::test]
async fn test_api_requires_the_bearer_token_but_health_does_not() {
    let h = harness().await;

    let response = h
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/v1/channels")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = h
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, channels) = send(&h.app, get("/v1/channels")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(channels[0]["id"], "loja");
    assert_eq!(channels[0]["label"], "Loja Centro");
}
