use super::*;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use wagate_core::{
    CannedResponder, Database, MessageService, ProviderFactory, SessionService, StatusCache,
    WebhookConfig, WebhookDeliveryService,
};
use wagate_providers::{BaileysConfig, BaileysProvider, MetaApiConfig, MetaApiProvider};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PHONE: &str = "15551234567";

struct TestApp {
    router: Router,
    bridge: MockServer,
    _dir: TempDir,
}

async fn create_test_app() -> TestApp {
    let dir = TempDir::new().unwrap();
    let db = Database::from_path(&dir.path().join("api.db")).await.unwrap();
    let bridge = MockServer::start().await;

    let baileys =
        BaileysProvider::new(BaileysConfig::new(bridge.uri()).with_qr_polling(3, 1)).unwrap();
    let meta = Arc::new(MetaApiProvider::new(MetaApiConfig::default()).unwrap());
    let factory = Arc::new(
        ProviderFactory::new(std::time::Duration::from_secs(300))
            .with_provider(Arc::new(baileys))
            .with_provider(meta.clone()),
    );
    let webhooks = Arc::new(
        WebhookDeliveryService::new(&WebhookConfig {
            max_retries: 0,
            ..Default::default()
        })
        .unwrap(),
    );

    let state = AppState {
        sessions: SessionService::new(db.clone(), factory.clone(), StatusCache::disabled()),
        messages: MessageService::new(
            db.clone(),
            factory.clone(),
            webhooks.clone(),
            Arc::new(CannedResponder),
        ),
        db,
        factory,
        webhooks,
        meta,
    };

    TestApp {
        router: api_router(state),
        bridge,
        _dir: dir,
    }
}

async fn call(
    app: &TestApp,
    method: Method,
    uri: &str,
    client_id: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(client_id) = client_id {
        request = request.header("X-Client-Id", client_id);
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// Create a tenant and return (id, client_id)
async fn create_tenant(app: &TestApp, name: &str) -> (String, String) {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/v1/tenants",
        None,
        Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    (
        body["data"]["id"].as_str().unwrap().to_string(),
        body["data"]["clientId"].as_str().unwrap().to_string(),
    )
}

async fn mount_bridge(app: &TestApp) {
    Mock::given(method("POST"))
        .and(path("/api/sessions/initialize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "status": "qr_ready",
            "qrCode": "2@qr",
        })))
        .mount(&app.bridge)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/messages/send-text"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "messageId": "wamid.out.1",
        })))
        .mount(&app.bridge)
        .await;
}

#[tokio::test]
async fn test_health_needs_no_tenant() {
    let app = create_test_app().await;
    let (status, body) = call(&app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], true);
}

#[tokio::test]
async fn test_tenant_header_resolution() {
    let app = create_test_app().await;
    let (_, client_id) = create_tenant(&app, "Acme").await;

    let (status, body) = call(&app, Method::GET, "/api/v1/tenants/current", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = call(
        &app,
        Method::GET,
        "/api/v1/tenants/current",
        Some("wag_unknown"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(
        &app,
        Method::GET,
        "/api/v1/tenants/current",
        Some(&client_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Acme");
}

#[tokio::test]
async fn test_settings_hide_secret() {
    let app = create_test_app().await;
    let (_, client_id) = create_tenant(&app, "Acme").await;

    let (status, body) = call(
        &app,
        Method::PUT,
        "/api/v1/tenants/current/settings",
        Some(&client_id),
        Some(json!({
            "webhookUrl": "https://hooks.example.com/wa",
            "webhookSecret": "s3cret",
            "aiEnabled": true,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["settings"]["hasWebhookSecret"], true);
    assert_eq!(body["data"]["settings"]["aiEnabled"], true);
    assert!(!body.to_string().contains("s3cret"));

    let (status, _) = call(
        &app,
        Method::PUT,
        "/api/v1/tenants/current/settings",
        Some(&client_id),
        Some(json!({ "webhookUrl": "ftp://nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_session_and_message_flow() {
    let app = create_test_app().await;
    mount_bridge(&app).await;
    let (_, client_id) = create_tenant(&app, "Acme").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/sessions",
        Some(&client_id),
        Some(json!({ "phoneNumber": "+1 555 123 4567" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "qr_ready");
    assert_eq!(body["data"]["phoneNumber"], PHONE);

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/api/v1/sessions/{PHONE}/qr"),
        Some(&client_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["qrCode"], "2@qr");

    let (status, body) = call(&app, Method::GET, "/api/v1/sessions", Some(&client_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/messages/text",
        Some(&client_id),
        Some(json!({ "from": PHONE, "to": "+1 555 000 1111", "text": "Hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "sent");
    assert_eq!(body["data"]["messageId"], "wamid.out.1");

    let (status, body) = call(
        &app,
        Method::GET,
        "/api/v1/messages/wamid.out.1",
        Some(&client_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["toNumber"], "15550001111");

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/api/v1/messages?phone={PHONE}&limit=10"),
        Some(&client_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_send_without_session_is_not_found() {
    let app = create_test_app().await;
    let (_, client_id) = create_tenant(&app, "Acme").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/messages/text",
        Some(&client_id),
        Some(json!({ "from": PHONE, "to": "15550001111", "text": "Hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_media_requires_a_type() {
    let app = create_test_app().await;
    let (_, client_id) = create_tenant(&app, "Acme").await;

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/v1/messages/media",
        Some(&client_id),
        Some(json!({ "from": PHONE, "to": "1555", "mediaUrl": "https://cdn/x.png" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_messages_are_isolated_between_tenants() {
    let app = create_test_app().await;
    mount_bridge(&app).await;
    let (_, acme) = create_tenant(&app, "Acme").await;
    let (_, globex) = create_tenant(&app, "Globex").await;

    call(
        &app,
        Method::POST,
        "/api/v1/sessions",
        Some(&acme),
        Some(json!({ "phoneNumber": PHONE })),
    )
    .await;
    call(
        &app,
        Method::POST,
        "/api/v1/messages/text",
        Some(&acme),
        Some(json!({ "from": PHONE, "to": "15550001111", "text": "Hello" })),
    )
    .await;

    let (status, _) = call(
        &app,
        Method::GET,
        "/api/v1/messages/wamid.out.1",
        Some(&globex),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = call(&app, Method::GET, "/api/v1/sessions", Some(&globex), None).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_bridge_events() {
    let app = create_test_app().await;
    mount_bridge(&app).await;
    let (tenant_id, client_id) = create_tenant(&app, "Acme").await;
    call(
        &app,
        Method::POST,
        "/api/v1/sessions",
        Some(&client_id),
        Some(json!({ "phoneNumber": PHONE })),
    )
    .await;
    let session_key = format!("session-{tenant_id}-{PHONE}");

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/v1/webhooks/baileys",
        None,
        Some(json!({
            "event": "connection.update",
            "sessionId": session_key,
            "data": { "status": "open" },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = call(
        &app,
        Method::GET,
        &format!("/api/v1/sessions/{PHONE}/qr"),
        Some(&client_id),
        None,
    )
    .await;
    assert_eq!(body["success"], false);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/v1/webhooks/baileys",
        None,
        Some(json!({
            "event": "message",
            "sessionId": session_key,
            "data": {
                "id": "wamid.in.1",
                "from": "15559990000@s.whatsapp.net",
                "text": "hi there",
                "pushName": "Bob",
            },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &app,
        Method::GET,
        "/api/v1/messages/wamid.in.1",
        Some(&client_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["direction"], "inbound");
    assert_eq!(body["data"]["fromNumber"], "15559990000");

    // Unknown sessions are logged, never surfaced to the bridge
    let (status, _) = call(
        &app,
        Method::POST,
        "/api/v1/webhooks/baileys",
        None,
        Some(json!({ "event": "message", "sessionId": "garbage", "data": {} })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_meta_verification() {
    let app = create_test_app().await;

    let request = Request::builder()
        .uri("/api/v1/webhooks/meta?hub.mode=subscribe&hub.verify_token=wagate_webhook_verify&hub.challenge=1234")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"1234");

    let (status, _) = call(
        &app,
        Method::GET,
        "/api/v1/webhooks/meta?hub.mode=subscribe&hub.verify_token=wrong&hub.challenge=1234",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_agent_crud() {
    let app = create_test_app().await;
    let (_, client_id) = create_tenant(&app, "Acme").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/agents",
        Some(&client_id),
        Some(json!({ "name": "Ava", "systemPrompt": "Be helpful" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["isActive"], true);

    let (status, body) = call(
        &app,
        Method::PUT,
        &format!("/api/v1/agents/{id}"),
        Some(&client_id),
        Some(json!({ "isActive": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isActive"], false);
    assert_eq!(body["data"]["name"], "Ava");

    let (_, body) = call(&app, Method::GET, "/api/v1/agents", Some(&client_id), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/api/v1/agents/{id}"),
        Some(&client_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/api/v1/agents/{id}"),
        Some(&client_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_providers() {
    let app = create_test_app().await;
    let (_, client_id) = create_tenant(&app, "Acme").await;

    let (status, body) = call(&app, Method::GET, "/api/v1/providers", Some(&client_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, _) = call(
        &app,
        Method::GET,
        "/api/v1/providers/carrier-pigeon/health",
        Some(&client_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unconfigured Cloud API fails its probe and keeps the unhealthy default
    let (status, body) = call(
        &app,
        Method::GET,
        "/api/v1/providers/meta_api/health",
        Some(&client_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isHealthy"], false);
}

async fn post_raw(app: &TestApp, uri: &str, client_id: Option<&str>, body: &str) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(client_id) = client_id {
        request = request.header("X-Client-Id", client_id);
    }
    let request = request.body(Body::from(body.to_string())).unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_malformed_inbound_webhooks_still_answer_ok() {
    let app = create_test_app().await;

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/v1/webhooks/baileys",
        None,
        Some(json!({ "event": "message" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/v1/webhooks/meta",
        None,
        Some(json!({ "entry": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post_raw(&app, "/api/v1/webhooks/baileys", None, "{not json").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_requests_use_error_envelope() {
    let app = create_test_app().await;
    let (_, client_id) = create_tenant(&app, "Acme").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/sessions",
        Some(&client_id),
        Some(json!({ "phone": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());

    let (status, body) = post_raw(&app, "/api/v1/messages/text", Some(&client_id), "{oops").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = post_raw(&app, "/api/v1/tenants", None, "[]").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = call(
        &app,
        Method::PUT,
        "/api/v1/agents/not-a-uuid",
        Some(&client_id),
        Some(json!({ "name": "Ava" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = call(
        &app,
        Method::GET,
        "/api/v1/messages?limit=many",
        Some(&client_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}
