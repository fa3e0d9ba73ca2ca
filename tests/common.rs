//! Shared setup for the integration suites: an app wired to a unique
//! in-memory database, a throwaway uploads directory and the mock model
//! gateway, plus small request helpers.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use diesel::connection::SimpleConnection;
use diesel_migrations::MigrationHarness;
use serde_json::{json, Value};
use tower::ServiceExt;

use cortex::auth::AuthKeys;
use cortex::llm::mock::MockLlm;
use cortex::storage::FileStore;
use cortex::{create_app, db, AppState};

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub mock: Arc<MockLlm>,
}

/// Builds the full application against fresh test doubles.
///
/// Uses a unique shared in-memory database: plain ":memory:" would give
/// each pooled connection its own separate database, so migrations run
/// on one connection wouldn't be visible on others.
pub fn setup_app() -> TestApp {
    let unique_id = uuid::Uuid::new_v4();
    let database_url = format!("file:test_{}?mode=memory&cache=shared", unique_id);
    let pool = Arc::new(db::init_pool(&database_url));

    let mut conn = pool.get().expect("Failed to get connection");
    conn.batch_execute("PRAGMA foreign_keys = ON").unwrap();
    conn.run_pending_migrations(cortex::MIGRATIONS)
        .expect("Failed to run migrations");
    drop(conn);

    let upload_dir = std::env::temp_dir().join(format!("cortex-it-{unique_id}"));
    let mock = Arc::new(MockLlm::new());

    let state = AppState {
        pool,
        llm: mock.clone(),
        auth: Arc::new(AuthKeys::new("integration-secret")),
        storage: Arc::new(FileStore::new(upload_dir).unwrap()),
    };

    TestApp {
        app: create_app(state.clone()),
        state,
        mock,
    }
}

/// Sends a JSON (or empty) request, optionally authenticated, and
/// returns the status plus the parsed body.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().uri(uri).method(method);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Registers an account over HTTP and returns its token and user id.
pub async fn register(app: &Router, email: &str) -> (String, String) {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "email": email,
            "password": "motdepasse",
            "name": "Étudiant"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {body}");

    let token = body["data"]["token"].as_str().unwrap().to_string();
    let user_id = body["data"]["user"]["id"].as_str().unwrap().to_string();
    (token, user_id)
}

/// Grants AI access to a user by creating and redeeming a fresh code.
pub async fn enable_ai(test_app: &TestApp, token: &str) {
    let code = cortex::models::AccessCode::random_code(10);
    cortex::repo::create_access_code(
        &test_app.state.pool,
        cortex::models::AccessCode::new(code.clone(), 1, None),
    )
    .unwrap();

    let (status, body) = send(
        &test_app.app,
        "POST",
        "/api/auth/redeem-code",
        Some(token),
        Some(json!({ "code": code })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "redeem failed: {body}");
}

/// Builds a multipart body with text fields and one optional file part.
pub fn multipart_body(
    boundary: &str,
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &str, &[u8])>,
) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((name, filename, mime, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"; \
                 filename=\"{filename}\"\r\nContent-Type: {mime}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

/// Sends a multipart request and returns the status plus parsed body.
pub async fn send_multipart(
    app: &Router,
    uri: &str,
    token: &str,
    boundary: &str,
    body: Vec<u8>,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .method("POST")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}
