#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use migration::MigratorTrait;
use sea_orm::{ConnectOptions, Database};
use serde_json::Value;
use tower::Service;

use server::routes::auth::ServerState;

pub async fn build_app() -> anyhow::Result<Router> {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_owned());
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await?;
    migration::Migrator::up(&db, None).await?;
    let state = ServerState::new(db, service::auth::AuthConfig::with_secret("test-secret"));
    Ok(server::startup::app(state))
}

/// Send a JSON request, optionally with a bearer token, and decode the JSON reply.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> anyhow::Result<(StatusCode, Value)> {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
        Some(b) => req.header(header::CONTENT_TYPE, "application/json").body(Body::from(serde_json::to_vec(&b)?))?,
        None => req.body(Body::empty())?,
    };
    let resp = app.clone().call(req).await?;
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
    Ok((status, json))
}

/// Register an account and return `(token, user id)`.
pub async fn register(app: &Router, email: &str, role: &str) -> anyhow::Result<(String, String)> {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(serde_json::json!({"name": "Test User", "email": email, "password": "S3curePass!", "role": role, "phone": "555-123-4567"})),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    let token = body["token"].as_str().unwrap_or_default().to_string();
    let id = body["user"]["id"].as_str().unwrap_or_default().to_string();
    Ok((token, id))
}

pub fn id_of(v: &Value) -> String {
    v["id"].as_str().unwrap_or_default().to_string()
}
