use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, Query},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// What `/echo` saw, returned as JSON so tests can inspect the wire request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub accept_encoding: Option<String>,
    pub body: String,
}

#[derive(Deserialize)]
pub struct SlowParams {
    #[serde(default = "default_delay_ms")]
    pub ms: u64,
}

fn default_delay_ms() -> u64 {
    2_000
}

/// Raw body served for each `/fixtures/{name}` route.
pub fn fixture(name: &str) -> Option<(StatusCode, &'static str)> {
    let fixture = match name {
        "empty" => (StatusCode::OK, ""),
        "internal-error" => (StatusCode::OK, "Internal Server Error: boom"),
        "auth-error" => (StatusCode::UNAUTHORIZED, "Authentication Error: token expired"),
        "json-string" => (StatusCode::OK, r#""hello""#),
        "object" => (StatusCode::OK, r#"{"value":1}"#),
        "created" => (StatusCode::CREATED, r#"{"value":1}"#),
        "with-status" => (StatusCode::OK, r#"{"value":1,"status":202}"#),
        "remote-error" => (StatusCode::OK, r#"{"error":"bad"}"#),
        "not-json" => (StatusCode::OK, "not-json{{"),
        "plain" => (StatusCode::OK, "plain text"),
        _ => return None,
    };
    Some(fixture)
}

pub fn app() -> Router {
    Router::new()
        .route("/echo", any(echo))
        .route("/echo/{*rest}", any(echo))
        .route("/fixtures/{name}", any(serve_fixture))
        .route("/slow", get(slow))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn header_string(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    tracing::debug!(%method, %uri, "echo");
    Json(Echo {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        authorization: header_string(&headers, header::AUTHORIZATION),
        content_type: header_string(&headers, header::CONTENT_TYPE),
        accept_encoding: header_string(&headers, header::ACCEPT_ENCODING),
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

async fn serve_fixture(Path(name): Path<String>) -> (StatusCode, &'static str) {
    fixture(&name).unwrap_or((StatusCode::NOT_FOUND, "no such fixture"))
}

async fn slow(Query(params): Query<SlowParams>) -> Json<serde_json::Value> {
    tokio::time::sleep(Duration::from_millis(params.ms)).await;
    Json(serde_json::json!({ "slept_ms": params.ms }))
}
