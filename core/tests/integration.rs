//! End-to-end dispatch against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives `Dispatcher` with the
//! real `ReqwestTransport`. Checks what reaches the wire through `/echo` and
//! how each `/fixtures/*` body is classified.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dispatch_core::{
    ApiResponse, CallContext, ContentType, DispatchError, Dispatcher, HttpMethod, LogLevel,
    MultipartPart, RequestConfig, ReqwestTransport, SessionData, TracingLogger, TransportError,
};
use mock_server::Echo;
use serde_json::{json, Value};

async fn start_server() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run(listener));
    addr
}

async fn dispatcher() -> Dispatcher<ReqwestTransport> {
    let addr = start_server().await;
    Dispatcher::builder(ReqwestTransport::new())
        .default_base_url(format!("http://{addr}"))
        .logger(Arc::new(TracingLogger::new(LogLevel::none())))
        .build()
}

fn echo(response: ApiResponse) -> Echo {
    serde_json::from_value(Value::from(response)).unwrap()
}

async fn fixture(
    d: &Dispatcher<ReqwestTransport>,
    name: &str,
    content_type: ContentType,
) -> Result<ApiResponse, DispatchError> {
    d.make(
        None,
        &format!("fixtures/{name}"),
        RequestConfig::new()
            .method(HttpMethod::Get)
            .content_type(content_type),
    )
    .await
    .expect("base URL is configured")
}

#[tokio::test]
async fn post_sends_form_body_with_bearer_token() {
    let d = dispatcher().await;
    d.session().set_token("A".to_string());
    let ctx = CallContext::with_session(SessionData::with_token("B"));

    let config = RequestConfig::new()
        .arrays_as_form_args(true)
        .field("name", "x y")
        .field("tag", vec!["1", "2"]);
    let response = d.make(Some(&ctx), "echo", config).await.unwrap().unwrap();
    let echo = echo(response);

    assert_eq!(echo.method, "POST");
    assert_eq!(echo.path, "/echo");
    assert_eq!(echo.authorization.as_deref(), Some("Bearer A"));
    assert_eq!(
        echo.content_type.as_deref(),
        Some("application/x-www-form-urlencoded")
    );
    assert_eq!(echo.body, "name=x%20y&tag=1&tag=2");
}

#[tokio::test]
async fn get_sends_payload_as_query() {
    let d = dispatcher().await;
    let config = RequestConfig::new().method(HttpMethod::Get).field("a", "x y");
    let echo = echo(d.make(None, "/echo", config).await.unwrap().unwrap());

    assert_eq!(echo.method, "GET");
    assert_eq!(echo.query.as_deref(), Some("a=x%20y"));
    assert!(echo.body.is_empty());
    assert!(echo.authorization.is_none());
}

#[tokio::test]
async fn raw_body_is_sent_verbatim() {
    let d = dispatcher().await;
    let config = RequestConfig::new()
        .method(HttpMethod::Put)
        .header("Content-Type", "application/json")
        .body(r#"{"raw":true}"#);
    let echo = echo(d.make(None, "/echo", config).await.unwrap().unwrap());

    assert_eq!(echo.method, "PUT");
    assert_eq!(echo.content_type.as_deref(), Some("application/json"));
    assert_eq!(echo.body, r#"{"raw":true}"#);
}

#[tokio::test]
async fn multipart_parts_reach_the_server() {
    let d = dispatcher().await;
    let config = RequestConfig::new().multipart(vec![
        MultipartPart::text("note", "hello"),
        MultipartPart::file("upload", "a.txt", b"file-contents".to_vec())
            .with_content_type("text/plain"),
    ]);
    let echo = echo(d.make(None, "/echo", config).await.unwrap().unwrap());

    assert!(echo
        .content_type
        .as_deref()
        .unwrap()
        .starts_with("multipart/form-data"));
    assert!(echo.body.contains("name=\"note\""));
    assert!(echo.body.contains("filename=\"a.txt\""));
    assert!(echo.body.contains("file-contents"));
}

#[tokio::test]
async fn classification_table() {
    let d = dispatcher().await;

    let err = fixture(&d, "empty", ContentType::Json).await.unwrap_err();
    assert_eq!(err.message(), "Empty response");

    let err = fixture(&d, "internal-error", ContentType::Json).await.unwrap_err();
    assert_eq!(err.message(), "Internal Server Error: boom");

    let err = fixture(&d, "auth-error", ContentType::Json).await.unwrap_err();
    assert!(matches!(err, DispatchError::Sentinel { .. }));

    let ok = fixture(&d, "json-string", ContentType::Json).await.unwrap();
    assert_eq!(Value::from(ok), json!({"success": true, "text": "hello", "status": 200}));

    let ok = fixture(&d, "object", ContentType::Json).await.unwrap();
    assert_eq!(Value::from(ok), json!({"value": 1, "status": 200}));

    let err = fixture(&d, "remote-error", ContentType::Json).await.unwrap_err();
    assert_eq!(err.to_value(), json!({"error": "bad", "status": 200}));

    let err = fixture(&d, "not-json", ContentType::Json).await.unwrap_err();
    assert!(matches!(err, DispatchError::Parse { .. }));

    let ok = fixture(&d, "plain", ContentType::Text).await.unwrap();
    assert_eq!(
        Value::from(ok),
        json!({"success": true, "text": "plain text", "status": 200})
    );
}

#[tokio::test]
async fn status_comes_from_body_then_transport() {
    let d = dispatcher().await;
    let created = fixture(&d, "created", ContentType::Json).await.unwrap();
    assert_eq!(created.status(), Some(201));

    let declared = fixture(&d, "with-status", ContentType::Json).await.unwrap();
    assert_eq!(declared.status(), Some(202));
}

#[tokio::test]
async fn timeout_is_a_transport_error() {
    let d = dispatcher().await;
    let config = RequestConfig::new()
        .method(HttpMethod::Get)
        .field("ms", "2000")
        .timeout(Duration::from_millis(100));
    let err = d.make(None, "/slow", config).await.unwrap().unwrap_err();

    match err {
        DispatchError::Transport(transport) => assert!(transport.is_timeout()),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn gzip_option_advertises_accept_encoding() {
    let d = dispatcher().await;
    let get = || RequestConfig::new().method(HttpMethod::Get);

    let plain = echo(d.make(None, "/echo", get()).await.unwrap().unwrap());
    assert!(plain.accept_encoding.is_none());

    let gzip = echo(d.make(None, "/echo", get().gzip(true)).await.unwrap().unwrap());
    assert!(gzip.accept_encoding.unwrap().contains("gzip"));

    // The plain client is still cached separately from the gzip one.
    let again = echo(d.make(None, "/echo", get()).await.unwrap().unwrap());
    assert!(again.accept_encoding.is_none());
}

#[tokio::test]
async fn reject_unauthorized_still_reaches_plain_http() {
    let d = dispatcher().await;
    let config = RequestConfig::new()
        .method(HttpMethod::Get)
        .reject_unauthorized(true);
    let echo = echo(d.make(None, "/echo", config).await.unwrap().unwrap());
    assert_eq!(echo.method, "GET");
}

#[tokio::test]
async fn header_with_newline_is_rejected_before_sending() {
    let d = dispatcher().await;
    let config = RequestConfig::new().header("X-Note", "a\nb");
    let err = d.make(None, "/echo", config).await.unwrap().unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Transport(TransportError::InvalidHeader(_))
    ));
}

#[tokio::test]
async fn refused_connection_is_a_transport_error() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let d = Dispatcher::builder(ReqwestTransport::new())
        .default_base_url(format!("http://{addr}"))
        .build();
    let err = d.make(None, "/echo", RequestConfig::new()).await.unwrap().unwrap_err();
    assert!(matches!(err, DispatchError::Transport(_)));
}

#[tokio::test]
async fn unconfigured_dispatcher_returns_none() {
    let d = Dispatcher::builder(ReqwestTransport::new()).build();
    assert!(d.make(None, "/echo", RequestConfig::new()).await.is_none());
}
