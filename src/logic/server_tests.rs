use super::*;
use crate::logic::prober::{HeadTransport, TransportError};
use futures::future::BoxFuture;
use reqwest::StatusCode as ClientStatus;
use std::sync::Mutex;
use std::time::Duration;

/// Answers every HEAD with a fixed result and remembers the URLs it saw.
struct ScriptedTransport {
    answer: fn() -> Result<StatusCode, TransportError>,
    seen: Mutex<Vec<String>>,
}

impl HeadTransport for ScriptedTransport {
    fn head(&self, url: Url) -> BoxFuture<'_, Result<StatusCode, TransportError>> {
        self.seen.lock().unwrap().push(url.to_string());
        let answer = (self.answer)();
        Box::pin(async move { answer })
    }
}

async fn spawn_api(
    answer: fn() -> Result<StatusCode, TransportError>,
) -> (String, Arc<ScriptedTransport>) {
    let transport = Arc::new(ScriptedTransport {
        answer,
        seen: Mutex::new(Vec::new()),
    });
    let prober = Prober::new(transport.clone(), Duration::from_millis(3000));
    let (listener, addr) = bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
    tokio::spawn(async move {
        serve(listener, prober).await.unwrap();
    });
    (format!("http://{addr}"), transport)
}

async fn get_ping(base: &str, query: &str) -> (ClientStatus, Option<String>, String) {
    let response = reqwest::get(format!("{base}/api/ping{query}")).await.unwrap();
    let status = response.status();
    let cache = response
        .headers()
        .get(reqwest::header::CACHE_CONTROL)
        .map(|v| v.to_str().unwrap().to_string());
    let body = response.text().await.unwrap();
    (status, cache, body)
}

#[test]
fn test_parse_target_rules() {
    assert_eq!(parse_target(None).unwrap_err(), "Missing url");
    assert_eq!(parse_target(Some("")).unwrap_err(), "Missing url");
    assert_eq!(parse_target(Some("not-a-url")).unwrap_err(), "Invalid URL");
    assert_eq!(
        parse_target(Some("http://10.0.0.5:8080")).unwrap().as_str(),
        "http://10.0.0.5:8080/"
    );
}

#[tokio::test]
async fn test_missing_url_is_400() {
    let (base, transport) = spawn_api(|| Ok(StatusCode::OK)).await;

    let (status, cache, body) = get_ping(&base, "").await;
    assert_eq!(status, ClientStatus::BAD_REQUEST);
    assert_eq!(body, r#"{"online":false,"error":"Missing url"}"#);
    assert_eq!(cache.as_deref(), Some("no-store"));
    assert!(transport.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_url_is_400() {
    let (base, transport) = spawn_api(|| Ok(StatusCode::OK)).await;

    let (status, _, body) = get_ping(&base, "?url=not-a-url").await;
    assert_eq!(status, ClientStatus::BAD_REQUEST);
    assert_eq!(body, r#"{"online":false,"error":"Invalid URL"}"#);
    assert!(transport.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_online_target() {
    let (base, transport) = spawn_api(|| Ok(StatusCode::OK)).await;

    let (status, cache, body) = get_ping(&base, "?url=http%3A%2F%2F10.0.0.5%3A8080").await;
    assert_eq!(status, ClientStatus::OK);
    assert_eq!(body, r#"{"online":true}"#);
    assert_eq!(cache.as_deref(), Some("no-store"));
    assert_eq!(
        transport.seen.lock().unwrap().as_slice(),
        ["http://10.0.0.5:8080/".to_string()]
    );
}

#[tokio::test]
async fn test_offline_target_is_still_200() {
    let (base, _) = spawn_api(|| Ok(StatusCode::INTERNAL_SERVER_ERROR)).await;
    let (status, _, body) = get_ping(&base, "?url=https%3A%2F%2Fa.example.com").await;
    assert_eq!(status, ClientStatus::OK);
    assert_eq!(body, r#"{"online":false}"#);

    let (base, _) = spawn_api(|| Err(TransportError::Failed("connection refused".into()))).await;
    let (status, _, body) = get_ping(&base, "?url=https%3A%2F%2Fa.example.com").await;
    assert_eq!(status, ClientStatus::OK);
    assert_eq!(body, r#"{"online":false}"#);
}

#[tokio::test]
async fn test_cors_failure_is_tagged() {
    let (base, _) = spawn_api(|| Err(TransportError::Failed("blocked: CORS header missing".into()))).await;

    let (status, cache, body) = get_ping(&base, "?url=https%3A%2F%2Fa.example.com").await;
    assert_eq!(status, ClientStatus::OK);
    assert_eq!(body, r#"{"online":false,"error":"cors"}"#);
    assert_eq!(cache.as_deref(), Some("no-store"));
}

#[tokio::test]
async fn test_health_endpoint() {
    let (base, _) = spawn_api(|| Ok(StatusCode::OK)).await;
    let body = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, r#"{"online":true,"role":"ping-api"}"#);
}
