use super::*;
use axum::Router;
use axum::http::StatusCode as AxumStatus;
use axum::routing::get;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Canned transport behaviours.
enum Fake {
    Status(u16),
    Fail(&'static str),
    CrossOrigin,
    Hang(Arc<AtomicBool>),
}

struct FakeTransport {
    behaviour: Fake,
    calls: AtomicUsize,
}

impl FakeTransport {
    fn new(behaviour: Fake) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            calls: AtomicUsize::new(0),
        })
    }
}

/// Sets its flag when the request future holding it is dropped.
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl HeadTransport for FakeTransport {
    fn head(&self, _url: Url) -> BoxFuture<'_, Result<StatusCode, TransportError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            match &self.behaviour {
                Fake::Status(code) => Ok(StatusCode::from_u16(*code).unwrap()),
                Fake::Fail(message) => Err(TransportError::Failed(message.to_string())),
                Fake::CrossOrigin => Err(TransportError::CrossOrigin),
                Fake::Hang(dropped) => {
                    let _guard = DropFlag(dropped.clone());
                    std::future::pending::<Result<StatusCode, TransportError>>().await
                }
            }
        })
    }
}

fn target() -> Url {
    Url::parse("http://service.lan:8080/").unwrap()
}

async fn probe_with(behaviour: Fake) -> ProbeOutcome {
    let prober = Prober::new(FakeTransport::new(behaviour), Duration::from_millis(3000));
    prober.probe(&target()).await
}

// --- Classification ---

#[tokio::test]
async fn test_success_status_is_online() {
    assert_eq!(probe_with(Fake::Status(200)).await, ProbeOutcome::Online);
    assert_eq!(probe_with(Fake::Status(204)).await, ProbeOutcome::Online);
}

#[tokio::test]
async fn test_failure_status_is_offline() {
    assert_eq!(probe_with(Fake::Status(404)).await, ProbeOutcome::Offline);
    assert_eq!(probe_with(Fake::Status(503)).await, ProbeOutcome::Offline);
    // Redirects that were not followed are not a success either
    assert_eq!(probe_with(Fake::Status(302)).await, ProbeOutcome::Offline);
}

#[tokio::test]
async fn test_plain_failure_is_offline() {
    let outcome = probe_with(Fake::Fail("error sending request: connection refused")).await;
    assert_eq!(outcome, ProbeOutcome::Offline);
}

#[tokio::test]
async fn test_cors_failures_are_blocked() {
    assert_eq!(probe_with(Fake::CrossOrigin).await, ProbeOutcome::Blocked);
    assert_eq!(
        probe_with(Fake::Fail("Request blocked by CORS policy")).await,
        ProbeOutcome::Blocked
    );
    assert_eq!(
        probe_with(Fake::Fail("NetworkError: Cors request did not succeed")).await,
        ProbeOutcome::Blocked
    );
}

#[test]
fn test_cors_fallback_matching() {
    assert!(mentions_cors("CORS"));
    assert!(mentions_cors("cross-origin (cors) failure"));
    assert!(!mentions_cors("connection reset by peer"));
    assert!(TransportError::CrossOrigin.is_cross_origin());
    assert!(!TransportError::Failed("dns error".to_string()).is_cross_origin());
}

// --- Deadline ---

#[tokio::test(start_paused = true)]
async fn test_timeout_aborts_request_at_deadline() {
    let dropped = Arc::new(AtomicBool::new(false));
    let transport = FakeTransport::new(Fake::Hang(dropped.clone()));
    let prober = Prober::new(transport.clone(), Duration::from_millis(3000));

    let started = tokio::time::Instant::now();
    let outcome = prober.probe(&target()).await;

    assert_eq!(outcome, ProbeOutcome::Offline);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(3000) && elapsed < Duration::from_millis(3100));
    assert!(dropped.load(Ordering::SeqCst), "in-flight request was not dropped");
    assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_fast_answer_does_not_wait_for_deadline() {
    let prober = Prober::new(FakeTransport::new(Fake::Status(200)), Duration::from_millis(3000));
    let started = tokio::time::Instant::now();
    assert_eq!(prober.probe(&target()).await, ProbeOutcome::Online);
    assert!(started.elapsed() < Duration::from_millis(3000));
}

// --- Real HTTP ---

async fn spawn_target() -> std::net::SocketAddr {
    let app = Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/down", get(|| async { AxumStatus::SERVICE_UNAVAILABLE }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn test_reqwest_probe_against_live_target() {
    let addr = spawn_target().await;
    let prober = Prober::with_reqwest(Duration::from_millis(3000));

    let up = Url::parse(&format!("http://{addr}/")).unwrap();
    assert_eq!(prober.probe(&up).await, ProbeOutcome::Online);

    let down = Url::parse(&format!("http://{addr}/down")).unwrap();
    assert_eq!(prober.probe(&down).await, ProbeOutcome::Offline);
}

#[tokio::test]
async fn test_reqwest_probe_slow_target_times_out() {
    let addr = spawn_target().await;
    let prober = Prober::with_reqwest(Duration::from_millis(300));

    let slow = Url::parse(&format!("http://{addr}/slow")).unwrap();
    let started = std::time::Instant::now();
    assert_eq!(prober.probe(&slow).await, ProbeOutcome::Offline);
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_reqwest_probe_closed_port_is_offline() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let prober = Prober::with_reqwest(Duration::from_millis(3000));
    let url = Url::parse(&format!("http://{addr}/")).unwrap();
    assert_eq!(prober.probe(&url).await, ProbeOutcome::Offline);
}

async fn closed_port() -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

#[tokio::test]
async fn test_reqwest_failure_with_cors_in_url_is_offline() {
    let addr = closed_port().await;
    let prober = Prober::with_reqwest(Duration::from_millis(3000));

    for path in ["corsair", "cors-api", "CORS"] {
        let url = Url::parse(&format!("http://{addr}/{path}")).unwrap();
        assert_eq!(prober.probe(&url).await, ProbeOutcome::Offline, "path {path}");
    }
}

#[tokio::test]
async fn test_reqwest_error_message_leaves_out_target() {
    let addr = closed_port().await;
    let err = reqwest::Client::new()
        .head(format!("http://{addr}/cors-api"))
        .send()
        .await
        .unwrap_err();

    let converted = TransportError::from(err);
    assert!(!converted.to_string().contains("cors-api"), "{converted}");
    assert!(!converted.is_cross_origin());
}

#[tokio::test]
async fn test_reqwest_dropped_connection_is_offline() {
    // Accepts and immediately hangs up
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            drop(stream);
        }
    });

    let prober = Prober::with_reqwest(Duration::from_millis(3000));
    let url = Url::parse(&format!("http://{addr}/cors")).unwrap();
    assert_eq!(prober.probe(&url).await, ProbeOutcome::Offline);
}
