use super::prober::Prober;
use crate::model::{ApiHealth, PingResponse};
use crate::model::status::{INVALID_URL_ERROR, MISSING_URL_ERROR};
use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, info};
use url::Url;

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to bind ping API on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("ping API stopped: {0}")]
    Serve(#[from] std::io::Error),
}

#[derive(Clone)]
struct PingApiState {
    prober: Arc<Prober>,
}

#[derive(Debug, Deserialize)]
struct PingQuery {
    url: Option<String>,
}

pub fn router(prober: Prober) -> Router {
    Router::new()
        .route("/api/ping", get(ping))
        .route("/health", get(health))
        .with_state(PingApiState {
            prober: Arc::new(prober),
        })
}

/// Binds `addr` and returns the listener with its resolved local address.
pub async fn bind(addr: SocketAddr) -> Result<(TcpListener, SocketAddr), ServeError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind { addr, source })?;
    let local = listener
        .local_addr()
        .map_err(|source| ServeError::Bind { addr, source })?;
    Ok((listener, local))
}

/// Serves the ping API until the listener fails.
pub async fn serve(listener: TcpListener, prober: Prober) -> Result<(), ServeError> {
    if let Ok(addr) = listener.local_addr() {
        info!(
            %addr,
            timeout_ms = prober.timeout().as_millis() as u64,
            "ping API listening"
        );
    }
    axum::serve(listener, router(prober)).await?;
    Ok(())
}

/// Validates the raw `url` query value.
pub fn parse_target(raw: Option<&str>) -> Result<Url, &'static str> {
    let raw = match raw {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Err(MISSING_URL_ERROR),
    };
    Url::parse(raw).map_err(|_| INVALID_URL_ERROR)
}

async fn ping(State(state): State<PingApiState>, Query(query): Query<PingQuery>) -> Response {
    let target = match parse_target(query.url.as_deref()) {
        Ok(target) => target,
        Err(message) => {
            debug!(url = ?query.url, error = message, "rejected ping request");
            return no_store(StatusCode::BAD_REQUEST, PingResponse::rejected(message));
        }
    };

    let outcome = state.prober.probe(&target).await;
    debug!(url = %target, ?outcome, online = outcome.is_online(), "probe finished");
    no_store(StatusCode::OK, PingResponse::from(outcome))
}

async fn health() -> Response {
    with_no_store(Json(ApiHealth::ping_api()).into_response())
}

fn no_store(status: StatusCode, body: PingResponse) -> Response {
    with_no_store((status, Json(body)).into_response())
}

fn with_no_store(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
