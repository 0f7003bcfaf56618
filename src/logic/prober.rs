use crate::model::ProbeOutcome;
use futures::future::BoxFuture;
use regex::Regex;
use reqwest::StatusCode;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

static CORS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)cors").expect("cors pattern is valid"));

#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport itself reported a cross-origin refusal.
    #[error("request refused by cross-origin policy")]
    CrossOrigin,

    #[error("{0}")]
    Failed(String),
}

impl TransportError {
    /// Structured signal first; message text is the fallback for transports
    /// that only describe the refusal in words.
    pub fn is_cross_origin(&self) -> bool {
        match self {
            TransportError::CrossOrigin => true,
            TransportError::Failed(message) => mentions_cors(message),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        // The target URL is user input and must not feed the cors match
        TransportError::Failed(error_chain(&err.without_url()))
    }
}

pub fn mentions_cors(message: &str) -> bool {
    CORS_RE.is_match(message)
}

/// Flattens an error and all of its sources into one message.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

/// Sends one HEAD request and reports the response status.
///
/// Dropping the returned future must abort the request.
pub trait HeadTransport: Send + Sync {
    fn head(&self, url: Url) -> BoxFuture<'_, Result<StatusCode, TransportError>>;
}

pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadTransport for ReqwestTransport {
    fn head(&self, url: Url) -> BoxFuture<'_, Result<StatusCode, TransportError>> {
        Box::pin(async move {
            let response = self.http.head(url).send().await?;
            Ok(response.status())
        })
    }
}

/// Checks whether a target URL answers within a hard deadline.
#[derive(Clone)]
pub struct Prober {
    transport: Arc<dyn HeadTransport>,
    timeout: Duration,
}

impl Prober {
    pub fn new(transport: Arc<dyn HeadTransport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    pub fn with_reqwest(timeout: Duration) -> Self {
        Self::new(Arc::new(ReqwestTransport::new()), timeout)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Probes `url` once.
    ///
    /// The request future is dropped at the deadline, which closes the
    /// connection. The deadline timer lives inside the timeout future and is
    /// released on every exit.
    pub async fn probe(&self, url: &Url) -> ProbeOutcome {
        let request = self.transport.head(url.clone());

        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(status)) if status.is_success() => ProbeOutcome::Online,
            Ok(Ok(status)) => {
                debug!(url = %url, status = status.as_u16(), "target answered with failure status");
                ProbeOutcome::Offline
            }
            Ok(Err(err)) if err.is_cross_origin() => {
                debug!(url = %url, error = %err, "probe refused by cross-origin policy");
                ProbeOutcome::Blocked
            }
            Ok(Err(err)) => {
                debug!(url = %url, error = %err, "probe request failed");
                ProbeOutcome::Offline
            }
            Err(_) => {
                debug!(url = %url, timeout_ms = self.timeout.as_millis() as u64, "probe timed out");
                ProbeOutcome::Offline
            }
        }
    }
}

#[cfg(test)]
#[path = "prober_tests.rs"]
mod tests;
