use super::SharedState;
use super::config::DEFAULT_PROBE_TIMEOUT;
use crate::model::{ApiHealth, DisplayStatus, PingResponse, TileStatus};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PingApiError {
    #[error("ping API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("ping API returned a malformed body: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("{base_url} is not a ping API (role {role:?})")]
    NotPingApi { base_url: String, role: String },
}

/// Headroom on top of the probe deadline before a ping API call is given up.
pub const PING_API_GRACE: Duration = Duration::from_millis(2_000);

/// The call a tile makes to learn its target's reachability.
pub trait PingApi: Send + Sync {
    fn ping<'a>(&'a self, target: &'a str) -> BoxFuture<'a, Result<PingResponse, PingApiError>>;
}

/// Calls `GET {base}/api/ping?url=...` over HTTP.
pub struct HttpPingApi {
    http: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
}

impl HttpPingApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout: DEFAULT_PROBE_TIMEOUT + PING_API_GRACE,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Confirms `base_url` answers `/health` as a ping API.
    pub async fn check_health(&self) -> Result<(), PingApiError> {
        let body = self
            .http
            .get(format!("{}/health", self.base_url))
            .timeout(self.request_timeout)
            .send()
            .await?
            .bytes()
            .await?;
        let health: ApiHealth = serde_json::from_slice(&body)?;
        if health.is_ping_api() {
            Ok(())
        } else {
            Err(PingApiError::NotPingApi {
                base_url: self.base_url.clone(),
                role: health.role,
            })
        }
    }

    pub fn ping_url(&self, target: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
        format!("{}/api/ping?url={}", self.base_url, encoded)
    }
}

impl PingApi for HttpPingApi {
    fn ping<'a>(&'a self, target: &'a str) -> BoxFuture<'a, Result<PingResponse, PingApiError>> {
        Box::pin(async move {
            // 400 answers carry the same JSON shape, so the status is not checked
            let body = self
                .http
                .get(self.ping_url(target))
                .timeout(self.request_timeout)
                .send()
                .await?
                .bytes()
                .await?;
            Ok(serde_json::from_slice(&body)?)
        })
    }
}

/// Writes `status` into the tile's slot if `generation` still owns it.
pub fn publish(state: &SharedState, app_id: &str, generation: u64, status: DisplayStatus) -> bool {
    let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
    match state.statuses.get_mut(app_id) {
        Some(slot) if slot.generation == generation => {
            slot.status = status;
            true
        }
        _ => false,
    }
}

/// Polling loop of one mounted tile. Aborted when dropped.
pub struct TilePoller {
    task: JoinHandle<()>,
}

impl TilePoller {
    pub fn spawn(
        runtime: &Handle,
        api: Arc<dyn PingApi>,
        state: SharedState,
        app_id: String,
        target: String,
        generation: u64,
        interval: Duration,
    ) -> Self {
        let task = runtime.spawn(poll_loop(api, state, app_id, target, generation, interval));
        Self { task }
    }
}

impl Drop for TilePoller {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn poll_loop(
    api: Arc<dyn PingApi>,
    state: SharedState,
    app_id: String,
    target: String,
    generation: u64,
    interval: Duration,
) {
    // First tick completes immediately
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let status = match api.ping(&target).await {
            Ok(response) => DisplayStatus::from_response(&response),
            Err(err) => {
                debug!(app_id = %app_id, target = %target, error = %err, "ping call failed");
                DisplayStatus::Unknown
            }
        };

        if !publish(&state, &app_id, generation, status) {
            debug!(app_id = %app_id, generation, "tile slot gone, stopping poller");
            break;
        }
    }
}

struct Mount {
    target: String,
    enabled: bool,
    poller: Option<TilePoller>,
}

/// Keeps one polling loop per app in the shared state.
///
/// `sync` mounts loops for new apps, remounts on target or enable changes,
/// and unmounts apps that were removed.
pub struct PollerSet {
    runtime: Handle,
    api: Arc<dyn PingApi>,
    state: SharedState,
    interval: Duration,
    mounted: HashMap<String, Mount>,
    next_generation: u64,
}

impl PollerSet {
    pub fn new(runtime: Handle, api: Arc<dyn PingApi>, state: SharedState, interval: Duration) -> Self {
        Self {
            runtime,
            api,
            state,
            interval: interval.max(Duration::from_millis(1)),
            mounted: HashMap::new(),
            next_generation: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.mounted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounted.is_empty()
    }

    /// Number of tiles with a live polling loop.
    pub fn active(&self) -> usize {
        self.mounted.values().filter(|m| m.poller.is_some()).count()
    }

    pub fn sync(&mut self) {
        let (wanted, enabled) = {
            let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            let wanted: Vec<(String, String)> = state
                .apps
                .iter()
                .map(|app| (app.id.clone(), app.target_url()))
                .collect();
            (wanted, state.ping_enabled)
        };

        let gone: Vec<String> = self
            .mounted
            .keys()
            .filter(|id| !wanted.iter().any(|(wanted_id, _)| wanted_id == *id))
            .cloned()
            .collect();
        for app_id in gone {
            self.unmount(&app_id);
        }

        for (app_id, target) in wanted {
            let unchanged = self
                .mounted
                .get(&app_id)
                .is_some_and(|m| m.target == target && m.enabled == enabled);
            if !unchanged {
                self.mount(app_id, target, enabled);
            }
        }
    }

    /// Drops every loop and clears the status slots.
    pub fn clear(&mut self) {
        let ids: Vec<String> = self.mounted.keys().cloned().collect();
        for app_id in ids {
            self.unmount(&app_id);
        }
    }

    fn mount(&mut self, app_id: String, target: String, enabled: bool) {
        let generation = self.next_generation;
        self.next_generation += 1;

        let active = enabled && !target.is_empty();
        let status = if active {
            DisplayStatus::Checking
        } else {
            DisplayStatus::Unknown
        };

        // The new generation takes the slot before the old loop is dropped
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state
                .statuses
                .insert(app_id.clone(), TileStatus { generation, status });
        }

        let poller = active.then(|| {
            debug!(app_id = %app_id, target = %target, generation, "mounting tile poller");
            TilePoller::spawn(
                &self.runtime,
                self.api.clone(),
                self.state.clone(),
                app_id.clone(),
                target.clone(),
                generation,
                self.interval,
            )
        });

        self.mounted.insert(
            app_id,
            Mount {
                target,
                enabled,
                poller,
            },
        );
    }

    fn unmount(&mut self, app_id: &str) {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.statuses.remove(app_id);
        }
        if self.mounted.remove(app_id).is_some() {
            debug!(app_id = %app_id, "unmounted tile poller");
        }
    }
}

impl Drop for PollerSet {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
#[path = "poller_tests.rs"]
mod tests;
