pub mod config;
pub mod poller;
pub mod prober;
pub mod server;

use crate::model::AppState;
use std::sync::{Arc, Mutex};

pub use config::{ConfigError, LauncherConfig};
pub use poller::{HttpPingApi, PING_API_GRACE, PingApi, PingApiError, PollerSet, TilePoller};
pub use prober::{HeadTransport, Prober, ReqwestTransport, TransportError};

pub type SharedState = Arc<Mutex<AppState>>;
