use serde::{Deserialize, Serialize};

/// Error tag the ping API uses for a cross-origin refusal.
pub const CORS_ERROR: &str = "cors";
pub const MISSING_URL_ERROR: &str = "Missing url";
pub const INVALID_URL_ERROR: &str = "Invalid URL";
/// `role` reported by `GET /health` of the ping API.
pub const PING_API_ROLE: &str = "ping-api";

/// Result of a single probe.
///
/// `Blocked` means the probing side was refused a view of the real result by
/// cross-origin policy, so reachability is unknown. It is never "down".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Online,
    Offline,
    Blocked,
}

impl ProbeOutcome {
    pub fn is_online(self) -> bool {
        self == ProbeOutcome::Online
    }
}

/// JSON body of `GET /api/ping`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingResponse {
    pub online: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PingResponse {
    pub fn rejected(message: &str) -> Self {
        Self {
            online: false,
            error: Some(message.to_string()),
        }
    }

    pub fn is_cors(&self) -> bool {
        self.error
            .as_deref()
            .is_some_and(|error| error.contains(CORS_ERROR))
    }
}

impl From<ProbeOutcome> for PingResponse {
    fn from(outcome: ProbeOutcome) -> Self {
        match outcome {
            ProbeOutcome::Online => Self {
                online: true,
                error: None,
            },
            ProbeOutcome::Offline => Self {
                online: false,
                error: None,
            },
            ProbeOutcome::Blocked => Self::rejected(CORS_ERROR),
        }
    }
}

/// JSON body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiHealth {
    pub online: bool,
    pub role: String,
}

impl ApiHealth {
    pub fn ping_api() -> Self {
        Self {
            online: true,
            role: PING_API_ROLE.to_string(),
        }
    }

    pub fn is_ping_api(&self) -> bool {
        self.online && self.role == PING_API_ROLE
    }
}

/// Badge state of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayStatus {
    #[default]
    Checking,
    Online,
    Offline,
    Unknown,
}

impl DisplayStatus {
    /// State a tile starts in when it is mounted.
    pub fn initial(polling_enabled: bool) -> Self {
        if polling_enabled {
            DisplayStatus::Checking
        } else {
            DisplayStatus::Unknown
        }
    }

    /// Maps one ping API answer to a badge state.
    pub fn from_response(response: &PingResponse) -> Self {
        if response.online {
            DisplayStatus::Online
        } else if response.is_cors() {
            DisplayStatus::Unknown
        } else {
            DisplayStatus::Offline
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DisplayStatus::Checking => "Checking",
            DisplayStatus::Online => "Online",
            DisplayStatus::Offline => "Offline",
            DisplayStatus::Unknown => "Unknown",
        }
    }
}

/// Status slot of one mounted tile.
///
/// `generation` identifies the polling loop allowed to write this slot; a
/// remount bumps it so late results from an older loop are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TileStatus {
    pub generation: u64,
    pub status: DisplayStatus,
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
