use super::app_record::AppRecord;
use super::status::{DisplayStatus, TileStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Default, Serialize, Deserialize)]
pub struct AppState {
    pub apps: Vec<AppRecord>,
    /// Live badge per app id. Rebuilt by the pollers after every launch.
    #[serde(skip, default)]
    pub statuses: HashMap<String, TileStatus>,
    #[serde(skip, default)]
    pub ping_enabled: bool,
}

impl AppState {
    pub fn with_apps(apps: Vec<AppRecord>, ping_enabled: bool) -> Self {
        Self {
            apps,
            statuses: HashMap::new(),
            ping_enabled,
        }
    }

    pub fn status_of(&self, app_id: &str) -> DisplayStatus {
        self.statuses
            .get(app_id)
            .map(|tile| tile.status)
            .unwrap_or_else(|| DisplayStatus::initial(self.ping_enabled))
    }
}
