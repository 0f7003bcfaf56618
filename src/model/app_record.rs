use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use thiserror::Error;

/// Glyph names offered by the add/edit window.
pub const ICON_OPTIONS: [&str; 15] = [
    "Server",
    "Clapperboard",
    "Folder",
    "Fish",
    "Radio",
    "Cpu",
    "Network",
    "HardDrive",
    "Satellite",
    "Camera",
    "Flame",
    "Brain",
    "Database",
    "Terminal",
    "Globe",
];

static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://.+").expect("scheme pattern is valid"));
static HOST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.-]+$").expect("host pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AppMode {
    #[default]
    #[serde(rename = "domain")]
    Domain,
    #[serde(rename = "ipport", alias = "host-port")]
    HostPort,
}

/// A user-defined shortcut to a self-hosted service.
///
/// Field names on the wire match the launcher's stored list, so a list saved
/// by an earlier version loads unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppRecord {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub mode: AppMode,
    /// Full URL including scheme, set when `mode` is `Domain`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, rename = "ip", alias = "host", skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
}

impl AppRecord {
    /// Resolves the single URL this app points at.
    ///
    /// Never fails. An empty string means the record has no target and must
    /// not be probed.
    pub fn target_url(&self) -> String {
        match self.mode {
            AppMode::Domain => self.domain.clone().unwrap_or_default(),
            AppMode::HostPort => {
                let host = self.host.as_deref().unwrap_or_default();
                match self.port {
                    Some(port) if port != 0 => format!("http://{host}:{port}"),
                    _ => format!("http://{host}"),
                }
            }
        }
    }

    /// Short address shown on the tile next to the mode label.
    pub fn display_address(&self) -> String {
        match self.mode {
            AppMode::Domain => self.domain.clone().unwrap_or_default(),
            AppMode::HostPort => {
                let host = self.host.as_deref().unwrap_or_default();
                match self.port {
                    Some(port) => format!("{host}:{port}"),
                    None => host.to_string(),
                }
            }
        }
    }

    /// Case-insensitive search over name, description and tags.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }

        let tags = self.tags.join(" ");
        [Some(self.name.as_str()), self.description.as_deref(), Some(tags.as_str())]
            .into_iter()
            .flatten()
            .filter(|value| !value.is_empty())
            .any(|value| value.to_lowercase().contains(&term))
    }

    pub fn icon_is_image_url(&self) -> bool {
        self.icon
            .as_deref()
            .is_some_and(|icon| icon.starts_with("http://") || icon.starts_with("https://"))
    }
}

/// Maps a glyph name to the symbol drawn on the tile. Unknown names fall back
/// to a generic window glyph.
pub fn icon_glyph(name: Option<&str>) -> &'static str {
    match name.unwrap_or_default() {
        "Server" => "🖥",
        "Clapperboard" => "🎬",
        "Folder" => "📁",
        "Fish" => "🐟",
        "Radio" => "📻",
        "Cpu" => "⚙",
        "Network" => "🖧",
        "HardDrive" => "🖴",
        "Satellite" => "🛰",
        "Camera" => "📷",
        "Flame" => "🔥",
        "Brain" => "🧠",
        "Database" => "🗄",
        "Terminal" => "🖳",
        "Globe" => "🌐",
        _ => "🗔",
    }
}

/// Example apps shown on first launch.
pub fn seed_apps() -> Vec<AppRecord> {
    let now = chrono::Utc::now().timestamp_millis();
    vec![
        AppRecord {
            id: uuid::Uuid::new_v4().to_string(),
            name: "Jellyfin".to_string(),
            icon: Some("Clapperboard".to_string()),
            mode: AppMode::Domain,
            domain: Some("https://media.example.com".to_string()),
            host: None,
            port: None,
            description: Some("Stream movies and shows".to_string()),
            tags: vec!["media".to_string()],
            created_at: now,
        },
        AppRecord {
            id: uuid::Uuid::new_v4().to_string(),
            name: "Seafile".to_string(),
            icon: Some("Folder".to_string()),
            mode: AppMode::Domain,
            domain: Some("https://files.example.com".to_string()),
            host: None,
            port: None,
            description: Some("Private file sync".to_string()),
            tags: vec!["storage".to_string()],
            created_at: now,
        },
        AppRecord {
            id: uuid::Uuid::new_v4().to_string(),
            name: "AI Fish Detection System".to_string(),
            icon: Some("Fish".to_string()),
            mode: AppMode::HostPort,
            domain: None,
            host: Some("192.168.1.150".to_string()),
            port: Some(8080),
            description: Some("Camera AI monitor".to_string()),
            tags: vec!["ai".to_string(), "vision".to_string()],
            created_at: now,
        },
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DraftField {
    Name,
    Domain,
    Host,
    Port,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("app form has {} invalid field(s)", .fields.len())]
pub struct DraftErrors {
    pub fields: BTreeMap<DraftField, String>,
}

impl DraftErrors {
    pub fn get(&self, field: DraftField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    fn add(&mut self, field: DraftField, message: &str) {
        self.fields.entry(field).or_insert_with(|| message.to_string());
    }
}

/// Editable form state behind the add/edit window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDraft {
    pub name: String,
    pub icon: String,
    pub mode: AppMode,
    pub domain: String,
    pub host: String,
    pub port: String,
    pub description: String,
    pub tags: String,
}

impl Default for AppDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            icon: ICON_OPTIONS[0].to_string(),
            mode: AppMode::Domain,
            domain: "https://".to_string(),
            host: String::new(),
            port: String::new(),
            description: String::new(),
            tags: String::new(),
        }
    }
}

impl AppDraft {
    pub fn from_record(app: &AppRecord) -> Self {
        Self {
            name: app.name.clone(),
            icon: app.icon.clone().unwrap_or_else(|| ICON_OPTIONS[0].to_string()),
            mode: app.mode,
            domain: app.domain.clone().unwrap_or_else(|| "https://".to_string()),
            host: app.host.clone().unwrap_or_default(),
            port: app.port.map(|p| p.to_string()).unwrap_or_default(),
            description: app.description.clone().unwrap_or_default(),
            tags: app.tags.join(", "),
        }
    }

    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Checks the form and builds the record. When `existing` is given the
    /// record keeps its id and creation time.
    pub fn validate(&self, existing: Option<&AppRecord>) -> Result<AppRecord, DraftErrors> {
        let mut errors = DraftErrors::default();

        let name = self.name.trim();
        if name.is_empty() {
            errors.add(DraftField::Name, "Name is required");
        }

        let mut port = None;
        match self.mode {
            AppMode::Domain => {
                let domain = self.domain.trim();
                if domain.is_empty() {
                    errors.add(DraftField::Domain, "Domain is required");
                } else if !SCHEME_RE.is_match(domain) {
                    errors.add(DraftField::Domain, "Domain must include http/https");
                }
            }
            AppMode::HostPort => {
                let host = self.host.trim();
                if host.is_empty() {
                    errors.add(DraftField::Host, "IP or hostname is required");
                } else if !HOST_RE.is_match(host) {
                    errors.add(DraftField::Host, "Use a valid IP or hostname");
                }

                let raw = self.port.trim();
                if raw.is_empty() {
                    errors.add(DraftField::Port, "Port is required");
                } else {
                    match raw.parse::<u32>() {
                        Ok(p) if (1..=65535).contains(&p) => port = u16::try_from(p).ok(),
                        Ok(_) => errors.add(DraftField::Port, "Port must be 1-65535"),
                        Err(_) if raw.parse::<f64>().is_ok() => {
                            errors.add(DraftField::Port, "Port must be 1-65535")
                        }
                        Err(_) => errors.add(DraftField::Port, "Port is required"),
                    }
                }
            }
        }

        if !errors.fields.is_empty() {
            return Err(errors);
        }

        let icon = self.icon.trim();
        let description = self.description.trim();
        let is_domain = self.mode == AppMode::Domain;

        Ok(AppRecord {
            id: existing
                .map(|app| app.id.clone())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            name: name.to_string(),
            icon: (!icon.is_empty()).then(|| icon.to_string()),
            mode: self.mode,
            domain: is_domain.then(|| self.domain.trim().to_string()),
            host: (!is_domain).then(|| self.host.trim().to_string()),
            port: if is_domain { None } else { port },
            description: (!description.is_empty()).then(|| description.to_string()),
            tags: self.tag_list(),
            created_at: existing
                .map(|app| app.created_at)
                .unwrap_or_else(|| chrono::Utc::now().timestamp_millis()),
        })
    }
}

/// Inserts a new record at the front or replaces the one with the same id.
pub fn upsert(apps: &mut Vec<AppRecord>, item: AppRecord) {
    if let Some(slot) = apps.iter_mut().find(|app| app.id == item.id) {
        *slot = item;
    } else {
        apps.insert(0, item);
    }
}

#[cfg(test)]
#[path = "app_record_tests.rs"]
mod tests;
