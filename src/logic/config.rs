use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(3_000);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(60_000);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not a valid socket address: {value}")]
    BadAddress { var: &'static str, value: String },

    #[error("{var} must be true or false, got {value}")]
    BadFlag { var: &'static str, value: String },

    #[error("{var} must be a positive number of milliseconds, got {value}")]
    BadDuration { var: &'static str, value: String },
}

/// Runtime settings, read from `HOMELAB_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherConfig {
    /// Where the ping API listens.
    pub bind_addr: SocketAddr,
    /// Base URL the tile pollers call. Defaults to the local ping API.
    pub api_base_url: String,
    pub ping_enabled: bool,
    pub probe_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        let bind_addr = SocketAddr::from(([127, 0, 0, 1], 7878));
        Self {
            bind_addr,
            api_base_url: format!("http://{bind_addr}"),
            ping_enabled: true,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl LauncherConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the config from any variable source; unset or blank values
    /// keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(value) = get("HOMELAB_PING_BIND") {
            config.bind_addr = value.parse().map_err(|_| ConfigError::BadAddress {
                var: "HOMELAB_PING_BIND",
                value: value.clone(),
            })?;
        }

        config.api_base_url = get("HOMELAB_PING_API")
            .unwrap_or_else(|| format!("http://{}", config.bind_addr))
            .trim_end_matches('/')
            .to_string();

        if let Some(value) = get("HOMELAB_PING_ENABLED") {
            config.ping_enabled = match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::BadFlag {
                        var: "HOMELAB_PING_ENABLED",
                        value,
                    });
                }
            };
        }

        if let Some(value) = get("HOMELAB_PROBE_TIMEOUT_MS") {
            config.probe_timeout = parse_millis("HOMELAB_PROBE_TIMEOUT_MS", value)?;
        }
        if let Some(value) = get("HOMELAB_POLL_INTERVAL_MS") {
            config.poll_interval = parse_millis("HOMELAB_POLL_INTERVAL_MS", value)?;
        }

        Ok(config)
    }
}

fn parse_millis(var: &'static str, value: String) -> Result<Duration, ConfigError> {
    match value.parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(ConfigError::BadDuration { var, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = LauncherConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:7878");
        assert_eq!(config.api_base_url, "http://127.0.0.1:7878");
        assert!(config.ping_enabled);
        assert_eq!(config.probe_timeout, Duration::from_millis(3000));
        assert_eq!(config.poll_interval, Duration::from_millis(60_000));
    }

    #[test]
    fn test_api_url_follows_bind_unless_set() {
        let config =
            LauncherConfig::from_lookup(lookup(&[("HOMELAB_PING_BIND", "0.0.0.0:9000")])).unwrap();
        assert_eq!(config.api_base_url, "http://0.0.0.0:9000");

        let config = LauncherConfig::from_lookup(lookup(&[
            ("HOMELAB_PING_BIND", "0.0.0.0:9000"),
            ("HOMELAB_PING_API", "http://pinger.lan:9000/"),
        ]))
        .unwrap();
        assert_eq!(config.api_base_url, "http://pinger.lan:9000");
    }

    #[test]
    fn test_flags_and_durations() {
        let config = LauncherConfig::from_lookup(lookup(&[
            ("HOMELAB_PING_ENABLED", "off"),
            ("HOMELAB_PROBE_TIMEOUT_MS", "1500"),
            ("HOMELAB_POLL_INTERVAL_MS", " 5000 "),
        ]))
        .unwrap();
        assert!(!config.ping_enabled);
        assert_eq!(config.probe_timeout, Duration::from_millis(1500));
        assert_eq!(config.poll_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = LauncherConfig::from_lookup(lookup(&[("HOMELAB_PING_BIND", "nowhere")]))
            .unwrap_err();
        assert!(err.to_string().contains("HOMELAB_PING_BIND"));

        assert!(LauncherConfig::from_lookup(lookup(&[("HOMELAB_PING_ENABLED", "maybe")])).is_err());
        assert!(LauncherConfig::from_lookup(lookup(&[("HOMELAB_POLL_INTERVAL_MS", "0")])).is_err());
        assert!(
            LauncherConfig::from_lookup(lookup(&[("HOMELAB_PROBE_TIMEOUT_MS", "-3")])).is_err()
        );
    }
}
