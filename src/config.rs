//! Runtime configuration.
//!
//! Defaults can be overridden through environment variables. Missing,
//! unparsable or zero values fall back to the defaults.

use std::time::Duration;

/// Environment variable overriding the inactivity window, in seconds.
pub const ENV_INACTIVITY_SECS: &str = "WPMON_INACTIVITY_SECS";

/// Environment variable overriding the permission poll interval, in seconds.
pub const ENV_PERMISSION_POLL_SECS: &str = "WPMON_PERMISSION_POLL_SECS";

/// Environment variable overriding the UI refresh interval, in milliseconds.
pub const ENV_REFRESH_MS: &str = "WPMON_REFRESH_MS";

/// Configuration for the tracker and its surroundings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Quiet period after which an active session ends (default: 15s).
    pub inactivity_timeout: Duration,

    /// How often to re-check authorization while waiting for a grant
    /// (default: 2s).
    pub permission_poll_interval: Duration,

    /// How often the tray label is refreshed (default: 500ms).
    pub refresh_interval: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            inactivity_timeout: Duration::from_secs(15),
            permission_poll_interval: Duration::from_secs(2),
            refresh_interval: Duration::from_millis(500),
        }
    }
}

impl TrackerConfig {
    /// Builds the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let positive = |key: &str| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|v| *v > 0)
        };

        let config = Self {
            inactivity_timeout: positive(ENV_INACTIVITY_SECS)
                .map(Duration::from_secs)
                .unwrap_or(defaults.inactivity_timeout),
            permission_poll_interval: positive(ENV_PERMISSION_POLL_SECS)
                .map(Duration::from_secs)
                .unwrap_or(defaults.permission_poll_interval),
            refresh_interval: positive(ENV_REFRESH_MS)
                .map(Duration::from_millis)
                .unwrap_or(defaults.refresh_interval),
        };

        if config != defaults {
            tracing::debug!(?config, "Configuration overridden from environment");
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = TrackerConfig::default();
        assert_eq!(config.inactivity_timeout, Duration::from_secs(15));
        assert_eq!(config.permission_poll_interval, Duration::from_secs(2));
        assert_eq!(config.refresh_interval, Duration::from_millis(500));
    }

    #[test]
    fn test_config_overrides() {
        let config = TrackerConfig::from_lookup(lookup_from(&[
            (ENV_INACTIVITY_SECS, "30"),
            (ENV_PERMISSION_POLL_SECS, " 5 "),
            (ENV_REFRESH_MS, "250"),
        ]));
        assert_eq!(config.inactivity_timeout, Duration::from_secs(30));
        assert_eq!(config.permission_poll_interval, Duration::from_secs(5));
        assert_eq!(config.refresh_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = TrackerConfig::from_lookup(lookup_from(&[
            (ENV_INACTIVITY_SECS, "0"),
            (ENV_PERMISSION_POLL_SECS, "soon"),
            (ENV_REFRESH_MS, "-1"),
        ]));
        assert_eq!(config, TrackerConfig::default());
    }
}
