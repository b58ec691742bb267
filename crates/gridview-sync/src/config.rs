//! Write-back and backend configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for debounced write-back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Whether local changes are written back at all.
    pub enabled: bool,

    /// Quiet period in milliseconds.
    ///
    /// After a change, the write waits this long. Additional changes
    /// restart the timer.
    pub debounce_ms: u64,

    /// Maximum delay before forcing a write, measured from the first
    /// unsaved change. `0` disables the limit.
    pub max_delay_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: 600,
            max_delay_ms: 10_000,
        }
    }
}

impl SyncConfig {
    /// Create a config with write-back turned off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn max_delay(&self) -> Option<Duration> {
        (self.max_delay_ms > 0).then(|| Duration::from_millis(self.max_delay_ms))
    }

    /// Delay before the next write, given how long the oldest unsaved
    /// change has been waiting.
    pub fn write_delay(&self, since_first_unsaved: Duration) -> Duration {
        match self.max_delay() {
            Some(max_delay) => self
                .debounce()
                .min(max_delay.saturating_sub(since_first_unsaved)),
            None => self.debounce(),
        }
    }
}

/// Where preference documents live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    /// One JSON file per resource under `dir`.
    File { dir: PathBuf },
    /// The preferences REST endpoint.
    Http(HttpConfig),
    /// In-process only; nothing survives the process.
    Memory,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::File {
            dir: PathBuf::from("preferences"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// API root; `preferences/grid` is resolved against it.
    pub base_url: String,
    /// Bearer token of the authenticated user.
    pub token: Option<String>,
    pub timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api/".to_string(),
            token: None,
            timeout_ms: 10_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert!(config.enabled);
        assert_eq!(config.debounce(), Duration::from_millis(600));
    }

    #[test]
    fn test_write_delay_debounce() {
        let config = SyncConfig::default();
        assert_eq!(
            config.write_delay(Duration::from_millis(200)),
            Duration::from_millis(600)
        );
    }

    #[test]
    fn test_write_delay_max_delay() {
        let config = SyncConfig::default();

        // Close to the limit: only the remainder is waited for
        assert_eq!(
            config.write_delay(Duration::from_millis(9_800)),
            Duration::from_millis(200)
        );

        // Past the limit: write immediately
        assert_eq!(config.write_delay(Duration::from_secs(30)), Duration::ZERO);
    }

    #[test]
    fn test_max_delay_disabled() {
        let config = SyncConfig {
            max_delay_ms: 0,
            ..SyncConfig::default()
        };
        assert_eq!(config.max_delay(), None);
        assert_eq!(
            config.write_delay(Duration::from_secs(60)),
            Duration::from_millis(600)
        );
    }

    #[test]
    fn test_backend_config_parses() {
        let config: BackendConfig =
            serde_json::from_str(r#"{"kind":"http","base_url":"https://admin.example/api/"}"#)
                .unwrap();
        match config {
            BackendConfig::Http(http) => {
                assert_eq!(http.base_url, "https://admin.example/api/");
                assert_eq!(http.timeout_ms, 10_000);
            }
            other => panic!("unexpected backend: {other:?}"),
        }
    }
}
