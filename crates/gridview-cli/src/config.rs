//! CLI configuration file.
//!
//! ```toml
//! [sync]
//! debounce_ms = 600
//! max_delay_ms = 10000
//!
//! [backend]
//! kind = "http"
//! base_url = "https://admin.example.com/api/"
//! token = "..."
//! ```

use std::path::{Path, PathBuf};

use gridview_sync::{BackendConfig, SyncConfig};
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub sync: SyncConfig,
    pub backend: BackendConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            sync: SyncConfig::default(),
            backend: BackendConfig::File {
                dir: default_preferences_dir(),
            },
        }
    }
}

impl CliConfig {
    /// Load from `path`, or from the default location when `None`.
    pub fn load(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::load_from(path),
            None => Self::load_from(&Self::config_path()),
        }
    }

    /// Load configuration from a specific path. A missing or malformed file
    /// yields the defaults.
    pub fn load_from(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(error) => {
                debug!(path = %path.display(), %error, "no configuration file; using defaults");
                return Self::default();
            }
        };
        match toml::from_str(&content) {
            Ok(config) => config,
            Err(error) => {
                warn!(path = %path.display(), %error, "malformed configuration ignored");
                Self::default()
            }
        }
    }

    /// Get the default config file path.
    pub fn config_path() -> PathBuf {
        project_dirs()
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("gridview.toml"))
    }
}

/// Where the file backend keeps documents unless configured otherwise.
pub fn default_preferences_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("preferences"))
        .unwrap_or_else(|| PathBuf::from("preferences"))
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("dev", "gridview", "gridview")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = CliConfig::load_from(&dir.path().join("absent.toml"));
        assert_eq!(config, CliConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[sync]\ndebounce_ms = 250\n\n[backend]\nkind = \"http\"\nbase_url = \"https://admin.example/api\"\n",
        )
        .unwrap();

        let config = CliConfig::load_from(&path);
        assert_eq!(config.sync.debounce_ms, 250);
        assert_eq!(config.sync.max_delay_ms, 10_000);
        match config.backend {
            BackendConfig::Http(http) => {
                assert_eq!(http.base_url, "https://admin.example/api");
                assert_eq!(http.token, None);
            }
            other => panic!("unexpected backend: {other:?}"),
        }
    }

    #[test]
    fn malformed_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[sync\n").unwrap();
        assert_eq!(CliConfig::load_from(&path), CliConfig::default());
    }
}
