//! Storage backends for grid preference documents.
//!
//! A backend stores one opaque document per resource for the current user
//! and overwrites it wholesale on every save; concurrent sessions resolve as
//! last write wins.

mod file;
mod http;
mod memory;

use std::future::Future;

use gridview_model::{GridPreference, SaveGridPreference};

use crate::config::BackendConfig;
use crate::error::Result;

pub use file::FilePreferenceBackend;
pub use http::HttpPreferenceBackend;
pub use memory::{MemoryPreferenceBackend, RecordedWrite};

/// Read and write access to stored grid preferences.
pub trait PreferenceBackend: Send + Sync + 'static {
    /// Stored document for `resource`. `Ok(None)` means first-time use or an
    /// unreadable document.
    fn fetch(&self, resource: &str) -> impl Future<Output = Result<Option<GridPreference>>> + Send;

    /// Replace the stored document of `document.resource`.
    fn save(&self, document: &SaveGridPreference) -> impl Future<Output = Result<()>> + Send;
}

/// Backend chosen at runtime from a [`BackendConfig`].
#[derive(Debug, Clone)]
pub enum ConfiguredBackend {
    File(FilePreferenceBackend),
    Http(HttpPreferenceBackend),
    Memory(MemoryPreferenceBackend),
}

impl ConfiguredBackend {
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        Ok(match config {
            BackendConfig::File { dir } => Self::File(FilePreferenceBackend::new(dir)),
            BackendConfig::Http(http) => Self::Http(HttpPreferenceBackend::new(http)?),
            BackendConfig::Memory => Self::Memory(MemoryPreferenceBackend::new()),
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Http(_) => "http",
            Self::Memory(_) => "memory",
        }
    }
}

impl PreferenceBackend for ConfiguredBackend {
    async fn fetch(&self, resource: &str) -> Result<Option<GridPreference>> {
        match self {
            Self::File(backend) => backend.fetch(resource).await,
            Self::Http(backend) => backend.fetch(resource).await,
            Self::Memory(backend) => backend.fetch(resource).await,
        }
    }

    async fn save(&self, document: &SaveGridPreference) -> Result<()> {
        match self {
            Self::File(backend) => backend.save(document).await,
            Self::Http(backend) => backend.save(document).await,
            Self::Memory(backend) => backend.save(document).await,
        }
    }
}
