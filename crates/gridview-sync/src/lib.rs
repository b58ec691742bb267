//! Per-user, per-resource view-state persistence.
//!
//! A screen opens a [`ResourceView`] through a shared [`PreferenceSync`],
//! hydrates it once from the stored [`GridPreference`](gridview_model::GridPreference)
//! and edits it through setters. Edits are written back as whole snapshots
//! after a quiet period ([`SyncConfig::debounce_ms`]); a successful write
//! invalidates the cached document of its resource.
//!
//! # Architecture
//!
//! - `config` - write-back timing and backend selection
//! - `backend` - where documents live (HTTP, file, memory)
//! - `cache` - fetched documents keyed by resource
//! - `merge` - hydration of stored documents over screen defaults
//! - `tracker` - unsaved-change bookkeeping for debounced writes
//! - `service` - the resource view lifecycle

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod merge;
pub mod service;
pub mod tracker;

pub use backend::{
    ConfiguredBackend, FilePreferenceBackend, HttpPreferenceBackend, MemoryPreferenceBackend,
    PreferenceBackend, RecordedWrite,
};
pub use cache::{PreferenceCache, cache_key};
pub use config::{BackendConfig, HttpConfig, SyncConfig};
pub use error::{Result, SyncError};
pub use merge::{hydrate, reconcile_order};
pub use service::{Hydration, PreferenceSync, ResourceView, SyncStatus};
pub use tracker::SyncTracker;
