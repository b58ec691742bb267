//! In-process backend with a write log.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use gridview_model::{GridPreference, SaveGridPreference};
use tokio::time::Instant;

use super::PreferenceBackend;
use crate::error::{Result, SyncError};

/// A write received by a [`MemoryPreferenceBackend`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedWrite {
    /// When the write reached the backend.
    pub at: Instant,
    pub body: SaveGridPreference,
}

/// Clones share the same store.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferenceBackend {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    documents: HashMap<String, GridPreference>,
    writes: Vec<RecordedWrite>,
    fetches: usize,
    fail_fetches: bool,
    fail_saves: bool,
    latency: Duration,
}

impl MemoryPreferenceBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, resource: impl Into<String>, document: GridPreference) -> Self {
        self.lock().documents.insert(resource.into(), document);
        self
    }

    /// Delay every request by `latency`.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.lock().latency = latency;
        self
    }

    pub fn fail_fetches(&self, fail: bool) {
        self.lock().fail_fetches = fail;
    }

    pub fn fail_saves(&self, fail: bool) {
        self.lock().fail_saves = fail;
    }

    pub fn document(&self, resource: &str) -> Option<GridPreference> {
        self.lock().documents.get(resource).cloned()
    }

    /// Every successful write, oldest first.
    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.lock().writes.clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.lock().fetches
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn delay(&self) {
        let latency = self.lock().latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

impl PreferenceBackend for MemoryPreferenceBackend {
    async fn fetch(&self, resource: &str) -> Result<Option<GridPreference>> {
        self.delay().await;
        let mut state = self.lock();
        state.fetches += 1;
        if state.fail_fetches {
            return Err(SyncError::Unavailable(format!("fetch of {resource} refused")));
        }
        Ok(state.documents.get(resource).cloned())
    }

    async fn save(&self, document: &SaveGridPreference) -> Result<()> {
        self.delay().await;
        let mut state = self.lock();
        if state.fail_saves {
            return Err(SyncError::Unavailable(format!(
                "save of {} refused",
                document.resource
            )));
        }
        state
            .documents
            .insert(document.resource.clone(), document.preference.clone());
        state.writes.push(RecordedWrite {
            at: Instant::now(),
            body: document.clone(),
        });
        Ok(())
    }
}
