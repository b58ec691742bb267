//! Per-resource view state with hydration and debounced write-back.
//!
//! [`PreferenceSync`] owns the backend, the shared document cache and the
//! write-back configuration. Each screen opens one [`ResourceView`], which
//! hydrates once from the stored document and then writes the whole view
//! state back after every burst of edits.
//!
//! Write-back runs on a spawned task per scheduled write. A new edit within
//! the quiet period cancels the pending task and schedules a fresh one; a
//! write that already started is left to finish. Dropping the view cancels
//! everything it still owns.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use gridview_core::{LeafPatch, ViewStore};
use gridview_model::{
    FieldRegistry, FilterGroup, FilterValue, GridPreference, LogicalOp, SaveGridPreference,
    SortDirection, ViewState,
};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::PreferenceBackend;
use crate::cache::{PreferenceCache, cache_key};
use crate::config::SyncConfig;
use crate::error::Result;
use crate::merge::hydrate;
use crate::tracker::SyncTracker;

struct Shared<B> {
    backend: B,
    cache: PreferenceCache,
    config: SyncConfig,
}

/// Entry point shared by every screen of one user session.
pub struct PreferenceSync<B> {
    shared: Arc<Shared<B>>,
}

impl<B> Clone for PreferenceSync<B> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<B: PreferenceBackend> PreferenceSync<B> {
    pub fn new(backend: B, config: SyncConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                backend,
                cache: PreferenceCache::new(),
                config,
            }),
        }
    }

    pub fn backend(&self) -> &B {
        &self.shared.backend
    }

    pub fn cache(&self) -> &PreferenceCache {
        &self.shared.cache
    }

    pub fn config(&self) -> &SyncConfig {
        &self.shared.config
    }

    /// Stored document of `resource`, served from the cache when present.
    /// Failed reads are not cached.
    pub async fn fetch(&self, resource: &str) -> Result<Option<GridPreference>> {
        let key = cache_key(resource);
        if let Some(document) = self.shared.cache.get(&key) {
            debug!(resource, "grid preference served from cache");
            return Ok(document);
        }
        let document = self.shared.backend.fetch(resource).await?;
        self.shared.cache.insert(key, document.clone());
        Ok(document)
    }

    /// Open the view of `resource` with the screen's defaults. The view
    /// starts unhydrated; call [`ResourceView::load`] to read the stored
    /// document.
    pub fn open(
        &self,
        resource: impl Into<String>,
        defaults: ViewState,
        registry: FieldRegistry,
    ) -> ResourceView<B> {
        let resource = resource.into();
        debug!(resource = %resource, "opening resource view");
        ResourceView {
            resource,
            store: ViewStore::new(defaults.clone(), registry),
            defaults,
            hydration: Hydration::Pending,
            tracker: Arc::new(Mutex::new(SyncTracker::new())),
            pending: None,
            sync: self.clone(),
        }
    }
}

/// How the view obtained its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hydration {
    /// The stored document has not been read yet.
    Pending,
    /// No stored document; the defaults apply.
    Defaults,
    /// A stored document was merged over the defaults.
    Stored,
    /// The read failed; the defaults apply for this session.
    Failed,
}

impl Hydration {
    pub fn is_complete(self) -> bool {
        self != Self::Pending
    }
}

/// Detailed sync state of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Waiting for hydration.
    Loading,
    /// Nothing scheduled or in flight.
    Idle,
    /// A write is scheduled and waiting out the quiet period.
    Pending,
    /// A write is in flight.
    Saving,
}

/// A scheduled write. Whoever flips `claimed` first decides its fate: the
/// task (to start writing) or the view (to cancel it).
struct PendingWrite {
    handle: JoinHandle<()>,
    claimed: Arc<AtomicBool>,
}

impl PendingWrite {
    /// Cancel if the write has not started. Returns the handle of a write
    /// that is already in flight.
    fn cancel(self) -> Option<JoinHandle<()>> {
        if self.claimed.swap(true, Ordering::SeqCst) {
            Some(self.handle)
        } else {
            self.handle.abort();
            None
        }
    }

    fn is_waiting(&self) -> bool {
        !self.claimed.load(Ordering::SeqCst) && !self.handle.is_finished()
    }
}

/// View state of one resource on one screen.
pub struct ResourceView<B: PreferenceBackend> {
    resource: String,
    defaults: ViewState,
    store: ViewStore,
    hydration: Hydration,
    tracker: Arc<Mutex<SyncTracker>>,
    pending: Option<PendingWrite>,
    sync: PreferenceSync<B>,
}

impl<B: PreferenceBackend> ResourceView<B> {
    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn state(&self) -> &ViewState {
        self.store.state()
    }

    pub fn store(&self) -> &ViewStore {
        &self.store
    }

    pub fn defaults(&self) -> &ViewState {
        &self.defaults
    }

    pub fn hydration(&self) -> Hydration {
        self.hydration
    }

    pub fn status(&self) -> SyncStatus {
        if !self.hydration.is_complete() {
            return SyncStatus::Loading;
        }
        if lock(&self.tracker).is_saving() {
            return SyncStatus::Saving;
        }
        if self.pending.as_ref().is_some_and(PendingWrite::is_waiting) {
            return SyncStatus::Pending;
        }
        SyncStatus::Idle
    }

    /// True while loading, while a write is pending and while one is in
    /// flight.
    pub fn is_syncing(&self) -> bool {
        self.status() != SyncStatus::Idle
    }

    /// Whether edits exist that no successful write has covered yet.
    pub fn has_unsaved_changes(&self) -> bool {
        lock(&self.tracker).is_dirty()
    }

    /// Read the stored document (cache first) and merge it over the current
    /// state. Runs once; later calls return the earlier outcome.
    pub async fn load(&mut self) -> Hydration {
        if self.hydration.is_complete() {
            return self.hydration;
        }
        let result = self.sync.fetch(&self.resource).await;
        self.apply_hydration(result);
        self.hydration
    }

    /// Complete hydration with the outcome of a read. Only the first call
    /// has an effect; returns whether this one did.
    pub fn apply_hydration(&mut self, result: Result<Option<GridPreference>>) -> bool {
        if self.hydration.is_complete() {
            debug!(resource = %self.resource, "hydration already applied");
            return false;
        }
        self.hydration = match result {
            Ok(Some(document)) => {
                let next = hydrate(self.store.state(), Some(&document));
                self.store.replace(next);
                info!(resource = %self.resource, "view state hydrated from stored preference");
                Hydration::Stored
            }
            Ok(None) => {
                debug!(resource = %self.resource, "no stored preference; using defaults");
                Hydration::Defaults
            }
            Err(error) => {
                warn!(resource = %self.resource, %error, "preference read failed; using defaults");
                Hydration::Failed
            }
        };
        true
    }

    /// Apply one state transition. A transition that changed the state
    /// schedules a write of the whole view state.
    pub fn edit(&mut self, f: impl FnOnce(&mut ViewStore) -> bool) -> bool {
        let changed = f(&mut self.store);
        if changed {
            self.schedule_write();
        }
        changed
    }

    // =========================================================================
    // SETTERS
    // =========================================================================

    pub fn set_visible_columns(&mut self, visible: BTreeMap<String, bool>) -> bool {
        self.edit(|store| store.set_visible_columns(visible))
    }

    pub fn set_column_visible(&mut self, column: &str, visible: bool) -> bool {
        self.edit(|store| store.set_column_visible(column, visible))
    }

    pub fn toggle_column(&mut self, column: &str) -> bool {
        self.edit(|store| store.toggle_column(column))
    }

    pub fn set_columns_order(&mut self, order: Vec<String>) -> bool {
        self.edit(|store| store.set_columns_order(order))
    }

    pub fn move_column(&mut self, column: &str, to: usize) -> bool {
        self.edit(|store| store.move_column(column, to))
    }

    pub fn set_sort(&mut self, sort_by: Option<String>, direction: SortDirection) -> bool {
        self.edit(|store| store.set_sort(sort_by, direction))
    }

    pub fn toggle_sort(&mut self, column: &str) -> bool {
        self.edit(|store| store.toggle_sort(column))
    }

    pub fn set_filters_tree(&mut self, tree: FilterGroup) -> bool {
        self.edit(|store| store.set_filters_tree(tree))
    }

    pub fn add_leaf(&mut self, parent_id: &str, field: &str) -> bool {
        self.edit(|store| store.add_leaf(parent_id, field))
    }

    pub fn add_group(&mut self, parent_id: &str, logical: LogicalOp) -> bool {
        self.edit(|store| store.add_group(parent_id, logical))
    }

    pub fn remove_node(&mut self, node_id: &str) -> bool {
        self.edit(|store| store.remove_node(node_id))
    }

    pub fn update_leaf(&mut self, node_id: &str, patch: &LeafPatch) -> bool {
        self.edit(|store| store.update_leaf(node_id, patch))
    }

    pub fn set_leaf_value(&mut self, node_id: &str, value: FilterValue) -> bool {
        self.edit(|store| store.set_leaf_value(node_id, value))
    }

    pub fn set_logical(&mut self, group_id: &str, logical: LogicalOp) -> bool {
        self.edit(|store| store.set_logical(group_id, logical))
    }

    pub fn clear_filters(&mut self) -> bool {
        self.edit(ViewStore::clear_filters)
    }

    // =========================================================================
    // WRITE-BACK
    // =========================================================================

    /// Write the current state now, replacing any pending write. Waits for a
    /// write already in flight first so the newer state lands last.
    pub async fn flush(&mut self) -> Result<()> {
        if let Some(in_flight) = self.pending.take().and_then(PendingWrite::cancel) {
            // The in-flight write reports its own outcome.
            let _ = in_flight.await;
        }
        if !self.writes_enabled() || !lock(&self.tracker).is_dirty() {
            return Ok(());
        }

        let revision = {
            let mut tracker = lock(&self.tracker);
            tracker.start_save();
            tracker.revision()
        };
        let document = SaveGridPreference::new(self.resource.clone(), self.store.state());
        let shared = &self.sync.shared;
        match shared.backend.save(&document).await {
            Ok(()) => {
                lock(&self.tracker).save_complete(revision);
                shared.cache.invalidate(&cache_key(&self.resource));
                debug!(resource = %self.resource, revision, "preference flushed");
                Ok(())
            }
            Err(error) => {
                lock(&self.tracker).save_failed();
                Err(error)
            }
        }
    }

    /// Tear the view down, cancelling any write it still owns.
    pub fn close(mut self) {
        self.cancel_all();
    }

    fn writes_enabled(&self) -> bool {
        self.sync.shared.config.enabled && self.hydration.is_complete()
    }

    fn schedule_write(&mut self) {
        if !self.writes_enabled() {
            debug!(
                resource = %self.resource,
                hydration = ?self.hydration,
                "write-back suppressed"
            );
            return;
        }

        if let Some(pending) = self.pending.take() {
            // An in-flight write finishes on its own.
            drop(pending.cancel());
        }

        let (revision, delay) = {
            let mut tracker = lock(&self.tracker);
            let revision = tracker.mark_dirty();
            let since_first = tracker.since_first_unsaved().unwrap_or(Duration::ZERO);
            (revision, self.sync.shared.config.write_delay(since_first))
        };
        debug!(
            resource = %self.resource,
            revision,
            delay_ms = delay.as_millis() as u64,
            "preference write scheduled"
        );

        let document = SaveGridPreference::new(self.resource.clone(), self.store.state());
        let claimed = Arc::new(AtomicBool::new(false));
        let handle = tokio::spawn(write_after(
            Arc::clone(&self.sync.shared),
            Arc::clone(&self.tracker),
            Arc::clone(&claimed),
            document,
            revision,
            delay,
        ));
        self.pending = Some(PendingWrite { handle, claimed });
    }

    fn cancel_all(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.claimed.store(true, Ordering::SeqCst);
            pending.handle.abort();
            debug!(resource = %self.resource, "pending preference write cancelled");
        }
    }
}

impl<B: PreferenceBackend> Drop for ResourceView<B> {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

async fn write_after<B: PreferenceBackend>(
    shared: Arc<Shared<B>>,
    tracker: Arc<Mutex<SyncTracker>>,
    claimed: Arc<AtomicBool>,
    document: SaveGridPreference,
    revision: u64,
    delay: Duration,
) {
    tokio::time::sleep(delay).await;
    if claimed.swap(true, Ordering::SeqCst) {
        return;
    }

    lock(&tracker).start_save();
    let resource = document.resource.as_str();
    match shared.backend.save(&document).await {
        Ok(()) => {
            lock(&tracker).save_complete(revision);
            shared.cache.invalidate(&cache_key(resource));
            debug!(resource, revision, "preference written");
        }
        Err(error) => {
            lock(&tracker).save_failed();
            warn!(resource, revision, %error, "preference write dropped");
        }
    }
}

fn lock(tracker: &Mutex<SyncTracker>) -> MutexGuard<'_, SyncTracker> {
    tracker.lock().unwrap_or_else(PoisonError::into_inner)
}
