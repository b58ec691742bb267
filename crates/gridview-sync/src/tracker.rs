//! Unsaved-change tracking for debounced write-back.

use std::time::Duration;

use tokio::time::Instant;

/// Tracks unsaved view-state changes of one resource view.
///
/// Each change bumps a revision; a write completes the tracker only if no
/// newer change arrived while it was in flight. Every write outcome restarts
/// the max-delay window, so edits after a lost or superseded write are
/// debounced like any other burst.
#[derive(Debug, Clone, Default)]
pub struct SyncTracker {
    revision: u64,

    /// Highest revision the backend has accepted.
    saved_revision: u64,

    /// Start of the current max-delay window.
    first_unsaved_change: Option<Instant>,

    /// Writes in flight.
    saving: usize,
}

impl SyncTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Some edit has not reached the backend yet.
    pub fn is_dirty(&self) -> bool {
        self.revision != self.saved_revision
    }

    pub fn is_saving(&self) -> bool {
        self.saving > 0
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Record a change and return its revision.
    pub fn mark_dirty(&mut self) -> u64 {
        self.revision += 1;
        self.first_unsaved_change.get_or_insert_with(Instant::now);
        self.revision
    }

    pub fn start_save(&mut self) {
        self.saving += 1;
    }

    /// The write carrying `revision` landed; older revisions are covered too.
    /// Edits made while it was in flight open a new window from now.
    pub fn save_complete(&mut self, revision: u64) {
        self.saving = self.saving.saturating_sub(1);
        if revision > self.saved_revision {
            self.saved_revision = revision;
        }
        self.first_unsaved_change = self.is_dirty().then(Instant::now);
    }

    /// The write was lost; its edits stay pending. The next edit opens a new
    /// window.
    pub fn save_failed(&mut self) {
        self.saving = self.saving.saturating_sub(1);
        self.first_unsaved_change = None;
    }

    /// Age of the current max-delay window; caps the debounce.
    pub fn since_first_unsaved(&self) -> Option<Duration> {
        self.first_unsaved_change.map(|t| t.elapsed())
    }
}
