//! Save state tracking.

use super::{PersistError, PersistResult};

/// Where the in-memory project stands relative to its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    /// Never written and unchanged since creation.
    Unsaved,
    /// A write is in flight.
    Saving,
    /// Matches the file on disk.
    Saved,
    /// Has changes that are not on disk.
    Dirty,
}

/// Derives the [`SaveState`] from the session's revision counter.
///
/// The tracker remembers which revision is clean and which one is being
/// written, so a failed save falls back to whatever the state was before.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveTracker {
    clean_revision: u64,
    saved: bool,
    in_flight: Option<u64>,
}

impl SaveTracker {
    /// A project that has never been written, clean at `revision`.
    pub fn unsaved(revision: u64) -> Self {
        Self {
            clean_revision: revision,
            saved: false,
            in_flight: None,
        }
    }

    /// A project that matches its file at `revision`.
    pub fn saved(revision: u64) -> Self {
        Self {
            clean_revision: revision,
            saved: true,
            in_flight: None,
        }
    }

    pub fn state(&self, revision: u64) -> SaveState {
        if self.in_flight.is_some() {
            SaveState::Saving
        } else if revision != self.clean_revision {
            SaveState::Dirty
        } else if self.saved {
            SaveState::Saved
        } else {
            SaveState::Unsaved
        }
    }

    /// Whether `revision` has changes that are not on disk.
    pub fn is_dirty(&self, revision: u64) -> bool {
        revision != self.clean_revision
    }

    pub fn is_saving(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Enter `Saving` for `revision`. Only one save may be in flight.
    pub fn begin(&mut self, revision: u64) -> PersistResult<()> {
        if self.in_flight.is_some() {
            return Err(PersistError::SaveInProgress);
        }
        self.in_flight = Some(revision);
        Ok(())
    }

    /// Leave `Saving`. On success the written revision becomes clean.
    pub fn finish(&mut self, succeeded: bool) {
        if let Some(revision) = self.in_flight.take() {
            if succeeded {
                self.clean_revision = revision;
                self.saved = true;
            }
        }
    }

    /// Record a completed synchronous save of `revision`.
    pub fn mark_saved(&mut self, revision: u64) {
        self.clean_revision = revision;
        self.saved = true;
    }
}

impl Default for SaveTracker {
    fn default() -> Self {
        Self::unsaved(0)
    }
}
