//! The open project, its file and its save state.

use crate::config::EngineConfig;
use crate::edit::Session;
use crate::model::Project;
use crate::persist::{self, PersistError, PersistResult, SaveOutcome, SaveState, SaveTicket, SaveTracker, SaveWorker};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Title shown for a project that has no file yet.
pub const UNSAVED_TITLE: &str = "Unsaved Project";

/// Workspace errors.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Project has no file yet; choose a path to save to")]
    NoPath,
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// An explicit handle on the working project.
///
/// Owns the edit [`Session`], remembers the file the project belongs to and
/// derives dirty tracking from the session's revision counter.
#[derive(Debug)]
pub struct Workspace {
    session: Session,
    path: Option<PathBuf>,
    tracker: SaveTracker,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Workspace {
    /// An empty, never saved workspace.
    pub fn new(config: EngineConfig) -> Self {
        let session = Session::new(config);
        let tracker = SaveTracker::unsaved(session.revision());
        Self {
            session,
            path: None,
            tracker,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Edit access. Every change made here marks the workspace dirty.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn project(&self) -> &Project {
        self.session.project()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn save_state(&self) -> SaveState {
        self.tracker.state(self.session.revision())
    }

    pub fn is_dirty(&self) -> bool {
        self.tracker.is_dirty(self.session.revision())
    }

    /// Window title: the file name (or a placeholder) plus `*` when dirty.
    pub fn title(&self) -> String {
        let name = self
            .path
            .as_deref()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| UNSAVED_TITLE.to_string());
        if self.is_dirty() { format!("{name}*") } else { name }
    }

    /// Drop the current project without saving and start empty.
    pub fn discard(&mut self) {
        self.session.replace_project(Project::new());
        self.path = None;
        self.tracker = SaveTracker::unsaved(self.session.revision());
    }

    /// Start a new, empty project.
    ///
    /// A dirty project that already has a file is saved first. A failed
    /// auto-save is logged and does not stop the new project.
    pub fn new_workspace(&mut self) {
        if self.path.is_some() && self.is_dirty() {
            match self.save() {
                Ok(path) => log::info!("Auto-saved {} before new project", path.display()),
                Err(e) => log::error!("Auto-save before new project failed: {}", e),
            }
        }
        self.discard();
    }

    /// Replace the project with the one stored at `path`.
    ///
    /// On failure the current project is left untouched.
    pub fn open(&mut self, path: &Path) -> Result<(), WorkspaceError> {
        let project = persist::load(path)?;
        self.session.replace_project(project);
        self.path = Some(path.to_path_buf());
        self.tracker = SaveTracker::saved(self.session.revision());
        Ok(())
    }

    /// Save to the current file.
    pub fn save(&mut self) -> Result<PathBuf, WorkspaceError> {
        let path = self.path.clone().ok_or(WorkspaceError::NoPath)?;
        self.save_as(&path)
    }

    /// Save to `path` (with `.dio` enforced) and make it the current file.
    pub fn save_as(&mut self, path: &Path) -> Result<PathBuf, WorkspaceError> {
        if self.tracker.is_saving() {
            return Err(PersistError::SaveInProgress.into());
        }
        self.session.stamp_producer();
        let revision = self.session.revision();
        let written = persist::write(path, self.session.project())?;
        self.path = Some(written.clone());
        self.tracker.mark_saved(revision);
        Ok(written)
    }

    /// Hand a snapshot of the project to `worker`.
    ///
    /// The workspace stays in [`SaveState::Saving`] until the outcome is
    /// passed to [`finish_background_save`](Self::finish_background_save).
    pub fn save_in_background(&mut self, worker: &mut SaveWorker) -> Result<SaveTicket, WorkspaceError> {
        let path = self
            .path
            .as_deref()
            .map(persist::with_dio_extension)
            .ok_or(WorkspaceError::NoPath)?;
        let revision = self.session.revision();
        self.tracker.begin(revision)?;
        self.session.stamp_producer();
        match worker.request(&path, self.session.project().clone()) {
            Ok(ticket) => Ok(ticket),
            Err(e) => {
                self.tracker.finish(false);
                Err(e.into())
            }
        }
    }

    /// Apply the outcome of a background save.
    pub fn finish_background_save(&mut self, outcome: SaveOutcome) -> PersistResult<PathBuf> {
        self.tracker.finish(outcome.result.is_ok());
        if let Ok(path) = &outcome.result {
            self.path = Some(path.clone());
        }
        outcome.result
    }
}
