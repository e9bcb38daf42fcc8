//! Background saving on a dedicated thread.

use super::file::write;
use super::{PersistError, PersistResult};
use crate::model::Project;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::thread::{self, JoinHandle};

/// Identifies one background save request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SaveTicket(u64);

/// Commands sent to the save thread.
enum SaveCommand {
    Save {
        ticket: SaveTicket,
        path: PathBuf,
        project: Box<Project>,
    },
    Shutdown,
}

/// Result of a background save.
#[derive(Debug)]
pub struct SaveOutcome {
    pub ticket: SaveTicket,
    /// The path written, or why the save failed.
    pub result: PersistResult<PathBuf>,
}

/// Writes project snapshots on a background thread, one at a time.
///
/// A request is in flight from [`request`](Self::request) until its outcome
/// is collected with [`poll`](Self::poll) or [`wait`](Self::wait); further
/// requests are refused with [`PersistError::SaveInProgress`] meanwhile.
pub struct SaveWorker {
    cmd_tx: Option<Sender<SaveCommand>>,
    outcome_rx: Receiver<SaveOutcome>,
    thread: Option<JoinHandle<()>>,
    in_flight: Option<SaveTicket>,
    next_ticket: u64,
}

impl SaveWorker {
    /// Start the save thread.
    pub fn new() -> Self {
        let (cmd_tx, cmd_rx) = channel::<SaveCommand>();
        let (outcome_tx, outcome_rx) = channel::<SaveOutcome>();

        let handle = thread::spawn(move || {
            log::debug!("Save thread started");
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    SaveCommand::Save {
                        ticket,
                        path,
                        project,
                    } => {
                        let result = write(&path, &project);
                        if let Err(e) = &result {
                            log::error!("Background save to {} failed: {}", path.display(), e);
                        }
                        if outcome_tx.send(SaveOutcome { ticket, result }).is_err() {
                            break;
                        }
                    }
                    SaveCommand::Shutdown => break,
                }
            }
            log::debug!("Save thread exiting");
        });

        Self {
            cmd_tx: Some(cmd_tx),
            outcome_rx,
            thread: Some(handle),
            in_flight: None,
            next_ticket: 0,
        }
    }

    /// Queue a save of `project` to `path`.
    pub fn request(&mut self, path: &Path, project: Project) -> PersistResult<SaveTicket> {
        if self.in_flight.is_some() {
            log::warn!("Save requested while another save is in flight");
            return Err(PersistError::SaveInProgress);
        }
        let tx = self.cmd_tx.as_ref().ok_or(PersistError::WorkerGone)?;
        let ticket = SaveTicket(self.next_ticket);
        tx.send(SaveCommand::Save {
            ticket,
            path: path.to_path_buf(),
            project: Box::new(project),
        })
        .map_err(|_| PersistError::WorkerGone)?;
        self.next_ticket += 1;
        self.in_flight = Some(ticket);
        Ok(ticket)
    }

    /// Whether a request is waiting for its outcome to be collected.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Collect a finished save without blocking.
    pub fn poll(&mut self) -> Option<SaveOutcome> {
        let ticket = self.in_flight?;
        match self.outcome_rx.try_recv() {
            Ok(outcome) => {
                self.in_flight = None;
                Some(outcome)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.in_flight = None;
                Some(SaveOutcome {
                    ticket,
                    result: Err(PersistError::WorkerGone),
                })
            }
        }
    }

    /// Block until the in-flight save finishes. `None` if nothing is in flight.
    pub fn wait(&mut self) -> Option<SaveOutcome> {
        let ticket = self.in_flight.take()?;
        Some(self.outcome_rx.recv().unwrap_or(SaveOutcome {
            ticket,
            result: Err(PersistError::WorkerGone),
        }))
    }
}

impl Default for SaveWorker {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SaveWorker {
    fn drop(&mut self) {
        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(SaveCommand::Shutdown);
        }
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                log::error!("Save thread panicked");
            }
        }
    }
}

impl std::fmt::Debug for SaveWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveWorker")
            .field("in_flight", &self.in_flight)
            .field("next_ticket", &self.next_ticket)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::Session;
    use crate::persist::load;

    #[test]
    fn test_background_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bg.dio");
        let mut session = Session::default();
        session.create_frame(None).unwrap();

        let mut worker = SaveWorker::new();
        assert!(worker.poll().is_none());
        let ticket = worker.request(&path, session.project().clone()).unwrap();
        assert!(worker.is_busy());

        let outcome = worker.wait().unwrap();
        assert_eq!(outcome.ticket, ticket);
        assert_eq!(outcome.result.unwrap(), path);
        assert!(!worker.is_busy());
        assert_eq!(&load(&path).unwrap(), session.project());
    }

    #[test]
    fn test_second_request_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut worker = SaveWorker::new();
        worker.request(&dir.path().join("a.dio"), Project::new()).unwrap();
        let second = worker.request(&dir.path().join("b.dio"), Project::new());
        assert!(matches!(second, Err(PersistError::SaveInProgress)));

        assert!(worker.wait().unwrap().result.is_ok());
        assert!(worker.request(&dir.path().join("b.dio"), Project::new()).is_ok());
        assert!(worker.wait().unwrap().result.is_ok());
        assert!(worker.wait().is_none());
    }

    #[test]
    fn test_failed_save_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut worker = SaveWorker::new();
        worker
            .request(&dir.path().join("missing").join("x.dio"), Project::new())
            .unwrap();
        let outcome = worker.wait().unwrap();
        assert!(matches!(outcome.result, Err(PersistError::Io { .. })));
    }
}
