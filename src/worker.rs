//! Background thread that owns the storage backend.
//!
//! The UI never blocks on I/O: it sends a [`StorageRequest`] with a
//! [`Ticket`] and polls for the matching [`StorageReply`] every frame.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::export::save_workouts_csv;
use crate::model::{Exercise, ExerciseId, NewWorkout, Workout, WorkoutId};
use crate::neon::NeonStore;
use crate::storage::{JsonFileStore, Repository, StorageError};

/// Which part of the UI a reply belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Only meaningful while the view generation is unchanged.
    View(u64),
    Global,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub scope: Scope,
}

impl Ticket {
    pub fn view(generation: u64) -> Self {
        Self {
            scope: Scope::View(generation),
        }
    }

    pub fn global() -> Self {
        Self {
            scope: Scope::Global,
        }
    }

    /// Whether a reply with this ticket should still be applied.
    pub fn is_current(&self, generation: u64) -> bool {
        match self.scope {
            Scope::View(g) => g == generation,
            Scope::Global => true,
        }
    }
}

#[derive(Debug, Clone)]
pub enum StorageRequest {
    ListExercises,
    CreateExercise(String),
    RenameExercise(ExerciseId, String),
    DeleteExercise(ExerciseId),
    ListWorkouts,
    CreateWorkout(NewWorkout),
    DeleteWorkout(WorkoutId),
    Export(PathBuf),
}

/// What a reply answers, without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Open,
    ListExercises,
    CreateExercise,
    RenameExercise,
    DeleteExercise,
    ListWorkouts,
    CreateWorkout,
    DeleteWorkout,
    Export,
}

impl RequestKind {
    /// Prefix for the notice shown when the request fails.
    pub fn failure_message(self) -> &'static str {
        match self {
            RequestKind::Open => "Cannot open storage.",
            RequestKind::ListExercises => "Cannot load exercises.",
            RequestKind::CreateExercise => "Cannot add exercise.",
            RequestKind::RenameExercise => "Cannot update exercise.",
            RequestKind::DeleteExercise => "Cannot delete exercise.",
            RequestKind::ListWorkouts => "Cannot load workouts.",
            RequestKind::CreateWorkout => "Cannot save workout.",
            RequestKind::DeleteWorkout => "Cannot delete workout.",
            RequestKind::Export => "Export failed.",
        }
    }
}

impl StorageRequest {
    pub fn kind(&self) -> RequestKind {
        match self {
            StorageRequest::ListExercises => RequestKind::ListExercises,
            StorageRequest::CreateExercise(_) => RequestKind::CreateExercise,
            StorageRequest::RenameExercise(..) => RequestKind::RenameExercise,
            StorageRequest::DeleteExercise(_) => RequestKind::DeleteExercise,
            StorageRequest::ListWorkouts => RequestKind::ListWorkouts,
            StorageRequest::CreateWorkout(_) => RequestKind::CreateWorkout,
            StorageRequest::DeleteWorkout(_) => RequestKind::DeleteWorkout,
            StorageRequest::Export(_) => RequestKind::Export,
        }
    }
}

#[derive(Debug)]
pub enum StorageResult {
    Ready {
        backend: &'static str,
        notice: Option<String>,
    },
    Exercises(Vec<Exercise>),
    Workouts(Vec<Workout>),
    WorkoutSaved(Vec<Workout>),
    Exported {
        path: PathBuf,
        rows: usize,
    },
}

#[derive(Debug)]
pub struct StorageReply {
    pub ticket: Ticket,
    pub kind: RequestKind,
    pub result: Result<StorageResult, StorageError>,
}

/// Where to look for data at startup.
#[derive(Debug, Clone, Default)]
pub struct BackendConfig {
    pub database_url: Option<String>,
    pub data_path: Option<PathBuf>,
}

/// Open the remote store when configured and reachable, otherwise the local
/// file. The second value is a notice for the user when falling back.
pub fn open_repository(
    config: &BackendConfig,
) -> Result<(Box<dyn Repository>, Option<String>), StorageError> {
    let mut notice = None;
    if let Some(url) = &config.database_url {
        match NeonStore::connect(url) {
            Ok(store) => return Ok((Box::new(store), None)),
            Err(e) => {
                log::warn!("Database unavailable, using local storage: {e}");
                notice = Some(format!(
                    "Could not connect to the database ({e}). Using local storage instead."
                ));
            }
        }
    }
    let path = config
        .data_path
        .clone()
        .ok_or_else(|| StorageError::Config("No data directory available".into()))?;
    let store = JsonFileStore::open(path)?;
    Ok((Box::new(store), notice))
}

fn handle(repo: &mut dyn Repository, request: StorageRequest) -> Result<StorageResult, StorageError> {
    match request {
        StorageRequest::ListExercises => repo.list_exercises().map(StorageResult::Exercises),
        StorageRequest::CreateExercise(name) => {
            repo.create_exercise(&name).map(StorageResult::Exercises)
        }
        StorageRequest::RenameExercise(id, name) => {
            repo.rename_exercise(&id, &name).map(StorageResult::Exercises)
        }
        StorageRequest::DeleteExercise(id) => repo.delete_exercise(&id).map(StorageResult::Exercises),
        StorageRequest::ListWorkouts => repo.list_workouts().map(StorageResult::Workouts),
        StorageRequest::CreateWorkout(w) => repo.create_workout(w).map(StorageResult::WorkoutSaved),
        StorageRequest::DeleteWorkout(id) => repo.delete_workout(&id).map(StorageResult::Workouts),
        StorageRequest::Export(path) => {
            let workouts = repo.list_workouts()?;
            let exercises = repo.list_exercises()?;
            let rows = save_workouts_csv(&path, &workouts, &exercises)?;
            Ok(StorageResult::Exported { path, rows })
        }
    }
}

pub struct StorageWorker {
    requests: Sender<(Ticket, StorageRequest)>,
    replies: Receiver<StorageReply>,
}

impl StorageWorker {
    /// Start the worker; it opens the backend itself and announces it with a
    /// global [`StorageResult::Ready`] reply.
    pub fn spawn(config: BackendConfig, ctx: Option<egui::Context>) -> Result<Self, StorageError> {
        Self::start(move || open_repository(&config), ctx)
    }

    /// Start the worker around an already opened backend.
    pub fn with_repository(
        repo: Box<dyn Repository>,
        ctx: Option<egui::Context>,
    ) -> Result<Self, StorageError> {
        Self::start(move || Ok((repo, None)), ctx)
    }

    fn start<F>(open: F, ctx: Option<egui::Context>) -> Result<Self, StorageError>
    where
        F: FnOnce() -> Result<(Box<dyn Repository>, Option<String>), StorageError> + Send + 'static,
    {
        let (req_tx, req_rx) = mpsc::channel::<(Ticket, StorageRequest)>();
        let (reply_tx, reply_rx) = mpsc::channel::<StorageReply>();

        std::thread::Builder::new()
            .name("storage".into())
            .spawn(move || {
                let send = |reply: StorageReply| {
                    let ok = reply_tx.send(reply).is_ok();
                    if let Some(ctx) = &ctx {
                        ctx.request_repaint();
                    }
                    ok
                };

                let mut repo = match open() {
                    Ok((repo, notice)) => {
                        log::info!("Storage ready: {}", repo.backend_name());
                        send(StorageReply {
                            ticket: Ticket::global(),
                            kind: RequestKind::Open,
                            result: Ok(StorageResult::Ready {
                                backend: repo.backend_name(),
                                notice,
                            }),
                        });
                        Some(repo)
                    }
                    Err(e) => {
                        log::error!("No storage backend available: {e}");
                        send(StorageReply {
                            ticket: Ticket::global(),
                            kind: RequestKind::Open,
                            result: Err(e),
                        });
                        None
                    }
                };

                for (ticket, request) in req_rx {
                    let kind = request.kind();
                    let result = match repo.as_mut() {
                        Some(repo) => handle(&mut **repo, request),
                        None => Err(StorageError::Config("Storage is not available".into())),
                    };
                    if let Err(e) = &result {
                        log::error!("{} {e}", kind.failure_message());
                    }
                    if !send(StorageReply {
                        ticket,
                        kind,
                        result,
                    }) {
                        break;
                    }
                }
                log::debug!("Storage worker stopped");
            })?;

        Ok(Self {
            requests: req_tx,
            replies: reply_rx,
        })
    }

    pub fn send(&self, ticket: Ticket, request: StorageRequest) {
        if self.requests.send((ticket, request)).is_err() {
            log::error!("Storage worker is gone; request dropped");
        }
    }

    /// Next reply, if one is waiting.
    pub fn try_recv(&self) -> Option<StorageReply> {
        self.replies.try_recv().ok()
    }

    #[cfg(test)]
    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<StorageReply> {
        self.replies.recv_timeout(timeout).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    fn worker(dir: &tempfile::TempDir) -> StorageWorker {
        let store = JsonFileStore::open(dir.path().join("data.json")).unwrap();
        let w = StorageWorker::with_repository(Box::new(store), None).unwrap();
        match w.recv_timeout(WAIT).unwrap().result {
            Ok(StorageResult::Ready { backend, notice }) => {
                assert_eq!(backend, "local file");
                assert!(notice.is_none());
            }
            other => panic!("unexpected reply: {other:?}"),
        }
        w
    }

    #[test]
    fn tickets_expire_with_generation() {
        assert!(Ticket::view(3).is_current(3));
        assert!(!Ticket::view(3).is_current(4));
        assert!(Ticket::global().is_current(99));
    }

    #[test]
    fn replies_carry_their_ticket() {
        let dir = tempfile::tempdir().unwrap();
        let w = worker(&dir);
        w.send(Ticket::view(7), StorageRequest::CreateExercise("Squat".into()));
        let reply = w.recv_timeout(WAIT).unwrap();
        assert_eq!(reply.ticket, Ticket::view(7));
        match reply.result {
            Ok(StorageResult::Exercises(list)) => assert_eq!(list[0].name, "Squat"),
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn requests_are_processed_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let w = worker(&dir);
        w.send(Ticket::view(1), StorageRequest::CreateExercise("A".into()));
        w.send(Ticket::view(2), StorageRequest::ListExercises);
        let first = w.recv_timeout(WAIT).unwrap();
        let second = w.recv_timeout(WAIT).unwrap();
        assert_eq!(first.ticket, Ticket::view(1));
        match second.result {
            Ok(StorageResult::Exercises(list)) => assert_eq!(list.len(), 1),
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let w = worker(&dir);
        let path = dir.path().join("out.csv");
        w.send(Ticket::global(), StorageRequest::Export(path.clone()));
        match w.recv_timeout(WAIT).unwrap().result {
            Ok(StorageResult::Exported { path: p, rows }) => {
                assert_eq!(p, path);
                assert_eq!(rows, 0);
            }
            other => panic!("unexpected reply: {other:?}"),
        }
        assert!(path.exists());
    }

    #[test]
    fn falls_back_to_local_store_with_notice() {
        let dir = tempfile::tempdir().unwrap();
        let config = BackendConfig {
            database_url: Some("not-a-postgres-url".into()),
            data_path: Some(dir.path().join("data.json")),
        };
        let (repo, notice) = open_repository(&config).unwrap();
        assert_eq!(repo.backend_name(), "local file");
        assert!(notice.unwrap().contains("local storage"));
    }

    #[test]
    fn missing_backend_fails_requests() {
        let w = StorageWorker::spawn(BackendConfig::default(), None).unwrap();
        let ready = w.recv_timeout(WAIT).unwrap();
        assert!(matches!(ready.result, Err(StorageError::Config(_))));
        w.send(Ticket::view(0), StorageRequest::ListWorkouts);
        let reply = w.recv_timeout(WAIT).unwrap();
        assert_eq!(reply.kind, RequestKind::ListWorkouts);
        assert_eq!(reply.kind.failure_message(), "Cannot load workouts.");
        assert!(reply.result.is_err());
    }
}
