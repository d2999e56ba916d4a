//! Persistence backends for exercises and workouts.

use dirs_next as dirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::model::{Exercise, ExerciseId, NewWorkout, Workout, WorkoutEntry, WorkoutId, id_rank, sort_workouts_desc};

#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Csv(csv::Error),
    Http { status: u16, body: String },
    Transport(String),
    Config(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "I/O error: {e}"),
            StorageError::Json(e) => write!(f, "Invalid data: {e}"),
            StorageError::Csv(e) => write!(f, "CSV error: {e}"),
            StorageError::Http { status, body } => write!(f, "Server returned {status}: {body}"),
            StorageError::Transport(msg) => write!(f, "Network error: {msg}"),
            StorageError::Config(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            StorageError::Json(e) => Some(e),
            StorageError::Csv(e) => Some(e),
            StorageError::Http { .. } | StorageError::Transport(_) | StorageError::Config(_) => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Json(e)
    }
}

impl From<csv::Error> for StorageError {
    fn from(e: csv::Error) -> Self {
        StorageError::Csv(e)
    }
}

/// CRUD surface shared by every backend. Mutations return the refreshed list.
pub trait Repository: Send {
    /// Short name shown in the UI.
    fn backend_name(&self) -> &'static str;

    fn list_exercises(&mut self) -> Result<Vec<Exercise>, StorageError>;
    fn create_exercise(&mut self, name: &str) -> Result<Vec<Exercise>, StorageError>;
    fn rename_exercise(&mut self, id: &ExerciseId, name: &str) -> Result<Vec<Exercise>, StorageError>;
    fn delete_exercise(&mut self, id: &ExerciseId) -> Result<Vec<Exercise>, StorageError>;

    fn list_workouts(&mut self) -> Result<Vec<Workout>, StorageError>;
    fn create_workout(&mut self, workout: NewWorkout) -> Result<Vec<Workout>, StorageError>;
    fn delete_workout(&mut self, id: &WorkoutId) -> Result<Vec<Workout>, StorageError>;
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreDocument {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    exercises: Vec<Exercise>,
    #[serde(default)]
    workouts: Vec<Workout>,
}

impl StoreDocument {
    /// Smallest id not used by any stored record.
    fn first_free_id(&self) -> u64 {
        let exercise_ids = self.exercises.iter().map(|e| id_rank(&e.id.0).0);
        let workout_ids = self.workouts.iter().map(|w| id_rank(&w.id.0).0);
        exercise_ids
            .chain(workout_ids)
            .filter(|id| *id != u64::MAX)
            .max()
            .map_or(1, |max| max + 1)
    }

    fn allocate_id(&mut self) -> String {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        id.to_string()
    }
}

/// Single JSON document on local disk.
pub struct JsonFileStore {
    path: PathBuf,
    doc: StoreDocument,
}

impl JsonFileStore {
    const DIR: &'static str = "pumping_iron";
    const FILE: &'static str = "data.json";

    /// Default location under the platform data directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join(Self::DIR).join(Self::FILE))
    }

    /// Open the store at `path`. A missing file is an empty store.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let mut doc: StoreDocument = match fs::read_to_string(&path) {
            Ok(data) => serde_json::from_str(&data)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreDocument::default(),
            Err(e) => return Err(e.into()),
        };
        doc.next_id = doc.next_id.max(doc.first_free_id());
        sort_workouts_desc(&mut doc.workouts);
        log::info!(
            "Opened local store {} ({} exercises, {} workouts)",
            path.display(),
            doc.exercises.len(),
            doc.workouts.len()
        );
        Ok(Self { path, doc })
    }

    fn flush(&self, doc: &StoreDocument) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Apply `change` to a copy of the document and keep it only once it is on disk.
    /// `change` returns false when there is nothing to write.
    fn commit<F>(&mut self, change: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut StoreDocument) -> bool,
    {
        let mut staged = self.doc.clone();
        if !change(&mut staged) {
            return Ok(());
        }
        self.flush(&staged)?;
        self.doc = staged;
        Ok(())
    }
}

impl Repository for JsonFileStore {
    fn backend_name(&self) -> &'static str {
        "local file"
    }

    fn list_exercises(&mut self) -> Result<Vec<Exercise>, StorageError> {
        Ok(self.doc.exercises.clone())
    }

    fn create_exercise(&mut self, name: &str) -> Result<Vec<Exercise>, StorageError> {
        let name = name.trim().to_string();
        self.commit(|doc| {
            let id = ExerciseId(doc.allocate_id());
            log::info!("Creating exercise {id}: {name}");
            doc.exercises.push(Exercise { id, name });
            true
        })?;
        self.list_exercises()
    }

    fn rename_exercise(&mut self, id: &ExerciseId, name: &str) -> Result<Vec<Exercise>, StorageError> {
        self.commit(|doc| match doc.exercises.iter_mut().find(|e| &e.id == id) {
            Some(ex) => {
                ex.name = name.trim().to_string();
                true
            }
            None => {
                log::debug!("Rename of unknown exercise {id} ignored");
                false
            }
        })?;
        self.list_exercises()
    }

    fn delete_exercise(&mut self, id: &ExerciseId) -> Result<Vec<Exercise>, StorageError> {
        self.commit(|doc| {
            let before = doc.exercises.len();
            doc.exercises.retain(|e| &e.id != id);
            let removed = doc.exercises.len() != before;
            if removed {
                log::info!("Deleted exercise {id}");
            }
            removed
        })?;
        self.list_exercises()
    }

    fn list_workouts(&mut self) -> Result<Vec<Workout>, StorageError> {
        Ok(self.doc.workouts.clone())
    }

    fn create_workout(&mut self, workout: NewWorkout) -> Result<Vec<Workout>, StorageError> {
        self.commit(|doc| {
            let id = WorkoutId(doc.allocate_id());
            log::info!("Saving workout {id}: {} ({} entries)", workout.name, workout.entries.len());
            doc.workouts.push(Workout {
                id,
                name: workout.name,
                date: workout.date,
                entries: workout.entries,
            });
            sort_workouts_desc(&mut doc.workouts);
            true
        })?;
        self.list_workouts()
    }

    fn delete_workout(&mut self, id: &WorkoutId) -> Result<Vec<Workout>, StorageError> {
        self.commit(|doc| {
            let before = doc.workouts.len();
            doc.workouts.retain(|w| &w.id != id);
            let removed = doc.workouts.len() != before;
            if removed {
                log::info!("Deleted workout {id}");
            }
            removed
        })?;
        self.list_workouts()
    }
}

/// Entries as stored, used by backends that keep them as a JSON column.
pub(crate) fn entries_to_json(entries: &[WorkoutEntry]) -> Result<String, StorageError> {
    Ok(serde_json::to_string(entries)?)
}
