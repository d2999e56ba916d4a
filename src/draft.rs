//! The single in-progress workout being composed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

use crate::model::{ExerciseId, NewWorkout, Workout, WorkoutEntry};
use crate::sets::Set;

static KEY_SEQ: AtomicU64 = AtomicU64::new(0);

/// Identity of a draft entry. Stable across edits and reorders, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryKey(String);

impl EntryKey {
    /// Random component plus a time and sequence suffix, unique for the
    /// lifetime of the process.
    pub fn generate() -> Self {
        let random = uuid::Uuid::new_v4().as_u128() as u64;
        let millis = Utc::now().timestamp_millis().max(0) as u64;
        let seq = KEY_SEQ.fetch_add(1, Ordering::Relaxed);
        EntryKey(format!("{random:x}-{millis:x}-{seq:x}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DraftEntry {
    pub key: EntryKey,
    pub exercise_id: ExerciseId,
    pub sets: Vec<Set>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkoutDraft {
    pub name: String,
    entries: Vec<DraftEntry>,
}

impl WorkoutDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a draft from a saved workout, giving every entry a fresh key.
    pub fn from_workout(workout: &Workout) -> Self {
        Self {
            name: workout.name.clone(),
            entries: workout
                .entries
                .iter()
                .map(|e| DraftEntry {
                    key: EntryKey::generate(),
                    exercise_id: e.exercise_id.clone(),
                    sets: e.sets.clone(),
                })
                .collect(),
        }
    }

    pub fn entries(&self) -> &[DraftEntry] {
        &self.entries
    }

    pub fn entry(&self, key: &EntryKey) -> Option<&DraftEntry> {
        self.entries.iter().find(|e| &e.key == key)
    }

    pub fn keys(&self) -> Vec<EntryKey> {
        self.entries.iter().map(|e| e.key.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when the user has typed a name or added anything.
    pub fn has_content(&self) -> bool {
        !self.entries.is_empty() || !self.name.trim().is_empty()
    }

    /// Append a new entry at the end of the order and return its key.
    pub fn add_entry(&mut self, exercise_id: ExerciseId, sets: Vec<Set>) -> EntryKey {
        let key = EntryKey::generate();
        self.entries.push(DraftEntry {
            key: key.clone(),
            exercise_id,
            sets,
        });
        key
    }

    /// Replace the sets of `key`. Unknown keys are ignored.
    pub fn update_entry_sets(&mut self, key: &EntryKey, sets: Vec<Set>) -> bool {
        match self.entries.iter_mut().find(|e| &e.key == key) {
            Some(entry) => {
                entry.sets = sets;
                true
            }
            None => {
                log::debug!("Ignoring set update for stale entry {key}");
                false
            }
        }
    }

    pub fn remove_entry(&mut self, key: &EntryKey) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| &e.key != key);
        self.entries.len() != before
    }

    /// Rearrange entries to follow `order`.
    ///
    /// Unknown and repeated keys in `order` are skipped; entries whose key is
    /// absent from `order` are dropped.
    pub fn reorder(&mut self, order: &[EntryKey]) {
        let mut by_key: HashMap<EntryKey, DraftEntry> = self
            .entries
            .drain(..)
            .map(|e| (e.key.clone(), e))
            .collect();
        self.entries = order.iter().filter_map(|k| by_key.remove(k)).collect();
        if !by_key.is_empty() {
            log::debug!("Reorder dropped {} entries", by_key.len());
        }
    }

    pub fn reset(&mut self) {
        self.name.clear();
        self.entries.clear();
    }

    /// Convert into a storable workout. Entry keys are draft-only and dropped.
    pub fn to_new_workout(&self, date: DateTime<Utc>) -> NewWorkout {
        NewWorkout {
            name: self.name.trim().to_string(),
            date,
            entries: self
                .entries
                .iter()
                .map(|e| WorkoutEntry {
                    exercise_id: e.exercise_id.clone(),
                    sets: e.sets.clone(),
                })
                .collect(),
        }
    }
}
