use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sets::Set;

/// Placeholder shown for references that no longer resolve.
pub const UNKNOWN_EXERCISE: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExerciseId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkoutId(pub String);

impl std::fmt::Display for ExerciseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for WorkoutId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExerciseId {
    fn from(s: &str) -> Self {
        ExerciseId(s.to_string())
    }
}

impl From<&str> for WorkoutId {
    fn from(s: &str) -> Self {
        WorkoutId(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: ExerciseId,
    pub name: String,
}

/// One exercise's sets inside a saved workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutEntry {
    pub exercise_id: ExerciseId,
    #[serde(default)]
    pub sets: Vec<Set>,
}

/// A persisted workout. Never edited after saving, only deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: WorkoutId,
    pub name: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub entries: Vec<WorkoutEntry>,
}

impl Workout {
    /// First entry recorded for `exercise`, if any.
    pub fn entry_for(&self, exercise: &ExerciseId) -> Option<&WorkoutEntry> {
        self.entries.iter().find(|e| &e.exercise_id == exercise)
    }
}

/// A workout ready to be stored; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWorkout {
    pub name: String,
    pub date: DateTime<Utc>,
    pub entries: Vec<WorkoutEntry>,
}

/// Look up an exercise name, falling back to [`UNKNOWN_EXERCISE`].
pub fn exercise_name<'a>(exercises: &'a [Exercise], id: &ExerciseId) -> &'a str {
    exercises
        .iter()
        .find(|e| &e.id == id)
        .map(|e| e.name.as_str())
        .unwrap_or(UNKNOWN_EXERCISE)
}

/// Order used for rank-ordered ids: numeric ids compare by value, anything
/// else after them lexicographically.
pub fn id_rank(id: &str) -> (u64, &str) {
    (id.parse::<u64>().unwrap_or(u64::MAX), id)
}

/// Sort workouts newest first, ties broken by descending id.
pub fn sort_workouts_desc(workouts: &mut [Workout]) {
    workouts.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| id_rank(&b.id.0).cmp(&id_rank(&a.id.0)))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn workout(id: &str, ms: i64) -> Workout {
        Workout {
            id: id.into(),
            name: format!("W{id}"),
            date: Utc.timestamp_millis_opt(ms).unwrap(),
            entries: Vec::new(),
        }
    }

    #[test]
    fn unknown_exercise_placeholder() {
        let exercises = vec![Exercise {
            id: "1".into(),
            name: "Squat".into(),
        }];
        assert_eq!(exercise_name(&exercises, &"1".into()), "Squat");
        assert_eq!(exercise_name(&exercises, &"9".into()), UNKNOWN_EXERCISE);
    }

    #[test]
    fn workouts_sort_by_date_then_id() {
        let mut ws = vec![workout("2", 1000), workout("10", 1000), workout("3", 5000)];
        sort_workouts_desc(&mut ws);
        let ids: Vec<&str> = ws.iter().map(|w| w.id.0.as_str()).collect();
        assert_eq!(ids, vec!["3", "10", "2"]);
    }

    #[test]
    fn workout_json_uses_epoch_millis_and_camel_case() {
        let json = r#"{"id":"4","name":"Legs","date":1700000000000,
            "entries":[{"exerciseId":"1","sets":[5,{"weight":"100","reps":"5"}]}]}"#;
        let w: Workout = serde_json::from_str(json).unwrap();
        assert_eq!(w.date.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(w.entries[0].exercise_id, ExerciseId::from("1"));
        assert_eq!(w.entries[0].sets[0].reps, 5);
        assert_eq!(w.entries[0].sets[1].weight, Some(100.0));

        let back = serde_json::to_value(&w).unwrap();
        assert_eq!(back["entries"][0]["exerciseId"], "1");
        assert_eq!(back["date"], 1_700_000_000_000_i64);
    }
}
