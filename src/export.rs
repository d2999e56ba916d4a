use chrono::{Local, TimeZone};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::model::{Exercise, Workout, exercise_name};
use crate::storage::StorageError;

/// File name suggested by the save dialog.
pub const DEFAULT_EXPORT_NAME: &str = "pumping_iron_export.csv";

const HEADER: [&str; 8] = [
    "workout_id",
    "workout_name",
    "date_local",
    "exercise",
    "set_number",
    "weight_lb",
    "reps",
    "unit",
];

#[derive(Serialize)]
struct SetRow<'a> {
    workout_id: &'a str,
    workout_name: &'a str,
    date_local: String,
    exercise: &'a str,
    set_number: usize,
    weight_lb: String,
    reps: u32,
    unit: &'static str,
}

/// Write one row per set of every workout, dates rendered in `tz`.
///
/// Weights are converted to pounds with one decimal; bodyweight sets leave
/// both `weight_lb` and `unit` empty.
pub fn write_workouts_csv<Tz>(
    writer: impl Write,
    workouts: &[Workout],
    exercises: &[Exercise],
    tz: &Tz,
) -> Result<usize, StorageError>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(HEADER)?;
    let mut rows = 0;
    for w in workouts {
        let date_local = w
            .date
            .with_timezone(tz)
            .format("%Y-%m-%d %H:%M:%S %:z")
            .to_string();
        for entry in &w.entries {
            let exercise = exercise_name(exercises, &entry.exercise_id);
            for (i, set) in entry.sets.iter().enumerate() {
                let (weight_lb, unit) = match set.weight_lb() {
                    Some(lb) => (format!("{lb:.1}"), set.unit.label()),
                    None => (String::new(), ""),
                };
                wtr.serialize(SetRow {
                    workout_id: &w.id.0,
                    workout_name: &w.name,
                    date_local: date_local.clone(),
                    exercise,
                    set_number: i + 1,
                    weight_lb,
                    reps: set.reps,
                    unit,
                })?;
                rows += 1;
            }
        }
    }
    wtr.flush()?;
    Ok(rows)
}

/// Export to a file using the local time zone.
pub fn save_workouts_csv<P: AsRef<Path>>(
    path: P,
    workouts: &[Workout],
    exercises: &[Exercise],
) -> Result<usize, StorageError> {
    let file = std::fs::File::create(path.as_ref())?;
    let rows = write_workouts_csv(file, workouts, exercises, &Local)?;
    log::info!("Exported {rows} sets to {}", path.as_ref().display());
    Ok(rows)
}
