// Module for turning workout history into per-set progress series
use chrono::{DateTime, Local, Utc};
use egui::Color32;
use std::collections::BTreeMap;

use crate::model::{ExerciseId, Workout};

/// Horizontal distance between neighbouring set positions of one workout.
pub const OFFSET_STEP: f64 = 0.12;

/// Palette cycled through by series in order.
pub const SERIES_COLORS: [Color32; 8] = [
    Color32::from_rgb(0x6c, 0x5c, 0xe7),
    Color32::from_rgb(0x00, 0xb8, 0x94),
    Color32::from_rgb(0xe1, 0x70, 0x55),
    Color32::from_rgb(0x09, 0x84, 0xe3),
    Color32::from_rgb(0xe8, 0x43, 0x93),
    Color32::from_rgb(0xfd, 0xcb, 0x6e),
    Color32::from_rgb(0x2d, 0x34, 0x36),
    Color32::from_rgb(0x63, 0x6e, 0x72),
];

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressPoint {
    /// Position of the workout on the chronological x axis.
    pub workout_index: usize,
    pub lateral_offset: f64,
    pub weight_lb: f64,
    pub reps: u32,
    pub date: DateTime<Utc>,
    pub workout_name: String,
    /// 1-based set position within the workout.
    pub set_number: usize,
}

impl ProgressPoint {
    /// X value in data coordinates, offset included.
    pub fn x(&self) -> f64 {
        self.workout_index as f64 + self.lateral_offset
    }
}

/// All loaded sets sharing one set position across workouts.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSeries {
    pub label: String,
    pub color: Color32,
    pub points: Vec<ProgressPoint>,
    pub visible: bool,
}

/// X range covering every offset point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisDomain {
    pub min: f64,
    pub max: f64,
}

impl Default for AxisDomain {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressData {
    pub labels: Vec<String>,
    pub series: Vec<ProgressSeries>,
    pub domain: AxisDomain,
}

impl ProgressData {
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Flip the visibility of series `index`; out of range is ignored.
    pub fn toggle(&mut self, index: usize) {
        if let Some(s) = self.series.get_mut(index) {
            s.visible = !s.visible;
        }
    }

    /// Largest weight among visible series, in pounds.
    pub fn max_visible_weight(&self) -> Option<f64> {
        self.series
            .iter()
            .filter(|s| s.visible)
            .flat_map(|s| s.points.iter().map(|p| p.weight_lb))
            .fold(None, |acc, w| Some(acc.map_or(w, |a: f64| a.max(w))))
    }
}

/// Short local date used for x-axis categories.
pub fn format_label(date: &DateTime<Utc>) -> String {
    date.with_timezone(&Local).format("%b %d, %y").to_string()
}

/// Build progress series for `exercise` using local date labels.
pub fn gather(exercise: &ExerciseId, workouts: &[Workout]) -> ProgressData {
    gather_with(exercise, workouts, format_label)
}

/// Build progress series for `exercise`.
///
/// Workouts containing the exercise are ordered by date (ties keep their
/// input order). Sets are grouped by their position in the entry, so series
/// `k` holds every workout's `k`-th set. Bodyweight sets are skipped and
/// weights are converted to pounds.
pub fn gather_with(
    exercise: &ExerciseId,
    workouts: &[Workout],
    label: impl Fn(&DateTime<Utc>) -> String,
) -> ProgressData {
    let mut timeline: Vec<(&Workout, &[crate::sets::Set])> = workouts
        .iter()
        .filter_map(|w| w.entry_for(exercise).map(|e| (w, e.sets.as_slice())))
        .collect();
    timeline.sort_by_key(|(w, _)| w.date);

    let labels: Vec<String> = timeline.iter().map(|(w, _)| label(&w.date)).collect();
    if timeline.is_empty() {
        return ProgressData {
            labels,
            ..ProgressData::default()
        };
    }

    let max_sets = timeline.iter().map(|(_, sets)| sets.len()).max().unwrap_or(0);
    let step = if max_sets > 1 { OFFSET_STEP } else { 0.0 };
    let center = max_sets.saturating_sub(1) as f64 / 2.0;
    let half_spread = step * center;

    let mut by_position: BTreeMap<usize, Vec<ProgressPoint>> = BTreeMap::new();
    for (workout_index, (workout, sets)) in timeline.iter().enumerate() {
        for (pos, set) in sets.iter().enumerate() {
            let Some(weight_lb) = set.weight_lb() else {
                continue;
            };
            by_position.entry(pos).or_default().push(ProgressPoint {
                workout_index,
                lateral_offset: (pos as f64 - center) * step,
                weight_lb,
                reps: set.reps,
                date: workout.date,
                workout_name: workout.name.clone(),
                set_number: pos + 1,
            });
        }
    }

    let series = by_position
        .into_iter()
        .enumerate()
        .map(|(i, (pos, points))| ProgressSeries {
            label: format!("Set {}", pos + 1),
            color: SERIES_COLORS[i % SERIES_COLORS.len()],
            points,
            visible: true,
        })
        .collect();

    log::debug!(
        "Progress for exercise {exercise}: {} workouts, up to {max_sets} sets",
        labels.len()
    );

    let domain = AxisDomain {
        min: -half_spread,
        max: (labels.len() - 1) as f64 + half_spread,
    };
    ProgressData {
        labels,
        series,
        domain,
    }
}
