//! Step-by-step entry of the sets for one exercise.
//!
//! The wizard collects one set at a time and only touches the draft once the
//! last set is submitted, so a half-entered exercise never shows up in the
//! plan. Cancelling throws everything away.

use crate::draft::{EntryKey, WorkoutDraft};
use crate::model::ExerciseId;
use crate::sets::{Set, format_set};
use crate::units::WeightUnit;

/// Rejected user input. The wizard state is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    InvalidReps,
    InvalidWeight,
    EmptyWorkout,
    EmptyExerciseName,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidReps => {
                write!(f, "Please enter a valid positive number of reps.")
            }
            ValidationError::InvalidWeight => write!(f, "Please enter a valid weight."),
            ValidationError::EmptyWorkout => {
                write!(f, "Please add at least one exercise to your workout.")
            }
            ValidationError::EmptyExerciseName => write!(f, "Please enter an exercise name."),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Parse a rep count; only positive integers are accepted.
pub fn parse_reps(input: &str) -> Result<u32, ValidationError> {
    match input.trim().parse::<u32>() {
        Ok(reps) if reps > 0 => Ok(reps),
        _ => Err(ValidationError::InvalidReps),
    }
}

/// Parse an optional weight. Blank input means bodyweight.
pub fn parse_weight(input: &str) -> Result<Option<f64>, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<f64>() {
        Ok(w) if w.is_finite() => Ok(Some(w)),
        _ => Err(ValidationError::InvalidWeight),
    }
}

/// Nudge the weight text by `delta`; unparsable text counts as zero.
pub fn step_weight(input: &str, delta: f64) -> String {
    let current = input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|w| w.is_finite())
        .unwrap_or(0.0);
    format!("{}", current + delta)
}

/// Adjust a requested set count, never going below one.
pub fn step_count(count: usize, delta: i64) -> usize {
    (count as i64 + delta).max(1) as usize
}

/// Text buffers backing the weight/unit/reps inputs of the current slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SetForm {
    pub weight: String,
    pub unit: WeightUnit,
    pub reps: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardState {
    Closed,
    Collecting { index: usize, total: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Moved on to the slot at `index`.
    Advanced { index: usize },
    /// Last slot filled; the draft entry `key` now holds the sets.
    Committed(EntryKey),
    /// No session was open.
    NotOpen,
}

#[derive(Debug, Clone)]
pub struct SetEntrySession {
    exercise_id: ExerciseId,
    total: usize,
    index: usize,
    collected: Vec<Option<Set>>,
    editing: Option<EntryKey>,
    initial: Vec<Option<Set>>,
    pub form: SetForm,
}

impl SetEntrySession {
    pub fn exercise_id(&self) -> &ExerciseId {
        &self.exercise_id
    }

    pub fn editing(&self) -> Option<&EntryKey> {
        self.editing.as_ref()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn total(&self) -> usize {
        self.total
    }

    fn slot(&self, i: usize) -> Option<Set> {
        self.collected
            .get(i)
            .copied()
            .flatten()
            .or_else(|| self.initial.get(i).copied().flatten())
    }

    fn prefill(&self, default_unit: WeightUnit) -> SetForm {
        match self.slot(self.index) {
            Some(set) => SetForm {
                weight: set.weight.map(|w| w.to_string()).unwrap_or_default(),
                unit: set.unit,
                reps: if set.reps > 0 {
                    set.reps.to_string()
                } else {
                    String::new()
                },
            },
            None => SetForm {
                weight: String::new(),
                unit: default_unit,
                reps: String::new(),
            },
        }
    }

    /// "Set i of N" for the slot being entered.
    pub fn set_label(&self) -> String {
        format!("Set {} of {}", (self.index + 1).min(self.total), self.total)
    }

    pub fn action_label(&self) -> &'static str {
        if self.index + 1 < self.total {
            "Next"
        } else if self.editing.is_some() {
            "Save Changes"
        } else {
            "Finish Exercise"
        }
    }

    pub fn title(&self, exercise_name: &str) -> String {
        if self.editing.is_some() {
            format!("Edit Sets: {exercise_name}")
        } else {
            format!("Enter Reps: {exercise_name}")
        }
    }

    /// One read-only chip per slot showing what is known about it so far.
    pub fn chips(&self) -> Vec<String> {
        (0..self.total)
            .map(|i| match self.slot(i) {
                Some(set) => format_set(&set, i),
                None => format!("Set {}", i + 1),
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct SetEntryWizard {
    session: Option<SetEntrySession>,
    last_unit: WeightUnit,
}

impl SetEntryWizard {
    pub fn new(last_unit: WeightUnit) -> Self {
        Self {
            session: None,
            last_unit,
        }
    }

    pub fn state(&self) -> WizardState {
        match &self.session {
            Some(s) => WizardState::Collecting {
                index: s.index,
                total: s.total,
            },
            None => WizardState::Closed,
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&SetEntrySession> {
        self.session.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut SetForm> {
        self.session.as_mut().map(|s| &mut s.form)
    }

    /// Unit preselected for blank slots; updated on every accepted set.
    pub fn last_unit(&self) -> WeightUnit {
        self.last_unit
    }

    /// Begin collecting sets for `exercise_id`.
    ///
    /// `total` is raised to at least one and to the number of `initial` sets
    /// so pre-filled data is never cut off. Passing `editing` makes the final
    /// submit overwrite that entry instead of appending a new one.
    pub fn open(
        &mut self,
        exercise_id: ExerciseId,
        total: usize,
        editing: Option<EntryKey>,
        initial: &[Set],
    ) {
        let total = total.max(initial.len()).max(1);
        let mut initial: Vec<Option<Set>> = initial.iter().copied().map(Some).collect();
        initial.resize(total, None);
        let mut session = SetEntrySession {
            exercise_id,
            total,
            index: 0,
            collected: vec![None; total],
            editing,
            initial,
            form: SetForm {
                weight: String::new(),
                unit: self.last_unit,
                reps: String::new(),
            },
        };
        session.form = session.prefill(self.last_unit);
        self.session = Some(session);
    }

    /// Submit whatever is currently typed into the form.
    pub fn submit_form(&mut self, draft: &mut WorkoutDraft) -> Result<SubmitOutcome, ValidationError> {
        let Some(form) = self.session.as_ref().map(|s| s.form.clone()) else {
            return Ok(SubmitOutcome::NotOpen);
        };
        self.submit(&form.weight, form.unit, &form.reps, draft)
    }

    /// Validate and store the current slot, then advance or commit.
    pub fn submit(
        &mut self,
        weight: &str,
        unit: WeightUnit,
        reps: &str,
        draft: &mut WorkoutDraft,
    ) -> Result<SubmitOutcome, ValidationError> {
        if self.session.is_none() {
            return Ok(SubmitOutcome::NotOpen);
        }
        let reps = parse_reps(reps)?;
        let weight = parse_weight(weight)?;
        self.last_unit = unit;

        let last_unit = self.last_unit;
        let Some(session) = self.session.as_mut() else {
            return Ok(SubmitOutcome::NotOpen);
        };
        let index = session.index;
        session.collected[index] = Some(Set::new(weight, unit, reps));

        if index + 1 < session.total {
            session.index = index + 1;
            session.form = session.prefill(last_unit);
            return Ok(SubmitOutcome::Advanced {
                index: session.index,
            });
        }

        let Some(session) = self.session.take() else {
            return Ok(SubmitOutcome::NotOpen);
        };
        let sets: Vec<Set> = session.collected.into_iter().flatten().collect();
        let key = match session.editing {
            Some(key) => {
                draft.update_entry_sets(&key, sets);
                key
            }
            None => draft.add_entry(session.exercise_id, sets),
        };
        log::info!("Committed sets for entry {key}");
        Ok(SubmitOutcome::Committed(key))
    }

    /// Close without touching the draft.
    pub fn cancel(&mut self) {
        self.session = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_new(wizard: &mut SetEntryWizard, total: usize) {
        wizard.open("1".into(), total, None, &[]);
    }

    #[test]
    fn three_sets_commit_one_entry_in_order() {
        let mut draft = WorkoutDraft::new();
        let mut wizard = SetEntryWizard::new(WeightUnit::Lb);
        open_new(&mut wizard, 3);

        assert_eq!(
            wizard.submit("100", WeightUnit::Lb, "5", &mut draft),
            Ok(SubmitOutcome::Advanced { index: 1 })
        );
        assert_eq!(
            wizard.submit("110", WeightUnit::Lb, "4", &mut draft),
            Ok(SubmitOutcome::Advanced { index: 2 })
        );
        assert!(draft.is_empty());
        let outcome = wizard.submit("", WeightUnit::Lb, "12", &mut draft).unwrap();

        assert!(matches!(outcome, SubmitOutcome::Committed(_)));
        assert_eq!(wizard.state(), WizardState::Closed);
        assert_eq!(draft.entries().len(), 1);
        let entry = &draft.entries()[0];
        assert_eq!(entry.exercise_id, ExerciseId::from("1"));
        assert_eq!(
            entry.sets,
            vec![
                Set::new(Some(100.0), WeightUnit::Lb, 5),
                Set::new(Some(110.0), WeightUnit::Lb, 4),
                Set::new(None, WeightUnit::Lb, 12),
            ]
        );
    }

    #[test]
    fn invalid_input_keeps_index() {
        let mut draft = WorkoutDraft::new();
        let mut wizard = SetEntryWizard::new(WeightUnit::Lb);
        open_new(&mut wizard, 2);
        wizard.submit("100", WeightUnit::Lb, "5", &mut draft).unwrap();

        for reps in ["0", "abc", "", "-3", "2.5"] {
            assert_eq!(
                wizard.submit("100", WeightUnit::Lb, reps, &mut draft),
                Err(ValidationError::InvalidReps)
            );
        }
        assert_eq!(
            wizard.submit("heavy", WeightUnit::Lb, "5", &mut draft),
            Err(ValidationError::InvalidWeight)
        );
        assert_eq!(
            wizard.submit("inf", WeightUnit::Lb, "5", &mut draft),
            Err(ValidationError::InvalidWeight)
        );
        assert_eq!(
            wizard.state(),
            WizardState::Collecting { index: 1, total: 2 }
        );
        assert!(draft.is_empty());
    }

    #[test]
    fn total_is_clamped_and_raised_for_prefill() {
        let mut wizard = SetEntryWizard::new(WeightUnit::Lb);
        open_new(&mut wizard, 0);
        assert_eq!(
            wizard.state(),
            WizardState::Collecting { index: 0, total: 1 }
        );

        let initial = vec![Set::bodyweight(10); 4];
        wizard.open("1".into(), 2, None, &initial);
        assert_eq!(
            wizard.state(),
            WizardState::Collecting { index: 0, total: 4 }
        );
    }

    #[test]
    fn edit_mode_overwrites_existing_entry() {
        let mut draft = WorkoutDraft::new();
        let key = draft.add_entry("2".into(), vec![Set::new(Some(50.0), WeightUnit::Kg, 5)]);
        let mut wizard = SetEntryWizard::new(WeightUnit::Lb);
        let initial = draft.entry(&key).unwrap().sets.clone();
        wizard.open("2".into(), initial.len(), Some(key.clone()), &initial);

        let session = wizard.session().unwrap();
        assert_eq!(session.form.weight, "50");
        assert_eq!(session.form.unit, WeightUnit::Kg);
        assert_eq!(session.form.reps, "5");
        assert_eq!(session.action_label(), "Save Changes");
        assert_eq!(session.title("Bench"), "Edit Sets: Bench");

        let outcome = wizard.submit("55", WeightUnit::Kg, "5", &mut draft).unwrap();
        assert_eq!(outcome, SubmitOutcome::Committed(key.clone()));
        assert_eq!(draft.entries().len(), 1);
        assert_eq!(
            draft.entry(&key).unwrap().sets,
            vec![Set::new(Some(55.0), WeightUnit::Kg, 5)]
        );
    }

    #[test]
    fn cancel_discards_collected_sets() {
        let mut draft = WorkoutDraft::new();
        let mut wizard = SetEntryWizard::new(WeightUnit::Lb);
        open_new(&mut wizard, 2);
        wizard.submit("100", WeightUnit::Lb, "5", &mut draft).unwrap();
        wizard.cancel();
        assert_eq!(wizard.state(), WizardState::Closed);
        assert!(draft.is_empty());
        assert_eq!(
            wizard.submit("100", WeightUnit::Lb, "5", &mut draft),
            Ok(SubmitOutcome::NotOpen)
        );
    }

    #[test]
    fn accepted_unit_becomes_default() {
        let mut draft = WorkoutDraft::new();
        let mut wizard = SetEntryWizard::new(WeightUnit::Lb);
        open_new(&mut wizard, 2);
        wizard.submit("60", WeightUnit::Kg, "5", &mut draft).unwrap();
        assert_eq!(wizard.last_unit(), WeightUnit::Kg);
        assert_eq!(wizard.session().unwrap().form.unit, WeightUnit::Kg);
        assert_eq!(wizard.session().unwrap().form.weight, "");
    }

    #[test]
    fn rejected_input_does_not_change_default_unit() {
        let mut draft = WorkoutDraft::new();
        let mut wizard = SetEntryWizard::new(WeightUnit::Lb);
        open_new(&mut wizard, 1);
        let _ = wizard.submit("60", WeightUnit::Kg, "0", &mut draft);
        assert_eq!(wizard.last_unit(), WeightUnit::Lb);
    }

    #[test]
    fn submit_form_uses_buffers() {
        let mut draft = WorkoutDraft::new();
        let mut wizard = SetEntryWizard::new(WeightUnit::Lb);
        open_new(&mut wizard, 1);
        if let Some(form) = wizard.form_mut() {
            form.weight = "135".into();
            form.reps = "8".into();
        }
        let outcome = wizard.submit_form(&mut draft).unwrap();
        assert!(matches!(outcome, SubmitOutcome::Committed(_)));
        assert_eq!(draft.entries()[0].sets[0], Set::new(Some(135.0), WeightUnit::Lb, 8));
    }

    #[test]
    fn labels_and_chips_follow_progress() {
        let mut draft = WorkoutDraft::new();
        let mut wizard = SetEntryWizard::new(WeightUnit::Lb);
        open_new(&mut wizard, 2);
        {
            let s = wizard.session().unwrap();
            assert_eq!(s.set_label(), "Set 1 of 2");
            assert_eq!(s.action_label(), "Next");
            assert_eq!(s.chips(), vec!["Set 1", "Set 2"]);
            assert_eq!(s.title("Squat"), "Enter Reps: Squat");
        }
        wizard.submit("100", WeightUnit::Lb, "5", &mut draft).unwrap();
        let s = wizard.session().unwrap();
        assert_eq!(s.set_label(), "Set 2 of 2");
        assert_eq!(s.action_label(), "Finish Exercise");
        assert_eq!(s.chips(), vec!["Set 1: 100 lb×5", "Set 2"]);
    }

    #[test]
    fn steppers() {
        assert_eq!(step_weight("100", 0.5), "100.5");
        assert_eq!(step_weight("", -0.5), "-0.5");
        assert_eq!(step_weight("abc", 2.5), "2.5");
        assert_eq!(step_count(1, -1), 1);
        assert_eq!(step_count(3, 1), 4);
    }
}
