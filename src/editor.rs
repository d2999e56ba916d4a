//! Editing session for the "new workout" flow.
//!
//! [`WorkoutEditor`] owns the draft, the set-entry wizard and the drag
//! controller. The UI never mutates them directly; it turns user actions into
//! [`EditorIntent`]s and acts on the returned [`EditorEffect`].

use chrono::{Local, Utc};

use crate::draft::{EntryKey, WorkoutDraft};
use crate::model::{ExerciseId, NewWorkout, Workout};
use crate::reorder::DragReorder;
use crate::units::WeightUnit;
use crate::wizard::{SetEntryWizard, SubmitOutcome, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    /// Pick between a fresh workout and reusing a recent one.
    Chooser,
    /// Compose the plan.
    Builder,
}

#[derive(Debug, Clone)]
pub enum EditorIntent {
    StartFresh,
    StartFromRecent(Workout),
    BackToChooser,
    Rename(String),
    BeginSets { exercise_id: ExerciseId, total: usize },
    EditEntry(EntryKey),
    RemoveEntry(EntryKey),
    Reorder(Vec<EntryKey>),
    SubmitSet,
    CancelSet,
    RequestFinish,
    Finish,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorEffect {
    None,
    /// A set was accepted with this unit; persist it as the new default.
    UnitRemembered(WeightUnit),
    /// The draft can be saved; ask the user to confirm.
    ConfirmFinish,
    /// Hand this workout to storage.
    Persist(NewWorkout),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    Validation(ValidationError),
    SaveInProgress,
}

impl std::fmt::Display for EditorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditorError::Validation(e) => write!(f, "{e}"),
            EditorError::SaveInProgress => write!(f, "The workout is still being saved."),
        }
    }
}

impl std::error::Error for EditorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EditorError::Validation(e) => Some(e),
            EditorError::SaveInProgress => None,
        }
    }
}

impl From<ValidationError> for EditorError {
    fn from(e: ValidationError) -> Self {
        EditorError::Validation(e)
    }
}

fn default_workout_name() -> String {
    format!("Workout - {}", Local::now().format("%Y-%m-%d %H:%M"))
}

#[derive(Debug)]
pub struct WorkoutEditor {
    draft: WorkoutDraft,
    wizard: SetEntryWizard,
    drag: DragReorder,
    mode: EditorMode,
    saving: bool,
}

impl WorkoutEditor {
    pub fn new(default_unit: WeightUnit) -> Self {
        Self {
            draft: WorkoutDraft::new(),
            wizard: SetEntryWizard::new(default_unit),
            drag: DragReorder::new(),
            mode: EditorMode::Chooser,
            saving: false,
        }
    }

    pub fn draft(&self) -> &WorkoutDraft {
        &self.draft
    }

    pub fn wizard(&self) -> &SetEntryWizard {
        &self.wizard
    }

    /// Direct access for binding the wizard's text inputs.
    pub fn wizard_mut(&mut self) -> &mut SetEntryWizard {
        &mut self.wizard
    }

    pub fn drag(&self) -> &DragReorder {
        &self.drag
    }

    pub fn drag_mut(&mut self) -> &mut DragReorder {
        &mut self.drag
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// Builder is shown whenever it was chosen or the draft has content.
    pub fn mode(&self) -> EditorMode {
        if self.mode == EditorMode::Builder || self.draft.has_content() {
            EditorMode::Builder
        } else {
            EditorMode::Chooser
        }
    }

    fn reset(&mut self) {
        self.draft.reset();
        self.wizard.cancel();
        self.drag.cancel();
    }

    pub fn dispatch(&mut self, intent: EditorIntent) -> Result<EditorEffect, EditorError> {
        if self.saving {
            return Err(EditorError::SaveInProgress);
        }
        match intent {
            EditorIntent::StartFresh => {
                self.reset();
                self.mode = EditorMode::Builder;
            }
            EditorIntent::StartFromRecent(workout) => {
                self.reset();
                self.draft = WorkoutDraft::from_workout(&workout);
                self.mode = EditorMode::Builder;
                log::info!("Reusing workout {} ({})", workout.id, workout.name);
            }
            EditorIntent::BackToChooser => {
                self.reset();
                self.mode = EditorMode::Chooser;
            }
            EditorIntent::Rename(name) => self.draft.name = name,
            EditorIntent::BeginSets { exercise_id, total } => {
                self.wizard.open(exercise_id, total, None, &[]);
            }
            EditorIntent::EditEntry(key) => {
                if let Some(entry) = self.draft.entry(&key) {
                    let initial = entry.sets.clone();
                    let exercise_id = entry.exercise_id.clone();
                    self.wizard
                        .open(exercise_id, initial.len(), Some(key), &initial);
                }
            }
            EditorIntent::RemoveEntry(key) => {
                self.draft.remove_entry(&key);
            }
            EditorIntent::Reorder(order) => self.draft.reorder(&order),
            EditorIntent::SubmitSet => {
                return match self.wizard.submit_form(&mut self.draft)? {
                    SubmitOutcome::NotOpen => Ok(EditorEffect::None),
                    SubmitOutcome::Advanced { .. } | SubmitOutcome::Committed(_) => {
                        Ok(EditorEffect::UnitRemembered(self.wizard.last_unit()))
                    }
                };
            }
            EditorIntent::CancelSet => self.wizard.cancel(),
            EditorIntent::RequestFinish => {
                self.check_finishable()?;
                return Ok(EditorEffect::ConfirmFinish);
            }
            EditorIntent::Finish => {
                self.check_finishable()?;
                self.wizard.cancel();
                self.drag.cancel();
                self.saving = true;
                let workout = self.draft.to_new_workout(Utc::now());
                log::info!(
                    "Saving workout '{}' with {} exercises",
                    workout.name,
                    workout.entries.len()
                );
                return Ok(EditorEffect::Persist(workout));
            }
        }
        Ok(EditorEffect::None)
    }

    fn check_finishable(&mut self) -> Result<(), ValidationError> {
        if self.draft.is_empty() {
            return Err(ValidationError::EmptyWorkout);
        }
        if self.draft.name.trim().is_empty() {
            self.draft.name = default_workout_name();
        }
        Ok(())
    }

    /// Storage accepted the workout: start over.
    pub fn save_succeeded(&mut self) {
        self.saving = false;
        self.reset();
        self.mode = EditorMode::Chooser;
    }

    /// Storage failed: keep the draft so nothing is lost.
    pub fn save_failed(&mut self) {
        self.saving = false;
    }
}
