use melodia_ports::types::Note;
use serde::{Deserialize, Serialize};

/// Notes that must be played back-to-back, in order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub notes: Vec<Note>,
}

impl Step {
    pub fn new(notes: Vec<Note>) -> Self {
        Self { notes }
    }

    pub fn from_pitches(pitches: &[u8]) -> Self {
        Self::new(pitches.iter().copied().map(Note).collect())
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    /// Stable key used for progress and achievement ids.
    pub id: String,
    pub name: String,
    pub steps: Vec<Step>,
}

impl Song {
    pub fn new(id: impl Into<String>, name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            steps,
        }
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn is_last_step(&self, index: usize) -> bool {
        index + 1 == self.steps.len()
    }

    /// All notes of steps `0..=last_step`, in order.
    pub fn combined_notes(&self, last_step: usize) -> Vec<Note> {
        self.steps
            .iter()
            .take(last_step.saturating_add(1))
            .flat_map(|step| step.notes.iter().copied())
            .collect()
    }
}
