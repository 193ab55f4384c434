use melodia_ports::types::Note;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HintDirection {
    /// The target is lower than the guess.
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HintMagnitude {
    Near,
    Medium,
    Far,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hint {
    /// `target - played`, in semitones.
    pub distance: i32,
    pub direction: HintDirection,
    pub magnitude: HintMagnitude,
}

impl Hint {
    /// `None` when the two pitches are equal.
    pub fn from_distance(distance: i32) -> Option<Self> {
        if distance == 0 {
            return None;
        }
        let direction = if distance < 0 {
            HintDirection::Left
        } else {
            HintDirection::Right
        };
        let magnitude = match distance.unsigned_abs() {
            0..=2 => HintMagnitude::Near,
            3..=5 => HintMagnitude::Medium,
            _ => HintMagnitude::Far,
        };
        Some(Self {
            distance,
            direction,
            magnitude,
        })
    }

    pub fn between(target: Note, played: Note) -> Option<Self> {
        Self::from_distance(target.distance_from(played))
    }
}
