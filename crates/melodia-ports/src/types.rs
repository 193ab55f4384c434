use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pitch identifier, MIDI numbering (60 = middle C).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Note(pub u8);

impl Note {
    pub fn pitch(self) -> u8 {
        self.0
    }

    /// Signed semitone distance `self - other`.
    pub fn distance_from(self, other: Note) -> i32 {
        self.0 as i32 - other.0 as i32
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid note token: {0:?}")]
pub struct ParseNoteError(pub String);

impl FromStr for Note {
    type Err = ParseNoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .map_err(|_| ParseNoteError(s.to_string()))
            .and_then(Note::try_from)
    }
}

impl TryFrom<u8> for Note {
    type Error = ParseNoteError;

    fn try_from(pitch: u8) -> Result<Self, Self::Error> {
        if pitch < 128 {
            Ok(Note(pitch))
        } else {
            Err(ParseNoteError(pitch.to_string()))
        }
    }
}

impl From<Note> for u8 {
    fn from(note: Note) -> Self {
        note.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct Volume01(pub f32);

impl Volume01 {
    pub fn new(value: f32) -> Self {
        Self(value.clamp(0.0, 1.0))
    }

    pub fn get(self) -> f32 {
        self.0
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingRangeError {
    #[error("difficulty out of range: {0} (expected 1..=3)")]
    Difficulty(u8),
    #[error("piano size out of range: {0} (expected 3..=5 octaves)")]
    PianoSize(u8),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "u8", into = "u8")]
pub enum Difficulty {
    #[default]
    Easy,
    Normal,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    pub fn level(self) -> u8 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Normal => 2,
            Difficulty::Hard => 3,
        }
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = SettingRangeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Difficulty::Easy),
            2 => Ok(Difficulty::Normal),
            3 => Ok(Difficulty::Hard),
            other => Err(SettingRangeError::Difficulty(other)),
        }
    }
}

impl From<Difficulty> for u8 {
    fn from(value: Difficulty) -> Self {
        value.level()
    }
}

/// Number of visible octaves on the on-screen keyboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PianoSize {
    Three,
    Four,
    Five,
}

impl PianoSize {
    pub fn octaves(self) -> u8 {
        match self {
            PianoSize::Three => 3,
            PianoSize::Four => 4,
            PianoSize::Five => 5,
        }
    }
}

impl Default for PianoSize {
    fn default() -> Self {
        PianoSize::Four
    }
}

impl TryFrom<u8> for PianoSize {
    type Error = SettingRangeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            3 => Ok(PianoSize::Three),
            4 => Ok(PianoSize::Four),
            5 => Ok(PianoSize::Five),
            other => Err(SettingRangeError::PianoSize(other)),
        }
    }
}

impl From<PianoSize> for u8 {
    fn from(value: PianoSize) -> Self {
        value.octaves()
    }
}
