use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

fn default_true() -> bool {
    true
}

fn default_level() -> u32 {
    1
}

fn default_volume() -> Volume01 {
    Volume01::new(1.0)
}

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(String),
    #[error("serialization error: {0}")]
    Serde(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub difficulty: Difficulty,
    #[serde(default = "default_true")]
    pub hints_enabled: bool,
    /// Tint keys pressed by the game itself.
    #[serde(default = "default_true")]
    pub system_color_assist: bool,
    pub piano_size: PianoSize,
    #[serde(default = "default_volume")]
    pub volume: Volume01,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Easy,
            hints_enabled: true,
            system_color_assist: true,
            piano_size: PianoSize::Four,
            volume: Volume01::new(1.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProgress {
    pub username: String,
    pub points: u32,
    #[serde(default = "default_level")]
    pub level: u32,
    pub free_play_count: u32,
    pub note_recognition_count: u32,
    pub melody_play_count: u32,
    pub achievements: BTreeSet<String>,
    /// Song id -> number of steps completed without a mistake.
    pub unlocked_steps: BTreeMap<String, usize>,
    pub settings: UserSettings,
    pub profile_picture: u32,
}

impl Default for UserProgress {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl UserProgress {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            points: 0,
            level: 1,
            free_play_count: 0,
            note_recognition_count: 0,
            melody_play_count: 0,
            achievements: BTreeSet::new(),
            unlocked_steps: BTreeMap::new(),
            settings: UserSettings::default(),
            profile_picture: 0,
        }
    }

    pub fn unlocked_step(&self, song_id: &str) -> usize {
        self.unlocked_steps.get(song_id).copied().unwrap_or(0)
    }

    /// Raises the unlocked step count for a song. Never lowers it.
    pub fn unlock_step(&mut self, song_id: &str, completed: usize) -> bool {
        let entry = self.unlocked_steps.entry(song_id.to_string()).or_insert(0);
        if completed > *entry {
            *entry = completed;
            true
        } else {
            false
        }
    }

    pub fn has_achievement(&self, id: &str) -> bool {
        self.achievements.contains(id)
    }

    /// Returns false when the achievement was already present.
    pub fn add_achievement(&mut self, id: &str) -> bool {
        if self.achievements.contains(id) {
            return false;
        }
        self.achievements.insert(id.to_string())
    }
}

pub trait ProfileStorePort: Send + Sync {
    fn list_usernames(&self) -> Result<Vec<String>, StorageError>;

    /// `Ok(None)` when no profile exists for `username`.
    fn load_profile(&self, username: &str) -> Result<Option<UserProgress>, StorageError>;

    /// Inserts or replaces the profile keyed by its username.
    fn save_profile(&self, profile: &UserProgress) -> Result<(), StorageError>;

    fn last_user(&self) -> Result<Option<String>, StorageError>;
    fn set_last_user(&self, username: Option<&str>) -> Result<(), StorageError>;
}
