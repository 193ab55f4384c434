use melodia_ports::types::Difficulty;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(String),
    #[error("invalid config: {0}")]
    Parse(String),
}

pub fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionTiming {
    pub first_note_delay_ms: u64,
    /// Gap between the target note sounding and the player being allowed to answer.
    pub system_play_delay_ms: u64,
    pub next_note_delay_ms: u64,
    pub end_of_level_delay_ms: u64,
    pub replay_delay_ms: u64,
    pub post_replay_delay_ms: u64,
    pub fill_animation_ms: u64,
    pub notes_per_level: u32,
    pub answer_window_easy_ms: u64,
    pub answer_window_normal_ms: u64,
    pub answer_window_hard_ms: u64,
}

impl Default for RecognitionTiming {
    fn default() -> Self {
        Self {
            first_note_delay_ms: 1000,
            system_play_delay_ms: 800,
            next_note_delay_ms: 2000,
            end_of_level_delay_ms: 2000,
            replay_delay_ms: 900,
            post_replay_delay_ms: 600,
            fill_animation_ms: 1000,
            notes_per_level: 8,
            answer_window_easy_ms: 6000,
            answer_window_normal_ms: 4000,
            answer_window_hard_ms: 2500,
        }
    }
}

impl RecognitionTiming {
    pub fn answer_window(&self, difficulty: Difficulty) -> Duration {
        ms(match difficulty {
            Difficulty::Easy => self.answer_window_easy_ms,
            Difficulty::Normal => self.answer_window_normal_ms,
            Difficulty::Hard => self.answer_window_hard_ms,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MelodyTiming {
    pub step_start_delay_ms: u64,
    pub note_interval_ms: u64,
    pub restart_delay_ms: u64,
    pub step_panel_delay_ms: u64,
    pub challenge_start_delay_ms: u64,
    /// Spacing between notes, and again between steps, of a challenge playback.
    pub challenge_gap_ms: u64,
    pub challenge_input_delay_ms: u64,
}

impl Default for MelodyTiming {
    fn default() -> Self {
        Self {
            step_start_delay_ms: 1000,
            note_interval_ms: 500,
            restart_delay_ms: 1000,
            step_panel_delay_ms: 500,
            challenge_start_delay_ms: 500,
            challenge_gap_ms: 750,
            challenge_input_delay_ms: 1000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreePlayConfig {
    pub reward_interval_ms: u64,
    pub points_per_reward: u32,
}

impl Default for FreePlayConfig {
    fn default() -> Self {
        Self {
            reward_interval_ms: 30_000,
            points_per_reward: 15,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub recognition: RecognitionTiming,
    pub melody: MelodyTiming,
    pub free_play: FreePlayConfig,
    pub feedback_clear_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            recognition: RecognitionTiming::default(),
            melody: MelodyTiming::default(),
            free_play: FreePlayConfig::default(),
            feedback_clear_ms: 2000,
        }
    }
}

impl GameConfig {
    pub fn from_json(data: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(data).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_json(&data)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.recognition.notes_per_level == 0 {
            return Err(ConfigError::Parse(
                "recognition.notes_per_level must be at least 1".to_string(),
            ));
        }
        if self.free_play.reward_interval_ms == 0 {
            return Err(ConfigError::Parse(
                "free_play.reward_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
