use melodia_ports::storage::UserProgress;
use melodia_ports::types::Difficulty;
use serde::{Deserialize, Serialize};

pub const FREE_PLAY_MILESTONES: [(u32, &str); 6] = [
    (1, "played_first"),
    (5, "played_fifth"),
    (10, "played_ten"),
    (20, "played_20"),
    (50, "played_50"),
    (100, "played_100"),
];

pub const RECOGNITION_PLAY_MILESTONES: [(u32, &str); 4] =
    [(1, "SM_1"), (5, "SM_5"), (10, "SM_10"), (25, "SM_25")];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AchievementCategory {
    NoteRecognition,
    MelodyPlay,
    FreePlay,
}

pub fn perfect_level_id(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => "SM_score",
        Difficulty::Normal => "SM_score_normal",
        Difficulty::Hard => "SM_score_hard",
    }
}

pub fn song_started_id(song_id: &str) -> String {
    format!("melody_started_{song_id}")
}

pub fn song_finished_id(song_id: &str) -> String {
    format!("melody_finished_{song_id}")
}

pub fn song_challenge_id(song_id: &str) -> String {
    format!("melody_challenge_{song_id}")
}

pub fn category_of(id: &str) -> Option<AchievementCategory> {
    if id.starts_with("SM_") {
        Some(AchievementCategory::NoteRecognition)
    } else if id.starts_with("melody_") {
        Some(AchievementCategory::MelodyPlay)
    } else if id.starts_with("played_") {
        Some(AchievementCategory::FreePlay)
    } else {
        None
    }
}

/// Facts an achievement check is evaluated against, beyond the profile itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AchievementCheck<'a> {
    FreePlaySessions,
    RecognitionSessions,
    RecognitionLevel {
        difficulty: Difficulty,
        correct: u32,
        quota: u32,
    },
    Song {
        song_id: &'a str,
        total_steps: usize,
        /// A challenge ending on the last step was replayed without a mistake.
        final_challenge_perfect: bool,
    },
}

fn milestones(count: u32, table: &[(u32, &'static str)]) -> Vec<String> {
    table
        .iter()
        .filter(|(threshold, _)| count >= *threshold)
        .map(|(_, id)| id.to_string())
        .collect()
}

/// Every achievement whose predicate holds. Already-unlocked ids are included;
/// unlocking is idempotent.
pub fn earned(progress: &UserProgress, check: AchievementCheck<'_>) -> Vec<String> {
    match check {
        AchievementCheck::FreePlaySessions => {
            milestones(progress.free_play_count, &FREE_PLAY_MILESTONES)
        }
        AchievementCheck::RecognitionSessions => {
            milestones(progress.note_recognition_count, &RECOGNITION_PLAY_MILESTONES)
        }
        AchievementCheck::RecognitionLevel {
            difficulty,
            correct,
            quota,
        } => {
            if quota > 0 && correct >= quota {
                vec![perfect_level_id(difficulty).to_string()]
            } else {
                Vec::new()
            }
        }
        AchievementCheck::Song {
            song_id,
            total_steps,
            final_challenge_perfect,
        } => {
            let unlocked = progress.unlocked_step(song_id);
            let mut ids = Vec::new();
            if unlocked >= 1 {
                ids.push(song_started_id(song_id));
            }
            if total_steps > 0 && unlocked >= total_steps {
                ids.push(song_finished_id(song_id));
            }
            if final_challenge_perfect {
                ids.push(song_challenge_id(song_id));
            }
            ids
        }
    }
}

/// Adds the earned ids that are not yet present and returns them.
pub fn unlock_earned(progress: &mut UserProgress, check: AchievementCheck<'_>) -> Vec<String> {
    earned(progress, check)
        .into_iter()
        .filter(|id| progress.add_achievement(id))
        .collect()
}
