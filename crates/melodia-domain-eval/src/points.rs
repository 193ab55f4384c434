use melodia_ports::storage::{UserProgress, UserSettings};
use melodia_ports::types::{Difficulty, PianoSize};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Correct answers at or under this time earn the fast-answer base.
pub const FAST_ANSWER: Duration = Duration::from_secs(2);

pub fn difficulty_bonus(difficulty: Difficulty) -> f64 {
    match difficulty {
        Difficulty::Easy => 1.0,
        Difficulty::Normal => 1.5,
        Difficulty::Hard => 2.0,
    }
}

pub fn hint_bonus(settings: &UserSettings) -> f64 {
    if settings.hints_enabled {
        1.0
    } else {
        1.3
    }
}

pub fn piano_size_bonus(size: PianoSize) -> f64 {
    match size {
        PianoSize::Three => 1.0,
        PianoSize::Four => 1.1,
        PianoSize::Five => 1.25,
    }
}

pub fn no_color_bonus(settings: &UserSettings) -> f64 {
    if settings.system_color_assist {
        1.0
    } else {
        1.5
    }
}

fn scaled(base: u32, multiplier: f64) -> u32 {
    (base as f64 * multiplier).round_ties_even().max(0.0) as u32
}

/// Points for a correctly identified note.
pub fn recognition_points(elapsed: Duration, wrong_attempts: u32, settings: &UserSettings) -> u32 {
    let base = match wrong_attempts {
        0 if elapsed <= FAST_ANSWER => 15,
        0 => 10,
        1 => 5,
        _ => 2,
    };
    let multiplier = difficulty_bonus(settings.difficulty)
        * hint_bonus(settings)
        * piano_size_bonus(settings.piano_size)
        * no_color_bonus(settings);
    scaled(base, multiplier)
}

pub fn melody_step_points(has_mistake: bool, settings: &UserSettings) -> u32 {
    let base = if has_mistake { 3 } else { 8 };
    scaled(base, no_color_bonus(settings))
}

pub fn challenge_multiplier(steps_completed: usize, perfect: bool) -> f64 {
    let complexity = 1.0 + steps_completed as f64 * 0.4;
    if perfect {
        complexity * 1.8
    } else {
        complexity
    }
}

pub fn challenge_points(steps_completed: usize, perfect: bool) -> u32 {
    let base = if perfect { 20 } else { 10 };
    scaled(base, challenge_multiplier(steps_completed, perfect))
}

/// Total points needed to reach `level`.
pub fn level_threshold(level: u32) -> u32 {
    let n = level as u64;
    let threshold = 200 * n + 75 * n * n.saturating_sub(1);
    threshold.min(u32::MAX as u64) as u32
}

/// Highest level reachable from `current_level` with `points`, skipping as many
/// thresholds as the total allows.
pub fn level_for_points(current_level: u32, points: u32) -> u32 {
    let mut level = current_level;
    while level < u32::MAX && points >= level_threshold(level + 1) {
        level += 1;
    }
    level
}

pub fn points_to_next_level(level: u32, points: u32) -> u32 {
    level_threshold(level.saturating_add(1)).saturating_sub(points)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsAward {
    pub awarded: u32,
    pub total: u32,
    pub level_before: u32,
    pub level_after: u32,
}

impl PointsAward {
    pub fn leveled_up(&self) -> bool {
        self.level_after > self.level_before
    }
}

/// Adds points to the profile and applies every level-up they unlock.
pub fn apply_award(progress: &mut UserProgress, points: u32) -> PointsAward {
    let level_before = progress.level;
    progress.points = progress.points.saturating_add(points);
    progress.level = level_for_points(progress.level, progress.points);
    PointsAward {
        awarded: points,
        total: progress.points,
        level_before,
        level_after: progress.level,
    }
}
