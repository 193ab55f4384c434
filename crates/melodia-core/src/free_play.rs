use crate::config::ms;
use crate::context::GameContext;
use melodia_domain_eval::AchievementCheck;
use melodia_ports::types::Note;
use std::time::Duration;

/// Unjudged play. Every key is accepted and time spent playing earns points.
#[derive(Debug, Default)]
pub struct FreePlaySession {
    active: bool,
    since_reward: Duration,
    rewards: u32,
    notes_played: u32,
}

impl FreePlaySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, ctx: &mut GameContext) {
        self.active = true;
        self.since_reward = Duration::ZERO;
        self.rewards = 0;
        self.notes_played = 0;
        ctx.set_input_enabled(true);
        ctx.unlock_achievements(AchievementCheck::FreePlaySessions);
    }

    pub fn stop(&mut self, ctx: &mut GameContext) {
        if !self.active {
            return;
        }
        self.active = false;
        ctx.set_input_enabled(false);
        log::info!(
            "free play over: {} notes, {} rewards",
            self.notes_played,
            self.rewards
        );
    }

    pub fn press(&mut self, note: Note, ctx: &mut GameContext) -> Option<bool> {
        if !self.active || ctx.is_paused() {
            return None;
        }
        self.notes_played += 1;
        ctx.press_as_player(note, true);
        Some(true)
    }

    /// Unpaused play time accrues towards the next reward.
    pub fn tick(&mut self, dt: Duration, ctx: &mut GameContext) {
        if !self.active || ctx.is_paused() {
            return;
        }
        let interval = ms(ctx.config().free_play.reward_interval_ms);
        self.since_reward = self.since_reward.saturating_add(dt);
        while self.since_reward >= interval {
            self.since_reward -= interval;
            if !ctx.has_profile() {
                continue;
            }
            self.rewards += 1;
            let points = ctx.config().free_play.points_per_reward;
            ctx.award_points(points);
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn rewards(&self) -> u32 {
        self.rewards
    }

    pub fn notes_played(&self) -> u32 {
        self.notes_played
    }
}
