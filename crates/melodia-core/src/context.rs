use crate::config::GameConfig;
use crate::ipc::{Event, FeedbackTone, KeyTint};
use crate::pause::{PauseCoordinator, PauseTransition};
use melodia_domain_eval::{apply_award, category_of, unlock_earned, AchievementCheck, PointsAward};
use melodia_ports::audio::{AudioError, AudioPlayerPort};
use melodia_ports::storage::{ProfileStorePort, StorageError, UserProgress, UserSettings};
use melodia_ports::types::Note;
use rand::rngs::StdRng;
use std::collections::VecDeque;

/// State shared by every engine for one play session.
///
/// Owned by [`crate::AppCore`] and lent to the engines for each call; nothing
/// in here is global.
pub struct GameContext {
    audio: Box<dyn AudioPlayerPort>,
    store: Option<Box<dyn ProfileStorePort>>,
    profile: Option<UserProgress>,
    dirty: bool,
    pause: PauseCoordinator,
    config: GameConfig,
    rng: StdRng,
    events: VecDeque<Event>,
}

impl GameContext {
    pub fn new(
        audio: Box<dyn AudioPlayerPort>,
        store: Option<Box<dyn ProfileStorePort>>,
        config: GameConfig,
        rng: StdRng,
    ) -> Self {
        Self {
            audio,
            store,
            profile: None,
            dirty: false,
            pause: PauseCoordinator::new(),
            config,
            rng,
            events: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn store(&self) -> Option<&dyn ProfileStorePort> {
        self.store.as_deref()
    }

    pub fn profile(&self) -> Option<&UserProgress> {
        self.profile.as_ref()
    }

    pub fn has_profile(&self) -> bool {
        self.profile.is_some()
    }

    /// Mutable access marks the profile for the next flush.
    pub fn profile_mut(&mut self) -> Option<&mut UserProgress> {
        if self.profile.is_some() {
            self.dirty = true;
        }
        self.profile.as_mut()
    }

    pub fn set_profile(&mut self, profile: Option<UserProgress>) {
        self.profile = profile;
        self.dirty = false;
        let (username, points, level) = match self.profile.as_ref() {
            Some(p) => (Some(p.username.clone()), p.points, p.level),
            None => (None, 0, 0),
        };
        self.emit(Event::ProfileChanged {
            username,
            points,
            level,
        });
    }

    /// Settings of the current user, or defaults when nobody is signed in.
    pub fn settings(&self) -> UserSettings {
        self.profile
            .as_ref()
            .map(|p| p.settings)
            .unwrap_or_default()
    }

    pub fn unlocked_step(&self, song_id: &str) -> usize {
        self.profile
            .as_ref()
            .map(|p| p.unlocked_step(song_id))
            .unwrap_or(0)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn pause(&self) -> &PauseCoordinator {
        &self.pause
    }

    pub fn pause_mut(&mut self) -> &mut PauseCoordinator {
        &mut self.pause
    }

    pub fn is_paused(&self) -> bool {
        self.pause.is_paused()
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push_back(event);
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }

    pub fn show_feedback(&mut self, message: &str, tone: FeedbackTone) {
        let clear_after_ms = self.config.feedback_clear_ms;
        self.emit(Event::FeedbackText {
            message: message.to_string(),
            tone,
            clear_after_ms,
        });
    }

    pub fn clear_feedback(&mut self) {
        self.emit(Event::ClearFeedback);
    }

    pub fn set_input_enabled(&mut self, enabled: bool) {
        self.emit(Event::InputEnabled { enabled });
    }

    /// A note sounded by the game itself.
    pub fn press_as_system(&mut self, note: Note) {
        self.play(note);
        if self.settings().system_color_assist {
            self.emit(Event::KeyFeedback {
                note,
                tint: KeyTint::System,
            });
        }
    }

    /// A note sounded by the player; the tint reflects the engine's verdict.
    pub fn press_as_player(&mut self, note: Note, correct: bool) {
        self.play(note);
        let tint = if correct {
            KeyTint::Correct
        } else {
            KeyTint::Wrong
        };
        self.emit(Event::KeyFeedback { note, tint });
    }

    fn play(&mut self, note: Note) {
        match self.audio.play_note(note) {
            Ok(()) => {}
            Err(AudioError::NotFound(missing)) => {
                log::warn!("no clip for note {missing}, skipping");
            }
            Err(err) => log::warn!("note {note} playback failed: {err}"),
        }
    }

    pub fn on_pause_transition(&mut self, transition: PauseTransition) {
        match transition {
            PauseTransition::Paused => {
                self.audio.stop_all();
                self.set_input_enabled(false);
                self.show_feedback("Game Paused", FeedbackTone::Warning);
            }
            PauseTransition::Resumed => self.clear_feedback(),
        }
        let visible = transition == PauseTransition::Paused;
        self.emit(Event::PanelVisibility {
            panel: crate::ipc::Panel::Paused,
            visible,
        });
        let sources = self.pause.sources();
        self.emit(Event::PauseChanged {
            paused: visible,
            sources,
        });
    }

    /// Credits points to the signed-in user and saves. `None` without a user.
    pub fn award_points(&mut self, points: u32) -> Option<PointsAward> {
        let profile = self.profile_mut()?;
        let award = apply_award(profile, points);
        self.emit(Event::PointsAwarded {
            awarded: award.awarded,
            total: award.total,
            level: award.level_after,
        });
        if award.leveled_up() {
            log::info!("level up: {} -> {}", award.level_before, award.level_after);
            self.emit(Event::LevelUp {
                level: award.level_after,
            });
        }
        self.flush_logged();
        Some(award)
    }

    pub fn unlock_step(&mut self, song_id: &str, completed: usize) -> bool {
        let raised = match self.profile.as_mut() {
            Some(profile) => profile.unlock_step(song_id, completed),
            None => false,
        };
        if raised {
            self.dirty = true;
            log::info!("{song_id}: {completed} steps unlocked");
        }
        raised
    }

    /// Unlocks whatever `check` earns and saves if anything was new.
    pub fn unlock_achievements(&mut self, check: AchievementCheck<'_>) -> Vec<String> {
        let Some(profile) = self.profile.as_mut() else {
            return Vec::new();
        };
        let unlocked = unlock_earned(profile, check);
        if unlocked.is_empty() {
            return unlocked;
        }
        self.dirty = true;
        for id in &unlocked {
            log::info!("achievement unlocked: {id}");
            self.events.push_back(Event::AchievementUnlocked {
                id: id.clone(),
                category: category_of(id),
            });
        }
        self.flush_logged();
        unlocked
    }

    /// Writes the profile if it changed since the last successful save.
    ///
    /// On failure the profile stays dirty and the next flush retries.
    pub fn flush(&mut self) -> Result<(), StorageError> {
        if !self.dirty {
            return Ok(());
        }
        let Some(profile) = self.profile.as_ref() else {
            self.dirty = false;
            return Ok(());
        };
        let Some(store) = self.store.as_ref() else {
            return Ok(());
        };
        store.save_profile(profile)?;
        self.dirty = false;
        Ok(())
    }

    pub fn flush_logged(&mut self) {
        if let Err(err) = self.flush() {
            log::warn!("profile save failed, keeping changes for retry: {err}");
        }
    }
}
