use crate::config::ms;
use crate::context::GameContext;
use crate::ipc::{Event, FeedbackTone, Panel, SongProgress, StepTile};
use crate::pause::PauseTransition;
use crate::scheduler::Scheduler;
use melodia_domain_eval::{challenge_points, melody_step_points, AchievementCheck};
use melodia_domain_song::{Song, SongCatalog};
use melodia_ports::types::Note;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MelodyError {
    #[error("no song loaded")]
    NoSong,
    #[error("step {index} is locked, {unlocked} unlocked so far")]
    StepLocked { index: usize, unlocked: usize },
    #[error("step {index} out of range, song has {steps} steps")]
    StepOutOfRange { index: usize, steps: usize },
    #[error("already at the last step")]
    LastStep,
    #[error("challenge is only available from the second step")]
    ChallengeUnavailable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MelodyPhase {
    ChooseSong,
    MapView,
    PlayingStep,
    AwaitingPlayerSequence,
    StepComplete,
    StepFailed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MelodyAction {
    PlayStep,
    SystemNote(Note),
    ArmInput,
    ShowStepCompleted { challenge: bool },
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Challenge {
    max_step: usize,
    combined: Vec<Note>,
}

/// Step-by-step melody teaching: the game plays a step, the player repeats it.
#[derive(Debug)]
pub struct MelodySequencer {
    scheduler: Scheduler<MelodyAction>,
    phase: MelodyPhase,
    song: Option<Song>,
    step_index: usize,
    expected: Vec<Note>,
    match_index: usize,
    has_mistake: bool,
    input_armed: bool,
    challenge: Option<Challenge>,
    session_points: u32,
    // highest step opened by perfect play since the song was chosen
    reached: usize,
}

impl Default for MelodySequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl MelodySequencer {
    pub fn new() -> Self {
        Self {
            scheduler: Scheduler::new(),
            phase: MelodyPhase::ChooseSong,
            song: None,
            step_index: 0,
            expected: Vec::new(),
            match_index: 0,
            has_mistake: false,
            input_armed: false,
            challenge: None,
            session_points: 0,
            reached: 0,
        }
    }

    pub fn show_song_list(&mut self, catalog: &SongCatalog, ctx: &mut GameContext) {
        self.cancel(ctx);
        if catalog.is_empty() {
            log::error!("song catalog is empty");
        }
        let songs = catalog
            .songs()
            .iter()
            .map(|song| SongProgress {
                song_id: song.id.clone(),
                name: song.name.clone(),
                unlocked: ctx.unlocked_step(&song.id).min(song.step_count()),
                total: song.step_count(),
            })
            .collect();
        ctx.emit(Event::SongList { songs });
        set_panel(ctx, Panel::StepMap, false);
        set_panel(ctx, Panel::StepCompleted, false);
        set_panel(ctx, Panel::SongList, true);
    }

    pub fn choose_song(&mut self, song: &Song, ctx: &mut GameContext) {
        self.cancel_activity(ctx);
        self.challenge = None;
        self.song = Some(song.clone());
        self.step_index = 0;
        self.session_points = 0;
        self.reached = 0;
        self.phase = MelodyPhase::MapView;
        set_panel(ctx, Panel::SongList, false);
        self.emit_step_map(ctx);
    }

    /// Loads `song` at `start_index` and queues its playback.
    ///
    /// `start_index` may not exceed the steps already unlocked for the song.
    pub fn set_current_song(
        &mut self,
        song: &Song,
        start_index: usize,
        ctx: &mut GameContext,
    ) -> Result<(), MelodyError> {
        let steps = song.step_count();
        if start_index >= steps {
            return Err(MelodyError::StepOutOfRange {
                index: start_index,
                steps,
            });
        }
        let same_song = self.song.as_ref().is_some_and(|s| s.id == song.id);
        let unlocked = if same_song {
            self.unlocked_step(&song.id, ctx)
        } else {
            ctx.unlocked_step(&song.id)
        };
        if start_index > unlocked {
            return Err(MelodyError::StepLocked {
                index: start_index,
                unlocked,
            });
        }

        self.cancel_activity(ctx);
        if !same_song {
            self.session_points = 0;
            self.reached = 0;
        }
        self.song = Some(song.clone());
        self.step_index = start_index;
        self.challenge = None;
        set_panel(ctx, Panel::SongList, false);
        set_panel(ctx, Panel::StepMap, false);
        set_panel(ctx, Panel::StepCompleted, false);

        self.phase = MelodyPhase::PlayingStep;
        let delay = ms(ctx.config().melody.step_start_delay_ms);
        self.queue_step(delay);
        log::debug!("{}: step {} queued", song.id, start_index);
        Ok(())
    }

    pub fn next_step(&mut self, ctx: &mut GameContext) -> Result<(), MelodyError> {
        let song = self.song.as_ref().ok_or(MelodyError::NoSong)?;
        if song.is_last_step(self.step_index) {
            return Err(MelodyError::LastStep);
        }
        let index = self.step_index + 1;
        let unlocked = self.unlocked_step(&song.id, ctx);
        if index > unlocked {
            return Err(MelodyError::StepLocked { index, unlocked });
        }

        self.cancel_activity(ctx);
        self.challenge = None;
        self.step_index = index;
        self.phase = MelodyPhase::PlayingStep;
        set_panel(ctx, Panel::StepCompleted, false);
        let delay = ms(ctx.config().melody.step_start_delay_ms);
        self.queue_step(delay);
        Ok(())
    }

    /// Replays steps `0..=current` as one sequence for bonus points.
    pub fn start_challenge(&mut self, ctx: &mut GameContext) -> Result<(), MelodyError> {
        let song = self.song.as_ref().ok_or(MelodyError::NoSong)?;
        if self.step_index == 0 {
            return Err(MelodyError::ChallengeUnavailable);
        }
        let challenge = Challenge {
            max_step: self.step_index,
            combined: song.combined_notes(self.step_index),
        };

        log::debug!(
            "{}: challenge over steps 0..={} ({} notes)",
            song.id,
            challenge.max_step,
            challenge.combined.len()
        );
        self.cancel_activity(ctx);
        self.challenge = Some(challenge);
        self.phase = MelodyPhase::PlayingStep;
        set_panel(ctx, Panel::StepCompleted, false);
        let lead_in = ms(ctx.config().melody.challenge_start_delay_ms);
        self.queue_challenge(lead_in, ctx);
        Ok(())
    }

    pub fn restart_step(&mut self, ctx: &mut GameContext) -> Result<(), MelodyError> {
        if self.song.is_none() {
            return Err(MelodyError::NoSong);
        }
        self.cancel_activity(ctx);
        self.phase = MelodyPhase::PlayingStep;
        set_panel(ctx, Panel::StepCompleted, false);
        if self.challenge.is_some() {
            let lead_in = ms(ctx.config().melody.challenge_start_delay_ms);
            self.queue_challenge(lead_in, ctx);
        } else {
            let delay = ms(ctx.config().melody.restart_delay_ms);
            self.queue_step(delay);
        }
        Ok(())
    }

    /// Abandons whatever is in flight and shows the step map again.
    pub fn reopen_map(&mut self, ctx: &mut GameContext) -> Result<(), MelodyError> {
        if self.song.is_none() {
            return Err(MelodyError::NoSong);
        }
        self.cancel_activity(ctx);
        self.challenge = None;
        self.phase = MelodyPhase::MapView;
        set_panel(ctx, Panel::StepCompleted, false);
        self.emit_step_map(ctx);
        Ok(())
    }

    /// Full stop, e.g. when leaving the mode.
    pub fn cancel(&mut self, ctx: &mut GameContext) {
        self.cancel_activity(ctx);
        self.challenge = None;
        self.song = None;
        self.step_index = 0;
        self.session_points = 0;
        self.phase = MelodyPhase::ChooseSong;
    }

    pub fn tick(&mut self, dt: Duration, ctx: &mut GameContext) {
        if ctx.is_paused() {
            return;
        }
        let until = self.scheduler.now().saturating_add(dt);
        while let Some(action) = self.scheduler.pop_until(until) {
            self.run(action, ctx);
        }
    }

    pub fn on_pause_changed(&mut self, transition: PauseTransition, ctx: &mut GameContext) {
        if transition == PauseTransition::Resumed && self.input_armed {
            ctx.set_input_enabled(true);
        }
    }

    pub fn accepts_input(&self, ctx: &GameContext) -> bool {
        self.input_armed && self.phase == MelodyPhase::AwaitingPlayerSequence && !ctx.is_paused()
    }

    /// Matches a key press against the next expected note. `None` when input
    /// is not open.
    ///
    /// A mismatch is remembered but still advances; only the sequence length
    /// decides when the attempt ends.
    pub fn press(&mut self, note: Note, ctx: &mut GameContext) -> Option<bool> {
        if !self.accepts_input(ctx) {
            return None;
        }
        let expected = *self.expected.get(self.match_index)?;
        let correct = note == expected;
        ctx.press_as_player(note, correct);
        if !correct {
            self.has_mistake = true;
        }
        self.match_index += 1;
        if self.match_index >= self.expected.len() {
            self.finish_attempt(ctx);
        }
        Some(correct)
    }

    fn run(&mut self, action: MelodyAction, ctx: &mut GameContext) {
        match action {
            MelodyAction::PlayStep => self.play_step(ctx),
            MelodyAction::SystemNote(note) => ctx.press_as_system(note),
            MelodyAction::ArmInput => self.arm_input(ctx),
            MelodyAction::ShowStepCompleted { challenge } => self.show_step_completed(challenge, ctx),
        }
    }

    fn queue_step(&mut self, delay: Duration) {
        self.scheduler.after(delay, MelodyAction::PlayStep);
    }

    fn play_step(&mut self, ctx: &mut GameContext) {
        let Some(step) = self.song.as_ref().and_then(|s| s.step(self.step_index)) else {
            log::error!("step {} missing, playback aborted", self.step_index);
            return;
        };
        let interval = ms(ctx.config().melody.note_interval_ms);
        let mut actions = Vec::with_capacity(step.len() + 1);
        for (i, note) in step.notes.iter().enumerate() {
            let delay = if i == 0 { Duration::ZERO } else { interval };
            actions.push((delay, MelodyAction::SystemNote(*note)));
        }
        actions.push((interval, MelodyAction::ArmInput));

        self.phase = MelodyPhase::PlayingStep;
        self.disarm(ctx);
        self.scheduler.sequence(actions);
    }

    fn queue_challenge(&mut self, lead_in: Duration, ctx: &mut GameContext) {
        let (Some(song), Some(challenge)) = (self.song.as_ref(), self.challenge.as_ref()) else {
            return;
        };
        let timing = &ctx.config().melody;
        let gap = ms(timing.challenge_gap_ms);

        let mut actions = Vec::with_capacity(challenge.combined.len() + 1);
        let mut pending = lead_in;
        for step in song.steps.iter().take(challenge.max_step + 1) {
            if !actions.is_empty() {
                // extra pause between steps
                pending += gap;
            }
            for note in &step.notes {
                actions.push((pending, MelodyAction::SystemNote(*note)));
                pending = gap;
            }
        }
        actions.push((pending + ms(timing.challenge_input_delay_ms), MelodyAction::ArmInput));

        self.disarm(ctx);
        self.scheduler.sequence(actions);
    }

    fn arm_input(&mut self, ctx: &mut GameContext) {
        self.expected = match (&self.challenge, self.song.as_ref()) {
            (Some(challenge), _) => challenge.combined.clone(),
            (None, Some(song)) => song
                .step(self.step_index)
                .map(|step| step.notes.clone())
                .unwrap_or_default(),
            (None, None) => Vec::new(),
        };
        if self.expected.is_empty() {
            log::error!("nothing to match for step {}", self.step_index);
            return;
        }
        self.match_index = 0;
        self.has_mistake = false;
        self.input_armed = true;
        self.phase = MelodyPhase::AwaitingPlayerSequence;
        ctx.set_input_enabled(true);
    }

    fn finish_attempt(&mut self, ctx: &mut GameContext) {
        self.disarm(ctx);
        let Some(song) = self.song.as_ref() else {
            return;
        };
        let perfect = !self.has_mistake;
        let settings = ctx.settings();
        let points = match &self.challenge {
            Some(challenge) => challenge_points(challenge.max_step, perfect),
            None => melody_step_points(self.has_mistake, &settings),
        };
        self.session_points += points;
        ctx.award_points(points);

        let completed_through = self
            .challenge
            .as_ref()
            .map_or(self.step_index, |c| c.max_step);
        if perfect {
            self.reached = self.reached.max(completed_through + 1);
            ctx.unlock_step(&song.id, completed_through + 1);
        }
        let final_challenge_perfect =
            perfect && self.challenge.is_some() && song.is_last_step(completed_through);
        ctx.unlock_achievements(AchievementCheck::Song {
            song_id: &song.id,
            total_steps: song.step_count(),
            final_challenge_perfect,
        });
        ctx.flush_logged();

        let timing = ctx.config().melody.clone();
        if !perfect {
            self.phase = MelodyPhase::StepFailed;
            ctx.show_feedback("Let's try that again", FeedbackTone::Warning);
            if self.challenge.is_some() {
                // the whole combined sequence is played again before input re-opens
                self.queue_challenge(ms(timing.note_interval_ms), ctx);
            } else {
                self.queue_step(ms(timing.restart_delay_ms));
            }
            return;
        }

        let was_challenge = self.challenge.take().is_some();
        self.step_index = completed_through;
        self.phase = MelodyPhase::StepComplete;
        let delay = ms(timing.step_panel_delay_ms);
        self.scheduler.after(
            delay,
            MelodyAction::ShowStepCompleted {
                challenge: was_challenge,
            },
        );
        ctx.show_feedback("Well done!", FeedbackTone::Success);
    }

    fn show_step_completed(&mut self, challenge: bool, ctx: &mut GameContext) {
        let Some(song) = self.song.as_ref() else {
            return;
        };
        let message = if challenge {
            "Challenge complete!"
        } else {
            "Step complete!"
        };
        ctx.emit(Event::StepCompleted {
            song_id: song.id.clone(),
            step_index: self.step_index,
            has_next: !song.is_last_step(self.step_index),
            challenge_available: self.step_index > 0,
            session_points: self.session_points,
            message: message.to_string(),
        });
        set_panel(ctx, Panel::StepCompleted, true);
    }

    fn emit_step_map(&mut self, ctx: &mut GameContext) {
        let Some(song) = self.song.as_ref() else {
            return;
        };
        let unlocked = self.unlocked_step(&song.id, ctx);
        let tiles = (0..song.step_count())
            .map(|index| StepTile {
                index,
                unlocked: index <= unlocked,
                current: index == unlocked,
            })
            .collect();
        ctx.emit(Event::StepMap {
            song_id: song.id.clone(),
            song_name: song.name.clone(),
            tiles,
        });
        set_panel(ctx, Panel::StepMap, true);
    }

    /// Saved progress, raised by steps cleared this session so play can
    /// continue without a profile.
    fn unlocked_step(&self, song_id: &str, ctx: &GameContext) -> usize {
        let saved = ctx.unlocked_step(song_id);
        match &self.song {
            Some(song) if song.id == song_id => saved.max(self.reached),
            _ => saved,
        }
    }

    fn cancel_activity(&mut self, ctx: &mut GameContext) {
        self.scheduler.cancel_all();
        self.disarm(ctx);
        self.expected.clear();
        self.match_index = 0;
        self.has_mistake = false;
    }

    fn disarm(&mut self, ctx: &mut GameContext) {
        if self.input_armed {
            self.input_armed = false;
            ctx.set_input_enabled(false);
        }
    }

    pub fn phase(&self) -> MelodyPhase {
        self.phase
    }

    pub fn song(&self) -> Option<&Song> {
        self.song.as_ref()
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn match_index(&self) -> usize {
        self.match_index
    }

    pub fn expected(&self) -> &[Note] {
        &self.expected
    }

    pub fn has_mistake(&self) -> bool {
        self.has_mistake
    }

    pub fn in_challenge(&self) -> bool {
        self.challenge.is_some()
    }

    pub fn challenge_max_step(&self) -> Option<usize> {
        self.challenge.as_ref().map(|c| c.max_step)
    }

    pub fn session_points(&self) -> u32 {
        self.session_points
    }

    pub fn is_input_armed(&self) -> bool {
        self.input_armed
    }
}

fn set_panel(ctx: &mut GameContext, panel: Panel, visible: bool) {
    ctx.emit(Event::PanelVisibility { panel, visible });
}
