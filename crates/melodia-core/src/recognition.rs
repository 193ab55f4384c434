use crate::config::ms;
use crate::context::GameContext;
use crate::ipc::{Event, FeedbackTone, Panel};
use crate::pause::PauseTransition;
use crate::scheduler::{Scheduler, TaskId};
use crate::session_clock::{ClockEvent, SessionClock};
use melodia_domain_eval::{end_of_level_message, recognition_points, AchievementCheck, Hint};
use melodia_domain_song::allowed_notes;
use melodia_ports::types::Note;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecognitionPhase {
    Idle,
    SystemPlayingTarget,
    AwaitingInput,
    /// A wrong guess is being answered with a replay; input stays open.
    WrongRetry,
    Correct,
    TimedOut,
    EndOfLevel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RecognitionAction {
    PickNote,
    ArmInput,
    ReplayTarget,
    FinishReplay,
    ShowEndOfLevel,
}

/// "Which note did you hear?" rounds, `quota` notes per level.
#[derive(Debug)]
pub struct NoteMatchSession {
    scheduler: Scheduler<RecognitionAction>,
    clock: SessionClock,
    phase: RecognitionPhase,
    allowed: Vec<Note>,
    target: Option<Note>,
    wrong_attempts: u32,
    attempts: u32,
    correct: u32,
    level_points: u32,
    quota: u32,
    input_armed: bool,
    replay: Option<TaskId>,
}

impl Default for NoteMatchSession {
    fn default() -> Self {
        Self::new()
    }
}

impl NoteMatchSession {
    pub fn new() -> Self {
        Self {
            scheduler: Scheduler::new(),
            clock: SessionClock::new(),
            phase: RecognitionPhase::Idle,
            allowed: Vec::new(),
            target: None,
            wrong_attempts: 0,
            attempts: 0,
            correct: 0,
            level_points: 0,
            quota: 0,
            input_armed: false,
            replay: None,
        }
    }

    /// Begins a fresh level. Anything still scheduled from a previous level is dropped.
    pub fn start(&mut self, ctx: &mut GameContext) {
        let was_at_end = self.phase == RecognitionPhase::EndOfLevel;
        self.cancel(ctx);
        if was_at_end {
            ctx.emit(Event::PanelVisibility {
                panel: Panel::EndOfLevel,
                visible: false,
            });
        }

        // without a signed-in user every octave is fair game
        let size = ctx.profile().map(|p| p.settings.piano_size);
        self.allowed = allowed_notes(size);
        self.quota = ctx.config().recognition.notes_per_level;
        self.attempts = 0;
        self.correct = 0;
        self.level_points = 0;

        let delay = ms(ctx.config().recognition.first_note_delay_ms);
        self.scheduler.after(delay, RecognitionAction::PickNote);
        log::debug!(
            "recognition level started: {} notes from {} keys",
            self.quota,
            self.allowed.len()
        );
    }

    pub fn restart(&mut self, ctx: &mut GameContext) {
        self.start(ctx);
    }

    /// Drops every pending action and stops the clock.
    pub fn cancel(&mut self, ctx: &mut GameContext) {
        self.scheduler.cancel_all();
        self.replay = None;
        self.clock.stop();
        self.target = None;
        self.wrong_attempts = 0;
        self.phase = RecognitionPhase::Idle;
        if self.input_armed {
            self.input_armed = false;
            ctx.set_input_enabled(false);
        }
    }

    /// Frozen while paused: pending actions and the countdown keep their place.
    pub fn tick(&mut self, dt: Duration, ctx: &mut GameContext) {
        if ctx.is_paused() {
            return;
        }
        let mut last = self.scheduler.now();
        let until = last.saturating_add(dt);
        while let Some(action) = self.scheduler.pop_until(until) {
            // the clock only sees the time before the action fired
            let at = self.scheduler.now();
            self.tick_clock(at.saturating_sub(last), ctx);
            last = at;
            self.run(action, ctx);
        }
        self.tick_clock(until.saturating_sub(last), ctx);
    }

    fn tick_clock(&mut self, dt: Duration, ctx: &mut GameContext) {
        if dt.is_zero() {
            return;
        }
        if let Some(ClockEvent::Expired) = self.clock.tick(dt) {
            self.on_timeout(ctx);
        }
    }

    pub fn on_pause_changed(&mut self, transition: PauseTransition, ctx: &mut GameContext) {
        match transition {
            PauseTransition::Paused => self.clock.pause(),
            PauseTransition::Resumed => {
                self.clock.resume();
                if self.input_armed {
                    ctx.set_input_enabled(true);
                }
                // pausing stopped the target mid-playback, so sound it again
                if self.phase == RecognitionPhase::SystemPlayingTarget {
                    if let Some(target) = self.target {
                        ctx.press_as_system(target);
                    }
                }
            }
        }
    }

    pub fn accepts_input(&self, ctx: &GameContext) -> bool {
        self.input_armed
            && matches!(
                self.phase,
                RecognitionPhase::AwaitingInput | RecognitionPhase::WrongRetry
            )
            && !ctx.is_paused()
    }

    /// Judges a key press. `None` when input is not open.
    pub fn press(&mut self, note: Note, ctx: &mut GameContext) -> Option<bool> {
        if !self.accepts_input(ctx) {
            return None;
        }
        let target = self.target?;
        let correct = note == target;
        ctx.press_as_player(note, correct);
        if correct {
            self.on_correct(ctx);
        } else {
            self.on_wrong(target, note, ctx);
        }
        Some(correct)
    }

    fn run(&mut self, action: RecognitionAction, ctx: &mut GameContext) {
        match action {
            RecognitionAction::PickNote => self.pick_note(ctx),
            RecognitionAction::ArmInput => self.arm_input(ctx),
            RecognitionAction::ReplayTarget => {
                if let Some(target) = self.target {
                    ctx.press_as_system(target);
                }
            }
            RecognitionAction::FinishReplay => {
                self.replay = None;
                if self.phase == RecognitionPhase::WrongRetry {
                    self.phase = RecognitionPhase::AwaitingInput;
                }
            }
            RecognitionAction::ShowEndOfLevel => self.end_of_level(ctx),
        }
    }

    fn pick_note(&mut self, ctx: &mut GameContext) {
        let Some(&target) = self.allowed.choose(ctx.rng()) else {
            log::error!("no playable notes for the configured piano size, round aborted");
            self.phase = RecognitionPhase::Idle;
            return;
        };
        self.target = Some(target);
        self.wrong_attempts = 0;
        self.phase = RecognitionPhase::SystemPlayingTarget;
        self.input_armed = false;
        ctx.set_input_enabled(false);
        ctx.clear_feedback();
        ctx.press_as_system(target);

        let delay = ms(ctx.config().recognition.system_play_delay_ms);
        self.scheduler.after(delay, RecognitionAction::ArmInput);
    }

    fn arm_input(&mut self, ctx: &mut GameContext) {
        if self.phase != RecognitionPhase::SystemPlayingTarget {
            return;
        }
        self.phase = RecognitionPhase::AwaitingInput;
        self.input_armed = true;
        ctx.set_input_enabled(true);

        let window = ctx
            .config()
            .recognition
            .answer_window(ctx.settings().difficulty);
        self.clock.start(window);
        ctx.emit(Event::ClockStarted {
            max_ms: window.as_millis() as u64,
        });
    }

    fn on_correct(&mut self, ctx: &mut GameContext) {
        self.cancel_replay();
        let elapsed = self.clock.elapsed();
        self.clock.stop();

        let settings = ctx.settings();
        let points = recognition_points(elapsed, self.wrong_attempts, &settings);
        self.level_points += points;
        ctx.award_points(points);

        self.attempts += 1;
        self.correct += 1;
        self.phase = RecognitionPhase::Correct;
        self.close_round(ctx);
        ctx.show_feedback("Correct!", FeedbackTone::Success);
        self.schedule_next(ctx);
    }

    fn on_wrong(&mut self, target: Note, played: Note, ctx: &mut GameContext) {
        self.wrong_attempts += 1;
        self.phase = RecognitionPhase::WrongRetry;
        ctx.show_feedback("Try again!", FeedbackTone::Error);

        if ctx.settings().hints_enabled {
            if let Some(hint) = Hint::between(target, played) {
                ctx.emit(Event::HintArrow { hint });
            }
        }

        self.cancel_replay();
        let timing = &ctx.config().recognition;
        let steps = [
            (ms(timing.replay_delay_ms), RecognitionAction::ReplayTarget),
            (ms(timing.post_replay_delay_ms), RecognitionAction::FinishReplay),
        ];
        self.replay = Some(self.scheduler.sequence(steps));
    }

    fn on_timeout(&mut self, ctx: &mut GameContext) {
        if !matches!(
            self.phase,
            RecognitionPhase::AwaitingInput | RecognitionPhase::WrongRetry
        ) {
            return;
        }
        self.cancel_replay();
        self.attempts += 1;
        self.phase = RecognitionPhase::TimedOut;
        self.close_round(ctx);
        ctx.show_feedback("Too slow!", FeedbackTone::Warning);
        self.schedule_next(ctx);
    }

    fn close_round(&mut self, ctx: &mut GameContext) {
        self.input_armed = false;
        ctx.set_input_enabled(false);
        let fill = ctx.config().recognition.fill_animation_ms;
        self.clock.play_fill_animation(ms(fill));
        ctx.emit(Event::ClockFill { duration_ms: fill });
    }

    fn schedule_next(&mut self, ctx: &mut GameContext) {
        let timing = &ctx.config().recognition;
        if self.attempts >= self.quota {
            let delay = ms(timing.end_of_level_delay_ms);
            self.scheduler.after(delay, RecognitionAction::ShowEndOfLevel);
        } else {
            let delay = ms(timing.next_note_delay_ms);
            self.scheduler.after(delay, RecognitionAction::PickNote);
        }
    }

    fn cancel_replay(&mut self) {
        if let Some(task) = self.replay.take() {
            self.scheduler.cancel(task);
        }
    }

    fn end_of_level(&mut self, ctx: &mut GameContext) {
        self.scheduler.cancel_all();
        self.replay = None;
        self.clock.stop();
        self.phase = RecognitionPhase::EndOfLevel;
        self.input_armed = false;
        self.target = None;

        let difficulty = ctx.settings().difficulty;
        ctx.unlock_achievements(AchievementCheck::RecognitionLevel {
            difficulty,
            correct: self.correct,
            quota: self.quota,
        });
        ctx.unlock_achievements(AchievementCheck::RecognitionSessions);

        let message = end_of_level_message(self.correct, self.quota, ctx.rng()).to_string();
        log::info!(
            "recognition level over: {}/{} correct, {} points",
            self.correct,
            self.attempts,
            self.level_points
        );
        ctx.emit(Event::EndOfLevel {
            correct: self.correct,
            total: self.attempts,
            message,
            level_points: self.level_points,
        });
        ctx.emit(Event::PanelVisibility {
            panel: Panel::EndOfLevel,
            visible: true,
        });
        ctx.flush_logged();
    }

    pub fn phase(&self) -> RecognitionPhase {
        self.phase
    }

    pub fn target(&self) -> Option<Note> {
        self.target
    }

    pub fn allowed_notes(&self) -> &[Note] {
        &self.allowed
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn correct_count(&self) -> u32 {
        self.correct
    }

    pub fn wrong_attempts(&self) -> u32 {
        self.wrong_attempts
    }

    pub fn level_points(&self) -> u32 {
        self.level_points
    }

    pub fn quota(&self) -> u32 {
        self.quota
    }

    pub fn is_input_armed(&self) -> bool {
        self.input_armed
    }

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }
}
