mod support;

use melodia_core::{
    ms, Event, FeedbackTone, GameConfig, NoteMatchSession, Panel, PauseSource, RecognitionPhase,
};
use melodia_domain_eval::{HintDirection, HintMagnitude};
use melodia_ports::storage::UserProgress;
use melodia_ports::types::{Difficulty, Note, PianoSize};
use pretty_assertions::assert_eq;
use support::{harness, other_than, player, Harness};

fn profile_with(f: impl FnOnce(&mut UserProgress)) -> UserProgress {
    let mut profile = player("ada");
    f(&mut profile);
    profile
}

/// Runs the first-note and system-play delays and returns the armed target.
fn arm(h: &mut Harness, session: &mut NoteMatchSession) -> Note {
    session.start(&mut h.ctx);
    session.tick(ms(1000), &mut h.ctx);
    session.tick(ms(800), &mut h.ctx);
    assert_eq!(session.phase(), RecognitionPhase::AwaitingInput);
    session.target().expect("target picked")
}

fn points(h: &Harness) -> u32 {
    h.ctx.profile().map(|p| p.points).unwrap_or_default()
}

#[test]
fn target_is_played_before_input_opens() {
    let mut h = harness(GameConfig::default(), Some(player("ada")));
    let mut session = NoteMatchSession::new();
    session.start(&mut h.ctx);

    session.tick(ms(999), &mut h.ctx);
    assert_eq!(session.phase(), RecognitionPhase::Idle);
    assert!(h.audio.played().is_empty());

    session.tick(ms(1), &mut h.ctx);
    assert_eq!(session.phase(), RecognitionPhase::SystemPlayingTarget);
    let target = session.target().expect("target picked");
    assert_eq!(h.audio.played(), vec![target]);
    assert_eq!(session.press(target, &mut h.ctx), None);

    h.ctx.drain_events();
    session.tick(ms(800), &mut h.ctx);
    assert_eq!(session.phase(), RecognitionPhase::AwaitingInput);
    let events = h.ctx.drain_events();
    assert!(events.contains(&Event::InputEnabled { enabled: true }));
    assert!(events.contains(&Event::ClockStarted { max_ms: 6000 }));
}

#[test]
fn target_cut_by_pause_is_heard_again_on_resume() {
    let mut h = harness(GameConfig::default(), Some(player("ada")));
    let mut session = NoteMatchSession::new();
    session.start(&mut h.ctx);
    session.tick(ms(1000), &mut h.ctx);
    let target = session.target().expect("target picked");

    let transition = h.ctx.pause_mut().request_pause(PauseSource::Button);
    session.on_pause_changed(transition.expect("paused"), &mut h.ctx);
    session.tick(ms(5000), &mut h.ctx);
    assert_eq!(session.phase(), RecognitionPhase::SystemPlayingTarget);

    let transition = h.ctx.pause_mut().request_resume(PauseSource::Button);
    session.on_pause_changed(transition.expect("resumed"), &mut h.ctx);
    assert_eq!(h.audio.played(), vec![target, target]);

    session.tick(ms(799), &mut h.ctx);
    assert_eq!(session.phase(), RecognitionPhase::SystemPlayingTarget);
    session.tick(ms(1), &mut h.ctx);
    assert_eq!(session.phase(), RecognitionPhase::AwaitingInput);
}

#[test]
fn targets_come_from_the_configured_keyboard() {
    let mut h = harness(
        GameConfig::default(),
        Some(profile_with(|p| p.settings.piano_size = PianoSize::Three)),
    );
    let mut session = NoteMatchSession::new();
    for _ in 0..5 {
        let target = arm(&mut h, &mut session);
        assert!((48..60).contains(&target.pitch()), "{target} outside octave 3");
    }
    assert_eq!(session.allowed_notes().len(), 12);
}

#[test]
fn no_profile_uses_every_octave() {
    let mut h = harness(GameConfig::default(), None);
    let mut session = NoteMatchSession::new();
    session.start(&mut h.ctx);
    assert_eq!(session.allowed_notes().len(), 36);
}

#[test]
fn answer_window_shrinks_with_difficulty() {
    let mut windows = Vec::new();
    for difficulty in Difficulty::ALL {
        let mut h = harness(
            GameConfig::default(),
            Some(profile_with(|p| p.settings.difficulty = difficulty)),
        );
        let mut session = NoteMatchSession::new();
        arm(&mut h, &mut session);
        windows.push(session.clock().max());
    }
    assert_eq!(windows, vec![ms(6000), ms(4000), ms(2500)]);
}

#[test]
fn fast_correct_answer_scores_with_every_bonus() {
    let profile = profile_with(|p| {
        p.settings.difficulty = Difficulty::Easy;
        p.settings.hints_enabled = false;
        p.settings.system_color_assist = false;
        p.settings.piano_size = PianoSize::Five;
    });
    let mut h = harness(GameConfig::default(), Some(profile));
    let mut session = NoteMatchSession::new();
    let target = arm(&mut h, &mut session);

    session.tick(ms(1500), &mut h.ctx);
    assert_eq!(session.press(target, &mut h.ctx), Some(true));

    assert_eq!(points(&h), 37);
    assert_eq!(session.phase(), RecognitionPhase::Correct);
    assert_eq!(session.correct_count(), 1);
    assert_eq!(session.attempts(), 1);
    assert!(session.clock().is_filling());
    // every award is written straight away
    assert_eq!(h.store.stored("ada").map(|p| p.points), Some(37));
}

#[test]
fn wrong_guess_replays_target_and_keeps_the_slot() {
    let profile = profile_with(|p| p.settings.piano_size = PianoSize::Three);
    let mut h = harness(GameConfig::default(), Some(profile));
    let mut session = NoteMatchSession::new();
    let target = arm(&mut h, &mut session);
    let guess = other_than(target);
    h.ctx.drain_events();

    assert_eq!(session.press(guess, &mut h.ctx), Some(false));
    assert_eq!(session.phase(), RecognitionPhase::WrongRetry);
    assert_eq!(session.wrong_attempts(), 1);
    assert_eq!(session.attempts(), 0);
    let events = h.ctx.drain_events();
    let hint = events.iter().find_map(|event| match event {
        Event::HintArrow { hint } => Some(*hint),
        _ => None,
    });
    let hint = hint.expect("hints are on by default");
    assert_eq!(hint.distance, target.distance_from(guess));
    assert_eq!(hint.magnitude, HintMagnitude::Near);

    h.audio.clear();
    session.tick(ms(900), &mut h.ctx);
    assert_eq!(h.audio.played(), vec![target]);
    session.tick(ms(600), &mut h.ctx);
    assert_eq!(session.phase(), RecognitionPhase::AwaitingInput);

    assert_eq!(session.press(target, &mut h.ctx), Some(true));
    // one mistake: base 5 with no bonuses on a three-octave easy board
    assert_eq!(points(&h), 5);
}

#[test]
fn answer_during_replay_is_accepted() {
    let mut h = harness(GameConfig::default(), Some(player("ada")));
    let mut session = NoteMatchSession::new();
    let target = arm(&mut h, &mut session);

    session.press(other_than(target), &mut h.ctx);
    session.tick(ms(100), &mut h.ctx);
    assert_eq!(session.press(target, &mut h.ctx), Some(true));

    // the cancelled replay never sounds
    h.audio.clear();
    session.tick(ms(1500), &mut h.ctx);
    assert!(h.audio.played().is_empty());
}

#[test]
fn hint_points_towards_the_target() {
    let profile = profile_with(|p| p.settings.piano_size = PianoSize::Five);
    let mut h = harness(GameConfig::default(), Some(profile));
    let mut session = NoteMatchSession::new();
    let target = arm(&mut h, &mut session);
    let guess = if target.pitch() >= 60 {
        Note(target.pitch() - 7)
    } else {
        Note(target.pitch() + 7)
    };
    h.ctx.drain_events();
    session.press(guess, &mut h.ctx);

    let hint = h
        .ctx
        .drain_events()
        .into_iter()
        .find_map(|event| match event {
            Event::HintArrow { hint } => Some(hint),
            _ => None,
        })
        .expect("hint emitted");
    assert_eq!(hint.magnitude, HintMagnitude::Far);
    let expected = if guess > target {
        HintDirection::Left
    } else {
        HintDirection::Right
    };
    assert_eq!(hint.direction, expected);
}

#[test]
fn no_hint_when_hints_are_disabled() {
    let profile = profile_with(|p| p.settings.hints_enabled = false);
    let mut h = harness(GameConfig::default(), Some(profile));
    let mut session = NoteMatchSession::new();
    let target = arm(&mut h, &mut session);
    h.ctx.drain_events();
    session.press(other_than(target), &mut h.ctx);
    assert!(!h
        .ctx
        .drain_events()
        .iter()
        .any(|event| matches!(event, Event::HintArrow { .. })));
}

#[test]
fn timeout_scores_nothing_and_moves_on() {
    let mut h = harness(GameConfig::default(), Some(player("ada")));
    let mut session = NoteMatchSession::new();
    arm(&mut h, &mut session);
    h.ctx.drain_events();

    session.tick(ms(6000), &mut h.ctx);
    assert_eq!(session.phase(), RecognitionPhase::TimedOut);
    assert_eq!(session.attempts(), 1);
    assert_eq!(session.wrong_attempts(), 0);
    assert_eq!(points(&h), 0);
    assert!(h.ctx.drain_events().contains(&Event::FeedbackText {
        message: "Too slow!".to_string(),
        tone: FeedbackTone::Warning,
        clear_after_ms: 2000,
    }));

    session.tick(ms(1999), &mut h.ctx);
    assert_eq!(session.phase(), RecognitionPhase::TimedOut);
    session.tick(ms(1), &mut h.ctx);
    assert_eq!(session.phase(), RecognitionPhase::SystemPlayingTarget);
}

#[test]
fn pause_freezes_clock_and_blocks_input() {
    let mut h = harness(GameConfig::default(), Some(player("ada")));
    let mut session = NoteMatchSession::new();
    let target = arm(&mut h, &mut session);
    session.tick(ms(1000), &mut h.ctx);

    let transition = h.ctx.pause_mut().request_pause(PauseSource::Button);
    session.on_pause_changed(transition.expect("paused"), &mut h.ctx);
    session.tick(ms(60_000), &mut h.ctx);
    assert_eq!(session.phase(), RecognitionPhase::AwaitingInput);
    assert_eq!(session.clock().remaining(), ms(5000));
    assert_eq!(session.press(target, &mut h.ctx), None);

    let transition = h.ctx.pause_mut().request_resume(PauseSource::Button);
    h.ctx.drain_events();
    session.on_pause_changed(transition.expect("resumed"), &mut h.ctx);
    assert!(h
        .ctx
        .drain_events()
        .contains(&Event::InputEnabled { enabled: true }));
    assert_eq!(session.press(target, &mut h.ctx), Some(true));
}

#[test]
fn level_ends_after_quota_with_summary_and_achievements() {
    let mut config = GameConfig::default();
    config.recognition.notes_per_level = 2;
    let profile = profile_with(|p| p.note_recognition_count = 1);
    let mut h = harness(config, Some(profile));
    let mut session = NoteMatchSession::new();

    let first = arm(&mut h, &mut session);
    session.press(first, &mut h.ctx);
    session.tick(ms(2000), &mut h.ctx);
    session.tick(ms(800), &mut h.ctx);
    let second = session.target().expect("second target");
    assert_eq!(session.press(second, &mut h.ctx), Some(true));
    h.ctx.drain_events();

    session.tick(ms(2000), &mut h.ctx);
    assert_eq!(session.phase(), RecognitionPhase::EndOfLevel);
    let events = h.ctx.drain_events();
    let summary = events.iter().find_map(|event| match event {
        Event::EndOfLevel {
            correct,
            total,
            level_points,
            ..
        } => Some((*correct, *total, *level_points)),
        _ => None,
    });
    assert_eq!(summary, Some((2, 2, session.level_points())));
    assert!(events.contains(&Event::PanelVisibility {
        panel: Panel::EndOfLevel,
        visible: true,
    }));

    let profile = h.ctx.profile().expect("profile");
    assert!(profile.has_achievement("SM_score"));
    assert!(profile.has_achievement("SM_1"));
    assert!(!profile.has_achievement("SM_5"));

    // nothing is left running
    h.audio.clear();
    session.tick(ms(30_000), &mut h.ctx);
    assert!(h.audio.played().is_empty());
}

#[test]
fn imperfect_level_earns_no_perfect_score() {
    let mut config = GameConfig::default();
    config.recognition.notes_per_level = 1;
    let mut h = harness(config, Some(player("ada")));
    let mut session = NoteMatchSession::new();
    arm(&mut h, &mut session);
    session.tick(ms(6000), &mut h.ctx);
    session.tick(ms(2000), &mut h.ctx);

    assert_eq!(session.phase(), RecognitionPhase::EndOfLevel);
    let profile = h.ctx.profile().expect("profile");
    assert!(!profile.has_achievement("SM_score"));
}

#[test]
fn restart_drops_pending_work() {
    let mut h = harness(GameConfig::default(), Some(player("ada")));
    let mut session = NoteMatchSession::new();
    let target = arm(&mut h, &mut session);
    session.press(other_than(target), &mut h.ctx);

    session.restart(&mut h.ctx);
    assert_eq!(session.phase(), RecognitionPhase::Idle);
    assert_eq!(session.attempts(), 0);
    assert_eq!(session.wrong_attempts(), 0);
    assert!(!session.is_input_armed());

    h.audio.clear();
    session.tick(ms(999), &mut h.ctx);
    assert!(h.audio.played().is_empty());
    session.tick(ms(1), &mut h.ctx);
    assert_eq!(session.phase(), RecognitionPhase::SystemPlayingTarget);
}
