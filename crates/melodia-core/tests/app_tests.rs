mod support;

use melodia_core::{
    AppCore, AppError, Command, Event, FeedbackTone, GameConfig, GameMode, KeyTint, MelodyPhase,
    Panel, PauseSource, RecognitionPhase,
};
use melodia_domain_eval::AchievementCategory;
use melodia_domain_song::{CatalogError, SongCatalog};
use melodia_ports::storage::{ProfileStorePort, UserProgress};
use melodia_ports::types::{Difficulty, Note, Volume01};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use support::{player, RecordingAudio, SharedStore};

struct TestApp {
    app: AppCore,
    audio: RecordingAudio,
    store: SharedStore,
}

impl TestApp {
    fn new(profile: Option<UserProgress>) -> Self {
        let audio = RecordingAudio::default();
        let store = match profile.clone() {
            Some(profile) => SharedStore::with_profile(profile),
            None => SharedStore::default(),
        };
        let mut app = AppCore::with_parts(
            Box::new(audio.clone()),
            Some(Box::new(store.clone())),
            GameConfig::default(),
            SongCatalog::builtin(),
            StdRng::seed_from_u64(11),
        );
        if let Some(profile) = profile {
            app.handle_command(Command::SelectUser {
                username: profile.username,
            })
            .expect("stored profile");
        }
        app.drain_events();
        Self { app, audio, store }
    }

    fn send(&mut self, cmd: Command) {
        self.app.handle_command(cmd).expect("command accepted");
    }

    fn run_for(&mut self, total: Duration) {
        let frame = Duration::from_millis(50);
        let mut left = total;
        while !left.is_zero() {
            let dt = left.min(frame);
            self.app.tick(dt);
            left -= dt;
        }
    }

    fn points(&self) -> u32 {
        self.app.profile().map(|p| p.points).unwrap_or_default()
    }
}

#[test]
fn create_user_saves_and_signs_in() {
    let mut t = TestApp::new(None);
    t.send(Command::CreateUser {
        username: " bob ".to_string(),
    });

    let events = t.app.drain_events();
    assert!(events.contains(&Event::ProfileChanged {
        username: Some("bob".to_string()),
        points: 0,
        level: 1,
    }));
    let stored = t.store.stored("bob").expect("saved");
    assert_eq!(stored.settings.difficulty, Difficulty::Easy);
    assert!(stored.settings.hints_enabled);
    assert_eq!(stored.settings.piano_size.octaves(), 4);
    assert_eq!(t.store.last_user().expect("last user"), Some("bob".to_string()));
}

#[test]
fn profile_commands_reject_bad_names() {
    let mut t = TestApp::new(Some(player("ada")));
    assert!(matches!(
        t.app.handle_command(Command::CreateUser {
            username: "ada".to_string()
        }),
        Err(AppError::UserExists(name)) if name == "ada"
    ));
    assert!(matches!(
        t.app.handle_command(Command::CreateUser {
            username: "   ".to_string()
        }),
        Err(AppError::InvalidUsername)
    ));
    assert!(matches!(
        t.app.handle_command(Command::SelectUser {
            username: "nobody".to_string()
        }),
        Err(AppError::UnknownUser(_))
    ));
    assert_eq!(t.app.profile().map(|p| p.username.as_str()), Some("ada"));
}

#[test]
fn last_user_is_restored_on_startup() {
    let mut ada = player("ada");
    ada.points = 120;
    let store = SharedStore::with_profile(ada);
    let app = AppCore::new(
        Box::new(RecordingAudio::default()),
        Some(Box::new(store)),
        GameConfig::default(),
    );
    assert_eq!(app.profile().map(|p| p.points), Some(120));
}

#[test]
fn sign_out_forgets_the_user() {
    let mut t = TestApp::new(Some(player("ada")));
    t.send(Command::EnterMode {
        mode: GameMode::FreePlay,
    });
    t.send(Command::SignOut);
    assert!(t.app.profile().is_none());
    assert_eq!(t.app.mode(), None);
    assert_eq!(t.store.last_user().expect("last user"), None);
}

#[test]
fn entering_free_play_counts_and_unlocks_milestone() {
    let mut t = TestApp::new(Some(player("ada")));
    t.send(Command::EnterMode {
        mode: GameMode::FreePlay,
    });

    let events = t.app.drain_events();
    assert!(events.contains(&Event::ModeChanged {
        mode: Some(GameMode::FreePlay)
    }));
    assert!(events.contains(&Event::AchievementUnlocked {
        id: "played_first".to_string(),
        category: Some(AchievementCategory::FreePlay),
    }));
    let stored = t.store.stored("ada").expect("saved");
    assert_eq!(stored.free_play_count, 1);
    assert!(stored.has_achievement("played_first"));
}

#[test]
fn free_play_accepts_every_key_and_rewards_time() {
    let mut t = TestApp::new(Some(player("ada")));
    t.send(Command::EnterMode {
        mode: GameMode::FreePlay,
    });
    t.app.drain_events();

    t.send(Command::PressKey { note: Note(61) });
    assert!(t.app.drain_events().contains(&Event::KeyFeedback {
        note: Note(61),
        tint: KeyTint::Correct,
    }));
    assert_eq!(t.audio.played(), vec![Note(61)]);

    t.run_for(Duration::from_secs(29));
    assert_eq!(t.points(), 0);
    t.run_for(Duration::from_secs(1));
    assert_eq!(t.points(), 15);
    assert_eq!(t.app.free_play().rewards(), 1);
}

#[test]
fn pause_holds_until_every_source_resumes() {
    let mut t = TestApp::new(Some(player("ada")));
    t.send(Command::EnterMode {
        mode: GameMode::NoteRecognition,
    });
    t.send(Command::RequestPause {
        source: PauseSource::Button,
    });
    t.send(Command::RequestPause {
        source: PauseSource::Panel,
    });
    t.send(Command::RequestResume {
        source: PauseSource::Button,
    });
    assert!(t.app.is_paused());
    assert_eq!(t.audio.stops(), 1);

    t.run_for(Duration::from_secs(10));
    assert_eq!(t.app.recognition().phase(), RecognitionPhase::Idle);
    assert!(t.audio.played().is_empty());

    t.send(Command::RequestResume {
        source: PauseSource::Panel,
    });
    assert!(!t.app.is_paused());
    t.run_for(Duration::from_secs(1));
    assert_eq!(
        t.app.recognition().phase(),
        RecognitionPhase::SystemPlayingTarget
    );
}

#[test]
fn toggle_pause_shows_and_hides_the_panel() {
    let mut t = TestApp::new(Some(player("ada")));
    t.send(Command::EnterMode {
        mode: GameMode::FreePlay,
    });
    t.app.drain_events();

    t.send(Command::TogglePause);
    let events = t.app.drain_events();
    assert!(events.contains(&Event::FeedbackText {
        message: "Game Paused".to_string(),
        tone: FeedbackTone::Warning,
        clear_after_ms: 2000,
    }));
    assert!(events.contains(&Event::PanelVisibility {
        panel: Panel::Paused,
        visible: true,
    }));
    assert!(events.contains(&Event::InputEnabled { enabled: false }));
    t.send(Command::PressKey { note: Note(60) });
    assert!(t.audio.played().is_empty());

    t.send(Command::TogglePause);
    let events = t.app.drain_events();
    assert!(events.contains(&Event::PanelVisibility {
        panel: Panel::Paused,
        visible: false,
    }));
    assert!(events.contains(&Event::InputEnabled { enabled: true }));
}

#[test]
fn exit_mode_clears_pause() {
    let mut t = TestApp::new(Some(player("ada")));
    t.send(Command::EnterMode {
        mode: GameMode::NoteRecognition,
    });
    t.send(Command::TogglePause);
    t.send(Command::ExitMode);
    assert!(!t.app.is_paused());
    assert_eq!(t.app.mode(), None);
    assert_eq!(t.app.recognition().phase(), RecognitionPhase::Idle);
}

#[test]
fn settings_are_validated_and_persisted() {
    let mut t = TestApp::new(Some(player("ada")));
    t.send(Command::SetDifficulty { level: 7 });
    t.send(Command::SetPianoSize { octaves: 9 });
    let settings = t.app.profile().expect("profile").settings;
    assert_eq!(settings.difficulty, Difficulty::Easy);
    assert_eq!(settings.piano_size.octaves(), 4);

    t.send(Command::SetDifficulty { level: 3 });
    t.send(Command::SetHints { enabled: false });
    t.send(Command::SetSystemColor { enabled: false });
    t.send(Command::SetPianoSize { octaves: 5 });
    t.send(Command::SetVolume {
        volume: Volume01(1.7),
    });

    let stored = t.store.stored("ada").expect("saved").settings;
    assert_eq!(stored.difficulty, Difficulty::Hard);
    assert!(!stored.hints_enabled);
    assert!(!stored.system_color_assist);
    assert_eq!(stored.piano_size.octaves(), 5);
    assert_eq!(stored.volume.get(), 1.0);
}

#[test]
fn difficulty_change_restarts_recognition() {
    let mut t = TestApp::new(Some(player("ada")));
    t.send(Command::EnterMode {
        mode: GameMode::NoteRecognition,
    });
    t.run_for(Duration::from_millis(1800));
    assert_eq!(
        t.app.recognition().phase(),
        RecognitionPhase::AwaitingInput
    );
    assert_eq!(t.app.recognition().clock().max(), Duration::from_secs(6));

    t.send(Command::SetDifficulty { level: 2 });
    assert_eq!(t.app.recognition().phase(), RecognitionPhase::Idle);
    t.run_for(Duration::from_millis(1800));
    assert_eq!(t.app.recognition().clock().max(), Duration::from_secs(4));
}

#[test]
fn failed_save_keeps_progress_for_the_next_flush() {
    let mut t = TestApp::new(Some(player("ada")));
    t.send(Command::EnterMode {
        mode: GameMode::FreePlay,
    });
    t.store.set_fail_saves(true);

    t.run_for(Duration::from_secs(30));
    assert_eq!(t.points(), 15);
    assert_eq!(t.store.stored("ada").map(|p| p.points), Some(0));
    assert!(matches!(
        t.app.handle_command(Command::Save),
        Err(AppError::Storage(_))
    ));

    t.store.set_fail_saves(false);
    t.send(Command::Save);
    assert_eq!(t.store.stored("ada").map(|p| p.points), Some(15));
}

#[test]
fn melody_commands_need_melody_mode() {
    let mut t = TestApp::new(Some(player("ada")));
    t.send(Command::ChooseSong {
        song_id: "jonathan".to_string(),
    });
    t.send(Command::NextStep);
    assert_eq!(t.app.melody().phase(), MelodyPhase::ChooseSong);
    assert!(t.app.drain_events().is_empty());
}

#[test]
fn melody_flow_through_commands() {
    let mut t = TestApp::new(Some(player("ada")));
    t.send(Command::EnterMode {
        mode: GameMode::MelodyPlay,
    });
    assert!(t
        .app
        .drain_events()
        .iter()
        .any(|event| matches!(event, Event::SongList { songs } if songs.len() == 3)));

    assert!(matches!(
        t.app.handle_command(Command::ChooseSong {
            song_id: "missing".to_string()
        }),
        Err(AppError::Catalog(CatalogError::SongNotFound(_)))
    ));
    t.send(Command::ChooseSong {
        song_id: "jonathan".to_string(),
    });
    assert_eq!(t.app.melody().phase(), MelodyPhase::MapView);

    // locked steps are ignored
    t.send(Command::StartStep {
        song_id: "jonathan".to_string(),
        step_index: 4,
    });
    assert_eq!(t.app.melody().phase(), MelodyPhase::MapView);

    t.send(Command::StartStep {
        song_id: "jonathan".to_string(),
        step_index: 0,
    });
    t.run_for(Duration::from_millis(2500));
    assert_eq!(
        t.app.melody().phase(),
        MelodyPhase::AwaitingPlayerSequence
    );
    let expected = t.app.melody().expected().to_vec();
    for note in expected {
        t.send(Command::PressKey { note });
    }
    assert_eq!(t.app.melody().phase(), MelodyPhase::StepComplete);
    assert_eq!(t.points(), 8);
    assert_eq!(t.store.stored("ada").map(|p| p.unlocked_step("jonathan")), Some(1));

    t.send(Command::BackToSongList);
    let events = t.app.drain_events();
    let jonathan = events.iter().find_map(|event| match event {
        Event::SongList { songs } => songs.iter().find(|s| s.song_id == "jonathan").cloned(),
        _ => None,
    });
    assert_eq!(jonathan.map(|s| s.unlocked), Some(1));
    assert_eq!(t.app.melody().phase(), MelodyPhase::ChooseSong);
}

#[test]
fn entering_a_mode_twice_counts_twice() {
    let mut t = TestApp::new(Some(player("ada")));
    for _ in 0..2 {
        t.send(Command::EnterMode {
            mode: GameMode::MelodyPlay,
        });
    }
    t.send(Command::EnterMode {
        mode: GameMode::NoteRecognition,
    });
    let profile = t.app.profile().expect("profile");
    assert_eq!(profile.melody_play_count, 2);
    assert_eq!(profile.note_recognition_count, 1);
    assert_eq!(profile.free_play_count, 0);
}
