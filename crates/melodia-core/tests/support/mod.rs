#![allow(dead_code)]

use melodia_core::{GameConfig, GameContext, MemoryProfileStore};
use melodia_domain_song::{Song, Step};
use melodia_ports::audio::{AudioError, AudioPlayerPort};
use melodia_ports::storage::{ProfileStorePort, StorageError, UserProgress};
use melodia_ports::types::Note;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

/// Audio fake that records what was played. Clones share the log.
#[derive(Clone, Default)]
pub struct RecordingAudio {
    played: Arc<Mutex<Vec<Note>>>,
    stops: Arc<AtomicU32>,
}

impl RecordingAudio {
    pub fn played(&self) -> Vec<Note> {
        self.played.lock().clone()
    }

    pub fn stops(&self) -> u32 {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.played.lock().clear();
    }
}

impl AudioPlayerPort for RecordingAudio {
    fn play_note(&self, note: Note) -> Result<(), AudioError> {
        self.played.lock().push(note);
        Ok(())
    }

    fn stop_all(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// In-memory store whose saves can be made to fail. Clones share state.
#[derive(Clone, Default)]
pub struct SharedStore {
    inner: Arc<MemoryProfileStore>,
    fail_saves: Arc<AtomicBool>,
    saves: Arc<AtomicU32>,
}

impl SharedStore {
    pub fn with_profile(profile: UserProgress) -> Self {
        let store = Self::default();
        let _ = store.inner.save_profile(&profile);
        let _ = store.inner.set_last_user(Some(&profile.username));
        store
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn saves(&self) -> u32 {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn stored(&self, username: &str) -> Option<UserProgress> {
        self.inner.load_profile(username).ok().flatten()
    }
}

impl ProfileStorePort for SharedStore {
    fn list_usernames(&self) -> Result<Vec<String>, StorageError> {
        self.inner.list_usernames()
    }

    fn load_profile(&self, username: &str) -> Result<Option<UserProgress>, StorageError> {
        self.inner.load_profile(username)
    }

    fn save_profile(&self, profile: &UserProgress) -> Result<(), StorageError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::Io("disk full".to_string()));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save_profile(profile)
    }

    fn last_user(&self) -> Result<Option<String>, StorageError> {
        self.inner.last_user()
    }

    fn set_last_user(&self, username: Option<&str>) -> Result<(), StorageError> {
        self.inner.set_last_user(username)
    }
}

pub struct Harness {
    pub ctx: GameContext,
    pub audio: RecordingAudio,
    pub store: SharedStore,
}

/// Context with `profile` signed in and a fixed rng seed.
pub fn harness(config: GameConfig, profile: Option<UserProgress>) -> Harness {
    let audio = RecordingAudio::default();
    let store = match profile.clone() {
        Some(profile) => SharedStore::with_profile(profile),
        None => SharedStore::default(),
    };
    let mut ctx = GameContext::new(
        Box::new(audio.clone()),
        Some(Box::new(store.clone())),
        config,
        StdRng::seed_from_u64(7),
    );
    ctx.set_profile(profile);
    ctx.drain_events();
    Harness { ctx, audio, store }
}

pub fn player(username: &str) -> UserProgress {
    UserProgress::new(username)
}

/// Three steps: C D E | F G | A B C.
pub fn tune() -> Song {
    Song::new(
        "tune",
        "Tune",
        vec![
            Step::from_pitches(&[60, 62, 64]),
            Step::from_pitches(&[65, 67]),
            Step::from_pitches(&[69, 71, 72]),
        ],
    )
}

pub fn notes(pitches: &[u8]) -> Vec<Note> {
    pitches.iter().copied().map(Note).collect()
}

/// A note guaranteed to differ from `note`.
pub fn other_than(note: Note) -> Note {
    if note.0 > 60 {
        Note(note.0 - 1)
    } else {
        Note(note.0 + 1)
    }
}
