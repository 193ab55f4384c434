use crate::config::{ConfigError, GameConfig};
use crate::context::GameContext;
use crate::free_play::FreePlaySession;
use crate::ipc::{Command, Event, GameMode};
use crate::melody::{MelodyError, MelodySequencer};
use crate::pause::{PauseSource, PauseTransition};
use crate::recognition::NoteMatchSession;
use melodia_domain_song::{CatalogError, SongCatalog};
use melodia_ports::audio::AudioPlayerPort;
use melodia_ports::storage::{ProfileStorePort, StorageError, UserProgress, UserSettings};
use melodia_ports::types::{Difficulty, Note, PianoSize, Volume01};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("unknown user: {0}")]
    UnknownUser(String),
    #[error("user already exists: {0}")]
    UserExists(String),
    #[error("username must not be empty")]
    InvalidUsername,
}

pub struct AppCore {
    ctx: GameContext,
    catalog: SongCatalog,
    mode: Option<GameMode>,
    recognition: NoteMatchSession,
    melody: MelodySequencer,
    free_play: FreePlaySession,
}

impl AppCore {
    /// Builds the core with the built-in songs and signs the last user back in.
    pub fn new(
        audio: Box<dyn AudioPlayerPort>,
        store: Option<Box<dyn ProfileStorePort>>,
        config: GameConfig,
    ) -> Self {
        let mut core = Self::with_parts(
            audio,
            store,
            config,
            SongCatalog::builtin(),
            StdRng::from_entropy(),
        );
        core.restore_last_user();
        core
    }

    pub fn with_parts(
        audio: Box<dyn AudioPlayerPort>,
        store: Option<Box<dyn ProfileStorePort>>,
        config: GameConfig,
        catalog: SongCatalog,
        rng: StdRng,
    ) -> Self {
        Self {
            ctx: GameContext::new(audio, store, config, rng),
            catalog,
            mode: None,
            recognition: NoteMatchSession::new(),
            melody: MelodySequencer::new(),
            free_play: FreePlaySession::new(),
        }
    }

    fn restore_last_user(&mut self) {
        let Some(store) = self.ctx.store() else {
            return;
        };
        let profile = match store.last_user() {
            Ok(Some(username)) => store.load_profile(&username),
            Ok(None) => Ok(None),
            Err(err) => Err(err),
        };
        match profile {
            Ok(Some(profile)) => {
                log::info!("welcome back, {}", profile.username);
                self.ctx.set_profile(Some(profile));
            }
            Ok(None) => {}
            Err(err) => log::warn!("could not restore last user: {err}"),
        }
    }

    pub fn handle_command(&mut self, cmd: Command) -> Result<(), AppError> {
        match cmd {
            Command::CreateUser { username } => self.create_user(&username)?,
            Command::SelectUser { username } => self.select_user(&username)?,
            Command::SignOut => {
                self.exit_mode();
                self.ctx.flush()?;
                self.ctx.set_profile(None);
                if let Some(store) = self.ctx.store() {
                    store.set_last_user(None)?;
                }
            }
            Command::EnterMode { mode } => self.enter_mode(mode),
            Command::ExitMode => self.exit_mode(),
            Command::PressKey { note } => self.press_key(note),
            Command::TogglePause => {
                let transition = self.ctx.pause_mut().toggle(PauseSource::Button);
                self.apply_pause(transition);
            }
            Command::RequestPause { source } => {
                let transition = self.ctx.pause_mut().request_pause(source);
                self.apply_pause(transition);
            }
            Command::RequestResume { source } => {
                let transition = self.ctx.pause_mut().request_resume(source);
                self.apply_pause(transition);
            }
            Command::SetDifficulty { level } => match Difficulty::try_from(level) {
                Ok(difficulty) => {
                    if self.update_settings(|s| s.difficulty = difficulty) {
                        self.restart_recognition();
                    }
                }
                Err(err) => log::warn!("ignored: {err}"),
            },
            Command::SetHints { enabled } => {
                self.update_settings(|s| s.hints_enabled = enabled);
            }
            Command::SetSystemColor { enabled } => {
                self.update_settings(|s| s.system_color_assist = enabled);
            }
            Command::SetPianoSize { octaves } => match PianoSize::try_from(octaves) {
                Ok(size) => {
                    if self.update_settings(|s| s.piano_size = size) {
                        self.restart_recognition();
                    }
                }
                Err(err) => log::warn!("ignored: {err}"),
            },
            Command::SetVolume { volume } => {
                let volume = Volume01::new(volume.get());
                self.update_settings(|s| s.volume = volume);
            }
            Command::RestartLevel => {
                if self.mode == Some(GameMode::NoteRecognition) {
                    self.recognition.restart(&mut self.ctx);
                }
            }
            Command::ChooseSong { song_id } => {
                if self.in_melody_mode() {
                    let song = self.catalog.playable(&song_id)?;
                    self.melody.choose_song(song, &mut self.ctx);
                }
            }
            Command::StartStep {
                song_id,
                step_index,
            } => {
                if self.in_melody_mode() {
                    let song = self.catalog.playable(&song_id)?;
                    let result = self.melody.set_current_song(song, step_index, &mut self.ctx);
                    log_rejected("start step", result);
                }
            }
            Command::NextStep => {
                if self.in_melody_mode() {
                    log_rejected("next step", self.melody.next_step(&mut self.ctx));
                }
            }
            Command::StartChallenge => {
                if self.in_melody_mode() {
                    log_rejected("challenge", self.melody.start_challenge(&mut self.ctx));
                }
            }
            Command::RestartStep => {
                if self.in_melody_mode() {
                    log_rejected("restart step", self.melody.restart_step(&mut self.ctx));
                }
            }
            Command::ReopenMap => {
                if self.in_melody_mode() {
                    log_rejected("reopen map", self.melody.reopen_map(&mut self.ctx));
                }
            }
            Command::BackToSongList => {
                if self.in_melody_mode() {
                    self.melody.show_song_list(&self.catalog, &mut self.ctx);
                }
            }
            Command::Save => self.ctx.flush()?,
        }
        Ok(())
    }

    /// Advances the active engine. Nothing moves while paused.
    pub fn tick(&mut self, dt: Duration) {
        if self.ctx.is_paused() {
            return;
        }
        match self.mode {
            Some(GameMode::FreePlay) => self.free_play.tick(dt, &mut self.ctx),
            Some(GameMode::NoteRecognition) => self.recognition.tick(dt, &mut self.ctx),
            Some(GameMode::MelodyPlay) => self.melody.tick(dt, &mut self.ctx),
            None => {}
        }
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.ctx.drain_events()
    }

    fn create_user(&mut self, username: &str) -> Result<(), AppError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::InvalidUsername);
        }
        if let Some(store) = self.ctx.store() {
            if store.load_profile(username)?.is_some() {
                return Err(AppError::UserExists(username.to_string()));
            }
        }

        self.exit_mode();
        self.ctx.flush_logged();
        let profile = UserProgress::new(username);
        if let Some(store) = self.ctx.store() {
            store.save_profile(&profile)?;
            store.set_last_user(Some(username))?;
        }
        log::info!("created user {username}");
        self.ctx.set_profile(Some(profile));
        Ok(())
    }

    fn select_user(&mut self, username: &str) -> Result<(), AppError> {
        let profile = match self.ctx.store() {
            Some(store) => store.load_profile(username)?,
            None => None,
        };
        let Some(profile) = profile else {
            return Err(AppError::UnknownUser(username.to_string()));
        };

        self.exit_mode();
        self.ctx.flush_logged();
        if let Some(store) = self.ctx.store() {
            store.set_last_user(Some(username))?;
        }
        self.ctx.set_profile(Some(profile));
        Ok(())
    }

    fn enter_mode(&mut self, mode: GameMode) {
        self.exit_mode();
        if let Some(profile) = self.ctx.profile_mut() {
            match mode {
                GameMode::FreePlay => profile.free_play_count += 1,
                GameMode::NoteRecognition => profile.note_recognition_count += 1,
                GameMode::MelodyPlay => profile.melody_play_count += 1,
            }
        }
        self.mode = Some(mode);
        self.ctx.emit(Event::ModeChanged { mode: Some(mode) });
        log::info!("entering {mode:?}");

        match mode {
            GameMode::FreePlay => self.free_play.start(&mut self.ctx),
            GameMode::NoteRecognition => self.recognition.start(&mut self.ctx),
            GameMode::MelodyPlay => self.melody.show_song_list(&self.catalog, &mut self.ctx),
        }
        self.ctx.flush_logged();
    }

    fn exit_mode(&mut self) {
        let Some(mode) = self.mode.take() else {
            return;
        };
        match mode {
            GameMode::FreePlay => self.free_play.stop(&mut self.ctx),
            GameMode::NoteRecognition => self.recognition.cancel(&mut self.ctx),
            GameMode::MelodyPlay => self.melody.cancel(&mut self.ctx),
        }
        let transition = self.ctx.pause_mut().clear();
        if let Some(transition) = transition {
            self.ctx.on_pause_transition(transition);
        }
        self.ctx.emit(Event::ModeChanged { mode: None });
        self.ctx.flush_logged();
    }

    fn press_key(&mut self, note: Note) {
        let verdict = match self.mode {
            Some(GameMode::FreePlay) => self.free_play.press(note, &mut self.ctx),
            Some(GameMode::NoteRecognition) => self.recognition.press(note, &mut self.ctx),
            Some(GameMode::MelodyPlay) => self.melody.press(note, &mut self.ctx),
            None => None,
        };
        if verdict.is_none() {
            log::trace!("key {note} ignored, input closed");
        }
    }

    fn apply_pause(&mut self, transition: Option<PauseTransition>) {
        let Some(transition) = transition else {
            return;
        };
        log::debug!("{transition:?} by {:?}", self.ctx.pause().sources());
        self.ctx.on_pause_transition(transition);
        match self.mode {
            Some(GameMode::NoteRecognition) => {
                self.recognition.on_pause_changed(transition, &mut self.ctx)
            }
            Some(GameMode::MelodyPlay) => self.melody.on_pause_changed(transition, &mut self.ctx),
            Some(GameMode::FreePlay) => {
                if transition == PauseTransition::Resumed && self.free_play.is_active() {
                    self.ctx.set_input_enabled(true);
                }
            }
            None => {}
        }
    }

    /// Returns false when nobody is signed in.
    fn update_settings(&mut self, change: impl FnOnce(&mut UserSettings)) -> bool {
        let Some(profile) = self.ctx.profile_mut() else {
            log::debug!("settings change ignored, nobody signed in");
            return false;
        };
        change(&mut profile.settings);
        self.ctx.flush_logged();
        true
    }

    fn restart_recognition(&mut self) {
        if self.mode == Some(GameMode::NoteRecognition) {
            self.recognition.restart(&mut self.ctx);
        }
    }

    fn in_melody_mode(&self) -> bool {
        let active = self.mode == Some(GameMode::MelodyPlay);
        if !active {
            log::debug!("melody command ignored outside melody mode");
        }
        active
    }

    pub fn mode(&self) -> Option<GameMode> {
        self.mode
    }

    pub fn context(&self) -> &GameContext {
        &self.ctx
    }

    pub fn profile(&self) -> Option<&UserProgress> {
        self.ctx.profile()
    }

    pub fn catalog(&self) -> &SongCatalog {
        &self.catalog
    }

    pub fn recognition(&self) -> &NoteMatchSession {
        &self.recognition
    }

    pub fn melody(&self) -> &MelodySequencer {
        &self.melody
    }

    pub fn free_play(&self) -> &FreePlaySession {
        &self.free_play
    }

    pub fn is_paused(&self) -> bool {
        self.ctx.is_paused()
    }
}

fn log_rejected(what: &str, result: Result<(), MelodyError>) {
    if let Err(err) = result {
        log::warn!("{what} rejected: {err}");
    }
}
