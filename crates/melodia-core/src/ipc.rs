use crate::pause::PauseSource;
use melodia_domain_eval::{AchievementCategory, Hint};
use melodia_ports::types::{Note, Volume01};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    FreePlay,
    NoteRecognition,
    MelodyPlay,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Command {
    CreateUser { username: String },
    SelectUser { username: String },
    SignOut,
    EnterMode { mode: GameMode },
    ExitMode,
    PressKey { note: Note },
    TogglePause,
    RequestPause { source: PauseSource },
    RequestResume { source: PauseSource },
    SetDifficulty { level: u8 },
    SetHints { enabled: bool },
    SetSystemColor { enabled: bool },
    SetPianoSize { octaves: u8 },
    SetVolume { volume: Volume01 },
    RestartLevel,
    ChooseSong { song_id: String },
    StartStep { song_id: String, step_index: usize },
    NextStep,
    StartChallenge,
    RestartStep,
    ReopenMap,
    BackToSongList,
    Save,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyTint {
    Correct,
    Wrong,
    System,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackTone {
    Success,
    Warning,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Panel {
    Paused,
    EndOfLevel,
    SongList,
    StepMap,
    StepCompleted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepTile {
    pub index: usize,
    pub unlocked: bool,
    pub current: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongProgress {
    pub song_id: String,
    pub name: String,
    pub unlocked: usize,
    pub total: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Event {
    ProfileChanged {
        username: Option<String>,
        points: u32,
        level: u32,
    },
    ModeChanged {
        mode: Option<GameMode>,
    },
    PauseChanged {
        paused: bool,
        sources: Vec<PauseSource>,
    },
    InputEnabled {
        enabled: bool,
    },
    KeyFeedback {
        note: Note,
        tint: KeyTint,
    },
    FeedbackText {
        message: String,
        tone: FeedbackTone,
        clear_after_ms: u64,
    },
    ClearFeedback,
    HintArrow {
        hint: Hint,
    },
    PanelVisibility {
        panel: Panel,
        visible: bool,
    },
    ClockStarted {
        max_ms: u64,
    },
    ClockFill {
        duration_ms: u64,
    },
    EndOfLevel {
        correct: u32,
        total: u32,
        message: String,
        level_points: u32,
    },
    SongList {
        songs: Vec<SongProgress>,
    },
    StepMap {
        song_id: String,
        song_name: String,
        tiles: Vec<StepTile>,
    },
    StepCompleted {
        song_id: String,
        step_index: usize,
        has_next: bool,
        challenge_available: bool,
        session_points: u32,
        message: String,
    },
    PointsAwarded {
        awarded: u32,
        total: u32,
        level: u32,
    },
    LevelUp {
        level: u32,
    },
    AchievementUnlocked {
        id: String,
        category: Option<AchievementCategory>,
    },
}
