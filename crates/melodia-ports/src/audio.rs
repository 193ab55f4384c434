use crate::types::Note;

#[derive(thiserror::Error, Debug)]
pub enum AudioError {
    #[error("note clip not found: {0}")]
    NotFound(Note),
    #[error("backend error: {0}")]
    Backend(String),
}

/// Clip playback for single piano notes.
///
/// Called from the game tick; implementations must not block.
pub trait AudioPlayerPort: Send + Sync {
    fn play_note(&self, note: Note) -> Result<(), AudioError>;

    /// Cut every clip that is still sounding.
    fn stop_all(&self);
}
