use crate::model::{Song, Step};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("song not found: {0}")]
    SongNotFound(String),
    #[error("song has no steps: {0}")]
    EmptySong(String),
}

/// Read-only song list. Order is the display order of the song picker.
#[derive(Clone, Debug)]
pub struct SongCatalog {
    songs: Vec<Song>,
}

impl SongCatalog {
    pub fn new(songs: Vec<Song>) -> Self {
        Self { songs }
    }

    pub fn builtin() -> Self {
        Self::new(vec![little_jonathan(), little_star(), ode_to_joy()])
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Song> {
        self.songs.iter().find(|song| song.id == id)
    }

    /// Like [`SongCatalog::get`] but rejects songs that cannot be played.
    pub fn playable(&self, id: &str) -> Result<&Song, CatalogError> {
        let song = self
            .get(id)
            .ok_or_else(|| CatalogError::SongNotFound(id.to_string()))?;
        if song.steps.is_empty() || song.steps.iter().any(Step::is_empty) {
            return Err(CatalogError::EmptySong(id.to_string()));
        }
        Ok(song)
    }
}

impl Default for SongCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn song(id: &str, name: &str, steps: &[&[u8]]) -> Song {
    Song::new(
        id,
        name,
        steps.iter().map(|pitches| Step::from_pitches(pitches)).collect(),
    )
}

fn little_jonathan() -> Song {
    song(
        "jonathan",
        "Little Jonathan",
        &[
            &[67, 64, 64],
            &[65, 62, 62],
            &[60, 62, 64],
            &[65, 67, 67],
            &[67, 67, 64],
            &[64, 65, 62],
            &[62, 60, 64],
            &[67, 67, 60],
            &[62, 62, 62],
            &[62, 62, 64],
            &[65, 64, 64],
            &[64, 64, 64],
            &[65, 67, 67],
            &[64, 64, 65],
            &[62, 62, 60],
            &[64, 67, 67],
            &[60],
        ],
    )
}

fn little_star() -> Song {
    song(
        "star",
        "Little Star",
        &[
            &[55, 55, 62],
            &[62, 64, 64],
            &[62, 60, 60],
            &[59, 59, 57],
            &[55, 62, 62],
            &[60, 60, 59],
            &[59, 57, 62],
            &[62, 60, 60],
            &[59, 59, 57],
            &[55, 55, 62],
            &[62, 64, 64],
            &[62, 60, 60],
            &[59, 59, 57],
            &[57, 55, 62],
            &[62, 60, 60],
            &[59, 59, 57],
            &[62, 62, 60],
            &[60, 59, 57],
            &[55, 55, 62],
            &[62, 64, 64],
            &[62, 60, 60],
            &[59, 59, 57],
            &[57, 55],
        ],
    )
}

fn ode_to_joy() -> Song {
    song(
        "symphony",
        "Beethoven's 9th",
        &[
            &[64, 64, 65],
            &[67, 67, 65],
            &[64, 62, 60],
            &[60, 62, 64],
            &[64, 62, 62],
            &[64, 64, 65],
            &[67, 67, 65],
            &[64, 62, 60],
            &[60, 62, 64],
            &[62, 60, 60],
            &[62, 62, 64],
            &[60, 62, 64],
            &[65, 64, 60],
            &[62, 64, 65],
            &[64, 62, 60],
            &[62, 55, 64],
            &[64, 65, 67],
            &[67, 65, 64],
            &[62, 60, 60],
            &[62, 64, 62],
            &[60, 60],
        ],
    )
}
