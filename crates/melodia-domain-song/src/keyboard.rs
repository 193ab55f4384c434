use melodia_ports::types::{Note, PianoSize};

/// Lowest visible octave on every keyboard size.
pub const FIRST_OCTAVE: u8 = 3;

/// The twelve pitches of an octave in scientific numbering (C3 = 48).
pub fn octave_notes(octave: u8) -> Vec<Note> {
    let base = (octave + 1) * 12;
    (base..base + 12).map(Note).collect()
}

/// Notes the recognition game may pick for a keyboard of `size` octaves.
///
/// `None` means no profile is loaded and the full range is used.
pub fn allowed_notes(size: Option<PianoSize>) -> Vec<Note> {
    let octaves = size.map(PianoSize::octaves).unwrap_or(5);
    (FIRST_OCTAVE..FIRST_OCTAVE + octaves - 2)
        .flat_map(octave_notes)
        .collect()
}

