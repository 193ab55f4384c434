use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

const LOW: [&str; 5] = [
    "Nice try!",
    "Good practice!",
    "You're learning!",
    "Keep going!",
    "Don't give up!",
];

const MEDIUM: [&str; 5] = [
    "Well done!",
    "You're getting better!",
    "Keep it up!",
    "You're doing great!",
    "Almost there!",
];

const HIGH: [&str; 5] = [
    "Amazing!",
    "Fantastic job!",
    "Super star!",
    "You nailed it!",
    "Perfect!",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuccessBand {
    Low,
    Medium,
    High,
}

/// Bands at <= 1/3 and <= 2/3 of `total`. An empty round counts as low.
pub fn success_band(correct: u32, total: u32) -> SuccessBand {
    if total == 0 {
        return SuccessBand::Low;
    }
    // compare correct/total against thirds without floats
    let scaled = correct as u64 * 3;
    let total = total as u64;
    if scaled <= total {
        SuccessBand::Low
    } else if scaled <= total * 2 {
        SuccessBand::Medium
    } else {
        SuccessBand::High
    }
}

pub fn band_messages(band: SuccessBand) -> &'static [&'static str] {
    match band {
        SuccessBand::Low => &LOW,
        SuccessBand::Medium => &MEDIUM,
        SuccessBand::High => &HIGH,
    }
}

pub fn end_of_level_message<R: Rng + ?Sized>(correct: u32, total: u32, rng: &mut R) -> &'static str {
    band_messages(success_band(correct, total))
        .choose(rng)
        .copied()
        .unwrap_or("Well done!")
}
