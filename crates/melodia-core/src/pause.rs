use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PauseSource {
    /// On-screen pause toggle.
    Button,
    /// A modal panel (settings, end of level) holding the game.
    Panel,
    /// Host-initiated, e.g. focus loss.
    System,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PauseTransition {
    Paused,
    Resumed,
}

/// Effective pause is the OR of every active source.
#[derive(Clone, Debug, Default)]
pub struct PauseCoordinator {
    active: BTreeSet<PauseSource>,
}

impl PauseCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_paused(&self) -> bool {
        !self.active.is_empty()
    }

    pub fn is_paused_by(&self, source: PauseSource) -> bool {
        self.active.contains(&source)
    }

    pub fn sources(&self) -> Vec<PauseSource> {
        self.active.iter().copied().collect()
    }

    pub fn request_pause(&mut self, source: PauseSource) -> Option<PauseTransition> {
        self.update(|active| {
            active.insert(source);
        })
    }

    pub fn request_resume(&mut self, source: PauseSource) -> Option<PauseTransition> {
        self.update(|active| {
            active.remove(&source);
        })
    }

    pub fn toggle(&mut self, source: PauseSource) -> Option<PauseTransition> {
        if self.is_paused_by(source) {
            self.request_resume(source)
        } else {
            self.request_pause(source)
        }
    }

    /// Drops every source, e.g. when leaving a mode.
    pub fn clear(&mut self) -> Option<PauseTransition> {
        self.update(BTreeSet::clear)
    }

    fn update(&mut self, change: impl FnOnce(&mut BTreeSet<PauseSource>)) -> Option<PauseTransition> {
        let was_paused = self.is_paused();
        change(&mut self.active);
        match (was_paused, self.is_paused()) {
            (false, true) => Some(PauseTransition::Paused),
            (true, false) => Some(PauseTransition::Resumed),
            _ => None,
        }
    }
}
