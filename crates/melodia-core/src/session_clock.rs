use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockEvent {
    Expired,
}

#[derive(Clone, Copy, Debug)]
struct Fill {
    from: Duration,
    elapsed: Duration,
    duration: Duration,
}

/// Countdown for one answer window, with a cosmetic refill at the end.
///
/// Every method is a no-op until the first `start`.
#[derive(Clone, Debug, Default)]
pub struct SessionClock {
    started: bool,
    running: bool,
    paused: bool,
    max: Duration,
    remaining: Duration,
    fill: Option<Fill>,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restarts from `max`, cancelling a fill in progress.
    pub fn start(&mut self, max: Duration) {
        self.started = true;
        self.running = true;
        self.paused = false;
        self.max = max;
        self.remaining = max;
        self.fill = None;
    }

    pub fn pause(&mut self) {
        if self.started {
            self.paused = true;
        }
    }

    pub fn resume(&mut self) {
        if self.started {
            self.paused = false;
        }
    }

    /// Halts the countdown without reporting expiry.
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn play_fill_animation(&mut self, duration: Duration) {
        if !self.started {
            return;
        }
        self.running = false;
        self.fill = Some(Fill {
            from: self.remaining,
            elapsed: Duration::ZERO,
            duration,
        });
    }

    pub fn tick(&mut self, dt: Duration) -> Option<ClockEvent> {
        if !self.started || self.paused {
            return None;
        }

        if let Some(fill) = self.fill.as_mut() {
            fill.elapsed = fill.elapsed.saturating_add(dt);
            if fill.elapsed >= fill.duration {
                self.fill = None;
                self.remaining = self.max;
            }
            return None;
        }

        if !self.running {
            return None;
        }

        self.remaining = self.remaining.saturating_sub(dt);
        if self.remaining.is_zero() {
            self.running = false;
            return Some(ClockEvent::Expired);
        }
        None
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Unpaused time spent since `start`.
    pub fn elapsed(&self) -> Duration {
        self.max.saturating_sub(self.remaining)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_filling(&self) -> bool {
        self.fill.is_some()
    }

    /// Value for the countdown bar, interpolated towards full while filling.
    pub fn display_value(&self) -> Duration {
        match self.fill {
            Some(fill) if !fill.duration.is_zero() => {
                let t = (fill.elapsed.as_secs_f64() / fill.duration.as_secs_f64()).min(1.0);
                let from = fill.from.as_secs_f64();
                let to = self.max.as_secs_f64();
                Duration::from_secs_f64(from + (to - from) * t)
            }
            _ => self.remaining,
        }
    }
}
