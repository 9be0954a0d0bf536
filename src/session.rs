use std::time::{Duration, Instant};

/// Length of every session. Not configurable.
pub const TOTAL_DURATION_MS: u64 = 5_000;
pub const TOTAL_DURATION: Duration = Duration::from_millis(TOTAL_DURATION_MS);

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    Idle,
    Running,
    Finished,
}

/// Summary of a finished session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionResult {
    pub clicks: u32,
    pub clicks_per_second: f64,
}

/// The single mutable record behind a game.
///
/// `remaining` is always recomputed from `end_at`, never decremented, so a
/// late or skipped tick cannot make the countdown drift.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    running: bool,
    end_at: Option<Instant>,
    remaining: Duration,
    click_count: u32,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            running: false,
            end_at: None,
            remaining: TOTAL_DURATION,
            click_count: 0,
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        if self.running {
            Phase::Running
        } else if self.remaining.is_zero() {
            Phase::Finished
        } else {
            Phase::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_finished(&self) -> bool {
        self.phase() == Phase::Finished
    }

    pub fn click_count(&self) -> u32 {
        self.click_count
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining.as_millis() as u64
    }

    pub fn end_at(&self) -> Option<Instant> {
        self.end_at
    }

    /// Begin a fresh session ending `TOTAL_DURATION` after `now`
    pub(crate) fn begin(&mut self, now: Instant) {
        self.click_count = 0;
        self.remaining = TOTAL_DURATION;
        self.end_at = Some(now + TOTAL_DURATION);
        self.running = true;
    }

    /// Recompute `remaining` against `now`, finishing the session once it hits zero.
    /// Returns true if this call moved the session to `Finished`.
    pub(crate) fn refresh(&mut self, now: Instant) -> bool {
        if !self.running {
            return false;
        }
        let left = self
            .end_at
            .map(|end| end.saturating_duration_since(now))
            .unwrap_or(Duration::ZERO)
            .min(TOTAL_DURATION);

        self.remaining = left;
        if left.is_zero() {
            self.running = false;
            self.end_at = None;
            return true;
        }
        false
    }

    /// Count a tap. Ignored unless the session is live.
    pub(crate) fn tap(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.click_count = self.click_count.saturating_add(1);
        true
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn seconds_remaining(&self) -> f64 {
        self.remaining.as_secs_f64()
    }

    pub fn seconds_remaining_display(&self) -> String {
        format!("{:.2}", self.seconds_remaining())
    }

    /// Rate over the fixed window, not elapsed time
    pub fn clicks_per_second(&self) -> f64 {
        self.click_count as f64 / (TOTAL_DURATION_MS as f64 / 1000.0)
    }

    pub fn result(&self) -> Option<SessionResult> {
        if !self.is_finished() {
            return None;
        }
        Some(SessionResult {
            clicks: self.click_count,
            clicks_per_second: self.clicks_per_second(),
        })
    }
}
