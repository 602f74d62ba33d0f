use chrono::{DateTime, Duration, Utc};

pub const MIN_MINUTES: u32 = 1;
pub const MAX_MINUTES: u32 = 60;
pub const DEFAULT_MINUTES: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Stopped,
    Running {
        started_at: DateTime<Utc>,
        duration_minutes: u32,
    },
}

/// Countdown used for writing sprints. Holds no clock of its own; callers
/// pass `now` so the display cadence stays with the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    state: TimerState,
    duration_minutes: u32,
}

/// Snapshot of a running countdown at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    pub total: Duration,
    pub remaining: Duration,
}

pub fn clamp_minutes(minutes: i64) -> u32 {
    minutes.clamp(MIN_MINUTES as i64, MAX_MINUTES as i64) as u32
}

impl Timer {
    pub fn new(duration_minutes: u32) -> Self {
        Timer {
            state: TimerState::Stopped,
            duration_minutes: clamp_minutes(duration_minutes.into()),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, TimerState::Running { .. })
    }

    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    /// Takes effect on the next `start`; a running countdown keeps its total.
    pub fn set_duration(&mut self, minutes: i64) -> u32 {
        self.duration_minutes = clamp_minutes(minutes);
        self.duration_minutes
    }

    /// Starting while already running restarts from `now`.
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.state = TimerState::Running {
            started_at: now,
            duration_minutes: self.duration_minutes,
        };
    }

    pub fn stop(&mut self) {
        self.state = TimerState::Stopped;
    }

    pub fn tick(&self, now: DateTime<Utc>) -> Option<Countdown> {
        match self.state {
            TimerState::Stopped => None,
            TimerState::Running {
                started_at,
                duration_minutes,
            } => {
                let total = Duration::minutes(duration_minutes.into());
                let elapsed = (now - started_at).max(Duration::zero());
                let remaining = (total - elapsed).max(Duration::zero());
                Some(Countdown { total, remaining })
            }
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Timer::new(DEFAULT_MINUTES)
    }
}

impl Countdown {
    pub fn remaining_seconds(&self) -> i64 {
        self.remaining.num_seconds()
    }

    pub fn is_expired(&self) -> bool {
        self.remaining <= Duration::zero()
    }

    /// Elapsed fraction of the countdown, 0.0 at start and 1.0 at expiry.
    pub fn progress(&self) -> f64 {
        let total = self.total.num_milliseconds();
        if total <= 0 {
            return 1.0;
        }
        let remaining = self.remaining.num_milliseconds() as f64;
        (1.0 - remaining / total as f64).clamp(0.0, 1.0)
    }

    pub fn label(&self) -> String {
        format_mm_ss(self.remaining_seconds())
    }
}

pub fn format_mm_ss(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
