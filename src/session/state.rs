use crate::config::Settings;
use crate::util::{clicks_per_sec, format_secs};
use chrono::{DateTime, Local};
use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display)]
pub enum SessionState {
    #[default]
    Ready,
    Active,
    Paused,
}

/// Accumulates running time across pause windows: `baseline` holds earlier
/// windows, `anchor` marks the start of the current one.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ActiveClock {
    baseline: Duration,
    anchor: Option<Instant>,
}

impl ActiveClock {
    pub fn started(now: Instant) -> Self {
        Self {
            baseline: Duration::ZERO,
            anchor: Some(now),
        }
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        match self.anchor {
            Some(anchor) => self
                .baseline
                .saturating_add(now.saturating_duration_since(anchor)),
            None => self.baseline,
        }
    }

    pub fn is_running(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn pause(&mut self, now: Instant) {
        if let Some(anchor) = self.anchor.take() {
            self.baseline = self
                .baseline
                .saturating_add(now.saturating_duration_since(anchor));
        }
    }

    pub fn resume(&mut self, now: Instant) {
        if self.anchor.is_none() {
            self.anchor = Some(now);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStats {
    pub click_count: u64,
    pub started_at: Option<DateTime<Local>>,
    pub clock: ActiveClock,
}

impl SessionStats {
    pub fn begin(now: Instant, wall: DateTime<Local>) -> Self {
        Self {
            click_count: 0,
            started_at: Some(wall),
            clock: ActiveClock::started(now),
        }
    }

    pub fn active_elapsed(&self, now: Instant) -> Duration {
        self.clock.elapsed(now)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    Cancelled,
    AutoStop,
    Fault(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Cancelled => write!(f, "stopped"),
            StopReason::AutoStop => write!(f, "auto-stopped"),
            StopReason::Fault(msg) => write!(f, "aborted: {msg}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub click_count: u64,
    pub duration: Duration,
    pub clicks_per_sec: f64,
    pub reason: StopReason,
}

impl SessionSummary {
    pub fn new(click_count: u64, duration: Duration, reason: StopReason) -> Self {
        Self {
            click_count,
            duration,
            clicks_per_sec: clicks_per_sec(click_count, duration),
            reason,
        }
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Session {}: {} clicks in {} ({:.1} clicks/sec)",
            self.reason,
            self.click_count,
            format_secs(self.duration),
            self.clicks_per_sec
        )
    }
}

/// Consistent copy of controller state taken under its lock.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub stats: SessionStats,
    pub settings: Settings,
    pub last_summary: Option<SessionSummary>,
}

/// Notifications delivered to the controller's notifier.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Started,
    Paused,
    Resumed,
    /// Emitted exactly once per session, whoever ended it.
    Finished(SessionSummary),
}

/// Result of a transition request.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Started,
    Paused,
    Resumed,
    Stopped(SessionSummary),
    Ignored,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_accumulates_across_pauses() {
        let t0 = Instant::now();
        let mut clock = ActiveClock::started(t0);
        assert_eq!(clock.elapsed(t0 + Duration::from_secs(2)), Duration::from_secs(2));

        clock.pause(t0 + Duration::from_secs(3));
        assert!(!clock.is_running());
        // frozen while paused
        assert_eq!(clock.elapsed(t0 + Duration::from_secs(10)), Duration::from_secs(3));

        clock.resume(t0 + Duration::from_secs(10));
        assert_eq!(clock.elapsed(t0 + Duration::from_secs(12)), Duration::from_secs(5));
    }

    #[test]
    fn clock_pause_and_resume_are_idempotent() {
        let t0 = Instant::now();
        let mut clock = ActiveClock::started(t0);
        clock.resume(t0 + Duration::from_secs(5));
        assert_eq!(clock.elapsed(t0 + Duration::from_secs(6)), Duration::from_secs(6));

        clock.pause(t0 + Duration::from_secs(6));
        clock.pause(t0 + Duration::from_secs(9));
        assert_eq!(clock.elapsed(t0 + Duration::from_secs(9)), Duration::from_secs(6));
    }

    #[test]
    fn default_clock_is_stopped_at_zero() {
        let clock = ActiveClock::default();
        assert!(!clock.is_running());
        assert_eq!(clock.elapsed(Instant::now()), Duration::ZERO);
    }

    #[test]
    fn stats_begin_resets_counter() {
        let t0 = Instant::now();
        let stats = SessionStats::begin(t0, Local::now());
        assert_eq!(stats.click_count, 0);
        assert!(stats.started_at.is_some());
        assert!(stats.clock.is_running());
    }

    #[test]
    fn summary_computes_rate() {
        let summary = SessionSummary::new(100, Duration::from_secs(2), StopReason::AutoStop);
        assert_eq!(summary.clicks_per_sec, 50.0);
        assert_eq!(
            summary.to_string(),
            "Session auto-stopped: 100 clicks in 2.0s (50.0 clicks/sec)"
        );
    }

    #[test]
    fn summary_with_zero_duration_has_zero_rate() {
        let summary = SessionSummary::new(0, Duration::ZERO, StopReason::Cancelled);
        assert_eq!(summary.clicks_per_sec, 0.0);
    }

    #[test]
    fn state_display() {
        assert_eq!(SessionState::Ready.to_string(), "Ready");
        assert_eq!(SessionState::default(), SessionState::Ready);
    }
}
