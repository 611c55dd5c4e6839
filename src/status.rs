use crate::session::{SessionSnapshot, SessionState};
use crate::util::format_secs;
use std::time::{Duration, Instant};

pub const ACTIVE_CADENCE: Duration = Duration::from_millis(500);
pub const PAUSED_CADENCE: Duration = Duration::from_secs(1);

fn key_label(name: &str) -> String {
    name.trim().to_ascii_uppercase()
}

/// Single-line status for `snapshot` at `now`. Only the elapsed timer
/// depends on `now`.
pub fn render_status(snapshot: &SessionSnapshot, now: Instant) -> String {
    let settings = &snapshot.settings;
    let start_stop = key_label(&settings.start_stop_key);
    let pause = key_label(&settings.pause_key);
    let emergency = key_label(&settings.emergency_stop_key);

    let mut parts = vec![format!("Status: {}", snapshot.state)];

    match snapshot.state {
        SessionState::Ready => {
            if let Some(summary) = &snapshot.last_summary {
                parts.push(format!("Last session: {} clicks", summary.click_count));
            }
            parts.push(format!("{start_stop} start"));
        }
        SessionState::Active | SessionState::Paused => {
            if settings.show_click_counter {
                parts.push(format!("Clicks: {}", snapshot.stats.click_count));
            }
            if settings.show_elapsed_time {
                let elapsed = snapshot.stats.active_elapsed(now);
                let limit = Duration::from_secs_f64(settings.auto_stop_time.max(0.0));
                parts.push(format!(
                    "Elapsed: {} / {}",
                    format_secs(elapsed),
                    format_secs(limit)
                ));
            }
            let verb = if snapshot.state == SessionState::Paused {
                "resume"
            } else {
                "pause"
            };
            parts.push(format!("{pause} {verb} | {start_stop} stop | {emergency} emergency stop"));
        }
    }

    parts.join(" | ")
}

/// Limits periodic status renders. Renders forced by transitions call
/// [`StatusThrottle::mark`] so the cadence restarts from them.
#[derive(Debug, Clone, Default)]
pub struct StatusThrottle {
    last: Option<Instant>,
}

impl StatusThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cadence(state: SessionState) -> Option<Duration> {
        match state {
            SessionState::Active => Some(ACTIVE_CADENCE),
            SessionState::Paused => Some(PAUSED_CADENCE),
            SessionState::Ready => None,
        }
    }

    pub fn should_render(&mut self, state: SessionState, now: Instant) -> bool {
        let Some(cadence) = Self::cadence(state) else {
            return false;
        };
        let due = self
            .last
            .map_or(true, |last| now.saturating_duration_since(last) >= cadence);
        if due {
            self.last = Some(now);
        }
        due
    }

    pub fn mark(&mut self, now: Instant) {
        self.last = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::session::{ActiveClock, SessionStats, SessionSummary, StopReason};

    fn snapshot(state: SessionState, clicks: u64, clock: ActiveClock) -> SessionSnapshot {
        SessionSnapshot {
            state,
            stats: SessionStats {
                click_count: clicks,
                started_at: None,
                clock,
            },
            settings: Settings::default(),
            last_summary: None,
        }
    }

    #[test]
    fn ready_line() {
        let snap = snapshot(SessionState::Ready, 0, ActiveClock::default());
        assert_eq!(render_status(&snap, Instant::now()), "Status: Ready | F6 start");
    }

    #[test]
    fn ready_line_mentions_last_session() {
        let mut snap = snapshot(SessionState::Ready, 42, ActiveClock::default());
        snap.last_summary = Some(SessionSummary::new(
            42,
            Duration::from_secs(1),
            StopReason::Cancelled,
        ));
        assert_eq!(
            render_status(&snap, Instant::now()),
            "Status: Ready | Last session: 42 clicks | F6 start"
        );
    }

    #[test]
    fn active_line_shows_counter_and_elapsed() {
        let t0 = Instant::now();
        let snap = snapshot(SessionState::Active, 7, ActiveClock::started(t0));
        assert_eq!(
            render_status(&snap, t0 + Duration::from_millis(2500)),
            "Status: Active | Clicks: 7 | Elapsed: 2.5s / 2m 00.0s | F7 pause | F6 stop | F8 emergency stop"
        );
    }

    #[test]
    fn paused_line_offers_resume() {
        let t0 = Instant::now();
        let mut clock = ActiveClock::started(t0);
        clock.pause(t0 + Duration::from_secs(1));
        let snap = snapshot(SessionState::Paused, 3, clock);
        let line = render_status(&snap, t0 + Duration::from_secs(30));
        assert!(line.starts_with("Status: Paused | Clicks: 3 | Elapsed: 1.0s"));
        assert!(line.contains("F7 resume"));
    }

    #[test]
    fn display_flags_hide_fields() {
        let mut snap = snapshot(SessionState::Active, 7, ActiveClock::started(Instant::now()));
        snap.settings.show_click_counter = false;
        snap.settings.show_elapsed_time = false;
        let line = render_status(&snap, Instant::now());
        assert!(!line.contains("Clicks"));
        assert!(!line.contains("Elapsed"));
    }

    #[test]
    fn rendering_is_idempotent() {
        let t0 = Instant::now();
        let snap = snapshot(SessionState::Active, 9, ActiveClock::started(t0));
        let at = t0 + Duration::from_secs(3);
        assert_eq!(render_status(&snap, at), render_status(&snap, at));
    }

    #[test]
    fn throttle_respects_cadence() {
        let t0 = Instant::now();
        let mut throttle = StatusThrottle::new();
        assert!(throttle.should_render(SessionState::Active, t0));
        assert!(!throttle.should_render(SessionState::Active, t0 + Duration::from_millis(200)));
        assert!(throttle.should_render(SessionState::Active, t0 + Duration::from_millis(500)));
        assert!(!throttle.should_render(SessionState::Paused, t0 + Duration::from_millis(900)));
        assert!(throttle.should_render(SessionState::Paused, t0 + Duration::from_millis(1500)));
    }

    #[test]
    fn throttle_never_renders_ready_periodically() {
        let mut throttle = StatusThrottle::new();
        assert!(!throttle.should_render(SessionState::Ready, Instant::now()));
    }

    #[test]
    fn mark_restarts_cadence() {
        let t0 = Instant::now();
        let mut throttle = StatusThrottle::new();
        throttle.mark(t0);
        assert!(!throttle.should_render(SessionState::Active, t0 + Duration::from_millis(100)));
    }
}
