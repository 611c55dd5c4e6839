use super::controller::{Inner, Shared};
use super::state::{SessionEvent, SessionState, SessionSummary, StopReason};
use crate::config::Settings;
use crate::input::ClickerFactory;
use crate::util::sleep_slices;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

pub(crate) const PAUSE_POLL: Duration = Duration::from_millis(100);
pub(crate) const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// Values the task needs, copied from [`Settings`] when the session starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ClickPlan {
    pub x: i32,
    pub y: i32,
    pub interval: Duration,
    pub auto_stop: Duration,
}

impl From<&Settings> for ClickPlan {
    fn from(settings: &Settings) -> Self {
        Self {
            x: settings.click_x,
            y: settings.click_y,
            interval: Duration::from_secs_f64(settings.click_interval.max(0.0)),
            auto_stop: Duration::from_secs_f64(settings.auto_stop_time.max(0.0)),
        }
    }
}

/// Handle to a running click thread.
pub(crate) struct ClickTask {
    handle: JoinHandle<()>,
    cancel: Arc<AtomicBool>,
    done: Receiver<SessionSummary>,
}

impl ClickTask {
    pub(crate) fn spawn(
        shared: Arc<Shared>,
        factory: Arc<dyn ClickerFactory>,
        plan: ClickPlan,
        generation: u64,
    ) -> io::Result<Self> {
        let cancel = Arc::new(AtomicBool::new(false));
        let (done_tx, done) = mpsc::channel();
        let worker = Worker {
            shared,
            factory,
            plan,
            generation,
            cancel: Arc::clone(&cancel),
            done: done_tx,
        };
        let handle = thread::Builder::new()
            .name(format!("click-task-{generation}"))
            .spawn(move || worker.run())?;
        Ok(Self {
            handle,
            cancel,
            done,
        })
    }

    pub(crate) fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Waits up to `timeout` for the task's summary, then reaps the thread.
    /// On timeout the thread is detached; it exits at its next cancel check.
    pub(crate) fn finish(self, timeout: Duration) -> Option<SessionSummary> {
        match self.done.recv_timeout(timeout) {
            Ok(summary) => {
                if self.handle.join().is_err() {
                    tracing::error!("click task panicked after reporting");
                }
                Some(summary)
            }
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(?timeout, "click task did not stop in time, detaching it");
                None
            }
            Err(RecvTimeoutError::Disconnected) => {
                if self.handle.join().is_err() {
                    tracing::error!("click task panicked");
                }
                None
            }
        }
    }
}

enum Step {
    Exit(StopReason),
    Paused,
    Click { budget_left: Duration },
}

/// Writes the one `session summary` record a session gets.
pub(crate) fn log_summary(summary: &SessionSummary) {
    tracing::info!(
        click_count = summary.click_count,
        duration_secs = summary.duration.as_secs_f64(),
        clicks_per_sec = summary.clicks_per_sec,
        reason = %summary.reason,
        "session summary"
    );
}

struct Worker {
    shared: Arc<Shared>,
    factory: Arc<dyn ClickerFactory>,
    plan: ClickPlan,
    generation: u64,
    cancel: Arc<AtomicBool>,
    done: Sender<SessionSummary>,
}

impl Worker {
    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    fn superseded(&self, inner: &Inner) -> bool {
        self.cancelled() || inner.generation != self.generation
    }

    fn run(self) {
        let mut clicks: u64 = 0;
        let mut last_elapsed = Duration::ZERO;

        let reason = match self.factory.create() {
            Err(err) => {
                tracing::error!(error = %err, "could not start input backend");
                StopReason::Fault(err.to_string())
            }
            Ok(mut clicker) => loop {
                let step = {
                    let inner = self.shared.inner.lock();
                    last_elapsed = inner.stats.active_elapsed(Instant::now());

                    if self.superseded(&inner) {
                        Step::Exit(StopReason::Cancelled)
                    } else if last_elapsed >= self.plan.auto_stop {
                        Step::Exit(StopReason::AutoStop)
                    } else if inner.state == SessionState::Paused {
                        Step::Paused
                    } else {
                        Step::Click {
                            budget_left: self.plan.auto_stop.saturating_sub(last_elapsed),
                        }
                    }
                };

                let budget_left = match step {
                    Step::Exit(reason) => break reason,
                    Step::Paused => {
                        thread::sleep(PAUSE_POLL);
                        continue;
                    }
                    Step::Click { budget_left } => budget_left,
                };

                // the backend may block; stop and snapshot must not wait on it
                let result = clicker.click(self.plan.x, self.plan.y);
                {
                    let mut inner = self.shared.inner.lock();
                    if self.superseded(&inner) {
                        break StopReason::Cancelled;
                    }
                    match result {
                        // a click that raced a pause is not counted
                        Ok(()) if inner.state == SessionState::Active => {
                            clicks += 1;
                            inner.stats.click_count = clicks;
                        }
                        Ok(()) => {}
                        Err(err) => {
                            tracing::error!(error = %err, clicks, "click injection failed, aborting session");
                            break StopReason::Fault(err.to_string());
                        }
                    }
                }

                for slice in sleep_slices(self.plan.interval.min(budget_left), SLEEP_SLICE) {
                    if self.cancelled() {
                        break;
                    }
                    thread::sleep(slice);
                }

                if self.cancelled() {
                    break StopReason::Cancelled;
                }
            },
        };

        self.finish(clicks, last_elapsed, reason);
    }

    fn finish(&self, clicks: u64, last_elapsed: Duration, reason: StopReason) {
        let (summary, self_stopped) = {
            let mut inner = self.shared.inner.lock();
            if inner.summarised_generation >= self.generation {
                // the controller gave up waiting and already reported this session
                tracing::debug!(generation = self.generation, "detached click task exited");
                return;
            }

            let owned = inner.generation == self.generation;
            let duration = if owned {
                let now = Instant::now();
                inner.stats.clock.pause(now);
                inner.stats.active_elapsed(now)
            } else {
                last_elapsed
            };
            let summary = SessionSummary::new(clicks, duration, reason);
            inner.summarised_generation = self.generation;

            // a stop in progress owns the transition; otherwise this is a self-stop
            let self_stopped = owned && !inner.stopping && inner.state != SessionState::Ready;
            if owned {
                inner.last_summary = Some(summary.clone());
            }
            if self_stopped {
                inner.state = SessionState::Ready;
                inner.task = None;
            }
            (summary, self_stopped)
        };

        log_summary(&summary);
        if summary.reason == StopReason::AutoStop {
            tracing::info!(limit_secs = self.plan.auto_stop.as_secs_f64(), "auto-stop reached");
        }

        let _ = self.done.send(summary.clone());
        if self_stopped {
            self.shared.notify(SessionEvent::Finished(summary));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_copies_settings() {
        let settings = Settings {
            click_x: 10,
            click_y: 20,
            click_interval: 0.25,
            auto_stop_time: 3.0,
            ..Settings::default()
        };
        let plan = ClickPlan::from(&settings);
        assert_eq!((plan.x, plan.y), (10, 20));
        assert_eq!(plan.interval, Duration::from_millis(250));
        assert_eq!(plan.auto_stop, Duration::from_secs(3));
    }
}
