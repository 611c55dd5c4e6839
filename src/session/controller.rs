use super::state::{
    SessionEvent, SessionSnapshot, SessionState, SessionStats, SessionSummary, StopReason,
    Transition,
};
use super::task::{log_summary, ClickPlan, ClickTask};
use crate::config::Settings;
use crate::error::SessionError;
use crate::input::ClickerFactory;
use chrono::Local;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(2);

type Notifier = Box<dyn Fn(SessionEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum StopTrigger {
    #[strum(serialize = "hotkey")]
    Toggle,
    #[strum(serialize = "emergency stop")]
    Emergency,
    #[strum(serialize = "shutdown")]
    Shutdown,
}

pub(crate) struct Inner {
    pub(crate) state: SessionState,
    pub(crate) stats: SessionStats,
    pub(crate) settings: Settings,
    /// Bumped on every start; a task whose generation no longer matches
    /// must not touch state.
    pub(crate) generation: u64,
    /// Set while a stop waits for its task outside the lock.
    pub(crate) stopping: bool,
    /// Latest generation whose summary was recorded and logged, by the task
    /// or by a stop that gave up waiting for it.
    pub(crate) summarised_generation: u64,
    pub(crate) task: Option<ClickTask>,
    pub(crate) last_summary: Option<SessionSummary>,
}

pub(crate) struct Shared {
    pub(crate) inner: Mutex<Inner>,
    notifier: RwLock<Option<Notifier>>,
}

impl Shared {
    pub(crate) fn notify(&self, event: SessionEvent) {
        if let Some(notifier) = self.notifier.read().as_ref() {
            notifier(event);
        }
    }
}

/// Owns the Ready/Active/Paused state machine and the click task.
///
/// Every transition happens under one lock. Stopping releases the lock
/// before waiting for the task, so the task can always take the lock to
/// finish.
#[derive(Clone)]
pub struct SessionController {
    shared: Arc<Shared>,
    factory: Arc<dyn ClickerFactory>,
    stop_timeout: Duration,
}

impl SessionController {
    pub fn new(factory: Arc<dyn ClickerFactory>, settings: Settings) -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state: SessionState::Ready,
                    stats: SessionStats::default(),
                    settings,
                    generation: 0,
                    stopping: false,
                    summarised_generation: 0,
                    task: None,
                    last_summary: None,
                }),
                notifier: RwLock::new(None),
            }),
            factory,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }

    pub fn with_notifier<F>(self, notifier: F) -> Self
    where
        F: Fn(SessionEvent) + Send + Sync + 'static,
    {
        *self.shared.notifier.write() = Some(Box::new(notifier));
        self
    }

    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    pub fn state(&self) -> SessionState {
        self.shared.inner.lock().state
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.shared.inner.lock();
        SessionSnapshot {
            state: inner.state,
            stats: inner.stats.clone(),
            settings: inner.settings.clone(),
            last_summary: inner.last_summary.clone(),
        }
    }

    pub fn last_summary(&self) -> Option<SessionSummary> {
        self.shared.inner.lock().last_summary.clone()
    }

    pub fn settings(&self) -> Settings {
        self.shared.inner.lock().settings.clone()
    }

    /// Takes effect from the next session. Refused while one is running.
    pub fn update_settings(&self, settings: Settings) -> Result<(), SessionError> {
        let mut inner = self.shared.inner.lock();
        if inner.state != SessionState::Ready || inner.stopping {
            return Err(SessionError::Busy);
        }
        inner.settings = settings;
        Ok(())
    }

    pub fn toggle_start_stop(&self) -> Transition {
        let mut inner = self.shared.inner.lock();
        match inner.state {
            SessionState::Ready => {
                let transition = self.start_locked(&mut inner);
                drop(inner);
                if transition == Transition::Started {
                    self.shared.notify(SessionEvent::Started);
                }
                transition
            }
            SessionState::Active | SessionState::Paused => {
                drop(inner);
                self.stop(StopTrigger::Toggle)
            }
        }
    }

    pub fn toggle_pause(&self) -> Transition {
        let (transition, clicks) = {
            let mut inner = self.shared.inner.lock();
            if inner.stopping {
                return Transition::Ignored;
            }
            let now = Instant::now();
            let transition = match inner.state {
                SessionState::Ready => return Transition::Ignored,
                SessionState::Active => {
                    inner.state = SessionState::Paused;
                    inner.stats.clock.pause(now);
                    Transition::Paused
                }
                SessionState::Paused => {
                    inner.state = SessionState::Active;
                    inner.stats.clock.resume(now);
                    Transition::Resumed
                }
            };
            (transition, inner.stats.click_count)
        };

        match transition {
            Transition::Paused => {
                tracing::info!(clicks, "session paused");
                self.shared.notify(SessionEvent::Paused);
            }
            Transition::Resumed => {
                tracing::info!(clicks, "session resumed");
                self.shared.notify(SessionEvent::Resumed);
            }
            _ => {}
        }
        transition
    }

    /// Always stops, never starts. A no-op when already Ready.
    pub fn emergency_stop(&self) -> Transition {
        self.stop(StopTrigger::Emergency)
    }

    pub fn shutdown(&self) -> Transition {
        self.stop(StopTrigger::Shutdown)
    }

    fn start_locked(&self, inner: &mut Inner) -> Transition {
        if inner.stopping {
            tracing::warn!("start ignored while the previous session is stopping");
            return Transition::Ignored;
        }

        let plan = ClickPlan::from(&inner.settings);
        let generation = inner.generation + 1;
        match ClickTask::spawn(
            Arc::clone(&self.shared),
            Arc::clone(&self.factory),
            plan,
            generation,
        ) {
            Ok(task) => {
                inner.generation = generation;
                let wall = Local::now();
                inner.stats = SessionStats::begin(Instant::now(), wall);
                inner.task = Some(task);
                inner.state = SessionState::Active;
                tracing::info!(
                    started_at = %wall.format("%Y-%m-%d %H:%M:%S"),
                    x = plan.x,
                    y = plan.y,
                    interval_secs = plan.interval.as_secs_f64(),
                    auto_stop_secs = plan.auto_stop.as_secs_f64(),
                    "session started"
                );
                Transition::Started
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to spawn click task");
                Transition::Ignored
            }
        }
    }

    /// Summary for a session whose task did not report in time. Marks the
    /// generation so the detached task stays silent when it exits.
    fn summarise_abandoned(inner: &mut Inner) -> SessionSummary {
        let now = Instant::now();
        inner.stats.clock.pause(now);
        let summary = SessionSummary::new(
            inner.stats.click_count,
            inner.stats.active_elapsed(now),
            StopReason::Cancelled,
        );
        inner.summarised_generation = inner.generation;
        log_summary(&summary);
        summary
    }

    fn stop(&self, trigger: StopTrigger) -> Transition {
        let task = {
            let mut inner = self.shared.inner.lock();
            if inner.state == SessionState::Ready || inner.stopping {
                return Transition::Ignored;
            }
            inner.stopping = true;
            let task = inner.task.take();
            if let Some(task) = &task {
                task.cancel();
            }
            task
        };

        match trigger {
            StopTrigger::Emergency => tracing::warn!("emergency stop requested"),
            _ => tracing::info!(%trigger, "stopping session"),
        }

        // lock released: the task needs it to exit
        let reported = task.and_then(|task| task.finish(self.stop_timeout));

        let summary = {
            let mut inner = self.shared.inner.lock();
            let summary = match reported {
                Some(summary) => summary,
                // the task reported between the timeout and this lock
                None if inner.summarised_generation == inner.generation => inner
                    .last_summary
                    .clone()
                    .unwrap_or_else(|| Self::summarise_abandoned(&mut inner)),
                None => Self::summarise_abandoned(&mut inner),
            };
            inner.state = SessionState::Ready;
            inner.stopping = false;
            inner.last_summary = Some(summary.clone());
            summary
        };

        tracing::info!(%trigger, clicks = summary.click_count, "session stopped");
        self.shared.notify(SessionEvent::Finished(summary.clone()));
        Transition::Stopped(summary)
    }
}
