use crate::config::Settings;
use crate::console::Console;
use crate::hotkey::{HotkeyAction, HotkeyDispatcher};
use crate::input::ClickerFactory;
use crate::runtime::{AppEvent, AppEventSource, ChannelEventSource, FixedTicker, Runner, TerminalKeys, Ticker};
use crate::session::{SessionController, SessionEvent, Transition};
use crate::status::{render_status, StatusThrottle};
use anyhow::Result;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::io::{self, Write};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Instant;

/// Which platform hooks the skipper loop installs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipperOptions {
    /// Listen for global hotkeys through rdev.
    pub global_hotkeys: bool,
    /// Put the terminal in raw mode and watch it for quit keys.
    pub terminal_keys: bool,
}

impl Default for SkipperOptions {
    fn default() -> Self {
        Self {
            global_hotkeys: true,
            terminal_keys: true,
        }
    }
}

pub fn dispatch_action(controller: &SessionController, action: HotkeyAction) -> Transition {
    match action {
        HotkeyAction::StartStop => controller.toggle_start_stop(),
        HotkeyAction::Pause => controller.toggle_pause(),
        HotkeyAction::EmergencyStop => controller.emergency_stop(),
    }
}

fn render_now<W: Write>(
    controller: &SessionController,
    console: &mut Console<W>,
    throttle: &mut StatusThrottle,
) -> io::Result<()> {
    let now = Instant::now();
    let snapshot = controller.snapshot();
    throttle.mark(now);
    console.status(&render_status(&snapshot, now), snapshot.state)
}

/// Handles events until `Quit`, then stops any running session.
pub fn run_event_loop<E: AppEventSource, T: Ticker, W: Write>(
    runner: &Runner<E, T>,
    controller: &SessionController,
    console: &mut Console<W>,
) -> io::Result<()> {
    let mut throttle = StatusThrottle::new();
    render_now(controller, console, &mut throttle)?;

    loop {
        match runner.step() {
            AppEvent::Hotkey(action) => {
                let transition = dispatch_action(controller, action);
                tracing::debug!(%action, ?transition, "hotkey handled");
                render_now(controller, console, &mut throttle)?;
            }
            AppEvent::Session(SessionEvent::Finished(summary)) => {
                console.summary(&summary)?;
                render_now(controller, console, &mut throttle)?;
            }
            AppEvent::Session(_) => render_now(controller, console, &mut throttle)?,
            AppEvent::ListenerFailed(msg) => {
                console.error(&format!(
                    "Global hotkeys are unavailable ({msg}). See the log for details."
                ))?;
            }
            AppEvent::Quit => {
                if let Transition::Stopped(summary) = controller.shutdown() {
                    console.summary(&summary)?;
                }
                render_now(controller, console, &mut throttle)?;
                console.line("")?;
                return Ok(());
            }
            AppEvent::Tick => {
                let now = Instant::now();
                let snapshot = controller.snapshot();
                if throttle.should_render(snapshot.state, now) {
                    console.status(&render_status(&snapshot, now), snapshot.state)?;
                }
            }
        }
    }
}

/// Wires the controller, the hotkey dispatcher and the event channel.
pub struct App {
    controller: SessionController,
    dispatcher: HotkeyDispatcher,
    runner: Runner<ChannelEventSource, FixedTicker>,
    events: Sender<AppEvent>,
}

impl App {
    pub fn new(factory: Arc<dyn ClickerFactory>, settings: Settings) -> Self {
        Self::with_ticker(factory, settings, FixedTicker::default())
    }

    pub fn with_ticker(
        factory: Arc<dyn ClickerFactory>,
        settings: Settings,
        ticker: FixedTicker,
    ) -> Self {
        let (events, source) = ChannelEventSource::channel();
        let notify = events.clone();
        let controller = SessionController::new(factory, settings).with_notifier(move |event| {
            let _ = notify.send(AppEvent::Session(event));
        });
        Self {
            controller,
            dispatcher: HotkeyDispatcher::new(),
            runner: Runner::new(source, ticker),
            events,
        }
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    pub fn dispatcher(&self) -> &HotkeyDispatcher {
        &self.dispatcher
    }

    /// Producer handle for the loop's channel.
    pub fn sender(&self) -> Sender<AppEvent> {
        self.events.clone()
    }

    /// Runs the skipper with `settings` until the user quits back to the
    /// menu. Any session still running at that point is stopped.
    pub fn run_skipper<W: Write>(
        &self,
        settings: &Settings,
        console: &mut Console<W>,
        options: SkipperOptions,
    ) -> Result<()> {
        self.controller.update_settings(settings.clone())?;

        console.info("Registering hotkeys:")?;
        let report = self.dispatcher.register_all(settings);
        console.registration_report(&report)?;
        if report.registered.is_empty() {
            console.error("No hotkeys could be registered; returning to the menu.")?;
            return Ok(());
        }

        if options.global_hotkeys {
            let tx = self.events.clone();
            self.dispatcher.start_listener(move |event| {
                let _ = tx.send(AppEvent::from(event));
            });
        }

        let dropped = self.runner.event_source().drain();
        if dropped > 0 {
            tracing::debug!(dropped, "discarded events queued while in the menu");
        }

        console.info(&format!(
            "Click position ({}, {}), every {}s, auto-stop after {}s.",
            settings.click_x, settings.click_y, settings.click_interval, settings.auto_stop_time
        ))?;
        console.info("Press q or Esc here to return to the menu.")?;

        let mut keys = None;
        if options.terminal_keys {
            match enable_raw_mode() {
                Ok(()) => console.set_raw(true),
                Err(err) => tracing::warn!(error = %err, "could not enable raw mode"),
            }
            keys = Some(TerminalKeys::spawn(self.events.clone())?);
        }

        self.dispatcher.arm();
        let result = run_event_loop(&self.runner, &self.controller, console);
        self.dispatcher.disarm();

        if let Some(mut keys) = keys {
            keys.stop();
            if let Err(err) = disable_raw_mode() {
                tracing::warn!(error = %err, "could not restore terminal mode");
            }
            console.set_raw(false);
        }
        self.runner.event_source().drain();

        result?;
        Ok(())
    }
}
