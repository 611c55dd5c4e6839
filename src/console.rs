use crate::config::Settings;
use crate::hotkey::RegistrationReport;
use crate::session::{SessionState, SessionSummary, StopReason};
use crossterm::{
    cursor::MoveTo,
    queue,
    style::Stylize,
    terminal::{Clear, ClearType},
};
use std::io::{self, Write};

/// Colored console output. Keeps track of an in-place status line so other
/// output starts on a fresh line, and of raw mode, where `\n` alone does not
/// return the carriage.
pub struct Console<W: Write> {
    out: W,
    raw: bool,
    status_pending: bool,
}

impl<W: Write> Console<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            raw: false,
            status_pending: false,
        }
    }

    pub fn set_raw(&mut self, raw: bool) {
        self.raw = raw;
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn writer(&mut self) -> &mut W {
        &mut self.out
    }

    fn newline(&self) -> &'static str {
        if self.raw {
            "\r\n"
        } else {
            "\n"
        }
    }

    fn end_status(&mut self) -> io::Result<()> {
        if self.status_pending {
            let nl = self.newline();
            write!(self.out, "{nl}")?;
            self.status_pending = false;
        }
        Ok(())
    }

    pub fn line(&mut self, text: impl std::fmt::Display) -> io::Result<()> {
        self.end_status()?;
        let nl = self.newline();
        write!(self.out, "{text}{nl}")?;
        self.out.flush()
    }

    pub fn info(&mut self, text: &str) -> io::Result<()> {
        self.line(text.cyan())
    }

    pub fn success(&mut self, text: &str) -> io::Result<()> {
        self.line(text.green())
    }

    pub fn warn(&mut self, text: &str) -> io::Result<()> {
        self.line(text.yellow())
    }

    pub fn error(&mut self, text: &str) -> io::Result<()> {
        self.line(text.red())
    }

    /// Redraws the status line in place.
    pub fn status(&mut self, line: &str, state: SessionState) -> io::Result<()> {
        write!(self.out, "\r")?;
        queue!(self.out, Clear(ClearType::CurrentLine))?;
        match state {
            SessionState::Active => write!(self.out, "{}", line.green())?,
            SessionState::Paused => write!(self.out, "{}", line.yellow())?,
            SessionState::Ready => write!(self.out, "{}", line.magenta())?,
        }
        self.status_pending = true;
        self.out.flush()
    }

    pub fn clear_screen(&mut self) -> io::Result<()> {
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        self.status_pending = false;
        self.out.flush()
    }

    pub fn banner(&mut self) -> io::Result<()> {
        self.line("==================================".dark_cyan())?;
        self.line("  Dialogue Skipper".green().bold())?;
        self.line("==================================".dark_cyan())
    }

    pub fn summary(&mut self, summary: &SessionSummary) -> io::Result<()> {
        let text = summary.to_string();
        match summary.reason {
            StopReason::Fault(_) => self.error(&text),
            StopReason::AutoStop => self.info(&text),
            StopReason::Cancelled => self.success(&text),
        }
    }

    pub fn registration_report(&mut self, report: &RegistrationReport) -> io::Result<()> {
        for (action, key) in &report.registered {
            self.success(&format!("  {} -> {}", key.to_ascii_uppercase(), action))?;
        }
        for (action, key, err) in &report.failed {
            self.error(&format!("  {action} ({key}) not registered: {err}"))?;
        }
        if !report.is_complete() {
            self.warn("Some hotkeys are unavailable; rebind them under Advanced settings.")?;
        }
        Ok(())
    }

    pub fn settings(&mut self, settings: &Settings) -> io::Result<()> {
        let on_off = |flag: bool| if flag { "on" } else { "off" };
        self.info("Current configuration:")?;
        self.line(format!(
            "  Start/stop key:      {}",
            settings.start_stop_key.to_ascii_uppercase()
        ))?;
        self.line(format!(
            "  Pause key:           {}",
            settings.pause_key.to_ascii_uppercase()
        ))?;
        self.line(format!(
            "  Emergency stop key:  {}",
            settings.emergency_stop_key.to_ascii_uppercase()
        ))?;
        self.line(format!("  Click interval:      {}s", settings.click_interval))?;
        self.line(format!("  Auto-stop after:     {}s", settings.auto_stop_time))?;
        self.line(format!(
            "  Click position:      ({}, {})",
            settings.click_x, settings.click_y
        ))?;
        self.line(format!(
            "  Show click counter:  {}",
            on_off(settings.show_click_counter)
        ))?;
        self.line(format!(
            "  Show elapsed time:   {}",
            on_off(settings.show_elapsed_time)
        ))
    }
}
