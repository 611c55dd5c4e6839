use crate::config::{ConfigStore, Settings};
use crate::console::Console;
use crate::hotkey::HotkeyAction;
use crate::input::ClickerFactory;
use std::io::{self, BufRead, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOutcome {
    Start,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub label: &'static str,
    pub x: i32,
    pub y: i32,
}

/// Dialogue button position for common 16:9 resolutions.
pub const RESOLUTION_PRESETS: [Resolution; 6] = [
    Resolution { label: "1280x720", x: 960, y: 540 },
    Resolution { label: "1366x768", x: 1024, y: 576 },
    Resolution { label: "1600x900", x: 1200, y: 675 },
    Resolution { label: "1920x1080", x: 1350, y: 750 },
    Resolution { label: "2560x1440", x: 1920, y: 1080 },
    Resolution { label: "3840x2160", x: 2700, y: 1500 },
];

/// Interactive configuration menu. Every accepted edit is saved right away;
/// rejected input leaves the previous value in place.
pub struct Menu<'a, R: BufRead, W: Write> {
    input: R,
    console: &'a mut Console<W>,
    store: &'a dyn ConfigStore,
    screen: &'a dyn ClickerFactory,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(
        input: R,
        console: &'a mut Console<W>,
        store: &'a dyn ConfigStore,
        screen: &'a dyn ClickerFactory,
    ) -> Self {
        Self {
            input,
            console,
            store,
            screen,
        }
    }

    /// Shows the main menu until the user starts the skipper or exits.
    /// End of input counts as exit.
    pub fn run(&mut self, settings: &mut Settings) -> io::Result<MenuOutcome> {
        loop {
            self.console.line("")?;
            self.console.info("Main menu:")?;
            self.console.line(format!(
                "  1) Start dialogue skipper (click at ({}, {}))",
                settings.click_x, settings.click_y
            ))?;
            self.console.line("  2) Select click position by resolution")?;
            self.console.line("  3) Enter custom click position")?;
            self.console.line("  4) Advanced settings")?;
            self.console.line("  5) Show configuration")?;
            self.console.line("  6) Exit")?;

            let Some(choice) = self.prompt("Enter choice (1-6): ")? else {
                return Ok(MenuOutcome::Exit);
            };
            let done = match choice.as_str() {
                "1" => return Ok(MenuOutcome::Start),
                "2" => self.select_preset(settings)?,
                "3" => self.custom_position(settings)?,
                "4" => self.advanced(settings)?,
                "5" => {
                    self.console.settings(settings)?;
                    false
                }
                "6" => return Ok(MenuOutcome::Exit),
                _ => {
                    self.console.error("Invalid choice. Please select 1-6.")?;
                    false
                }
            };
            if done {
                return Ok(MenuOutcome::Exit);
            }
        }
    }

    /// `None` once input is exhausted.
    fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        write!(self.console.writer(), "{text}")?;
        self.console.writer().flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            self.console.line("")?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn confirm(&mut self, text: &str) -> io::Result<Option<bool>> {
        Ok(self
            .prompt(text)?
            .map(|answer| matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes")))
    }

    fn persist(&mut self, settings: &Settings) -> io::Result<()> {
        match self.store.save(settings) {
            Ok(()) => self.console.success("Settings saved."),
            Err(err) => {
                tracing::error!(error = %err, "failed to save settings");
                self.console
                    .error(&format!("Could not save settings: {err}. Changes apply to this run only."))
            }
        }
    }

    /// Returns true when input ran out.
    fn select_preset(&mut self, settings: &mut Settings) -> io::Result<bool> {
        self.console.info("Select screen resolution:")?;
        for (i, preset) in RESOLUTION_PRESETS.iter().enumerate() {
            self.console.line(format!(
                "  {}) {} -> ({}, {})",
                i + 1,
                preset.label,
                preset.x,
                preset.y
            ))?;
        }
        let back = RESOLUTION_PRESETS.len() + 1;
        self.console.line(format!("  {back}) Back"))?;

        loop {
            let Some(choice) = self.prompt(&format!("Enter choice (1-{back}): "))? else {
                return Ok(true);
            };
            match choice.parse::<usize>() {
                Ok(n) if n == back => return Ok(false),
                Ok(n) if (1..back).contains(&n) => {
                    let preset = RESOLUTION_PRESETS[n - 1];
                    if let Err(err) = settings.set_position(preset.x, preset.y) {
                        self.console.error(&err.to_string())?;
                        return Ok(false);
                    }
                    tracing::info!(
                        resolution = preset.label,
                        x = preset.x,
                        y = preset.y,
                        "selected resolution preset"
                    );
                    self.console.success(&format!(
                        "Using {} coordinates ({}, {}).",
                        preset.label, preset.x, preset.y
                    ))?;
                    self.persist(settings)?;
                    return Ok(false);
                }
                _ => self
                    .console
                    .error(&format!("Invalid choice. Please select 1-{back}."))?,
            }
        }
    }

    fn read_coordinate(&mut self, axis: &str) -> io::Result<Option<Option<i32>>> {
        let Some(raw) = self.prompt(&format!("Enter {axis} coordinate: "))? else {
            return Ok(None);
        };
        match raw.parse::<i32>() {
            Ok(value) => Ok(Some(Some(value))),
            Err(err) => {
                tracing::warn!(input = %raw, error = %err, "invalid coordinate input");
                self.console
                    .error(&format!("'{raw}' is not a valid coordinate. Keeping previous position."))?;
                Ok(Some(None))
            }
        }
    }

    fn custom_position(&mut self, settings: &mut Settings) -> io::Result<bool> {
        let x = match self.read_coordinate("X")? {
            None => return Ok(true),
            Some(None) => return Ok(false),
            Some(Some(x)) => x,
        };
        let y = match self.read_coordinate("Y")? {
            None => return Ok(true),
            Some(None) => return Ok(false),
            Some(Some(y)) => y,
        };

        let mut candidate = settings.clone();
        if let Err(err) = candidate.set_position(x, y) {
            self.console.error(&format!("{err}. Keeping previous position."))?;
            return Ok(false);
        }

        match self.screen.screen_size() {
            Ok((width, height)) if x >= width || y >= height => {
                let question = format!(
                    "({x}, {y}) is outside the detected screen ({width}x{height}). Use it anyway? [y/N]: "
                );
                match self.confirm(&question)? {
                    None => return Ok(true),
                    Some(false) => {
                        self.console.warn("Keeping previous position.")?;
                        return Ok(false);
                    }
                    Some(true) => {}
                }
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(error = %err, "screen size unavailable for bounds check");
                self.console
                    .warn("Could not detect the screen size; coordinates were not bounds-checked.")?;
            }
        }

        *settings = candidate;
        tracing::info!(x, y, "selected custom click position");
        self.console
            .success(&format!("Using custom coordinates ({x}, {y})."))?;
        self.persist(settings)?;
        Ok(false)
    }

    fn advanced(&mut self, settings: &mut Settings) -> io::Result<bool> {
        let on_off = |flag: bool| if flag { "on" } else { "off" };
        loop {
            self.console.line("")?;
            self.console.info("Advanced settings:")?;
            self.console.line(format!(
                "  1) Start/stop hotkey ({})",
                settings.start_stop_key.to_ascii_uppercase()
            ))?;
            self.console.line(format!(
                "  2) Pause hotkey ({})",
                settings.pause_key.to_ascii_uppercase()
            ))?;
            self.console.line(format!(
                "  3) Emergency stop hotkey ({})",
                settings.emergency_stop_key.to_ascii_uppercase()
            ))?;
            self.console
                .line(format!("  4) Click interval ({}s)", settings.click_interval))?;
            self.console
                .line(format!("  5) Auto-stop time ({}s)", settings.auto_stop_time))?;
            self.console.line(format!(
                "  6) Show click counter ({})",
                on_off(settings.show_click_counter)
            ))?;
            self.console.line(format!(
                "  7) Show elapsed time ({})",
                on_off(settings.show_elapsed_time)
            ))?;
            self.console.line("  8) Back")?;

            let Some(choice) = self.prompt("Enter choice (1-8): ")? else {
                return Ok(true);
            };
            let exhausted = match choice.as_str() {
                "1" => self.rebind(settings, HotkeyAction::StartStop)?,
                "2" => self.rebind(settings, HotkeyAction::Pause)?,
                "3" => self.rebind(settings, HotkeyAction::EmergencyStop)?,
                "4" => self.edit_number(
                    settings,
                    "Click interval in seconds (0.001-10): ",
                    Settings::set_click_interval,
                )?,
                "5" => self.edit_number(
                    settings,
                    "Auto-stop time in seconds (1-7200): ",
                    Settings::set_auto_stop_time,
                )?,
                "6" => {
                    settings.show_click_counter = !settings.show_click_counter;
                    self.persist(settings)?;
                    false
                }
                "7" => {
                    settings.show_elapsed_time = !settings.show_elapsed_time;
                    self.persist(settings)?;
                    false
                }
                "8" => return Ok(false),
                _ => {
                    self.console.error("Invalid choice. Please select 1-8.")?;
                    false
                }
            };
            if exhausted {
                return Ok(true);
            }
        }
    }

    fn rebind(&mut self, settings: &mut Settings, action: HotkeyAction) -> io::Result<bool> {
        let Some(name) = self.prompt(&format!("New {action} key (e.g. f6, f9, p): "))? else {
            return Ok(true);
        };
        match settings.set_key(action, &name) {
            Ok(()) => {
                tracing::info!(%action, key = %settings.key_for(action), "hotkey rebound");
                self.persist(settings)?;
            }
            Err(err) => self.console.error(&format!("{err}. Keeping previous key."))?,
        }
        Ok(false)
    }

    fn edit_number(
        &mut self,
        settings: &mut Settings,
        question: &str,
        apply: fn(&mut Settings, f64) -> Result<(), crate::error::SettingsError>,
    ) -> io::Result<bool> {
        let Some(raw) = self.prompt(question)? else {
            return Ok(true);
        };
        match raw.parse::<f64>() {
            Ok(value) => match apply(settings, value) {
                Ok(()) => self.persist(settings)?,
                Err(err) => self.console.error(&format!("{err}. Keeping previous value."))?,
            },
            Err(_) => self
                .console
                .error(&format!("'{raw}' is not a number. Keeping previous value."))?,
        }
        Ok(false)
    }
}
