use crate::app_dirs::AppDirs;
use crate::error::SettingsError;
use crate::hotkey::{parse_key, HotkeyAction};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const MIN_CLICK_INTERVAL: f64 = 0.001;
pub const MAX_CLICK_INTERVAL: f64 = 10.0;
pub const MIN_AUTO_STOP: f64 = 1.0;
pub const MAX_AUTO_STOP: f64 = 7200.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub start_stop_key: String,
    pub pause_key: String,
    pub emergency_stop_key: String,
    pub click_interval: f64,
    pub auto_stop_time: f64,
    pub click_x: i32,
    pub click_y: i32,
    pub show_click_counter: bool,
    pub show_elapsed_time: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            start_stop_key: "f6".to_string(),
            pause_key: "f7".to_string(),
            emergency_stop_key: "f8".to_string(),
            click_interval: 0.01,
            auto_stop_time: 120.0,
            click_x: 1350,
            click_y: 750,
            show_click_counter: true,
            show_elapsed_time: true,
        }
    }
}

pub fn validate_click_interval(value: f64) -> Result<f64, SettingsError> {
    if (MIN_CLICK_INTERVAL..=MAX_CLICK_INTERVAL).contains(&value) {
        Ok(value)
    } else {
        Err(SettingsError::ClickInterval {
            value,
            min: MIN_CLICK_INTERVAL,
            max: MAX_CLICK_INTERVAL,
        })
    }
}

pub fn validate_auto_stop_time(value: f64) -> Result<f64, SettingsError> {
    if (MIN_AUTO_STOP..=MAX_AUTO_STOP).contains(&value) {
        Ok(value)
    } else {
        Err(SettingsError::AutoStopTime {
            value,
            min: MIN_AUTO_STOP,
            max: MAX_AUTO_STOP,
        })
    }
}

impl Settings {
    pub fn key_for(&self, action: HotkeyAction) -> &str {
        match action {
            HotkeyAction::StartStop => &self.start_stop_key,
            HotkeyAction::Pause => &self.pause_key,
            HotkeyAction::EmergencyStop => &self.emergency_stop_key,
        }
    }

    pub fn set_click_interval(&mut self, value: f64) -> Result<(), SettingsError> {
        self.click_interval = validate_click_interval(value)?;
        Ok(())
    }

    pub fn set_auto_stop_time(&mut self, value: f64) -> Result<(), SettingsError> {
        self.auto_stop_time = validate_auto_stop_time(value)?;
        Ok(())
    }

    pub fn set_position(&mut self, x: i32, y: i32) -> Result<(), SettingsError> {
        if x < 0 || y < 0 {
            return Err(SettingsError::NegativeCoordinates { x, y });
        }
        self.click_x = x;
        self.click_y = y;
        Ok(())
    }

    /// Rebinds `action`. The name must parse and must not collide with the
    /// other two bindings.
    pub fn set_key(&mut self, action: HotkeyAction, name: &str) -> Result<(), SettingsError> {
        let name = name.trim().to_ascii_lowercase();
        if parse_key(&name).is_none() {
            return Err(SettingsError::UnknownKey(name));
        }
        for other in HotkeyAction::ALL {
            if other != action && self.key_for(other).eq_ignore_ascii_case(&name) {
                return Err(SettingsError::KeyInUse {
                    key: name,
                    action: other.to_string(),
                });
            }
        }
        match action {
            HotkeyAction::StartStop => self.start_stop_key = name,
            HotkeyAction::Pause => self.pause_key = name,
            HotkeyAction::EmergencyStop => self.emergency_stop_key = name,
        }
        Ok(())
    }

    /// Replaces out-of-range numeric fields with their defaults.
    /// Returns the names of the fields that were reset.
    pub fn sanitize(&mut self) -> Vec<&'static str> {
        let defaults = Settings::default();
        let mut reset = Vec::new();
        if validate_click_interval(self.click_interval).is_err() {
            self.click_interval = defaults.click_interval;
            reset.push("click_interval");
        }
        if validate_auto_stop_time(self.auto_stop_time).is_err() {
            self.auto_stop_time = defaults.auto_stop_time;
            reset.push("auto_stop_time");
        }
        if self.click_x < 0 || self.click_y < 0 {
            self.click_x = defaults.click_x;
            self.click_y = defaults.click_y;
            reset.push("click_x/click_y");
        }
        reset
    }
}

pub trait ConfigStore {
    fn load(&self) -> Settings;
    fn save(&self, settings: &Settings) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_back(&self, settings: &Settings) {
        match self.save(settings) {
            Ok(()) => tracing::info!(path = %self.path.display(), "wrote configuration"),
            Err(err) => tracing::warn!(
                path = %self.path.display(),
                error = %err,
                "failed to write configuration"
            ),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    /// Never fails: a missing or unreadable file yields defaults, which are
    /// written back so the user has a file to edit.
    fn load(&self) -> Settings {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "configuration not found, using defaults"
                );
                let settings = Settings::default();
                self.write_back(&settings);
                return settings;
            }
        };

        match serde_json::from_slice::<Settings>(&bytes) {
            Ok(mut settings) => {
                let reset = settings.sanitize();
                if !reset.is_empty() {
                    tracing::warn!(fields = ?reset, "out-of-range settings replaced with defaults");
                    self.write_back(&settings);
                }
                settings
            }
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "configuration is corrupt, using defaults"
                );
                let settings = Settings::default();
                self.write_back(&settings);
                settings
            }
        }
    }

    fn save(&self, settings: &Settings) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let data = serde_json::to_vec_pretty(settings)?;
        fs::write(&self.path, data)
    }
}
