use thiserror::Error;

/// Rejected configuration edits. The previous value is always kept.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettingsError {
    #[error("click interval must be between {min} and {max} seconds, got {value}")]
    ClickInterval { value: f64, min: f64, max: f64 },

    #[error("auto-stop time must be between {min} and {max} seconds, got {value}")]
    AutoStopTime { value: f64, min: f64, max: f64 },

    #[error("coordinates must be non-negative, got ({x}, {y})")]
    NegativeCoordinates { x: i32, y: i32 },

    #[error("unsupported key name: {0}")]
    UnknownKey(String),

    #[error("key {key} is already bound to {action}")]
    KeyInUse { key: String, action: String },
}

/// Failures from the input injection backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClickError {
    #[error("failed to initialise input backend: {0}")]
    Backend(String),

    #[error("click injection failed: {0}")]
    Injection(String),

    #[error("fail-safe triggered: pointer moved to screen corner ({x}, {y})")]
    FailSafe { x: i32, y: i32 },

    #[error("could not detect screen size: {0}")]
    ScreenSize(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HotkeyError {
    #[error("unsupported key name '{0}'")]
    UnknownKey(String),

    #[error("'{key}' is already bound to {existing}")]
    Duplicate { key: String, existing: String },

    #[error("global key listener failed: {0}")]
    Listener(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("a click session is running; stop it before changing settings")]
    Busy,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ElevationError {
    #[error("elevated relaunch was refused or failed (code {0})")]
    RelaunchFailed(isize),

    #[error("could not resolve current executable: {0}")]
    CurrentExe(String),
}
