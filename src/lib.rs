// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod console;
pub mod elevation;
pub mod error;
pub mod hotkey;
pub mod input;
pub mod logging;
pub mod menu;
pub mod runtime;
pub mod session;
pub mod status;
pub mod util;

pub use config::{ConfigStore, FileConfigStore, Settings};
pub use session::{SessionController, SessionState, SessionSummary, StopReason};
