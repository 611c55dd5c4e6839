pub mod controller;
pub mod state;
mod task;

pub use controller::{SessionController, StopTrigger, DEFAULT_STOP_TIMEOUT};
pub use state::{
    ActiveClock, SessionEvent, SessionSnapshot, SessionState, SessionStats, SessionSummary,
    StopReason, Transition,
};
