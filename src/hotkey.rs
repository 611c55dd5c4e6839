use crate::config::Settings;
use crate::error::HotkeyError;
use parking_lot::RwLock;
use rdev::{listen, Event, EventType, Key};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// What a configured key asks the session controller to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum HotkeyAction {
    #[strum(serialize = "start/stop")]
    StartStop,
    #[strum(serialize = "pause/resume")]
    Pause,
    #[strum(serialize = "emergency stop")]
    EmergencyStop,
}

impl HotkeyAction {
    pub const ALL: [HotkeyAction; 3] = [
        HotkeyAction::StartStop,
        HotkeyAction::Pause,
        HotkeyAction::EmergencyStop,
    ];
}

/// Notifications produced by the global listener thread.
#[derive(Debug, Clone, PartialEq)]
pub enum HotkeyEvent {
    Action(HotkeyAction),
    ListenerFailed(String),
}

/// Parse a key name like "f6", "Space" or "q" into an rdev [`Key`].
pub fn parse_key(name: &str) -> Option<Key> {
    let upper = name.trim().to_ascii_uppercase();
    match upper.as_str() {
        "SPACE" => Some(Key::Space),
        "TAB" => Some(Key::Tab),
        "ENTER" | "RETURN" => Some(Key::Return),
        "ESC" | "ESCAPE" => Some(Key::Escape),
        "DELETE" => Some(Key::Delete),
        "INSERT" => Some(Key::Insert),
        "BACKSPACE" => Some(Key::Backspace),
        "HOME" => Some(Key::Home),
        "END" => Some(Key::End),
        "PAGEUP" => Some(Key::PageUp),
        "PAGEDOWN" => Some(Key::PageDown),
        "LEFT" => Some(Key::LeftArrow),
        "RIGHT" => Some(Key::RightArrow),
        "UP" => Some(Key::UpArrow),
        "DOWN" => Some(Key::DownArrow),
        "PAUSE" => Some(Key::Pause),
        "SCROLLLOCK" => Some(Key::ScrollLock),
        "PRINTSCREEN" => Some(Key::PrintScreen),
        _ if upper.len() > 1 && upper.starts_with('F') => match upper[1..].parse::<u8>().ok() {
            Some(1) => Some(Key::F1),
            Some(2) => Some(Key::F2),
            Some(3) => Some(Key::F3),
            Some(4) => Some(Key::F4),
            Some(5) => Some(Key::F5),
            Some(6) => Some(Key::F6),
            Some(7) => Some(Key::F7),
            Some(8) => Some(Key::F8),
            Some(9) => Some(Key::F9),
            Some(10) => Some(Key::F10),
            Some(11) => Some(Key::F11),
            Some(12) => Some(Key::F12),
            _ => None,
        },
        _ if upper.len() == 1 => {
            let c = upper.chars().next()?;
            Some(match c {
                '0' => Key::Num0,
                '1' => Key::Num1,
                '2' => Key::Num2,
                '3' => Key::Num3,
                '4' => Key::Num4,
                '5' => Key::Num5,
                '6' => Key::Num6,
                '7' => Key::Num7,
                '8' => Key::Num8,
                '9' => Key::Num9,
                'A' => Key::KeyA,
                'B' => Key::KeyB,
                'C' => Key::KeyC,
                'D' => Key::KeyD,
                'E' => Key::KeyE,
                'F' => Key::KeyF,
                'G' => Key::KeyG,
                'H' => Key::KeyH,
                'I' => Key::KeyI,
                'J' => Key::KeyJ,
                'K' => Key::KeyK,
                'L' => Key::KeyL,
                'M' => Key::KeyM,
                'N' => Key::KeyN,
                'O' => Key::KeyO,
                'P' => Key::KeyP,
                'Q' => Key::KeyQ,
                'R' => Key::KeyR,
                'S' => Key::KeyS,
                'T' => Key::KeyT,
                'U' => Key::KeyU,
                'V' => Key::KeyV,
                'W' => Key::KeyW,
                'X' => Key::KeyX,
                'Y' => Key::KeyY,
                'Z' => Key::KeyZ,
                _ => return None,
            })
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
struct Binding {
    action: HotkeyAction,
    key: Key,
}

/// Outcome of registering every configured binding.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RegistrationReport {
    pub registered: Vec<(HotkeyAction, String)>,
    pub failed: Vec<(HotkeyAction, String, HotkeyError)>,
}

impl RegistrationReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Maps pressed keys to [`HotkeyAction`]s. Clones share bindings and the
/// armed flag with the listener thread.
#[derive(Clone, Default)]
pub struct HotkeyDispatcher {
    bindings: Arc<RwLock<Vec<Binding>>>,
    armed: Arc<AtomicBool>,
    listening: Arc<AtomicBool>,
}

impl HotkeyDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all bindings with those configured in `settings`. A failing
    /// key never stops the remaining keys from being attempted.
    pub fn register_all(&self, settings: &Settings) -> RegistrationReport {
        self.bindings.write().clear();
        let mut report = RegistrationReport::default();

        for action in HotkeyAction::ALL {
            let name = settings.key_for(action).to_string();
            match self.register(action, &name) {
                Ok(()) => {
                    tracing::info!(key = %name, %action, "registered hotkey");
                    report.registered.push((action, name));
                }
                Err(err) => {
                    tracing::error!(key = %name, %action, error = %err, "failed to register hotkey");
                    report.failed.push((action, name, err));
                }
            }
        }

        report
    }

    pub fn register(&self, action: HotkeyAction, name: &str) -> Result<(), HotkeyError> {
        let key = parse_key(name).ok_or_else(|| HotkeyError::UnknownKey(name.to_string()))?;
        let mut bindings = self.bindings.write();
        if let Some(existing) = bindings.iter().find(|b| b.key == key) {
            return Err(HotkeyError::Duplicate {
                key: name.to_string(),
                existing: existing.action.to_string(),
            });
        }
        bindings.push(Binding { action, key });
        Ok(())
    }

    pub fn resolve(&self, key: Key) -> Option<HotkeyAction> {
        self.bindings
            .read()
            .iter()
            .find(|b| b.key == key)
            .map(|b| b.action)
    }

    /// Resolves a key press, but only while armed.
    pub fn handle_press(&self, key: Key) -> Option<HotkeyAction> {
        if !self.is_armed() {
            return None;
        }
        self.resolve(key)
    }

    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    pub fn disarm(&self) {
        self.armed.store(false, Ordering::SeqCst);
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    /// Starts the process-wide key listener. rdev cannot stop a listener, so
    /// this runs at most once; later calls are no-ops.
    pub fn start_listener<F>(&self, sink: F)
    where
        F: Fn(HotkeyEvent) + Send + Sync + 'static,
    {
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let dispatcher = self.clone();
        let sink = Arc::new(sink);
        tracing::debug!("starting global hotkey listener");
        let spawned = thread::Builder::new()
            .name("hotkey-listener".into())
            .spawn(move || {
                let mut held: Vec<Key> = Vec::new();
                let callback_dispatcher = dispatcher.clone();
                let callback_sink = Arc::clone(&sink);
                let result = listen(move |event: Event| match event.event_type {
                    EventType::KeyPress(key) => {
                        // auto-repeat delivers a press per repeat; only the first counts
                        if held.contains(&key) {
                            return;
                        }
                        held.push(key);
                        if let Some(action) = callback_dispatcher.handle_press(key) {
                            tracing::debug!(?key, %action, "hotkey pressed");
                            callback_sink(HotkeyEvent::Action(action));
                        }
                    }
                    EventType::KeyRelease(key) => held.retain(|k| *k != key),
                    _ => {}
                });
                if let Err(err) = result {
                    let msg = HotkeyError::Listener(format!("{err:?}")).to_string();
                    tracing::error!(error = %msg, "global hotkey listener stopped");
                    dispatcher.listening.store(false, Ordering::SeqCst);
                    sink(HotkeyEvent::ListenerFailed(msg));
                }
            });

        if let Err(err) = spawned {
            tracing::error!(error = %err, "could not spawn hotkey listener thread");
            self.listening.store(false, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parse_function_keys_case_insensitive() {
        assert_eq!(parse_key("f6"), Some(Key::F6));
        assert_eq!(parse_key("F12"), Some(Key::F12));
        assert_eq!(parse_key("f13"), None);
        assert_eq!(parse_key("f"), Some(Key::KeyF));
    }

    #[test]
    fn parse_named_and_single_keys() {
        assert_eq!(parse_key("space"), Some(Key::Space));
        assert_eq!(parse_key("Esc"), Some(Key::Escape));
        assert_eq!(parse_key("7"), Some(Key::Num7));
        assert_eq!(parse_key("q"), Some(Key::KeyQ));
        assert_eq!(parse_key(""), None);
        assert_eq!(parse_key("ctrl+f6"), None);
        assert_eq!(parse_key("é"), None);
    }

    #[test]
    fn register_all_with_defaults() {
        let dispatcher = HotkeyDispatcher::new();
        let report = dispatcher.register_all(&Settings::default());
        assert!(report.is_complete());
        assert_eq!(report.registered.len(), 3);
        assert_eq!(dispatcher.resolve(Key::F6), Some(HotkeyAction::StartStop));
        assert_eq!(dispatcher.resolve(Key::F7), Some(HotkeyAction::Pause));
        assert_eq!(dispatcher.resolve(Key::F8), Some(HotkeyAction::EmergencyStop));
        assert_eq!(dispatcher.resolve(Key::F9), None);
    }

    #[test]
    fn failed_key_does_not_block_others() {
        let settings = Settings {
            start_stop_key: "bogus".into(),
            pause_key: "f7".into(),
            emergency_stop_key: "f7".into(),
            ..Settings::default()
        };
        let dispatcher = HotkeyDispatcher::new();
        let report = dispatcher.register_all(&settings);

        assert_eq!(report.registered, vec![(HotkeyAction::Pause, "f7".to_string())]);
        assert_eq!(report.failed.len(), 2);
        assert_matches!(report.failed[0].2, HotkeyError::UnknownKey(_));
        assert_matches!(report.failed[1].2, HotkeyError::Duplicate { .. });
        assert_eq!(dispatcher.resolve(Key::F7), Some(HotkeyAction::Pause));
    }

    #[test]
    fn register_all_replaces_previous_bindings() {
        let dispatcher = HotkeyDispatcher::new();
        dispatcher.register_all(&Settings::default());
        let settings = Settings {
            start_stop_key: "f9".into(),
            ..Settings::default()
        };
        dispatcher.register_all(&settings);
        assert_eq!(dispatcher.resolve(Key::F6), None);
        assert_eq!(dispatcher.resolve(Key::F9), Some(HotkeyAction::StartStop));
    }

    #[test]
    fn presses_are_ignored_while_disarmed() {
        let dispatcher = HotkeyDispatcher::new();
        dispatcher.register_all(&Settings::default());
        assert_eq!(dispatcher.handle_press(Key::F6), None);

        dispatcher.arm();
        assert_eq!(dispatcher.handle_press(Key::F6), Some(HotkeyAction::StartStop));

        dispatcher.disarm();
        assert_eq!(dispatcher.handle_press(Key::F6), None);
    }

    #[test]
    fn action_display_names() {
        assert_eq!(HotkeyAction::StartStop.to_string(), "start/stop");
        assert_eq!(HotkeyAction::EmergencyStop.to_string(), "emergency stop");
    }
}
