use std::sync::Arc;
use std::thread;
use std::time::Duration;

use dialogue_skipper::app::run_event_loop;
use dialogue_skipper::config::Settings;
use dialogue_skipper::console::Console;
use dialogue_skipper::hotkey::{HotkeyAction, HotkeyDispatcher};
use dialogue_skipper::input::MockClickerFactory;
use dialogue_skipper::runtime::{AppEvent, ChannelEventSource, FixedTicker, Runner};
use dialogue_skipper::session::{SessionController, SessionState, StopReason};

// Headless event loop: drives run_event_loop through a channel the way the
// hotkey listener and terminal key thread do, without a TTY.

fn fast_settings() -> Settings {
    Settings {
        click_interval: 0.005,
        ..Settings::default()
    }
}

#[test]
fn hotkeys_drive_the_session_through_the_loop() {
    let factory = MockClickerFactory::new();
    let (tx, source) = ChannelEventSource::channel();
    let notify = tx.clone();
    let controller = SessionController::new(Arc::new(factory.clone()), fast_settings())
        .with_notifier(move |event| {
            let _ = notify.send(AppEvent::Session(event));
        });
    let runner = Runner::new(source, FixedTicker::new(Duration::from_millis(5)));

    let producer = thread::spawn(move || {
        let pause = Duration::from_millis(60);
        for event in [
            AppEvent::Hotkey(HotkeyAction::StartStop),
            AppEvent::Hotkey(HotkeyAction::Pause),
            AppEvent::Hotkey(HotkeyAction::Pause),
            AppEvent::Hotkey(HotkeyAction::StartStop),
            AppEvent::Quit,
        ] {
            thread::sleep(pause);
            tx.send(event).unwrap();
        }
    });

    let mut console = Console::new(Vec::new());
    run_event_loop(&runner, &controller, &mut console).unwrap();
    producer.join().unwrap();

    assert_eq!(controller.state(), SessionState::Ready);
    let summary = controller.last_summary().expect("session summary");
    assert_eq!(summary.reason, StopReason::Cancelled);
    assert!(summary.click_count > 0);

    let out = String::from_utf8(console.into_inner()).unwrap();
    assert!(out.contains("Status: Active"));
    assert!(out.contains("Status: Paused"));
    assert!(out.contains("Session stopped"));
    assert!(out.contains("Status: Ready"));
}

#[test]
fn auto_stop_summary_is_shown_without_any_input() {
    let factory = MockClickerFactory::new();
    let settings = Settings {
        click_interval: 0.01,
        auto_stop_time: 1.0,
        ..Settings::default()
    };
    let (tx, source) = ChannelEventSource::channel();
    let notify = tx.clone();
    let controller = SessionController::new(Arc::new(factory), settings).with_notifier(
        move |event| {
            let _ = notify.send(AppEvent::Session(event));
        },
    );
    let runner = Runner::new(source, FixedTicker::new(Duration::from_millis(10)));

    tx.send(AppEvent::Hotkey(HotkeyAction::StartStop)).unwrap();
    let quitter = thread::spawn(move || {
        thread::sleep(Duration::from_millis(1500));
        tx.send(AppEvent::Quit).unwrap();
    });

    let mut console = Console::new(Vec::new());
    run_event_loop(&runner, &controller, &mut console).unwrap();
    quitter.join().unwrap();

    let out = String::from_utf8(console.into_inner()).unwrap();
    assert!(out.contains("Session auto-stopped"));
    assert_eq!(
        controller.last_summary().map(|s| s.reason),
        Some(StopReason::AutoStop)
    );
}

#[test]
fn listener_failure_is_reported_and_loop_continues() {
    let controller = SessionController::new(Arc::new(MockClickerFactory::new()), fast_settings());
    let (tx, source) = ChannelEventSource::channel();
    let runner = Runner::new(source, FixedTicker::new(Duration::from_millis(5)));

    tx.send(AppEvent::ListenerFailed("no input access".into()))
        .unwrap();
    tx.send(AppEvent::Quit).unwrap();

    let mut console = Console::new(Vec::new());
    run_event_loop(&runner, &controller, &mut console).unwrap();

    let out = String::from_utf8(console.into_inner()).unwrap();
    assert!(out.contains("no input access"));
}

#[test]
fn dispatcher_only_resolves_while_armed() {
    let dispatcher = HotkeyDispatcher::new();
    let report = dispatcher.register_all(&Settings::default());
    assert!(report.is_complete());

    assert_eq!(dispatcher.handle_press(rdev::Key::F6), None);
    dispatcher.arm();
    assert_eq!(
        dispatcher.handle_press(rdev::Key::F6),
        Some(HotkeyAction::StartStop)
    );
    assert_eq!(dispatcher.handle_press(rdev::Key::F7), Some(HotkeyAction::Pause));
    assert_eq!(
        dispatcher.handle_press(rdev::Key::F8),
        Some(HotkeyAction::EmergencyStop)
    );
    assert_eq!(dispatcher.handle_press(rdev::Key::F9), None);
    dispatcher.disarm();
    assert_eq!(dispatcher.handle_press(rdev::Key::F6), None);
}

#[test]
fn registration_continues_past_a_bad_key() {
    let dispatcher = HotkeyDispatcher::new();
    let settings = Settings {
        pause_key: "nonsense".into(),
        ..Settings::default()
    };
    let report = dispatcher.register_all(&settings);

    assert!(!report.is_complete());
    assert_eq!(report.registered.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, HotkeyAction::Pause);
    assert_eq!(dispatcher.resolve(rdev::Key::F8), Some(HotkeyAction::EmergencyStop));
}
