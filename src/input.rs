//! Input injection. The click task owns its [`Clicker`] on its own thread,
//! so backends only need to be constructible from a [`ClickerFactory`].

use crate::error::ClickError;
use enigo::{Button, Coordinate, Direction, Enigo, Mouse, Settings as EnigoSettings};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub trait Clicker {
    /// Moves the pointer to `(x, y)` and issues one left click.
    fn click(&mut self, x: i32, y: i32) -> Result<(), ClickError>;
    fn screen_size(&self) -> Result<(i32, i32), ClickError>;
}

pub trait ClickerFactory: Send + Sync + 'static {
    fn create(&self) -> Result<Box<dyn Clicker>, ClickError>;

    fn screen_size(&self) -> Result<(i32, i32), ClickError> {
        self.create()?.screen_size()
    }
}

/// True when `pos` sits on one of the four corners of a `size` screen.
pub fn is_fail_safe_corner(pos: (i32, i32), size: (i32, i32)) -> bool {
    let (x, y) = pos;
    let (w, h) = size;
    let at_x_edge = x <= 0 || x >= w - 1;
    let at_y_edge = y <= 0 || y >= h - 1;
    at_x_edge && at_y_edge
}

pub struct EnigoClicker {
    enigo: Enigo,
    fail_safe: bool,
}

impl EnigoClicker {
    pub fn new(fail_safe: bool) -> Result<Self, ClickError> {
        let enigo = Enigo::new(&EnigoSettings::default())
            .map_err(|e| ClickError::Backend(e.to_string()))?;
        tracing::debug!(fail_safe, "input backend initialised");
        Ok(Self { enigo, fail_safe })
    }

    fn check_fail_safe(&self) -> Result<(), ClickError> {
        let pos = self
            .enigo
            .location()
            .map_err(|e| ClickError::Injection(e.to_string()))?;
        let size = self.screen_size()?;
        if is_fail_safe_corner(pos, size) {
            return Err(ClickError::FailSafe { x: pos.0, y: pos.1 });
        }
        Ok(())
    }
}

impl Clicker for EnigoClicker {
    fn click(&mut self, x: i32, y: i32) -> Result<(), ClickError> {
        if self.fail_safe {
            self.check_fail_safe()?;
        }
        self.enigo
            .move_mouse(x, y, Coordinate::Abs)
            .map_err(|e| ClickError::Injection(e.to_string()))?;
        self.enigo
            .button(Button::Left, Direction::Click)
            .map_err(|e| ClickError::Injection(e.to_string()))
    }

    fn screen_size(&self) -> Result<(i32, i32), ClickError> {
        self.enigo
            .main_display()
            .map_err(|e| ClickError::ScreenSize(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EnigoFactory {
    pub fail_safe: bool,
}

impl Default for EnigoFactory {
    fn default() -> Self {
        Self { fail_safe: true }
    }
}

impl ClickerFactory for EnigoFactory {
    fn create(&self) -> Result<Box<dyn Clicker>, ClickError> {
        Ok(Box::new(EnigoClicker::new(self.fail_safe)?))
    }
}

/// In-memory backend for headless tests. Clones share counters.
#[derive(Debug, Clone)]
pub struct MockClickerFactory {
    clicks: Arc<AtomicU64>,
    last_position: Arc<Mutex<Option<(i32, i32)>>>,
    fail_after: Option<u64>,
    fail_create: bool,
    screen: (i32, i32),
}

impl Default for MockClickerFactory {
    fn default() -> Self {
        Self {
            clicks: Arc::new(AtomicU64::new(0)),
            last_position: Arc::new(Mutex::new(None)),
            fail_after: None,
            fail_create: false,
            screen: (1920, 1080),
        }
    }
}

impl MockClickerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_screen(mut self, width: i32, height: i32) -> Self {
        self.screen = (width, height);
        self
    }

    /// Every click after the first `n` successful ones fails.
    pub fn failing_after(mut self, n: u64) -> Self {
        self.fail_after = Some(n);
        self
    }

    pub fn failing_to_start(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn clicks(&self) -> u64 {
        self.clicks.load(Ordering::SeqCst)
    }

    pub fn last_position(&self) -> Option<(i32, i32)> {
        *self.last_position.lock()
    }
}

impl ClickerFactory for MockClickerFactory {
    fn create(&self) -> Result<Box<dyn Clicker>, ClickError> {
        if self.fail_create {
            return Err(ClickError::Backend("mock backend unavailable".into()));
        }
        Ok(Box::new(MockClicker {
            factory: self.clone(),
        }))
    }
}

struct MockClicker {
    factory: MockClickerFactory,
}

impl Clicker for MockClicker {
    fn click(&mut self, x: i32, y: i32) -> Result<(), ClickError> {
        if let Some(limit) = self.factory.fail_after {
            if self.factory.clicks() >= limit {
                return Err(ClickError::Injection("mock injection failure".into()));
            }
        }
        self.factory.clicks.fetch_add(1, Ordering::SeqCst);
        *self.factory.last_position.lock() = Some((x, y));
        Ok(())
    }

    fn screen_size(&self) -> Result<(i32, i32), ClickError> {
        Ok(self.factory.screen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn corners_trigger_fail_safe() {
        let size = (1920, 1080);
        assert!(is_fail_safe_corner((0, 0), size));
        assert!(is_fail_safe_corner((1919, 0), size));
        assert!(is_fail_safe_corner((0, 1079), size));
        assert!(is_fail_safe_corner((1919, 1079), size));
    }

    #[test]
    fn edges_and_interior_do_not_trigger_fail_safe() {
        let size = (1920, 1080);
        assert!(!is_fail_safe_corner((0, 500), size));
        assert!(!is_fail_safe_corner((960, 0), size));
        assert!(!is_fail_safe_corner((1350, 750), size));
    }

    #[test]
    fn mock_counts_clicks_across_clones() {
        let factory = MockClickerFactory::new();
        let mut clicker = factory.create().unwrap();
        clicker.click(10, 20).unwrap();
        clicker.click(30, 40).unwrap();
        assert_eq!(factory.clicks(), 2);
        assert_eq!(factory.last_position(), Some((30, 40)));
    }

    #[test]
    fn mock_fails_after_limit() {
        let factory = MockClickerFactory::new().failing_after(1);
        let mut clicker = factory.create().unwrap();
        assert!(clicker.click(1, 1).is_ok());
        assert_matches!(clicker.click(1, 1), Err(ClickError::Injection(_)));
        assert_eq!(factory.clicks(), 1);
    }

    #[test]
    fn mock_reports_screen_size_through_factory() {
        let factory = MockClickerFactory::new().with_screen(1280, 720);
        assert_eq!(factory.screen_size().unwrap(), (1280, 720));

        let broken = MockClickerFactory::new().failing_to_start();
        assert_matches!(broken.screen_size(), Err(ClickError::Backend(_)));
    }
}
