//! Key press/release handling and held-key tracking for DAS.
//!
//! Supports terminals that do not emit key release events by using a timeout.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use crate::map::{direction_of, map_key};
use crate::queue::InputQueue;
use crate::types::{Command, Direction};

/// The directional key currently held and when the hold started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeldKey {
    pub direction: Direction,
    pub since: Instant,
}

/// Turns key events into queued commands.
#[derive(Debug)]
pub struct InputMapper {
    queue: Arc<InputQueue>,
    held: Option<HeldKey>,
    last_directional_press: Option<Instant>,
    key_release_timeout: Option<Duration>,
}

impl InputMapper {
    pub fn new(queue: Arc<InputQueue>) -> Self {
        Self {
            queue,
            held: None,
            last_directional_press: None,
            key_release_timeout: None,
        }
    }

    /// Release a held key automatically after `timeout` without presses.
    ///
    /// Only needed when the terminal never reports releases.
    pub fn with_key_release_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.key_release_timeout = timeout;
        self
    }

    pub fn held(&self) -> Option<HeldKey> {
        self.held
    }

    /// Handle a key press; mapped keys enqueue their command exactly once.
    pub fn on_key_press(&mut self, code: KeyCode, now: Instant) -> Option<Command> {
        let cmd = map_key(code)?;

        if let Some(direction) = direction_of(code) {
            // A repeated press of the held direction keeps the hold start so
            // DAS still accrues; any other direction takes over the hold.
            match self.held {
                Some(held) if held.direction == direction => {}
                _ => {
                    self.held = Some(HeldKey {
                        direction,
                        since: now,
                    })
                }
            }
            self.last_directional_press = Some(now);
        }

        self.queue.enqueue(cmd);
        Some(cmd)
    }

    /// Handle a key release; only the currently held key can clear the hold.
    pub fn on_key_release(&mut self, code: KeyCode) {
        let Some(direction) = direction_of(code) else {
            return;
        };
        if self.held.map(|h| h.direction) == Some(direction) {
            self.held = None;
        }
    }

    /// Apply the release timeout. Returns true if a hold was cleared.
    pub fn expire_stale(&mut self, now: Instant) -> bool {
        let (Some(timeout), Some(last)) = (self.key_release_timeout, self.last_directional_press)
        else {
            return false;
        };
        if self.held.is_some() && now.saturating_duration_since(last) > timeout {
            self.held = None;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> (InputMapper, Arc<InputQueue>) {
        let q = Arc::new(InputQueue::new());
        (InputMapper::new(Arc::clone(&q)), q)
    }

    #[test]
    fn test_mapped_press_enqueues_once() {
        let (mut m, q) = mapper();
        let t0 = Instant::now();

        assert_eq!(m.on_key_press(KeyCode::Char('x'), t0), Some(Command::RotateCw));
        assert_eq!(m.on_key_press(KeyCode::Char('z'), t0), Some(Command::RotateCcw));
        assert_eq!(q.snapshot(), vec![Command::RotateCw, Command::RotateCcw]);
    }

    #[test]
    fn test_unmapped_press_is_silent() {
        let (mut m, q) = mapper();
        assert_eq!(m.on_key_press(KeyCode::Char('p'), Instant::now()), None);
        assert!(q.is_empty());
        assert_eq!(m.held(), None);
    }

    #[test]
    fn test_last_pressed_direction_wins() {
        let (mut m, _q) = mapper();
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_millis(30);

        m.on_key_press(KeyCode::Left, t0);
        m.on_key_press(KeyCode::Right, t1);
        assert_eq!(
            m.held(),
            Some(HeldKey {
                direction: Direction::Right,
                since: t1
            })
        );

        // Stale release of the first key must not clear the newer hold.
        m.on_key_release(KeyCode::Left);
        assert_eq!(m.held().map(|h| h.direction), Some(Direction::Right));

        m.on_key_release(KeyCode::Right);
        assert_eq!(m.held(), None);
    }

    #[test]
    fn test_non_directional_keys_do_not_touch_hold() {
        let (mut m, _q) = mapper();
        let t0 = Instant::now();
        m.on_key_press(KeyCode::Left, t0);
        m.on_key_press(KeyCode::Char(' '), t0 + Duration::from_millis(10));
        m.on_key_release(KeyCode::Char(' '));
        assert_eq!(m.held().map(|h| h.since), Some(t0));
    }

    #[test]
    fn test_release_timeout_expires_hold() {
        let (m, _q) = mapper();
        let mut m = m.with_key_release_timeout(Some(Duration::from_millis(50)));
        let t0 = Instant::now();

        m.on_key_press(KeyCode::Right, t0);
        assert!(!m.expire_stale(t0 + Duration::from_millis(50)));
        assert!(m.held().is_some());
        assert!(m.expire_stale(t0 + Duration::from_millis(51)));
        assert_eq!(m.held(), None);
    }

    #[test]
    fn test_without_timeout_hold_never_expires() {
        let (mut m, _q) = mapper();
        let t0 = Instant::now();
        m.on_key_press(KeyCode::Left, t0);
        assert!(!m.expire_stale(t0 + Duration::from_secs(60)));
        assert!(m.held().is_some());
    }

    #[test]
    fn test_repeated_press_keeps_hold_start() {
        let (m, q) = mapper();
        let mut m = m.with_key_release_timeout(Some(Duration::from_millis(150)));
        let t0 = Instant::now();
        let at = |ms: u64| t0 + Duration::from_millis(ms);

        m.on_key_press(KeyCode::Left, at(0));
        m.on_key_press(KeyCode::Left, at(100));
        m.on_key_press(KeyCode::Left, at(200));
        assert_eq!(m.held().map(|h| h.since), Some(at(0)));

        // Presses refresh the release clock.
        assert!(!m.expire_stale(at(300)));
        assert_eq!(q.snapshot(), vec![Command::MoveLeft; 3]);

        m.on_key_press(KeyCode::Right, at(250));
        assert_eq!(m.held().map(|h| h.since), Some(at(250)));
    }
}
