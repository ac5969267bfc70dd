//! Auto-repeat (DAS) timer.
//!
//! Polled from the render loop. Once a directional key has been held for
//! longer than the DAS delay, every tick enqueues one `DasLeft`/`DasRight`
//! until the key is released. The timer reads hold state but never changes it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::handler::HeldKey;
use crate::queue::InputQueue;
use crate::types::{Command, DEFAULT_DAS_MS, TICK_MS};

#[derive(Debug)]
pub struct AutoRepeatTimer {
    queue: Arc<InputQueue>,
    das: Duration,
    interval: Duration,
    last_tick: Option<Instant>,
}

impl AutoRepeatTimer {
    pub fn new(queue: Arc<InputQueue>) -> Self {
        Self::with_config(
            queue,
            Duration::from_millis(DEFAULT_DAS_MS as u64),
            Duration::from_millis(TICK_MS as u64),
        )
    }

    /// A `das` of zero repeats from the first tick after the press.
    pub fn with_config(queue: Arc<InputQueue>, das: Duration, interval: Duration) -> Self {
        Self {
            queue,
            das,
            interval,
            last_tick: None,
        }
    }

    /// Run a tick if at least one interval has passed since the last one.
    ///
    /// The render loop may call this more often than the tick rate.
    pub fn poll(&mut self, held: Option<HeldKey>, now: Instant) -> Option<Command> {
        if let Some(last) = self.last_tick {
            if now.saturating_duration_since(last) < self.interval {
                return None;
            }
        }
        self.last_tick = Some(now);
        self.tick(held, now)
    }

    /// Unconditional tick. Returns the command that was enqueued, if any.
    pub fn tick(&mut self, held: Option<HeldKey>, now: Instant) -> Option<Command> {
        let held = held?;
        if now.saturating_duration_since(held.since) <= self.das {
            return None;
        }
        let cmd = Command::das(held.direction);
        self.queue.enqueue_repeat(cmd).then_some(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;

    fn held(direction: Direction, since: Instant) -> Option<HeldKey> {
        Some(HeldKey { direction, since })
    }

    #[test]
    fn test_no_repeat_without_hold() {
        let q = Arc::new(InputQueue::new());
        let mut timer = AutoRepeatTimer::new(Arc::clone(&q));
        assert_eq!(timer.tick(None, Instant::now()), None);
        assert!(q.is_empty());
    }

    #[test]
    fn test_repeats_only_after_das_threshold() {
        let q = Arc::new(InputQueue::new());
        let mut timer = AutoRepeatTimer::with_config(
            Arc::clone(&q),
            Duration::from_millis(100),
            Duration::from_millis(50),
        );
        let t0 = Instant::now();
        let h = held(Direction::Left, t0);

        assert_eq!(timer.tick(h, t0 + Duration::from_millis(50)), None);
        // Exactly at DAS: not yet exceeded.
        assert_eq!(timer.tick(h, t0 + Duration::from_millis(100)), None);
        assert_eq!(timer.tick(h, t0 + Duration::from_millis(150)), Some(Command::DasLeft));
        assert_eq!(timer.tick(h, t0 + Duration::from_millis(200)), Some(Command::DasLeft));
        assert_eq!(q.snapshot(), vec![Command::DasLeft, Command::DasLeft]);
    }

    #[test]
    fn test_zero_das_repeats_from_first_tick() {
        let q = Arc::new(InputQueue::new());
        let mut timer =
            AutoRepeatTimer::with_config(Arc::clone(&q), Duration::ZERO, Duration::from_millis(50));
        let t0 = Instant::now();
        let h = held(Direction::Right, t0);
        assert_eq!(timer.tick(h, t0 + Duration::from_millis(50)), Some(Command::DasRight));
    }

    #[test]
    fn test_poll_fires_at_most_once_per_interval() {
        let q = Arc::new(InputQueue::new());
        let mut timer = AutoRepeatTimer::with_config(
            Arc::clone(&q),
            Duration::ZERO,
            Duration::from_millis(50),
        );
        let t0 = Instant::now();
        let h = held(Direction::Right, t0);

        assert_eq!(timer.poll(h, t0 + Duration::from_millis(10)), Some(Command::DasRight));
        assert_eq!(timer.poll(h, t0 + Duration::from_millis(30)), None);
        assert_eq!(timer.poll(h, t0 + Duration::from_millis(59)), None);
        assert_eq!(timer.poll(h, t0 + Duration::from_millis(60)), Some(Command::DasRight));
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn test_coalesced_repeat_reports_none() {
        let q = Arc::new(InputQueue::with_repeat_capacity(1));
        q.enqueue(Command::HardDrop);
        let mut timer =
            AutoRepeatTimer::with_config(Arc::clone(&q), Duration::ZERO, Duration::from_millis(50));
        let t0 = Instant::now();
        assert_eq!(timer.tick(held(Direction::Left, t0), t0 + Duration::from_millis(50)), None);
        assert_eq!(q.snapshot(), vec![Command::HardDrop]);
    }
}
