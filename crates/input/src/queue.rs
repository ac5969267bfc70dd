//! FIFO handoff between input producers and the network consumer.
//!
//! Producers (key presses, the auto-repeat timer) run on the render thread
//! and must never block; the consumer is a connection task that awaits the
//! next command without spinning.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::types::{Command, DEFAULT_REPEAT_CAPACITY};

#[derive(Debug)]
pub struct InputQueue {
    items: Mutex<VecDeque<Command>>,
    notify: Notify,
    repeat_capacity: usize,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::with_repeat_capacity(DEFAULT_REPEAT_CAPACITY)
    }

    /// `repeat_capacity` is the queue length at which auto-repeat commands
    /// start being coalesced away.
    pub fn with_repeat_capacity(repeat_capacity: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::with_capacity(64)),
            notify: Notify::new(),
            repeat_capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Command>> {
        // A panicking producer cannot leave the deque half-written.
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a command. Never blocks, never fails.
    pub fn enqueue(&self, cmd: Command) {
        self.lock().push_back(cmd);
        self.notify.notify_one();
    }

    /// Append an auto-repeat command unless the consumer has fallen behind.
    ///
    /// Returns false when the command was coalesced away.
    pub fn enqueue_repeat(&self, cmd: Command) -> bool {
        {
            let mut items = self.lock();
            if items.len() >= self.repeat_capacity {
                log::trace!("coalesced {} ({} commands pending)", cmd, items.len());
                return false;
            }
            items.push_back(cmd);
        }
        self.notify.notify_one();
        true
    }

    /// Put a command back at the head, e.g. when its reply could not be sent.
    pub fn requeue_front(&self, cmd: Command) {
        self.lock().push_front(cmd);
        self.notify.notify_one();
    }

    pub fn try_dequeue(&self) -> Option<Command> {
        self.lock().pop_front()
    }

    /// Wait for the next command.
    ///
    /// Cancel safe: a command is only removed in the same poll that returns
    /// it, so dropping the future never loses input.
    pub async fn dequeue(&self) -> Command {
        loop {
            let notified = self.notify.notified();
            if let Some(cmd) = self.try_dequeue() {
                return cmd;
            }
            notified.await;
        }
    }

    /// Drop every pending command; returns how many were discarded.
    pub fn clear(&self) -> usize {
        let mut items = self.lock();
        let n = items.len();
        items.clear();
        n
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Vec<Command> {
        self.lock().iter().copied().collect()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}
