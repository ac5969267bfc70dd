//! A [`Renderer`] without a terminal, for tests and scripted runs.
//!
//! Records every applied update and replays scripted key batches, one batch
//! per frame. It can be told to close after a number of frames.

use std::collections::VecDeque;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};

use crate::state::DisplayState;
use crate::surface::{KeyBatch, Renderer, SurfaceError, MAX_KEYS_PER_FRAME};
use crate::types::{Board, ConnectionStatus, DisplayUpdate};

#[derive(Debug, Default)]
pub struct HeadlessSurface {
    state: DisplayState,
    applied: Vec<DisplayUpdate>,
    script: VecDeque<KeyBatch>,
    frames: usize,
    close_after: Option<usize>,
    realtime: bool,
    reports_release: bool,
    open: bool,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self {
            reports_release: true,
            open: true,
            ..Self::default()
        }
    }

    /// Close the surface once `frames` frames have been pumped.
    pub fn close_after(mut self, frames: usize) -> Self {
        self.close_after = Some(frames);
        self
    }

    /// Sleep for the requested wait in every frame pump.
    pub fn realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    /// Pretend to be a terminal without key release events.
    pub fn without_key_release(mut self) -> Self {
        self.reports_release = false;
        self
    }

    /// Queue key events to be returned by a future frame pump.
    ///
    /// More than [`MAX_KEYS_PER_FRAME`] events spill over into the following
    /// frames, as they would on a terminal.
    pub fn push_keys(&mut self, keys: impl IntoIterator<Item = KeyEvent>) {
        let mut batch = KeyBatch::new();
        for key in keys {
            if batch.is_full() {
                self.script.push_back(std::mem::take(&mut batch));
            }
            batch.push(key);
        }
        self.script.push_back(batch);
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    pub fn applied(&self) -> &[DisplayUpdate] {
        &self.applied
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    fn record(&mut self, update: DisplayUpdate) {
        self.state.apply(&update);
        self.applied.push(update);
    }
}

impl Renderer for HeadlessSurface {
    fn apply_board(&mut self, board: &Board) {
        self.record(DisplayUpdate::Board(*board));
    }

    fn apply_queue_text(&mut self, text: &str) {
        self.record(DisplayUpdate::QueueText(text.to_string()));
    }

    fn apply_hold_text(&mut self, text: &str) {
        self.record(DisplayUpdate::HoldText(text.to_string()));
    }

    fn apply_status(&mut self, status: &ConnectionStatus) {
        self.record(DisplayUpdate::Status(status.clone()));
    }

    fn pump_frame(&mut self, wait: Duration) -> Result<KeyBatch, SurfaceError> {
        if !self.open {
            return Err(SurfaceError::Closed);
        }
        if self.realtime {
            std::thread::sleep(wait);
        }
        self.frames += 1;
        if self.close_after.is_some_and(|n| self.frames >= n) {
            self.open = false;
        }
        Ok(self.script.pop_front().unwrap_or_default())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn reports_key_release(&self) -> bool {
        self.reports_release
    }
}

pub fn press(code: KeyCode) -> KeyEvent {
    key_event(code, KeyEventKind::Press)
}

pub fn release(code: KeyCode) -> KeyEvent {
    key_event(code, KeyEventKind::Release)
}

pub fn key_event(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
    KeyEvent {
        code,
        modifiers: KeyModifiers::NONE,
        kind,
        state: KeyEventState::NONE,
    }
}
