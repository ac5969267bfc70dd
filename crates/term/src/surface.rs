//! The interface the scheduler drives.

use std::time::Duration;

use arrayvec::ArrayVec;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use thiserror::Error;

use crate::types::{Board, ConnectionStatus, DisplayUpdate};

/// Maximum key events returned by one frame pump.
pub const MAX_KEYS_PER_FRAME: usize = 32;

/// Key events captured during one frame.
pub type KeyBatch = ArrayVec<KeyEvent, MAX_KEYS_PER_FRAME>;

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("surface closed")]
    Closed,
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A visible surface that mirrors remote state and captures keys.
///
/// `apply_*` calls only record state; drawing happens in [`pump_frame`].
///
/// [`pump_frame`]: Renderer::pump_frame
pub trait Renderer {
    fn apply_board(&mut self, board: &Board);

    fn apply_queue_text(&mut self, text: &str);

    fn apply_hold_text(&mut self, text: &str);

    fn apply_status(&mut self, status: &ConnectionStatus);

    fn apply(&mut self, update: &DisplayUpdate) {
        match update {
            DisplayUpdate::Board(board) => self.apply_board(board),
            DisplayUpdate::QueueText(text) => self.apply_queue_text(text),
            DisplayUpdate::HoldText(text) => self.apply_hold_text(text),
            DisplayUpdate::Status(status) => self.apply_status(status),
        }
    }

    /// Draw if needed, then collect key events for at most `wait`.
    ///
    /// Returns [`SurfaceError::Closed`] once the surface has been closed.
    fn pump_frame(&mut self, wait: Duration) -> Result<KeyBatch, SurfaceError>;

    fn is_open(&self) -> bool;

    /// False when the surface never reports key releases.
    fn reports_key_release(&self) -> bool {
        true
    }
}

/// Keys that close the window: `q`, `Esc` and `Ctrl-C`.
pub fn is_close_request(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => true,
        KeyCode::Char('c') | KeyCode::Char('C') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}
