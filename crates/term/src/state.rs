//! What the surface currently shows.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::types::{Board, ConnectionStatus, DisplayUpdate};

/// Last applied board, auxiliary texts and link status.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DisplayState {
    pub board: Board,
    pub queue_text: String,
    pub hold_text: String,
    pub status: ConnectionStatus,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            board: Board::new(),
            queue_text: "Queue: ".to_string(),
            hold_text: "None".to_string(),
            status: ConnectionStatus::Waiting,
        }
    }
}

impl DisplayState {
    /// Replace the part of the state the update names.
    pub fn apply(&mut self, update: &DisplayUpdate) {
        match update {
            DisplayUpdate::Board(board) => self.board = *board,
            DisplayUpdate::QueueText(text) => self.queue_text.clone_from(text),
            DisplayUpdate::HoldText(text) => self.hold_text.clone_from(text),
            DisplayUpdate::Status(status) => self.status = status.clone(),
        }
    }

    /// In-process hash used to skip redundant redraws.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}
