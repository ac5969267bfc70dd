//! Shared types - board grid, commands and timing constants
//!
//! Every type in this crate is plain data with no external dependencies, so it
//! can be shared by the codec, the input pipeline, the network adapter and the
//! terminal surface alike.
//!
//! # Board Orientation
//!
//! The playfield is 10 columns by 20 rows. **Row 0 is the bottom-most visible
//! row** and row 19 the top-most; column 0 is the left-most column. The codec
//! and the terminal surface both follow this convention.
//!
//! # Timing Constants
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `TICK_MS` | 50 | Render pump / auto-repeat cadence (20 Hz) |
//! | `DEFAULT_DAS_MS` | 150 | Hold time before DAS repeats start |
//! | `DEFAULT_KEY_RELEASE_TIMEOUT_MS` | 150 | Synthetic release for terminals without release events |
//!
//! # Examples
//!
//! ```
//! use remote_tetris_types::{Board, Command, BOARD_HEIGHT, BOARD_WIDTH};
//!
//! let mut board = Board::new();
//! board.set(19, 0, true);
//! assert!(board.get(19, 0));
//! assert_eq!(board.filled_count(), 1);
//!
//! assert_eq!(Command::from_str("RotateCW"), Some(Command::RotateCw));
//! assert_eq!(Command::DasLeft.as_str(), "DasLeft");
//!
//! assert_eq!(BOARD_WIDTH, 10);
//! assert_eq!(BOARD_HEIGHT, 20);
//! ```

use std::fmt;

/// Board width in cells (10 columns)
pub const BOARD_WIDTH: usize = 10;

/// Board height in cells (20 visible rows)
pub const BOARD_HEIGHT: usize = 20;

/// Total number of cells on the board.
pub const BOARD_CELLS: usize = BOARD_WIDTH * BOARD_HEIGHT;

/// Render pump and auto-repeat tick interval (50ms = 20 Hz)
pub const TICK_MS: u32 = 50;

/// DAS (Delayed Auto Shift) delay in milliseconds.
pub const DEFAULT_DAS_MS: u32 = 150;

/// Release timeout used when the terminal cannot report key releases.
pub const DEFAULT_KEY_RELEASE_TIMEOUT_MS: u32 = 150;

/// Queue length at which auto-repeat commands start being coalesced.
pub const DEFAULT_REPEAT_CAPACITY: usize = 64;

/// Port the display listens on for the authority.
pub const DEFAULT_PORT: u16 = 5678;


/// Game commands the display can send to the authority.
///
/// The wire names are fixed by the protocol and are case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Move piece one cell left
    MoveLeft,
    /// Move piece one cell right
    MoveRight,
    /// Drop piece one cell
    SoftDrop,
    /// Drop piece to the lowest valid position
    HardDrop,
    /// Rotate 90° clockwise
    RotateCw,
    /// Rotate 90° counter-clockwise
    RotateCcw,
    /// Rotate 180°
    Rotate180,
    /// Swap the active piece with the held piece
    HoldPiece,
    /// Auto-repeat of `MoveLeft` after DAS
    DasLeft,
    /// Auto-repeat of `MoveRight` after DAS
    DasRight,
}

impl Command {
    pub const ALL: [Command; 10] = [
        Command::MoveLeft,
        Command::MoveRight,
        Command::SoftDrop,
        Command::HardDrop,
        Command::RotateCw,
        Command::RotateCcw,
        Command::Rotate180,
        Command::HoldPiece,
        Command::DasLeft,
        Command::DasRight,
    ];

    /// Parse a wire name (exact match).
    ///
    /// # Examples
    ///
    /// ```
    /// use remote_tetris_types::Command;
    ///
    /// assert_eq!(Command::from_str("HardDrop"), Some(Command::HardDrop));
    /// assert_eq!(Command::from_str("hardDrop"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        Command::ALL.into_iter().find(|c| c.as_str() == s)
    }

    /// Wire name of the command.
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::MoveLeft => "MoveLeft",
            Command::MoveRight => "MoveRight",
            Command::SoftDrop => "SoftDrop",
            Command::HardDrop => "HardDrop",
            Command::RotateCw => "RotateCW",
            Command::RotateCcw => "RotateCCW",
            Command::Rotate180 => "Rotate180",
            Command::HoldPiece => "HoldPiece",
            Command::DasLeft => "DasLeft",
            Command::DasRight => "DasRight",
        }
    }

    /// The DAS repeat command for a held direction.
    pub fn das(direction: Direction) -> Self {
        match direction {
            Direction::Left => Command::DasLeft,
            Direction::Right => Command::DasRight,
        }
    }

    /// True for commands synthesized by the auto-repeat timer.
    pub fn is_repeat(&self) -> bool {
        matches!(self, Command::DasLeft | Command::DasRight)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Horizontal direction of a held key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
}

/// Filled/empty state of every visible cell.
///
/// Indexed as `cells[row][col]` with row 0 at the bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Board {
    cells: [[bool; BOARD_WIDTH]; BOARD_HEIGHT],
}

impl Board {
    /// Create an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a board from bottom-up rows.
    pub fn from_rows(cells: [[bool; BOARD_WIDTH]; BOARD_HEIGHT]) -> Self {
        Self { cells }
    }

    /// Cell state; out-of-range coordinates read as empty.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> bool {
        self.cells
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(false)
    }

    /// Set a cell; out-of-range coordinates are ignored.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, filled: bool) {
        if let Some(cell) = self.cells.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = filled;
        }
    }

    /// Bottom-up rows.
    pub fn rows(&self) -> &[[bool; BOARD_WIDTH]; BOARD_HEIGHT] {
        &self.cells
    }

    pub fn filled_count(&self) -> usize {
        self.cells.iter().flatten().filter(|&&c| c).count()
    }

    pub fn is_empty(&self) -> bool {
        self.filled_count() == 0
    }
}

/// Connection state shown by the display.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConnectionStatus {
    /// Listening, no authority connected yet
    Waiting,
    /// An authority is connected
    Connected { peer: String },
    /// The last authority went away
    Disconnected,
}

/// State pushed from the network side to the render side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayUpdate {
    Board(Board),
    QueueText(String),
    HoldText(String),
    Status(ConnectionStatus),
}
