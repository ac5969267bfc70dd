//! Board decoding - pure, deterministic, and testable
//!
//! The display never runs game rules; it only mirrors the board the remote
//! authority sends. This crate turns those wire payloads into a
//! [`Board`](remote_tetris_types::Board) and back. It has no dependencies on
//! UI, networking, or I/O.
//!
//! # Example
//!
//! ```
//! use remote_tetris_core::{decode, encode, BoardFormat};
//! use remote_tetris_types::Board;
//!
//! let mut board = Board::new();
//! board.set(0, 4, true);
//!
//! let wire = encode(&board, BoardFormat::ColumnBits);
//! assert_eq!(decode(&wire).unwrap(), board);
//! ```

pub mod codec;

pub use remote_tetris_types as types;

pub use codec::{decode, decode_value, encode, encode_value, BoardFormat, CodecError};
