//! Terminal input module (network-facing).
//!
//! This module is intentionally independent of any UI framework beyond
//! `crossterm` key codes. It maps key events into
//! [`Command`](crate::types::Command)s, tracks the held directional key for
//! DAS, and hands every command to the network side through an awaitable
//! FIFO queue.

pub mod handler;
pub mod map;
pub mod queue;
pub mod repeat;

pub use remote_tetris_types as types;

pub use handler::{HeldKey, InputMapper};
pub use map::{direction_of, map_key};
pub use queue::InputQueue;
pub use repeat::AutoRepeatTimer;
