//! Adapter module - the authority link over WebSocket
//!
//! The display does not run the game. A remote authority connects to it,
//! pushes the board and auxiliary text, and receives one player command per
//! board in return.
//!
//! # Protocol Overview
//!
//! 1. **Connection**: the authority connects to `ws://127.0.0.1:5678`
//!    (configurable). The first connection of a session clears stale input.
//! 2. **State**: the authority sends board, queue and hold frames
//! 3. **Reply**: every board frame is answered with exactly one command,
//!    sent as soon as the player has produced one
//!
//! # Message Types
//!
//! ## Authority → Display
//!
//! - **board**: `{"kind":"board","payload":<board>}` where `<board>` is any
//!   encoding the [`core`] codec understands
//! - **queue**: `{"kind":"queue","payload":"T I O"}`
//! - **hold**: `{"kind":"hold","payload":"S"}` (`"hold"` is accepted in
//!   place of `"payload"`)
//!
//! Untagged frames are still accepted: boards are recognised by shape and
//! anything else by length (more than 50 chars is a board, more than 5 is
//! queue text, the rest is hold text).
//!
//! ## Display → Authority
//!
//! - **reply**: `{"contents":"RotateCW"}`
//!
//! # Environment Variables
//!
//! - `TETRIS_DISPLAY_HOST`: Bind address (default: "127.0.0.1")
//! - `TETRIS_DISPLAY_PORT`: Port number (default: 5678)
//! - `TETRIS_DISPLAY_LOG_PATH`: Append raw frames to this file
//!
//! # Example Protocol Flow
//!
//! ```text
//! Authority -> Display: {"kind":"queue","payload":"T I O L J"}
//! Authority -> Display: {"kind":"hold","payload":"S"}
//! Authority -> Display: {"kind":"board","payload":{"info":"[0,0,1,3,0,0,0,0,0,0]"}}
//! Display -> Authority: {"contents":"HardDrop"}
//! ```
//!
//! # Implementation
//!
//! - See [`protocol`] for frame classification and the reply format
//! - See [`server`] for the listener and per-connection relay
//! - See [`runtime`] for the bridge to the synchronous render loop

pub mod protocol;
pub mod runtime;
pub mod server;

pub use remote_tetris_core as core;
pub use remote_tetris_input as input;
pub use remote_tetris_types as types;

pub use protocol::{
    encode_reply, parse_inbound, parse_reply, CommandName, Envelope, InboundMessage, MessageKind,
    ProtocolError, Reply,
};
pub use runtime::NetworkBridge;
pub use server::{
    handle_connection, run_server, ConnectionContext, ConnectionError, ServerConfig, SessionStats,
    WireRecord,
};
