//! Remote Tetris display (workspace facade crate).
//!
//! The implementation lives in dedicated crates under `crates/`; this crate
//! re-exports them as `remote_tetris::{adapter,core,input,term,types}` and
//! adds the [`scheduler`] that ties the render loop to the network side.

pub mod scheduler;

pub use remote_tetris_adapter as adapter;
pub use remote_tetris_core as core;
pub use remote_tetris_input as input;
pub use remote_tetris_term as term;
pub use remote_tetris_types as types;

pub use scheduler::{DisplayConfig, ReleaseTimeout, Scheduler, StepOutcome, UpdateSource};
