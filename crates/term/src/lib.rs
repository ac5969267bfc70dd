//! Terminal display surface.
//!
//! A small, game-oriented rendering layer. It avoids widget/layout
//! frameworks and renders the mirrored board into a framebuffer that is
//! flushed to the terminal as a diff.
//!
//! - [`Renderer`] is the interface the scheduler drives
//! - [`TerminalSurface`] implements it on a real terminal
//! - [`HeadlessSurface`] implements it in memory for tests

pub mod fb;
pub mod headless;
pub mod state;
pub mod surface;
pub mod terminal;
pub mod throttle;
pub mod view;

pub use remote_tetris_types as types;

pub use fb::{Cell, CellStyle, FrameBuffer, Rgb};
pub use headless::HeadlessSurface;
pub use state::DisplayState;
pub use surface::{is_close_request, KeyBatch, Renderer, SurfaceError, MAX_KEYS_PER_FRAME};
pub use terminal::{encode_diff_into, encode_full_into, TerminalSurface};
pub use throttle::RenderThrottle;
pub use view::{BoardLayout, BoardView, Viewport};
