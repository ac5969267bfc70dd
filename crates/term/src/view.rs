//! BoardView: maps a [`DisplayState`] into a terminal framebuffer.
//!
//! This module is pure (no I/O). It can be unit-tested.

use crate::fb::{CellStyle, FrameBuffer, Rgb};
use crate::state::DisplayState;
use crate::types::{Board, ConnectionStatus, BOARD_HEIGHT, BOARD_WIDTH};

const FILLED: Rgb = Rgb::new(243, 233, 228);
const EMPTY_BG: Rgb = Rgb::new(49, 52, 86);
const EMPTY_DOT: Rgb = Rgb::new(98, 102, 140);
const BLACK: Rgb = Rgb::new(0, 0, 0);

const HELP: &str = "\u{2190}\u{2192} move  \u{2193} soft  space hard  x/z rotate  a 180  c hold  q quit";

/// Terminal viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

/// Where the board frame landed on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardLayout {
    pub frame_x: u16,
    pub frame_y: u16,
    pub frame_w: u16,
    pub frame_h: u16,
}

/// Draws the mirrored board with hold/queue text on the right.
#[derive(Debug, Clone, Copy)]
pub struct BoardView {
    /// Board cell width in terminal columns.
    cell_w: u16,
    /// Board cell height in terminal rows.
    cell_h: u16,
}

impl Default for BoardView {
    fn default() -> Self {
        // 2x1 compensates for the usual terminal glyph aspect ratio.
        Self {
            cell_w: 2,
            cell_h: 1,
        }
    }
}

impl BoardView {
    pub fn new(cell_w: u16, cell_h: u16) -> Self {
        Self {
            cell_w: cell_w.max(1),
            cell_h: cell_h.max(1),
        }
    }

    pub fn layout(&self, viewport: Viewport) -> BoardLayout {
        let frame_w = (BOARD_WIDTH as u16) * self.cell_w + 2;
        let frame_h = (BOARD_HEIGHT as u16) * self.cell_h + 2;
        BoardLayout {
            frame_x: viewport.width.saturating_sub(frame_w) / 2,
            frame_y: viewport.height.saturating_sub(frame_h) / 2,
            frame_w,
            frame_h,
        }
    }

    /// Render into an existing framebuffer, resizing it to the viewport.
    pub fn render_into(&self, state: &DisplayState, viewport: Viewport, fb: &mut FrameBuffer) {
        fb.resize(viewport.width, viewport.height);
        fb.clear(CellStyle::default().into_cell(' '));

        let layout = self.layout(viewport);
        let border = CellStyle::plain(Rgb::new(200, 200, 200), BLACK);
        self.draw_border(fb, layout, border);
        self.draw_board(fb, layout, &state.board);
        self.draw_side_panel(fb, state, viewport, layout);

        let help_y = layout.frame_y.saturating_add(layout.frame_h);
        if help_y < viewport.height {
            let dim = CellStyle::default().dim();
            fb.put_str(layout.frame_x, help_y, HELP, viewport.width, dim);
        }
    }

    pub fn render(&self, state: &DisplayState, viewport: Viewport) -> FrameBuffer {
        let mut fb = FrameBuffer::new(viewport.width, viewport.height);
        self.render_into(state, viewport, &mut fb);
        fb
    }

    /// Top-left screen position of a board cell. Row 0 is drawn at the bottom.
    pub fn cell_origin(&self, layout: BoardLayout, row: usize, col: usize) -> (u16, u16) {
        let screen_row = (BOARD_HEIGHT - 1 - row.min(BOARD_HEIGHT - 1)) as u16;
        (
            layout.frame_x + 1 + (col as u16) * self.cell_w,
            layout.frame_y + 1 + screen_row * self.cell_h,
        )
    }

    fn draw_board(&self, fb: &mut FrameBuffer, layout: BoardLayout, board: &Board) {
        let filled = CellStyle::plain(FILLED, FILLED);
        let empty = CellStyle::plain(EMPTY_DOT, EMPTY_BG);
        for row in 0..BOARD_HEIGHT {
            for col in 0..BOARD_WIDTH {
                let (x, y) = self.cell_origin(layout, row, col);
                if board.get(row, col) {
                    fb.fill_rect(x, y, self.cell_w, self.cell_h, '\u{2588}', filled);
                } else {
                    fb.fill_rect(x, y, self.cell_w, self.cell_h, ' ', empty);
                    fb.put_char(x, y, '\u{b7}', empty);
                }
            }
        }
    }

    fn draw_border(&self, fb: &mut FrameBuffer, l: BoardLayout, style: CellStyle) {
        let (x, y, w, h) = (l.frame_x, l.frame_y, l.frame_w, l.frame_h);

        fb.put_char(x, y, '┌', style);
        fb.put_char(x + w - 1, y, '┐', style);
        fb.put_char(x, y + h - 1, '└', style);
        fb.put_char(x + w - 1, y + h - 1, '┘', style);

        for dx in 1..w - 1 {
            fb.put_char(x + dx, y, '─', style);
            fb.put_char(x + dx, y + h - 1, '─', style);
        }
        for dy in 1..h - 1 {
            fb.put_char(x, y + dy, '│', style);
            fb.put_char(x + w - 1, y + dy, '│', style);
        }
    }

    fn draw_side_panel(
        &self,
        fb: &mut FrameBuffer,
        state: &DisplayState,
        viewport: Viewport,
        layout: BoardLayout,
    ) {
        let panel_x = layout
            .frame_x
            .saturating_add(layout.frame_w)
            .saturating_add(2);
        if panel_x >= viewport.width {
            return;
        }
        let panel_w = viewport.width - panel_x;
        if panel_w < 8 {
            return;
        }

        let label = CellStyle::default().bold();
        let value = CellStyle::plain(Rgb::new(200, 200, 200), BLACK);

        let mut y = layout.frame_y;
        fb.put_str(panel_x, y, "HOLD", panel_w, label);
        y = y.saturating_add(1);
        fb.put_str(panel_x, y, &state.hold_text, panel_w, value);
        y = y.saturating_add(2);

        fb.put_str(panel_x, y, "QUEUE", panel_w, label);
        y = y.saturating_add(1);
        for line in wrap(&state.queue_text, panel_w as usize).take(4) {
            fb.put_str(panel_x, y, &line, panel_w, value);
            y = y.saturating_add(1);
        }
        y = y.saturating_add(1);

        fb.put_str(panel_x, y, "LINK", panel_w, label);
        y = y.saturating_add(1);
        let (text, style) = match &state.status {
            ConnectionStatus::Waiting => ("waiting".to_string(), value.dim()),
            ConnectionStatus::Connected { peer } => (peer.clone(), value),
            ConnectionStatus::Disconnected => ("disconnected".to_string(), value.dim()),
        };
        fb.put_str(panel_x, y, &text, panel_w, style);
    }
}

/// Split `text` into chunks of at most `width` characters.
fn wrap(text: &str, width: usize) -> impl Iterator<Item = String> + '_ {
    let chars: Vec<char> = text.trim_end().chars().collect();
    let width = width.max(1);
    (0..chars.len())
        .step_by(width)
        .map(move |start| chars[start..(start + width).min(chars.len())].iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport::new(60, 24)
    }

    #[test]
    fn bottom_row_is_drawn_last() {
        let view = BoardView::default();
        let mut state = DisplayState::default();
        state.board.set(0, 0, true);
        state.board.set(19, 9, true);

        let fb = view.render(&state, viewport());
        let layout = view.layout(viewport());

        let (bx, by) = view.cell_origin(layout, 0, 0);
        assert_eq!(by, layout.frame_y + layout.frame_h - 2);
        assert_eq!(fb.get(bx, by).map(|c| c.ch), Some('\u{2588}'));

        let (tx, ty) = view.cell_origin(layout, 19, 9);
        assert_eq!(ty, layout.frame_y + 1);
        assert_eq!(fb.get(tx, ty).map(|c| c.ch), Some('\u{2588}'));
        assert_eq!(fb.get(tx + 1, ty).map(|c| c.ch), Some('\u{2588}'));
    }

    #[test]
    fn empty_cells_show_a_dot() {
        let view = BoardView::default();
        let fb = view.render(&DisplayState::default(), viewport());
        let (x, y) = view.cell_origin(view.layout(viewport()), 10, 4);
        let cell = fb.get(x, y).unwrap();
        assert_eq!(cell.ch, '\u{b7}');
        assert_eq!(cell.style.bg, EMPTY_BG);
    }

    #[test]
    fn side_panel_shows_texts_and_status() {
        let view = BoardView::default();
        let mut state = DisplayState::default();
        state.hold_text = "T".into();
        state.queue_text = "I O L".into();
        state.status = ConnectionStatus::Connected {
            peer: "127.0.0.1:40000".into(),
        };

        let fb = view.render(&state, viewport());
        let screen: Vec<String> = (0..fb.height()).map(|y| fb.line(y)).collect();
        let screen = screen.join("\n");
        assert!(screen.contains("HOLD"));
        assert!(screen.contains("I O L"));
        assert!(screen.contains("127.0.0.1:40000"));
    }

    #[test]
    fn tiny_viewport_does_not_panic() {
        let view = BoardView::default();
        let fb = view.render(&DisplayState::default(), Viewport::new(5, 3));
        assert_eq!((fb.width(), fb.height()), (5, 3));
    }

    #[test]
    fn wrap_splits_long_queue_text() {
        let lines: Vec<String> = wrap("abcdefgh", 3).collect();
        assert_eq!(lines, vec!["abc", "def", "gh"]);
        assert_eq!(wrap("", 3).count(), 0);
    }
}
