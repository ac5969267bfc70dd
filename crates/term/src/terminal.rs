//! TerminalSurface: the crossterm-backed [`Renderer`].
//!
//! Frames are rendered into a [`FrameBuffer`] and flushed as a diff against
//! the previous frame. When the terminal supports the kitty keyboard
//! protocol, key release events are requested so held keys end precisely.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    cursor,
    event::{
        self, Event, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal, QueueableCommand,
};

use crate::fb::{CellStyle, FrameBuffer, Rgb};
use crate::state::DisplayState;
use crate::surface::{is_close_request, KeyBatch, Renderer, SurfaceError};
use crate::throttle::RenderThrottle;
use crate::types::{Board, ConnectionStatus};
use crate::view::{BoardView, Viewport};

/// Repaint interval when nothing changed.
const STATIC_REPAINT_MS: u64 = 250;

pub struct TerminalSurface {
    stdout: io::Stdout,
    buf: Vec<u8>,
    last: Option<FrameBuffer>,
    next: FrameBuffer,
    view: BoardView,
    state: DisplayState,
    throttle: RenderThrottle,
    epoch: Instant,
    open: bool,
    enhanced_keys: bool,
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self {
            stdout: io::stdout(),
            buf: Vec::with_capacity(64 * 1024),
            last: None,
            next: FrameBuffer::new(0, 0),
            view: BoardView::default(),
            state: DisplayState::default(),
            throttle: RenderThrottle::new(STATIC_REPAINT_MS),
            epoch: Instant::now(),
            open: true,
            enhanced_keys: false,
        }
    }

    pub fn enter(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        self.enhanced_keys = terminal::supports_keyboard_enhancement().unwrap_or(false);

        self.buf.clear();
        self.buf.queue(terminal::EnterAlternateScreen)?;
        self.buf.queue(cursor::Hide)?;
        self.buf.queue(terminal::DisableLineWrap)?;
        if self.enhanced_keys {
            self.buf.queue(PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
            ))?;
        }
        self.flush_buf()?;
        log::debug!("terminal entered (key release events: {})", self.enhanced_keys);
        Ok(())
    }

    pub fn exit(&mut self) -> Result<()> {
        self.buf.clear();
        if self.enhanced_keys {
            self.buf.queue(PopKeyboardEnhancementFlags)?;
        }
        self.buf.queue(ResetColor)?;
        self.buf.queue(SetAttribute(Attribute::Reset))?;
        self.buf.queue(terminal::EnableLineWrap)?;
        self.buf.queue(cursor::Show)?;
        self.buf.queue(terminal::LeaveAlternateScreen)?;
        self.flush_buf()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    /// Force the next frame to be a full redraw (e.g. after a resize).
    pub fn invalidate(&mut self) {
        self.last = None;
        self.throttle.reset();
    }

    fn draw(&mut self, viewport: Viewport) -> io::Result<()> {
        self.view.render_into(&self.state, viewport, &mut self.next);

        self.buf.clear();
        let mut prev = match self.last.take() {
            Some(prev) if prev.width() == viewport.width && prev.height() == viewport.height => {
                encode_diff_into(&prev, &self.next, &mut self.buf)?;
                prev
            }
            _ => {
                encode_full_into(&self.next, &mut self.buf)?;
                FrameBuffer::new(viewport.width, viewport.height)
            }
        };
        self.flush_buf()?;

        // Keep the flushed frame for the next diff; reuse the old allocation.
        std::mem::swap(&mut prev, &mut self.next);
        self.last = Some(prev);
        Ok(())
    }

    fn flush_buf(&mut self) -> io::Result<()> {
        self.stdout.write_all(&self.buf)?;
        self.stdout.flush()
    }
}

impl Default for TerminalSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for TerminalSurface {
    fn apply_board(&mut self, board: &Board) {
        self.state.board = *board;
    }

    fn apply_queue_text(&mut self, text: &str) {
        self.state.queue_text = text.to_string();
    }

    fn apply_hold_text(&mut self, text: &str) {
        self.state.hold_text = text.to_string();
    }

    fn apply_status(&mut self, status: &ConnectionStatus) {
        self.state.status = status.clone();
    }

    fn pump_frame(&mut self, wait: Duration) -> Result<KeyBatch, SurfaceError> {
        if !self.open {
            return Err(SurfaceError::Closed);
        }

        let (w, h) = terminal::size().unwrap_or((80, 24));
        let now_ms = self.epoch.elapsed().as_millis() as u64;
        let fingerprint = self.state.fingerprint() ^ (((w as u64) << 48) | ((h as u64) << 32));
        if self.throttle.should_render(now_ms, fingerprint) {
            self.draw(Viewport::new(w, h))?;
        }

        let mut keys = KeyBatch::new();
        if !event::poll(wait)? {
            return Ok(keys);
        }
        loop {
            match event::read()? {
                Event::Key(key) if is_close_request(&key) => {
                    log::info!("close requested from keyboard");
                    self.open = false;
                    break;
                }
                Event::Key(key) => keys.push(key),
                Event::Resize(..) => self.invalidate(),
                _ => {}
            }
            // Anything beyond a full batch stays pending for the next frame.
            if keys.is_full() || !event::poll(Duration::ZERO)? {
                break;
            }
        }
        Ok(keys)
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn reports_key_release(&self) -> bool {
        self.enhanced_keys
    }
}

/// Encode a full-frame redraw into `out` without touching stdout.
pub fn encode_full_into(fb: &FrameBuffer, out: &mut Vec<u8>) -> io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;
    out.queue(cursor::MoveTo(0, 0))?;

    let mut current_style: Option<CellStyle> = None;
    for y in 0..fb.height() {
        for x in 0..fb.width() {
            let cell = fb.get(x, y).unwrap_or_default();
            if current_style != Some(cell.style) {
                apply_style_into(out, cell.style)?;
                current_style = Some(cell.style);
            }
            out.queue(Print(cell.ch))?;
        }
        if y + 1 < fb.height() {
            out.queue(Print("\r\n"))?;
        }
    }

    out.queue(ResetColor)?;
    out.queue(SetAttribute(Attribute::Reset))?;
    Ok(())
}

/// Encode only the runs of cells that differ between `prev` and `next`.
pub fn encode_diff_into(prev: &FrameBuffer, next: &FrameBuffer, out: &mut Vec<u8>) -> io::Result<()> {
    let mut current_style: Option<CellStyle> = None;

    for (x, y, len) in changed_runs(prev, next) {
        out.queue(cursor::MoveTo(x, y))?;
        for dx in 0..len {
            let cell = next.get(x + dx, y).unwrap_or_default();
            if current_style != Some(cell.style) {
                apply_style_into(out, cell.style)?;
                current_style = Some(cell.style);
            }
            out.queue(Print(cell.ch))?;
        }
    }

    out.queue(ResetColor)?;
    out.queue(SetAttribute(Attribute::Reset))?;
    Ok(())
}

fn apply_style_into(out: &mut Vec<u8>, style: CellStyle) -> io::Result<()> {
    out.queue(SetForegroundColor(rgb_to_color(style.fg)))?;
    out.queue(SetBackgroundColor(rgb_to_color(style.bg)))?;
    out.queue(SetAttribute(Attribute::Reset))?;
    if style.bold {
        out.queue(SetAttribute(Attribute::Bold))?;
    }
    if style.dim {
        out.queue(SetAttribute(Attribute::Dim))?;
    }
    Ok(())
}

fn rgb_to_color(rgb: Rgb) -> Color {
    Color::Rgb {
        r: rgb.r,
        g: rgb.g,
        b: rgb.b,
    }
}

/// `(x, y, len)` runs of changed cells, row by row.
fn changed_runs(prev: &FrameBuffer, next: &FrameBuffer) -> Vec<(u16, u16, u16)> {
    let mut runs = Vec::new();
    if prev.width() != next.width() || prev.height() != next.height() {
        for y in 0..next.height() {
            runs.push((0, y, next.width()));
        }
        return runs;
    }

    let differs = |x: u16, y: u16| prev.get(x, y) != next.get(x, y);
    for y in 0..next.height() {
        let mut x = 0;
        while x < next.width() {
            if !differs(x, y) {
                x += 1;
                continue;
            }
            let start = x;
            while x < next.width() && differs(x, y) {
                x += 1;
            }
            runs.push((start, y, x - start));
        }
    }
    runs
}
