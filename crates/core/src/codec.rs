//! Board codec - wire representations <-> [`Board`]
//!
//! Three encodings are in use by authorities in the wild, and the decoder picks
//! the right one by looking at the payload's shape:
//!
//! | Format | Shape | Example |
//! |--------|-------|---------|
//! | [`BoardFormat::Rows`] | JSON array of 20 rows x 10 booleans, row 0 first | `[[false, ...], ...]` |
//! | [`BoardFormat::ColumnBits`] | `{"info": "<JSON array of 10 column masks>"}` | `{"info": "[1,0,3,...]"}` |
//! | [`BoardFormat::Glyphs`] | 200 whitespace separated glyphs, top row first | `□ □ ■ ...` |
//!
//! Row 0 is the bottom row in every format. In `ColumnBits`, bit `r` of
//! column `c` is cell `(r, c)`. In `Glyphs`, token `i` is cell
//! `((200 - 1 - i) / 10, i % 10)`.

use serde_json::Value;
use thiserror::Error;

use crate::types::{Board, BOARD_CELLS, BOARD_HEIGHT, BOARD_WIDTH};

/// Filled cell glyph.
pub const GLYPH_FILLED: &str = "■";
/// Alternate filled glyph (active/ghost piece cells).
pub const GLYPH_ACTIVE: &str = "⬚";
/// Empty cell glyph.
pub const GLYPH_EMPTY: &str = "□";

/// Errors produced while decoding a board payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The payload matched a known format but its shape was wrong.
    #[error("malformed board: {0}")]
    MalformedBoard(String),
    /// The payload matched none of the known formats.
    #[error("unsupported board format: {0}")]
    UnsupportedFormat(String),
}

fn malformed(msg: impl Into<String>) -> CodecError {
    CodecError::MalformedBoard(msg.into())
}

/// Known board wire encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoardFormat {
    Rows,
    ColumnBits,
    Glyphs,
}

impl BoardFormat {
    pub const ALL: [BoardFormat; 3] = [BoardFormat::Rows, BoardFormat::ColumnBits, BoardFormat::Glyphs];

    /// Identify the encoding of a JSON payload by structure alone.
    pub fn detect(value: &Value) -> Option<Self> {
        match value {
            Value::Array(_) => Some(BoardFormat::Rows),
            Value::Object(map) if map.contains_key("info") => Some(BoardFormat::ColumnBits),
            Value::String(s) if has_glyph(s) => Some(BoardFormat::Glyphs),
            _ => None,
        }
    }

    /// Identify the encoding of a raw text frame.
    pub fn detect_text(text: &str) -> Option<Self> {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => Self::detect(&value),
            Err(_) if has_glyph(text) => Some(BoardFormat::Glyphs),
            Err(_) => None,
        }
    }
}

fn is_glyph(token: &str) -> bool {
    token == GLYPH_FILLED || token == GLYPH_ACTIVE || token == GLYPH_EMPTY
}

fn has_glyph(s: &str) -> bool {
    s.split_whitespace().any(is_glyph)
}

/// Decode a raw text frame.
///
/// JSON payloads are routed through [`decode_value`]; non-JSON text is only
/// accepted when it is glyph text.
pub fn decode(text: &str) -> Result<Board, CodecError> {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => decode_value(&value),
        Err(_) if has_glyph(text) => decode_glyphs(text),
        Err(e) => Err(CodecError::UnsupportedFormat(format!("not JSON or glyph text: {e}"))),
    }
}

/// Decode an already-parsed JSON payload.
pub fn decode_value(value: &Value) -> Result<Board, CodecError> {
    match BoardFormat::detect(value) {
        Some(BoardFormat::Rows) => decode_rows(value),
        Some(BoardFormat::ColumnBits) => decode_column_bits(value),
        Some(BoardFormat::Glyphs) => match value {
            Value::String(s) => decode_glyphs(s),
            _ => Err(malformed("glyph board must be a string")),
        },
        None => Err(CodecError::UnsupportedFormat(describe(value).to_string())),
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null payload",
        Value::Bool(_) => "boolean payload",
        Value::Number(_) => "numeric payload",
        Value::String(_) => "string payload without glyphs",
        Value::Array(_) => "array payload",
        Value::Object(_) => "object payload without `info`",
    }
}

fn decode_rows(value: &Value) -> Result<Board, CodecError> {
    let rows = value.as_array().ok_or_else(|| malformed("rows must be an array"))?;
    if rows.len() != BOARD_HEIGHT {
        return Err(malformed(format!(
            "expected {} rows, got {}",
            BOARD_HEIGHT,
            rows.len()
        )));
    }

    let mut board = Board::new();
    for (r, row) in rows.iter().enumerate() {
        let cols = row
            .as_array()
            .ok_or_else(|| malformed(format!("row {r} is not an array")))?;
        if cols.len() != BOARD_WIDTH {
            return Err(malformed(format!(
                "row {r}: expected {} columns, got {}",
                BOARD_WIDTH,
                cols.len()
            )));
        }
        for (c, cell) in cols.iter().enumerate() {
            let filled = match cell {
                Value::Bool(b) => *b,
                Value::Number(n) => match n.as_u64() {
                    Some(0) => false,
                    Some(1) => true,
                    _ => return Err(malformed(format!("cell ({r}, {c}) is not a bit: {n}"))),
                },
                other => {
                    return Err(malformed(format!(
                        "cell ({r}, {c}) is not a boolean: {other}"
                    )))
                }
            };
            board.set(r, c, filled);
        }
    }
    Ok(board)
}

fn decode_column_bits(value: &Value) -> Result<Board, CodecError> {
    let info = value
        .get("info")
        .ok_or_else(|| malformed("missing `info` envelope"))?;

    // The envelope normally carries the mask array as a JSON string.
    let unwrapped;
    let columns = match info {
        Value::String(s) => {
            unwrapped = serde_json::from_str::<Value>(s)
                .map_err(|e| malformed(format!("`info` is not JSON: {e}")))?;
            &unwrapped
        }
        other => other,
    };

    let columns = columns
        .as_array()
        .ok_or_else(|| malformed("`info` must hold an array of column masks"))?;
    if columns.len() != BOARD_WIDTH {
        return Err(malformed(format!(
            "expected {} column masks, got {}",
            BOARD_WIDTH,
            columns.len()
        )));
    }

    let mut board = Board::new();
    for (c, mask) in columns.iter().enumerate() {
        let mask = mask
            .as_u64()
            .ok_or_else(|| malformed(format!("column {c} mask is not an unsigned integer")))?;
        if mask >> BOARD_HEIGHT != 0 {
            return Err(malformed(format!(
                "column {c} mask {mask:#x} has bits above row {}",
                BOARD_HEIGHT - 1
            )));
        }
        for r in 0..BOARD_HEIGHT {
            board.set(r, c, (mask >> r) & 1 == 1);
        }
    }
    Ok(board)
}

fn decode_glyphs(text: &str) -> Result<Board, CodecError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() != BOARD_CELLS {
        return Err(malformed(format!(
            "expected {} glyphs, got {}",
            BOARD_CELLS,
            tokens.len()
        )));
    }

    let mut board = Board::new();
    for (i, token) in tokens.into_iter().enumerate() {
        let filled = match token {
            GLYPH_FILLED | GLYPH_ACTIVE => true,
            GLYPH_EMPTY => false,
            other => return Err(malformed(format!("token {i} is not a board glyph: {other:?}"))),
        };
        board.set((BOARD_CELLS - 1 - i) / BOARD_WIDTH, i % BOARD_WIDTH, filled);
    }
    Ok(board)
}

/// Encode a board as a JSON payload in the given format.
pub fn encode_value(board: &Board, format: BoardFormat) -> Value {
    match format {
        BoardFormat::Rows => Value::Array(
            board
                .rows()
                .iter()
                .map(|row| Value::Array(row.iter().map(|&c| Value::Bool(c)).collect()))
                .collect(),
        ),
        BoardFormat::ColumnBits => {
            let masks: Vec<u64> = (0..BOARD_WIDTH)
                .map(|c| {
                    (0..BOARD_HEIGHT)
                        .filter(|&r| board.get(r, c))
                        .fold(0u64, |m, r| m | (1 << r))
                })
                .collect();
            let mut map = serde_json::Map::new();
            // Vec<u64> always serializes.
            let inner = serde_json::to_string(&masks).unwrap_or_default();
            map.insert("info".to_string(), Value::String(inner));
            Value::Object(map)
        }
        BoardFormat::Glyphs => Value::String(encode_glyphs(board)),
    }
}

/// Encode a board as a text frame in the given format.
///
/// Glyph boards are written as plain text (not a JSON string).
pub fn encode(board: &Board, format: BoardFormat) -> String {
    match format {
        BoardFormat::Glyphs => encode_glyphs(board),
        _ => encode_value(board, format).to_string(),
    }
}

fn encode_glyphs(board: &Board) -> String {
    let mut out = String::with_capacity(BOARD_CELLS * 4 + BOARD_HEIGHT);
    for row in (0..BOARD_HEIGHT).rev() {
        for col in 0..BOARD_WIDTH {
            out.push_str(if board.get(row, col) { GLYPH_FILLED } else { GLYPH_EMPTY });
            out.push(' ');
        }
        out.push('\n');
    }
    out
}
