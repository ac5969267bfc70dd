//! Wire messages exchanged with the authority.
//!
//! Inbound frames are classified into [`InboundMessage`]s, first through the
//! typed [`Envelope`] and then, for untagged frames, through the legacy
//! decoder. The only outbound message is the [`Reply`] carrying a command.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use crate::core::{decode, decode_value, BoardFormat, CodecError};
use crate::types::{Board, Command};

/// Legacy frames longer than this (trimmed, in chars) are boards.
pub const LEGACY_BOARD_MIN_CHARS: usize = 51;
/// Legacy frames longer than this (trimmed, in chars) are queue text.
pub const LEGACY_QUEUE_MIN_CHARS: usize = 6;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),
    #[error("invalid reply: {0}")]
    InvalidReply(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Board,
    Queue,
    Hold,
}

/// Typed inbound frame: `{"kind": "board", "payload": ...}`.
///
/// `{"kind": "hold", "hold": "T"}` and `{"kind": "queue", "queue": "..."}`
/// are accepted as older spellings of the same envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub kind: MessageKind,
    #[serde(alias = "hold", alias = "queue", alias = "board")]
    pub payload: Value,
}

impl Envelope {
    pub fn new(kind: MessageKind, payload: Value) -> Self {
        Self { kind, payload }
    }

    pub fn to_json(&self) -> String {
        // Value and a unit enum always serialize.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// A classified inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    Board(Board),
    Queue(String),
    Hold(String),
}

/// Classify and decode one inbound text frame.
pub fn parse_inbound(text: &str) -> Result<InboundMessage, ProtocolError> {
    let trimmed = text.trim();
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) if map.contains_key("kind") => {
            let envelope: Envelope = serde_json::from_value(Value::Object(map))
                .map_err(|e| ProtocolError::InvalidEnvelope(e.to_string()))?;
            from_envelope(envelope)
        }
        Ok(value) => parse_legacy_value(trimmed, &value),
        Err(_) => parse_legacy_text(trimmed),
    }
}

fn from_envelope(envelope: Envelope) -> Result<InboundMessage, ProtocolError> {
    Ok(match envelope.kind {
        MessageKind::Board => InboundMessage::Board(decode_value(&envelope.payload)?),
        MessageKind::Queue => InboundMessage::Queue(display_text(&envelope.payload)),
        MessageKind::Hold => InboundMessage::Hold(display_text(&envelope.payload)),
    })
}

fn parse_legacy_value(trimmed: &str, value: &Value) -> Result<InboundMessage, ProtocolError> {
    if let Value::Array(items) = value {
        if !items.is_empty() && items.iter().all(|v| v.is_string()) {
            return Ok(InboundMessage::Queue(display_text(value)));
        }
    }
    if BoardFormat::detect(value).is_some() {
        return Ok(InboundMessage::Board(decode_value(value)?));
    }
    Ok(match legacy_kind(trimmed) {
        MessageKind::Board => InboundMessage::Board(decode_value(value)?),
        MessageKind::Queue => InboundMessage::Queue(display_text(value)),
        MessageKind::Hold => InboundMessage::Hold(display_text(value)),
    })
}

fn parse_legacy_text(trimmed: &str) -> Result<InboundMessage, ProtocolError> {
    if BoardFormat::detect_text(trimmed).is_some() {
        return Ok(InboundMessage::Board(decode(trimmed)?));
    }
    Ok(match legacy_kind(trimmed) {
        MessageKind::Board => InboundMessage::Board(decode(trimmed)?),
        MessageKind::Queue => InboundMessage::Queue(trimmed.to_string()),
        MessageKind::Hold => InboundMessage::Hold(trimmed.to_string()),
    })
}

/// Length heuristic for untagged frames.
pub fn legacy_kind(trimmed: &str) -> MessageKind {
    let len = trimmed.chars().count();
    if len >= LEGACY_BOARD_MIN_CHARS {
        MessageKind::Board
    } else if len >= LEGACY_QUEUE_MIN_CHARS {
        MessageKind::Queue
    } else {
        MessageKind::Hold
    }
}

/// Text shown for a queue/hold payload.
fn display_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" "),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// A [`Command`] serialized by its wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandName(pub Command);

impl Serialize for CommandName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for CommandName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Command::from_str(&name)
            .map(CommandName)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown command {name:?}")))
    }
}

/// Outbound reply: `{"contents": "HardDrop"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub contents: CommandName,
}

impl Reply {
    pub fn new(cmd: Command) -> Self {
        Self {
            contents: CommandName(cmd),
        }
    }

    pub fn command(&self) -> Command {
        self.contents.0
    }
}

pub fn encode_reply(cmd: Command) -> String {
    serde_json::to_string(&Reply::new(cmd)).unwrap_or_default()
}

/// Parse a reply frame, as the authority does.
pub fn parse_reply(text: &str) -> Result<Command, ProtocolError> {
    serde_json::from_str::<Reply>(text)
        .map(|r| r.command())
        .map_err(|e| ProtocolError::InvalidReply(e.to_string()))
}
