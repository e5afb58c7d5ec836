//! Wire envelopes for the chat backend protocol.
//!
//! Inbound frames are JSON envelopes of the shape `{"type": ..., "payload":
//! ...}`. Frames that do not parse as an envelope are carried verbatim as an
//! opaque variant rather than dropped, so a lossy backend never stalls the
//! stream.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::events::EventKind;

/// An inbound frame decoded from the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerFrame {
    Chunk(Value),
    Done(Value),
    Error(Value),
    /// Text that did not parse as a known envelope.
    Opaque(String),
}

#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
}

impl ServerFrame {
    /// Decode a raw text frame. Unknown envelope types default to `Chunk`;
    /// anything without a string `type` field is `Opaque`.
    pub fn decode(raw: &str) -> Self {
        match serde_json::from_str::<RawEnvelope>(raw) {
            Ok(envelope) => match envelope.kind.as_str() {
                "done" => ServerFrame::Done(envelope.payload),
                "error" => ServerFrame::Error(envelope.payload),
                _ => ServerFrame::Chunk(envelope.payload),
            },
            Err(_) => ServerFrame::Opaque(raw.to_string()),
        }
    }

    /// Event tag under which this frame fans out to subscribers.
    pub fn kind(&self) -> EventKind {
        match self {
            ServerFrame::Done(_) => EventKind::Done,
            ServerFrame::Error(_) => EventKind::Error,
            ServerFrame::Chunk(_) | ServerFrame::Opaque(_) => EventKind::Chunk,
        }
    }

    /// Payload as stored in history and delivered to subscribers.
    pub fn payload(&self) -> Value {
        match self {
            ServerFrame::Chunk(p) | ServerFrame::Done(p) | ServerFrame::Error(p) => p.clone(),
            ServerFrame::Opaque(raw) => Value::String(raw.clone()),
        }
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self, ServerFrame::Opaque(_))
    }
}

/// An outbound frame serialized onto the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    UserMessage { message: String },
}
