use serde::{Deserialize, Serialize};
use serde_json::Value;

use banter_common::SessionId;

/// Tag of an event fanned out to session subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Connected,
    Disconnected,
    Chunk,
    Done,
    Error,
}

/// One event delivered to every subscriber of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub payload: Value,
    pub session_id: SessionId,
}
