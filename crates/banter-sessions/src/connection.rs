//! Per-session connection bookkeeping.
//!
//! A `Connection` is owned exclusively by the registry; the public surface is
//! the read-only [`SessionInfo`] snapshot.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use banter_common::{ConversationId, SessionId};

use crate::events::{EventKind, SessionEvent};

/// Health of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Connecting,
    Open,
    Closed,
    Error,
}

/// One received event, as kept in a session's history buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub received_at: DateTime<Utc>,
    pub payload: Value,
}

/// Read-only snapshot of a connection, safe to hand out of the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: SessionId,
    pub conversation_id: ConversationId,
    pub status: SessionStatus,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub message_count: u64,
    pub reconnect_attempts: u32,
}

pub(crate) type Callback = Arc<dyn Fn(SessionEvent) + Send + Sync>;

pub(crate) struct Subscriber {
    pub id: u64,
    pub callback: Callback,
}

pub(crate) struct Connection {
    pub id: SessionId,
    pub conversation_id: ConversationId,
    pub endpoint: String,
    pub status: SessionStatus,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub message_count: u64,
    pub history: VecDeque<HistoryEntry>,
    pub reconnect_attempts: u32,
    pub outbound: Option<mpsc::UnboundedSender<String>>,
    pub subscribers: Vec<Subscriber>,
    pub connect_task: Option<JoinHandle<()>>,
    pub pump_task: Option<JoinHandle<()>>,
    pub reconnect_timer: Option<JoinHandle<()>>,
}

impl Connection {
    pub fn new(
        id: SessionId,
        conversation_id: ConversationId,
        endpoint: String,
        reconnect_attempts: u32,
    ) -> Self {
        Self {
            id,
            conversation_id,
            endpoint,
            status: SessionStatus::Connecting,
            last_activity_at: None,
            message_count: 0,
            history: VecDeque::new(),
            reconnect_attempts,
            outbound: None,
            subscribers: Vec::new(),
            connect_task: None,
            pump_task: None,
            reconnect_timer: None,
        }
    }

    /// A live connection satisfies idempotent re-open for its conversation.
    pub fn is_live(&self) -> bool {
        matches!(self.status, SessionStatus::Connecting | SessionStatus::Open)
    }

    /// Append to the history ring, evicting the oldest entry at the cap.
    pub fn push_history(&mut self, payload: Value, limit: usize) {
        if self.history.len() >= limit {
            self.history.pop_front();
        }
        self.history.push_back(HistoryEntry {
            received_at: Utc::now(),
            payload,
        });
    }

    pub fn event(&self, kind: EventKind, payload: Value) -> SessionEvent {
        SessionEvent {
            kind,
            payload,
            session_id: self.id.clone(),
        }
    }

    pub fn callbacks(&self) -> Vec<Callback> {
        self.subscribers
            .iter()
            .map(|s| Arc::clone(&s.callback))
            .collect()
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id.clone(),
            conversation_id: self.conversation_id.clone(),
            status: self.status,
            last_activity_at: self.last_activity_at,
            message_count: self.message_count,
            reconnect_attempts: self.reconnect_attempts,
        }
    }

    /// Abort every background task tied to this connection, including a
    /// pending reconnect timer.
    pub fn abort_tasks(&mut self) {
        if let Some(task) = self.connect_task.take() {
            task.abort();
        }
        if let Some(task) = self.pump_task.take() {
            task.abort();
        }
        if let Some(timer) = self.reconnect_timer.take() {
            timer.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn connection() -> Connection {
        Connection::new(
            SessionId::new(),
            ConversationId::from("general"),
            "wss://chat.example/general".into(),
            0,
        )
    }

    #[test]
    fn new_connection_starts_connecting() {
        let conn = connection();
        assert_eq!(conn.status, SessionStatus::Connecting);
        assert!(conn.is_live());
        assert_eq!(conn.message_count, 0);
        assert!(conn.history.is_empty());
    }

    #[test]
    fn closed_and_errored_are_not_live() {
        let mut conn = connection();
        conn.status = SessionStatus::Closed;
        assert!(!conn.is_live());
        conn.status = SessionStatus::Error;
        assert!(!conn.is_live());
        conn.status = SessionStatus::Open;
        assert!(conn.is_live());
    }

    #[test]
    fn history_ring_evicts_oldest() {
        let mut conn = connection();
        for i in 0..5 {
            conn.push_history(json!(i), 3);
        }
        assert_eq!(conn.history.len(), 3);
        let payloads: Vec<_> = conn.history.iter().map(|e| e.payload.clone()).collect();
        assert_eq!(payloads, vec![json!(2), json!(3), json!(4)]);
    }

    #[test]
    fn info_snapshot_matches_fields() {
        let mut conn = connection();
        conn.message_count = 7;
        conn.reconnect_attempts = 2;
        let info = conn.info();
        assert_eq!(info.id, conn.id);
        assert_eq!(info.conversation_id, conn.conversation_id);
        assert_eq!(info.message_count, 7);
        assert_eq!(info.reconnect_attempts, 2);
    }

    #[test]
    fn session_status_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&SessionStatus::Connecting).unwrap(),
            r#""connecting""#
        );
    }
}
