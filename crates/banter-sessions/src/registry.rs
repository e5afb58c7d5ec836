//! Bounded pool of live chat connections.
//!
//! The registry owns every [`Connection`], enforces the concurrent-session
//! cap with oldest-first eviction, fans inbound events out to subscribers,
//! and drives reconnect-with-backoff. It is an explicitly constructed handle
//! (cheaply cloneable) — whoever owns the workspace lifetime owns the
//! registry; there is no process-global instance.

use std::sync::{Arc, Weak};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use banter_common::{ConversationId, SessionId};

use crate::connection::{Connection, HistoryEntry, SessionInfo, SessionStatus, Subscriber};
use crate::events::{EventKind, SessionEvent};
use crate::transport::{Transport, TransportEvent, TransportLink};
use crate::wire::{ClientFrame, ServerFrame};

/// Tunables for the session pool.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Maximum concurrently held connections.
    pub max_sessions: usize,
    /// Consecutive failed reconnects tolerated before giving up.
    pub max_reconnect_attempts: u32,
    /// First reconnect delay; doubles per attempt (2s, 4s, 8s).
    pub reconnect_base_delay: Duration,
    /// Per-session history ring capacity.
    pub history_limit: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_sessions: 2,
            max_reconnect_attempts: 3,
            reconnect_base_delay: Duration::from_millis(2000),
            history_limit: 500,
        }
    }
}

struct Inner {
    /// Insertion-ordered, oldest first. Eviction always takes the front.
    connections: Vec<Connection>,
    next_subscriber_id: u64,
}

impl Inner {
    fn find_mut(&mut self, session_id: &SessionId) -> Option<&mut Connection> {
        self.connections.iter_mut().find(|c| c.id == *session_id)
    }
}

/// Handle to the connection pool. Clones share the same pool.
#[derive(Clone)]
pub struct SessionRegistry {
    transport: Arc<dyn Transport>,
    config: RegistryConfig,
    inner: Arc<Mutex<Inner>>,
}

/// Removes exactly one subscriber registration when consumed.
pub struct Subscription {
    session_id: SessionId,
    subscriber_id: u64,
    inner: Weak<Mutex<Inner>>,
}

impl Subscription {
    pub async fn unsubscribe(self) {
        if let Some(inner) = self.inner.upgrade() {
            let mut guard = inner.lock().await;
            if let Some(conn) = guard.find_mut(&self.session_id) {
                conn.subscribers.retain(|s| s.id != self.subscriber_id);
            }
        }
    }
}

impl SessionRegistry {
    pub fn new(transport: Arc<dyn Transport>, config: RegistryConfig) -> Self {
        Self {
            transport,
            config,
            inner: Arc::new(Mutex::new(Inner {
                connections: Vec::new(),
                next_subscriber_id: 1,
            })),
        }
    }

    /// Open (or reuse) a connection for a conversation.
    ///
    /// Returns immediately with the session id; the transport handshake
    /// completes in the background and is announced by a `connected` event.
    /// While a live connection already targets the conversation its id is
    /// returned instead of opening a second one.
    pub async fn open_session(
        &self,
        conversation: &ConversationId,
        endpoint: &str,
    ) -> SessionId {
        self.open_with_attempts(conversation, endpoint, 0).await
    }

    async fn open_with_attempts(
        &self,
        conversation: &ConversationId,
        endpoint: &str,
        reconnect_attempts: u32,
    ) -> SessionId {
        let session_id = {
            let mut inner = self.inner.lock().await;
            if let Some(existing) = inner
                .connections
                .iter()
                .find(|c| c.conversation_id == *conversation && c.is_live())
            {
                debug!(
                    session = %existing.id,
                    conversation = %conversation,
                    "Reusing live session"
                );
                return existing.id.clone();
            }

            while inner.connections.len() >= self.config.max_sessions {
                let mut evicted = inner.connections.remove(0);
                info!(
                    session = %evicted.id,
                    conversation = %evicted.conversation_id,
                    "Evicting oldest session to admit a new one"
                );
                evicted.abort_tasks();
            }

            let id = SessionId::new();
            info!(session = %id, conversation = %conversation, "Opening chat session");
            inner.connections.push(Connection::new(
                id.clone(),
                conversation.clone(),
                endpoint.to_string(),
                reconnect_attempts,
            ));
            id
        };

        self.spawn_connect(session_id.clone(), conversation.clone(), endpoint.to_string())
            .await;
        session_id
    }

    async fn spawn_connect(
        &self,
        session_id: SessionId,
        conversation: ConversationId,
        endpoint: String,
    ) {
        let registry = self.clone();
        let task_session = session_id.clone();
        let handle = tokio::spawn(async move {
            match registry.transport.connect(&conversation, &endpoint).await {
                Ok(link) => registry.attach_link(&task_session, link).await,
                Err(e) => {
                    warn!(session = %task_session, error = %e, "Transport connect failed");
                    registry
                        .handle_transport_event(
                            &task_session,
                            TransportEvent::Error(e.to_string()),
                        )
                        .await;
                }
            }
        });

        let mut inner = self.inner.lock().await;
        match inner.find_mut(&session_id) {
            Some(conn) => conn.connect_task = Some(handle),
            // Closed before the task could be registered.
            None => handle.abort(),
        }
    }

    async fn attach_link(&self, session_id: &SessionId, link: TransportLink) {
        let TransportLink {
            outbound,
            mut events,
        } = link;

        let mut inner = self.inner.lock().await;
        let Some(conn) = inner.find_mut(session_id) else {
            // Closed while the handshake was in flight; dropping the link
            // tears the socket down.
            return;
        };
        conn.outbound = Some(outbound);

        let registry = self.clone();
        let pump_session = session_id.clone();
        conn.pump_task = Some(tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                registry.handle_transport_event(&pump_session, event).await;
            }
        }));
    }

    /// Apply one transport event to its connection and fan the result out.
    /// Events are processed in arrival order per connection; callbacks run
    /// outside the pool lock.
    async fn handle_transport_event(&self, session_id: &SessionId, event: TransportEvent) {
        let fan_out = {
            let mut inner = self.inner.lock().await;
            let Some(conn) = inner.find_mut(session_id) else {
                return;
            };
            match event {
                TransportEvent::Opened => {
                    conn.status = SessionStatus::Open;
                    conn.reconnect_attempts = 0;
                    conn.last_activity_at = Some(chrono::Utc::now());
                    info!(
                        session = %conn.id,
                        conversation = %conn.conversation_id,
                        "Session connected"
                    );
                    (conn.event(EventKind::Connected, Value::Null), conn.callbacks())
                }
                TransportEvent::Frame(raw) => {
                    let frame = ServerFrame::decode(&raw);
                    if frame.is_opaque() {
                        debug!(session = %conn.id, "Frame is not an envelope, treating as opaque chunk");
                    }
                    let payload = frame.payload();
                    conn.push_history(payload.clone(), self.config.history_limit);
                    conn.message_count += 1;
                    conn.last_activity_at = Some(chrono::Utc::now());
                    (conn.event(frame.kind(), payload), conn.callbacks())
                }
                TransportEvent::Error(message) => {
                    conn.status = SessionStatus::Error;
                    warn!(session = %conn.id, error = %message, "Session transport error");
                    let event = conn.event(EventKind::Error, Value::String(message));
                    let callbacks = conn.callbacks();
                    if conn.reconnect_attempts < self.config.max_reconnect_attempts {
                        let delay =
                            self.config.reconnect_base_delay * 2u32.pow(conn.reconnect_attempts);
                        conn.reconnect_attempts += 1;
                        info!(
                            session = %conn.id,
                            attempt = conn.reconnect_attempts,
                            delay_ms = delay.as_millis() as u64,
                            "Scheduling reconnect"
                        );
                        let registry = self.clone();
                        let timer_session = conn.id.clone();
                        conn.reconnect_timer = Some(tokio::spawn(async move {
                            tokio::time::sleep(delay).await;
                            registry.reconnect(timer_session).await;
                        }));
                    } else {
                        info!(session = %conn.id, "Reconnect attempts exhausted, giving up");
                    }
                    (event, callbacks)
                }
                TransportEvent::Closed => {
                    conn.status = SessionStatus::Closed;
                    info!(session = %conn.id, "Session disconnected");
                    (
                        conn.event(EventKind::Disconnected, Value::Null),
                        conn.callbacks(),
                    )
                }
            }
        };

        let (event, callbacks) = fan_out;
        for callback in callbacks {
            callback(event.clone());
        }
    }

    /// Tear down a failed connection and reopen its conversation under a new
    /// session id, carrying the attempt counter forward. Subscribers of the
    /// dead session are not migrated.
    // Boxed to give this future a concrete `Send` type: `reconnect` sits on a
    // recursive cycle (reconnect -> open_with_attempts -> spawn_connect ->
    // [spawned task] -> handle_transport_event -> reconnect) that the auto-trait
    // solver cannot resolve through opaque `async fn` return types. Erasing one
    // edge to `Box<dyn Future + Send>` breaks the cycle without changing behavior.
    fn reconnect(
        &self,
        session_id: SessionId,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            let (conversation, endpoint, attempts) = {
                let mut inner = self.inner.lock().await;
                let Some(pos) = inner.connections.iter().position(|c| c.id == session_id) else {
                    return;
                };
                let mut old = inner.connections.remove(pos);
                // This runs inside the timer task itself; drop the handle
                // without aborting.
                old.reconnect_timer.take();
                old.abort_tasks();
                (
                    old.conversation_id.clone(),
                    old.endpoint.clone(),
                    old.reconnect_attempts,
                )
            };
            info!(conversation = %conversation, attempt = attempts, "Reconnecting session");
            self.open_with_attempts(&conversation, &endpoint, attempts)
                .await;
        })
    }

    /// Send a user message on an open session. Dropped silently when the
    /// session is absent or not open; the caller reads session status if it
    /// needs to distinguish.
    pub async fn send_message(&self, session_id: &SessionId, text: &str) {
        let mut inner = self.inner.lock().await;
        let Some(conn) = inner.find_mut(session_id) else {
            debug!(session = %session_id, "Dropping message for unknown session");
            return;
        };
        if conn.status != SessionStatus::Open {
            debug!(session = %session_id, status = ?conn.status, "Dropping message for non-open session");
            return;
        }
        let frame = ClientFrame::UserMessage {
            message: text.to_string(),
        };
        if let Some(outbound) = conn.outbound.as_ref() {
            if let Ok(json) = serde_json::to_string(&frame) {
                if outbound.send(json).is_ok() {
                    conn.last_activity_at = Some(chrono::Utc::now());
                }
            }
        }
    }

    /// Subscribe to every subsequent event of a session. The returned
    /// [`Subscription`] removes exactly this registration; subscribing to an
    /// unknown session yields an inert subscription.
    pub async fn on_message(
        &self,
        session_id: &SessionId,
        callback: impl Fn(SessionEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let mut inner = self.inner.lock().await;
        let subscriber_id = inner.next_subscriber_id;
        inner.next_subscriber_id += 1;
        if let Some(conn) = inner.find_mut(session_id) {
            conn.subscribers.push(Subscriber {
                id: subscriber_id,
                callback: Arc::new(callback),
            });
        }
        Subscription {
            session_id: session_id.clone(),
            subscriber_id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Close and forget a session. Idempotent; aborts any pending reconnect
    /// timer so a stale timer can never resurrect a closed session.
    pub async fn close_session(&self, session_id: &SessionId) {
        let mut inner = self.inner.lock().await;
        let Some(pos) = inner.connections.iter().position(|c| c.id == *session_id) else {
            return;
        };
        let mut conn = inner.connections.remove(pos);
        info!(session = %conn.id, conversation = %conn.conversation_id, "Closing session");
        conn.abort_tasks();
        // Dropping the connection drops the outbound sender, which closes
        // the underlying socket.
    }

    pub async fn history(&self, session_id: &SessionId) -> Vec<HistoryEntry> {
        let mut inner = self.inner.lock().await;
        inner
            .find_mut(session_id)
            .map(|c| c.history.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn session_info(&self, session_id: &SessionId) -> Option<SessionInfo> {
        let mut inner = self.inner.lock().await;
        inner.find_mut(session_id).map(|c| c.info())
    }

    pub async fn all_sessions(&self) -> Vec<SessionInfo> {
        let inner = self.inner.lock().await;
        inner.connections.iter().map(|c| c.info()).collect()
    }

    /// The live session currently carrying a conversation, if any.
    pub async fn session_for_conversation(
        &self,
        conversation: &ConversationId,
    ) -> Option<SessionInfo> {
        let inner = self.inner.lock().await;
        inner
            .connections
            .iter()
            .find(|c| c.conversation_id == *conversation && c.is_live())
            .map(|c| c.info())
    }
}
