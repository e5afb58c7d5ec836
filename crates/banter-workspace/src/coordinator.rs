//! Glue between placement state and the session pool.
//!
//! The coordinator owns the workspace snapshot and a dependency-injected
//! [`SessionRegistry`]. Placement intents flow in from the presentation
//! layer; whenever a conversation enters or leaves the active set the
//! coordinator reconciles the session pool so every visible conversation has
//! a live connection and nothing else does.

use tracing::debug;

use banter_common::{ChatMessage, ConversationId, Rect, WindowId};
use banter_layout::{reduce, PlacementOutcome, WindowKind, WorkspaceAction, WorkspaceState};
use banter_sessions::SessionRegistry;

/// Configuration for one coordinator instance.
#[derive(Debug, Clone)]
pub struct WorkspaceConfig {
    /// Base realtime endpoint; the conversation id is appended per session.
    pub endpoint: String,
    /// Workspace bounds used when a placement intent does not carry any.
    pub bounds: Rect,
}

impl WorkspaceConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            bounds: Rect::new(0.0, 0.0, 1920.0, 1080.0),
        }
    }

    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = bounds;
        self
    }

    fn endpoint_for(&self, conversation: &ConversationId) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), conversation)
    }
}

/// Owns the workspace state and keeps the session pool in step with it.
pub struct WorkspaceCoordinator {
    registry: SessionRegistry,
    config: WorkspaceConfig,
    state: WorkspaceState,
}

impl WorkspaceCoordinator {
    pub fn new(registry: SessionRegistry, config: WorkspaceConfig) -> Self {
        Self {
            registry,
            config,
            state: WorkspaceState::new(),
        }
    }

    pub fn state(&self) -> &WorkspaceState {
        &self.state
    }

    /// The registry handle, for event subscriptions from the presentation
    /// layer.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Place a conversation onto the workspace. On success the session pool
    /// is reconciled; on rejection neither state nor sessions change.
    pub async fn drop_conversation_to(
        &mut self,
        conversation: &ConversationId,
        target: WindowKind,
        bounds: Option<Rect>,
    ) -> PlacementOutcome {
        let outcome = self.dispatch(WorkspaceAction::RequestPlacement {
            conversation: conversation.clone(),
            target,
            bounds: bounds.unwrap_or(self.config.bounds),
        });
        if outcome.is_applied() {
            self.sync_sessions().await;
        } else {
            debug!(conversation = %conversation, ?target, ?outcome, "Placement rejected");
        }
        outcome
    }

    pub async fn remove_window(&mut self, window: &WindowId) {
        self.dispatch(WorkspaceAction::RemoveWindow(window.clone()));
        self.sync_sessions().await;
    }

    pub async fn deactivate_conversation(&mut self, conversation: &ConversationId) {
        self.dispatch(WorkspaceAction::DeactivateConversation(conversation.clone()));
        self.sync_sessions().await;
    }

    pub fn set_floating_rect(&mut self, window: &WindowId, rect: Rect) {
        self.dispatch(WorkspaceAction::SetFloatingRect {
            window: window.clone(),
            rect,
        });
    }

    pub fn append_message(&mut self, conversation: &ConversationId, message: ChatMessage) {
        self.dispatch(WorkspaceAction::AppendMessage {
            conversation: conversation.clone(),
            message,
        });
    }

    pub fn set_loading(&mut self, conversation: &ConversationId, loading: bool) {
        self.dispatch(WorkspaceAction::SetLoading {
            conversation: conversation.clone(),
            loading,
        });
    }

    /// Send a user message on the conversation's live session, record it in
    /// workspace state and flag the conversation as awaiting a reply. Without
    /// a live session this is a silent no-op, matching the registry's
    /// fire-and-forget send.
    pub async fn send_message(&mut self, conversation: &ConversationId, text: &str) {
        let Some(session) = self.registry.session_for_conversation(conversation).await else {
            debug!(conversation = %conversation, "No live session for outgoing message");
            return;
        };
        self.registry.send_message(&session.id, text).await;
        self.dispatch(WorkspaceAction::AppendMessage {
            conversation: conversation.clone(),
            message: ChatMessage::user(text),
        });
        self.dispatch(WorkspaceAction::SetLoading {
            conversation: conversation.clone(),
            loading: true,
        });
    }

    fn dispatch(&mut self, action: WorkspaceAction) -> PlacementOutcome {
        let (next, outcome) = reduce(&self.state, action);
        self.state = next;
        outcome
    }

    /// Bring the session pool in line with the active conversation set:
    /// every active conversation gets a live session, every session whose
    /// conversation went inactive is closed (cancelling any pending
    /// reconnect with it).
    async fn sync_sessions(&mut self) {
        for conversation in self.state.active_conversations.clone() {
            if self
                .registry
                .session_for_conversation(&conversation)
                .await
                .is_none()
            {
                let endpoint = self.config.endpoint_for(&conversation);
                self.registry.open_session(&conversation, &endpoint).await;
            }
        }
        for session in self.registry.all_sessions().await {
            if !self.state.active_conversations.contains(&session.conversation_id) {
                self.registry.close_session(&session.id).await;
            }
        }
    }
}
