use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use banter_common::{ChatMessage, ConversationId, Rect, WindowId};

use crate::window::{WindowKind, WorkspaceWindow};

/// Immutable snapshot of the workspace. Mutated only through the reducer;
/// the coordinator swaps whole snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceState {
    /// Conversations occupying at least one window.
    pub active_conversations: HashSet<ConversationId>,
    pub windows: Vec<WorkspaceWindow>,
    /// Buffered chat messages per conversation. Cleared on deactivation.
    pub messages: HashMap<ConversationId, Vec<ChatMessage>>,
    /// Awaiting-reply flags per conversation.
    pub loading: HashMap<ConversationId, bool>,
}

impl WorkspaceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn window(&self, id: &WindowId) -> Option<&WorkspaceWindow> {
        self.windows.iter().find(|w| w.id == *id)
    }

    /// The window occupying a dock slot, if any.
    pub fn dock_window(&self, kind: WindowKind) -> Option<&WorkspaceWindow> {
        self.windows.iter().find(|w| w.kind == kind)
    }

    pub fn floating_count(&self, conversation: &ConversationId) -> usize {
        self.windows
            .iter()
            .filter(|w| w.kind == WindowKind::Floating && w.conversation == *conversation)
            .count()
    }

    /// Rectangles of every floating window, for overlap avoidance.
    pub fn floating_rects(&self) -> Vec<Rect> {
        self.windows
            .iter()
            .filter(|w| w.kind == WindowKind::Floating)
            .filter_map(|w| w.rect)
            .collect()
    }

    pub fn has_window_for(&self, conversation: &ConversationId) -> bool {
        self.windows.iter().any(|w| w.conversation == *conversation)
    }

    pub fn is_active(&self, conversation: &ConversationId) -> bool {
        self.active_conversations.contains(conversation)
    }
}
