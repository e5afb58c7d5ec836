use serde::{Deserialize, Serialize};

use banter_common::{ChatMessage, ConversationId, Rect, WindowId};

use crate::window::WindowKind;

/// Everything that can change workspace state. The reducer matches on this
/// enum; nothing mutates the state outside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorkspaceAction {
    RequestPlacement {
        conversation: ConversationId,
        target: WindowKind,
        bounds: Rect,
    },
    RemoveWindow(WindowId),
    DeactivateConversation(ConversationId),
    SetFloatingRect {
        window: WindowId,
        rect: Rect,
    },
    AppendMessage {
        conversation: ConversationId,
        message: ChatMessage,
    },
    SetLoading {
        conversation: ConversationId,
        loading: bool,
    },
}

/// Why a placement request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Admitting the conversation would exceed the concurrent-chat cap.
    Limit,
    /// The request is redundant: same dock already held, or the floating
    /// cap for the conversation is reached.
    Duplicate,
}

/// Result of applying an action. Placement requests are the only actions
/// that can be rejected; rejection leaves the state untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementOutcome {
    Applied,
    Rejected(RejectReason),
}

impl PlacementOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, PlacementOutcome::Applied)
    }

    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            PlacementOutcome::Applied => None,
            PlacementOutcome::Rejected(reason) => Some(*reason),
        }
    }
}
