//! Pure transition function over the workspace state.
//!
//! Every mutation of [`WorkspaceState`] goes through [`reduce`]: snapshot in,
//! snapshot out, applied one action at a time so rapid drag-and-drop
//! sequences resolve strictly in dispatch order. Placement requests are the
//! only rejectable actions; a rejection returns the input state unchanged.

use banter_common::{ConversationId, Rect};

use crate::actions::{PlacementOutcome, RejectReason, WorkspaceAction};
use crate::float::next_floating_rect;
use crate::state::WorkspaceState;
use crate::window::{WindowKind, WorkspaceWindow};

/// Concurrent-chat cap for the whole workspace.
pub const MAX_ACTIVE_CONVERSATIONS: usize = 2;
/// Floating-window cap per conversation.
pub const MAX_FLOATING_PER_CONVERSATION: usize = 2;

pub fn reduce(state: &WorkspaceState, action: WorkspaceAction) -> (WorkspaceState, PlacementOutcome) {
    match action {
        WorkspaceAction::RequestPlacement {
            conversation,
            target,
            bounds,
        } => request_placement(state, conversation, target, bounds),

        WorkspaceAction::RemoveWindow(window) => {
            let mut next = state.clone();
            if let Some(pos) = next.windows.iter().position(|w| w.id == window) {
                let conversation = next.windows.remove(pos).conversation;
                if !next.has_window_for(&conversation) {
                    deactivate(&mut next, &conversation);
                }
            }
            (next, PlacementOutcome::Applied)
        }

        WorkspaceAction::DeactivateConversation(conversation) => {
            let mut next = state.clone();
            next.windows.retain(|w| w.conversation != conversation);
            deactivate(&mut next, &conversation);
            (next, PlacementOutcome::Applied)
        }

        WorkspaceAction::SetFloatingRect { window, rect } => {
            let mut next = state.clone();
            if let Some(w) = next
                .windows
                .iter_mut()
                .find(|w| w.id == window && w.kind == WindowKind::Floating)
            {
                w.rect = Some(rect);
            }
            (next, PlacementOutcome::Applied)
        }

        WorkspaceAction::AppendMessage {
            conversation,
            message,
        } => {
            // Appended even for inactive conversations so a reply arriving
            // after its tab closed is not lost.
            let mut next = state.clone();
            next.messages.entry(conversation).or_default().push(message);
            (next, PlacementOutcome::Applied)
        }

        WorkspaceAction::SetLoading {
            conversation,
            loading,
        } => {
            let mut next = state.clone();
            if next.active_conversations.contains(&conversation) {
                next.loading.insert(conversation, loading);
            }
            (next, PlacementOutcome::Applied)
        }
    }
}

fn request_placement(
    state: &WorkspaceState,
    conversation: ConversationId,
    target: WindowKind,
    bounds: Rect,
) -> (WorkspaceState, PlacementOutcome) {
    // Capacity first: the active set as it would look after this placement.
    let mut projected = state.active_conversations.clone();
    projected.insert(conversation.clone());
    if projected.len() > MAX_ACTIVE_CONVERSATIONS {
        return (
            state.clone(),
            PlacementOutcome::Rejected(RejectReason::Limit),
        );
    }

    match target {
        WindowKind::Floating => {
            if state.floating_count(&conversation) >= MAX_FLOATING_PER_CONVERSATION {
                return (
                    state.clone(),
                    PlacementOutcome::Rejected(RejectReason::Duplicate),
                );
            }
            let mut next = state.clone();
            let existing = next.floating_rects();
            let rect = next_floating_rect(&existing, bounds, existing.len());
            next.windows
                .push(WorkspaceWindow::floating(conversation.clone(), rect));
            next.active_conversations.insert(conversation);
            (next, PlacementOutcome::Applied)
        }

        dock => {
            // Redundant request: this conversation already holds the slot.
            if state
                .windows
                .iter()
                .any(|w| w.kind == dock && w.conversation == conversation)
            {
                return (
                    state.clone(),
                    PlacementOutcome::Rejected(RejectReason::Duplicate),
                );
            }

            let mut next = state.clone();
            match dock {
                WindowKind::Full => {
                    // Full-screen is exclusive of the side docks.
                    next.windows
                        .retain(|w| w.kind != WindowKind::Left && w.kind != WindowKind::Right);
                }
                side => {
                    // A full occupant held by another conversation moves to
                    // the opposite side instead of being closed.
                    if let Some(pos) = next
                        .windows
                        .iter()
                        .position(|w| w.kind == WindowKind::Full)
                    {
                        let full = next.windows.remove(pos);
                        if full.conversation != conversation {
                            if let Some(opposite) = side.opposite_side() {
                                set_dock(&mut next, opposite, full.conversation);
                            }
                        }
                    }
                    // Moving between sides vacates the previous slot: a
                    // replace-in-place, never an implicit third slot.
                    if let Some(opposite) = side.opposite_side() {
                        next.windows
                            .retain(|w| !(w.kind == opposite && w.conversation == conversation));
                    }
                }
            }
            set_dock(&mut next, dock, conversation.clone());
            next.active_conversations.insert(conversation);
            prune_orphans(&mut next);
            (next, PlacementOutcome::Applied)
        }
    }
}

/// Assign a dock slot, keeping the slot's window id stable across occupant
/// changes.
fn set_dock(state: &mut WorkspaceState, kind: WindowKind, conversation: ConversationId) {
    match state.windows.iter_mut().find(|w| w.kind == kind) {
        Some(window) => window.conversation = conversation,
        None => state
            .windows
            .push(WorkspaceWindow::dock(kind, conversation)),
    }
}

/// Drop active conversations that no longer reference any window.
fn prune_orphans(state: &mut WorkspaceState) {
    let orphaned: Vec<ConversationId> = state
        .active_conversations
        .iter()
        .filter(|c| !state.has_window_for(c))
        .cloned()
        .collect();
    for conversation in orphaned {
        deactivate(state, &conversation);
    }
}

fn deactivate(state: &mut WorkspaceState, conversation: &ConversationId) {
    state.active_conversations.remove(conversation);
    state.messages.remove(conversation);
    state.loading.remove(conversation);
}
