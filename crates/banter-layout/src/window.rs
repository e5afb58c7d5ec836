use serde::{Deserialize, Serialize};

use banter_common::{ConversationId, Rect, WindowId};

/// Where a window sits on the workspace surface. The three dock kinds are
/// exclusive slots; floating windows are freely positioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    Full,
    Left,
    Right,
    Floating,
}

impl WindowKind {
    pub fn is_dock(&self) -> bool {
        !matches!(self, WindowKind::Floating)
    }

    /// The other side dock, for side kinds only.
    pub fn opposite_side(&self) -> Option<WindowKind> {
        match self {
            WindowKind::Left => Some(WindowKind::Right),
            WindowKind::Right => Some(WindowKind::Left),
            _ => None,
        }
    }
}

/// One window on the workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceWindow {
    pub id: WindowId,
    pub kind: WindowKind,
    pub conversation: ConversationId,
    /// Present only for floating windows.
    pub rect: Option<Rect>,
}

impl WorkspaceWindow {
    /// A dock window. Dock ids are fixed per kind so the same slot keeps its
    /// identity across occupant changes.
    pub fn dock(kind: WindowKind, conversation: ConversationId) -> Self {
        let id = match kind {
            WindowKind::Full => WindowId::named("dock-full"),
            WindowKind::Left => WindowId::named("dock-left"),
            WindowKind::Right => WindowId::named("dock-right"),
            // Callers only pass dock kinds here.
            WindowKind::Floating => WindowId::floating(),
        };
        Self {
            id,
            kind,
            conversation,
            rect: None,
        }
    }

    /// A floating window with a freshly generated id.
    pub fn floating(conversation: ConversationId, rect: Rect) -> Self {
        Self {
            id: WindowId::floating(),
            kind: WindowKind::Floating,
            conversation,
            rect: Some(rect),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dock_ids_are_deterministic() {
        let a = WorkspaceWindow::dock(WindowKind::Left, "a".into());
        let b = WorkspaceWindow::dock(WindowKind::Left, "b".into());
        assert_eq!(a.id, b.id);
        assert_eq!(a.id.as_str(), "dock-left");
    }

    #[test]
    fn floating_ids_are_fresh() {
        let rect = Rect::new(0.0, 0.0, 420.0, 320.0);
        let a = WorkspaceWindow::floating("a".into(), rect);
        let b = WorkspaceWindow::floating("a".into(), rect);
        assert_ne!(a.id, b.id);
        assert_eq!(a.rect, Some(rect));
    }

    #[test]
    fn dock_windows_have_no_rect() {
        let w = WorkspaceWindow::dock(WindowKind::Full, "a".into());
        assert!(w.rect.is_none());
    }

    #[test]
    fn kinds_classify_as_dock_or_floating() {
        assert!(WindowKind::Full.is_dock());
        assert!(WindowKind::Left.is_dock());
        assert!(WindowKind::Right.is_dock());
        assert!(!WindowKind::Floating.is_dock());
    }

    #[test]
    fn opposite_sides() {
        assert_eq!(WindowKind::Left.opposite_side(), Some(WindowKind::Right));
        assert_eq!(WindowKind::Right.opposite_side(), Some(WindowKind::Left));
        assert_eq!(WindowKind::Full.opposite_side(), None);
        assert_eq!(WindowKind::Floating.opposite_side(), None);
    }

    #[test]
    fn window_kind_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&WindowKind::Floating).unwrap(),
            r#""floating""#
        );
        assert_eq!(serde_json::to_string(&WindowKind::Full).unwrap(), r#""full""#);
    }
}
