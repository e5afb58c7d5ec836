pub mod actions;
pub mod float;
pub mod reducer;
pub mod state;
pub mod window;

pub use actions::{PlacementOutcome, RejectReason, WorkspaceAction};
pub use float::next_floating_rect;
pub use reducer::{reduce, MAX_ACTIVE_CONVERSATIONS, MAX_FLOATING_PER_CONVERSATION};
pub use state::WorkspaceState;
pub use window::{WindowKind, WorkspaceWindow};
