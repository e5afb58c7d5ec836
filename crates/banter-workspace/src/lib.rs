pub mod coordinator;

pub use coordinator::{WorkspaceConfig, WorkspaceCoordinator};
