pub mod connection;
pub mod events;
pub mod registry;
pub mod transport;
pub mod wire;

pub use connection::{HistoryEntry, SessionInfo, SessionStatus};
pub use events::{EventKind, SessionEvent};
pub use registry::{RegistryConfig, SessionRegistry, Subscription};
pub use transport::{Transport, TransportEvent, TransportLink, WsTransport};
pub use wire::{ClientFrame, ServerFrame};
