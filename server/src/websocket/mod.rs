//! WebSocket support for live ranking updates.
//!
//! Clients connect via WebSocket, receive the current snapshot, and then get
//! every snapshot change and engine event pushed as it happens. They can also
//! drive reorder, promote and demote over the same socket.

mod manager;
mod protocol;
mod relay;

pub use manager::ConnectionManager;
pub use protocol::*;
pub use relay::spawn_relay;
