//! Request handlers for banner ranking.

mod banners;
mod websocket;

pub use banners::*;
pub use websocket::handle_websocket_connection;
