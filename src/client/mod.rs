//! Chain Client Module
//!
//! Connection cascade (socket, external light client, embedded engine),
//! WebSocket transport and the typed-API cache.

pub mod transport;
pub mod ws;
pub mod manager;
pub mod api;

#[cfg(test)]
mod tests;

pub use transport::*;
pub use ws::{WsConnection, WsError, WsTransport};
pub use manager::*;
pub use api::*;
