/// Connection layer
///
/// The hub link and its lifecycle. [`manager::ConnectionManager`] drives
/// connect/stop/dispose and the session handshake over any
/// [`transport::Transport`]; [`ws::WsTransport`] is the production WebSocket
/// implementation with mid-session retry.
pub mod manager;
pub mod transport;
pub mod ws;

pub use manager::{ConnectionManager, Delivery};
pub use transport::{Transport, TransportEvent};
pub use ws::WsTransport;
