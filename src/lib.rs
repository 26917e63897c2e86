/// stagelink
///
/// Player-side client for moderated live sessions. A moderator pushes
/// presentation commands (countdown timers, background music, sound
/// effects, crossfading images, captions) over a WebSocket hub; this crate
/// keeps the hub connection alive, buffers everything through a
/// thread-safe queue, and applies the commands on the presentation thread
/// in arrival order.
pub mod config;
pub mod connection;
pub mod error;
pub mod messaging;
pub mod presentation;
pub mod protocol;

pub use config::Config;
pub use connection::{ConnectionManager, Delivery, Transport, TransportEvent, WsTransport};
pub use error::{AppResult, ConfigError, ConnectionError, QueueError};
pub use messaging::{EventQueue, QueueEntry, QueueEvent};
pub use presentation::{FadeTimings, PresentationStateMachine};
pub use protocol::{
    CommandPayload, ConnectionStatus, PredefinedPayload, SessionCode, StatusEvent,
};
