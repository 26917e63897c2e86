/// Transport seam
///
/// The connection manager speaks to the session server through this trait so
/// tests can substitute a scripted transport and the WebSocket details stay
/// in one place.
use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::error::ConnectionError;

/// Events pushed up from a live transport
#[derive(Debug)]
pub enum TransportEvent {
    /// A server-to-client call arrived
    Message {
        target: String,
        payload: serde_json::Value,
    },
    /// The link dropped and the transport is retrying on its own
    Reconnecting(Option<String>),
    /// A retry succeeded and the link is live again
    Reconnected,
    /// The link is gone for good, retries exhausted or remote close
    Closed(Option<String>),
}

#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Open the link. Must fail, not retry, when the initial attempt cannot
    /// be established.
    async fn open(&self) -> Result<(), ConnectionError>;

    /// Invoke a named server method and wait for the round trip
    async fn invoke(
        &self,
        target: &str,
        payload: serde_json::Value,
    ) -> Result<(), ConnectionError>;

    /// Close the link and stop the event pump
    async fn close(&self) -> Result<(), ConnectionError>;

    /// Forcibly drop the link without the close handshake. Used when a
    /// graceful [`Transport::close`] hangs past its deadline; must leave no
    /// live pump or pending outbound state behind.
    fn abort(&self);

    /// Hand over the event stream. Yields once; later calls return `None`.
    fn take_events(&self) -> Option<UnboundedReceiver<TransportEvent>>;
}
