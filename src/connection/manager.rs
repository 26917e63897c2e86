/// Connection resilience manager
///
/// Owns one transport and one session membership. Drives the open/handshake
/// sequence on connect, relays server calls into the delivery channel, echo
/// acknowledges every received command, rejoins the session after transport
/// level reconnects, and tears the link down gracefully on stop.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use super::transport::{Transport, TransportEvent};
use crate::config::Config;
use crate::error::ConnectionError;
use crate::messaging::{EventQueue, QueueEvent};
use crate::protocol::{
    messages, CommandPayload, ConnectionStatus, PredefinedPayload, SessionCode, SessionEnvelope,
    StatusEvent, TextLogPayload,
};

/// `from` label on log lines sent up to the moderator
const LOG_SOURCE: &str = "player";

/// Where inbound commands and status transitions go.
///
/// Chosen at construction time: hosts confined to one thread take `Queued`
/// and drain on their own tick ([`ConnectionManager::with_queue`]); hosts
/// that tolerate calls from the reader task take `Direct` and get statuses
/// marked out-of-band.
pub enum Delivery {
    /// Buffer everything for the presentation thread to drain
    Queued(EventQueue),
    /// Call straight into the host from the reader task
    Direct(Box<dyn Fn(QueueEvent) + Send + Sync>),
}

impl Delivery {
    fn deliver(&self, event: QueueEvent) {
        match self {
            Delivery::Queued(queue) => queue.enqueue(event),
            Delivery::Direct(callback) => callback(event),
        }
    }
}

struct Inner<T> {
    session: SessionCode,
    transport: T,
    delivery: Delivery,
    /// Transport link is open. Outlives `connected`: a handshake failure
    /// leaves the link open but the session not joined.
    opened: AtomicBool,
    connected: AtomicBool,
    disposed: AtomicBool,
}

pub struct ConnectionManager<T: Transport> {
    inner: Arc<Inner<T>>,
    connect_timeout: Duration,
    stop_timeout: Duration,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Transport> ConnectionManager<T> {
    pub fn new(session: SessionCode, transport: T, delivery: Delivery, config: &Config) -> Self {
        Self {
            inner: Arc::new(Inner {
                session,
                transport,
                delivery,
                opened: AtomicBool::new(false),
                connected: AtomicBool::new(false),
                disposed: AtomicBool::new(false),
            }),
            connect_timeout: config.connect_timeout(),
            stop_timeout: config.stop_timeout(),
            reader: Mutex::new(None),
        }
    }

    /// Queue-backed manager for single-threaded hosts
    pub fn with_queue(
        session: SessionCode,
        transport: T,
        queue: EventQueue,
        config: &Config,
    ) -> Self {
        Self::new(session, transport, Delivery::Queued(queue), config)
    }

    /// Open the transport, join the session, and announce the player.
    /// Returns `Ok(false)` when the attempt failed recoverably; the failure
    /// has already been reported through the delivery channel.
    pub async fn connect(&self) -> Result<bool, ConnectionError> {
        if self.inner.disposed.load(Ordering::SeqCst) {
            return Err(ConnectionError::Disposed);
        }
        if self.inner.opened.load(Ordering::SeqCst) {
            tracing::warn!("Connect requested while a link is open, closing the old one first");
            if let Err(e) = self.shutdown_transport().await {
                tracing::warn!("Old link did not close cleanly: {e}");
            }
        }

        tracing::info!(session = %self.inner.session, "Connecting to session hub");
        self.inner
            .deliver_status(StatusEvent::new(ConnectionStatus::Connecting));

        let timeout_secs = self.connect_timeout.as_secs();
        let opened = match timeout(self.connect_timeout, self.inner.transport.open()).await {
            Ok(result) => result,
            Err(_) => Err(ConnectionError::Timeout { timeout_secs }),
        };
        if let Err(e) = opened {
            tracing::error!("Failed to open hub transport: {e}");
            self.inner.deliver_status(StatusEvent::with_detail(
                ConnectionStatus::FailedToConnect,
                e.to_string(),
            ));
            return Ok(false);
        }
        self.inner.opened.store(true, Ordering::SeqCst);

        // The reader outlives individual sessions; spawn it on first use
        if let Some(events) = self.inner.transport.take_events() {
            let inner = Arc::clone(&self.inner);
            *self.reader.lock() = Some(tokio::spawn(reader_loop(inner, events)));
        }

        if let Err(e) = self.inner.join_session("Has joined the session").await {
            tracing::error!("Session handshake failed: {e}");
            self.inner.deliver_status(StatusEvent::with_detail(
                ConnectionStatus::InvokeFailed,
                e.to_string(),
            ));
            return Ok(false);
        }

        self.inner.connected.store(true, Ordering::SeqCst);
        self.inner
            .deliver_status(StatusEvent::new(ConnectionStatus::Connected));
        tracing::info!("Session joined");
        Ok(true)
    }

    /// Close the link. Gated on the link being open, not on the handshake
    /// having succeeded, so a half-connected session still gets torn down.
    pub async fn stop(&self) -> Result<(), ConnectionError> {
        if self.inner.disposed.load(Ordering::SeqCst) {
            return Ok(());
        }
        if !self.inner.opened.load(Ordering::SeqCst) {
            tracing::warn!("Stop requested but no link is open");
            return Ok(());
        }

        tracing::info!("Stopping hub connection");
        self.shutdown_transport().await
    }

    /// Bounded graceful close with a forced fallback. The opened/connected
    /// flags drop on every path; a close that outlives its deadline gets the
    /// transport aborted and the reader task killed so nothing can deliver
    /// afterwards.
    async fn shutdown_transport(&self) -> Result<(), ConnectionError> {
        self.inner.connected.store(false, Ordering::SeqCst);
        if !self.inner.opened.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        let timeout_secs = self.stop_timeout.as_secs();
        match timeout(self.stop_timeout, self.inner.transport.close()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                tracing::warn!("Transport close reported an error: {e}");
                self.inner.transport.abort();
                Ok(())
            }
            Err(_) => {
                tracing::error!("Graceful close timed out, aborting the transport");
                self.inner.transport.abort();
                if let Some(reader) = self.reader.lock().take() {
                    reader.abort();
                }
                Err(ConnectionError::GracefulCloseTimeout { timeout_secs })
            }
        }
    }

    /// Final teardown. Safe to call more than once; everything after it
    /// fails with [`ConnectionError::Disposed`].
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(reader) = self.reader.lock().take() {
            reader.abort();
        }
        tracing::debug!("Connection manager disposed");
    }

    /// Relay a player log line to the moderator
    pub async fn send_log(&self, message: &str) -> Result<(), ConnectionError> {
        if !self.inner.connected.load(Ordering::SeqCst) {
            return Err(ConnectionError::NotConnected);
        }
        self.inner.send_log(message).await
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }
}

impl<T> Inner<T>
where
    T: Transport,
{
    fn deliver_status(&self, mut status: StatusEvent) {
        // Direct delivery runs on the reader task, not the host's own thread
        if matches!(self.delivery, Delivery::Direct(_)) {
            status.out_of_band = true;
        }
        self.delivery.deliver(QueueEvent::Status(status));
    }

    async fn join_session(&self, announcement: &str) -> Result<(), ConnectionError> {
        let join = serde_json::json!({ "sessionCode": self.session });
        self.transport
            .invoke(messages::JOIN_SESSION, join)
            .await
            .map_err(|e| ConnectionError::HandshakeFailure {
                call: messages::JOIN_SESSION.to_string(),
                source: Box::new(e),
            })?;
        self.send_log(announcement).await
    }

    async fn send_log(&self, message: &str) -> Result<(), ConnectionError> {
        let envelope = SessionEnvelope {
            session_code: self.session.clone(),
            body: TextLogPayload {
                from: LOG_SOURCE.to_string(),
                message: message.to_string(),
            },
        };
        let payload = serde_json::to_value(&envelope)
            .map_err(|e| ConnectionError::UnexpectedClosure(Box::new(e)))?;
        self.transport
            .invoke(messages::SEND_LOG, payload)
            .await
            .map_err(|e| ConnectionError::HandshakeFailure {
                call: messages::SEND_LOG.to_string(),
                source: Box::new(e),
            })
    }

    async fn handle_message(&self, target: &str, payload: serde_json::Value) {
        match target {
            messages::RECEIVE_COMMAND => {
                match serde_json::from_value::<CommandPayload>(payload.clone()) {
                    Ok(command) => self.delivery.deliver(QueueEvent::Command(command)),
                    Err(e) => tracing::warn!("Discarding malformed command: {e}"),
                }
                // The moderator expects the echo even when we could not
                // apply the command
                self.ack(messages::ACK_COMMAND, payload).await;
            }
            messages::RECEIVE_PREDEFINED_COMMAND => {
                match serde_json::from_value::<PredefinedPayload>(payload.clone()) {
                    Ok(predefined) => self.delivery.deliver(QueueEvent::Predefined(predefined)),
                    Err(e) => tracing::warn!("Discarding malformed predefined command: {e}"),
                }
                self.ack(messages::ACK_PREDEFINED_COMMAND, payload).await;
            }
            other => {
                tracing::debug!("Ignoring unhandled hub call '{other}'");
            }
        }
    }

    async fn ack(&self, target: &str, payload: serde_json::Value) {
        let mut echo = payload;
        if let serde_json::Value::Object(map) = &mut echo {
            map.insert(
                "sessionCode".to_string(),
                serde_json::Value::String(self.session.as_str().to_string()),
            );
        }
        if let Err(e) = self.transport.invoke(target, echo).await {
            tracing::warn!("Acknowledgement '{target}' failed: {e}");
            self.deliver_status(StatusEvent::with_detail(
                ConnectionStatus::InvokeFailed,
                e.to_string(),
            ));
        }
    }
}

/// Single long-lived consumer of the transport's event stream
async fn reader_loop<T: Transport>(
    inner: Arc<Inner<T>>,
    mut events: UnboundedReceiver<TransportEvent>,
) {
    while let Some(event) = events.recv().await {
        match event {
            TransportEvent::Message { target, payload } => {
                inner.handle_message(&target, payload).await;
            }
            TransportEvent::Reconnecting(detail) => {
                inner.connected.store(false, Ordering::SeqCst);
                let status = match detail {
                    Some(detail) => {
                        StatusEvent::with_detail(ConnectionStatus::Reconnecting, detail)
                    }
                    None => StatusEvent::new(ConnectionStatus::Reconnecting),
                };
                inner.deliver_status(status);
            }
            TransportEvent::Reconnected => {
                // Group membership does not survive the transport drop
                match inner.join_session("Has rejoined the session").await {
                    Ok(()) => {
                        inner.connected.store(true, Ordering::SeqCst);
                        inner.deliver_status(StatusEvent::new(ConnectionStatus::Reconnected));
                    }
                    Err(e) => {
                        tracing::error!("Rejoin after reconnect failed: {e}");
                        inner.deliver_status(StatusEvent::with_detail(
                            ConnectionStatus::InvokeFailed,
                            e.to_string(),
                        ));
                    }
                }
            }
            TransportEvent::Closed(detail) => {
                inner.connected.store(false, Ordering::SeqCst);
                let status = match detail {
                    Some(detail) => {
                        StatusEvent::with_detail(ConnectionStatus::Disconnected, detail)
                    }
                    None => StatusEvent::new(ConnectionStatus::Disconnected),
                };
                inner.deliver_status(status);
            }
        }
    }
}
