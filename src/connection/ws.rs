/// WebSocket transport
///
/// Frames are JSON objects `{"target": "...", "payload": ...}` in both
/// directions. The pump task owns the socket; callers only see the outbound
/// sender and the [`TransportEvent`] stream. Mid-session link drops are
/// retried here with jittered backoff; the initial open is not.
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::transport::{Transport, TransportEvent};
use crate::error::ConnectionError;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

const BACKOFF_BASE_MS: u64 = 500;
const BACKOFF_CAP_MS: u64 = 15_000;
const BACKOFF_JITTER_MS: u64 = 250;

#[derive(Debug, Serialize, Deserialize)]
struct WireFrame {
    target: String,
    #[serde(default)]
    payload: serde_json::Value,
}

enum Outbound {
    Frame(String),
    Close,
}

pub struct WsTransport {
    url: String,
    reconnect_attempts: u32,
    events_tx: UnboundedSender<TransportEvent>,
    events_rx: Mutex<Option<UnboundedReceiver<TransportEvent>>>,
    outbound: Mutex<Option<UnboundedSender<Outbound>>>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl WsTransport {
    pub fn new(url: impl Into<String>, reconnect_attempts: u32) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            url: url.into(),
            reconnect_attempts,
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
            outbound: Mutex::new(None),
            pump: Mutex::new(None),
        }
    }

    fn send_outbound(&self, message: Outbound) -> Result<(), ConnectionError> {
        let guard = self.outbound.lock();
        let tx = guard.as_ref().ok_or(ConnectionError::NotConnected)?;
        tx.send(message).map_err(|_| ConnectionError::NotConnected)
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn open(&self) -> Result<(), ConnectionError> {
        let (stream, _response) = connect_async(self.url.as_str())
            .await
            .map_err(|e| ConnectionError::TransportOpenFailure(Box::new(e)))?;
        tracing::info!(url = %self.url, "WebSocket link established");

        let (sink, source) = stream.split();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        *self.outbound.lock() = Some(outbound_tx);

        let pump = tokio::spawn(pump_loop(
            self.url.clone(),
            self.reconnect_attempts,
            sink,
            source,
            outbound_rx,
            self.events_tx.clone(),
        ));
        *self.pump.lock() = Some(pump);
        Ok(())
    }

    async fn invoke(
        &self,
        target: &str,
        payload: serde_json::Value,
    ) -> Result<(), ConnectionError> {
        let frame = WireFrame {
            target: target.to_string(),
            payload,
        };
        let text = serde_json::to_string(&frame)
            .map_err(|e| ConnectionError::UnexpectedClosure(Box::new(e)))?;
        self.send_outbound(Outbound::Frame(text))
    }

    async fn close(&self) -> Result<(), ConnectionError> {
        self.send_outbound(Outbound::Close)?;
        let pump = self.pump.lock().take();
        if let Some(pump) = pump {
            let _ = pump.await;
        }
        *self.outbound.lock() = None;
        Ok(())
    }

    fn abort(&self) {
        *self.outbound.lock() = None;
        if let Some(pump) = self.pump.lock().take() {
            pump.abort();
        }
        tracing::warn!("WebSocket link aborted without close handshake");
    }

    fn take_events(&self) -> Option<UnboundedReceiver<TransportEvent>> {
        self.events_rx.lock().take()
    }
}

/// Socket owner. Returns only when the caller closes or retries run out.
async fn pump_loop(
    url: String,
    reconnect_attempts: u32,
    mut sink: WsSink,
    mut source: WsSource,
    mut outbound: UnboundedReceiver<Outbound>,
    events: UnboundedSender<TransportEvent>,
) {
    loop {
        let drop_reason = loop {
            tokio::select! {
                message = outbound.recv() => match message {
                    Some(Outbound::Frame(text)) => {
                        if let Err(e) = sink.send(Message::Text(text)).await {
                            break Some(e.to_string());
                        }
                    }
                    Some(Outbound::Close) | None => {
                        let _ = sink.send(Message::Close(None)).await;
                        let _ = events.send(TransportEvent::Closed(None));
                        return;
                    }
                },
                frame = source.next() => match frame {
                    Some(Ok(Message::Text(text))) => match serde_json::from_str::<WireFrame>(&text) {
                        Ok(frame) => {
                            let _ = events.send(TransportEvent::Message {
                                target: frame.target,
                                payload: frame.payload,
                            });
                        }
                        Err(e) => {
                            tracing::warn!("Discarding unparseable frame: {e}");
                        }
                    },
                    Some(Ok(Message::Close(close))) => {
                        break close.map(|c| c.reason.to_string());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => break Some(e.to_string()),
                    None => break None,
                },
            }
        };

        tracing::warn!(reason = ?drop_reason, "WebSocket link dropped, retrying");
        let _ = events.send(TransportEvent::Reconnecting(drop_reason));

        match redial(&url, reconnect_attempts).await {
            Some(stream) => {
                (sink, source) = stream.split();
                let _ = events.send(TransportEvent::Reconnected);
            }
            None => {
                let detail = format!("gave up after {reconnect_attempts} reconnect attempts");
                tracing::error!("{detail}");
                let _ = events.send(TransportEvent::Closed(Some(detail)));
                return;
            }
        }
    }
}

async fn redial(
    url: &str,
    attempts: u32,
) -> Option<WebSocketStream<MaybeTlsStream<TcpStream>>> {
    for attempt in 1..=attempts {
        tokio::time::sleep(backoff(attempt)).await;
        match connect_async(url).await {
            Ok((stream, _)) => {
                tracing::info!(attempt, "WebSocket link re-established");
                return Some(stream);
            }
            Err(e) => {
                tracing::warn!(attempt, "Reconnect attempt failed: {e}");
            }
        }
    }
    None
}

fn backoff(attempt: u32) -> Duration {
    let exp = BACKOFF_BASE_MS.saturating_mul(1u64 << attempt.min(10)).min(BACKOFF_CAP_MS);
    let jitter = rand::thread_rng().gen_range(0..BACKOFF_JITTER_MS);
    Duration::from_millis(exp + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_and_caps() {
        let first = backoff(1);
        let late = backoff(30);
        assert!(first >= Duration::from_millis(BACKOFF_BASE_MS * 2));
        assert!(late <= Duration::from_millis(BACKOFF_CAP_MS + BACKOFF_JITTER_MS));
    }

    #[test]
    fn test_wire_frame_round_trip() {
        let text = r#"{"target":"receiveCommand","payload":{"timer":30}}"#;
        let frame: WireFrame = serde_json::from_str(text).unwrap();
        assert_eq!(frame.target, "receiveCommand");
        assert_eq!(frame.payload["timer"], 30);

        let bare: WireFrame = serde_json::from_str(r#"{"target":"ping"}"#).unwrap();
        assert!(bare.payload.is_null());
    }

    #[tokio::test]
    async fn test_invoke_without_open_link_fails() {
        let transport = WsTransport::new("ws://127.0.0.1:1/hub", 3);
        let err = transport
            .invoke("joinSession", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectionError::NotConnected));
    }

    #[test]
    fn test_take_events_yields_once() {
        let transport = WsTransport::new("ws://127.0.0.1:1/hub", 3);
        assert!(transport.take_events().is_some());
        assert!(transport.take_events().is_none());
    }
}
