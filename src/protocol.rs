/// Wire protocol types shared with the session hub
///
/// Message names and payload field names must match the server exactly, so
/// every serde-visible name here is part of the wire contract. Payloads are
/// carried as JSON inside `{"target": <name>, "payload": <value>}` frames.
use serde::{Deserialize, Serialize};

/// Hub message names. Inbound names are registered as handlers, outbound
/// names are invoked/sent by the connection manager.
pub mod messages {
    /// Inbound: moderator issued a presentation command
    pub const RECEIVE_COMMAND: &str = "receiveCommand";
    /// Inbound: moderator issued a predefined (reset/control) command
    pub const RECEIVE_PREDEFINED_COMMAND: &str = "receivePredefinedCommand";
    /// Outbound: join handshake identifying the session
    pub const JOIN_SESSION: &str = "joinSession";
    /// Outbound: echo-acknowledge a received command
    pub const ACK_COMMAND: &str = "ackCommand";
    /// Outbound: echo-acknowledge a received predefined command
    pub const ACK_PREDEFINED_COMMAND: &str = "ackPredefinedCommand";
    /// Outbound: free-form player log line for the moderator
    pub const SEND_LOG: &str = "sendLog";
}

/// Opaque identifier naming one moderator-run session.
///
/// Created once when the player enters the session and read-only thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionCode(String);

impl SessionCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of an audio or image asset in the session's asset catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub i64);

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A content-bearing moderator command.
///
/// A single message may set any combination of the four fields; they are
/// applied in one pass in a fixed order (timer, audio, image, text).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommandPayload {
    /// Countdown seconds; `Some(n)` with n > 0 starts/replaces the timer
    pub timer: Option<u64>,

    /// Audio assets to trigger, in order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub audio_ids: Vec<AssetId>,

    /// Image to show, replacing the current one
    pub image_id: Option<AssetId>,

    /// Caption text to show; empty or missing clears it when an image is set
    pub text: Option<String>,
}

/// A control burst: stop/clear flags rather than presentation content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PredefinedPayload {
    pub stop_sound_effects: Option<bool>,
    pub clear_screen: Option<bool>,
    pub stop_bgm: Option<bool>,
}

impl PredefinedPayload {
    pub fn stop_sound_effects(&self) -> bool {
        self.stop_sound_effects.unwrap_or(false)
    }

    pub fn clear_screen(&self) -> bool {
        self.clear_screen.unwrap_or(false)
    }

    pub fn stop_bgm(&self) -> bool {
        self.stop_bgm.unwrap_or(false)
    }
}

/// Player-originated log line relayed to the moderator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLogPayload {
    pub from: String,
    pub message: String,
}

/// Outbound envelope pairing a session code with an echoed payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEnvelope<T> {
    pub session_code: SessionCode,
    #[serde(flatten)]
    pub body: T,
}

/// Transition of the hub connection lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Reconnecting,
    Reconnected,
    Disconnected,
    FailedToConnect,
    InvokeFailed,
}

/// A connection status transition plus its cause, consumed once by the
/// UI/log layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub status: ConnectionStatus,

    /// Human-readable error detail, when the transition was caused by one
    pub detail: Option<String>,

    /// True when the status originated from an out-of-band notifier (e.g. a
    /// platform bridge) rather than the transport itself
    pub out_of_band: bool,
}

impl StatusEvent {
    pub fn new(status: ConnectionStatus) -> Self {
        Self {
            status,
            detail: None,
            out_of_band: false,
        }
    }

    pub fn with_detail(status: ConnectionStatus, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: Some(detail.into()),
            out_of_band: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_payload_wire_names() {
        let json = r#"{"timer":10,"audioIds":[5,9],"imageId":3,"text":"hello"}"#;
        let cmd: CommandPayload = serde_json::from_str(json).unwrap();

        assert_eq!(cmd.timer, Some(10));
        assert_eq!(cmd.audio_ids, vec![AssetId(5), AssetId(9)]);
        assert_eq!(cmd.image_id, Some(AssetId(3)));
        assert_eq!(cmd.text.as_deref(), Some("hello"));
    }

    #[test]
    fn test_command_payload_missing_fields_default() {
        let cmd: CommandPayload = serde_json::from_str("{}").unwrap();
        assert_eq!(cmd, CommandPayload::default());
        assert!(cmd.audio_ids.is_empty());
    }

    #[test]
    fn test_predefined_payload_flags() {
        let json = r#"{"stopSoundEffects":true,"clearScreen":false}"#;
        let p: PredefinedPayload = serde_json::from_str(json).unwrap();

        assert!(p.stop_sound_effects());
        assert!(!p.clear_screen());
        // Missing flag is treated as unset
        assert!(!p.stop_bgm());
    }

    #[test]
    fn test_session_envelope_flattens_body() {
        let envelope = SessionEnvelope {
            session_code: SessionCode::new("ABCD"),
            body: TextLogPayload {
                from: "A player".to_string(),
                message: "Has joined".to_string(),
            },
        };

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["sessionCode"], "ABCD");
        assert_eq!(value["from"], "A player");
        assert_eq!(value["message"], "Has joined");
    }
}
