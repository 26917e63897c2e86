/// Event types crossing the network/presentation boundary
///
/// Everything the network side produces travels through the event queue as
/// one of these variants, so command and status events stay ordered relative
/// to each other exactly as received.
use crate::protocol::{CommandPayload, PredefinedPayload, StatusEvent};

/// An event produced by the connection layer for the presentation consumer
#[derive(Debug, Clone, PartialEq)]
pub enum QueueEvent {
    /// A content-bearing moderator command
    Command(CommandPayload),

    /// A predefined (reset/control) command
    Predefined(PredefinedPayload),

    /// A connection status transition
    Status(StatusEvent),
}

/// A queued event plus its arrival order.
///
/// Lifecycle: created by a producer call, consumed and discarded by exactly
/// one drain; never retried or requeued.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    /// Monotonic arrival order assigned at enqueue time
    pub arrival_order: u64,
    pub event: QueueEvent,
}

impl QueueEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            QueueEvent::Command(cmd) => {
                let mut parts = Vec::new();
                if cmd.timer.is_some() {
                    parts.push("timer");
                }
                if !cmd.audio_ids.is_empty() {
                    parts.push("audio");
                }
                if cmd.image_id.is_some() {
                    parts.push("image");
                }
                if cmd.text.as_deref().is_some_and(|t| !t.is_empty()) {
                    parts.push("text");
                }
                if parts.is_empty() {
                    "Command (empty)".to_string()
                } else {
                    format!("Command ({})", parts.join("+"))
                }
            }
            QueueEvent::Predefined(p) => {
                format!(
                    "Predefined (stop_sfx={}, clear={}, stop_bgm={})",
                    p.stop_sound_effects(),
                    p.clear_screen(),
                    p.stop_bgm()
                )
            }
            QueueEvent::Status(s) => format!("Status ({:?})", s.status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::AssetId;

    #[test]
    fn test_event_description() {
        let event = QueueEvent::Command(CommandPayload {
            timer: Some(10),
            audio_ids: vec![AssetId(5)],
            ..Default::default()
        });
        assert_eq!(event.description(), "Command (timer+audio)");

        let event = QueueEvent::Command(CommandPayload::default());
        assert_eq!(event.description(), "Command (empty)");

        let event = QueueEvent::Predefined(PredefinedPayload {
            clear_screen: Some(true),
            ..Default::default()
        });
        assert_eq!(
            event.description(),
            "Predefined (stop_sfx=false, clear=true, stop_bgm=false)"
        );
    }
}
