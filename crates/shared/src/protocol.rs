use serde::{Deserialize, Serialize};

use crate::{domain::ChannelAttempt, error::TransportFailure};

/// Everything a channel can report back to the session that owns it. Payload
/// frames are raw UTF-8 text with no envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ChannelEvent {
    Opened,
    Text { text: String },
    Closed { reason: String },
    Failed { reason: String },
}

impl ChannelEvent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn closed(reason: impl Into<String>) -> Self {
        Self::Closed {
            reason: reason.into(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    pub fn failure(&self) -> Option<TransportFailure> {
        match self {
            Self::Closed { reason } => Some(TransportFailure::closed(reason.clone())),
            Self::Failed { reason } => Some(TransportFailure::error(reason.clone())),
            Self::Opened | Self::Text { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSignal {
    pub attempt: ChannelAttempt,
    pub event: ChannelEvent,
}

impl ChannelSignal {
    pub fn new(attempt: ChannelAttempt, event: ChannelEvent) -> Self {
        Self { attempt, event }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportFailureKind;

    #[test]
    fn terminal_events_map_onto_failure_kinds() {
        assert_eq!(
            ChannelEvent::closed("bye").failure().map(|f| f.kind),
            Some(TransportFailureKind::TransportClosed)
        );
        assert_eq!(
            ChannelEvent::failed("reset").failure().map(|f| f.kind),
            Some(TransportFailureKind::TransportError)
        );
        assert!(ChannelEvent::Opened.failure().is_none());
        assert!(ChannelEvent::text("hi").failure().is_none());
    }

    #[test]
    fn channel_event_uses_tagged_json() {
        let json = serde_json::to_value(ChannelEvent::text("hello")).expect("json");
        assert_eq!(
            json,
            serde_json::json!({ "type": "text", "payload": { "text": "hello" } })
        );
    }
}
