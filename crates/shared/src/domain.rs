use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_CLIENT_ID_PREFIX: &str = "user_";

macro_rules! seq_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);
    };
}

seq_newtype!(MessageSeq);
seq_newtype!(ChannelAttempt);

impl ChannelAttempt {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Opaque per-process token that names this client to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(String);

impl ClientId {
    pub fn generate(prefix: &str) -> Self {
        Self(format!("{prefix}{}", Uuid::new_v4().simple()))
    }

    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Local,
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl ConnectionState {
    /// `Disconnected` and `Error` are interchangeable as far as `connect()` goes.
    pub fn permits_connect(self) -> bool {
        matches!(self, Self::Disconnected | Self::Error)
    }

    pub fn permits_submission(self) -> bool {
        self == Self::Connected
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Disconnected | Self::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub seq: MessageSeq,
    pub origin: Origin,
    pub text: String,
    pub appended_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_client_ids_carry_prefix_and_differ() {
        let a = ClientId::generate(DEFAULT_CLIENT_ID_PREFIX);
        let b = ClientId::generate(DEFAULT_CLIENT_ID_PREFIX);

        assert!(a.as_str().starts_with("user_"));
        assert_eq!(a.as_str().len(), "user_".len() + 32);
        assert_ne!(a, b);
    }

    #[test]
    fn only_terminal_states_permit_connect() {
        assert!(ConnectionState::Disconnected.permits_connect());
        assert!(ConnectionState::Error.permits_connect());
        assert!(!ConnectionState::Connecting.permits_connect());
        assert!(!ConnectionState::Connected.permits_connect());
    }

    #[test]
    fn connection_state_serializes_snake_case() {
        let json = serde_json::to_string(&ConnectionState::Connecting).expect("json");
        assert_eq!(json, "\"connecting\"");
    }
}
