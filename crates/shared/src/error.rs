use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The two ways a channel can end. Both are terminal for the handle that
/// reported them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportFailureKind {
    TransportError,
    TransportClosed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind:?}: {message}")]
pub struct TransportFailure {
    pub kind: TransportFailureKind,
    pub message: String,
}

impl TransportFailure {
    pub fn new(kind: TransportFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(TransportFailureKind::TransportError, message)
    }

    pub fn closed(message: impl Into<String>) -> Self {
        Self::new(TransportFailureKind::TransportClosed, message)
    }
}
