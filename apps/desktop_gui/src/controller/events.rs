//! UI/backend events and error modeling for the chat panel controller.

use client_core::SessionEvent;

#[derive(Debug, Clone)]
pub enum UiEvent {
    Ready { client_id: String },
    Session(SessionEvent),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Connect,
    SendMessage,
    Disconnect,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("invalid")
            || message_lower.contains("unsupported")
            || message_lower.contains("not permitted")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("connect")
            || message_lower.contains("connection")
            || message_lower.contains("channel")
            || message_lower.contains("websocket")
            || message_lower.contains("closed")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Short text for the panel footer.
    pub fn user_message(&self) -> String {
        match (self.context, self.category) {
            (UiErrorContext::BackendStartup, _) => {
                format!("Chat backend failed to start: {}", self.message)
            }
            (UiErrorContext::SendMessage, UiErrorCategory::Transport) => {
                "Message not sent; the connection is closed.".to_string()
            }
            (UiErrorContext::Connect, UiErrorCategory::Transport) => {
                "Server unreachable; check the endpoint and reopen the panel.".to_string()
            }
            _ => self.message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_closed_channel_send_as_transport() {
        let err = UiError::from_message(UiErrorContext::SendMessage, "channel send failed: channel is closed");

        assert_eq!(err.category(), UiErrorCategory::Transport);
        assert_eq!(err.user_message(), "Message not sent; the connection is closed.");
    }

    #[test]
    fn classifies_rejected_connect_as_validation() {
        let err = UiError::from_message(
            UiErrorContext::Connect,
            "connect is not permitted while connecting",
        );

        assert_eq!(err.category(), UiErrorCategory::Validation);
        assert_eq!(err.context(), UiErrorContext::Connect);
        assert_eq!(err.user_message(), err.message());
    }

    #[test]
    fn startup_failures_are_prefixed() {
        let err = UiError::from_message(
            UiErrorContext::BackendStartup,
            "unsupported endpoint scheme 'ftp'",
        );

        assert!(err.user_message().starts_with("Chat backend failed to start"));
    }
}
