//! Presentation state for the chat panel, shared by the terminal and GUI
//! front-ends. Pure: it never touches the session directly, it only consumes
//! [`SessionEvent`]s and hands back [`PanelCommand`]s.

use shared::domain::ConnectionState;

use crate::SessionEvent;

pub const DEFAULT_TITLE: &str = "AI Assistant";
pub const DEFAULT_GREETING: &str = "Hello! How can I help you today?";
pub const TYPING_LABEL: &str = "Assistant is typing...";
pub const INPUT_PLACEHOLDER: &str = "Type your message...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusDot {
    Green,
    Red,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusIndicator {
    pub dot: StatusDot,
    pub label: &'static str,
}

impl StatusIndicator {
    pub fn for_state(state: ConnectionState) -> Self {
        match state {
            ConnectionState::Connected => Self {
                dot: StatusDot::Green,
                label: "Connected",
            },
            ConnectionState::Connecting => Self {
                dot: StatusDot::Red,
                label: "Connecting...",
            },
            ConnectionState::Disconnected => Self {
                dot: StatusDot::Red,
                label: "Disconnected",
            },
            ConnectionState::Error => Self {
                dot: StatusDot::Red,
                label: "Error",
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelCommand {
    Connect,
    Send(String),
}

#[derive(Debug, Clone)]
pub struct PanelModel {
    title: String,
    greeting: Option<String>,
    open: bool,
    state: ConnectionState,
    typing: bool,
    last_failure: Option<String>,
    pub input: String,
}

impl PanelModel {
    pub fn new(title: impl Into<String>, greeting: Option<String>) -> Self {
        Self {
            title: title.into(),
            greeting,
            open: false,
            state: ConnectionState::Disconnected,
            typing: false,
            last_failure: None,
            input: String::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn greeting(&self) -> Option<&str> {
        self.greeting.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn status(&self) -> StatusIndicator {
        StatusIndicator::for_state(self.state)
    }

    pub fn submit_enabled(&self) -> bool {
        self.state.permits_submission()
    }

    pub fn typing_visible(&self) -> bool {
        self.typing
    }

    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    /// Opening the panel while no channel exists asks for a connection.
    pub fn toggle(&mut self) -> Option<PanelCommand> {
        self.open = !self.open;
        (self.open && self.state.permits_connect()).then_some(PanelCommand::Connect)
    }

    pub fn apply(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::StateChanged(state) => {
                self.state = *state;
                if *state == ConnectionState::Connected {
                    self.last_failure = None;
                }
            }
            SessionEvent::PendingReplyChanged(pending) => self.typing = *pending,
            SessionEvent::TransportFailed(failure) => {
                self.last_failure = Some(failure.message.clone());
            }
            SessionEvent::MessageAppended(_) => {}
        }
    }

    /// Takes the trimmed input for sending. Blank input, or input typed while
    /// submission is disabled, stays in the buffer.
    pub fn take_submission(&mut self) -> Option<PanelCommand> {
        if !self.submit_enabled() {
            return None;
        }
        let text = self.input.trim();
        if text.is_empty() {
            return None;
        }
        let text = text.to_string();
        self.input.clear();
        Some(PanelCommand::Send(text))
    }
}

impl Default for PanelModel {
    fn default() -> Self {
        Self::new(DEFAULT_TITLE, Some(DEFAULT_GREETING.to_string()))
    }
}

#[cfg(test)]
#[path = "tests/panel_tests.rs"]
mod tests;
