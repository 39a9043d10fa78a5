use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shared::{
    domain::{ChannelAttempt, ChatMessage, ClientId, ConnectionState, Origin},
    protocol::{ChannelEvent, ChannelSignal},
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    endpoint::chat_endpoint,
    error::SessionError,
    transcript::Transcript,
    transport::{signal_queue, ChannelConnector, ChannelSignals, ChatChannel, SignalSender},
    SessionEvent,
};

const EVENT_CAPACITY: usize = 256;

/// What happens to the pending-reply indicator when the channel goes away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingReplyPolicy {
    /// Leave it untouched; only a received reply clears it.
    #[default]
    Retain,
    /// Clear it on every transition into `disconnected` or `error`.
    ClearOnTerminal,
}

impl PendingReplyPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "retain" => Some(Self::Retain),
            "clear_on_terminal" | "clear-on-terminal" => Some(Self::ClearOnTerminal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub endpoint_base: String,
    pub client_id: ClientId,
    pub pending_reply_policy: PendingReplyPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    IgnoredBlank,
    NotConnected,
}

struct ActiveChannel {
    attempt: ChannelAttempt,
    handle: Box<dyn ChatChannel>,
}

type StateObserver = Box<dyn FnMut(ConnectionState) + Send>;
type MessageObserver = Box<dyn FnMut(&ChatMessage) + Send>;

/// One user's connection lifecycle, its single channel handle and its
/// transcript. Driven by exactly one task: user commands and channel signals
/// are applied through `&mut self`, one at a time.
pub struct ChatSession {
    client_id: ClientId,
    endpoint: Url,
    connector: Arc<dyn ChannelConnector>,
    signals: SignalSender,
    state: ConnectionState,
    channel: Option<ActiveChannel>,
    last_attempt: ChannelAttempt,
    transcript: Transcript,
    pending_reply: bool,
    pending_reply_policy: PendingReplyPolicy,
    events: broadcast::Sender<SessionEvent>,
    state_observers: Vec<StateObserver>,
    message_observers: Vec<MessageObserver>,
}

impl ChatSession {
    pub fn new(
        options: SessionOptions,
        connector: Arc<dyn ChannelConnector>,
    ) -> Result<(Self, ChannelSignals), SessionError> {
        let endpoint = chat_endpoint(&options.endpoint_base, &options.client_id)?;
        let (signals, signal_rx) = signal_queue();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        info!(client_id = %options.client_id, %endpoint, "chat session created");

        let session = Self {
            client_id: options.client_id,
            endpoint,
            connector,
            signals,
            state: ConnectionState::Disconnected,
            channel: None,
            last_attempt: ChannelAttempt(0),
            transcript: Transcript::new(),
            pending_reply: false,
            pending_reply_policy: options.pending_reply_policy,
            events,
            state_observers: Vec::new(),
            message_observers: Vec::new(),
        };
        Ok((session, signal_rx))
    }

    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn pending_reply(&self) -> bool {
        self.pending_reply
    }

    pub fn pending_reply_policy(&self) -> PendingReplyPolicy {
        self.pending_reply_policy
    }

    pub fn submission_enabled(&self) -> bool {
        self.state.permits_submission()
    }

    pub fn has_channel(&self) -> bool {
        self.channel.is_some()
    }

    pub fn active_attempt(&self) -> Option<ChannelAttempt> {
        self.channel.as_ref().map(|channel| channel.attempt)
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn on_state_change(&mut self, observer: impl FnMut(ConnectionState) + Send + 'static) {
        self.state_observers.push(Box::new(observer));
    }

    pub fn on_message(&mut self, observer: impl FnMut(&ChatMessage) + Send + 'static) {
        self.message_observers.push(Box::new(observer));
    }

    pub fn connect(&mut self) -> Result<ChannelAttempt, SessionError> {
        if !self.state.permits_connect() || self.channel.is_some() {
            return Err(SessionError::ConnectNotPermitted { state: self.state });
        }

        let attempt = self.last_attempt.next();
        self.last_attempt = attempt;
        info!(client_id = %self.client_id, attempt = attempt.0, endpoint = %self.endpoint, "opening chat channel");
        let handle = self
            .connector
            .open(&self.endpoint, attempt, self.signals.clone());
        self.channel = Some(ActiveChannel { attempt, handle });
        self.set_state(ConnectionState::Connecting);
        Ok(attempt)
    }

    /// Local closure of an established channel. A `connecting` attempt cannot
    /// be aborted.
    pub fn close(&mut self) -> Result<(), SessionError> {
        if self.state != ConnectionState::Connected {
            return Err(SessionError::CloseNotPermitted { state: self.state });
        }
        self.release_channel();
        self.enter_terminal(ConnectionState::Disconnected);
        Ok(())
    }

    pub fn send(&mut self, text: &str) -> Result<SendOutcome, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(SendOutcome::IgnoredBlank);
        }
        if self.state != ConnectionState::Connected {
            return Ok(SendOutcome::NotConnected);
        }
        let Some(channel) = self.channel.as_mut() else {
            return Ok(SendOutcome::NotConnected);
        };

        channel.handle.send_text(text)?;
        debug!(client_id = %self.client_id, attempt = channel.attempt.0, len = text.len(), "sent chat message");
        self.append(Origin::Local, text);
        self.set_pending_reply(true);
        Ok(SendOutcome::Sent)
    }

    pub fn on_receive(&mut self, text: impl Into<String>) {
        self.set_pending_reply(false);
        self.append(Origin::Remote, text);
    }

    /// Applies one channel signal. Signals from any attempt other than the
    /// currently held handle are dropped.
    pub fn handle_signal(&mut self, signal: ChannelSignal) {
        let current = self.active_attempt();
        if current != Some(signal.attempt) {
            debug!(
                attempt = signal.attempt.0,
                current = current.map(|attempt| attempt.0),
                "dropping signal from released channel"
            );
            return;
        }

        match signal.event {
            ChannelEvent::Opened => {
                if self.state == ConnectionState::Connecting {
                    self.set_state(ConnectionState::Connected);
                } else {
                    warn!(state = %self.state, "channel opened outside of connecting state");
                }
            }
            ChannelEvent::Text { text } => {
                if self.state == ConnectionState::Connected {
                    self.on_receive(text);
                } else {
                    warn!(state = %self.state, "dropping text received before channel opened");
                }
            }
            event @ ChannelEvent::Closed { .. } => {
                self.channel = None;
                self.report_failure(&event);
                self.enter_terminal(ConnectionState::Disconnected);
            }
            event @ ChannelEvent::Failed { .. } => {
                self.release_channel();
                self.report_failure(&event);
                self.enter_terminal(ConnectionState::Error);
            }
        }
    }

    fn release_channel(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            channel.handle.close();
        }
    }

    fn report_failure(&self, event: &ChannelEvent) {
        let Some(failure) = event.failure() else {
            return;
        };
        info!(client_id = %self.client_id, kind = ?failure.kind, reason = %failure.message, "chat channel ended");
        let _ = self.events.send(SessionEvent::TransportFailed(failure));
    }

    fn enter_terminal(&mut self, state: ConnectionState) {
        self.set_state(state);
        if self.pending_reply_policy == PendingReplyPolicy::ClearOnTerminal {
            self.set_pending_reply(false);
        }
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state == state {
            return;
        }
        debug!(client_id = %self.client_id, from = %self.state, to = %state, "session state change");
        self.state = state;
        for observer in &mut self.state_observers {
            observer(state);
        }
        let _ = self.events.send(SessionEvent::StateChanged(state));
    }

    fn set_pending_reply(&mut self, pending: bool) {
        if self.pending_reply == pending {
            return;
        }
        self.pending_reply = pending;
        let _ = self.events.send(SessionEvent::PendingReplyChanged(pending));
    }

    fn append(&mut self, origin: Origin, text: impl Into<String>) {
        let message = self.transcript.append(origin, text).clone();
        for observer in &mut self.message_observers {
            observer(&message);
        }
        let _ = self.events.send(SessionEvent::MessageAppended(message));
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
