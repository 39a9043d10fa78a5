use serde::Serialize;
use shared::{
    domain::{ChatMessage, ConnectionState},
    error::TransportFailure,
};

pub mod config;
pub mod endpoint;
pub mod error;
pub mod panel;
pub mod session;
pub mod transcript;
pub mod transport;

pub use config::{load_settings, ClientSettings};
pub use error::{ChannelError, EndpointError, SessionError};
pub use panel::{PanelCommand, PanelModel, StatusDot, StatusIndicator};
pub use session::{ChatSession, PendingReplyPolicy, SendOutcome, SessionOptions};
pub use transcript::{Transcript, TranscriptView};
pub use transport::{ChannelConnector, ChannelSignals, ChatChannel, SignalSender, WsConnector};

/// Observable changes of a [`ChatSession`], in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SessionEvent {
    StateChanged(ConnectionState),
    MessageAppended(ChatMessage),
    PendingReplyChanged(bool),
    TransportFailed(TransportFailure),
}
