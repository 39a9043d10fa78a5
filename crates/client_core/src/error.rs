use shared::domain::ConnectionState;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("invalid endpoint base '{base}': {source}")]
    InvalidBase {
        base: String,
        source: url::ParseError,
    },
    #[error("unsupported endpoint scheme '{scheme}' (expected ws, wss, http or https)")]
    UnsupportedScheme { scheme: String },
    #[error("endpoint base '{base}' cannot carry a path")]
    CannotBeABase { base: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("channel is closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("connect is not permitted while {state}")]
    ConnectNotPermitted { state: ConnectionState },
    #[error("close is not permitted while {state}")]
    CloseNotPermitted { state: ConnectionState },
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
    #[error("channel send failed: {0}")]
    Channel(#[from] ChannelError),
}
