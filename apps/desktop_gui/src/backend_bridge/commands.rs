//! Backend commands queued from UI to backend worker.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCommand {
    Connect,
    SendMessage { text: String },
    Disconnect,
    Shutdown,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Connect => "connect",
            BackendCommand::SendMessage { .. } => "send_message",
            BackendCommand::Disconnect => "disconnect",
            BackendCommand::Shutdown => "shutdown",
        }
    }
}
