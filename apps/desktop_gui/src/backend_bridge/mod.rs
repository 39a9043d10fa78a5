//! Backend worker: owns the chat session and talks to the UI over channels.

pub mod commands;
pub mod runtime;
