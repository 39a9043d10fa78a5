//! UI layer: host window, floating toggle, and the slide-in chat panel.

pub mod app;
pub mod transcript_pane;

pub use app::ChatPanelApp;
