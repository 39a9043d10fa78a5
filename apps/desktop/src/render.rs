//! Line-oriented rendering of the chat panel to a terminal.

use std::io::{self, Write};

use client_core::{
    panel::TYPING_LABEL, PanelModel, SessionEvent, StatusDot, StatusIndicator, TranscriptView,
};
use shared::domain::{ChatMessage, Origin};

pub fn status_line(indicator: StatusIndicator) -> String {
    let dot = match indicator.dot {
        StatusDot::Green => "green",
        StatusDot::Red => "red",
    };
    format!("[{dot}] {}", indicator.label)
}

pub struct Printer<W: Write> {
    json: bool,
    out: W,
}

impl<W: Write> Printer<W> {
    pub fn new(json: bool, out: W) -> Self {
        Self { json, out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn header(&mut self, panel: &PanelModel) -> io::Result<()> {
        if self.json {
            return Ok(());
        }
        writeln!(self.out, "== {} ==  {}", panel.title(), status_line(panel.status()))?;
        if let Some(greeting) = panel.greeting() {
            writeln!(self.out, "assistant: {greeting}")?;
        }
        self.out.flush()
    }

    pub fn notice(&mut self, text: &str) -> io::Result<()> {
        if self.json {
            return Ok(());
        }
        writeln!(self.out, "-- {text}")?;
        self.out.flush()
    }

    pub fn status(&mut self, panel: &PanelModel) -> io::Result<()> {
        if self.json {
            return Ok(());
        }
        let visibility = if panel.is_open() { "open" } else { "closed" };
        writeln!(
            self.out,
            "-- {} (panel {visibility}, send {})",
            status_line(panel.status()),
            if panel.submit_enabled() { "enabled" } else { "disabled" }
        )?;
        self.out.flush()
    }

    /// `panel` must already have `event` applied.
    pub fn event(&mut self, event: &SessionEvent, panel: &PanelModel) -> io::Result<()> {
        if self.json {
            let line = serde_json::to_string(event).map_err(io::Error::other)?;
            writeln!(self.out, "{line}")?;
            return self.out.flush();
        }

        match event {
            SessionEvent::StateChanged(_) => {
                writeln!(self.out, "-- {}", status_line(panel.status()))?;
            }
            SessionEvent::MessageAppended(message) => self.write_message(message)?,
            SessionEvent::PendingReplyChanged(true) => writeln!(self.out, "-- {TYPING_LABEL}")?,
            SessionEvent::PendingReplyChanged(false) => {}
            SessionEvent::TransportFailed(failure) => {
                writeln!(self.out, "-- connection ended: {}", failure.message)?;
            }
        }
        self.out.flush()
    }

    fn write_message(&mut self, message: &ChatMessage) -> io::Result<()> {
        let speaker = match message.origin {
            Origin::Local => "you",
            Origin::Remote => "assistant",
        };
        writeln!(self.out, "{speaker}: {}", message.text)
    }
}

impl<W: Write> TranscriptView for Printer<W> {
    fn append(&mut self, message: &ChatMessage) {
        let _ = self.write_message(message).and_then(|()| self.out.flush());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::{ConnectionState, MessageSeq};

    fn message(origin: Origin, text: &str) -> ChatMessage {
        ChatMessage {
            seq: MessageSeq(0),
            origin,
            text: text.to_string(),
            appended_at: "2024-01-01T00:00:00Z".parse().expect("timestamp"),
        }
    }

    fn output(printer: Printer<Vec<u8>>) -> String {
        String::from_utf8(printer.into_inner()).expect("utf8")
    }

    #[test]
    fn status_line_names_dot_colour() {
        assert_eq!(
            status_line(StatusIndicator::for_state(ConnectionState::Connected)),
            "[green] Connected"
        );
        assert_eq!(
            status_line(StatusIndicator::for_state(ConnectionState::Error)),
            "[red] Error"
        );
    }

    #[test]
    fn prints_greeting_then_messages_by_speaker() {
        let panel = PanelModel::default();
        let mut printer = Printer::new(false, Vec::new());

        printer.header(&panel).expect("header");
        printer
            .event(
                &SessionEvent::MessageAppended(message(Origin::Local, "hi")),
                &panel,
            )
            .expect("event");
        TranscriptView::append(&mut printer, &message(Origin::Remote, "hello there"));

        assert_eq!(
            output(printer),
            "== AI Assistant ==  [red] Disconnected\n\
             assistant: Hello! How can I help you today?\n\
             you: hi\n\
             assistant: hello there\n"
        );
    }

    #[test]
    fn prints_typing_indicator_only_when_pending() {
        let panel = PanelModel::default();
        let mut printer = Printer::new(false, Vec::new());

        printer
            .event(&SessionEvent::PendingReplyChanged(true), &panel)
            .expect("event");
        printer
            .event(&SessionEvent::PendingReplyChanged(false), &panel)
            .expect("event");

        assert_eq!(output(printer), "-- Assistant is typing...\n");
    }

    #[test]
    fn json_mode_emits_one_event_per_line() {
        let panel = PanelModel::default();
        let mut printer = Printer::new(true, Vec::new());

        printer.header(&panel).expect("header");
        printer
            .event(
                &SessionEvent::StateChanged(ConnectionState::Connecting),
                &panel,
            )
            .expect("event");

        assert_eq!(
            output(printer),
            "{\"type\":\"state_changed\",\"payload\":\"connecting\"}\n"
        );
    }
}
