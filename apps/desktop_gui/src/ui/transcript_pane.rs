use client_core::TranscriptView;
use shared::domain::ChatMessage;

/// Messages shown in the panel's scroll area. Every append asks the next
/// frame to scroll to the newest entry.
#[derive(Debug, Default)]
pub struct TranscriptPane {
    messages: Vec<ChatMessage>,
    scroll_to_newest: bool,
}

impl TranscriptPane {
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_to_newest)
    }
}

impl TranscriptView for TranscriptPane {
    fn append(&mut self, message: &ChatMessage) {
        self.messages.push(message.clone());
        self.scroll_to_newest = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::{MessageSeq, Origin};

    fn message(seq: u64, text: &str) -> ChatMessage {
        ChatMessage {
            seq: MessageSeq(seq),
            origin: Origin::Local,
            text: text.to_string(),
            appended_at: "2024-01-01T00:00:00Z".parse().expect("timestamp"),
        }
    }

    #[test]
    fn append_keeps_order_and_requests_scroll_once() {
        let mut pane = TranscriptPane::default();
        assert!(!pane.take_scroll_request());

        pane.append(&message(0, "one"));
        pane.append(&message(1, "two"));

        assert!(pane.take_scroll_request());
        assert!(!pane.take_scroll_request());
        let texts: Vec<&str> = pane.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two"]);
    }
}
