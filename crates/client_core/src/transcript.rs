use chrono::Utc;
use shared::domain::{ChatMessage, MessageSeq, Origin};

/// Presentation sink for transcript entries. Implementations always bring
/// the newest entry into view.
pub trait TranscriptView {
    fn append(&mut self, message: &ChatMessage);
}

/// Append-only record of displayed messages, in causal send/receive order.
#[derive(Debug, Default, Clone)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, origin: Origin, text: impl Into<String>) -> &ChatMessage {
        let seq = MessageSeq(self.messages.len() as u64);
        self.messages.push(ChatMessage {
            seq,
            origin,
            text: text.into(),
            appended_at: Utc::now(),
        });
        &self.messages[self.messages.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, seq: MessageSeq) -> Option<&ChatMessage> {
        usize::try_from(seq.0)
            .ok()
            .and_then(|index| self.messages.get(index))
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    /// Replays every entry into `view`, oldest first.
    pub fn render_into(&self, view: &mut dyn TranscriptView) {
        for message in &self.messages {
            view.append(message);
        }
    }
}
