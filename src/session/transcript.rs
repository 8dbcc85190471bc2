//! In-memory ordered transcript for the active conversation.

use crate::types::{Message, Role};

/// Ordered messages the model sees: one synthetic system message, then the
/// stored history, then turns appended during this session.
///
/// Grows monotonically; nothing is ever removed.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Start a transcript seeded with the system prompt.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    /// Rebuild from stored history. Stored system rows are skipped; the
    /// seeded system prompt stands in for them.
    pub fn rebuild(system_prompt: impl Into<String>, history: Vec<Message>) -> Self {
        let mut transcript = Self::new(system_prompt);
        transcript
            .messages
            .extend(history.into_iter().filter(|m| m.role != Role::System));
        transcript
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_transcript_holds_only_the_system_prompt() {
        let t = Transcript::new("You are an expert in anime");
        assert_eq!(t.len(), 1);
        assert_eq!(t.messages()[0].role, Role::System);
        assert_eq!(t.messages()[0].content, "You are an expert in anime");
    }

    #[test]
    fn rebuild_drops_stored_system_rows_and_keeps_order() {
        let history = vec![
            Message::system("old prompt"),
            Message::user("hi"),
            Message::assistant("hello"),
        ];
        let t = Transcript::rebuild("new prompt", history);

        let view: Vec<_> = t
            .messages()
            .iter()
            .map(|m| (m.role, m.content.as_str()))
            .collect();
        assert_eq!(
            view,
            vec![
                (Role::System, "new prompt"),
                (Role::User, "hi"),
                (Role::Assistant, "hello"),
            ]
        );
    }
}
