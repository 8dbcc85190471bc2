//! Replay policy for the transcript sent to the model.

use serde::{Deserialize, Serialize};

use crate::types::{ChatMessage, Message, Role};

/// How much of the transcript is replayed to the model on each turn.
///
/// The transcript itself is never trimmed; the window only shapes the
/// request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryWindow {
    /// Replay every message.
    #[default]
    Unbounded,
    /// Replay the system messages plus the newest `max_messages` others.
    Sliding { max_messages: usize },
}

/// The request-side view of a transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowedContext {
    pub messages: Vec<ChatMessage>,
    pub dropped: usize,
}

impl HistoryWindow {
    pub fn sliding(max_messages: usize) -> Self {
        Self::Sliding { max_messages }
    }

    /// Select the messages to send, preserving their relative order.
    pub fn apply(&self, transcript: &[Message]) -> WindowedContext {
        let max_messages = match *self {
            Self::Unbounded => {
                return WindowedContext {
                    messages: transcript.iter().map(Message::to_chat).collect(),
                    dropped: 0,
                }
            }
            Self::Sliding { max_messages } => max_messages,
        };

        let turns = transcript
            .iter()
            .filter(|m| m.role != Role::System)
            .count();
        let dropped = turns.saturating_sub(max_messages);

        let mut skipped = 0;
        let messages = transcript
            .iter()
            .filter(|m| {
                if m.role == Role::System {
                    return true;
                }
                if skipped < dropped {
                    skipped += 1;
                    return false;
                }
                true
            })
            .map(Message::to_chat)
            .collect();

        WindowedContext { messages, dropped }
    }
}
