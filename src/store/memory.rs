//! Process-local store.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::ConversationStore;
use crate::error::{ChatError, ErrorCategory};
use crate::types::{Conversation, ConversationId, Message};

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    conversations: Vec<Conversation>,
    messages: Vec<(ConversationId, Message)>,
}

/// Store that lives only as long as the process.
///
/// Message inserts are idempotent on the client-generated message id.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    unique_titles: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enforce one conversation per title.
    pub fn with_unique_titles(mut self) -> Self {
        self.unique_titles = true;
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, ChatError> {
        self.state
            .lock()
            .map_err(|_| ChatError::store(ErrorCategory::Unknown, "in-memory store lock poisoned"))
    }

    /// Total number of stored conversations.
    pub fn conversation_count(&self) -> usize {
        self.lock().map(|s| s.conversations.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ConversationStore for InMemoryStore {
    fn store_name(&self) -> &str {
        "memory"
    }

    fn titles_are_unique(&self) -> bool {
        self.unique_titles
    }

    async fn find_conversations(&self, title: &str) -> Result<Vec<Conversation>, ChatError> {
        let state = self.lock()?;
        let mut found: Vec<Conversation> = state
            .conversations
            .iter()
            .filter(|c| c.title == title)
            .cloned()
            .collect();
        found.sort_by_key(|c| c.created_at);
        Ok(found)
    }

    async fn create_conversation(
        &self,
        title: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Conversation, ChatError> {
        let mut state = self.lock()?;
        if self.unique_titles {
            if let Some(existing) = state.conversations.iter().find(|c| c.title == title) {
                return Ok(existing.clone());
            }
        }
        state.next_id += 1;
        let conversation = Conversation {
            id: ConversationId::Int(state.next_id),
            title: title.to_string(),
            created_at,
        };
        state.conversations.push(conversation.clone());
        Ok(conversation)
    }

    async fn insert_message(
        &self,
        conversation_id: &ConversationId,
        message: &Message,
    ) -> Result<(), ChatError> {
        let mut state = self.lock()?;
        if !state.conversations.iter().any(|c| &c.id == conversation_id) {
            return Err(ChatError::store(
                ErrorCategory::Api,
                format!("conversation {conversation_id} does not exist"),
            ));
        }
        if state.messages.iter().any(|(_, m)| m.id == message.id) {
            return Ok(());
        }
        state.messages.push((conversation_id.clone(), message.clone()));
        Ok(())
    }

    async fn list_messages(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<Message>, ChatError> {
        let state = self.lock()?;
        let mut messages: Vec<Message> = state
            .messages
            .iter()
            .filter(|(id, _)| id == conversation_id)
            .map(|(_, m)| m.clone())
            .collect();
        // stable: equal timestamps keep insertion order
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }
}
