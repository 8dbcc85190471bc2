//! Durable conversation storage.
//!
//! The session only talks to a [`ConversationStore`]; [`memory`] backs the
//! non-persistent chat and tests, [`postgrest`] talks to a hosted table
//! pair over HTTP.

pub mod memory;
pub mod postgrest;

pub use memory::InMemoryStore;
pub use postgrest::{PostgrestConfig, PostgrestStore};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ChatError;
use crate::types::{Conversation, ConversationId, Message};

/// Append-only store of conversations and their messages.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Store name for logs (e.g., "memory", "postgrest").
    fn store_name(&self) -> &str;

    /// Reports whether the store itself enforces one conversation per title,
    /// in which case `create_conversation` returns the existing row on
    /// conflict. Informational only: it is logged, and lookup does not branch
    /// on it.
    fn titles_are_unique(&self) -> bool {
        false
    }

    /// All conversations with exactly this title, oldest first.
    async fn find_conversations(&self, title: &str) -> Result<Vec<Conversation>, ChatError>;

    /// Create a conversation row and return it with its assigned id.
    async fn create_conversation(
        &self,
        title: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Conversation, ChatError>;

    /// Append one message to a conversation.
    async fn insert_message(
        &self,
        conversation_id: &ConversationId,
        message: &Message,
    ) -> Result<(), ChatError>;

    /// All messages of a conversation, ascending by `created_at`.
    async fn list_messages(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<Message>, ChatError>;
}
