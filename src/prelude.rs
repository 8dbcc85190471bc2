//! Convenience re-exports for common use.

pub use crate::config::ChatConfig;
pub use crate::error::{ChatError, Result};
pub use crate::models::LanguageModel;
pub use crate::provider::ModelProvider;
pub use crate::session::{ConversationSession, HistoryWindow, SessionOptions, WriteOrder};
pub use crate::store::{ConversationStore, InMemoryStore, PostgrestStore};
pub use crate::types::{ChatMessage, Conversation, ConversationId, Message, Role};
