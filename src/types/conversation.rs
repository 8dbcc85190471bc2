//! Conversation records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned conversation identity.
///
/// Opaque to the session. PostgREST returns whatever the column type is,
/// so both integer and text keys are preserved as-is and round-trip to the
/// same JSON type on insert.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConversationId {
    Int(i64),
    Text(String),
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for ConversationId {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

impl From<&str> for ConversationId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}

/// A named, durable container for an ordered message history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    pub id: ConversationId,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_keep_their_json_type() {
        let int: ConversationId = serde_json::from_str("42").unwrap();
        let text: ConversationId = serde_json::from_str("\"a1b2\"").unwrap();

        assert_eq!(int, ConversationId::Int(42));
        assert_eq!(text, ConversationId::Text("a1b2".into()));
        assert_eq!(serde_json::to_string(&int).unwrap(), "42");
        assert_eq!(int.to_string(), "42");
        assert_eq!(text.to_string(), "a1b2");
    }
}
