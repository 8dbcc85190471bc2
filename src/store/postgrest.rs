//! PostgREST-backed store (e.g., a Supabase project's REST interface).
//!
//! Expects two tables:
//! `conversations(id, title, created_at)` and
//! `messages(id, conversation_id, role, content, created_at)` with a
//! foreign key from `messages.conversation_id` to `conversations.id`.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::header::HeaderValue;
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};
use uuid::Uuid;

use super::ConversationStore;
use crate::error::ChatError;
use crate::types::{Conversation, ConversationId, Message, Role};
use crate::util::http::{postgrest_headers, shared_client};

/// Connection and schema settings for a PostgREST endpoint.
#[derive(Debug, Clone)]
pub struct PostgrestConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`. `/rest/v1` is appended.
    pub base_url: String,
    pub api_key: String,
    pub conversations_table: String,
    pub messages_table: String,
    /// Set when `conversations.title` carries a unique constraint.
    pub unique_titles: bool,
    /// Column holding the client-generated message UUID. When set, inserts
    /// become "insert, ignore duplicates" on that column.
    pub message_key_column: Option<String>,
}

impl PostgrestConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            conversations_table: "conversations".to_string(),
            messages_table: "messages".to_string(),
            unique_titles: false,
            message_key_column: None,
        }
    }

    pub fn with_unique_titles(mut self, unique: bool) -> Self {
        self.unique_titles = unique;
        self
    }

    pub fn with_message_key_column(mut self, column: Option<String>) -> Self {
        self.message_key_column = column;
        self
    }
}

/// Store speaking the PostgREST dialect over the shared HTTP client.
pub struct PostgrestStore {
    config: PostgrestConfig,
}

impl PostgrestStore {
    pub fn new(config: PostgrestConfig) -> Self {
        Self { config }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.base_url.trim_end_matches('/'), table)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ChatError> {
        let resp = request
            .headers(postgrest_headers(&self.config.api_key))
            .send()
            .await
            .map_err(ChatError::store_transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(ChatError::store_status(status.as_u16(), &body_text));
        }
        Ok(resp)
    }

    async fn select_conversations(&self, title: &str) -> Result<Vec<Conversation>, ChatError> {
        let request = shared_client()
            .get(self.table_url(&self.config.conversations_table))
            .query(&[
                ("select", "*".to_string()),
                ("title", format!("eq.{title}")),
                ("order", "created_at.asc,id.asc".to_string()),
            ]);
        let rows: Vec<ConversationRow> = self
            .send(request)
            .await?
            .json()
            .await
            .map_err(ChatError::store_transport)?;
        Ok(rows.into_iter().map(ConversationRow::into_conversation).collect())
    }
}

#[async_trait]
impl ConversationStore for PostgrestStore {
    fn store_name(&self) -> &str {
        "postgrest"
    }

    fn titles_are_unique(&self) -> bool {
        self.config.unique_titles
    }

    async fn find_conversations(&self, title: &str) -> Result<Vec<Conversation>, ChatError> {
        debug!(table = %self.config.conversations_table, "PostgREST select conversations");
        self.select_conversations(title).await
    }

    async fn create_conversation(
        &self,
        title: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Conversation, ChatError> {
        let body = serde_json::json!({
            "title": title,
            "created_at": created_at.to_rfc3339(),
        });

        let mut request = shared_client()
            .post(self.table_url(&self.config.conversations_table))
            .json(&body);
        let prefer = if self.config.unique_titles {
            request = request.query(&[("on_conflict", "title")]);
            "resolution=ignore-duplicates,return=representation"
        } else {
            "return=representation"
        };
        request = request.header("Prefer", HeaderValue::from_static(prefer));

        debug!(table = %self.config.conversations_table, "PostgREST insert conversation");
        let rows: Vec<ConversationRow> = self
            .send(request)
            .await?
            .json()
            .await
            .map_err(ChatError::store_transport)?;

        if let Some(row) = rows.into_iter().next() {
            return Ok(row.into_conversation());
        }

        // an ignored duplicate returns no representation; read back the winner
        self.select_conversations(title)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                ChatError::store(
                    crate::error::ErrorCategory::Api,
                    format!("insert of conversation '{title}' returned no row"),
                )
            })
    }

    async fn insert_message(
        &self,
        conversation_id: &ConversationId,
        message: &Message,
    ) -> Result<(), ChatError> {
        let mut body = serde_json::json!({
            "conversation_id": conversation_id,
            "role": message.role,
            "content": message.content,
            "created_at": message.created_at.to_rfc3339(),
        });

        let mut request = shared_client().post(self.table_url(&self.config.messages_table));
        let prefer = match &self.config.message_key_column {
            Some(column) => {
                if let Some(obj) = body.as_object_mut() {
                    obj.insert(column.clone(), message.id.to_string().into());
                }
                request = request.query(&[("on_conflict", column.as_str())]);
                "resolution=ignore-duplicates,return=minimal"
            }
            None => "return=minimal",
        };
        request = request
            .header("Prefer", HeaderValue::from_static(prefer))
            .json(&body);

        debug!(
            table = %self.config.messages_table,
            role = %message.role,
            "PostgREST insert message"
        );
        self.send(request).await?;
        Ok(())
    }

    async fn list_messages(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<Message>, ChatError> {
        let request = shared_client()
            .get(self.table_url(&self.config.messages_table))
            .query(&[
                ("select", "*".to_string()),
                ("conversation_id", format!("eq.{conversation_id}")),
                ("order", "created_at.asc,id.asc".to_string()),
            ]);

        debug!(table = %self.config.messages_table, "PostgREST select messages");
        let rows: Vec<serde_json::Map<String, serde_json::Value>> = self
            .send(request)
            .await?
            .json()
            .await
            .map_err(ChatError::store_transport)?;

        let mut messages = Vec::with_capacity(rows.len());
        for raw in rows {
            let row: MessageRow = serde_json::from_value(serde_json::Value::Object(raw.clone()))?;
            let Ok(role) = Role::from_str(&row.role) else {
                warn!(role = %row.role, "Skipping stored message with unknown role");
                continue;
            };
            let id = self
                .config
                .message_key_column
                .as_ref()
                .and_then(|column| raw.get(column))
                .and_then(|v| v.as_str())
                .and_then(|s| Uuid::parse_str(s).ok())
                .unwrap_or_else(Uuid::new_v4);
            messages.push(Message {
                id,
                role,
                content: row.content,
                created_at: row.created_at,
            });
        }
        Ok(messages)
    }
}

#[derive(Deserialize)]
struct ConversationRow {
    id: ConversationId,
    #[serde(default)]
    title: String,
    #[serde(default = "Utc::now", deserialize_with = "lenient_timestamp")]
    created_at: DateTime<Utc>,
}

impl ConversationRow {
    fn into_conversation(self) -> Conversation {
        Conversation {
            id: self.id,
            title: self.title,
            created_at: self.created_at,
        }
    }
}

#[derive(Deserialize)]
struct MessageRow {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(deserialize_with = "lenient_timestamp")]
    created_at: DateTime<Utc>,
}

/// Accept both `timestamptz` (RFC 3339) and plain `timestamp` columns; the
/// latter carry no offset and are read as UTC.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_timestamp_accepts_offset_and_naive_forms() {
        let with_offset = parse_timestamp("2024-05-01T10:00:00.123456+00:00").unwrap();
        let naive = parse_timestamp("2024-05-01T10:00:00.123456").unwrap();
        let spaced = parse_timestamp("2024-05-01 10:00:00").unwrap();

        assert_eq!(with_offset, naive);
        assert_eq!(spaced.timestamp(), naive.timestamp());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn table_url_tolerates_trailing_slash() {
        let store = PostgrestStore::new(PostgrestConfig::new("https://x.supabase.co/", "k"));
        assert_eq!(
            store.table_url("messages"),
            "https://x.supabase.co/rest/v1/messages"
        );
    }
}
