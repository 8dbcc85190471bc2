//! Conversation session: a transcript kept in step with a durable store and
//! replayed to a model endpoint one turn at a time.

pub mod transcript;
pub mod window;

pub use transcript::Transcript;
pub use window::{HistoryWindow, WindowedContext};

use std::sync::Arc;

use bon::Builder;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::error::{ChatError, ErrorCategory};
use crate::provider::{ModelProvider, ProviderRequest};
use crate::store::ConversationStore;
use crate::types::{
    Conversation, ConversationId, FinishReason, GenerationSettings, Message, Role,
};

/// Input that ends the interactive loop (compared ignoring ASCII case).
pub const QUIT_SENTINEL: &str = "quit";

/// System prompt used when nothing else is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert in anime";

/// Conversation title used when nothing else is configured.
pub const DEFAULT_TITLE: &str = "Anime Expert Chat";

const BANNER: &str = "Chat with the AI (type 'quit' to exit)";

/// Order of the two effects of appending a turn.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum WriteOrder {
    /// Append in memory, then write. A failed write leaves the transcript
    /// ahead of the store for the rest of the session.
    #[default]
    MemoryFirst,
    /// Write, then append in memory only once the store confirmed.
    StoreFirst,
}

/// What to do when more than one conversation carries the requested title.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DuplicateTitlePolicy {
    /// Use the oldest row and log a warning.
    #[default]
    UseOldest,
    /// Fail with `ChatError::DuplicateConversation`.
    Fail,
}

/// Per-session behavior.
#[derive(Debug, Clone, Builder, PartialEq)]
pub struct SessionOptions {
    #[builder(into, default = DEFAULT_SYSTEM_PROMPT.to_string())]
    pub system_prompt: String,
    #[builder(default)]
    pub window: HistoryWindow,
    #[builder(default)]
    pub write_order: WriteOrder,
    #[builder(default)]
    pub duplicate_titles: DuplicateTitlePolicy,
    #[builder(default)]
    pub settings: GenerationSettings,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Why `run_loop` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The quit sentinel was read.
    Sentinel,
    /// The input stream ended.
    EndOfInput,
}

/// Summary of a finished interactive loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopOutcome {
    pub exit: LoopExit,
    /// Completed user/assistant turns.
    pub turns: usize,
}

/// One named conversation: transcript, store and model.
///
/// Every call is awaited to completion before the next one starts; a turn
/// (both writes included) finishes before the next input is read.
pub struct ConversationSession {
    provider: Arc<dyn ModelProvider>,
    store: Arc<dyn ConversationStore>,
    options: SessionOptions,
    conversation: Option<Conversation>,
    transcript: Transcript,
}

impl ConversationSession {
    /// A session with no conversation resolved yet.
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        store: Arc<dyn ConversationStore>,
        options: SessionOptions,
    ) -> Self {
        let transcript = Transcript::new(options.system_prompt.clone());
        Self {
            provider,
            store,
            options,
            conversation: None,
            transcript,
        }
    }

    /// Resolve the conversation for `title` and rebuild its transcript.
    pub async fn open(
        provider: Arc<dyn ModelProvider>,
        store: Arc<dyn ConversationStore>,
        options: SessionOptions,
        title: &str,
    ) -> Result<Self, ChatError> {
        let mut session = Self::new(provider, store, options);
        let id = session.resolve_conversation(title).await?;
        let history = session.load_history(&id).await?;
        info!(
            conversation = %id,
            messages = history.len(),
            "Loaded conversation history"
        );
        session.transcript = Transcript::rebuild(session.options.system_prompt.clone(), history);
        Ok(session)
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn conversation(&self) -> Option<&Conversation> {
        self.conversation.as_ref()
    }

    pub fn conversation_id(&self) -> Option<&ConversationId> {
        self.conversation.as_ref().map(|c| &c.id)
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Look up the conversation by exact title, creating it if absent.
    pub async fn resolve_conversation(&mut self, title: &str) -> Result<ConversationId, ChatError> {
        if title.trim().is_empty() {
            return Err(ChatError::InvalidArgument(
                "conversation title must not be empty".into(),
            ));
        }

        let mut found = self.store.find_conversations(title).await?;
        let conversation = match found.len() {
            0 => {
                let created = self.store.create_conversation(title, Utc::now()).await?;
                info!(
                    conversation = %created.id,
                    store = self.store.store_name(),
                    unique_titles = self.store.titles_are_unique(),
                    "Created conversation"
                );
                created
            }
            1 => found.remove(0),
            count => match self.options.duplicate_titles {
                DuplicateTitlePolicy::UseOldest => {
                    warn!(
                        title,
                        count,
                        "Multiple conversations share this title; using the oldest"
                    );
                    found.sort_by_key(|c| c.created_at);
                    found.remove(0)
                }
                DuplicateTitlePolicy::Fail => {
                    return Err(ChatError::DuplicateConversation {
                        title: title.to_string(),
                        count,
                    })
                }
            },
        };

        let id = conversation.id.clone();
        self.conversation = Some(conversation);
        Ok(id)
    }

    /// Fetch the stored messages of a conversation, oldest first.
    pub async fn load_history(&self, id: &ConversationId) -> Result<Vec<Message>, ChatError> {
        self.store.list_messages(id).await
    }

    /// Append a message to the transcript and persist it.
    pub async fn append_turn(
        &mut self,
        role: Role,
        content: impl Into<String>,
    ) -> Result<(), ChatError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(ChatError::InvalidArgument(
                "message content must not be empty".into(),
            ));
        }
        let id = self
            .conversation_id()
            .cloned()
            .ok_or_else(|| ChatError::InvalidState("no conversation resolved".into()))?;

        let mut message = Message::new(role, content);
        // keep created_at non-decreasing even if the wall clock steps back
        if let Some(last) = self.transcript.last() {
            if message.created_at < last.created_at {
                message.created_at = last.created_at;
            }
        }

        match self.options.write_order {
            WriteOrder::MemoryFirst => {
                self.transcript.push(message.clone());
                if let Err(err) = self.store.insert_message(&id, &message).await {
                    warn!(
                        conversation = %id,
                        role = %role,
                        error = %err,
                        "Store write failed; transcript is ahead of the store"
                    );
                    return Err(err);
                }
            }
            WriteOrder::StoreFirst => {
                self.store.insert_message(&id, &message).await?;
                self.transcript.push(message);
            }
        }
        Ok(())
    }

    /// Send the windowed transcript to the model and return its reply.
    pub async fn next_reply(&self) -> Result<String, ChatError> {
        let WindowedContext { messages, dropped } =
            self.options.window.apply(self.transcript.messages());
        debug!(
            provider = self.provider.provider_name(),
            model = self.provider.model_id(),
            sent = messages.len(),
            dropped,
            "Requesting reply"
        );

        let request = ProviderRequest {
            messages,
            settings: self.options.settings.clone(),
        };
        let response = self
            .provider
            .generate_text(&request)
            .await
            .map_err(|err| match err {
                ChatError::ModelUnavailable { .. } => err,
                other => ChatError::model(other.category(), other.to_string()),
            })?;

        if response.text.trim().is_empty() {
            return Err(ChatError::model(
                ErrorCategory::Api,
                "model returned an empty reply",
            ));
        }
        debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "Reply received"
        );
        if response.finish_reason == Some(FinishReason::Length) {
            warn!(
                max_tokens = ?self.options.settings.max_tokens,
                "Reply was cut off at the token limit"
            );
        }
        Ok(response.text)
    }

    /// Run one full turn: persist the input, ask the model, persist the reply.
    pub async fn take_turn(&mut self, input: &str) -> Result<String, ChatError> {
        self.append_turn(Role::User, input).await?;
        let reply = self.next_reply().await?;
        self.append_turn(Role::Assistant, reply.as_str()).await?;
        Ok(reply)
    }

    /// Read lines until the quit sentinel (or end of input), one turn per line.
    ///
    /// Blank lines are skipped. Each reply is printed before it is persisted,
    /// so a failed assistant write still shows the reply. Any error ends the
    /// loop and is returned.
    pub async fn run_loop<R, W>(&mut self, input: R, output: &mut W) -> Result<LoopOutcome, ChatError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        let mut turns = 0;

        output.write_all(format!("{BANNER}\n").as_bytes()).await?;
        loop {
            output.write_all(b"You: ").await?;
            output.flush().await?;

            let Some(line) = lines.next_line().await? else {
                output.write_all(b"\n").await?;
                output.flush().await?;
                return Ok(LoopOutcome {
                    exit: LoopExit::EndOfInput,
                    turns,
                });
            };

            if line.eq_ignore_ascii_case(QUIT_SENTINEL) {
                return Ok(LoopOutcome {
                    exit: LoopExit::Sentinel,
                    turns,
                });
            }
            if line.trim().is_empty() {
                continue;
            }

            self.append_turn(Role::User, line.as_str()).await?;
            let reply = self.next_reply().await?;
            output.write_all(format!("AI: {reply}\n").as_bytes()).await?;
            output.flush().await?;
            self.append_turn(Role::Assistant, reply).await?;
            turns += 1;
        }
    }
}
