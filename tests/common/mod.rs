//! Shared test helpers: scripted provider and failure-injecting store.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use chatkeep::error::{ChatError, ErrorCategory};
use chatkeep::provider::{ModelProvider, ProviderRequest, ProviderResponse};
use chatkeep::store::{ConversationStore, InMemoryStore};
use chatkeep::types::*;

/// A provider that returns queued replies in order and records requests.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<ProviderResponse, ChatError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_replies(replies: &[&str]) -> Self {
        let provider = Self::new();
        for reply in replies {
            provider.queue_reply(reply);
        }
        provider
    }

    pub fn queue_reply(&self, text: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(Self::response(text, FinishReason::Stop)));
    }

    /// Queue a reply the endpoint reports as cut off at the token limit.
    pub fn queue_truncated_reply(&self, text: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(Self::response(text, FinishReason::Length)));
    }

    fn response(text: &str, finish_reason: FinishReason) -> ProviderResponse {
        ProviderResponse {
            text: text.to_string(),
            usage: Usage::default(),
            finish_reason: Some(finish_reason),
        }
    }

    pub fn queue_error(&self, err: ChatError) {
        self.replies.lock().unwrap().push_back(Err(err));
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_id(&self) -> &str {
        "scripted-model"
    }

    async fn generate_text(
        &self,
        request: &ProviderRequest,
    ) -> Result<ProviderResponse, ChatError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Self::response("Mock response", FinishReason::Stop)));
        next
    }
}

/// In-memory store whose writes and reads can be made to fail on demand.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: InMemoryStore,
    fail_inserts: AtomicBool,
    fail_role: Mutex<Option<Role>>,
    fail_reads: AtomicBool,
    insert_attempts: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Fail only inserts of messages with this role.
    pub fn fail_inserts_for(&self, role: Role) {
        *self.fail_role.lock().unwrap() = Some(role);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn insert_attempts(&self) -> usize {
        self.insert_attempts.load(Ordering::SeqCst)
    }

    fn outage() -> ChatError {
        ChatError::store(ErrorCategory::Network, "connection refused")
    }
}

#[async_trait]
impl ConversationStore for FlakyStore {
    fn store_name(&self) -> &str {
        "flaky"
    }

    async fn find_conversations(&self, title: &str) -> Result<Vec<Conversation>, ChatError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::outage());
        }
        self.inner.find_conversations(title).await
    }

    async fn create_conversation(
        &self,
        title: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Conversation, ChatError> {
        self.inner.create_conversation(title, created_at).await
    }

    async fn insert_message(
        &self,
        conversation_id: &ConversationId,
        message: &Message,
    ) -> Result<(), ChatError> {
        self.insert_attempts.fetch_add(1, Ordering::SeqCst);
        let role_fails = *self.fail_role.lock().unwrap() == Some(message.role);
        if self.fail_inserts.load(Ordering::SeqCst) || role_fails {
            return Err(Self::outage());
        }
        self.inner.insert_message(conversation_id, message).await
    }

    async fn list_messages(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<Message>, ChatError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::outage());
        }
        self.inner.list_messages(conversation_id).await
    }
}

/// Role/content pairs of a message list, for compact assertions.
pub fn view(messages: &[Message]) -> Vec<(Role, String)> {
    messages
        .iter()
        .map(|m| (m.role, m.content.clone()))
        .collect()
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
