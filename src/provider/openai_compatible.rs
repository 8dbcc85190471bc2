//! Provider for any endpoint speaking the chat-completions dialect.

use async_trait::async_trait;

use crate::error::ChatError;

use super::chat_completions::ChatCompletionsClient;
use super::{ModelProvider, ProviderRequest, ProviderResponse};

pub struct OpenAiCompatibleProvider {
    inner: ChatCompletionsClient,
}

impl OpenAiCompatibleProvider {
    pub fn new(model_id: String, api_key: String, base_url: String) -> Self {
        Self {
            inner: ChatCompletionsClient::new("openai-compatible", model_id, api_key, base_url),
        }
    }
}

#[async_trait]
impl ModelProvider for OpenAiCompatibleProvider {
    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }
    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
    async fn generate_text(
        &self,
        request: &ProviderRequest,
    ) -> Result<ProviderResponse, ChatError> {
        self.inner.generate_text(request).await
    }
}
