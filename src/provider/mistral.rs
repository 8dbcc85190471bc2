//! Mistral provider (chat-completions dialect).

use async_trait::async_trait;

use crate::error::ChatError;
use crate::models::mistral::MistralModel;

use super::chat_completions::ChatCompletionsClient;
use super::{ModelProvider, ProviderRequest, ProviderResponse};

pub const DEFAULT_BASE_URL: &str = "https://api.mistral.ai/v1";

pub struct MistralProvider {
    inner: ChatCompletionsClient,
}

impl MistralProvider {
    pub fn new(model: MistralModel, api_key: String, base_url: Option<String>) -> Self {
        Self {
            inner: ChatCompletionsClient::new(
                "mistral",
                model.as_str(),
                api_key,
                base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            ),
        }
    }
}

#[async_trait]
impl ModelProvider for MistralProvider {
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
