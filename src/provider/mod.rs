//! Model provider trait and implementations.

pub mod chat_completions;

#[cfg(feature = "mistral")]
pub mod mistral;
#[cfg(feature = "openai-compatible")]
pub mod openai_compatible;

use async_trait::async_trait;

use crate::config::ChatConfig;
use crate::error::ChatError;
use crate::models::LanguageModel;
use crate::types::{ChatMessage, FinishReason, GenerationSettings, Usage};

/// A request sent to a model provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderRequest {
    pub messages: Vec<ChatMessage>,
    pub settings: GenerationSettings,
}

/// Response from a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    pub text: String,
    pub usage: Usage,
    pub finish_reason: Option<FinishReason>,
}

/// Core trait implemented by all model providers.
///
/// Implementations report every failure as `ChatError::ModelUnavailable`.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name (e.g., "mistral").
    fn provider_name(&self) -> &str;
    /// The model ID this provider instance serves.
    fn model_id(&self) -> &str;

    /// Generate a single reply for the ordered messages (non-streaming).
    async fn generate_text(&self, request: &ProviderRequest)
        -> Result<ProviderResponse, ChatError>;
}

/// Create a provider for the given model, using the provided config.
#[allow(unused_variables)]
pub fn create_provider(
    model: &LanguageModel,
    config: &ChatConfig,
) -> Result<Box<dyn ModelProvider>, ChatError> {
    match model {
        #[cfg(feature = "mistral")]
        LanguageModel::Mistral(m) => {
            let api_key = config
                .get_api_key("mistral")
                .ok_or_else(|| ChatError::Configuration("Missing MISTRAL_API_KEY".into()))?;
            Ok(Box::new(mistral::MistralProvider::new(
                m.clone(),
                api_key,
                config.get_base_url("mistral"),
            )))
        }
        #[cfg(feature = "openai-compatible")]
        LanguageModel::OpenAiCompatible(m) => {
            let api_key = config
                .get_api_key("openai-compatible")
                .ok_or_else(|| ChatError::Configuration("Missing OPENAI_COMPAT_API_KEY".into()))?;
            let base_url = m
                .base_url
                .clone()
                .or_else(|| config.get_base_url("openai-compatible"))
                .ok_or_else(|| {
                    ChatError::Configuration("Missing OPENAI_COMPAT_BASE_URL".into())
                })?;
            Ok(Box::new(openai_compatible::OpenAiCompatibleProvider::new(
                m.model_id.clone(),
                api_key,
                base_url,
            )))
        }
        LanguageModel::Custom { provider, .. } => Err(ChatError::Configuration(format!(
            "No built-in provider for '{provider}'. Use mistral or openai-compatible."
        ))),
    }
}
