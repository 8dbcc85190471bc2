//! One-shot generation: prompt in, reply text out.

use tracing::{debug, warn};

use crate::config::ChatConfig;
use crate::error::ChatError;
use crate::models::LanguageModel;
use crate::provider::{self, ModelProvider, ProviderRequest};
use crate::types::{ChatMessage, FinishReason, GenerationSettings};

/// Send an optional system prompt plus one user prompt and return the reply.
pub async fn generate(
    provider: &dyn ModelProvider,
    system: Option<&str>,
    prompt: impl Into<String>,
    settings: GenerationSettings,
) -> Result<String, ChatError> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = system {
        messages.push(ChatMessage::system(system));
    }
    messages.push(ChatMessage::user(prompt));

    debug!(
        provider = provider.provider_name(),
        model = provider.model_id(),
        "One-shot generation"
    );
    let response = provider
        .generate_text(&ProviderRequest { messages, settings })
        .await?;
    debug!(
        input_tokens = response.usage.input_tokens,
        output_tokens = response.usage.output_tokens,
        "One-shot reply received"
    );
    if response.finish_reason == Some(FinishReason::Length) {
        warn!("Reply was cut off at the token limit");
    }
    Ok(response.text)
}

/// Resolve the provider for `model` from `config` and generate once with the
/// configured sampling controls.
pub async fn ask(
    model: &LanguageModel,
    config: &ChatConfig,
    system: Option<&str>,
    prompt: impl Into<String>,
) -> Result<String, ChatError> {
    let provider = provider::create_provider(model, config)?;
    generate(provider.as_ref(), system, prompt, config.generation.clone()).await
}
