//! Client for the OpenAI-style chat-completions dialect.
//!
//! Mistral and any OpenAI-compatible endpoint speak it; the provider
//! wrappers only pick the base URL and the name.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ChatError, ErrorCategory};
use crate::types::{ChatMessage, FinishReason, Usage};
use crate::util::http::{bearer_headers, shared_client};

use super::{ProviderRequest, ProviderResponse};

/// Non-streaming `POST {base}/chat/completions` client.
pub struct ChatCompletionsClient {
    provider_name: String,
    model_id: String,
    api_key: String,
    base_url: String,
}

impl ChatCompletionsClient {
    pub fn new(
        provider_name: impl Into<String>,
        model_id: impl Into<String>,
        api_key: String,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            provider_name: provider_name.into(),
            model_id: model_id.into(),
            api_key,
            base_url: base_url.into(),
        }
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    fn build_request_body<'a>(&'a self, request: &'a ProviderRequest) -> ChatRequestBody<'a> {
        let settings = &request.settings;
        // Mistral names the sampling seed differently
        let (seed, random_seed) = if self.provider_name == "mistral" {
            (None, settings.seed)
        } else {
            (settings.seed, None)
        };
        ChatRequestBody {
            model: &self.model_id,
            messages: &request.messages,
            stream: false,
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            top_p: settings.top_p,
            stop: settings.stop_sequences.as_deref(),
            seed,
            random_seed,
        }
    }

    pub async fn generate_text(
        &self,
        request: &ProviderRequest,
    ) -> Result<ProviderResponse, ChatError> {
        let body = self.build_request_body(request);
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        debug!(
            provider = %self.provider_name,
            model = %self.model_id,
            messages = request.messages.len(),
            "chat completion request"
        );

        let resp = shared_client()
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(ChatError::model_transport)?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(ChatError::model_status(status, &body_text));
        }

        let data: ChatResponse = resp.json().await.map_err(ChatError::model_transport)?;
        let choice = data.choices.into_iter().next().ok_or_else(|| {
            ChatError::model(ErrorCategory::Api, "No choices in chat completion response")
        })?;

        Ok(ProviderResponse {
            text: choice.message.content.unwrap_or_default(),
            usage: data
                .usage
                .map(|u| Usage {
                    input_tokens: u.prompt_tokens,
                    output_tokens: u.completion_tokens,
                    total_tokens: u.total_tokens,
                })
                .unwrap_or_default(),
            finish_reason: choice.finish_reason.as_deref().and_then(parse_finish_reason),
        })
    }
}

fn parse_finish_reason(s: &str) -> Option<FinishReason> {
    match s {
        "stop" => Some(FinishReason::Stop),
        "length" | "model_length" => Some(FinishReason::Length),
        "content_filter" => Some(FinishReason::ContentFilter),
        "error" => Some(FinishReason::Error),
        _ => None,
    }
}

// Wire types (internal)

#[derive(Serialize)]
struct ChatRequestBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    random_seed: Option<u64>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
