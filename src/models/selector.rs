//! Model selection and parsing.

use std::str::FromStr;

use super::LanguageModel;
use crate::error::ChatError;

/// Parse a "provider:model" string into a LanguageModel.
pub struct ModelSelector;

impl ModelSelector {
    /// Parse "provider:model_id" into a LanguageModel.
    ///
    /// Examples: "mistral:mistral-large-latest", "openai-compatible:llama3.3"
    pub fn parse(s: &str) -> Result<LanguageModel, ChatError> {
        let (provider, model_id) = s.split_once(':').ok_or_else(|| {
            ChatError::InvalidArgument(format!(
                "Invalid model selector '{s}': expected 'provider:model_id'"
            ))
        })?;
        if model_id.is_empty() {
            return Err(ChatError::InvalidArgument(format!(
                "Invalid model selector '{s}': model id is empty"
            )));
        }

        match provider {
            #[cfg(feature = "mistral")]
            "mistral" => {
                use super::mistral::MistralModel;
                let m = MistralModel::from_str(model_id)
                    .unwrap_or(MistralModel::Custom(model_id.to_string()));
                Ok(LanguageModel::Mistral(m))
            }
            #[cfg(feature = "openai-compatible")]
            "openai-compatible" | "openai_compatible" => {
                use super::openai_compatible::OpenAiCompatibleModel;
                Ok(LanguageModel::OpenAiCompatible(OpenAiCompatibleModel::new(
                    model_id, None,
                )))
            }
            _ => Ok(LanguageModel::Custom {
                provider: provider.to_string(),
                model_id: model_id.to_string(),
            }),
        }
    }
}

impl FromStr for LanguageModel {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelSelector::parse(s)
    }
}
