//! Mistral model definitions.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Mistral models (OpenAI-style chat-completions API).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString)]
pub enum MistralModel {
    #[strum(serialize = "mistral-large-latest")]
    MistralLarge,
    #[strum(serialize = "mistral-medium-latest")]
    MistralMedium,
    #[strum(serialize = "mistral-small-latest")]
    MistralSmall,
    #[strum(serialize = "open-mistral-nemo")]
    MistralNemo,
    #[strum(default)]
    Custom(String),
}

impl MistralModel {
    pub fn as_str(&self) -> &str {
        match self {
            Self::MistralLarge => "mistral-large-latest",
            Self::MistralMedium => "mistral-medium-latest",
            Self::MistralSmall => "mistral-small-latest",
            Self::MistralNemo => "open-mistral-nemo",
            Self::Custom(s) => s,
        }
    }
}
