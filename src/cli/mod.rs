//! CLI entry point for chatkeep.

use std::io::IsTerminal;

use clap::{Args, Parser, Subcommand};

use crate::config::{parse_window, ChatConfig};
use crate::error::ChatError;
use crate::models::LanguageModel;
use crate::session::{HistoryWindow, WriteOrder};
use crate::types::GenerationSettings;

/// chatkeep CLI
#[derive(Parser, Debug)]
#[command(name = "chatkeep", version, about = "Console chat with persisted history")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send one prompt and print the reply
    Ask(AskArgs),
    /// Interactive chat (type 'quit' to exit)
    Chat(ChatArgs),
}

/// Arguments for the `ask` subcommand.
#[derive(Parser, Debug)]
pub struct AskArgs {
    /// Model to use (format: provider:model, e.g., mistral:mistral-large-latest)
    #[arg(short, long)]
    pub model: Option<String>,

    /// System prompt
    #[arg(short, long)]
    pub system: Option<String>,

    #[command(flatten)]
    pub generation: GenerationArgs,

    /// User prompt
    pub prompt: String,
}

/// Arguments for the `chat` subcommand.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// Model to use (format: provider:model, e.g., mistral:mistral-large-latest)
    #[arg(short, long)]
    pub model: Option<String>,

    /// System prompt
    #[arg(short, long)]
    pub system: Option<String>,

    /// Persist the conversation to the hosted store
    #[arg(long)]
    pub persist: bool,

    /// Conversation title (lookup key in the store)
    #[arg(short, long)]
    pub title: Option<String>,

    /// Messages replayed per turn ('unbounded' or a count)
    #[arg(long, value_parser = parse_window_arg)]
    pub window: Option<HistoryWindow>,

    /// Order of the in-memory append and the store write
    #[arg(long)]
    pub write_order: Option<WriteOrder>,

    #[command(flatten)]
    pub generation: GenerationArgs,
}

/// Sampling controls shared by `ask` and `chat`.
#[derive(Args, Debug, Default)]
pub struct GenerationArgs {
    /// Sampling temperature
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Nucleus sampling cutoff
    #[arg(long)]
    pub top_p: Option<f64>,

    /// Maximum tokens per reply
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Seed for reproducible sampling
    #[arg(long)]
    pub seed: Option<u64>,

    /// Stop sequence (repeatable)
    #[arg(long = "stop")]
    pub stop_sequences: Vec<String>,
}

impl GenerationArgs {
    fn apply(&self, settings: &mut GenerationSettings) {
        if self.temperature.is_some() {
            settings.temperature = self.temperature;
        }
        if self.top_p.is_some() {
            settings.top_p = self.top_p;
        }
        if self.max_tokens.is_some() {
            settings.max_tokens = self.max_tokens;
        }
        if self.seed.is_some() {
            settings.seed = self.seed;
        }
        if !self.stop_sequences.is_empty() {
            settings.stop_sequences = Some(self.stop_sequences.clone());
        }
    }
}

fn parse_window_arg(raw: &str) -> Result<HistoryWindow, String> {
    parse_window(raw).map_err(|e| e.to_string())
}

impl AskArgs {
    /// Overlay flags on top of the environment config.
    pub fn apply(&self, config: &mut ChatConfig) {
        if let Some(ref model) = self.model {
            config.model = model.clone();
        }
        self.generation.apply(&mut config.generation);
    }
}

impl ChatArgs {
    /// Overlay flags on top of the environment config.
    pub fn apply(&self, config: &mut ChatConfig) {
        if let Some(ref model) = self.model {
            config.model = model.clone();
        }
        if let Some(ref system) = self.system {
            config.system_prompt = system.clone();
        }
        if let Some(ref title) = self.title {
            config.title = title.clone();
        }
        if let Some(window) = self.window {
            config.window = window;
        }
        if let Some(order) = self.write_order {
            config.write_order = order;
        }
        self.generation.apply(&mut config.generation);
    }
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Install the stderr log subscriber, filtered by `RUST_LOG` (default `warn`).
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Make sure the model's provider has a key, asking on the terminal if not.
///
/// The key is read without echo. Without a terminal the missing key is a
/// configuration error.
pub fn ensure_api_key(config: &mut ChatConfig, model: &LanguageModel) -> Result<(), ChatError> {
    ensure_api_key_with(config, model, std::io::stdin().is_terminal(), |prompt| {
        rpassword::prompt_password(prompt)
    })
}

fn ensure_api_key_with<F>(
    config: &mut ChatConfig,
    model: &LanguageModel,
    interactive: bool,
    read_secret: F,
) -> Result<(), ChatError>
where
    F: FnOnce(&str) -> std::io::Result<String>,
{
    let provider = model.provider_name().to_string();
    let Some((env_var, label)) = key_prompt_for(&provider) else {
        return Ok(());
    };
    if config.has_credentials(&provider) {
        return Ok(());
    }
    if !interactive {
        return Err(ChatError::Configuration(format!("Missing {env_var}")));
    }

    let key = read_secret(&format!("Enter API key for {label}: "))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(ChatError::Configuration(format!("Missing {env_var}")));
    }
    config.set_api_key(&provider, key.to_string());
    Ok(())
}

fn key_prompt_for(provider: &str) -> Option<(&'static str, &'static str)> {
    match provider {
        "mistral" => Some(("MISTRAL_API_KEY", "Mistral AI")),
        "openai-compatible" => Some(("OPENAI_COMPAT_API_KEY", "the OpenAI-compatible endpoint")),
        _ => None,
    }
}
