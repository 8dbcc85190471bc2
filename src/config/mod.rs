//! Configuration (layered: CLI flags > environment / `.env` > defaults).

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ChatError;
use crate::models::DEFAULT_MODEL;
use crate::session::{
    DuplicateTitlePolicy, HistoryWindow, SessionOptions, WriteOrder, DEFAULT_SYSTEM_PROMPT,
    DEFAULT_TITLE,
};
use crate::store::PostgrestConfig;
use crate::types::GenerationSettings;
use crate::util::http::DEFAULT_TIMEOUT;

/// Connection settings for the hosted store.
#[derive(Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub url: String,
    pub api_key: String,
    pub unique_titles: bool,
    pub message_key_column: Option<String>,
}

impl fmt::Debug for StoreSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreSettings")
            .field("url", &self.url)
            .field("api_key", &"..")
            .field("unique_titles", &self.unique_titles)
            .field("message_key_column", &self.message_key_column)
            .finish()
    }
}

impl StoreSettings {
    pub fn postgrest(&self) -> PostgrestConfig {
        PostgrestConfig::new(self.url.clone(), self.api_key.clone())
            .with_unique_titles(self.unique_titles)
            .with_message_key_column(self.message_key_column.clone())
    }
}

/// Everything the CLI needs to build a provider, a store and a session.
#[derive(Clone)]
pub struct ChatConfig {
    api_keys: HashMap<String, String>,
    base_urls: HashMap<String, String>,
    pub store: Option<StoreSettings>,
    pub model: String,
    pub system_prompt: String,
    pub title: String,
    pub window: HistoryWindow,
    pub write_order: WriteOrder,
    pub duplicate_titles: DuplicateTitlePolicy,
    pub http_timeout: Duration,
    /// Sampling controls sent with every model request.
    pub generation: GenerationSettings,
}

impl fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatConfig")
            .field("api_keys", &self.api_keys.keys().collect::<Vec<_>>())
            .field("base_urls", &self.base_urls)
            .field("store", &self.store)
            .field("model", &self.model)
            .field("title", &self.title)
            .field("window", &self.window)
            .field("write_order", &self.write_order)
            .field("duplicate_titles", &self.duplicate_titles)
            .field("http_timeout", &self.http_timeout)
            .field("generation", &self.generation)
            .finish()
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

const API_KEY_VARS: [(&str, &str); 2] = [
    ("MISTRAL_API_KEY", "mistral"),
    ("OPENAI_COMPAT_API_KEY", "openai-compatible"),
];

const BASE_URL_VARS: [(&str, &str); 2] = [
    ("MISTRAL_BASE_URL", "mistral"),
    ("OPENAI_COMPAT_BASE_URL", "openai-compatible"),
];

impl ChatConfig {
    /// Built-in defaults, no credentials.
    pub fn new() -> Self {
        Self {
            api_keys: HashMap::new(),
            base_urls: HashMap::new(),
            store: None,
            model: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            title: DEFAULT_TITLE.to_string(),
            window: HistoryWindow::Unbounded,
            write_order: WriteOrder::default(),
            duplicate_titles: DuplicateTitlePolicy::default(),
            http_timeout: DEFAULT_TIMEOUT,
            generation: GenerationSettings::default(),
        }
    }

    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ChatError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read variables from a specific dotenv file, without touching the
    /// process environment.
    pub fn from_dotenv_file(path: impl AsRef<Path>) -> Result<Self, ChatError> {
        let vars: HashMap<String, String> = dotenvy::from_path_iter(path.as_ref())
            .map_err(|e| ChatError::Configuration(format!("reading {}: {e}", path.as_ref().display())))?
            .collect::<Result<_, _>>()
            .map_err(|e| ChatError::Configuration(format!("parsing {}: {e}", path.as_ref().display())))?;
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    /// Build from any variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ChatError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::new();

        for (env_var, provider) in API_KEY_VARS {
            if let Some(key) = get(env_var) {
                config.set_api_key(provider, key);
            }
        }
        for (env_var, provider) in BASE_URL_VARS {
            if let Some(url) = get(env_var) {
                config.set_base_url(provider, url);
            }
        }

        if let (Some(url), Some(api_key)) = (get("SUPABASE_URL"), get("SUPABASE_KEY")) {
            config.store = Some(StoreSettings {
                url,
                api_key,
                unique_titles: get("SUPABASE_UNIQUE_TITLES")
                    .map(|v| parse_bool("SUPABASE_UNIQUE_TITLES", &v))
                    .transpose()?
                    .unwrap_or(false),
                message_key_column: get("SUPABASE_MESSAGE_KEY_COLUMN"),
            });
        }

        if let Some(model) = get("CHATKEEP_MODEL") {
            config.model = model;
        }
        if let Some(prompt) = get("CHATKEEP_SYSTEM_PROMPT") {
            config.system_prompt = prompt;
        }
        if let Some(title) = get("CHATKEEP_TITLE") {
            config.title = title;
        }
        if let Some(window) = get("CHATKEEP_HISTORY_WINDOW") {
            config.window = parse_window(&window)?;
        }
        if let Some(order) = get("CHATKEEP_WRITE_ORDER") {
            config.write_order = parse_enum("CHATKEEP_WRITE_ORDER", &order)?;
        }
        if let Some(policy) = get("CHATKEEP_DUPLICATE_TITLES") {
            config.duplicate_titles = parse_enum("CHATKEEP_DUPLICATE_TITLES", &policy)?;
        }
        if let Some(secs) = get("CHATKEEP_HTTP_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                ChatError::Configuration(format!(
                    "CHATKEEP_HTTP_TIMEOUT_SECS must be a whole number of seconds, got '{secs}'"
                ))
            })?;
            config.http_timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = get("CHATKEEP_TEMPERATURE") {
            config.generation.temperature = Some(parse_number("CHATKEEP_TEMPERATURE", &raw)?);
        }
        if let Some(raw) = get("CHATKEEP_TOP_P") {
            config.generation.top_p = Some(parse_number("CHATKEEP_TOP_P", &raw)?);
        }
        if let Some(raw) = get("CHATKEEP_MAX_TOKENS") {
            config.generation.max_tokens = Some(parse_number("CHATKEEP_MAX_TOKENS", &raw)?);
        }
        if let Some(raw) = get("CHATKEEP_SEED") {
            config.generation.seed = Some(parse_number("CHATKEEP_SEED", &raw)?);
        }
        if let Some(raw) = get("CHATKEEP_STOP") {
            let stops: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
            if !stops.is_empty() {
                config.generation.stop_sequences = Some(stops);
            }
        }

        Ok(config)
    }

    pub fn set_api_key(&mut self, provider: &str, key: String) {
        self.api_keys.insert(provider.to_string(), key);
    }

    pub fn get_api_key(&self, provider: &str) -> Option<String> {
        self.api_keys.get(provider).cloned()
    }

    pub fn set_base_url(&mut self, provider: &str, url: String) {
        self.base_urls.insert(provider.to_string(), url);
    }

    pub fn get_base_url(&self, provider: &str) -> Option<String> {
        self.base_urls.get(provider).cloned()
    }

    pub fn has_credentials(&self, provider: &str) -> bool {
        self.api_keys.contains_key(provider)
    }

    /// Store settings, or a configuration error naming what is missing.
    pub fn require_store(&self) -> Result<&StoreSettings, ChatError> {
        self.store.as_ref().ok_or_else(|| {
            ChatError::Configuration("Missing SUPABASE_URL or SUPABASE_KEY".into())
        })
    }

    /// Session options derived from this config.
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions::builder()
            .system_prompt(self.system_prompt.clone())
            .window(self.window)
            .write_order(self.write_order)
            .duplicate_titles(self.duplicate_titles)
            .settings(self.generation.clone())
            .build()
    }
}

/// `0` or `unbounded` replays everything; `N` keeps the newest N messages.
pub fn parse_window(raw: &str) -> Result<HistoryWindow, ChatError> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("unbounded") {
        return Ok(HistoryWindow::Unbounded);
    }
    match raw.parse::<usize>() {
        Ok(0) => Ok(HistoryWindow::Unbounded),
        Ok(n) => Ok(HistoryWindow::sliding(n)),
        Err(_) => Err(ChatError::Configuration(format!(
            "history window must be 'unbounded' or a message count, got '{raw}'"
        ))),
    }
}

fn parse_enum<T: FromStr>(var: &str, raw: &str) -> Result<T, ChatError> {
    T::from_str(raw.trim())
        .map_err(|_| ChatError::Configuration(format!("{var} has unsupported value '{raw}'")))
}

fn parse_number<T: FromStr>(var: &str, raw: &str) -> Result<T, ChatError> {
    raw.trim()
        .parse()
        .map_err(|_| ChatError::Configuration(format!("{var} must be a number, got '{raw}'")))
}

fn parse_bool(var: &str, raw: &str) -> Result<bool, ChatError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ChatError::Configuration(format!(
            "{var} must be a boolean, got '{raw}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_mirror_the_anime_chat() {
        let config = ChatConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.model, "mistral:mistral-large-latest");
        assert_eq!(config.system_prompt, "You are an expert in anime");
        assert_eq!(config.title, "Anime Expert Chat");
        assert_eq!(config.window, HistoryWindow::Unbounded);
        assert!(config.store.is_none());
        assert!(!config.has_credentials("mistral"));
    }

    #[test]
    fn store_needs_both_url_and_key() {
        let config = ChatConfig::from_lookup(lookup(&[("SUPABASE_URL", "https://x.supabase.co")]))
            .unwrap();
        assert!(config.store.is_none());
        assert!(matches!(
            config.require_store(),
            Err(ChatError::Configuration(_))
        ));
    }

    #[test]
    fn empty_values_count_as_unset() {
        let config = ChatConfig::from_lookup(lookup(&[("MISTRAL_API_KEY", "  ")])).unwrap();
        assert_eq!(config.get_api_key("mistral"), None);
    }

    #[test]
    fn session_knobs_parse() {
        let config = ChatConfig::from_lookup(lookup(&[
            ("CHATKEEP_HISTORY_WINDOW", "20"),
            ("CHATKEEP_WRITE_ORDER", "store-first"),
            ("CHATKEEP_DUPLICATE_TITLES", "fail"),
            ("CHATKEEP_HTTP_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();
        assert_eq!(config.window, HistoryWindow::sliding(20));
        assert_eq!(config.write_order, WriteOrder::StoreFirst);
        assert_eq!(config.duplicate_titles, DuplicateTitlePolicy::Fail);
        assert_eq!(config.http_timeout, Duration::from_secs(30));

        let options = config.session_options();
        assert_eq!(options.window, HistoryWindow::sliding(20));
        assert_eq!(options.write_order, WriteOrder::StoreFirst);
    }

    #[test]
    fn bad_values_are_configuration_errors() {
        for (var, value) in [
            ("CHATKEEP_HISTORY_WINDOW", "lots"),
            ("CHATKEEP_WRITE_ORDER", "sideways"),
            ("CHATKEEP_HTTP_TIMEOUT_SECS", "soon"),
            ("CHATKEEP_TEMPERATURE", "warm"),
            ("CHATKEEP_MAX_TOKENS", "-5"),
        ] {
            let err = ChatConfig::from_lookup(lookup(&[(var, value)])).unwrap_err();
            assert!(
                matches!(err, ChatError::Configuration(_)),
                "unexpected error for {var}: {err}"
            );
        }
    }

    #[test]
    fn generation_settings_reach_session_options() {
        let config = ChatConfig::from_lookup(lookup(&[
            ("CHATKEEP_TEMPERATURE", "0.3"),
            ("CHATKEEP_TOP_P", "0.9"),
            ("CHATKEEP_MAX_TOKENS", "512"),
            ("CHATKEEP_SEED", "42"),
            ("CHATKEEP_STOP", "User:, ,###"),
        ]))
        .unwrap();

        let settings = config.session_options().settings;
        assert_eq!(settings.temperature, Some(0.3));
        assert_eq!(settings.top_p, Some(0.9));
        assert_eq!(settings.max_tokens, Some(512));
        assert_eq!(settings.seed, Some(42));
        assert_eq!(
            settings.stop_sequences,
            Some(vec!["User:".to_string(), "###".to_string()])
        );
    }

    #[test]
    fn window_zero_means_unbounded() {
        assert_eq!(parse_window("0").unwrap(), HistoryWindow::Unbounded);
        assert_eq!(parse_window("Unbounded").unwrap(), HistoryWindow::Unbounded);
    }

    #[test]
    fn debug_output_hides_secrets() {
        let mut config = ChatConfig::new();
        config.set_api_key("mistral", "sk-secret".into());
        config.store = Some(StoreSettings {
            url: "https://x.supabase.co".into(),
            api_key: "service-secret".into(),
            unique_titles: false,
            message_key_column: None,
        });
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(!rendered.contains("service-secret"));
    }
}
