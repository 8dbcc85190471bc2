//! Tests for configuration loading from the environment and dotenv files.

use std::io::Write;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use chatkeep::config::ChatConfig;
use chatkeep::error::ChatError;
use chatkeep::session::{HistoryWindow, WriteOrder};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const CONFIG_ENV_VARS: [&str; 20] = [
    "MISTRAL_API_KEY",
    "MISTRAL_BASE_URL",
    "OPENAI_COMPAT_API_KEY",
    "OPENAI_COMPAT_BASE_URL",
    "SUPABASE_URL",
    "SUPABASE_KEY",
    "SUPABASE_UNIQUE_TITLES",
    "SUPABASE_MESSAGE_KEY_COLUMN",
    "CHATKEEP_MODEL",
    "CHATKEEP_SYSTEM_PROMPT",
    "CHATKEEP_TITLE",
    "CHATKEEP_HISTORY_WINDOW",
    "CHATKEEP_WRITE_ORDER",
    "CHATKEEP_DUPLICATE_TITLES",
    "CHATKEEP_HTTP_TIMEOUT_SECS",
    "CHATKEEP_TEMPERATURE",
    "CHATKEEP_TOP_P",
    "CHATKEEP_MAX_TOKENS",
    "CHATKEEP_SEED",
    "CHATKEEP_STOP",
];

struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    fn capture(keys: &[&str]) -> Self {
        let saved = keys
            .iter()
            .map(|key| ((*key).to_string(), std::env::var(key).ok()))
            .collect();
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }
}

fn env_lock_guard() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[test]
fn from_env_maps_keys_store_and_session_settings() {
    let _env_lock = env_lock_guard();
    let _env_guard = EnvGuard::capture(&CONFIG_ENV_VARS);
    for key in CONFIG_ENV_VARS {
        std::env::remove_var(key);
    }

    std::env::set_var("MISTRAL_API_KEY", "test-mistral-key");
    std::env::set_var("SUPABASE_URL", "https://demo.supabase.co");
    std::env::set_var("SUPABASE_KEY", "anon-key");
    std::env::set_var("SUPABASE_UNIQUE_TITLES", "true");
    std::env::set_var("CHATKEEP_TITLE", "Demo");
    std::env::set_var("CHATKEEP_HISTORY_WINDOW", "8");

    let config = ChatConfig::from_env().unwrap();

    assert_eq!(
        config.get_api_key("mistral"),
        Some("test-mistral-key".to_string())
    );
    let store = config.require_store().unwrap();
    assert_eq!(store.url, "https://demo.supabase.co");
    assert!(store.unique_titles);
    assert_eq!(config.title, "Demo");
    assert_eq!(config.window, HistoryWindow::sliding(8));
}

#[test]
fn from_env_reports_malformed_values() {
    let _env_lock = env_lock_guard();
    let _env_guard = EnvGuard::capture(&CONFIG_ENV_VARS);
    for key in CONFIG_ENV_VARS {
        std::env::remove_var(key);
    }
    std::env::set_var("SUPABASE_URL", "https://demo.supabase.co");
    std::env::set_var("SUPABASE_KEY", "anon-key");
    std::env::set_var("SUPABASE_UNIQUE_TITLES", "maybe");

    let err = ChatConfig::from_env().unwrap_err();
    assert!(matches!(err, ChatError::Configuration(ref msg) if msg.contains("SUPABASE_UNIQUE_TITLES")));
}

#[test]
fn from_dotenv_file_reads_without_touching_process_env() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "MISTRAL_API_KEY=file-key").unwrap();
    writeln!(file, "MISTRAL_BASE_URL=http://localhost:8080/v1").unwrap();
    writeln!(file, "CHATKEEP_MODEL=mistral:mistral-small-latest").unwrap();
    writeln!(file, "CHATKEEP_WRITE_ORDER=store-first").unwrap();
    writeln!(file, "CHATKEEP_HTTP_TIMEOUT_SECS=15").unwrap();

    let config = ChatConfig::from_dotenv_file(file.path()).unwrap();

    assert_eq!(config.get_api_key("mistral"), Some("file-key".to_string()));
    assert_eq!(
        config.get_base_url("mistral"),
        Some("http://localhost:8080/v1".to_string())
    );
    assert_eq!(config.model, "mistral:mistral-small-latest");
    assert_eq!(config.write_order, WriteOrder::StoreFirst);
    assert_eq!(config.http_timeout, Duration::from_secs(15));
}

#[test]
fn from_dotenv_file_missing_is_configuration_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let err = ChatConfig::from_dotenv_file(dir.path().join("absent.env")).unwrap_err();
    assert!(matches!(err, ChatError::Configuration(_)));
}
