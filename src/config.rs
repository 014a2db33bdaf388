//! Configuration for the session manager
//!
//! Loads configuration from config.yml file, with environment overrides.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Error;

/// Default constants (fallback if config.yml not found)
pub const SESSIONS_FILE: &str = "sessions.json";
pub const SESSION_DIR: &str = ".";

/// YAML config structures
#[derive(Debug, Deserialize)]
struct YamlConfig {
    storage: Option<StorageConfig>,
    telegram: Option<TelegramConfig>,
}

#[derive(Debug, Deserialize)]
struct StorageConfig {
    sessions_file: Option<String>,
    session_dir: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TelegramConfig {
    #[serde(default, deserialize_with = "deserialize_string_or_number")]
    dialog_limit: Option<String>,
}

/// Deserialize a value that can be either a string or a number
fn deserialize_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error as _;
    let value: Option<serde_yaml::Value> = Option::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(serde_yaml::Value::String(s)) => Ok(Some(s)),
        Some(serde_yaml::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected string or number, got {:?}",
            other
        ))),
    }
}

/// Main configuration struct
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// JSON array of stored session records.
    pub sessions_file: PathBuf,
    /// Directory holding the per-account `<name>.session` files.
    pub session_dir: PathBuf,
    /// Maximum dialogs fetched per listing; `None` means all.
    pub dialog_limit: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Load configuration from config.yml or use defaults
    /// Environment variables take precedence over config.yml values
    pub fn new() -> Self {
        Self::load_from_file("config.yml")
            .or_else(|_| Self::load_from_file("../config.yml"))
            .unwrap_or_else(|_| {
                Self::load_dotenv();
                Self::from_sections(None, None)
            })
    }

    /// Resolve a value: prefer env var if config value looks like ${VAR}
    fn resolve_env_string(value: Option<String>, env_key: &str) -> Option<String> {
        if let Some(ref v) = value {
            if v.starts_with("${") && v.ends_with('}') {
                let var_name = &v[2..v.len() - 1];
                if let Ok(env_val) = std::env::var(var_name) {
                    return Some(env_val);
                }
            }
        }
        if let Ok(env_val) = std::env::var(env_key) {
            return Some(env_val);
        }
        value.filter(|v| !(v.starts_with("${") && v.ends_with('}')))
    }

    /// Load .env file into environment variables using dotenvy
    fn load_dotenv() {
        if dotenvy::dotenv().is_err() {
            let _ = dotenvy::from_filename("../.env");
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> crate::error::Result<Self> {
        Self::load_dotenv();

        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| Error::ConfigError(format!("Failed to read config file: {}", e)))?;

        let yaml: YamlConfig = serde_yaml::from_str(&content)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config file: {}", e)))?;

        Ok(Self::from_sections(yaml.storage, yaml.telegram))
    }

    fn from_sections(storage: Option<StorageConfig>, telegram: Option<TelegramConfig>) -> Self {
        let storage = storage.unwrap_or(StorageConfig {
            sessions_file: None,
            session_dir: None,
        });
        let telegram = telegram.unwrap_or(TelegramConfig { dialog_limit: None });

        let sessions_file = Self::resolve_env_string(storage.sessions_file, "SESSIONS_FILE")
            .unwrap_or_else(|| SESSIONS_FILE.to_string());
        let session_dir = Self::resolve_env_string(storage.session_dir, "SESSION_DIR")
            .unwrap_or_else(|| SESSION_DIR.to_string());
        let dialog_limit = Self::resolve_env_string(telegram.dialog_limit, "DIALOG_LIMIT")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|limit| *limit > 0);

        Self {
            sessions_file: PathBuf::from(sessions_file),
            session_dir: PathBuf::from(session_dir),
            dialog_limit,
        }
    }

    /// Create config with built-in defaults, ignoring files and environment.
    pub fn defaults() -> Self {
        Self {
            sessions_file: PathBuf::from(SESSIONS_FILE),
            session_dir: PathBuf::from(SESSION_DIR),
            dialog_limit: None,
        }
    }
}
