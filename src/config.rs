//! Configuration for the Mini App client
//!
//! Loads configuration from config.yml file

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::warn;

use crate::error::{Error, Result};

/// Default constants (fallback if config.yml not found)
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_STORAGE_PATH: &str = "prizma_storage.json";
pub const FALLBACK_USER_ID: i64 = 123_456_789;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const REPORT_POLL_MIN_SECS: u64 = 15;
pub const REPORT_POLL_MAX_SECS: u64 = 30;
pub const ERROR_RETRY_SECS: u64 = 30;
pub const PAYMENT_POLL_SECS: u64 = 3;
pub const PAYMENT_TIMEOUT_SECS: u64 = 300;
pub const FAILED_REDIRECT_DELAY_MS: u64 = 2000;
pub const MIN_ANSWER_LENGTH: usize = 350;
pub const SPECIAL_OFFER_HOURS: u32 = 12;

/// YAML config structures
#[derive(Debug, Deserialize)]
struct YamlConfig {
    api: Option<ApiConfig>,
    app: Option<AppConfig>,
    polling: Option<PollingConfig>,
    quiz: Option<QuizConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiConfig {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    send_init_data: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct AppConfig {
    #[serde(default, deserialize_with = "deserialize_string_or_number")]
    fallback_user_id: Option<String>,
    storage_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PollingConfig {
    report_interval_secs: Option<u64>,
    error_retry_secs: Option<u64>,
    payment_interval_secs: Option<u64>,
    payment_timeout_secs: Option<u64>,
    failed_redirect_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct QuizConfig {
    min_answer_length: Option<usize>,
    special_offer_hours: Option<u32>,
}

/// Deserialize a value that can be either a string or a number
fn deserialize_string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
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
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub api_timeout_secs: u64,
    pub send_init_data: bool,
    pub fallback_user_id: i64,
    pub storage_path: PathBuf,
    pub report_poll_interval_secs: u64,
    pub error_retry_secs: u64,
    pub payment_poll_interval_secs: u64,
    pub payment_timeout_secs: u64,
    pub failed_redirect_delay_ms: u64,
    pub min_answer_length: usize,
    pub special_offer_hours: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Load configuration from config.yml or use defaults
    /// Environment variables take precedence over config.yml string values
    pub fn new() -> Self {
        Self::load_from_file("config.yml")
            .or_else(|_| Self::load_from_file("../config.yml"))
            .unwrap_or_else(|_| {
                Self::load_dotenv();
                Self::defaults().with_env_overrides()
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
                return std::env::var(env_key).ok();
            }
        }
        if let Ok(env_val) = std::env::var(env_key) {
            return Some(env_val);
        }
        value
    }

    /// Resolve an i64 value; a literal YAML number wins over the environment
    fn resolve_env_i64(value: Option<String>, env_key: &str) -> Option<i64> {
        if let Some(ref v) = value {
            if v.starts_with("${") && v.ends_with('}') {
                let var_name = &v[2..v.len() - 1];
                if let Some(parsed) = std::env::var(var_name).ok().and_then(|s| s.parse().ok()) {
                    return Some(parsed);
                }
            }
            if let Ok(parsed) = v.parse::<i64>() {
                return Some(parsed);
            }
        }
        std::env::var(env_key).ok().and_then(|s| s.parse().ok())
    }

    /// Load .env file into environment variables using dotenvy
    fn load_dotenv() {
        if dotenvy::dotenv().is_err() {
            let _ = dotenvy::from_filename("../.env");
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_dotenv();

        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let yaml: YamlConfig = serde_yaml::from_str(&content)?;

        let api = yaml.api.unwrap_or_default();
        let app = yaml.app.unwrap_or_default();
        let polling = yaml.polling.unwrap_or_default();
        let quiz = yaml.quiz.unwrap_or_default();

        let api_base_url = Self::resolve_env_string(api.base_url, "PRIZMA_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let storage_path = Self::resolve_env_string(app.storage_path, "PRIZMA_STORAGE_PATH")
            .unwrap_or_else(|| DEFAULT_STORAGE_PATH.to_string());
        let fallback_user_id =
            Self::resolve_env_i64(app.fallback_user_id, "PRIZMA_FALLBACK_USER_ID")
                .unwrap_or(FALLBACK_USER_ID);

        let config = Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            api_timeout_secs: api.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            send_init_data: api.send_init_data.unwrap_or(true),
            fallback_user_id,
            storage_path: PathBuf::from(storage_path),
            report_poll_interval_secs: Self::clamp_report_interval(
                polling.report_interval_secs.unwrap_or(REPORT_POLL_MIN_SECS),
            ),
            error_retry_secs: polling.error_retry_secs.unwrap_or(ERROR_RETRY_SECS),
            payment_poll_interval_secs: polling.payment_interval_secs.unwrap_or(PAYMENT_POLL_SECS),
            payment_timeout_secs: polling.payment_timeout_secs.unwrap_or(PAYMENT_TIMEOUT_SECS),
            failed_redirect_delay_ms: polling
                .failed_redirect_delay_ms
                .unwrap_or(FAILED_REDIRECT_DELAY_MS),
            min_answer_length: quiz.min_answer_length.unwrap_or(MIN_ANSWER_LENGTH),
            special_offer_hours: quiz.special_offer_hours.unwrap_or(SPECIAL_OFFER_HOURS),
        };

        config.validate()?;
        Ok(config)
    }

    /// Create config with built-in defaults (fallback)
    pub fn defaults() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            api_timeout_secs: DEFAULT_TIMEOUT_SECS,
            send_init_data: true,
            fallback_user_id: FALLBACK_USER_ID,
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            report_poll_interval_secs: REPORT_POLL_MIN_SECS,
            error_retry_secs: ERROR_RETRY_SECS,
            payment_poll_interval_secs: PAYMENT_POLL_SECS,
            payment_timeout_secs: PAYMENT_TIMEOUT_SECS,
            failed_redirect_delay_ms: FAILED_REDIRECT_DELAY_MS,
            min_answer_length: MIN_ANSWER_LENGTH,
            special_offer_hours: SPECIAL_OFFER_HOURS,
        }
    }

    /// Apply explicit environment overrides on top of the defaults
    fn with_env_overrides(mut self) -> Self {
        if let Some(url) = Self::resolve_env_string(None, "PRIZMA_API_URL") {
            self.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(path) = Self::resolve_env_string(None, "PRIZMA_STORAGE_PATH") {
            self.storage_path = PathBuf::from(path);
        }
        if let Some(id) = Self::resolve_env_i64(None, "PRIZMA_FALLBACK_USER_ID") {
            self.fallback_user_id = id;
        }
        self
    }

    /// Point the client at a different backend (used by tests and the CLI).
    pub fn with_api_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn clamp_report_interval(secs: u64) -> u64 {
        let clamped = secs.clamp(REPORT_POLL_MIN_SECS, REPORT_POLL_MAX_SECS);
        if clamped != secs {
            warn!(
                requested = secs,
                used = clamped,
                "Report polling interval outside the 15-30s window"
            );
        }
        clamped
    }

    fn validate(&self) -> Result<()> {
        if self.api_base_url.is_empty() {
            return Err(Error::ConfigError("api.base_url must not be empty".into()));
        }
        if self.min_answer_length == 0 {
            return Err(Error::ConfigError(
                "quiz.min_answer_length must be positive".into(),
            ));
        }
        if self.payment_poll_interval_secs == 0 {
            return Err(Error::ConfigError(
                "polling.payment_interval_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    pub fn report_poll_interval(&self) -> Duration {
        Duration::from_secs(self.report_poll_interval_secs)
    }

    pub fn error_retry(&self) -> Duration {
        Duration::from_secs(self.error_retry_secs)
    }

    pub fn payment_poll_interval(&self) -> Duration {
        Duration::from_secs(self.payment_poll_interval_secs)
    }

    pub fn payment_timeout(&self) -> Duration {
        Duration::from_secs(self.payment_timeout_secs)
    }

    pub fn failed_redirect_delay(&self) -> Duration {
        Duration::from_millis(self.failed_redirect_delay_ms)
    }

    pub fn special_offer_duration(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.special_offer_hours))
    }
}
