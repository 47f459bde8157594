//! Application configuration types for ApplyMate.
//!
//! `AppConfig` mirrors `config.toml`. Every field has a default, so an empty
//! file (or no file) yields a working configuration. Secrets are never part
//! of this struct; they come from the environment at startup.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub limits: UsageLimits,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub transport: TransportConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public base URL, used to build links to stored media.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Directory for inbound and outbound media files.
    #[serde(default = "default_media_dir")]
    pub media_dir: PathBuf,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_media_dir() -> PathBuf {
    PathBuf::from("./media")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: default_base_url(),
            media_dir: default_media_dir(),
        }
    }
}

/// Model backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_text_model")]
    pub text_model: String,
    #[serde(default = "default_vision_model")]
    pub vision_model: String,
    #[serde(default)]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_vision_timeout_secs")]
    pub vision_timeout_secs: u64,
    /// Token cost recorded against a credential for each image extraction.
    #[serde(default = "default_vision_token_estimate")]
    pub vision_token_estimate: u32,
}

fn default_llm_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_text_model() -> String {
    "meta-llama/llama-4-scout-17b-16e-instruct".to_string()
}

fn default_vision_model() -> String {
    "llama-3.2-90b-vision-preview".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_vision_timeout_secs() -> u64 {
    20
}

fn default_vision_token_estimate() -> u32 {
    2000
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            text_model: default_text_model(),
            vision_model: default_vision_model(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
            vision_timeout_secs: default_vision_timeout_secs(),
            vision_token_estimate: default_vision_token_estimate(),
        }
    }
}

/// Per-credential usage ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageLimits {
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: usize,
    #[serde(default = "default_requests_per_day")]
    pub requests_per_day: usize,
    #[serde(default = "default_tokens_per_minute")]
    pub tokens_per_minute: u64,
    #[serde(default = "default_tokens_per_day")]
    pub tokens_per_day: u64,
}

fn default_requests_per_minute() -> usize {
    30
}

fn default_requests_per_day() -> usize {
    1000
}

fn default_tokens_per_minute() -> u64 {
    30_000
}

fn default_tokens_per_day() -> u64 {
    500_000
}

impl Default for UsageLimits {
    fn default() -> Self {
        Self {
            requests_per_minute: default_requests_per_minute(),
            requests_per_day: default_requests_per_day(),
            tokens_per_minute: default_tokens_per_minute(),
            tokens_per_day: default_tokens_per_day(),
        }
    }
}

/// Bounds and policies of the agent loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Wall-clock bound for one inbound turn.
    #[serde(default = "default_turn_timeout_secs")]
    pub turn_timeout_secs: u64,
    /// Maximum model plus tool steps in one turn.
    #[serde(default = "default_recursion_limit")]
    pub recursion_limit: usize,
    /// Transcripts longer than this are trimmed before prompting.
    #[serde(default = "default_trim_threshold")]
    pub trim_threshold: usize,
    /// Number of turns kept after trimming (including a leading system turn).
    #[serde(default = "default_trim_keep")]
    pub trim_keep: usize,
    /// Upper bound on attempts per model call when credentials are rate limited.
    #[serde(default = "default_max_rate_limit_retries")]
    pub max_rate_limit_retries: usize,
    /// Identical tool calls executed per turn before further copies are skipped.
    #[serde(default = "default_max_identical_tool_calls")]
    pub max_identical_tool_calls: usize,
}

fn default_turn_timeout_secs() -> u64 {
    30
}

fn default_recursion_limit() -> usize {
    25
}

fn default_trim_threshold() -> usize {
    18
}

fn default_trim_keep() -> usize {
    15
}

fn default_max_rate_limit_retries() -> usize {
    3
}

fn default_max_identical_tool_calls() -> usize {
    2
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            turn_timeout_secs: default_turn_timeout_secs(),
            recursion_limit: default_recursion_limit(),
            trim_threshold: default_trim_threshold(),
            trim_keep: default_trim_keep(),
            max_rate_limit_retries: default_max_rate_limit_retries(),
            max_identical_tool_calls: default_max_identical_tool_calls(),
        }
    }
}

/// Which record store backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Sheets,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sheets" => Ok(StoreBackend::Sheets),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("invalid store backend: '{other}'")),
        }
    }
}

/// Record store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
    /// Numeric id of the sheet tab (needed for row deletion).
    #[serde(default)]
    pub sheet_id: i64,
}

fn default_sheet_name() -> String {
    "Sheet1".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            spreadsheet_id: None,
            sheet_name: default_sheet_name(),
            sheet_id: 0,
        }
    }
}

/// Outbound chat transport settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Endpoint that delivers replies to the messaging channel.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.limits.requests_per_minute, 30);
        assert_eq!(config.limits.tokens_per_day, 500_000);
        assert_eq!(config.agent.turn_timeout_secs, 30);
        assert_eq!(config.agent.recursion_limit, 25);
        assert_eq!(config.agent.trim_threshold, 18);
        assert_eq!(config.agent.trim_keep, 15);
        assert_eq!(config.store.backend, StoreBackend::Sheets);
        assert_eq!(config.store.sheet_name, "Sheet1");
    }

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.llm.text_model, "meta-llama/llama-4-scout-17b-16e-instruct");
        assert_eq!(config.llm.vision_timeout_secs, 20);
        assert!(config.transport.webhook_url.is_none());
    }

    #[test]
    fn test_deserialize_partial_sections() {
        let toml_str = r#"
[server]
port = 8080

[agent]
recursion_limit = 10

[store]
backend = "memory"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.agent.recursion_limit, 10);
        assert_eq!(config.agent.turn_timeout_secs, 30);
        assert_eq!(config.store.backend, StoreBackend::Memory);
    }

    #[test]
    fn test_store_backend_from_str() {
        assert_eq!("Memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("postgres".parse::<StoreBackend>().is_err());
    }
}
