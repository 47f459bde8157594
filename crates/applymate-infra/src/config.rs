//! Configuration loader for ApplyMate.
//!
//! Reads `config.toml` (or an explicitly named file) into [`AppConfig`], then
//! applies environment variable overrides. A missing default file means
//! defaults; a file the caller asked for by name must exist and parse.

use std::path::Path;

use applymate_types::config::{AppConfig, StoreBackend};
use applymate_types::error::ConfigError;

/// File read when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Load configuration from `path` (or [`DEFAULT_CONFIG_FILE`]) and the
/// process environment.
pub async fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let config = read_config_file(path).await?;
    apply_env_overrides(config, |key| std::env::var(key).ok())
}

async fn read_config_file(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let explicit = path.is_some();
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound && !explicit => {
            tracing::debug!("No {} found, using defaults", path.display());
            return Ok(AppConfig::default());
        }
        Err(err) => {
            return Err(ConfigError::Io {
                path: path.display().to_string(),
                message: err.to_string(),
            });
        }
    };

    let config = toml::from_str::<AppConfig>(&content).map_err(|err| ConfigError::Parse {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    tracing::debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Apply environment overrides through `lookup` (variable name to value).
///
/// Blank values are ignored.
pub fn apply_env_overrides(
    mut config: AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<AppConfig, ConfigError> {
    let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(port) = var("PORT") {
        config.server.port = port
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("PORT must be a port number, got '{port}'")))?;
    }
    if let Some(base_url) = var("BASE_URL") {
        config.server.base_url = base_url.trim_end_matches('/').to_string();
    }
    if let Some(model) = var("GROQ_TEXT_MODEL") {
        config.llm.text_model = model;
    }
    if let Some(model) = var("GROQ_IMAGE_MODEL") {
        config.llm.vision_model = model;
    }
    if let Some(id) = var("GOOGLE_SPREADSHEET_ID") {
        config.store.spreadsheet_id = Some(id);
    }
    if let Some(backend) = var("APPLYMATE_STORE") {
        config.store.backend = backend
            .parse::<StoreBackend>()
            .map_err(ConfigError::Invalid)?;
    }
    if let Some(url) = var("APPLYMATE_WEBHOOK_URL") {
        config.transport.webhook_url = Some(url);
    }

    Ok(config)
}
