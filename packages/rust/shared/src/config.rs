//! Application configuration for lessonpress.
//!
//! User config lives at `~/.lessonpress/lessonpress.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LessonPressError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "lessonpress.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".lessonpress";

// ---------------------------------------------------------------------------
// Config structs (matching lessonpress.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Remote content API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Document rendering settings.
    #[serde(default)]
    pub render: RenderConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Default path for the extracted collection JSON.
    #[serde(default = "default_collection_path")]
    pub collection_path: String,

    /// Default output directory for assembled documents.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Default concurrent deploy requests.
    #[serde(default = "default_deploy_concurrency")]
    pub deploy_concurrency: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            collection_path: default_collection_path(),
            output_dir: default_output_dir(),
            deploy_concurrency: default_deploy_concurrency(),
        }
    }
}

fn default_collection_path() -> String {
    "enhancedTranscripts.json".into()
}
fn default_output_dir() -> String {
    ".".into()
}
fn default_deploy_concurrency() -> u32 {
    4
}

/// `[api]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Name of the env var holding the bearer token (never store the token itself).
    #[serde(default = "default_auth_token_env")]
    pub auth_token_env: String,

    /// Default target domain, overridable per-invocation via `--domain`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_domain: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            auth_token_env: default_auth_token_env(),
            default_domain: None,
        }
    }
}

fn default_auth_token_env() -> String {
    "LESSONPRESS_AUTH_TOKEN".into()
}

/// `[render]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// External renderer command used to turn Markdown into a PDF.
    /// Invoked as `<command> <input.md> -o <output.pdf>`.
    #[serde(default = "default_renderer")]
    pub command: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            command: default_renderer(),
        }
    }
}

fn default_renderer() -> String {
    "pandoc".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.lessonpress/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| LessonPressError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.lessonpress/lessonpress.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| LessonPressError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        LessonPressError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| LessonPressError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| LessonPressError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| LessonPressError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Resolve the bearer token from the env var named in config.
/// The token is supplied once at process start and reused for every request.
pub fn resolve_auth_token(config: &AppConfig) -> Result<String> {
    let var_name = &config.api.auth_token_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(LessonPressError::config(format!(
            "auth token not found. Set the {var_name} environment variable."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("collection_path"));
        assert!(toml_str.contains("LESSONPRESS_AUTH_TOKEN"));
        assert!(toml_str.contains("pandoc"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.deploy_concurrency, 4);
        assert_eq!(parsed.api.auth_token_env, "LESSONPRESS_AUTH_TOKEN");
    }

    #[test]
    fn config_with_overrides() {
        let toml_str = r#"
[defaults]
collection_path = "/tmp/out.json"
deploy_concurrency = 8

[api]
default_domain = "https://staging.example.com"

[render]
command = "md-to-pdf"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.collection_path, "/tmp/out.json");
        assert_eq!(config.defaults.deploy_concurrency, 8);
        assert_eq!(
            config.api.default_domain.as_deref(),
            Some("https://staging.example.com")
        );
        assert_eq!(config.render.command, "md-to-pdf");
    }

    #[test]
    fn auth_token_resolution_fails_when_unset() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.api.auth_token_env = "LP_TEST_NONEXISTENT_TOKEN_12345".into();
        let result = resolve_auth_token(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("auth token not found"));
    }
}
