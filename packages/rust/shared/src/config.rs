//! Application configuration for LessonForge.
//!
//! User config lives at `~/.lessonforge/lessonforge.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{LessonForgeError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "lessonforge.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".lessonforge";

// ---------------------------------------------------------------------------
// Config structs (matching lessonforge.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Generative service connection settings.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Sampling parameters sent with every request.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Constraints embedded in the authoring prompt.
    #[serde(default)]
    pub authoring: AuthoringConfig,
}

/// `[provider]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Base URL of the generative language API.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Upper bound on a single generation call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            endpoint: default_endpoint(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    /// Bound on a single generation call. `timeout_secs = 0` means the default.
    pub fn timeout(&self) -> Duration {
        let secs = match self.timeout_secs {
            0 => default_timeout_secs(),
            secs => secs,
        };
        Duration::from_secs(secs)
    }

    /// Parse the configured endpoint.
    pub fn endpoint_url(&self) -> Result<Url> {
        Url::parse(&self.endpoint).map_err(|e| {
            LessonForgeError::config(format!("invalid provider endpoint '{}': {e}", self.endpoint))
        })
    }
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".into()
}
fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}
fn default_model() -> String {
    "gemini-2.0-flash".into()
}
fn default_timeout_secs() -> u64 {
    60
}

/// `[generation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_top_k")]
    pub top_k: u32,

    /// Maximum number of output tokens the service may produce.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

fn default_temperature() -> f32 {
    0.2
}
fn default_top_p() -> f32 {
    0.8
}
fn default_top_k() -> u32 {
    40
}
fn default_max_output_tokens() -> u32 {
    8192
}

/// `[authoring]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthoringConfig {
    /// Fewest modules the prompt asks for.
    #[serde(default = "default_min_modules")]
    pub min_modules: u32,

    /// Most modules the prompt asks for.
    #[serde(default = "default_max_modules")]
    pub max_modules: u32,
}

impl Default for AuthoringConfig {
    fn default() -> Self {
        Self {
            min_modules: default_min_modules(),
            max_modules: default_max_modules(),
        }
    }
}

fn default_min_modules() -> u32 {
    4
}
fn default_max_modules() -> u32 {
    6
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.lessonforge/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| LessonForgeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.lessonforge/lessonforge.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| LessonForgeError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        LessonForgeError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    let authoring = &config.authoring;
    if authoring.min_modules == 0 || authoring.min_modules > authoring.max_modules {
        return Err(LessonForgeError::config(format!(
            "{}: authoring.min_modules must be between 1 and max_modules ({})",
            path.display(),
            authoring.max_modules
        )));
    }

    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| LessonForgeError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| LessonForgeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| LessonForgeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the API key from the env var named in the config.
pub fn resolve_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.provider.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(LessonForgeError::config(format!(
            "generative service API key not found. Set the {var_name} environment variable."
        ))),
    }
}
