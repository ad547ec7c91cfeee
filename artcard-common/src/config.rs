//! Configuration loading, folder resolution and credential resolution
//!
//! Resolution follows the same priority everywhere:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing default config file is not an error: a warning is logged and
//! compiled defaults are used. An explicitly requested config file that does
//! not exist is a configuration error.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable overriding the cards folder
pub const ENV_CARDS_DIR: &str = "ARTCARD_CARDS_DIR";
/// Environment variable overriding the portrait image folder
pub const ENV_IMAGES_DIR: &str = "ARTCARD_IMAGES_DIR";
/// Research service API key (required for live research runs)
pub const ENV_PERPLEXITY_API_KEY: &str = "PERPLEXITY_API_KEY";
/// Catalog client-credentials id
pub const ENV_SPOTIFY_CLIENT_ID: &str = "SPOTIFY_CLIENT_ID";
/// Catalog client-credentials secret
pub const ENV_SPOTIFY_CLIENT_SECRET: &str = "SPOTIFY_CLIENT_SECRET";

/// Name of the shared connections ledger inside the cards folder
pub const CONNECTIONS_FILE: &str = "artist_connections.json";

/// TOML configuration file (`~/.config/artcard/config.toml`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Folder holding the artist cards
    #[serde(default)]
    pub cards_dir: Option<PathBuf>,

    /// Folder holding downloaded artist portraits
    #[serde(default)]
    pub images_dir: Option<PathBuf>,

    /// Vault-relative prefix written to the `image_path` front matter field
    #[serde(default)]
    pub image_link_prefix: Option<String>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub credentials: CredentialsConfig,

    #[serde(default)]
    pub rate_limits: RateLimitConfig,

    #[serde(default)]
    pub research: ResearchConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr only if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// API credentials (environment variables take priority)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub perplexity_api_key: Option<String>,
    #[serde(default)]
    pub spotify_client_id: Option<String>,
    #[serde(default)]
    pub spotify_client_secret: Option<String>,
}

/// Minimum spacing between calls to each external service
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_catalog_ms")]
    pub catalog_ms: u64,
    /// MusicBrainz requires at most one request per second
    #[serde(default = "default_encyclopedia_ms")]
    pub encyclopedia_ms: u64,
    #[serde(default = "default_research_ms")]
    pub research_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            catalog_ms: default_catalog_ms(),
            encyclopedia_ms: default_encyclopedia_ms(),
            research_ms: default_research_ms(),
        }
    }
}

/// Research (chat completion) request parameters
#[derive(Debug, Clone, Deserialize)]
pub struct ResearchConfig {
    #[serde(default = "default_research_model")]
    pub model: String,
    #[serde(default = "default_research_temperature")]
    pub temperature: f32,
    #[serde(default = "default_research_max_tokens")]
    pub max_tokens: u32,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            model: default_research_model(),
            temperature: default_research_temperature(),
            max_tokens: default_research_max_tokens(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_catalog_ms() -> u64 {
    600
}

fn default_encyclopedia_ms() -> u64 {
    1000
}

fn default_research_ms() -> u64 {
    2000
}

fn default_research_model() -> String {
    "sonar-pro".to_string()
}

fn default_research_temperature() -> f32 {
    0.3
}

fn default_research_max_tokens() -> u32 {
    4096
}

/// OS-dependent compiled defaults
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledDefaults {
    pub cards_dir: PathBuf,
    pub images_dir: PathBuf,
    pub image_link_prefix: String,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let base = dirs::home_dir()
            .map(|home| home.join("ArtistWiki"))
            .unwrap_or_else(|| PathBuf::from("./ArtistWiki"));

        Self {
            cards_dir: base.join("Artists"),
            images_dir: base.join("ArtistPortraits"),
            image_link_prefix: "ArtistPortraits".to_string(),
            log_level: default_log_level(),
        }
    }
}

/// Default config file location: `<config_dir>/artcard/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("artcard").join("config.toml"))
}

/// Load TOML configuration
///
/// With `explicit_path` the file must exist. Without it the default location
/// is tried and defaults are used when it is absent.
pub fn load_toml_config(explicit_path: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit_path {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                debug!("No config file found, using compiled defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Resolve a folder: CLI → environment → TOML → compiled default
pub fn resolve_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml_value: Option<&Path>,
    default: PathBuf,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = toml_value {
        return path.to_path_buf();
    }

    default
}

/// Validate a credential (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Resolve a credential: environment → TOML
///
/// Warns when both sources carry a value (potential misconfiguration).
pub fn resolve_credential(label: &str, env_var_name: &str, toml_value: Option<&str>) -> Option<String> {
    let env_key = std::env::var(env_var_name).ok().filter(|k| is_valid_key(k));
    let toml_key = toml_value.filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "{} found in both environment and TOML config. Using environment variable.",
            label
        );
    }

    if let Some(key) = env_key {
        debug!("{} loaded from environment variable", label);
        return Some(key);
    }

    toml_key.map(|key| {
        debug!("{} loaded from TOML config", label);
        key.to_string()
    })
}

/// Resolve a credential that the run cannot proceed without
///
/// # Errors
/// `Config` with setup instructions when neither source provides a value.
pub fn require_credential(label: &str, env_var_name: &str, toml_value: Option<&str>) -> Result<String> {
    resolve_credential(label, env_var_name, toml_value).ok_or_else(|| {
        Error::Config(format!(
            "{label} not configured. Please configure using one of:\n\
             1. Environment: {env_var_name}=your-key-here\n\
             2. TOML config: {} ([credentials] section)",
            default_config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "~/.config/artcard/config.toml".to_string())
        ))
    })
}

/// Standard user-agent for outbound HTTP clients
///
/// MusicBrainz rejects anonymous clients, so this carries a contact URL.
pub fn get_user_agent() -> String {
    format!(
        "artcard/{} ( https://github.com/artcard/artcard )",
        env!("CARGO_PKG_VERSION")
    )
}
