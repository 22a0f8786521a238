//! Configuration loading and resolution
//!
//! Bootstrap configuration lives in a single TOML file. The file is located by
//! priority:
//! 1. Command-line argument (highest priority)
//! 2. `NOTABLY_CONFIG` environment variable
//! 3. `<config_dir>/notably/config.toml`
//! 4. Compiled defaults (fallback)
//!
//! A missing file is never fatal: the caller gets defaults and a warning.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "NOTABLY_CONFIG";

/// Environment variable carrying a Spotify bearer token
pub const TOKEN_ENV_VAR: &str = "NOTABLY_SPOTIFY_TOKEN";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Segmentation engine tuning
    #[serde(default)]
    pub engine: EngineSettings,

    /// Spotify Web API settings
    #[serde(default)]
    pub spotify: SpotifySettings,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (logs to stderr if not specified)
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

/// Segmentation engine settings
///
/// Every field has a built-in default so a partial `[engine]` table is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Longest window (in words) looked up as a single title
    #[serde(default = "default_max_window_words")]
    pub max_window_words: usize,

    /// Delay applied before each position's batch of lookups
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    /// Result limit passed to every search
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Lookups in flight at once within one position batch
    #[serde(default = "default_lookup_concurrency")]
    pub lookup_concurrency: usize,

    /// Extra attempts for a lookup that failed with a transient error
    #[serde(default)]
    pub transient_retries: u32,

    /// Overall run budget; unset means no deadline
    #[serde(default)]
    pub deadline_ms: Option<u64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_window_words: default_max_window_words(),
            batch_delay_ms: default_batch_delay_ms(),
            max_results: default_max_results(),
            lookup_concurrency: default_lookup_concurrency(),
            transient_retries: 0,
            deadline_ms: None,
        }
    }
}

impl EngineSettings {
    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_window_words == 0 {
            return Err(Error::Config(
                "engine.max_window_words must be at least 1".to_string(),
            ));
        }
        if self.lookup_concurrency == 0 {
            return Err(Error::Config(
                "engine.lookup_concurrency must be at least 1".to_string(),
            ));
        }
        if self.max_results == 0 {
            return Err(Error::Config(
                "engine.max_results must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Spotify Web API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotifySettings {
    /// Bearer token (issuance and refresh happen elsewhere)
    #[serde(default)]
    pub access_token: Option<String>,

    /// API base URL, overridable for proxies and tests
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Client-side request budget
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Prefix for generated playlist names
    #[serde(default = "default_playlist_name_prefix")]
    pub playlist_name_prefix: String,
}

impl Default for SpotifySettings {
    fn default() -> Self {
        Self {
            access_token: None,
            api_base_url: default_api_base_url(),
            requests_per_second: default_requests_per_second(),
            playlist_name_prefix: default_playlist_name_prefix(),
        }
    }
}

impl SpotifySettings {
    pub fn validate(&self) -> Result<()> {
        if self.requests_per_second == 0 {
            return Err(Error::Config(
                "spotify.requests_per_second must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl TomlConfig {
    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.engine.validate()?;
        self.spotify.validate()
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_window_words() -> usize {
    10
}

fn default_batch_delay_ms() -> u64 {
    100
}

fn default_max_results() -> usize {
    50
}

fn default_lookup_concurrency() -> usize {
    1
}

fn default_api_base_url() -> String {
    "https://api.spotify.com/v1".to_string()
}

fn default_requests_per_second() -> u32 {
    5
}

fn default_playlist_name_prefix() -> String {
    "Notably".to_string()
}

/// Locate the config file following the priority order above
///
/// Returns `None` when no explicit path is given and the platform default
/// does not exist.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    default_config_path().filter(|p| p.exists())
}

/// `<config_dir>/notably/config.toml` for the current platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("notably").join("config.toml"))
}

/// Load and validate a config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Where a loaded configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// No file located; built-in defaults
    Defaults,
    /// A file was named but does not exist; built-in defaults
    Missing(PathBuf),
    /// Loaded from this file
    File(PathBuf),
}

impl ConfigOrigin {
    /// Report the origin through tracing
    ///
    /// Separate from loading so a binary can load first, install its
    /// subscriber from the loaded `[logging]` section, then report.
    pub fn log(&self) {
        match self {
            Self::Defaults => info!("No config file found, using built-in defaults"),
            Self::Missing(path) => warn!(
                "Config file {} does not exist, using built-in defaults",
                path.display()
            ),
            Self::File(path) => info!("Loaded config from {}", path.display()),
        }
    }
}

/// Load configuration with graceful degradation, without logging
///
/// A missing file yields defaults. A file that exists but fails to parse or
/// validate is an error.
pub fn load_with_origin(cli_arg: Option<&Path>) -> Result<(TomlConfig, ConfigOrigin)> {
    let Some(path) = resolve_config_path(cli_arg) else {
        return Ok((TomlConfig::default(), ConfigOrigin::Defaults));
    };

    if !path.exists() {
        return Ok((TomlConfig::default(), ConfigOrigin::Missing(path)));
    }

    let config = load_toml_config(&path)?;
    Ok((config, ConfigOrigin::File(path)))
}

/// Load configuration with graceful degradation, logging the origin
pub fn load_or_default(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    let (config, origin) = load_with_origin(cli_arg)?;
    origin.log();
    Ok(config)
}

/// Write config atomically (temp file + rename)
///
/// On Unix the file is restricted to 0600 since it may hold a token.
pub fn write_toml_config(config: &TomlConfig, target: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;

    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut temp_path = target.as_os_str().to_owned();
    temp_path.push(".tmp");
    let temp_path = PathBuf::from(temp_path);

    std::fs::write(&temp_path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    if let Err(e) = std::fs::rename(&temp_path, target) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(Error::Io(e));
    }
    Ok(())
}

/// Resolve the Spotify access token
///
/// **Priority:** explicit (CLI or `NOTABLY_SPOTIFY_TOKEN`) → TOML
pub fn resolve_access_token(explicit: Option<&str>, toml_config: &TomlConfig) -> Result<String> {
    let toml_token = toml_config.spotify.access_token.as_deref();

    let mut sources = Vec::new();
    if explicit.is_some_and(is_valid_token) {
        sources.push("command line/environment");
    }
    if toml_token.is_some_and(is_valid_token) {
        sources.push("TOML");
    }

    if sources.len() > 1 {
        warn!(
            "Spotify access token found in multiple sources: {}. Using command line/environment.",
            sources.join(", ")
        );
    }

    if let Some(token) = explicit.filter(|t| is_valid_token(t)) {
        info!("Spotify access token taken from command line/environment");
        return Ok(token.trim().to_string());
    }

    if let Some(token) = toml_token.filter(|t| is_valid_token(t)) {
        info!("Spotify access token loaded from TOML config");
        return Ok(token.trim().to_string());
    }

    Err(Error::Config(format!(
        "Spotify access token not configured. Provide one of:\n\
         1. Command line: --token <TOKEN>\n\
         2. Environment: {}=<TOKEN>\n\
         3. TOML config: [spotify] access_token = \"<TOKEN>\"",
        TOKEN_ENV_VAR
    )))
}

/// Token is usable when non-empty after trimming
pub fn is_valid_token(token: &str) -> bool {
    !token.trim().is_empty()
}
