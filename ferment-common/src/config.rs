//! Configuration loading and resolution
//!
//! Each setting is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Command-line and environment values arrive together through
//! [`Overrides`] (clap reads both). A missing TOML file is not an error:
//! a warning is logged and defaults apply.

use crate::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "FERMENT_CONFIG";

/// Environment variable holding the completion service credential
pub const COMPLETION_KEY_ENV_VAR: &str = "FERMENT_COMPLETION_API_KEY";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_LOG_FILE: &str = "fermentation_data.csv";
pub const DEFAULT_COMPLETION_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-4o-mini";

/// Extraction strategy used by a relay process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Regex heuristics over the message text
    #[default]
    #[serde(alias = "regex")]
    Pattern,
    /// External text-completion call
    #[serde(alias = "ai")]
    Model,
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pattern" | "regex" => Ok(Strategy::Pattern),
            "model" | "ai" => Ok(Strategy::Model),
            other => Err(Error::InvalidInput(format!(
                "Unknown extraction strategy '{}' (expected 'pattern' or 'model')",
                other
            ))),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Pattern => write!(f, "pattern"),
            Strategy::Model => write!(f, "model"),
        }
    }
}

/// Bootstrap configuration loaded from TOML file
///
/// Read once at startup. Every field is optional in the file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,

    /// Path of the CSV reading log
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    #[serde(default)]
    pub strategy: Option<Strategy>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub pattern: PatternConfig,

    #[serde(default)]
    pub completion: CompletionConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Spelling variants recognized by the pattern strategy
///
/// Matching is case-insensitive; variants are tried in list order.
#[derive(Debug, Clone, Deserialize)]
pub struct PatternConfig {
    #[serde(default = "default_gravity_variants")]
    pub gravity_variants: Vec<String>,

    #[serde(default = "default_temperature_variants")]
    pub temperature_variants: Vec<String>,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            gravity_variants: default_gravity_variants(),
            temperature_variants: default_temperature_variants(),
        }
    }
}

/// Completion service settings for the model strategy
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionConfig {
    /// Credential fallback when the environment variable is unset
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_completion_base_url")]
    pub base_url: String,

    #[serde(default = "default_completion_model")]
    pub model: String,

    /// Request timeout; unset means wait indefinitely
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_completion_base_url(),
            model: default_completion_model(),
            timeout_secs: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_gravity_variants() -> Vec<String> {
    ["specific gravity", "spgr", "sp gre", "sp ger"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_temperature_variants() -> Vec<String> {
    ["temperature", "temp", "tamp"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_completion_base_url() -> String {
    DEFAULT_COMPLETION_BASE_URL.to_string()
}

fn default_completion_model() -> String {
    DEFAULT_COMPLETION_MODEL.to_string()
}

impl TomlConfig {
    /// Load configuration from `path`
    ///
    /// A missing file yields defaults with a warning. A file that exists but
    /// cannot be read or parsed is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let found = Self::read(path)?;
        Ok(Self::or_defaults(path, found))
    }

    /// Settle the result of [`TomlConfig::read`], logging which source applies
    pub fn or_defaults(path: &Path, found: Option<Self>) -> Self {
        match found {
            Some(config) => {
                info!("Loaded config from {}", path.display());
                config
            }
            None => {
                warn!("Config file {} not found, using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Read configuration without logging; `None` when the file is absent
    ///
    /// Used before the tracing subscriber exists, since the log level
    /// itself comes from this file.
    pub fn read(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::parse(&content)
            .map(Some)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }
}

/// Locate the config file: explicit path, then `FERMENT_CONFIG`, then the
/// platform config directory (`~/.config/ferment/config.toml` on Linux)
pub fn resolve_config_path(cli_arg: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    dirs::config_dir()
        .map(|d| d.join("ferment").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("ferment.toml"))
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_file: Option<PathBuf>,
    pub strategy: Option<Strategy>,
}

/// Fully resolved relay service settings
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub log_file: PathBuf,
    pub strategy: Strategy,
    pub log_level: String,
    pub pattern: PatternConfig,
    pub completion: CompletionConfig,
}

impl ServiceConfig {
    /// Merge overrides over the TOML file over compiled defaults
    pub fn resolve(overrides: Overrides, toml_config: TomlConfig) -> Result<Self> {
        let config = Self {
            host: overrides
                .host
                .or(toml_config.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: overrides.port.or(toml_config.port).unwrap_or(DEFAULT_PORT),
            log_file: overrides
                .log_file
                .or(toml_config.log_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            strategy: overrides
                .strategy
                .or(toml_config.strategy)
                .unwrap_or_default(),
            log_level: toml_config.logging.level,
            pattern: toml_config.pattern,
            completion: toml_config.completion,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.strategy == Strategy::Pattern {
            if !self.pattern.gravity_variants.iter().any(|v| is_valid_key(v)) {
                return Err(Error::Config(
                    "pattern.gravity_variants must name at least one spelling".to_string(),
                ));
            }
            if !self.pattern.temperature_variants.iter().any(|v| is_valid_key(v)) {
                return Err(Error::Config(
                    "pattern.temperature_variants must name at least one spelling".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Address the relay listens on
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Completion credential lookup
///
/// Resolved on every use rather than at startup, so a key exported after the
/// relay started is picked up and a missing key only fails the request that
/// needs it.
///
/// **Priority:** ENV → TOML
#[derive(Debug, Clone)]
pub struct ApiKeySource {
    env_var: String,
    toml_key: Option<String>,
}

impl ApiKeySource {
    pub fn new(env_var: impl Into<String>, toml_key: Option<String>) -> Self {
        Self {
            env_var: env_var.into(),
            toml_key,
        }
    }

    /// Standard source: `FERMENT_COMPLETION_API_KEY`, then `[completion] api_key`
    pub fn for_completion(config: &CompletionConfig) -> Self {
        Self::new(COMPLETION_KEY_ENV_VAR, config.api_key.clone())
    }

    /// Fixed key, used by tests and embedders
    pub fn fixed(key: impl Into<String>) -> Self {
        Self::new("", Some(key.into()))
    }

    /// Name of the environment variable consulted first
    pub fn env_var(&self) -> &str {
        &self.env_var
    }

    /// Current credential, if any source provides a valid one
    pub fn resolve(&self) -> Option<String> {
        if !self.env_var.is_empty() {
            if let Ok(key) = std::env::var(&self.env_var) {
                if is_valid_key(&key) {
                    return Some(key.trim().to_string());
                }
            }
        }

        self.toml_key
            .as_ref()
            .filter(|key| is_valid_key(key))
            .map(|key| key.trim().to_string())
    }
}

/// Validate a key or spelling (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
