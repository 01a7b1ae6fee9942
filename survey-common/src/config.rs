//! Configuration loading for the survey tooling
//!
//! Settings are resolved in priority order:
//! 1. Command-line arguments (highest priority)
//! 2. Environment variables (`SURVEY_CLASSIFIER_PROJECT_ID`, `SURVEY_LOG_LEVEL`)
//! 3. TOML config file
//! 4. Compiled defaults (fallback)
//!
//! A missing config file at the default location is not an error; a file the
//! caller names explicitly must exist, and a malformed file always fails.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory name under the platform config dir
pub const CONFIG_DIR_NAME: &str = "survey-ensemble";

/// Config file name inside [`CONFIG_DIR_NAME`]
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable overriding the classifier project id
pub const PROJECT_ID_ENV: &str = "SURVEY_CLASSIFIER_PROJECT_ID";

/// Environment variable overriding the log level
pub const LOG_LEVEL_ENV: &str = "SURVEY_LOG_LEVEL";

/// TOML configuration file contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Classification service settings
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Export destination
    #[serde(default)]
    pub export: ExportConfig,
}

/// Classification service settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Base URL of the classification service the inputs were fetched from (logged at startup)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Project whose models form the survey classifier ensemble
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default, skip_serializing_if = "Option::is_none")]
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

/// Export destination
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// CSV output path (stdout when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Platform config file location (`~/.config/survey-ensemble/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound(format!("config file {}", path.display()))
        } else {
            Error::Config(format!("Read TOML failed for {}: {}", path.display(), e))
        }
    })?;

    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed for {}: {}", path.display(), e)))?;

    info!("Loaded TOML configuration from {}", path.display());
    Ok(config)
}

/// Load the config the caller asked for, or the default-location file if present
///
/// An explicit path must exist. Without one, a missing default file yields
/// [`TomlConfig::default`].
pub fn load_config_or_default(explicit: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        return load_toml_config(path);
    }

    match default_config_path() {
        Some(path) if path.exists() => load_toml_config(&path),
        Some(path) => {
            debug!("No config file at {}, using defaults", path.display());
            Ok(TomlConfig::default())
        }
        None => {
            debug!("Could not determine config directory, using defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Write a TOML config file atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let temp_path = temp_path_for(path);
    if let Err(e) = std::fs::write(&temp_path, content) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e.into());
    }
    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e.into());
    }

    debug!("Wrote TOML configuration to {}", path.display());
    Ok(())
}

/// Sibling temp path used for atomic writes (`name.ext` → `name.ext.tmp`)
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut file_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    file_name.push(".tmp");
    path.with_file_name(file_name)
}

/// Command-line configuration overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub project_id: Option<i64>,
    pub log_level: Option<String>,
    pub output_path: Option<PathBuf>,
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Project to filter the model registry to (`None` keeps every record)
    pub project_id: Option<i64>,
    pub classifier_url: Option<String>,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
}

impl Settings {
    /// Resolve settings from CLI overrides, environment, and TOML
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `SURVEY_CLASSIFIER_PROJECT_ID` is set but not an integer.
    pub fn resolve(toml_config: &TomlConfig, overrides: ConfigOverrides) -> Result<Self> {
        let env_project_id = match std::env::var(PROJECT_ID_ENV) {
            Ok(value) => Some(value.trim().parse::<i64>().map_err(|e| {
                Error::Config(format!("{} must be an integer, got '{}': {}", PROJECT_ID_ENV, value, e))
            })?),
            Err(_) => None,
        };
        let env_log_level = std::env::var(LOG_LEVEL_ENV)
            .ok()
            .filter(|level| !level.trim().is_empty());

        let project_id = overrides
            .project_id
            .or(env_project_id)
            .or(toml_config.classifier.project_id);

        let log_level = overrides
            .log_level
            .or(env_log_level)
            .unwrap_or_else(|| toml_config.logging.level.clone());

        let output_path = overrides
            .output_path
            .or_else(|| toml_config.export.output_path.clone());

        Ok(Self {
            project_id,
            classifier_url: toml_config.classifier.url.clone(),
            log_level,
            log_file: toml_config.logging.file.clone(),
            output_path,
        })
    }
}
