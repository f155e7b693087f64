//! TOML configuration for the command-line tool.
//!
//! ```toml
//! [database]
//! path = "${HOME}/.erdforge/database.sqlite"
//!
//! [output]
//! pretty = false
//! ```
//!
//! `DB_PATH` in the environment overrides `database.path`.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "erdforge.toml";
pub const DEFAULT_DATABASE_PATH: &str = "./data/database.sqlite";
pub const DATABASE_PATH_ENV: &str = "DB_PATH";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub output: OutputSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: DEFAULT_DATABASE_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Pretty-print JSON output.
    pub pretty: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl Settings {
    /// Load settings. An explicit path must exist; without one, a missing
    /// `erdforge.toml` in the working directory means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut settings = match path {
            Some(path) if !path.exists() => {
                return Err(SettingsError::FileNotFound(path.to_path_buf()));
            }
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        if let Ok(db_path) = env::var(DATABASE_PATH_ENV) {
            settings.database.path = db_path;
        }
        settings.database.path = expand_env_vars(&settings.database.path)?;

        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(contents)?)
    }
}

/// Expand `${VAR}` references. An unset variable is an error.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            result.push_str(&rest[start..]);
            return Ok(result);
        };
        let name = &after[..end];
        let value = env::var(name).map_err(|_| SettingsError::MissingEnvVar(name.to_string()))?;
        result.push_str(&value);
        rest = &after[end + 1..];
    }
    result.push_str(rest);

    Ok(result)
}
