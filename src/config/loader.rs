//! Job config loading.
//!
//! Errors carry the file they came from and, for TOML errors, the table
//! header (`[paths]`, `[theme.overrides]`, ...) the bad key sits under.

use crate::config::schema::{JobConfig, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        /// Table header enclosing the failing key, if it is not top-level.
        section: Option<String>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

impl ConfigError {
    fn at_path(mut self, file: &Path) -> Self {
        match &mut self {
            ConfigError::Toml { path, .. } | ConfigError::Validation { path, .. } => {
                path.get_or_insert_with(|| file.to_path_buf());
            }
            ConfigError::Io { .. } => {}
        }
        self
    }

    /// The job config section the error points into, if known.
    pub fn section(&self) -> Option<&str> {
        match self {
            ConfigError::Toml { section, .. } => section.as_deref(),
            _ => None,
        }
    }
}

fn origin(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map_or_else(|| "job config".to_string(), |p| format!("job config {}", p.display()))
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "cannot read job config {}: {source}", path.display())
            }
            ConfigError::Toml {
                path,
                section: Some(section),
                source,
            } => write!(f, "{} has a bad value under {section}: {source}", origin(path)),
            ConfigError::Toml {
                path,
                section: None,
                source,
            } => write!(f, "{} is not valid TOML: {source}", origin(path)),
            ConfigError::Validation { path, source } => {
                write!(f, "{} failed validation: {source}", origin(path))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
        }
    }
}

/// Last `[table]` header that starts before byte `offset` of `input`.
fn section_at(input: &str, offset: usize) -> Option<String> {
    let before = input.get(..offset.min(input.len()))?;
    before
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| line.starts_with('[') && line.ends_with(']'))
        .map(str::to_string)
}

pub fn load_from_str(input: &str) -> Result<JobConfig, ConfigError> {
    let config: JobConfig = toml_edit::de::from_str(input).map_err(|source| ConfigError::Toml {
        path: None,
        section: source.span().and_then(|span| section_at(input, span.start)),
        source,
    })?;
    config
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(config)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<JobConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.at_path(path))
}

/// `~/.config/tb-override/config.toml`, if a home directory is known.
pub fn default_config_path() -> Option<PathBuf> {
    home::home_dir().map(|home| home.join(".config/tb-override/config.toml"))
}
