//! Workspace configuration loading.
//!
//! # Responsibility
//! - Load the optional `jotter.toml` configuration file.
//! - Resolve the storage location with a default fallback.
//!
//! # Invariants
//! - A missing file or missing `db` key falls back to `journal.db`.
//! - Configuration is read once by assembly code; nothing re-reads it later.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

/// Default database file name when configuration leaves `db` unset.
pub const DEFAULT_DB_FILE: &str = "journal.db";

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "jotter.toml";

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "cannot read configuration: {err}"),
            Self::Parse(err) => write!(f, "invalid configuration: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

/// Parsed `jotter.toml` contents.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JotterConfig {
    /// Path to the backing database file.
    pub db: Option<String>,
}

impl JotterConfig {
    /// Loads configuration from `path`, or from [`CONFIG_FILE`] when `None`.
    ///
    /// A missing file yields the defaults rather than an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.unwrap_or_else(|| Path::new(CONFIG_FILE));
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Storage location, falling back to [`DEFAULT_DB_FILE`] when unset.
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(self.db.as_deref().unwrap_or(DEFAULT_DB_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::{JotterConfig, DEFAULT_DB_FILE};
    use std::io::Write;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = JotterConfig::load(Some(std::path::Path::new(
            "definitely-not-here/jotter.toml",
        )))
        .unwrap();
        assert_eq!(config.db_path().to_str(), Some(DEFAULT_DB_FILE));
    }

    #[test]
    fn db_key_overrides_default_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "db = \"notes/work.db\"").unwrap();

        let config = JotterConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.db_path().to_str(), Some("notes/work.db"));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "db = [unclosed").unwrap();

        assert!(JotterConfig::load(Some(file.path())).is_err());
    }
}
