//! Configuration for the criteria parser.
//!
//! Config file resolution order:
//! 1. Explicit path passed to `ParserConfig::load_from()`
//! 2. CDS_CRITERIA_CONFIG environment variable
//! 3. `criteria.toml` in the platform config directory
//! 4. Built-in defaults

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_VAR: &str = "CDS_CRITERIA_CONFIG";

/// Parser limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Deepest parenthesis nesting accepted before the query is rejected.
    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: usize,

    /// Most relational expressions one query may combine with `and`/`or`.
    ///
    /// Junction chains become trees as deep as they are long, so this also
    /// bounds the recursion of anything walking a parsed query.
    #[serde(default = "default_max_terms")]
    pub max_terms: usize,
}

fn default_max_nesting_depth() -> usize {
    64
}

fn default_max_terms() -> usize {
    1024
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_nesting_depth: default_max_nesting_depth(),
            max_terms: default_max_terms(),
        }
    }
}

impl ParserConfig {
    /// Create a config with the given nesting limit.
    pub fn with_max_nesting_depth(max_nesting_depth: usize) -> Self {
        Self {
            max_nesting_depth,
            ..Self::default()
        }
    }

    /// Create a config with the given limit on combined expressions.
    pub fn with_max_terms(max_terms: usize) -> Self {
        Self {
            max_terms,
            ..Self::default()
        }
    }

    /// Load config using the standard resolution order.
    pub fn load() -> Result<Self> {
        match resolve_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from a specific file, or defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no parser config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: ParserConfig = toml::from_str(&contents).map_err(|e| {
            log::warn!("unusable parser config at {}: {}", path.display(), e);
            Error::Config(format!("Failed to parse config: {}", e))
        })?;
        Ok(config)
    }

    /// Save config to a specific file.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

/// Resolve the config file path using the standard resolution order.
fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_VAR) {
        return Some(PathBuf::from(path));
    }

    ProjectDirs::from("", "", "cds-criteria").map(|dirs| dirs.config_dir().join("criteria.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ParserConfig::default();
        assert_eq!(config.max_nesting_depth, 64);
        assert_eq!(config.max_terms, 1024);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = ParserConfig::load_from(&tmp.path().join("criteria.toml")).unwrap();
        assert_eq!(config, ParserConfig::default());
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("criteria.toml");

        let config = ParserConfig::with_max_nesting_depth(8);
        config.save_to(&path).unwrap();

        let loaded = ParserConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_empty_file_uses_field_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("criteria.toml");
        std::fs::write(&path, "").unwrap();

        let loaded = ParserConfig::load_from(&path).unwrap();
        assert_eq!(loaded, ParserConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("criteria.toml");
        std::fs::write(&path, "max_terms = 16").unwrap();

        let loaded = ParserConfig::load_from(&path).unwrap();
        assert_eq!(loaded.max_terms, 16);
        assert_eq!(loaded.max_nesting_depth, 64);
    }

    // The only test touching the process environment.
    #[test]
    fn test_load_resolves_env_var_then_config_dir() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.toml");
        std::fs::write(&path, "max_nesting_depth = 3\nmax_terms = 5\n").unwrap();

        std::env::set_var(CONFIG_PATH_VAR, &path);
        assert_eq!(resolve_config_path(), Some(path.clone()));
        let loaded = ParserConfig::load();
        std::env::remove_var(CONFIG_PATH_VAR);

        let loaded = loaded.unwrap();
        assert_eq!(loaded.max_nesting_depth, 3);
        assert_eq!(loaded.max_terms, 5);

        if let Some(fallback) = resolve_config_path() {
            assert!(fallback.ends_with("criteria.toml"));
            assert_ne!(fallback, path);
        }
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("criteria.toml");
        std::fs::write(&path, "max_nesting_depth = \"deep\"").unwrap();

        let err = ParserConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
