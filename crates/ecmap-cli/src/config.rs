use anyhow::{Context, Result};
use ecmap::Builder;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Configuration for ecmap CLI operations, read from `ecmap.toml`
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub database: DatabaseConfig,

    pub mapping: MappingConfig,
}

/// Where the database lives and how it is opened
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Path to the database file
    pub path: Option<PathBuf>,

    /// How long to wait on a locked database, in milliseconds
    pub busy_timeout_ms: Option<u64>,
}

/// Options passed to the mapper. Unset fields keep the library defaults.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MappingConfig {
    pub max_inline_struct_depth: Option<usize>,

    pub create_views: Option<bool>,

    pub index_foreign_keys: Option<bool>,
}

impl Config {
    /// Create a new Config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        contents
            .parse::<Config>()
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Load a config file if it exists, otherwise use the defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        if !path.as_ref().exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Set the database path
    pub fn database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database.path = Some(path.into());
        self
    }

    /// A database builder with every configured option applied
    pub fn builder(&self) -> Builder {
        let mut builder = ecmap::Db::builder();

        if let Some(timeout) = self.database.busy_timeout_ms {
            builder = builder.busy_timeout(Duration::from_millis(timeout));
        }
        if let Some(depth) = self.mapping.max_inline_struct_depth {
            builder = builder.max_inline_struct_depth(depth);
        }
        if let Some(create_views) = self.mapping.create_views {
            builder = builder.create_views(create_views);
        }
        if let Some(index_foreign_keys) = self.mapping.index_foreign_keys {
            builder = builder.index_foreign_keys(index_foreign_keys);
        }

        builder
    }
}

impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn every_section_is_optional() {
        assert_eq!("".parse::<Config>().unwrap(), Config::default());

        let config: Config = "[mapping]\ncreate_views = false\n".parse().unwrap();
        assert_eq!(config.mapping.create_views, Some(false));
        assert_eq!(config.database, DatabaseConfig::default());
    }

    #[test]
    fn full_config() {
        let config: Config = r#"
            [database]
            path = "zoo.db"
            busy_timeout_ms = 2500

            [mapping]
            max_inline_struct_depth = 2
            create_views = true
            index_foreign_keys = false
        "#
        .parse()
        .unwrap();

        assert_eq!(config.database.path, Some(PathBuf::from("zoo.db")));
        assert_eq!(config.database.busy_timeout_ms, Some(2500));
        assert_eq!(config.mapping.max_inline_struct_depth, Some(2));
        assert_eq!(config.mapping.index_foreign_keys, Some(false));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!("[database]\nfile = \"zoo.db\"\n".parse::<Config>().is_err());
    }

    #[test]
    fn a_missing_file_uses_the_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(dir.path().join("ecmap.toml")).unwrap();
        assert_eq!(config, Config::new());
    }
}
