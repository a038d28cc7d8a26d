//! Engine configuration.
//!
//! Read from `$PROMPTFRAME_CONFIG` when set, otherwise from
//! `<config dir>/promptframe/config.toml`. A missing file means defaults.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::compat::{Dimension, Selection};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "PROMPTFRAME_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Custom rule tables; the embedded defaults are used when unset
    pub rules_path: Option<PathBuf>,
    /// Fixed seed for reproducible sampling
    pub seed: Option<u64>,
    /// Fallback tracing filter when `RUST_LOG` is unset
    pub log_filter: Option<String>,
    /// Dimensions kept from `selection` when sampling
    pub locked: BTreeSet<Dimension>,
    /// Starting selection
    pub selection: Selection,
}

impl EngineConfig {
    /// Load from the default location, falling back to defaults when no
    /// file exists.
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            Some(path) => {
                debug!("No config at {:?}, using defaults", path);
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: EngineConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }
}

/// Where the config file is expected.
pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("promptframe").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let toml_content = r#"
seed = 42
log_filter = "promptframe=debug"
locked = ["director", "camera"]

[selection]
director = "Wes Anderson"
camera = "Leica M6"
custom_lens = "Petzval prototype"
"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let config = EngineConfig::load_from(file.path()).unwrap();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.log_filter.as_deref(), Some("promptframe=debug"));
        assert!(config.locked.contains(&Dimension::Director));
        assert!(config.locked.contains(&Dimension::Camera));
        assert_eq!(config.selection.get(Dimension::Director), Some("Wes Anderson"));
        assert_eq!(config.selection.custom(Dimension::Lens), Some("Petzval prototype"));
        assert!(config.rules_path.is_none());
    }

    #[test]
    fn test_empty_file_is_default() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = EngineConfig::load_from(file.path()).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_unknown_dimension_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"locked = [\"soundtrack\"]\n").unwrap();
        let err = EngineConfig::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(EngineConfig::load_from(&dir.path().join("nope.toml")).is_err());
    }
}
