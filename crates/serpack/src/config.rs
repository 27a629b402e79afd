//! On-disk configuration for serpack.
//!
//! Resolution state is explicit: the search roots the resolver uses come
//! from this value (plus the entry file's directory), never from ambient
//! interpreter state.

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Extra directories searched for absolute imports, in order, after the
    /// entry file's own directory.
    pub src: Vec<PathBuf>,

    /// Python minor version used to classify retained imports as standard
    /// library for diagnostics (12 means 3.12).
    pub python_minor: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            src: Vec::new(),
            python_minor: 12,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_no_roots() {
        let config = Config::default();
        assert!(config.src.is_empty());
        assert_eq!(config.python_minor, 12);
    }

    #[test]
    fn parses_toml_config() {
        let config: Config = toml::from_str(
            r#"
src = ["lib", "vendor/pylib"]
python_minor = 11
"#,
        )
        .expect("config should parse");
        assert_eq!(config.src.len(), 2);
        assert_eq!(config.src[0], PathBuf::from("lib"));
        assert_eq!(config.python_minor, 11);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: Config = toml::from_str("src = [\"lib\"]").expect("config should parse");
        assert_eq!(config.python_minor, 12);
    }
}
