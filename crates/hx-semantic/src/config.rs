//! Analysis settings, read from an `hxq.toml` file.
//!
//! ```toml
//! [analysis]
//! max_depth = 256
//! memoize = true
//! shared_cache = true
//! usage_search = true
//!
//! [project]
//! source_roots = ["src"]
//! prelude = true
//! ```
//!
//! Every key is optional; a missing file means all defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    pub analysis: AnalysisSection,
    pub project: ProjectSection,
}

/// The `[analysis]` table.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisSection {
    /// Hard limit on nested evaluation steps in one session.
    pub max_depth: usize,
    /// Memoize evaluated nodes within a session.
    pub memoize: bool,
    /// Keep resolved references across calls until the sources change.
    pub shared_cache: bool,
    /// Look at later uses of a variable whose initializer has no usable type.
    pub usage_search: bool,
}

impl Default for AnalysisSection {
    fn default() -> Self {
        Self {
            max_depth: 256,
            memoize: true,
            shared_cache: true,
            usage_search: true,
        }
    }
}

/// The `[project]` table.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProjectSection {
    pub source_roots: Vec<PathBuf>,
    /// Index the built-in standard types.
    pub prelude: bool,
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            source_roots: vec![PathBuf::from("src")],
            prelude: true,
        }
    }
}

impl AnalysisConfig {
    /// Read a configuration file. A file that does not exist yields the
    /// defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&content)
    }

    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        let config = AnalysisConfig::from_str("").unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.analysis.max_depth, 256);
        assert!(config.project.prelude);
        assert_eq!(config.project.source_roots, vec![PathBuf::from("src")]);
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let config = AnalysisConfig::from_str(
            r#"
[analysis]
max_depth = 32
usage_search = false

[project]
prelude = false
"#,
        )
        .unwrap();
        assert_eq!(config.analysis.max_depth, 32);
        assert!(!config.analysis.usage_search);
        assert!(config.analysis.memoize);
        assert!(config.analysis.shared_cache);
        assert!(!config.project.prelude);
        assert_eq!(config.project.source_roots, vec![PathBuf::from("src")]);
    }

    #[test]
    fn wrong_type_is_a_parse_error() {
        let err = AnalysisConfig::from_str("[analysis]\nmax_depth = \"deep\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_default() {
        let config = AnalysisConfig::load(Path::new("/nonexistent/hxq.toml")).unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }
}
