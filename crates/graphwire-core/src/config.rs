use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default number of levels a metadata snapshot descends into nested objects.
pub const DEFAULT_METADATA_DEPTH: usize = 1;

/// Runtime configuration for graphwire.
///
/// Every field has a default, so a config file only needs the keys it
/// changes:
///
/// ```json
/// { "metadataDepth": 2, "jsonLogs": true }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Levels of nested nodes included in a metadata snapshot.
    pub metadata_depth: usize,

    /// Whether to emit JSON logs.
    pub json_logs: bool,

    /// Verbosity level (0 = INFO, 1 = DEBUG, 2+ = TRACE).
    pub verbosity: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            metadata_depth: DEFAULT_METADATA_DEPTH,
            json_logs: false,
            verbosity: 0,
        }
    }
}

impl Config {
    /// Load a config file. Keys that are absent keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Set metadata snapshot depth.
    #[must_use]
    pub fn with_metadata_depth(mut self, depth: usize) -> Self {
        self.metadata_depth = depth;
        self
    }

    /// Set verbosity level.
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set JSON log output.
    #[must_use]
    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.json_logs = json;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.metadata_depth, 1);
        assert!(!config.json_logs);
        assert_eq!(config.verbosity, 0);
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"metadataDepth": 3}}"#).unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.metadata_depth, 3);
        assert!(!config.json_logs);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }

    #[test]
    fn test_load_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "metadataDepth = 3").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    #[test]
    fn test_builder_setters() {
        let config = Config::default()
            .with_metadata_depth(0)
            .with_verbosity(2)
            .with_json_logs(true);
        assert_eq!(config.metadata_depth, 0);
        assert_eq!(config.verbosity, 2);
        assert!(config.json_logs);
    }
}
