//! Splitter settings
//!
//! Settings come from defaults, an optional JSON file and command-line flags,
//! in that order of precedence (later wins).

use std::path::Path;

use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::split::SplitOptions;

pub const DEFAULT_OUTDIR_PREFIX: &str = "out-";
pub const DEFAULT_NON_UNICODE_ENCODING: &str = "shift_jis";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitterConfig {
    #[serde(flatten)]
    pub split: SplitOptions,
    /// Search directories for PSD files
    pub recurse: bool,
    /// Output directory is `{outdir_prefix}{source file name}`
    pub outdir_prefix: String,
    /// Encoding of layer names stored without a Unicode copy
    pub non_unicode_encoding: String,
    /// Process input files on a thread pool
    pub parallel: bool,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            split: SplitOptions::default(),
            recurse: false,
            outdir_prefix: DEFAULT_OUTDIR_PREFIX.to_string(),
            non_unicode_encoding: DEFAULT_NON_UNICODE_ENCODING.to_string(),
            parallel: false,
        }
    }
}

impl SplitterConfig {
    /// Load settings from a JSON file; missing keys keep their defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn encoding(&self) -> Result<&'static Encoding, ConfigError> {
        resolve_encoding(&self.non_unicode_encoding)
    }
}

/// Look up a text encoding by its WHATWG label (`shift_jis`, `utf-8`, ...)
pub fn resolve_encoding(name: &str) -> Result<&'static Encoding, ConfigError> {
    Encoding::for_label(name.trim().as_bytes())
        .ok_or_else(|| ConfigError::UnknownEncoding(name.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::split::VisibleTarget;

    #[test]
    fn test_defaults() {
        let config = SplitterConfig::default();
        assert_eq!(config.outdir_prefix, "out-");
        assert_eq!(config.split.marker_prefix, "@");
        assert_eq!(config.encoding().unwrap(), encoding_rs::SHIFT_JIS);
    }

    #[test]
    fn test_resolve_encoding() {
        assert_eq!(resolve_encoding("UTF-8").unwrap(), encoding_rs::UTF_8);
        assert_eq!(resolve_encoding("sjis").unwrap(), encoding_rs::SHIFT_JIS);
        assert!(matches!(
            resolve_encoding("klingon"),
            Err(ConfigError::UnknownEncoding(name)) if name == "klingon"
        ));
    }

    #[test]
    fn test_load_partial_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("splitter.json");
        std::fs::write(
            &path,
            r#"{ "expand_marker_groups": true, "visible_target": "first", "outdir_prefix": "split-" }"#,
        )
        .unwrap();

        let config = SplitterConfig::load(&path).unwrap();
        assert!(config.split.expand_marker_groups);
        assert_eq!(config.split.visible_target, VisibleTarget::First);
        assert_eq!(config.outdir_prefix, "split-");
        assert_eq!(config.non_unicode_encoding, "shift_jis");
    }

    #[test]
    fn test_load_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.json");
        assert!(matches!(
            SplitterConfig::load(&missing),
            Err(ConfigError::Read { .. })
        ));

        let bad = tmp.path().join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(
            SplitterConfig::load(&bad),
            Err(ConfigError::Parse { .. })
        ));
    }
}
