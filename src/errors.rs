use std::path::PathBuf;

use thiserror::Error;

use crate::file::CodecError;
use crate::split::{AssembleError, StructureError};

/// Failure while splitting one input document
///
/// Each variant names the file it concerns; processing of other inputs
/// continues.
#[derive(Debug, Error)]
pub enum SplitError {
    #[error("{path:?}: cannot load: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    #[error("{path:?}: broken layer groups: {source}")]
    Structure {
        path: PathBuf,
        #[source]
        source: StructureError,
    },

    #[error("{path:?}: cannot create output directory: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path:?}: cannot build unit '{unit}': {source}")]
    Assemble {
        path: PathBuf,
        unit: String,
        #[source]
        source: AssembleError,
    },

    #[error("{path:?}: cannot save: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: CodecError,
    },
}

/// Invalid settings, reported before any file is touched
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown text encoding: {0}")]
    UnknownEncoding(String),

    #[error("Cannot read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl From<SplitError> for String {
    fn from(e: SplitError) -> Self {
        e.to_string()
    }
}
