//! Shared file format types

use std::path::Path;

/// Supported file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Psd,
}

impl FileFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "psd" => Some(FileFormat::Psd),
            _ => None,
        }
    }

    /// Get default file extension
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Psd => "psd",
        }
    }
}

/// Codec errors (malformed binary payload or failed file access)
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid file signature: {0:?}")]
    InvalidSignature([u8; 4]),

    #[error("Unsupported PSD version: {0}")]
    UnsupportedVersion(u16),

    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    #[error("Unexpected end of data in {0}")]
    UnexpectedEof(&'static str),
}

impl From<CodecError> for String {
    fn from(e: CodecError) -> Self {
        e.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            FileFormat::from_path(Path::new("a/b/Scene.PSD")),
            Some(FileFormat::Psd)
        );
        assert_eq!(FileFormat::from_path(Path::new("scene.psb")), None);
        assert_eq!(FileFormat::from_path(Path::new("psd")), None);
    }
}
