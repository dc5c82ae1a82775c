//! Unit names and output paths

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use crate::file::FileFormat;

/// Characters Windows rejects in file names; used on every platform so the
/// output names do not depend on where the tool runs.
const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// `{index:03}-{path joined by '-'}`
pub fn unit_name(index: usize, path: &[&str]) -> String {
    format!("{:03}-{}", index, path.join("-"))
}

/// Replace characters that cannot appear in a file name with `_`
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_control() || ILLEGAL_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// File name for one unit: `{source stem}-{unit name}.psd`, sanitized
pub fn output_file_name(source: &Path, unit_name: &str) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    format!(
        "{}.{}",
        sanitize_file_name(&format!("{}-{}", stem, unit_name)),
        FileFormat::Psd.extension()
    )
}

/// File names already handed out within one output directory
///
/// Expanded children may repeat a name, and sanitizing can map different
/// names to the same string. Later claims of a taken name get `-2`, `-3`, ...
/// before the extension, in unit order. Names are compared case-insensitively
/// so the result is the same on case-insensitive file systems.
#[derive(Debug, Default)]
pub struct OutputNames {
    taken: HashSet<String>,
}

impl OutputNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `file_name`, or the first free suffixed variant of it
    pub fn claim(&mut self, file_name: String) -> String {
        if self.taken.insert(file_name.to_lowercase()) {
            return file_name;
        }

        let (stem, ext) = match file_name.rsplit_once('.') {
            Some((stem, ext)) => (stem, format!(".{}", ext)),
            None => (file_name.as_str(), String::new()),
        };
        let mut n = 2usize;
        loop {
            let candidate = format!("{}-{}{}", stem, n, ext);
            if self.taken.insert(candidate.to_lowercase()) {
                tracing::warn!("Output name {} already used, writing {}", file_name, candidate);
                return candidate;
            }
            n += 1;
        }
    }
}

/// `{prefix}{source file name}` next to the source file
pub fn output_dir(source: &Path, prefix: &str) -> PathBuf {
    let file_name = source
        .file_name()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    let dir_name = sanitize_file_name(&format!("{}{}", prefix, file_name));
    match source.parent() {
        Some(parent) => parent.join(dir_name),
        None => PathBuf::from(dir_name),
    }
}

/// Create the output directory if it does not exist yet
pub fn ensure_output_dir(dir: &Path) -> io::Result<()> {
    if !dir.is_dir() {
        tracing::debug!("Creating output directory {:?}", dir);
    }
    std::fs::create_dir_all(dir)
}
