//! Input file discovery

use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use walkdir::WalkDir;

use crate::file::FileFormat;

/// Resolve command-line paths to a de-duplicated list of PSD files
///
/// Existing `.psd` files are taken as given. With `recurse`, directories are
/// searched as well, skipping anything inside a previous output directory
/// (a parent directory whose name starts with `outdir_prefix`). Paths are
/// canonicalized and kept in first-seen order.
pub fn collect_inputs(paths: &[PathBuf], recurse: bool, outdir_prefix: &str) -> Vec<PathBuf> {
    let mut found: IndexSet<PathBuf> = IndexSet::new();

    for path in paths {
        if path.is_file() {
            if is_psd(path) {
                insert_canonical(&mut found, path);
            } else {
                tracing::debug!("Ignoring non-PSD file {:?}", path);
            }
        } else if path.is_dir() {
            if !recurse {
                tracing::debug!("Ignoring directory {:?} (recursion disabled)", path);
                continue;
            }
            for entry in WalkDir::new(path).into_iter().filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Cannot read directory entry: {}", e);
                    None
                }
            }) {
                if entry.file_type().is_file()
                    && is_psd(entry.path())
                    && !in_output_dir(entry.path(), outdir_prefix)
                {
                    insert_canonical(&mut found, entry.path());
                }
            }
        } else {
            tracing::warn!("No such file or directory: {:?}", path);
        }
    }

    found.into_iter().collect()
}

fn is_psd(path: &Path) -> bool {
    FileFormat::from_path(path) == Some(FileFormat::Psd)
}

fn in_output_dir(path: &Path, outdir_prefix: &str) -> bool {
    !outdir_prefix.is_empty()
        && path
            .parent()
            .and_then(Path::file_name)
            .is_some_and(|name| name.to_string_lossy().starts_with(outdir_prefix))
}

fn insert_canonical(found: &mut IndexSet<PathBuf>, path: &Path) {
    match std::fs::canonicalize(path) {
        Ok(full) => {
            found.insert(full);
        }
        Err(e) => tracing::warn!("Cannot resolve {:?}: {}", path, e),
    }
}
