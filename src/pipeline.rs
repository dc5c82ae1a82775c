//! Per-file split pipeline
//!
//! load -> build tree -> split -> create output dir -> assemble + save each unit

use std::path::{Path, PathBuf};
use std::time::Instant;

use encoding_rs::Encoding;
use rayon::prelude::*;
use serde::Serialize;

use crate::config::SplitterConfig;
use crate::errors::{ConfigError, SplitError};
use crate::file::psd::{load_psd, save_psd};
use crate::split::naming::{ensure_output_dir, output_dir, output_file_name, OutputNames};
use crate::split::{assemble, split_tree, LayerTree};

/// Result of splitting one source document
#[derive(Debug, Clone, Serialize)]
pub struct SplitReport {
    pub source: PathBuf,
    pub output_dir: PathBuf,
    pub units: Vec<UnitReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitReport {
    pub name: String,
    pub file: PathBuf,
    /// Records written, group markers included
    pub layer_count: usize,
}

/// Splits documents with a fixed configuration
pub struct Splitter {
    config: SplitterConfig,
    encoding: &'static Encoding,
}

impl Splitter {
    pub fn new(config: SplitterConfig) -> Result<Self, ConfigError> {
        let encoding = config.encoding()?;
        Ok(Self { config, encoding })
    }

    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    /// Split one document into `{prefix}{file name}/` next to it
    ///
    /// The output directory is only created once the layer structure has been
    /// validated, so a malformed document leaves nothing behind.
    pub fn split_file(&self, path: &Path) -> Result<SplitReport, SplitError> {
        let start = Instant::now();
        tracing::info!("Splitting {:?}", path);

        let doc = load_psd(path, self.encoding).map_err(|source| SplitError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(
            "Loaded {}x{} depth {} with {} layer records",
            doc.canvas.width,
            doc.canvas.height,
            doc.canvas.depth,
            doc.layers.len()
        );

        let tree = LayerTree::build(&doc.layers).map_err(|source| SplitError::Structure {
            path: path.to_path_buf(),
            source,
        })?;
        let units = split_tree(&tree, &self.config.split);

        let dir = output_dir(path, &self.config.outdir_prefix);
        ensure_output_dir(&dir).map_err(|source| SplitError::OutputDir {
            path: dir.clone(),
            source,
        })?;

        let mut names = OutputNames::new();
        let mut reports = Vec::with_capacity(units.len());
        for unit in units {
            let out = assemble(&doc.canvas, &unit.layers).map_err(|source| {
                SplitError::Assemble {
                    path: path.to_path_buf(),
                    unit: unit.name.clone(),
                    source,
                }
            })?;

            let file = dir.join(names.claim(output_file_name(path, &unit.name)));
            save_psd(&file, &out).map_err(|source| SplitError::Save {
                path: file.clone(),
                source,
            })?;
            tracing::debug!(
                "Wrote {:?} ({} records, {} content layers)",
                file,
                unit.layers.len(),
                unit.normal_layers
            );

            reports.push(UnitReport {
                name: unit.name,
                file,
                layer_count: unit.layers.len(),
            });
        }

        tracing::info!(
            "Split {:?} into {} files in {:.1}ms",
            path,
            reports.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );

        Ok(SplitReport {
            source: path.to_path_buf(),
            output_dir: dir,
            units: reports,
        })
    }

    /// Split every input; a failing file is logged and does not stop the rest
    ///
    /// Results are returned in input order, also when running in parallel.
    pub fn run(&self, inputs: &[PathBuf]) -> Vec<(PathBuf, Result<SplitReport, SplitError>)> {
        let split_one = |path: &PathBuf| {
            let result = self.split_file(path);
            if let Err(e) = &result {
                tracing::error!("{}", e);
            }
            (path.clone(), result)
        };

        if self.config.parallel {
            inputs.par_iter().map(split_one).collect()
        } else {
            inputs.iter().map(split_one).collect()
        }
    }
}
