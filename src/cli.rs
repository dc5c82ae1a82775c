//! Command-line interface

use std::path::PathBuf;

use clap::Parser;

use crate::config::SplitterConfig;
use crate::errors::ConfigError;
use crate::split::{EmptyUnitPolicy, VisibleTarget};

/// Split a layered PSD into one PSD per top-level layer or group
#[derive(Parser, Debug)]
#[command(name = "psd-splitter")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// PSD files or directories to split
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Search directories recursively for PSD files
    #[arg(short, long)]
    pub recurse: bool,

    /// Emit each child of a marker-prefixed top-level group as its own file
    #[arg(short = 'o', long)]
    pub expand_marker_groups: bool,

    /// Force the group record of every output visible
    #[arg(short = 's', long = "show", visible_short_alias = 'e')]
    pub force_visible: bool,

    /// Name prefix that marks expandable groups
    #[arg(long)]
    pub marker_prefix: Option<String>,

    /// Record made visible by --show
    #[arg(long, value_enum)]
    pub visible_target: Option<VisibleTarget>,

    /// Also write units that contain only group markers
    #[arg(long)]
    pub emit_empty: bool,

    /// Output directory is `{prefix}{file name}` next to each input
    #[arg(long)]
    pub outdir_prefix: Option<String>,

    /// Encoding of layer names without a Unicode copy (WHATWG label)
    #[arg(long)]
    pub non_unicode_encoding: Option<String>,

    /// JSON settings file; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Split input files in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Print a JSON report of written files to stdout
    #[arg(long)]
    pub json: bool,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Settings from the config file (or defaults) with flags applied on top
    pub fn settings(&self) -> Result<SplitterConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => SplitterConfig::load(path)?,
            None => SplitterConfig::default(),
        };
        self.apply(&mut config);
        config.encoding()?;
        Ok(config)
    }

    /// Boolean flags only switch options on; unset values keep the file's
    fn apply(&self, config: &mut SplitterConfig) {
        config.recurse |= self.recurse;
        config.parallel |= self.parallel;
        config.split.expand_marker_groups |= self.expand_marker_groups;
        config.split.force_visible_root |= self.force_visible;
        if self.emit_empty {
            config.split.empty_units = EmptyUnitPolicy::Emit;
        }
        if let Some(prefix) = &self.marker_prefix {
            config.split.marker_prefix = prefix.clone();
        }
        if let Some(target) = self.visible_target {
            config.split.visible_target = target;
        }
        if let Some(prefix) = &self.outdir_prefix {
            config.outdir_prefix = prefix.clone();
        }
        if let Some(name) = &self.non_unicode_encoding {
            config.non_unicode_encoding = name.clone();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::try_parse_from(["psd-splitter", "-r", "-o", "-e", "a.psd", "b.psd"]).unwrap();
        assert!(cli.recurse);
        assert!(cli.expand_marker_groups);
        assert!(cli.force_visible);
        assert_eq!(cli.paths.len(), 2);

        let config = cli.settings().unwrap();
        assert!(config.recurse);
        assert!(config.split.expand_marker_groups);
        assert!(config.split.force_visible_root);
        assert_eq!(config.split.empty_units, EmptyUnitPolicy::Suppress);
    }

    #[test]
    fn test_paths_are_required() {
        assert!(Cli::try_parse_from(["psd-splitter"]).is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("splitter.json");
        std::fs::write(
            &path,
            r##"{ "marker_prefix": "#", "outdir_prefix": "split-", "recurse": true }"##,
        )
        .unwrap();

        let args: Vec<std::ffi::OsString> = vec![
            "psd-splitter".into(),
            "--config".into(),
            path.into_os_string(),
            "--marker-prefix".into(),
            "!".into(),
            "--visible-target".into(),
            "first".into(),
            "--emit-empty".into(),
            "scene.psd".into(),
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        let config = cli.settings().unwrap();
        assert_eq!(config.split.marker_prefix, "!");
        assert_eq!(config.split.visible_target, VisibleTarget::First);
        assert_eq!(config.split.empty_units, EmptyUnitPolicy::Emit);
        assert_eq!(config.outdir_prefix, "split-");
        assert!(config.recurse);
    }

    #[test]
    fn test_unknown_encoding_flag() {
        let cli = Cli::try_parse_from([
            "psd-splitter",
            "--non-unicode-encoding",
            "klingon",
            "a.psd",
        ])
        .unwrap();
        assert!(matches!(
            cli.settings(),
            Err(ConfigError::UnknownEncoding(_))
        ));
    }
}
