//! psd-splitter - Split layered PSD documents into one file per top-level group
//!
//! This is the library crate behind the `psd-splitter` command.

pub mod cli;
pub mod config;
pub mod errors;
pub mod file;
pub mod inputs;
pub mod pipeline;
pub mod split;

pub use config::SplitterConfig;
pub use errors::{ConfigError, SplitError};
pub use pipeline::{SplitReport, Splitter, UnitReport};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging to stderr
///
/// `RUST_LOG` takes precedence over the default filter.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "psd_splitter=debug"
    } else {
        "psd_splitter=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
