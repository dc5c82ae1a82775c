use std::process::ExitCode;

use clap::Parser;

use psd_splitter::cli::Cli;
use psd_splitter::inputs::collect_inputs;
use psd_splitter::{init_logging, SplitReport, Splitter};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let splitter = match cli.settings().and_then(Splitter::new) {
        Ok(splitter) => splitter,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::from(2);
        }
    };

    let config = splitter.config();
    let inputs = collect_inputs(&cli.paths, config.recurse, &config.outdir_prefix);
    if inputs.is_empty() {
        tracing::warn!("No PSD files to split");
        return ExitCode::SUCCESS;
    }

    let results = splitter.run(&inputs);
    let failed = results.iter().filter(|(_, r)| r.is_err()).count();
    tracing::info!(
        "Done: {} of {} files split",
        results.len() - failed,
        results.len()
    );

    if cli.json {
        let reports: Vec<&SplitReport> = results.iter().filter_map(|(_, r)| r.as_ref().ok()).collect();
        match serde_json::to_string_pretty(&reports) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                tracing::error!("Cannot serialize report: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    if failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
