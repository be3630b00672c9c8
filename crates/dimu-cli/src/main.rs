mod cli;
mod error;
mod logging;

use clap::Parser;
use tracing::{debug, info};

use crate::cli::Cli;
use crate::error::Result;

fn main() {
    if let Err(err) = run_app() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, &cli.log_file)?;
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let config = cli.to_config();
    let summary = dimu::run(&config)?;

    info!(
        events = summary.events_processed,
        pairs = summary.pairs_found,
        "Analysis complete"
    );
    match summary.mean_mass {
        Some(mean) => println!(
            "Processed {} events; {} muon pairs (mean mass {:.3} GeV) filled into {} bins ({}).",
            summary.events_processed,
            summary.pairs_found,
            mean,
            summary.histogram.bins(),
            config.output_image_path
        ),
        None => println!(
            "Processed {} events; no muon pairs found.",
            summary.events_processed
        ),
    }
    Ok(())
}
