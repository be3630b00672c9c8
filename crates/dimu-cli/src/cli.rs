use clap::Parser;
use dimu::AnalysisConfig;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Extract a dimuon invariant mass histogram from Monte Carlo event data.",
    help_template = HELP_TEMPLATE,
)]
pub struct Cli {
    /// Path to the input dataset (.root or .parquet)
    #[arg(value_name = "PATH")]
    pub input: String,

    /// Path for the rendered histogram image
    #[arg(short, long, default_value = "mass.png", value_name = "PATH")]
    pub output: String,

    /// Also write the histogram data to this path (.root or .json)
    #[arg(long, value_name = "PATH")]
    pub save_data: Option<String>,

    /// Number of histogram bins
    #[arg(long, default_value_t = 100, value_name = "INT")]
    pub bins: usize,

    /// Lower edge of the mass range in GeV
    #[arg(long, default_value_t = 0.0, value_name = "FLOAT")]
    pub mass_min: f64,

    /// Upper edge of the mass range in GeV
    #[arg(long, default_value_t = 120.0, value_name = "FLOAT")]
    pub mass_max: f64,

    /// Process at most this many events from the front of the dataset
    #[arg(short = 'n', long, value_name = "INT")]
    pub max_events: Option<usize>,

    /// Draw the y-axis with a logarithmic scale
    #[arg(long)]
    pub log_scale: bool,

    /// Name of the TTree to read
    #[arg(long, default_value = "events", value_name = "NAME")]
    pub tree: String,

    /// Name of the particle collection whose branches are read
    #[arg(long, default_value = "MCParticles", value_name = "NAME")]
    pub collection: String,

    /// Plot title
    #[arg(long, default_value = "Invariant Mass", value_name = "TEXT")]
    pub title: String,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn to_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            input_path: self.input.clone(),
            output_image_path: self.output.clone(),
            output_data_path: self.save_data.clone(),
            bin_count: self.bins,
            mass_min: self.mass_min,
            mass_max: self.mass_max,
            max_events: self.max_events,
            log_scale: self.log_scale,
            tree: Some(self.tree.clone()),
            collection: self.collection.clone(),
            title: self.title.clone(),
            ..AnalysisConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["dimu", "events.root"]).unwrap();
        assert_eq!(cli.input, "events.root");
        let config = cli.to_config();
        assert_eq!(config.bin_count, 100);
        assert_eq!(config.mass_min, 0.0);
        assert_eq!(config.mass_max, 120.0);
        assert_eq!(config.output_image_path, "mass.png");
        assert_eq!(config.output_data_path, None);
        assert_eq!(config.tree.as_deref(), Some("events"));
        assert_eq!(config.collection, "MCParticles");
        assert!(!config.log_scale);
    }

    #[test]
    fn test_parse_overrides() {
        let cli = Cli::try_parse_from([
            "dimu",
            "events.parquet",
            "-o",
            "out.png",
            "--save-data",
            "histogram.root",
            "--bins",
            "50",
            "--mass-max",
            "200",
            "-n",
            "1000",
            "--log-scale",
        ])
        .unwrap();
        let config = cli.to_config();
        assert_eq!(config.output_image_path, "out.png");
        assert_eq!(config.output_data_path.as_deref(), Some("histogram.root"));
        assert_eq!(config.bin_count, 50);
        assert_eq!(config.mass_max, 200.0);
        assert_eq!(config.max_events, Some(1000));
        assert!(config.log_scale);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["dimu", "events.root", "-q", "-v"]).is_err());
    }
}
