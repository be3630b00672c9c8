use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::data::io::{
    open_dataset, write_histogram_json, write_histogram_root, DatasetReadOptions,
};
use crate::data::Dataset;
use crate::kinematics::leading_pair_mass;
use crate::plot::{render_histogram, PlotOptions};
use crate::utils::Histogram;
use crate::{DimuError, DimuResult};

/// The name of the TTree written when a histogram is exported to a ROOT file
pub const HISTOGRAM_TREE_NAME: &str = "h_mass";

/// The full configuration of an analysis run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Path of the input dataset (ROOT or Parquet)
    pub input_path: String,
    /// Path of the rendered histogram image
    pub output_image_path: String,
    /// Optional path for the serialized histogram (`.root` or JSON)
    pub output_data_path: Option<String>,
    /// Number of histogram bins
    pub bin_count: usize,
    /// Lower edge of the mass range (GeV)
    pub mass_min: f64,
    /// Upper edge of the mass range (GeV)
    pub mass_max: f64,
    /// Process at most this many events from the front of the dataset
    pub max_events: Option<usize>,
    /// Draw the y-axis with a logarithmic scale
    pub log_scale: bool,
    /// The name of the TTree to read, or `None` to use the only TTree in the file
    pub tree: Option<String>,
    /// The name of the particle collection whose branches hold the per-event records
    pub collection: String,
    /// The plot caption
    pub title: String,
    /// The x-axis label
    pub x_label: String,
    /// The y-axis label
    pub y_label: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input_path: String::new(),
            output_image_path: "mass.png".to_string(),
            output_data_path: None,
            bin_count: 100,
            mass_min: 0.0,
            mass_max: 120.0,
            max_events: None,
            log_scale: false,
            tree: Some("events".to_string()),
            collection: "MCParticles".to_string(),
            title: "Invariant Mass".to_string(),
            x_label: "Invariant Mass [GeV]".to_string(),
            y_label: "Number of particles".to_string(),
        }
    }
}

impl AnalysisConfig {
    /// Create a configuration for the given input path with default settings
    pub fn new<S: Into<String>>(input_path: S) -> Self {
        Self {
            input_path: input_path.into(),
            ..Default::default()
        }
    }

    /// Set the path of the rendered histogram image
    pub fn with_output_image<S: Into<String>>(mut self, path: S) -> Self {
        self.output_image_path = path.into();
        self
    }

    /// Set the path for the serialized histogram
    pub fn with_output_data<S: Into<String>>(mut self, path: S) -> Self {
        self.output_data_path = Some(path.into());
        self
    }

    /// Set the histogram binning
    pub fn with_binning(mut self, bins: usize, mass_min: f64, mass_max: f64) -> Self {
        self.bin_count = bins;
        self.mass_min = mass_min;
        self.mass_max = mass_max;
        self
    }

    /// Process at most `max_events` events from the front of the dataset
    pub fn with_max_events(mut self, max_events: usize) -> Self {
        self.max_events = Some(max_events);
        self
    }

    /// Draw the y-axis with a logarithmic scale
    pub fn with_log_scale(mut self, log_scale: bool) -> Self {
        self.log_scale = log_scale;
        self
    }

    /// Check that the configuration is consistent
    pub fn validate(&self) -> DimuResult<()> {
        if self.input_path.is_empty() {
            return Err(DimuError::InvalidConfig("No input path given".to_string()));
        }
        if self.bin_count == 0 {
            return Err(DimuError::InvalidConfig(
                "Number of bins must be greater than zero!".to_string(),
            ));
        }
        if self.mass_max <= self.mass_min {
            return Err(DimuError::InvalidConfig(
                "The lower edge of the mass range must be smaller than the upper edge!".to_string(),
            ));
        }
        Ok(())
    }

    /// The dataset read options implied by this configuration
    pub fn read_options(&self) -> DatasetReadOptions {
        DatasetReadOptions {
            tree: self.tree.clone(),
            collection: self.collection.clone(),
        }
    }

    /// The plot options implied by this configuration
    pub fn plot_options(&self) -> PlotOptions {
        PlotOptions {
            title: self.title.clone(),
            x_label: self.x_label.clone(),
            y_label: self.y_label.clone(),
            log_scale: self.log_scale,
            ..Default::default()
        }
    }
}

/// The result of an analysis run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    /// The number of events processed
    pub events_processed: usize,
    /// The number of events in which a muon/anti-muon pair was found
    pub pairs_found: usize,
    /// The unweighted mean of the pair masses, if any pair was found
    pub mean_mass: Option<f64>,
    /// The filled invariant mass histogram
    pub histogram: Histogram,
}

/// Fill an invariant mass histogram from a dataset according to the given configuration.
pub fn accumulate(config: &AnalysisConfig, dataset: &Dataset) -> DimuResult<RunSummary> {
    config.validate()?;
    let n_events = config
        .max_events
        .map_or(dataset.n_events(), |cap| cap.min(dataset.n_events()));
    let events = &dataset.events[..n_events];
    let prototype = Histogram::new(config.bin_count, (config.mass_min, config.mass_max))?;

    #[cfg(feature = "rayon")]
    let (histogram, pairs_found, mass_sum) = {
        use rayon::prelude::*;
        let shards: Vec<(Histogram, usize, f64)> = events
            .par_iter()
            .fold(
                || (prototype.clone(), 0usize, 0.0),
                |(mut histogram, mut pairs, mut mass_sum), event| {
                    if let Some(mass) = leading_pair_mass(&event.particles) {
                        histogram.fill_weighted(mass, event.weight);
                        pairs += 1;
                        mass_sum += mass;
                    }
                    (histogram, pairs, mass_sum)
                },
            )
            .collect();
        let mut histogram = prototype;
        let mut pairs_found = 0usize;
        let mut mass_sum = 0.0;
        for (shard, shard_pairs, shard_sum) in shards {
            histogram.merge(&shard)?;
            pairs_found += shard_pairs;
            mass_sum += shard_sum;
        }
        (histogram, pairs_found, mass_sum)
    };

    #[cfg(not(feature = "rayon"))]
    let (histogram, pairs_found, mass_sum) = {
        let mut histogram = prototype;
        let mut pairs_found = 0usize;
        let mut mass_sum = 0.0;
        for event in events {
            if let Some(mass) = leading_pair_mass(&event.particles) {
                histogram.fill_weighted(mass, event.weight);
                pairs_found += 1;
                mass_sum += mass;
            }
        }
        (histogram, pairs_found, mass_sum)
    };

    debug!(
        events = n_events,
        pairs = pairs_found,
        "Accumulated invariant mass histogram"
    );
    let dropped = histogram.underflow + histogram.overflow;
    if dropped > 0.0 {
        warn!(dropped, "Pair masses fell outside the histogram range");
    }

    Ok(RunSummary {
        events_processed: n_events,
        pairs_found,
        mean_mass: (pairs_found > 0).then(|| mass_sum / pairs_found as f64),
        histogram,
    })
}

/// Run the full analysis: load the dataset, fill the histogram, render the image, and export the
/// histogram data if requested.
pub fn run(config: &AnalysisConfig) -> DimuResult<RunSummary> {
    config.validate()?;
    info!(path = %config.input_path, "Opening dataset");
    let dataset = open_dataset(&config.input_path, &config.read_options())?;
    info!(events = dataset.n_events(), "Loaded dataset");
    let summary = accumulate(config, &dataset)?;
    render_histogram(
        &summary.histogram,
        &config.output_image_path,
        &config.plot_options(),
    )?;
    info!(path = %config.output_image_path, "Wrote histogram image");
    if let Some(data_path) = &config.output_data_path {
        export_histogram(&summary.histogram, data_path)?;
        info!(path = %data_path, "Wrote histogram data");
    }
    Ok(summary)
}

fn export_histogram(histogram: &Histogram, file_path: &str) -> DimuResult<()> {
    if file_path.to_ascii_lowercase().ends_with(".root") {
        write_histogram_root(histogram, file_path, HISTOGRAM_TREE_NAME)
    } else {
        write_histogram_json(histogram, file_path)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::data::io::write_parquet;
    use crate::data::{test_dataset, test_event, EventData, Particle};
    use crate::kinematics::MUON_PDG;
    use crate::utils::vectors::Vec3;

    fn config() -> AnalysisConfig {
        AnalysisConfig::new("unused.root")
    }

    #[test]
    fn test_accumulate_fills_one_bin() {
        let dataset = test_dataset();
        let summary = accumulate(&config(), &dataset).unwrap();
        assert_eq!(summary.events_processed, 1);
        assert_eq!(summary.pairs_found, 1);
        // the pair mass of ~6.004 lands in bin 5 of 100 bins over [0, 120]
        assert_relative_eq!(summary.histogram.counts[5], 0.48);
        assert_relative_eq!(summary.histogram.total(), 0.48);
    }

    #[test]
    fn test_accumulate_unit_weight() {
        let pair = EventData::new(vec![
            Particle::new(MUON_PDG, Vec3::new(3.0, 0.0, 0.0), 0.105),
            Particle::new(-MUON_PDG, Vec3::new(-3.0, 0.0, 0.0), 0.105),
        ]);
        let dataset = Dataset::from_events(vec![pair]);
        let summary = accumulate(&config(), &dataset).unwrap();
        assert_relative_eq!(summary.histogram.counts[5], 1.0);
        assert_relative_eq!(summary.histogram.total(), 1.0);
    }

    #[test]
    fn test_accumulate_mean_mass() {
        let dataset = test_dataset();
        let summary = accumulate(&config(), &dataset).unwrap();
        assert_relative_eq!(
            summary.mean_mass.unwrap(),
            2.0 * (9.0_f64 + 0.105 * 0.105).sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_accumulate_no_pairs() {
        let lone_muon = EventData::new(vec![Particle::new(
            MUON_PDG,
            Vec3::new(1.0, 0.0, 0.0),
            0.105,
        )]);
        let dataset = Dataset::from_events(vec![lone_muon]);
        let summary = accumulate(&config(), &dataset).unwrap();
        assert_eq!(summary.pairs_found, 0);
        assert_eq!(summary.mean_mass, None);
        assert_relative_eq!(summary.histogram.total(), 0.0);
    }

    #[test]
    fn test_max_events_cap() {
        let dataset = Dataset::from_events(vec![test_event(), test_event(), test_event()]);
        let capped = config().with_max_events(2);
        let summary = accumulate(&capped, &dataset).unwrap();
        assert_eq!(summary.events_processed, 2);
        assert_eq!(summary.pairs_found, 2);
    }

    #[test]
    fn test_validate() {
        assert!(AnalysisConfig::default().validate().is_err());
        assert!(config().with_binning(0, 0.0, 120.0).validate().is_err());
        assert!(config().with_binning(100, 120.0, 0.0).validate().is_err());
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_run_end_to_end() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("events.parquet");
        write_parquet(&test_dataset(), input.to_str().unwrap()).unwrap();
        let image = dir.path().join("mass.png");
        let data = dir.path().join("histogram.json");
        let run_config = AnalysisConfig::new(input.to_str().unwrap())
            .with_output_image(image.to_str().unwrap())
            .with_output_data(data.to_str().unwrap());
        let summary = run(&run_config).unwrap();
        assert_eq!(summary.pairs_found, 1);
        assert!(image.exists());
        assert!(data.exists());
    }
}
