//! `dimu` is a library for extracting dimuon invariant mass spectra from Monte Carlo particle
//! physics data. It reads event records from ROOT or Parquet files, selects the most energetic
//! muon/anti-muon pair in each event, and fills a histogram of the pair's invariant mass which can
//! be rendered to a raster image or exported for further processing.
//!
//! # Key Features
//! * Reads datasets from ROOT TTrees (via [`oxyroot`](https://github.com/m-dupont/oxyroot)) and
//!   Parquet files.
//! * Selects the leading muon/anti-muon pair by energy and computes its invariant mass.
//! * Renders histograms to PNG with linear or logarithmic y-axes using
//!   [`plotters`](https://github.com/plotters-rs/plotters).
//! * Exports histograms to ROOT or JSON files.
//! * Efficient parallelism using [`rayon`](https://github.com/rayon-rs/rayon).
//!
//! # Quick Start
//! ```rust,no_run
//! use dimu::{run, AnalysisConfig, DimuResult};
//!
//! fn main() -> DimuResult<()> {
//!     let config = AnalysisConfig::new("events.root")
//!         .with_output_image("mass.png")
//!         .with_log_scale(true);
//!     let summary = run(&config)?;
//!     println!(
//!         "{} of {} events contained a muon pair",
//!         summary.pairs_found, summary.events_processed
//!     );
//!     Ok(())
//! }
//! ```
//!
//! # Data Format
//! ROOT inputs are expected to contain a TTree (named `events` by default) holding a particle
//! collection (named `MCParticles` by default) with jagged branches `<collection>.PDG`,
//! `<collection>.momentum.x`, `<collection>.momentum.y`, `<collection>.momentum.z`, and
//! `<collection>.mass`. Parquet inputs use list columns `pdg`, `px`, `py`, `pz`, and `mass` with
//! one row per event. Either format may carry an optional per-event scalar `weight` column.
#![warn(clippy::perf, clippy::style)]

/// Event and particle data structures along with dataset I/O.
pub mod data {
    pub use dimu_core::data::io::{
        open_dataset, read_parquet, read_root, write_histogram_json, write_histogram_root,
        write_parquet, DatasetReadOptions,
    };
    pub use dimu_core::data::{test_dataset, test_event, Dataset, EventData, Particle};
}

/// Selection of the leading muon/anti-muon pair and its invariant mass.
pub mod kinematics {
    pub use dimu_core::kinematics::{leading_pair_mass, ANTIMUON_PDG, MUON_PDG};
}

/// The linear analysis pipeline and its configuration.
pub mod pipeline {
    pub use dimu_core::pipeline::{
        accumulate, run, AnalysisConfig, RunSummary, HISTOGRAM_TREE_NAME,
    };
}

/// Histogram rendering to raster images.
pub mod plot {
    pub use dimu_core::plot::{render_histogram, PlotOptions};
}

/// Histograms, binning helpers, and kinematic vectors.
pub mod utils {
    pub use dimu_core::utils::*;
}

pub use dimu_core::data::io::{open_dataset, DatasetReadOptions};
pub use dimu_core::data::{Dataset, EventData, Particle};
pub use dimu_core::kinematics::{leading_pair_mass, ANTIMUON_PDG, MUON_PDG};
pub use dimu_core::pipeline::{accumulate, run, AnalysisConfig, RunSummary};
pub use dimu_core::plot::{render_histogram, PlotOptions};
pub use dimu_core::utils::vectors::{Vec3, Vec4};
pub use dimu_core::utils::Histogram;
pub use dimu_core::{DimuError, DimuResult};
