//! # dimu-core
//!
//! This is an internal crate used by `dimu`.
#![warn(clippy::perf, clippy::style)]

use thiserror::Error;

/// Event and particle data structures along with dataset I/O.
pub mod data;
/// Selection of the leading muon/anti-muon pair and its invariant mass.
pub mod kinematics;
/// The linear analysis pipeline and its configuration.
pub mod pipeline;
/// Histogram rendering to raster images.
pub mod plot;
/// Histograms, binning helpers, and kinematic vectors.
pub mod utils;

pub use crate::data::io::{open_dataset, read_parquet, read_root, DatasetReadOptions};
pub use crate::data::{test_dataset, test_event, Dataset, EventData, Particle};
pub use crate::kinematics::{leading_pair_mass, ANTIMUON_PDG, MUON_PDG};
pub use crate::pipeline::{accumulate, run, AnalysisConfig, RunSummary, HISTOGRAM_TREE_NAME};
pub use crate::plot::{render_histogram, PlotOptions};
pub use crate::utils::vectors::{Vec3, Vec4};
pub use crate::utils::{get_bin_edges, get_bin_index, Histogram};

/// The error type used by all `dimu` internal methods.
#[derive(Error, Debug)]
pub enum DimuError {
    /// An alias for [`std::io::Error`].
    #[error("IO Error: {0}")]
    IOError(#[from] std::io::Error),
    /// An alias for [`parquet::errors::ParquetError`].
    #[error("Parquet Error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),
    /// An alias for [`arrow::error::ArrowError`].
    #[error("Arrow Error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),
    /// An alias for [`shellexpand::LookupError`].
    #[error("Failed to expand path: {0}")]
    LookupError(#[from] shellexpand::LookupError<std::env::VarError>),
    /// An error which occurs when a requested branch is absent from a ROOT tree.
    #[error("No branch named \"{name}\" in tree \"{tree}\"!")]
    MissingBranch {
        /// Name of the branch which failed lookup
        name: String,
        /// Name of the tree that was searched
        tree: String,
    },
    /// An error which occurs when a requested column is absent from a dataset.
    #[error("No column named \"{name}\"!")]
    MissingColumn {
        /// Name of the column which failed lookup
        name: String,
    },
    /// An error which occurs when a column or branch holds an unsupported data type.
    #[error("Column \"{name}\" has unsupported type \"{datatype}\"!")]
    InvalidColumnType {
        /// Name of the offending column
        name: String,
        /// The type it was found to hold
        datatype: String,
    },
    /// An error which occurs when parallel structures disagree on their lengths.
    #[error("{context}: expected {expected} entries but found {actual}")]
    LengthMismatch {
        /// Description of the structure being checked
        context: String,
        /// The expected number of entries
        expected: usize,
        /// The number of entries actually found
        actual: usize,
    },
    /// An error which occurs when the analysis configuration is inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// An error raised while rendering a histogram image.
    #[error("Plot error: {0}")]
    PlotError(String),
    /// A custom fallback error for errors too complex or too infrequent to warrant their own error
    /// category.
    #[error("{0}")]
    Custom(String),
}

/// A type alias for a `Result` with a [`DimuError`].
pub type DimuResult<T> = Result<T, DimuError>;
