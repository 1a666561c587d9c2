//! Error types of the feature-pair clustering engine.

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while reading a dataset or analyzing it.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A data row cannot be read (too few columns, ragged row, non-numeric feature).
    #[error("malformed input in row {row}: {reason}")]
    MalformedInput { row: usize, reason: String },

    /// No data rows at all.
    #[error("empty dataset: no data rows found")]
    EmptyDataset,

    /// Fewer than two distinct labels; k would be smaller than 2.
    #[error("degenerate k: found {labels} distinct label(s), need at least 2")]
    DegenerateK { labels: usize },

    /// The exhaustive label matching is factorial in the number of labels.
    #[error("too many labels: {labels} distinct labels exceed the matching limit of {limit}")]
    TooManyLabels { labels: usize, limit: usize },

    /// Fewer than two feature columns, so there is no feature pair.
    #[error("too few features: got {got}, need at least 2")]
    TooFewFeatures { got: usize },

    /// Lengths or widths of the inputs do not fit together.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// A feature is so large in magnitude that summed squared distances would overflow.
    #[error("value out of range in row {row}: |{value:e}| exceeds {limit:e}")]
    ValueOutOfRange { row: usize, value: f64, limit: f64 },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The worker pool for the feature pairs could not be built.
    #[error("cannot build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Reading a dataset or writing a clustering failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
