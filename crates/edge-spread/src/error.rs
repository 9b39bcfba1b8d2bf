//! Error types for spread estimation.

use thiserror::Error;

/// Result type for spread estimation.
pub type Result<T> = std::result::Result<T, EdgeError>;

/// Errors that can occur during spread estimation.
///
/// Only structural and configuration problems are errors. Degenerate windows
/// and missing prices are data: they surface as `None` estimates.
#[derive(Debug, Error)]
pub enum EdgeError {
    /// Price vectors of different lengths
    #[error(
        "Length mismatch: open has {open} values, high {high}, low {low}, close {close}"
    )]
    LengthMismatch {
        /// Number of open prices
        open: usize,
        /// Number of high prices
        high: usize,
        /// Number of low prices
        low: usize,
        /// Number of close prices
        close: usize,
    },

    /// Malformed window specification
    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    /// Time unit not understood by the simulator
    #[error("Unsupported time unit: {0}")]
    UnsupportedTimeUnit(String),

    /// Simulation parameter out of range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Missing required column in input data
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Polars DataFrame error
    #[error("DataFrame error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
