//! Centralized error handling for nc_conform
//!
//! Every fallible operation in the crate returns [`Result`], and failures
//! propagate to the caller unchanged. Coordinate attachment during
//! normalization is the one stage that never produces an error.

use thiserror::Error;

/// Main error type for nc_conform operations
#[derive(Debug, Error)]
pub enum NcConformError {
    /// NetCDF file operation errors
    #[error("NetCDF error: {0}")]
    NetCDFError(#[from] netcdf::Error),

    /// I/O operation errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Array shape or dimension error
    #[error("Array error: {0}")]
    ArrayError(#[from] ndarray::ShapeError),

    /// Malformed calibration table file
    #[error("Calibration file error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Model code whose first character has no domain mapping
    #[error("Unknown domain prefix '{prefix}' in model code '{model}'")]
    UnknownDomain { model: String, prefix: char },

    /// Model code that cannot be parsed at all (e.g. empty)
    #[error("Invalid model code '{0}'")]
    InvalidModelCode(String),

    /// Strict calibration lookup found no (mean, scale) pair
    #[error("No calibration entry for model '{key}' and variable '{var}'")]
    CalibrationNotFound { key: String, var: String },

    /// Group not found in NetCDF file
    #[error("Group '{group}' not found in file")]
    GroupNotFound { group: String },

    /// Variable not found in a dataset group
    #[error("Variable '{var}' not found in group '{group}'")]
    VariableNotFound { group: String, var: String },

    /// Dimension not found in a variable or dataset
    #[error("Dimension '{dim}' not found in '{var}'")]
    DimensionNotFound { var: String, dim: String },

    /// A variable disagrees with the dataset about a dimension's length
    #[error("Dimension '{dim}' has length {existing} but variable '{var}' expects {requested}")]
    DimensionConflict {
        dim: String,
        var: String,
        existing: usize,
        requested: usize,
    },

    /// Time axes of two datasets have different lengths
    #[error("Time dimension length mismatch: {with_time} in the file with time, {without_time} in the file without time")]
    TimeLengthMismatch { with_time: usize, without_time: usize },

    /// Generic error for messages without a dedicated variant
    #[error("{0}")]
    Generic(String),
}

impl From<String> for NcConformError {
    fn from(error: String) -> Self {
        NcConformError::Generic(error)
    }
}

impl From<&str> for NcConformError {
    fn from(error: &str) -> Self {
        NcConformError::Generic(error.to_string())
    }
}

/// Result type alias for nc_conform operations
pub type Result<T> = std::result::Result<T, NcConformError>;
