use std::path::PathBuf;

use thiserror::Error;

use crate::modes::{Capability, Category};
use crate::request::gated_capabilities;

/// Errors produced while loading a mode catalog.
///
/// Row numbers are 1-based and count data rows only (the header is not a row).
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The catalog file could not be opened.
    #[error("failed to open catalog {}: {source}", path.display())]
    Open {
        /// Path that was being opened.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The CSV layer rejected the input (bad quoting, ragged rows, ...).
    #[error("malformed catalog table: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is not present in the header.
    #[error("{category} catalog is missing required column '{column}'")]
    MissingColumn {
        /// Table variant being loaded.
        category: Category,
        /// Name of the missing column.
        column: &'static str,
    },

    /// A header names a column neither table variant defines.
    #[error("{category} catalog has unexpected column '{column}'")]
    UnexpectedColumn { category: Category, column: String },

    /// Two headers normalise to the same column name.
    #[error("{category} catalog lists column '{column}' more than once")]
    DuplicateColumn { category: Category, column: String },

    /// A numeric cell is empty, unparseable, or not finite.
    #[error("row {row}, column '{column}': '{value}' is not a finite number")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },

    /// A yes/no cell holds something else.
    #[error("row {row}, column '{column}': expected yes or no, got '{value}'")]
    InvalidFlag {
        row: usize,
        column: &'static str,
        value: String,
    },

    /// A token in an enumerated cell is not recognised.
    #[error("row {row}, column '{column}': {reason}")]
    InvalidToken {
        row: usize,
        column: &'static str,
        reason: String,
    },

    /// A cell that must carry a value is empty.
    #[error("row {row}, column '{column}' is empty")]
    EmptyField { row: usize, column: &'static str },

    /// The wavelength coverage band is inverted.
    #[error("row {row}: wavelength_min {min} exceeds wavelength_max {max}")]
    InvalidRange { row: usize, min: f64, max: f64 },
}

/// Errors produced while validating observer request parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    /// A proximity target must be strictly positive.
    #[error("{parameter} must be a finite positive number, got {value}")]
    NotPositive {
        parameter: &'static str,
        value: f64,
    },

    /// A minimum requirement must not be negative.
    #[error("{parameter} must be a finite non-negative number, got {value}")]
    Negative {
        parameter: &'static str,
        value: f64,
    },

    /// Imaging requests need at least one acceptable filter.
    #[error("at least one filter must be requested for imaging")]
    NoFilters,

    /// The bandwidth bounds are inverted.
    #[error("minimum bandwidth {min} exceeds maximum bandwidth {max}")]
    InvertedBandwidth { min: f64, max: f64 },

    /// No filter gate exists for the capability in the requested observing mode.
    #[error(
        "no {category} gate exists for capability '{capability}' ({category} requests accept: {})",
        gate_list(.category)
    )]
    UnsupportedCapability {
        capability: Capability,
        category: Category,
    },
}

fn gate_list(category: &Category) -> String {
    gated_capabilities(*category)
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors produced while reading or writing a matching configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A threshold or weight is NaN or infinite.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
