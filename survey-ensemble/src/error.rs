//! Error types for survey-ensemble
//!
//! Degenerate weights (every sub-classifier below the negligibility
//! threshold) are a valid outcome and have no variant here.

use survey_common::ModelId;
use thiserror::Error;

/// Ensemble pipeline error type
#[derive(Debug, Error)]
pub enum EnsembleError {
    /// A non-negligible sub-classifier has no registry entry
    #[error("Unresolvable model name '{name}' for series '{series}'")]
    UnresolvableModelName { name: String, series: String },

    /// A series has predictions but no weight entry at all
    #[error("Missing weight context for series '{series}'")]
    MissingWeightContext { series: String },

    /// A model has predictions but no display name
    #[error("Unknown model id {id}: no display name registered")]
    UnknownModelId { id: ModelId },

    /// A science prediction carries a negative or non-finite probability
    #[error("Invalid probability {value} for class '{class}' (model {model}, series '{series}')")]
    InvalidProbability {
        model: ModelId,
        series: String,
        class: String,
        value: f64,
    },

    /// A class label collides with a fixed export column name
    #[error("Class label '{label}' collides with a reserved export column")]
    ReservedColumnLabel { label: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON input could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// survey-common error
    #[error("Common error: {0}")]
    Common(#[from] survey_common::Error),
}

/// Result type for ensemble operations
pub type Result<T> = std::result::Result<T, EnsembleError>;
