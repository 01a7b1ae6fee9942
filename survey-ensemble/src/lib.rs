//! # Survey Ensemble
//!
//! Combines per-model science predictions into one class distribution per
//! time series, weighted by the survey classifier's belief in which survey
//! each series came from.
//!
//! Stages:
//! - [`weights`]: sub-classifier scores → normalized per-series model weights
//! - [`combine`]: weighted sum of model distributions, with per-model breakdown
//! - [`export`]: flat CSV table, one row per series
//!
//! [`source`] decodes the classification service's JSON documents and
//! [`pipeline`] runs the stages end to end.

pub mod combine;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod source;
pub mod types;
pub mod weights;

pub use crate::combine::combine;
pub use crate::error::{EnsembleError, Result};
pub use crate::export::{export, write_csv, write_table, ExportOutput};
pub use crate::pipeline::aggregate;
pub use crate::types::{CombinedResult, EnsembleResults, ModelPredictions, RawPredictions, WeightMap};
pub use crate::weights::{resolve_weights, WeightResolver, NEGLIGIBLE_WEIGHT_THRESHOLD};
