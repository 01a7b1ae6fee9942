//! Prediction source decoding
//!
//! Decodes the JSON documents returned by the classification service into
//! ensemble input types. Nothing here performs network I/O; callers supply
//! the document text.
//!
//! Shapes:
//! - registry listing: `{"data": [{"id", "name", "project_id"}, ...]}` or a bare array
//! - sub-classifier results: `{series: {"prediction": {name: prob}, "label": class?}}`
//! - science results: `{model_id: {series: {"prediction": {class: prob}}}}`

use crate::error::{EnsembleError, Result};
use crate::types::{ClassLabel, ModelPrediction, ModelPredictions, RawPredictions, SeriesName};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use survey_common::{ModelId, ModelRecord};
use tracing::debug;

/// One series' entry in a prediction results document
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionEntry {
    pub prediction: BTreeMap<String, f64>,

    #[serde(default)]
    pub label: Option<ClassLabel>,
}

/// Decoded sub-classifier results: weights input plus any ground-truth labels
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubclassifierResults {
    pub predictions: RawPredictions,
    pub labels: BTreeMap<SeriesName, ClassLabel>,
}

/// Decode a model registry listing
pub fn parse_model_records(json: &str) -> Result<Vec<ModelRecord>> {
    let listing = match serde_json::from_str::<Value>(json)? {
        Value::Object(mut envelope) => envelope.remove("data").unwrap_or(Value::Null),
        bare => bare,
    };
    let records: Vec<ModelRecord> = serde_json::from_value(listing)?;

    debug!(record_count = records.len(), "Decoded model registry listing");
    Ok(records)
}

/// Decode per-series sub-classifier results
pub fn parse_subclassifier_results(json: &str) -> Result<SubclassifierResults> {
    let entries: BTreeMap<SeriesName, PredictionEntry> = serde_json::from_str(json)?;

    let mut results = SubclassifierResults::default();
    for (series, entry) in entries {
        if let Some(label) = entry.label {
            results.labels.insert(series.clone(), label);
        }
        results.predictions.insert(series, entry.prediction);
    }

    debug!(
        series_count = results.predictions.len(),
        labelled_count = results.labels.len(),
        "Decoded sub-classifier results"
    );
    Ok(results)
}

/// Decode per-model science results
///
/// Model keys are JSON strings; numeric keys become integer [`ModelId`]s so
/// they match registry ids.
///
/// # Errors
/// `InvalidProbability` for a negative or non-finite class probability.
pub fn parse_science_results(json: &str) -> Result<ModelPredictions> {
    let raw: BTreeMap<String, BTreeMap<SeriesName, PredictionEntry>> = serde_json::from_str(json)?;

    let mut predictions = ModelPredictions::new();
    for (key, per_series) in raw {
        let model_id: ModelId = match key.parse() {
            Ok(id) => id,
            Err(never) => match never {},
        };

        let mut series_predictions = BTreeMap::new();
        for (series, entry) in per_series {
            validate_prediction(&model_id, &series, &entry.prediction)?;
            series_predictions.insert(series, entry.prediction);
        }
        predictions.insert(model_id, series_predictions);
    }

    debug!(model_count = predictions.len(), "Decoded science results");
    Ok(predictions)
}

fn validate_prediction(model: &ModelId, series: &str, prediction: &ModelPrediction) -> Result<()> {
    for (class, &value) in prediction {
        if !value.is_finite() || value < 0.0 {
            return Err(EnsembleError::InvalidProbability {
                model: model.clone(),
                series: series.to_string(),
                class: class.clone(),
                value,
            });
        }
    }
    Ok(())
}

/// Read a JSON document from disk
pub fn read_document(path: &Path) -> Result<String> {
    let text = std::fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = text.len(), "Read input document");
    Ok(text)
}
