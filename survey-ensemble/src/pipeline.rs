//! End-to-end aggregation
//!
//! registry + sub-classifier results + science results → ensemble results.
//! Each call is independent; nothing is cached between runs.

use crate::combine::combine;
use crate::error::Result;
use crate::source::SubclassifierResults;
use crate::types::{ClassLabel, EnsembleResults, ModelPredictions, SeriesName};
use crate::weights::WeightResolver;
use std::collections::BTreeMap;
use survey_common::ModelRegistry;
use tracing::{debug, info};

/// Aggregate one batch of predictions into per-series ensemble results
///
/// Ground-truth labels from `subclassifier` are attached to matching series.
pub fn aggregate(
    subclassifier: &SubclassifierResults,
    science: &ModelPredictions,
    registry: &ModelRegistry,
) -> Result<EnsembleResults> {
    info!(
        series_count = subclassifier.predictions.len(),
        model_count = science.len(),
        registry_size = registry.len(),
        "Aggregating ensemble predictions"
    );

    let weights = WeightResolver::new().resolve(&subclassifier.predictions, &registry.name_to_id())?;
    let results = combine(science, &weights, &registry.id_to_name())?;

    Ok(with_labels(results, &subclassifier.labels))
}

/// Attach ground-truth labels to the series that have one
///
/// Labels for series missing from `results` are ignored.
pub fn with_labels(
    mut results: EnsembleResults,
    labels: &BTreeMap<SeriesName, ClassLabel>,
) -> EnsembleResults {
    let mut attached = 0usize;
    for (series, label) in labels {
        if let Some(result) = results.get_mut(series) {
            result.label = Some(label.clone());
            attached += 1;
        }
    }

    debug!(attached, available = labels.len(), "Attached ground-truth labels");
    results
}
