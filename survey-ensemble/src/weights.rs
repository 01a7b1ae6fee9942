//! Weight Resolver
//!
//! Turns the survey classifier's per-series sub-classifier scores into
//! per-series model weights:
//! 1. Drop scores below [`NEGLIGIBLE_WEIGHT_THRESHOLD`] and non-finite scores
//! 2. Resolve surviving sub-classifier names to model ids
//! 3. Divide by the survivors' sum so each series' weights total 1.0
//!
//! A series where nothing survives gets an empty weight map. That is the
//! degenerate "no informative model" case, not an error.

use crate::error::{EnsembleError, Result};
use crate::types::{Probability, RawPredictions, SeriesName, SeriesWeights, SubclassifierName, WeightMap};
use std::collections::{BTreeMap, HashMap};
use survey_common::ModelId;
use tracing::{debug, info, warn};

/// Sub-classifier scores below this value carry no weight
pub const NEGLIGIBLE_WEIGHT_THRESHOLD: f64 = 0.05;

/// Filter-and-normalize weight resolution
#[derive(Debug, Clone)]
pub struct WeightResolver {
    /// Scores strictly below this are discarded
    threshold: f64,
}

impl Default for WeightResolver {
    fn default() -> Self {
        Self {
            threshold: NEGLIGIBLE_WEIGHT_THRESHOLD,
        }
    }
}

impl WeightResolver {
    /// Resolver using [`NEGLIGIBLE_WEIGHT_THRESHOLD`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver with an explicit negligibility threshold
    pub fn with_threshold(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Resolve weights for every series in `raw_predictions`
    ///
    /// Every input series gets an entry in the output, possibly empty.
    ///
    /// # Errors
    /// `UnresolvableModelName` if a sub-classifier at or above the threshold
    /// is missing from `name_to_id`. Names below the threshold are never
    /// looked up.
    pub fn resolve(
        &self,
        raw_predictions: &RawPredictions,
        name_to_id: &HashMap<SubclassifierName, ModelId>,
    ) -> Result<WeightMap> {
        let mut weights = WeightMap::new();
        let mut degenerate = 0usize;

        for (series, scores) in raw_predictions {
            let series_weights = self.resolve_series(series, scores, name_to_id)?;
            if series_weights.is_empty() {
                degenerate += 1;
            }
            weights.insert(series.clone(), series_weights);
        }

        info!(
            series_count = weights.len(),
            degenerate_count = degenerate,
            threshold = self.threshold,
            "Resolved sub-classifier weights"
        );

        Ok(weights)
    }

    fn resolve_series(
        &self,
        series: &SeriesName,
        scores: &BTreeMap<SubclassifierName, Probability>,
        name_to_id: &HashMap<SubclassifierName, ModelId>,
    ) -> Result<SeriesWeights> {
        let mut surviving = SeriesWeights::new();

        for (name, &score) in scores {
            if !score.is_finite() || score < self.threshold {
                continue;
            }

            let model_id = name_to_id.get(name).ok_or_else(|| {
                EnsembleError::UnresolvableModelName {
                    name: name.clone(),
                    series: series.clone(),
                }
            })?;

            // Two names resolving to one model pool their scores
            *surviving.entry(model_id.clone()).or_insert(0.0) += score;
        }

        let total: f64 = surviving.values().sum();
        if surviving.is_empty() || total <= 0.0 {
            warn!(
                series = %series,
                candidates = scores.len(),
                "No sub-classifier above negligibility threshold, series has no informative model"
            );
            return Ok(SeriesWeights::new());
        }

        for weight in surviving.values_mut() {
            *weight /= total;
        }

        debug!(
            series = %series,
            models = surviving.len(),
            candidates = scores.len(),
            "Normalized series weights"
        );

        Ok(surviving)
    }
}

/// Resolve weights with the default threshold
pub fn resolve_weights(
    raw_predictions: &RawPredictions,
    name_to_id: &HashMap<SubclassifierName, ModelId>,
) -> Result<WeightMap> {
    WeightResolver::new().resolve(raw_predictions, name_to_id)
}
