//! Ensemble Combiner - Weighted Sum of Model Distributions
//!
//! For every series predicted by any model:
//! - `combined[class] = Σ weight[series][model] * prediction[model][series][class]`
//! - every model's raw distribution is kept under `by_model`, keyed by display name
//!
//! A model without a weight for a series (filtered out by the resolver, or a
//! degenerate series) still appears in `by_model` but adds nothing to
//! `combined`. Weights are trusted to sum to 1.0 and are not renormalized.

use crate::error::{EnsembleError, Result};
use crate::types::{CombinedResult, EnsembleResults, ModelPrediction, SeriesName, WeightMap};
use std::collections::{BTreeMap, HashMap};
use survey_common::ModelId;
use tracing::{debug, info, warn};

/// Combine per-model predictions into per-series ensemble results
///
/// `model_predictions` can be any iteration over `(model id, per-series
/// predictions)` pairs; the processing order of models does not change the
/// result beyond floating-point rounding.
///
/// # Errors
/// - `MissingWeightContext` if a predicted series has no entry in `weights`
///   (the resolver emits one for every series, even when empty)
/// - `UnknownModelId` if a model has no display name in `id_to_name`
///
/// Both are checked before any accumulation happens.
pub fn combine<'a, I>(
    model_predictions: I,
    weights: &WeightMap,
    id_to_name: &HashMap<ModelId, String>,
) -> Result<EnsembleResults>
where
    I: IntoIterator<Item = (&'a ModelId, &'a BTreeMap<SeriesName, ModelPrediction>)>,
{
    // Resolve display names and the union of series up front
    let mut models = Vec::new();
    let mut results = EnsembleResults::new();

    for (model_id, per_series) in model_predictions {
        let model_name = id_to_name
            .get(model_id)
            .ok_or_else(|| EnsembleError::UnknownModelId {
                id: model_id.clone(),
            })?;

        for series in per_series.keys() {
            if results.contains_key(series) {
                continue;
            }
            if !weights.contains_key(series) {
                return Err(EnsembleError::MissingWeightContext {
                    series: series.clone(),
                });
            }
            results.insert(series.clone(), CombinedResult::default());
        }

        models.push((model_id, model_name, per_series));
    }

    debug!(
        model_count = models.len(),
        series_count = results.len(),
        "Starting ensemble combination"
    );

    for (model_id, model_name, per_series) in &models {
        for (series, prediction) in per_series.iter() {
            let (Some(result), Some(series_weights)) = (results.get_mut(series), weights.get(series))
            else {
                continue;
            };

            if result
                .by_model
                .insert(model_name.to_string(), prediction.clone())
                .is_some()
            {
                warn!(
                    series = %series,
                    model = %model_name,
                    "Two models share a display name, keeping the later distribution"
                );
            }

            let Some(&weight) = series_weights.get(*model_id) else {
                debug!(
                    series = %series,
                    model = %model_name,
                    "Model carries no weight for series, recorded without contribution"
                );
                continue;
            };

            for (class, &prob) in prediction {
                *result.combined.entry(class.clone()).or_insert(0.0) += weight * prob;
            }
        }
    }

    let uninformed = results
        .values()
        .filter(|result| result.combined.is_empty())
        .count();

    info!(
        series_count = results.len(),
        model_count = models.len(),
        uninformed_count = uninformed,
        "Ensemble combination complete"
    );

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SeriesWeights;

    fn prediction(classes: &[(&str, f64)]) -> ModelPrediction {
        classes
            .iter()
            .map(|(class, prob)| (class.to_string(), *prob))
            .collect()
    }

    fn series_weights(entries: &[(i64, f64)]) -> SeriesWeights {
        entries
            .iter()
            .map(|(id, weight)| (ModelId::Int(*id), *weight))
            .collect()
    }

    fn names() -> HashMap<ModelId, String> {
        HashMap::from([
            (ModelId::Int(1), "ASAS".to_string()),
            (ModelId::Int(2), "Kepler".to_string()),
            (ModelId::Int(3), "TrES".to_string()),
        ])
    }

    fn two_model_input() -> BTreeMap<ModelId, BTreeMap<SeriesName, ModelPrediction>> {
        BTreeMap::from([
            (
                ModelId::Int(1),
                BTreeMap::from([("s1".to_string(), prediction(&[("A", 0.8), ("B", 0.2)]))]),
            ),
            (
                ModelId::Int(2),
                BTreeMap::from([("s1".to_string(), prediction(&[("A", 0.4), ("B", 0.6)]))]),
            ),
        ])
    }

    #[test]
    fn test_equal_weights_blend() {
        let weights = WeightMap::from([("s1".to_string(), series_weights(&[(1, 0.5), (2, 0.5)]))]);

        let results = combine(&two_model_input(), &weights, &names()).unwrap();

        let combined = &results["s1"].combined;
        assert!((combined["A"] - 0.6).abs() < 1e-9);
        assert!((combined["B"] - 0.4).abs() < 1e-9);
        assert_eq!(results["s1"].by_model.len(), 2);
        assert_eq!(results["s1"].by_model["ASAS"], prediction(&[("A", 0.8), ("B", 0.2)]));
        assert_eq!(results["s1"].label, None);
    }

    #[test]
    fn test_unweighted_model_recorded_but_not_combined() {
        let weights = WeightMap::from([("s1".to_string(), series_weights(&[(1, 1.0)]))]);

        let results = combine(&two_model_input(), &weights, &names()).unwrap();

        let result = &results["s1"];
        assert!(result.by_model.contains_key("Kepler"));
        assert!((result.combined["A"] - 0.8).abs() < 1e-9);
        assert!((result.combined["B"] - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_series_still_produces_result() {
        let weights = WeightMap::from([("s1".to_string(), SeriesWeights::new())]);

        let results = combine(&two_model_input(), &weights, &names()).unwrap();

        assert!(results.contains_key("s1"));
        assert!(results["s1"].combined.is_empty());
        assert_eq!(results["s1"].by_model.len(), 2);
    }

    #[test]
    fn test_union_of_series_across_models() {
        let input = BTreeMap::from([
            (
                ModelId::Int(1),
                BTreeMap::from([("s1".to_string(), prediction(&[("A", 1.0)]))]),
            ),
            (
                ModelId::Int(2),
                BTreeMap::from([("s2".to_string(), prediction(&[("B", 1.0)]))]),
            ),
        ]);
        let weights = WeightMap::from([
            ("s1".to_string(), series_weights(&[(1, 1.0)])),
            ("s2".to_string(), series_weights(&[(2, 1.0)])),
        ]);

        let results = combine(&input, &weights, &names()).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results["s1"].combined, prediction(&[("A", 1.0)]));
        assert_eq!(results["s2"].combined, prediction(&[("B", 1.0)]));
        assert!(!results["s1"].by_model.contains_key("Kepler"));
    }

    #[test]
    fn test_missing_weight_context_is_error() {
        let weights = WeightMap::new();

        let result = combine(&two_model_input(), &weights, &names());

        match result {
            Err(EnsembleError::MissingWeightContext { series }) => assert_eq!(series, "s1"),
            other => panic!("expected MissingWeightContext, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_model_id_is_error() {
        let weights = WeightMap::from([("s1".to_string(), series_weights(&[(1, 0.5), (2, 0.5)]))]);
        let partial_names = HashMap::from([(ModelId::Int(1), "ASAS".to_string())]);

        let result = combine(&two_model_input(), &weights, &partial_names);

        assert!(matches!(
            result,
            Err(EnsembleError::UnknownModelId { id: ModelId::Int(2) })
        ));
    }

    #[test]
    fn test_extra_weight_without_prediction_is_ignored() {
        let weights =
            WeightMap::from([("s1".to_string(), series_weights(&[(1, 0.5), (2, 0.25), (3, 0.25)]))]);

        let results = combine(&two_model_input(), &weights, &names()).unwrap();

        // TrES never predicted s1, so its quarter of the weight is simply absent
        assert!((results["s1"].combined["A"] - 0.5).abs() < 1e-9);
        assert!(!results["s1"].by_model.contains_key("TrES"));
    }

    #[test]
    fn test_model_order_does_not_change_result() {
        let input = BTreeMap::from([
            (
                ModelId::Int(1),
                BTreeMap::from([("s1".to_string(), prediction(&[("A", 0.7), ("B", 0.3)]))]),
            ),
            (
                ModelId::Int(2),
                BTreeMap::from([("s1".to_string(), prediction(&[("B", 0.9), ("C", 0.1)]))]),
            ),
            (
                ModelId::Int(3),
                BTreeMap::from([("s1".to_string(), prediction(&[("A", 0.2), ("C", 0.8)]))]),
            ),
        ]);
        let weights =
            WeightMap::from([("s1".to_string(), series_weights(&[(1, 0.2), (2, 0.3), (3, 0.5)]))]);

        let forward = combine(&input, &weights, &names()).unwrap();
        let reversed = combine(input.iter().rev(), &weights, &names()).unwrap();

        for (class, value) in &forward["s1"].combined {
            assert!((value - reversed["s1"].combined[class]).abs() < 1e-12);
        }
        assert_eq!(forward["s1"].by_model, reversed["s1"].by_model);
    }
}
