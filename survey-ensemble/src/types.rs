//! Shared types passed between the ensemble stages
//!
//! Stage contracts:
//! - **Weight Resolver:** [`RawPredictions`] → [`WeightMap`]
//! - **Ensemble Combiner:** [`ModelPredictions`] + [`WeightMap`] → [`EnsembleResults`]
//! - **Tabular Exporter:** [`EnsembleResults`] → rows / CSV
//!
//! Every series-keyed output is a `BTreeMap`, so iteration order (and
//! therefore export row order) is deterministic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use survey_common::ModelId;

/// Name of one time-series instance
pub type SeriesName = String;

/// Name of a sub-classifier as reported by the survey classifier
pub type SubclassifierName = String;

/// Science class label
pub type ClassLabel = String;

/// Probability (or probability-like score)
pub type Probability = f64;

/// One model's class distribution for one series
pub type ModelPrediction = BTreeMap<ClassLabel, Probability>;

/// Per-model weights for one series (sum to 1.0 unless empty)
pub type SeriesWeights = BTreeMap<ModelId, f64>;

/// Per-series, per-model weights
pub type WeightMap = BTreeMap<SeriesName, SeriesWeights>;

/// Raw sub-classifier scores per series
pub type RawPredictions = BTreeMap<SeriesName, BTreeMap<SubclassifierName, Probability>>;

/// Per-model, per-series class distributions
pub type ModelPredictions = BTreeMap<ModelId, BTreeMap<SeriesName, ModelPrediction>>;

/// Combined results per series
pub type EnsembleResults = BTreeMap<SeriesName, CombinedResult>;

/// Ensemble output for one series
///
/// `by_model` keeps every model's raw distribution for traceability;
/// `combined` is the weighted sum over the contributing models and may be
/// empty when no model carried weight for the series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedResult {
    /// Model display name → raw class distribution
    pub by_model: BTreeMap<String, ModelPrediction>,

    /// Class label → weighted-sum probability
    pub combined: ModelPrediction,

    /// Ground-truth class, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<ClassLabel>,
}

impl CombinedResult {
    /// Highest-probability combined class
    ///
    /// Ties go to the lexicographically smallest label. `None` when nothing
    /// contributed to the series.
    pub fn most_probable(&self) -> Option<(&str, Probability)> {
        self.combined
            .iter()
            .fold(None::<(&str, Probability)>, |best, (label, &prob)| match best {
                Some((_, best_prob)) if best_prob >= prob => best,
                _ => Some((label.as_str(), prob)),
            })
    }

    /// Sum of the combined distribution
    pub fn total_probability(&self) -> Probability {
        self.combined.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(combined: &[(&str, f64)]) -> CombinedResult {
        CombinedResult {
            combined: combined
                .iter()
                .map(|(label, prob)| (label.to_string(), *prob))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_most_probable() {
        let result = result_with(&[("Mira", 0.2), ("RR_Lyrae", 0.7), ("W_Ursae_Maj", 0.1)]);
        assert_eq!(result.most_probable(), Some(("RR_Lyrae", 0.7)));
    }

    #[test]
    fn test_most_probable_tie_prefers_smaller_label() {
        let result = result_with(&[("b", 0.5), ("a", 0.5)]);
        assert_eq!(result.most_probable(), Some(("a", 0.5)));
    }

    #[test]
    fn test_most_probable_empty() {
        assert_eq!(CombinedResult::default().most_probable(), None);
        assert_eq!(CombinedResult::default().total_probability(), 0.0);
    }

    #[test]
    fn test_total_probability() {
        let result = result_with(&[("A", 0.6), ("B", 0.4)]);
        assert!((result.total_probability() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_label_skipped_when_absent() {
        let json = serde_json::to_string(&result_with(&[("A", 1.0)])).unwrap();
        assert!(!json.contains("label"));
    }
}
