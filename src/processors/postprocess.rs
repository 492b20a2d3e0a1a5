//! Post-processing of classification output.
//!
//! Two small, pure steps: [`ScoreActivation`] maps the model's raw output
//! row to a scalar confidence score in [0, 1], and [`DecisionRule`] maps
//! that score to a discrete label via a fixed threshold. Both are defined by
//! the artifact's output contract and configured explicitly, never guessed
//! from the output at runtime.

use crate::core::errors::{ScreenError, ScreenResult, SimpleError};
use serde::{Deserialize, Serialize};

/// Labels for the two sides of the decision threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassLabels {
    /// Label reported when score >= threshold.
    pub positive: String,
    /// Label reported when score < threshold.
    pub negative: String,
}

impl Default for ClassLabels {
    fn default() -> Self {
        Self {
            positive: "atypical-pattern".to_string(),
            negative: "typical-pattern".to_string(),
        }
    }
}

/// Mapping from the model's raw output row to a scalar score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreActivation {
    /// Single-logit head: apply the logistic function.
    Sigmoid,
    /// Multi-class head: softmax over the row, report one class.
    Softmax {
        /// Index of the class whose probability becomes the score.
        positive_index: usize,
    },
    /// The model already emits a probability in [0, 1].
    Identity,
}

impl Default for ScoreActivation {
    fn default() -> Self {
        Self::Sigmoid
    }
}

impl ScoreActivation {
    /// Reduces a raw output row to a scalar score in [0, 1].
    ///
    /// # Errors
    ///
    /// Fails on an empty row, non-finite values, a row shape the activation
    /// cannot consume, or an `Identity` value outside [0, 1]. A bad score is
    /// never returned.
    pub fn score(&self, raw: &[f32]) -> ScreenResult<f32> {
        if raw.is_empty() {
            return Err(ScreenError::post_processing(
                "model produced an empty output row",
                SimpleError::new("no values to score"),
            ));
        }

        if let Some(bad) = raw.iter().find(|v| !v.is_finite()) {
            return Err(ScreenError::post_processing(
                "model output contains a non-finite value",
                SimpleError::new(format!("found {bad}")),
            ));
        }

        match *self {
            ScoreActivation::Sigmoid => {
                if raw.len() != 1 {
                    return Err(ScreenError::post_processing(
                        format!(
                            "sigmoid activation expects a single logit, got {} values",
                            raw.len()
                        ),
                        SimpleError::new("output shape does not match the configured activation"),
                    ));
                }
                Ok(1.0 / (1.0 + (-raw[0]).exp()))
            }
            ScoreActivation::Softmax { positive_index } => {
                if positive_index >= raw.len() {
                    return Err(ScreenError::post_processing(
                        format!(
                            "softmax positive_index {positive_index} is out of bounds for {} classes",
                            raw.len()
                        ),
                        SimpleError::new("output shape does not match the configured activation"),
                    ));
                }
                // Max-subtraction keeps the exponentials in range.
                let max = raw.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                let denom: f32 = raw.iter().map(|v| (v - max).exp()).sum();
                Ok((raw[positive_index] - max).exp() / denom)
            }
            ScoreActivation::Identity => {
                if raw.len() != 1 {
                    return Err(ScreenError::post_processing(
                        format!(
                            "identity activation expects a single value, got {} values",
                            raw.len()
                        ),
                        SimpleError::new("output shape does not match the configured activation"),
                    ));
                }
                let value = raw[0];
                if !(0.0..=1.0).contains(&value) {
                    return Err(ScreenError::post_processing(
                        format!("identity activation requires a probability in [0, 1], got {value}"),
                        SimpleError::new("model output is not a probability"),
                    ));
                }
                Ok(value)
            }
        }
    }
}

/// Fixed threshold rule converting a score into a discrete label.
///
/// The mapping is total and pure: `score >= threshold` always yields the
/// positive label, anything below yields the negative one.
#[derive(Debug, Clone)]
pub struct DecisionRule {
    threshold: f32,
    labels: ClassLabels,
}

impl DecisionRule {
    /// Creates a decision rule.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the threshold is outside [0, 1] or either
    /// label is empty.
    pub fn new(threshold: f32, labels: ClassLabels) -> ScreenResult<Self> {
        if !(0.0..=1.0).contains(&threshold) || !threshold.is_finite() {
            return Err(ScreenError::config_error(format!(
                "threshold must be within [0, 1], got {threshold}"
            )));
        }
        if labels.positive.is_empty() || labels.negative.is_empty() {
            return Err(ScreenError::config_error("labels must be non-empty"));
        }
        Ok(Self { threshold, labels })
    }

    /// The configured decision threshold.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Maps a score to its label.
    pub fn label(&self, score: f32) -> &str {
        if score >= self.threshold {
            &self.labels.positive
        } else {
            &self.labels.negative
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_of_zero_logit_is_half() {
        let score = ScoreActivation::Sigmoid.score(&[0.0]).unwrap();
        assert!((score - 0.5).abs() < 1e-6);
    }

    #[test]
    fn sigmoid_stays_in_range_for_extreme_logits() {
        for logit in [-80.0, -5.0, 5.0, 80.0] {
            let score = ScoreActivation::Sigmoid.score(&[logit]).unwrap();
            assert!((0.0..=1.0).contains(&score), "logit {logit} -> {score}");
            assert!(score.is_finite());
        }
    }

    #[test]
    fn sigmoid_rejects_multi_value_rows() {
        assert!(ScoreActivation::Sigmoid.score(&[0.1, 0.9]).is_err());
    }

    #[test]
    fn softmax_reports_the_positive_class_probability() {
        let activation = ScoreActivation::Softmax { positive_index: 1 };
        let score = activation.score(&[1.0, 3.0]).unwrap();
        // exp(3) / (exp(1) + exp(3))
        assert!((score - 0.880_797).abs() < 1e-5);
    }

    #[test]
    fn softmax_is_stable_for_large_logits() {
        let activation = ScoreActivation::Softmax { positive_index: 0 };
        let score = activation.score(&[500.0, 499.0]).unwrap();
        assert!(score.is_finite());
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn softmax_rejects_out_of_bounds_index() {
        let activation = ScoreActivation::Softmax { positive_index: 2 };
        assert!(activation.score(&[0.1, 0.9]).is_err());
    }

    #[test]
    fn identity_passes_probabilities_and_rejects_the_rest() {
        assert_eq!(ScoreActivation::Identity.score(&[0.25]).unwrap(), 0.25);
        assert!(ScoreActivation::Identity.score(&[1.25]).is_err());
        assert!(ScoreActivation::Identity.score(&[-0.1]).is_err());
    }

    #[test]
    fn non_finite_output_is_an_error_not_a_score() {
        assert!(ScoreActivation::Sigmoid.score(&[f32::NAN]).is_err());
        let activation = ScoreActivation::Softmax { positive_index: 0 };
        assert!(activation.score(&[f32::INFINITY, 0.0]).is_err());
    }

    #[test]
    fn empty_row_is_an_error() {
        assert!(ScoreActivation::Sigmoid.score(&[]).is_err());
    }

    #[test]
    fn decision_rule_is_a_pure_threshold_function() {
        let rule = DecisionRule::new(0.5, ClassLabels::default()).unwrap();
        assert_eq!(rule.label(0.0), "typical-pattern");
        assert_eq!(rule.label(0.499_999), "typical-pattern");
        // Exactly at the threshold counts as positive.
        assert_eq!(rule.label(0.5), "atypical-pattern");
        assert_eq!(rule.label(1.0), "atypical-pattern");
    }

    #[test]
    fn decision_rule_rejects_bad_thresholds() {
        assert!(DecisionRule::new(1.5, ClassLabels::default()).is_err());
        assert!(DecisionRule::new(-0.1, ClassLabels::default()).is_err());
        assert!(DecisionRule::new(f32::NAN, ClassLabels::default()).is_err());
    }

    #[test]
    fn decision_rule_rejects_empty_labels() {
        let labels = ClassLabels {
            positive: String::new(),
            negative: "typical-pattern".to_string(),
        };
        assert!(DecisionRule::new(0.5, labels).is_err());
    }
}
