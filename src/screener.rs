//! Chest-image screening predictor.
//!
//! [`ChestScreener`] owns the loaded model together with the preprocessing
//! and decision contract, and turns one decoded RGB image into one
//! [`ScreeningResult`]. Each call is synchronous, stateless, and pure given
//! the fixed configuration; no image data is retained after the call
//! returns.

use crate::core::config::ScreenerConfig;
use crate::core::errors::{ScreenError, ScreenResult, SimpleError};
use crate::core::inference::OnnxModel;
use crate::processors::{
    ClassLabels, DecisionRule, Normalize, ScoreActivation, resize_to_input,
};
use image::{DynamicImage, GenericImageView, RgbImage};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Scores within this distance of the threshold get "low confidence"
/// framing in the notes.
const LOW_CONFIDENCE_MARGIN: f32 = 0.15;

/// Result of one screening inference.
///
/// Immutable, created fresh per call. The score is the model's
/// self-reported confidence in [0, 1], not a calibrated probability of any
/// ground truth; the notes carry the research-disclosure framing the
/// enclosing demo must present alongside it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreeningResult {
    /// Confidence score in [0, 1], finite.
    pub score: f32,
    /// Discrete label derived from the score via the fixed threshold.
    pub label: String,
    /// Research-disclosure text; never implies diagnostic certainty.
    pub notes: String,
}

/// Screening classifier over a pretrained ONNX artifact.
#[derive(Debug)]
pub struct ChestScreener {
    model: OnnxModel,
    input_shape: (u32, u32),
    normalize: Normalize,
    activation: ScoreActivation,
    decision: DecisionRule,
}

impl ChestScreener {
    /// Loads the artifact and assembles the screening pipeline.
    ///
    /// The configuration is validated before the artifact is touched; a
    /// partially initialized screener is never returned.
    pub fn new(config: ScreenerConfig, model_path: &Path) -> ScreenResult<Self> {
        config.validate()?;

        let model = OnnxModel::load(
            model_path,
            config.model_name.as_deref(),
            config.session.as_ref(),
        )?;
        let normalize = Normalize::new(config.scale, &config.mean, &config.std)?;
        let decision = DecisionRule::new(config.threshold, config.labels)?;

        Ok(Self {
            model,
            input_shape: config.input_shape,
            normalize,
            activation: config.activation,
            decision,
        })
    }

    /// Returns the logical model name.
    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Runs one screening inference.
    ///
    /// Validates the input, resizes it to the model's input shape,
    /// normalizes, forward-passes, and maps the output through the
    /// configured activation and decision rule.
    ///
    /// # Errors
    ///
    /// * `InvalidImage` - wrong channel count or a zero dimension; raised
    ///   before the model is touched.
    /// * `Inference` / `Processing` - the forward pass or a pipeline stage
    ///   failed. Errors surface immediately; there are no retries.
    pub fn run(&self, image: &DynamicImage) -> ScreenResult<ScreeningResult> {
        let rgb = validate_image(image)?;

        let (width, height) = self.input_shape;
        let resized = resize_to_input(rgb, width, height);
        let tensor = self.normalize.to_tensor(&resized)?;

        let output = self.model.infer_2d(&tensor)?;
        if output.nrows() == 0 {
            return Err(ScreenError::inference_error(
                self.model.model_name(),
                "model returned an empty batch",
                SimpleError::new("no output rows to score"),
            ));
        }

        let raw = output.row(0).to_vec();
        let score = self.activation.score(&raw)?;
        if !score.is_finite() || !(0.0..=1.0).contains(&score) {
            return Err(ScreenError::inference_error(
                self.model.model_name(),
                format!("score {score} is outside [0, 1]"),
                SimpleError::new("activation produced an out-of-range score"),
            ));
        }

        let label = self.decision.label(score).to_string();
        let notes = compose_notes(score, self.decision.threshold(), &label);

        debug!(score, label = %label, "screening inference complete");

        Ok(ScreeningResult {
            score,
            label,
            notes,
        })
    }
}

fn validate_image(image: &DynamicImage) -> ScreenResult<&RgbImage> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(ScreenError::invalid_image(format!(
            "image has a zero dimension: {width}x{height}"
        )));
    }

    match image {
        DynamicImage::ImageRgb8(rgb) => Ok(rgb),
        other => Err(ScreenError::invalid_image(format!(
            "expected an 8-bit RGB image, got {} channel(s)",
            other.color().channel_count()
        ))),
    }
}

fn compose_notes(score: f32, threshold: f32, label: &str) -> String {
    let framing = if (score - threshold).abs() < LOW_CONFIDENCE_MARGIN {
        "low-confidence"
    } else {
        "high-confidence"
    };
    format!(
        "Research output only: the model reported a {framing} reading of '{label}' \
         (score {score:.3}). This is an experimental research and educational \
         demonstration; it does not indicate the presence or absence of disease \
         and must not be used to make medical decisions."
    )
}

/// Builder for [`ChestScreener`].
pub struct ChestScreenerBuilder {
    config: ScreenerConfig,
}

impl ChestScreenerBuilder {
    /// Creates a builder with the default configuration.
    pub fn new() -> Self {
        Self {
            config: ScreenerConfig::default(),
        }
    }

    /// Starts from an existing configuration.
    pub fn from_config(config: ScreenerConfig) -> Self {
        Self { config }
    }

    /// Sets the logical model name.
    pub fn model_name(mut self, model_name: impl Into<String>) -> Self {
        self.config.model_name = Some(model_name.into());
        self
    }

    /// Sets the input shape as (width, height).
    pub fn input_shape(mut self, input_shape: (u32, u32)) -> Self {
        self.config.input_shape = input_shape;
        self
    }

    /// Sets the normalization recipe.
    pub fn normalization(mut self, scale: f32, mean: Vec<f32>, std: Vec<f32>) -> Self {
        self.config.scale = scale;
        self.config.mean = mean;
        self.config.std = std;
        self
    }

    /// Sets the score activation.
    pub fn activation(mut self, activation: ScoreActivation) -> Self {
        self.config.activation = activation;
        self
    }

    /// Sets the decision threshold.
    pub fn threshold(mut self, threshold: f32) -> Self {
        self.config.threshold = threshold;
        self
    }

    /// Sets the decision labels.
    pub fn labels(mut self, labels: ClassLabels) -> Self {
        self.config.labels = labels;
        self
    }

    /// Sets ONNX Runtime session tuning.
    pub fn session_options(mut self, options: crate::core::config::SessionOptions) -> Self {
        self.config.session = Some(options);
        self
    }

    /// Validates the configuration and loads the artifact.
    pub fn build(self, model_path: &Path) -> ScreenResult<ChestScreener> {
        ChestScreener::new(self.config, model_path)
    }
}

impl Default for ChestScreenerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grayscale_input_is_invalid() {
        let image = DynamicImage::new_luma8(64, 64);
        let result = validate_image(&image);
        assert!(matches!(result, Err(ScreenError::InvalidImage { .. })));
    }

    #[test]
    fn rgba_input_is_invalid() {
        let image = DynamicImage::new_rgba8(64, 64);
        let result = validate_image(&image);
        assert!(matches!(result, Err(ScreenError::InvalidImage { .. })));
    }

    #[test]
    fn zero_size_input_is_invalid() {
        let image = DynamicImage::new_rgb8(0, 37);
        let result = validate_image(&image);
        assert!(matches!(result, Err(ScreenError::InvalidImage { .. })));
    }

    #[test]
    fn rgb_input_passes_validation() {
        let image = DynamicImage::new_rgb8(64, 48);
        let rgb = validate_image(&image).unwrap();
        assert_eq!(rgb.dimensions(), (64, 48));
    }

    #[test]
    fn notes_use_low_confidence_framing_near_the_threshold() {
        let notes = compose_notes(0.55, 0.5, "atypical-pattern");
        assert!(notes.contains("low-confidence"));
        assert!(notes.contains("0.550"));
    }

    #[test]
    fn notes_use_high_confidence_framing_far_from_the_threshold() {
        let notes = compose_notes(0.97, 0.5, "atypical-pattern");
        assert!(notes.contains("high-confidence"));
    }

    #[test]
    fn notes_always_carry_the_research_disclaimer() {
        for score in [0.01f32, 0.5, 0.99] {
            let notes = compose_notes(score, 0.5, "typical-pattern");
            assert!(notes.contains("does not indicate the presence or absence of disease"));
            assert!(notes.contains("research"));
        }
    }

    #[test]
    fn builder_rejects_invalid_config_before_touching_the_artifact() {
        let result = ChestScreenerBuilder::new()
            .threshold(2.0)
            .build(Path::new("model/definitely-missing.onnx"));
        assert!(matches!(result, Err(ScreenError::ConfigError { .. })));
    }

    #[test]
    fn builder_surfaces_missing_artifacts() {
        let result = ChestScreenerBuilder::new().build(Path::new("model/definitely-missing.onnx"));
        assert!(matches!(result, Err(ScreenError::ArtifactNotFound { .. })));
    }

    #[test]
    fn screening_result_serializes_for_display_layers() {
        let result = ScreeningResult {
            score: 0.742,
            label: "atypical-pattern".to_string(),
            notes: "Research output only.".to_string(),
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"score\":0.742"));
        assert!(json.contains("atypical-pattern"));
    }
}
