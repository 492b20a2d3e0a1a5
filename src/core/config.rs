//! Configuration for the screening pipeline.
//!
//! The preprocessing constants, activation, and decision threshold are owned
//! by the artifact's training contract. The defaults here are the
//! conventional ImageNet recipe for a 224x224 classifier; a deploying
//! operator pins the artifact's documented contract by deserializing a
//! `ScreenerConfig` from JSON kept next to the artifact.

use crate::processors::{ClassLabels, ScoreActivation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error indicating that a configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// A message describing the problem.
        message: String,
    },

    /// Error indicating that a configuration could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Graph optimization levels for ONNX Runtime session creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphOptLevel {
    /// Disable all optimizations.
    DisableAll,
    /// Enable basic optimizations.
    Level1,
    /// Enable extended optimizations.
    Level2,
    /// Enable all optimizations.
    Level3,
}

impl Default for GraphOptLevel {
    fn default() -> Self {
        Self::Level1
    }
}

/// CPU-only tuning for the ONNX Runtime session.
///
/// Only applied when set; unset fields keep ONNX Runtime defaults. There is
/// deliberately no execution-provider selection here: artifacts are loaded
/// onto the CPU execution context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Number of threads used to parallelize execution within nodes.
    pub intra_threads: Option<usize>,
    /// Number of threads used to parallelize execution across nodes.
    pub inter_threads: Option<usize>,
    /// Graph optimization level.
    pub optimization_level: Option<GraphOptLevel>,
}

impl SessionOptions {
    /// Creates session options with ONNX Runtime defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of intra-op threads.
    pub fn with_intra_threads(mut self, threads: usize) -> Self {
        self.intra_threads = Some(threads);
        self
    }

    /// Sets the number of inter-op threads.
    pub fn with_inter_threads(mut self, threads: usize) -> Self {
        self.inter_threads = Some(threads);
        self
    }

    /// Sets the graph optimization level.
    pub fn with_optimization_level(mut self, level: GraphOptLevel) -> Self {
        self.optimization_level = Some(level);
        self
    }
}

/// Configuration for [`ChestScreener`](crate::screener::ChestScreener).
///
/// Every numeric field participates in the preprocessing or decision
/// contract and must match what the artifact was trained with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenerConfig {
    /// Logical model name used in logs and error context (optional).
    #[serde(default)]
    pub model_name: Option<String>,
    /// Input shape the model expects, as (width, height).
    pub input_shape: (u32, u32),
    /// Pixel scaling factor applied before mean/std normalization.
    pub scale: f32,
    /// Per-channel mean, RGB order.
    pub mean: Vec<f32>,
    /// Per-channel standard deviation, RGB order.
    pub std: Vec<f32>,
    /// Mapping from the model's raw output row to a scalar score.
    #[serde(default)]
    pub activation: ScoreActivation,
    /// Decision threshold: score >= threshold yields the positive label.
    pub threshold: f32,
    /// Labels for the two sides of the threshold.
    #[serde(default)]
    pub labels: ClassLabels,
    /// Optional ONNX Runtime session tuning.
    #[serde(default)]
    pub session: Option<SessionOptions>,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            model_name: Some("anylung".to_string()),
            input_shape: (224, 224),
            scale: 1.0 / 255.0,
            mean: vec![0.485, 0.456, 0.406],
            std: vec![0.229, 0.224, 0.225],
            activation: ScoreActivation::default(),
            threshold: 0.5,
            labels: ClassLabels::default(),
            session: None,
        }
    }
}

impl ScreenerConfig {
    /// Creates a configuration with the default 224x224 ImageNet recipe.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Rejects zero input dimensions, non-positive scale or std values,
    /// mean/std vectors that are not 3-channel, thresholds outside [0, 1],
    /// and empty labels.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (width, height) = self.input_shape;
        if width == 0 || height == 0 {
            return Err(ConfigError::invalid(format!(
                "input shape must be non-zero, got {width}x{height}"
            )));
        }

        if self.scale <= 0.0 || !self.scale.is_finite() {
            return Err(ConfigError::invalid(format!(
                "scale must be a positive finite number, got {}",
                self.scale
            )));
        }

        if self.mean.len() != 3 {
            return Err(ConfigError::invalid(
                "mean must have exactly 3 elements for RGB",
            ));
        }

        if self.std.len() != 3 {
            return Err(ConfigError::invalid(
                "std must have exactly 3 elements for RGB",
            ));
        }

        for (i, &s) in self.std.iter().enumerate() {
            if s <= 0.0 || !s.is_finite() {
                return Err(ConfigError::invalid(format!(
                    "std at index {i} must be greater than 0, got {s}"
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.threshold) || !self.threshold.is_finite() {
            return Err(ConfigError::invalid(format!(
                "threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }

        if self.labels.positive.is_empty() || self.labels.negative.is_empty() {
            return Err(ConfigError::invalid("labels must be non-empty"));
        }

        Ok(())
    }
}
