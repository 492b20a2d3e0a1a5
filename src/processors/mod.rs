//! Image processing for the screening pipeline.
//!
//! Preprocessing (resize, normalization) and postprocessing (score
//! activation, threshold decision) for a single classification model. Given
//! a fixed configuration, every function here is deterministic.
//!
//! # Modules
//!
//! * `normalization` - Per-channel normalization into an NCHW tensor
//! * `postprocess` - Raw model output to score, score to label
//! * `resize` - Resizing to the model's input shape

mod normalization;
mod postprocess;
mod resize;

pub use normalization::Normalize;
pub use postprocess::{ClassLabels, DecisionRule, ScoreActivation};
pub use resize::resize_to_input;
