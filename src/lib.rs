//! # anylung
//!
//! A Rust library that runs screening inference over chest images using a
//! pretrained ONNX classification artifact. The artifact is loaded once
//! into an in-memory, ready-to-evaluate model; each inference call
//! preprocesses one decoded RGB image, forward-passes it, and produces an
//! immutable result with a confidence score, a discrete label, and
//! research-disclosure notes.
//!
//! The output is research/educational material, not a diagnosis: the score
//! is the model's self-reported confidence, and the enclosing application
//! is responsible for presenting it read-only with its disclaimer.
//!
//! ## Modules
//!
//! * [`core`] - Errors, configuration, and ONNX session handling
//! * [`processors`] - Resize, normalization, and score post-processing
//! * [`screener`] - The screening predictor and its result type
//! * [`utils`] - Image loading/decoding and logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use anylung::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load the artifact once; hold the screener at the composition root
//! // and pass it by reference into request handlers.
//! let model = load_model("model/anylung.onnx")?;
//!
//! let image = decode_image(&std::fs::read("chest.png")?)?;
//! let result = run_inference(&model, &image)?;
//!
//! println!("score: {:.3}", result.score);
//! println!("label: {}", result.label);
//! println!("{}", result.notes);
//! # Ok(())
//! # }
//! ```
//!
//! ## Pinning the artifact's contract
//!
//! The preprocessing constants, activation, and threshold belong to the
//! artifact's training contract. Deserialize a [`ScreenerConfig`] from JSON
//! kept next to the artifact instead of relying on the defaults:
//!
//! ```rust,no_run
//! use anylung::core::ScreenerConfig;
//! use anylung::screener::ChestScreenerBuilder;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let json = std::fs::read_to_string("model/anylung.contract.json")?;
//! let config = ScreenerConfig::from_json(&json)?;
//! let model = ChestScreenerBuilder::from_config(config).build("model/anylung.onnx".as_ref())?;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod processors;
pub mod screener;
pub mod utils;

use crate::core::ScreenerConfig;
use crate::core::errors::ScreenResult;
use crate::screener::{ChestScreener, ScreeningResult};
use image::DynamicImage;
use std::path::Path;

/// Loads a screening model from an artifact path with the default
/// configuration.
///
/// Invoke once per process and hold the result; the returned screener is
/// immutable and `Send + Sync`, so it can be shared behind `Arc` across
/// request handlers.
///
/// # Errors
///
/// * `ArtifactNotFound` - the path does not resolve to a file.
/// * `UnsupportedFormat` - the artifact is not ONNX.
/// * `ArtifactCorrupt` - deserialization failed.
pub fn load_model(path: impl AsRef<Path>) -> ScreenResult<ChestScreener> {
    ChestScreener::new(ScreenerConfig::default(), path.as_ref())
}

/// Runs one screening inference over a decoded RGB image.
///
/// Blocks the caller until complete; there is no background work and no
/// retry. Identical model and image yield an identical score and label.
///
/// # Errors
///
/// * `InvalidImage` - the image cannot be preprocessed.
/// * `Inference` / `Processing` - model evaluation or a pipeline stage
///   failed.
pub fn run_inference(
    model: &ChestScreener,
    image: &DynamicImage,
) -> ScreenResult<ScreeningResult> {
    model.run(image)
}

/// Prelude module for convenient imports.
///
/// ```rust
/// use anylung::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::{ScreenError, ScreenResult, ScreenerConfig};
    pub use crate::screener::{ChestScreener, ChestScreenerBuilder, ScreeningResult};
    pub use crate::utils::{decode_image, load_image};
    pub use crate::{load_model, run_inference};
}
