//! Error types for the screening pipeline.
//!
//! Load-time failures (`ArtifactNotFound`, `UnsupportedFormat`,
//! `ArtifactCorrupt`) are fatal to that load attempt; call-time failures
//! (`InvalidImage`, `Inference`, `Processing`) are fatal to that call only.
//! Nothing here retries or degrades silently.

use std::path::PathBuf;
use thiserror::Error;

/// Stage of call-time processing an error occurred in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProcessingStage {
    /// Error occurred during image resizing.
    Resize,
    /// Error occurred during image normalization.
    Normalization,
    /// Error occurred during post-processing of model output.
    PostProcessing,
    /// Generic processing error.
    Generic,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::Resize => write!(f, "resize"),
            ProcessingStage::Normalization => write!(f, "normalization"),
            ProcessingStage::PostProcessing => write!(f, "post-processing"),
            ProcessingStage::Generic => write!(f, "processing"),
        }
    }
}

/// Errors surfaced by model loading and screening inference.
#[derive(Error, Debug)]
pub enum ScreenError {
    /// The artifact path does not resolve to a readable file.
    #[error("model artifact not found: {path}")]
    ArtifactNotFound {
        /// Path that failed to resolve.
        path: PathBuf,
    },

    /// The artifact's encoding is not one this crate consumes.
    #[error("unsupported model artifact format: {path}: {detail}")]
    UnsupportedFormat {
        /// Path to the rejected artifact.
        path: PathBuf,
        /// What was found instead of a supported encoding.
        detail: String,
    },

    /// The artifact exists but could not be deserialized into a session.
    #[error("model artifact could not be loaded: {path}: {reason}")]
    ArtifactCorrupt {
        /// Path to the artifact.
        path: PathBuf,
        /// Short reason description.
        reason: String,
        /// The underlying deserialization error, when one exists.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The input image cannot be preprocessed.
    #[error("invalid image: {message}")]
    InvalidImage {
        /// A message describing the invalid input.
        message: String,
    },

    /// Model evaluation failed.
    #[error("inference failed for model '{model_name}': {context}")]
    Inference {
        /// Name of the model being evaluated.
        model_name: String,
        /// Additional context about the failure.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A call-time processing step failed.
    #[error("{stage} failed: {context}")]
    Processing {
        /// The stage where the error occurred.
        stage: ProcessingStage,
        /// Additional context about the error.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Invalid configuration.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// Error occurred while decoding an image.
    #[error("image decode")]
    ImageDecode(#[source] image::ImageError),

    /// Error from the ONNX Runtime session.
    #[error(transparent)]
    Session(#[from] ort::Error),

    /// Error from tensor operations.
    #[error("tensor operation")]
    Tensor(#[from] ndarray::ShapeError),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

/// Convenient result alias for screening operations.
pub type ScreenResult<T> = Result<T, ScreenError>;

/// A plain string error for wrapping conditions that have no source error.
#[derive(Debug)]
pub struct SimpleError(String);

impl SimpleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl std::fmt::Display for SimpleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for SimpleError {}

impl ScreenError {
    /// Creates an error for an artifact path that does not resolve.
    pub fn artifact_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ArtifactNotFound { path: path.into() }
    }

    /// Creates an error for an artifact with an unrecognized encoding.
    pub fn unsupported_format(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            path: path.into(),
            detail: detail.into(),
        }
    }

    /// Creates an error for an artifact that failed to deserialize.
    pub fn artifact_corrupt(
        path: impl Into<PathBuf>,
        reason: impl Into<String>,
        source: Option<impl std::error::Error + Send + Sync + 'static>,
    ) -> Self {
        Self::ArtifactCorrupt {
            path: path.into(),
            reason: reason.into(),
            source: source.map(|e| Box::new(e) as _),
        }
    }

    /// Creates an error for input that cannot be preprocessed.
    pub fn invalid_image(message: impl Into<String>) -> Self {
        Self::InvalidImage {
            message: message.into(),
        }
    }

    /// Creates an error for a failed model evaluation.
    pub fn inference_error(
        model_name: impl Into<String>,
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Inference {
            model_name: model_name.into(),
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Creates an error for a failed processing step.
    pub fn processing_error(
        stage: ProcessingStage,
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            stage,
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Creates an error for post-processing operations.
    pub fn post_processing(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::processing_error(ProcessingStage::PostProcessing, context, source)
    }

    /// Creates an error for a configuration problem.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }
}

impl From<image::ImageError> for ScreenError {
    fn from(error: image::ImageError) -> Self {
        Self::ImageDecode(error)
    }
}

impl From<ort::Error<ort::session::builder::SessionBuilder>> for ScreenError {
    fn from(error: ort::Error<ort::session::builder::SessionBuilder>) -> Self {
        Self::Session(error.into())
    }
}

impl From<crate::core::config::ConfigError> for ScreenError {
    fn from(error: crate::core::config::ConfigError) -> Self {
        Self::ConfigError {
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_not_found_names_the_path() {
        let err = ScreenError::artifact_not_found("model/missing.onnx");
        assert!(err.to_string().contains("missing.onnx"));
    }

    #[test]
    fn corrupt_artifact_without_source_is_displayable() {
        let err = ScreenError::artifact_corrupt(
            "model/bad.onnx",
            "truncated protobuf",
            None::<std::io::Error>,
        );
        let text = err.to_string();
        assert!(text.contains("bad.onnx"));
        assert!(text.contains("truncated protobuf"));
    }

    #[test]
    fn processing_stage_display_is_stable() {
        assert_eq!(ProcessingStage::Normalization.to_string(), "normalization");
        assert_eq!(
            ProcessingStage::PostProcessing.to_string(),
            "post-processing"
        );
    }
}
