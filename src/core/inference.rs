//! ONNX Runtime session loading and evaluation.
//!
//! [`OnnxModel`] is the deserialized artifact: one CPU session plus the
//! tensor names discovered from its metadata. It is immutable after load
//! and `Send + Sync`, so a composition root can construct it once and share
//! it behind `Arc` across request handlers.

use crate::core::config::{GraphOptLevel, SessionOptions};
use crate::core::errors::{ScreenError, ScreenResult, SimpleError};
use ndarray::{Array2, Array4, ArrayView2};
use ort::logging::LogLevel;
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::TensorRef;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// A pretrained classification artifact, deserialized and ready to evaluate.
pub struct OnnxModel {
    // ort sessions need exclusive access to run; the wrapper stays shareable.
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    model_name: String,
    model_path: PathBuf,
}

impl std::fmt::Debug for OnnxModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxModel")
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .field("model_name", &self.model_name)
            .field("model_path", &self.model_path)
            .finish()
    }
}

fn optimization_level(level: GraphOptLevel) -> GraphOptimizationLevel {
    match level {
        GraphOptLevel::DisableAll => GraphOptimizationLevel::Disable,
        GraphOptLevel::Level1 => GraphOptimizationLevel::Level1,
        GraphOptLevel::Level2 => GraphOptimizationLevel::Level2,
        GraphOptLevel::Level3 => GraphOptimizationLevel::Level3,
    }
}

impl OnnxModel {
    /// Deserializes an artifact into a ready-to-evaluate CPU session.
    ///
    /// # Errors
    ///
    /// * `ArtifactNotFound` - the path does not resolve to a file.
    /// * `UnsupportedFormat` - the file is not an `.onnx` artifact.
    /// * `ArtifactCorrupt` - deserialization failed, or the model declares
    ///   no input or output tensors. A partially initialized model is never
    ///   returned.
    pub fn load(
        path: &Path,
        model_name: Option<&str>,
        options: Option<&SessionOptions>,
    ) -> ScreenResult<Self> {
        if !path.is_file() {
            return Err(ScreenError::artifact_not_found(path));
        }

        let extension = path.extension().and_then(std::ffi::OsStr::to_str);
        if !extension.is_some_and(|ext| ext.eq_ignore_ascii_case("onnx")) {
            return Err(ScreenError::unsupported_format(
                path,
                format!(
                    "expected an .onnx artifact, got '{}'",
                    extension.unwrap_or("no extension")
                ),
            ));
        }

        let mut builder = Session::builder()?.with_log_level(LogLevel::Error)?;
        if let Some(opts) = options {
            if let Some(threads) = opts.intra_threads {
                builder = builder.with_intra_threads(threads)?;
            }
            if let Some(threads) = opts.inter_threads {
                builder = builder.with_inter_threads(threads)?;
            }
            if let Some(level) = opts.optimization_level {
                builder = builder.with_optimization_level(optimization_level(level))?;
            }
        }

        let session = builder.commit_from_file(path).map_err(|e| {
            ScreenError::artifact_corrupt(path, "failed to deserialize ONNX session", Some(e))
        })?;

        let input_name = session
            .inputs()
            .first()
            .map(|input| input.name().to_string())
            .ok_or_else(|| {
                ScreenError::artifact_corrupt(path, "model declares no inputs", None::<SimpleError>)
            })?;
        let output_name = session
            .outputs()
            .first()
            .map(|output| output.name().to_string())
            .ok_or_else(|| {
                ScreenError::artifact_corrupt(
                    path,
                    "model declares no outputs",
                    None::<SimpleError>,
                )
            })?;

        let model_name = model_name
            .map(str::to_string)
            .or_else(|| {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(String::from)
            })
            .unwrap_or_else(|| "model".to_string());

        debug!(
            model = %model_name,
            path = %path.display(),
            input = %input_name,
            output = %output_name,
            "loaded screening artifact"
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            model_name,
            model_path: path.to_path_buf(),
        })
    }

    /// Returns the logical model name.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Returns the path the artifact was loaded from.
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Forward-passes a `(1, C, H, W)` tensor and returns the
    /// `(batch, classes)` output.
    ///
    /// Output rank and element count are validated before reshaping; a
    /// mismatch is an `Inference` error, not a garbage tensor.
    pub fn infer_2d(&self, x: &Array4<f32>) -> ScreenResult<Array2<f32>> {
        let input_shape = x.shape().to_vec();

        let input_tensor = TensorRef::from_array_view(x.view()).map_err(|e| {
            ScreenError::inference_error(
                &self.model_name,
                format!("failed to convert input tensor with shape {input_shape:?}"),
                e,
            )
        })?;
        let inputs = ort::inputs![self.input_name.as_str() => input_tensor];

        let mut session = self.session.lock().map_err(|_| {
            ScreenError::inference_error(
                &self.model_name,
                "failed to acquire session lock",
                SimpleError::new("session lock poisoned"),
            )
        })?;

        let outputs = session.run(inputs).map_err(|e| {
            ScreenError::inference_error(
                &self.model_name,
                format!("forward pass failed for input shape {input_shape:?}"),
                e,
            )
        })?;

        let (output_shape, output_data) = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| {
                ScreenError::inference_error(
                    &self.model_name,
                    format!("failed to extract output tensor '{}' as f32", self.output_name),
                    e,
                )
            })?;

        if output_shape.len() != 2 {
            return Err(ScreenError::inference_error(
                &self.model_name,
                format!(
                    "expected a 2D (batch, classes) output, got {}D with shape {output_shape:?}",
                    output_shape.len()
                ),
                SimpleError::new("output tensor rank mismatch"),
            ));
        }

        let batch = output_shape[0] as usize;
        let classes = output_shape[1] as usize;
        if output_data.len() != batch * classes {
            return Err(ScreenError::inference_error(
                &self.model_name,
                format!(
                    "output data size mismatch: expected {}, got {}",
                    batch * classes,
                    output_data.len()
                ),
                SimpleError::new("output tensor data size mismatch"),
            ));
        }

        let view = ArrayView2::from_shape((batch, classes), output_data)
            .map_err(ScreenError::Tensor)?;
        Ok(view.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_file(name: &str, contents: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("anylung-{}-{name}", std::process::id()));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn missing_artifact_is_not_found() {
        let result = OnnxModel::load(Path::new("model/definitely-missing.onnx"), None, None);
        assert!(matches!(result, Err(ScreenError::ArtifactNotFound { .. })));
    }

    #[test]
    fn non_onnx_extension_is_unsupported() {
        let path = scratch_file("weights.pth", b"not a model");
        let result = OnnxModel::load(&path, None, None);
        fs::remove_file(&path).ok();
        assert!(matches!(result, Err(ScreenError::UnsupportedFormat { .. })));
    }

    #[test]
    fn extensionless_file_is_unsupported() {
        let path = scratch_file("weights", b"not a model");
        let result = OnnxModel::load(&path, None, None);
        fs::remove_file(&path).ok();
        assert!(matches!(result, Err(ScreenError::UnsupportedFormat { .. })));
    }

    #[test]
    fn garbage_onnx_file_is_corrupt() {
        let path = scratch_file("garbage.onnx", b"\x00\x01truncated nonsense");
        let result = OnnxModel::load(&path, None, Some(&SessionOptions::new()));
        fs::remove_file(&path).ok();
        assert!(matches!(result, Err(ScreenError::ArtifactCorrupt { .. })));
    }
}
