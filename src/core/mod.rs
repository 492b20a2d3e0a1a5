//! Core components of the screening pipeline.
//!
//! This module contains the fundamental pieces:
//! - Configuration and validation
//! - Error handling
//! - ONNX Runtime session loading and evaluation
//!
//! It also re-exports the commonly used types for convenience.

pub mod config;
pub mod errors;
pub mod inference;

pub use config::{ConfigError, GraphOptLevel, ScreenerConfig, SessionOptions};
pub use errors::{ProcessingStage, ScreenError, ScreenResult, SimpleError};
pub use inference::OnnxModel;
