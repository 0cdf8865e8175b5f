//! # Inference Backend
//!
//! This module provides the interface the pipeline drives an inference
//! engine through, so batch construction and execution stay independent of
//! any one runtime.
//!
//! ## Feature Flags
//!
//! - `onnx`: Enables the ONNX Runtime engine built on the `ort` crate
//!
//! ## Usage
//!
//! 1. Implement [`InferenceEngine`] (or enable `onnx`)
//! 2. Hand the engine to a [`Pipeline`](crate::pipeline::Pipeline)
//! 3. Every tensor the pipeline creates for a call is wrapped in a
//!    [`ScopedTensor`] and released before the call returns

mod core_trait;
mod scoped;

#[cfg_attr(docsrs, doc(cfg(feature = "onnx")))]
#[cfg(feature = "onnx")]
/// ONNX Runtime engine implementation.
///
/// This module is only available when the `onnx` feature flag is enabled.
/// It wraps an `ort` session and exposes the model's declared inputs and
/// outputs as [`TensorInfo`].
pub mod onnx;

pub use core_trait::*;
pub use scoped::ScopedTensor;

#[cfg(test)]
/// Mock engine implementation.
///
/// Operates on plain vectors and counts live tensor handles
pub(crate) mod mock;
