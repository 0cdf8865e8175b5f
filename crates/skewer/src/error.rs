//! # Pipeline Errors
//!
//! Every failure aborts the call it happened in and is handed back to the
//! caller. Nothing in this crate retries. Each error names the [`Stage`]
//! that produced it so a serving layer can tell a bad model apart from a
//! bad input.

use std::fmt;

use thiserror::Error;

use crate::backend::EngineError;
use crate::tokenizer::TokenizerError;

/// Result alias used throughout the pipeline.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// The stage of the pipeline in which a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Loading artifacts or validating the model binding
    Load,
    /// Tokenizing raw input strings
    Preprocess,
    /// Building or wrapping input/output tensors
    Construction,
    /// Running the inference engine
    Execution,
    /// Releasing a transient tensor handle
    Release,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Preprocess => "preprocess",
            Stage::Construction => "construction",
            Stage::Execution => "execution",
            Stage::Release => "release",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by [`Pipeline`](crate::pipeline::Pipeline) operations.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The pipeline could not be made ready: missing artifact, bad options,
    /// unsupported declared input, unresolvable output dimension
    #[error("failed to load pipeline: {0}")]
    Load(String),

    /// The tokenizer rejected one of the inputs
    #[error("tokenization failed for input {index}: {source}")]
    Tokenization {
        index: usize,
        #[source]
        source: TokenizerError,
    },

    /// A batch or output buffer does not have the length its shape implies
    #[error("shape mismatch for {tensor}: expected {expected} elements, found {actual}")]
    Shape {
        tensor: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The engine could not allocate a transient tensor
    #[error("tensor construction failed: {0}")]
    Allocation(#[source] EngineError),

    /// The model declares an input outside the recognized role table
    #[error("unsupported model input `{0}`")]
    UnsupportedInput(String),

    /// The engine reported a failure while running the forward pass
    #[error("inference engine failed: {0}")]
    Execution(#[source] EngineError),

    /// The engine returned an output buffer of the wrong size
    #[error("engine output has {actual} elements, expected {expected}")]
    OutputMismatch { expected: usize, actual: usize },

    /// A transient tensor handle could not be released
    #[error("failed to release tensor: {0}")]
    Release(#[source] EngineError),
}

impl PipelineError {
    /// The stage that produced this error.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Load(_) => Stage::Load,
            PipelineError::Tokenization { .. } => Stage::Preprocess,
            PipelineError::Shape { .. }
            | PipelineError::Allocation(_)
            | PipelineError::UnsupportedInput(_) => Stage::Construction,
            PipelineError::Execution(_) | PipelineError::OutputMismatch { .. } => Stage::Execution,
            PipelineError::Release(_) => Stage::Release,
        }
    }
}
