//! # Skewer
//!
//! Padded **batch** inference over tokenized text: strings go in, one
//! `max_sequence x output_dim` block of engine output per string comes out.
//!
//! ## Overview
//!
//! A [`Pipeline`](pipeline::Pipeline) owns one loaded model. Each call
//! tokenizes an ordered list of strings, pads them into shared row-major
//! tensors, runs the model once over the whole batch and hands back the
//! output tensor alongside the tokenized inputs. Each stage keeps its own
//! call counter and cumulative time.
//!
//! Key components include:
//!
//! - A batch builder that pads every row to the longest attended sequence
//! - An executor that binds only the inputs the model declares
//! - Lock-free timing counters shared by concurrent callers
//! - An async batching front that collects single requests into batches
//!
//! ## Architecture
//!
//! ### Assumptions
//! Every tensor reserves two dimensions with special meanings:
//!  - The `0th` dimension is the batch dimension
//!  - The `1st` dimension is the sequence dimension
//!  - The output tensor adds the per-token output as its `2nd` dimension
//!
//! ### Seams
//!
//! The [`InferenceEngine`](backend::InferenceEngine) and
//! [`TextTokenizer`](tokenizer::TextTokenizer) traits are the only contact
//! points with the outside world. The pipeline never sees a concrete
//! runtime, so the batching and padding logic is tested against in-crate
//! mocks.
//!
//! ### Padding
//!
//! The padded width of a batch is one past the largest index any input
//! attends to. Positions past an input's own length are zero in every input
//! tensor. Token type ids and the attention mask are only filled when the
//! model declares them.
//!
//! ## Features
//!
//! - **serving** (default) - Enables the async batching front on tokio
//! - **onnx** - Enables the ONNX Runtime engine
//! - **tokenizers** - Enables Hugging Face tokenizers
//!
//! With both `onnx` and `tokenizers`, `Pipeline::load` builds a pipeline from
//! a model directory.
//!
//! ## Implementation Details
//!
//! Every engine tensor created for a call is owned by a scoped guard and
//! released on all paths. Timing is recorded for successful calls only, so
//! `total_ns / num_calls` is the mean latency of completed work.

pub mod backend;
pub mod batch;
pub mod binding;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod tensor;
pub mod timing;
pub mod tokenizer;

#[cfg_attr(docsrs, doc(cfg(feature = "serving")))]
#[cfg(feature = "serving")]
pub mod serving;

/// Constants for client reference
pub use tensor::constant;

pub use batch::{PipelineBatch, RowOutput};
pub use config::PipelineConfig;
pub use error::{PipelineError, Result, Stage};
pub use pipeline::{Pipeline, PipelineStatistics};
pub use record::TokenizedInput;
