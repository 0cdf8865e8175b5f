//! # Pipeline
//!
//! A [`Pipeline`] owns everything one loaded model needs: the inference
//! engine, the tokenizer, the [`ModelBinding`] describing the model's
//! declared inputs/outputs, and one [`Timings`] per stage. Those live in a
//! [`ModelContext`] and are released together when the pipeline is dropped.
//!
//! The two entry points are [`Pipeline::preprocess`], which tokenizes input
//! strings and builds padded batch tensors, and [`Pipeline::forward`], which
//! runs the model over such a batch.
//!
//! ## Concurrency
//!
//! Both entry points take `&self` and block the calling thread. Any number
//! of threads may call into one pipeline at once; the only state they share
//! and mutate is the two timing counters, updated with atomic adds.
//!
//! # Example
//!
//! ```ignore
//! use skewer::pipeline::Pipeline;
//! use skewer::config::PipelineConfig;
//!
//! let pipeline = Pipeline::load("models/bert-base-ner", PipelineConfig::named("ner"))?;
//! let batch = pipeline.preprocess(&["hello", "hello world today"])?;
//! assert_eq!(batch.max_sequence(), 5);
//!
//! let batch = pipeline.forward(batch)?;
//! for row in batch.output_rows() {
//!     // row.len() == max_sequence * output_dim
//! }
//! ```

mod forward;

#[cfg(all(feature = "onnx", feature = "tokenizers"))]
mod load;

use std::time::Instant;

use log::{debug, info};
use serde::Serialize;

use crate::backend::InferenceEngine;
use crate::batch::PipelineBatch;
use crate::binding::ModelBinding;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::record::TokenizedInput;
use crate::tensor::build_batch;
use crate::timing::{TimingSnapshot, Timings};
use crate::tokenizer::TextTokenizer;

/// Shared execution context of a pipeline.
pub struct ModelContext<E, T> {
    engine: E,
    tokenizer: T,
    binding: ModelBinding,
    tokenizer_timings: Timings,
    pipeline_timings: Timings,
}

impl<E, T> ModelContext<E, T>
where
    E: InferenceEngine,
    T: TextTokenizer,
{
    /// Bind an engine and tokenizer, failing if the model is not usable.
    pub fn new(engine: E, tokenizer: T, output_dim: Option<usize>) -> Result<Self> {
        let binding = ModelBinding::from_engine(&engine, output_dim)?;
        Ok(Self {
            engine,
            tokenizer,
            binding,
            tokenizer_timings: Timings::new(),
            pipeline_timings: Timings::new(),
        })
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn tokenizer(&self) -> &T {
        &self.tokenizer
    }

    pub fn binding(&self) -> &ModelBinding {
        &self.binding
    }

    /// Counter for tokenization plus batch construction
    pub fn tokenizer_timings(&self) -> &Timings {
        &self.tokenizer_timings
    }

    /// Counter for inference execution
    pub fn pipeline_timings(&self) -> &Timings {
        &self.pipeline_timings
    }
}

/// Per-stage counters of a pipeline at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PipelineStatistics {
    pub tokenizer: TimingSnapshot,
    pub pipeline: TimingSnapshot,
}

/// Tokenizes text, builds padded batches and runs the model over them.
pub struct Pipeline<E, T> {
    config: PipelineConfig,
    context: ModelContext<E, T>,
}

impl<E, T> Pipeline<E, T>
where
    E: InferenceEngine,
    T: TextTokenizer,
{
    /// Build a pipeline around an already loaded engine and tokenizer.
    pub fn new(engine: E, tokenizer: T, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let context = ModelContext::new(engine, tokenizer, config.output_dim)?;
        info!(
            "Pipeline {} ready: inputs {:?}, output `{}` x {}",
            config.name,
            context.binding.input_names(),
            context.binding.output_name(),
            context.binding.output_dim()
        );
        Ok(Self { config, context })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn context(&self) -> &ModelContext<E, T> {
        &self.context
    }

    pub fn binding(&self) -> &ModelBinding {
        &self.context.binding
    }

    /// Width of the per-token output vector.
    pub fn output_dim(&self) -> usize {
        self.context.binding.output_dim()
    }

    /// Tokenize `inputs` and build a padded batch, preserving input order.
    ///
    /// Tokenization and tensor construction are timed together as one call.
    pub fn preprocess<S: AsRef<str>>(&self, inputs: &[S]) -> Result<PipelineBatch> {
        let start = Instant::now();

        let tokenized = inputs
            .iter()
            .enumerate()
            .map(|(index, input)| {
                let text = input.as_ref();
                let encoding = self
                    .context
                    .tokenizer
                    .encode(text, self.config.add_special_tokens)
                    .and_then(|encoding| encoding.check_aligned().map(|_| encoding))
                    .map_err(|source| PipelineError::Tokenization { index, source })?;
                Ok(TokenizedInput::new(text, encoding))
            })
            .collect::<Result<Vec<_>>>()?;

        let batch = build_batch(tokenized, &self.context.binding);

        let elapsed = start.elapsed();
        self.context.tokenizer_timings.record_call(elapsed);
        debug!(
            "{}: preprocessed {} inputs to {}x{} in {:?}",
            self.config.name,
            batch.len(),
            batch.len(),
            batch.max_sequence(),
            elapsed
        );
        Ok(batch)
    }

    /// Run the model over a batch from [`preprocess`](Pipeline::preprocess).
    ///
    /// The batch comes back with its output tensor filled, or not at all.
    pub fn forward(&self, batch: PipelineBatch) -> Result<PipelineBatch> {
        forward::forward_batch(
            &self.context.engine,
            &self.context.binding,
            &self.context.pipeline_timings,
            batch,
        )
    }

    /// [`preprocess`](Pipeline::preprocess) followed by [`forward`](Pipeline::forward).
    pub fn run<S: AsRef<str>>(&self, inputs: &[S]) -> Result<PipelineBatch> {
        let batch = self.preprocess(inputs)?;
        self.forward(batch)
    }

    pub fn statistics(&self) -> PipelineStatistics {
        PipelineStatistics {
            tokenizer: self.context.tokenizer_timings.snapshot(),
            pipeline: self.context.pipeline_timings.snapshot(),
        }
    }
}

impl<E, T> Drop for Pipeline<E, T> {
    fn drop(&mut self) {
        debug!(
            "Tearing down pipeline {} after {} forward calls",
            self.config.name,
            self.context.pipeline_timings.num_calls()
        );
    }
}
