//! # Serving
//!
//! An async front that turns many single-text requests into padded batches.
//!
//! [`BatchedPipeline`] queues each submitted text and wakes a background
//! worker. The worker drains up to `S` texts, runs them through one
//! [`Pipeline::run`](crate::pipeline::Pipeline::run) call on tokio's
//! blocking pool, and answers every request through its own [`Item`].
//!
//! * [`worker`] - lifecycle of the background task ([`BatchWorkerHandle`])
//! * `batcher` - the queue, the batching loop and [`BatchedPipeline`]
//! * `item` - the awaitable per-request result

mod batcher;
mod item;
mod queue_item;
pub mod worker;

use std::sync::Arc;

use thiserror::Error;

use crate::error::PipelineError;

pub use batcher::{BatchedPipeline, Batcher};
pub use item::Item;
pub use worker::BatchWorkerHandle;

/// Why a queued request produced no row.
#[derive(Debug, Clone, Error)]
pub enum ServeError {
    /// The batch holding this request failed; shared by every request in it
    #[error("batch failed: {0}")]
    Pipeline(#[source] Arc<PipelineError>),

    #[error("batch worker stopped before answering")]
    WorkerGone,

    #[error("batch worker panicked")]
    WorkerPanicked,
}
