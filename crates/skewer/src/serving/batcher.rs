use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use log::{debug, error, warn};
use tokio::sync::{Mutex, Notify, oneshot};
use tokio::time::error::Elapsed;
use uuid::Uuid;

use super::ServeError;
use super::item::Item;
use super::queue_item::QueueItem;
use super::worker::BatchWorkerHandle;
use crate::backend::InferenceEngine;
use crate::batch::RowOutput;
use crate::pipeline::Pipeline;
use crate::tokenizer::TextTokenizer;

/// Queues single texts and answers each with its own output row.
#[async_trait]
pub trait Batcher {
    /// Queue `text` for the next batch.
    async fn run(&self, text: String) -> Item;
}

/// A [`Pipeline`] behind a background batching worker.
///
/// Callers submit one text at a time. The worker drains up to `S` queued
/// texts per batch, runs them through [`Pipeline::run`] on the blocking pool
/// and sends every caller its row. When the batch fails, every caller in it
/// receives the same error.
///
/// # Example
///
/// ```ignore
/// let pipeline = Arc::new(Pipeline::load("models/bert-base-ner", config)?);
/// let batcher = BatchedPipeline::<_, _, 32>::new(pipeline);
///
/// let row = batcher.run("hello world".to_string()).await.await?;
/// let first_token = row.token(0);
/// ```
pub struct BatchedPipeline<E, T, const S: usize> {
    pipeline: Arc<Pipeline<E, T>>,
    waiting_requests: Arc<Mutex<Vec<QueueItem>>>,
    handle: BatchWorkerHandle,
}

impl<E, T, const S: usize> BatchedPipeline<E, T, S>
where
    E: InferenceEngine + 'static,
    T: TextTokenizer + 'static,
{
    /// Spawn the batching worker. Must be called within a tokio runtime.
    pub fn new(pipeline: Arc<Pipeline<E, T>>) -> Self {
        let waiting_requests = Arc::new(Mutex::new(vec![]));

        let handle = BatchWorkerHandle::new({
            let waiting_requests = waiting_requests.clone();
            let pipeline = pipeline.clone();
            move |running, notifier| {
                tokio::spawn(async move {
                    batching_loop::<E, T, S>(pipeline, running, notifier, waiting_requests).await;
                })
            }
        });

        Self {
            pipeline,
            waiting_requests,
            handle,
        }
    }

    pub fn pipeline(&self) -> &Arc<Pipeline<E, T>> {
        &self.pipeline
    }

    /// Number of texts queued and not yet picked up by the worker.
    pub async fn waiting(&self) -> usize {
        self.waiting_requests.lock().await.len()
    }

    /// Queue every text and wait for all of their rows, in input order.
    pub async fn run_all<I>(&self, texts: I) -> Vec<Result<RowOutput, ServeError>>
    where
        I: IntoIterator<Item = String>,
    {
        let mut items = Vec::new();
        for text in texts {
            items.push(self.run(text).await);
        }
        join_all(items).await
    }
}

#[async_trait]
impl<E, T, const S: usize> Batcher for BatchedPipeline<E, T, S>
where
    E: InferenceEngine + 'static,
    T: TextTokenizer + 'static,
{
    async fn run(&self, text: String) -> Item {
        let (tx, rx) = oneshot::channel();
        let id = Uuid::new_v4();
        {
            let mut waiting = self.waiting_requests.lock().await;
            waiting.push(QueueItem::new(id, text, tx));
        }
        self.handle.notify();
        Item::new(id, rx)
    }
}

async fn batching_loop<E, T, const S: usize>(
    pipeline: Arc<Pipeline<E, T>>,
    running: Arc<AtomicBool>,
    notifier: Arc<Notify>,
    waiting_requests: Arc<Mutex<Vec<QueueItem>>>,
) where
    E: InferenceEngine + 'static,
    T: TextTokenizer + 'static,
{
    while running.load(Ordering::SeqCst) {
        let items = drain_possible_requests(S, &waiting_requests).await;
        if items.is_empty() {
            // timeout so a missed shutdown is still noticed
            let _ = timeout_await_notifier(&notifier).await;
            continue;
        }
        process_batch(pipeline.clone(), items).await;
    }

    let abandoned = waiting_requests.lock().await.drain(..).count();
    if abandoned > 0 {
        debug!("Batch worker stopped with {} queued requests", abandoned);
    }
}

async fn drain_possible_requests(
    batch_size: usize,
    waiting_requests: &Mutex<Vec<QueueItem>>,
) -> Vec<QueueItem> {
    let mut requests = waiting_requests.lock().await;
    let items_to_take = batch_size.min(requests.len());
    requests.drain(0..items_to_take).collect()
}

#[inline]
async fn timeout_await_notifier(notifier: &Notify) -> Result<(), Elapsed> {
    tokio::time::timeout(Duration::from_millis(100), notifier.notified()).await
}

async fn process_batch<E, T>(pipeline: Arc<Pipeline<E, T>>, items: Vec<QueueItem>)
where
    E: InferenceEngine + 'static,
    T: TextTokenizer + 'static,
{
    let mut ids = Vec::with_capacity(items.len());
    let mut texts = Vec::with_capacity(items.len());
    let mut senders = Vec::with_capacity(items.len());
    for item in items {
        let (id, text, sender) = item.into_parts();
        ids.push(id);
        texts.push(text);
        senders.push(sender);
    }

    let result = tokio::task::spawn_blocking(move || pipeline.run(&texts)).await;

    match result {
        Ok(Ok(batch)) => {
            for ((id, sender), row) in ids.into_iter().zip(senders).zip(batch.into_rows()) {
                if sender.send(Ok(row)).is_err() {
                    debug!("Request {} dropped before its row arrived", id);
                }
            }
        }
        Ok(Err(e)) => {
            warn!("Batch of {} requests failed: {}", ids.len(), e);
            let shared = Arc::new(e);
            for sender in senders {
                let _ = sender.send(Err(ServeError::Pipeline(shared.clone())));
            }
        }
        Err(e) => {
            error!("Pipeline panicked on a batch of {} requests: {}", ids.len(), e);
            for sender in senders {
                let _ = sender.send(Err(ServeError::WorkerPanicked));
            }
        }
    }
}
