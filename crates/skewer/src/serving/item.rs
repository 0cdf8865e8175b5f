use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use uuid::Uuid;

use super::ServeError;
use crate::batch::RowOutput;

/// The pending result of one queued text.
///
/// Resolves to the text's own output row once its batch has run. If the
/// worker goes away before answering, resolves to [`ServeError::WorkerGone`].
pub struct Item {
    id: Uuid,
    receiver: oneshot::Receiver<Result<RowOutput, ServeError>>,
}

impl Item {
    pub(crate) fn new(
        id: Uuid,
        receiver: oneshot::Receiver<Result<RowOutput, ServeError>>,
    ) -> Self {
        Self { id, receiver }
    }

    /// Request id, as it appears in worker log lines.
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Future for Item {
    type Output = Result<RowOutput, ServeError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(ServeError::WorkerGone)))
    }
}
