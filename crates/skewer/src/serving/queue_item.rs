use tokio::sync::oneshot::Sender;
use uuid::Uuid;

use super::ServeError;
use crate::batch::RowOutput;

pub(crate) type RowSender = Sender<Result<RowOutput, ServeError>>;

/// A text waiting for a batch slot, plus where its row goes.
pub(crate) struct QueueItem {
    id: Uuid,
    text: String,
    sender: RowSender,
}

impl QueueItem {
    pub(crate) fn new(id: Uuid, text: String, sender: RowSender) -> Self {
        Self { id, text, sender }
    }

    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    pub(crate) fn text(&self) -> &str {
        &self.text
    }

    pub(crate) fn into_parts(self) -> (Uuid, String, RowSender) {
        (self.id, self.text, self.sender)
    }
}

impl AsRef<RowSender> for QueueItem {
    fn as_ref(&self) -> &RowSender {
        &self.sender
    }
}
