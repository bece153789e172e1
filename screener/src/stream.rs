use std::pin::Pin;
use std::task::{Context, Poll};

use chrono::Utc;
use futures::Stream;
use screener_core::{AgentTask, AggregatedResponse, ScreenerError, StreamEvent};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// The caller hung up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Disconnected;

/// Write side of one request's event channel.
///
/// Progress events go out in the order they are pushed. `finish` and `fail`
/// consume the publisher, so nothing can follow the terminal event.
pub(crate) struct Publisher {
    tx: mpsc::Sender<StreamEvent>,
}

impl Publisher {
    pub(crate) const fn new(tx: mpsc::Sender<StreamEvent>) -> Self {
        Self { tx }
    }

    pub(crate) async fn task_completed(&self, task: &AgentTask) -> Result<(), Disconnected> {
        self.tx
            .send(StreamEvent::task_completed(task, Utc::now()))
            .await
            .map_err(|_| Disconnected)
    }

    pub(crate) async fn finish(self, response: AggregatedResponse) -> Result<(), Disconnected> {
        self.tx
            .send(StreamEvent::final_response(response, Utc::now()))
            .await
            .map_err(|_| Disconnected)
    }

    /// Best effort: a request-level error is only useful if someone is listening.
    pub(crate) fn fail(self, err: &ScreenerError) {
        if self.tx.try_send(StreamEvent::error(err, Utc::now())).is_err() {
            tracing::debug!(code = err.code(), "error event dropped");
        }
    }

    /// Resolves once the caller has dropped its end.
    pub(crate) async fn closed(&self) {
        self.tx.closed().await;
    }
}

/// Ordered events of one analysis request.
///
/// Yields `task_completed` events in completion order, then exactly one
/// `final` event, then ends. A rejected request yields a single `error`
/// event instead. Dropping the stream cancels the request.
pub struct AnalysisStream {
    request_id: Option<Uuid>,
    rx: mpsc::Receiver<StreamEvent>,
    cancel: CancellationToken,
}

impl AnalysisStream {
    pub(crate) const fn new(
        request_id: Option<Uuid>,
        rx: mpsc::Receiver<StreamEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            request_id,
            rx,
            cancel,
        }
    }

    /// Identifier of the request, `None` when it was rejected up front.
    #[must_use]
    pub const fn request_id(&self) -> Option<Uuid> {
        self.request_id
    }

    /// Stop all agents still working on this request.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Drain the stream and return the merged response.
    ///
    /// # Errors
    /// `Cancelled` when the stream ended without a `final` event.
    pub async fn into_response(mut self) -> Result<AggregatedResponse, ScreenerError> {
        while let Some(event) = self.rx.recv().await {
            if let Some(resp) = event.as_final() {
                return Ok(resp.clone());
            }
        }
        Err(ScreenerError::Cancelled)
    }
}

impl Stream for AnalysisStream {
    type Item = StreamEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

impl Drop for AnalysisStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for AnalysisStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisStream")
            .field("request_id", &self.request_id)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}
