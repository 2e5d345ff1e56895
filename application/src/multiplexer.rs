//! Event multiplexer
//!
//! Serializes every producer in one orchestration onto a single bounded
//! channel. Producer tasks share a cloned [`EventSink`]; the caller
//! consumes the [`EventStream`]. The buffer is bounded so a slow consumer
//! suspends producers instead of growing memory, and letting go of the
//! stream fires the orchestration's cancellation token so in-flight model
//! calls stop promptly even when no producer is mid-send.

use council_domain::CouncilEvent;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

/// Producer half, cloned into every per-model task.
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::Sender<CouncilEvent>,
    cancel: CancellationToken,
}

impl EventSink {
    /// Send one event, suspending while the buffer is full.
    ///
    /// Returns `false` when the consumer is gone; the cancellation token
    /// has then been fired and the producer should stop.
    pub async fn emit(&self, event: CouncilEvent) -> bool {
        if self.tx.send(event).await.is_err() {
            self.cancel.cancel();
            return false;
        }
        true
    }

    /// Whether the consumer has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half, handed to the caller.
///
/// Ends when every sink clone is dropped. Dropping it early severs the
/// turn: the cancellation token fires and idle producers observe it
/// without having to attempt a send first.
pub struct EventStream {
    inner: ReceiverStream<CouncilEvent>,
    cancel: CancellationToken,
}

impl Stream for EventStream {
    type Item = CouncilEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Create a sink/stream pair with the given buffer capacity.
pub fn channel(capacity: usize, cancel: CancellationToken) -> (EventSink, EventStream) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        EventSink {
            tx,
            cancel: cancel.clone(),
        },
        EventStream {
            inner: ReceiverStream::new(rx),
            cancel,
        },
    )
}
