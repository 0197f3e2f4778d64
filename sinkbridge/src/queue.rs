// SPDX-FileCopyrightText: 2025 Contributors to the sinkbridge project.
// SPDX-License-Identifier: Apache-2.0

//! Non-blocking hand-off from the streaming thread to a consumer task.
//!
//! [`bounded`] splits a delivery into two halves. The [`QueuedDelivery`] half is
//! registered with the bridge and only ever does a `try_send` on a
//! `crossbeam-channel` sender, so streaming threads share no lock and a slow
//! consumer can never stall them. The [`DeliveryStream`] half is drained at
//! the consumer's own pace, either by blocking iteration on a worker thread
//! or as a [`Stream`] from an async task.
//!
//! When the queue is full the payload is dropped, exactly like a leaky
//! `appsink drop=true`. A dropped transferred sample is released on the spot.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};
use futures::stream::{FusedStream, Stream};
use futures::task::AtomicWaker;
use tracing::debug;

use crate::{Delivery, DeliveryError, Payload, SinkId};

/// One queued payload together with the sink it came from.
#[derive(Debug)]
pub struct Delivered<S> {
    /// Sink that produced the payload.
    pub sink: SinkId,

    /// The payload itself.
    pub payload: Payload<S>,
}

/// Creates a queued hand-off holding at most `capacity` payloads.
///
/// With a capacity of 0 a payload is only handed over while the consumer is
/// blocked in [`DeliveryStream::recv`]; otherwise it is dropped.
pub fn bounded<S>(capacity: usize) -> (QueuedDelivery<S>, DeliveryStream<S>) {
    let (sender, receiver) = crossbeam_channel::bounded(capacity);
    let waker = Arc::new(AtomicWaker::new());
    (
        QueuedDelivery {
            sender,
            waker: WakeOnDrop(waker.clone()),
            dropped: AtomicU64::new(0),
        },
        DeliveryStream {
            receiver,
            waker,
            terminated: false,
        },
    )
}

/// Wakes a pending [`DeliveryStream`] once the sender is gone.
struct WakeOnDrop(Arc<AtomicWaker>);

impl Drop for WakeOnDrop {
    fn drop(&mut self) {
        self.0.wake();
    }
}

/// Sending half of a queued hand-off. Register this with the bridge.
///
/// Every sink bound to it sends through the same channel; `try_send` takes
/// `&self`, so concurrent streaming threads never wait on each other.
pub struct QueuedDelivery<S> {
    // Field order is drop order: the channel disconnects before the wake.
    sender: Sender<Delivered<S>>,
    waker: WakeOnDrop,
    dropped: AtomicU64,
}

impl<S> QueuedDelivery<S> {
    /// Number of payloads dropped because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<S: Send> Delivery<S> for QueuedDelivery<S> {
    fn deliver(&self, sink: SinkId, payload: Payload<S>) -> Result<(), DeliveryError> {
        match self.sender.try_send(Delivered { sink, payload }) {
            Ok(()) => {
                self.waker.0.wake();
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(%sink, dropped, "Queue full, dropping payload");
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(DeliveryError::Disconnected),
        }
    }
}

/// Receiving half of a queued hand-off.
///
/// Yields payloads in the order they were delivered. Iteration (and the
/// [`Stream`]) ends once the [`QueuedDelivery`] half is dropped and the queue
/// is drained. Payloads still queued when this is dropped are released with
/// it.
pub struct DeliveryStream<S> {
    receiver: Receiver<Delivered<S>>,
    waker: Arc<AtomicWaker>,
    terminated: bool,
}

impl<S> DeliveryStream<S> {
    /// Takes the next queued payload without waiting.
    ///
    /// Returns `None` if the queue is currently empty or closed.
    pub fn try_recv(&self) -> Option<Delivered<S>> {
        self.receiver.try_recv().ok()
    }

    /// Waits for the next payload.
    ///
    /// Returns `None` once the sending half is gone and the queue is empty.
    pub fn recv(&self) -> Option<Delivered<S>> {
        self.receiver.recv().ok()
    }

    /// Waits up to `timeout` for the next payload.
    ///
    /// Returns `Ok(None)` on timeout and [`DeliveryError::Disconnected`] once
    /// the sending half is gone and the queue is empty.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<Delivered<S>>, DeliveryError> {
        match self.receiver.recv_timeout(timeout) {
            Ok(delivered) => Ok(Some(delivered)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(DeliveryError::Disconnected),
        }
    }

    /// Number of payloads waiting in the queue.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// True when no payload is waiting.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Blocking iterator over payloads, ending when the sender is gone.
    pub fn iter(&self) -> crossbeam_channel::Iter<'_, Delivered<S>> {
        self.receiver.iter()
    }
}

impl<S> IntoIterator for DeliveryStream<S> {
    type Item = Delivered<S>;
    type IntoIter = crossbeam_channel::IntoIter<Delivered<S>>;

    fn into_iter(self) -> Self::IntoIter {
        self.receiver.into_iter()
    }
}

// Never pinned structurally.
impl<S> Unpin for DeliveryStream<S> {}

impl<S> Stream for DeliveryStream<S> {
    type Item = Delivered<S>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.terminated {
            return Poll::Ready(None);
        }
        // Register before looking, so a send racing with this poll still wakes us.
        this.waker.register(cx.waker());
        match this.receiver.try_recv() {
            Ok(delivered) => Poll::Ready(Some(delivered)),
            Err(TryRecvError::Empty) => Poll::Pending,
            Err(TryRecvError::Disconnected) => {
                this.terminated = true;
                Poll::Ready(None)
            }
        }
    }
}

impl<S> FusedStream for DeliveryStream<S> {
    fn is_terminated(&self) -> bool {
        self.terminated
    }
}
