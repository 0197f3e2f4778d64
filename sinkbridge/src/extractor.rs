// SPDX-FileCopyrightText: 2025 Contributors to the sinkbridge project.
// SPDX-License-Identifier: Apache-2.0

//! The per-sample path from a sink notification to the consumer.
//!
//! [`SampleExtractor::on_new_sample`] runs on the pipeline's streaming thread
//! once per "new sample" notification:
//!
//! 1. pull one pending sample; none pending is a normal, silent `Ok`
//! 2. resolve its buffer; no buffer is also a silent `Ok`
//! 3. build the payload according to the [`CopyPolicy`]
//! 4. hand the payload to the [`Delivery`]
//! 5. turn the consumer's result into a [`FlowStatus`]
//!
//! Under [`CopyPolicy::Copy`] the pipeline's sample is released before the
//! consumer runs. Under [`CopyPolicy::Transfer`] it moves into the payload and
//! the extractor keeps no reference.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{trace, warn};

use crate::backend::{MediaSample, SinkElement};
use crate::{CopiedSample, CopyPolicy, Delivery, FlowStatus, OwnedSample, Payload, SinkId};

/// Pulls samples from a sink and delivers them under a fixed ownership policy.
pub struct SampleExtractor<S> {
    policy: CopyPolicy,
    delivery: Arc<dyn Delivery<S>>,
}

impl<S> Clone for SampleExtractor<S> {
    fn clone(&self) -> Self {
        SampleExtractor {
            policy: self.policy,
            delivery: self.delivery.clone(),
        }
    }
}

/// What happened to one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    NoSample,
    NoBuffer,
    Delivered { bytes: usize },
    Failed,
}

impl Outcome {
    pub(crate) fn status(self) -> FlowStatus {
        match self {
            Outcome::Failed => FlowStatus::Error,
            _ => FlowStatus::Ok,
        }
    }
}

impl<S: MediaSample> SampleExtractor<S> {
    /// Creates an extractor delivering to `delivery` under `policy`.
    pub fn new(policy: CopyPolicy, delivery: Arc<dyn Delivery<S>>) -> Self {
        SampleExtractor { policy, delivery }
    }

    /// The ownership policy applied to every sample.
    pub fn policy(&self) -> CopyPolicy {
        self.policy
    }

    /// Handles one "new sample" notification from `sink`, identified by `id`.
    ///
    /// Returns [`FlowStatus::Error`] only when the consumer reported a failure.
    pub fn on_new_sample<K>(&self, sink: &K, id: SinkId) -> FlowStatus
    where
        K: SinkElement<Sample = S>,
    {
        self.process(sink, id).status()
    }

    pub(crate) fn process<K>(&self, sink: &K, id: SinkId) -> Outcome
    where
        K: SinkElement<Sample = S>,
    {
        let Some(sample) = sink.try_pull_sample() else {
            trace!(%id, "No sample pending");
            return Outcome::NoSample;
        };

        let Some(info) = sample.buffer_info() else {
            trace!(%id, "Sample carries no buffer");
            return Outcome::NoBuffer;
        };

        let (payload, bytes) = match self.policy {
            CopyPolicy::Copy => {
                let mut data = vec![0; info.size];
                let extracted = sample.extract(&mut data);
                data.truncate(extracted);

                // Invalidates the pipeline's sample and buffer.
                drop(sample);

                let bytes = data.len();
                let copied = CopiedSample {
                    data,
                    duration: info.duration,
                    pts: info.pts,
                };
                (Payload::Copied(copied), bytes)
            }
            CopyPolicy::Transfer => (Payload::Transferred(OwnedSample::new(sample)), info.size),
        };

        match self.delivery.deliver(id, payload) {
            Ok(()) => {
                trace!(%id, bytes, duration = %info.duration, "Delivered sample");
                Outcome::Delivered { bytes }
            }
            Err(error) => {
                warn!(%id, %error, "Delivery failed");
                Outcome::Failed
            }
        }
    }
}

/// Running counters for one sink.
#[derive(Debug, Default)]
pub struct SinkStats {
    delivered: AtomicU64,
    delivered_bytes: AtomicU64,
    spurious: AtomicU64,
    empty: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time copy of [`SinkStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SinkStatsSnapshot {
    /// Samples handed to the consumer successfully.
    pub delivered: u64,

    /// Payload bytes handed to the consumer successfully.
    pub delivered_bytes: u64,

    /// Notifications that found no pending sample.
    pub spurious: u64,

    /// Samples that carried no buffer.
    pub empty: u64,

    /// Deliveries the consumer reported as failed.
    pub failed: u64,
}

impl SinkStats {
    pub(crate) fn record(&self, outcome: Outcome) {
        match outcome {
            Outcome::NoSample => self.spurious.fetch_add(1, Ordering::Relaxed),
            Outcome::NoBuffer => self.empty.fetch_add(1, Ordering::Relaxed),
            Outcome::Failed => self.failed.fetch_add(1, Ordering::Relaxed),
            Outcome::Delivered { bytes } => {
                self.delivered_bytes
                    .fetch_add(bytes as u64, Ordering::Relaxed);
                self.delivered.fetch_add(1, Ordering::Relaxed)
            }
        };
    }

    /// Reads all counters.
    pub fn snapshot(&self) -> SinkStatsSnapshot {
        SinkStatsSnapshot {
            delivered: self.delivered.load(Ordering::Relaxed),
            delivered_bytes: self.delivered_bytes.load(Ordering::Relaxed),
            spurious: self.spurious.load(Ordering::Relaxed),
            empty: self.empty.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}
