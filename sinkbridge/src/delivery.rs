// SPDX-FileCopyrightText: 2025 Contributors to the sinkbridge project.
// SPDX-License-Identifier: Apache-2.0

//! The consumer side of the bridge.
//!
//! A [`Delivery`] receives one payload per sample together with the identifier
//! of the sink it came from. It runs inline on the pipeline's streaming thread,
//! so anything slow belongs behind a [`crate::queue`] hand-off.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::{DeliveryError, Payload, SinkId};

/// Flow status reported back to the pipeline runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowStatus {
    /// Keep the pipeline running.
    Ok,

    /// The sample could not be handled; let the runtime halt or report.
    Error,
}

impl FlowStatus {
    /// True for [`FlowStatus::Ok`].
    pub const fn is_ok(self) -> bool {
        matches!(self, FlowStatus::Ok)
    }
}

/// Receives samples from the bridge.
pub trait Delivery<S>: Send + Sync {
    /// Handles one payload from `sink`.
    ///
    /// A [`Payload::Transferred`] sample is owned by the consumer from this
    /// point on and is released when the consumer drops it.
    fn deliver(&self, sink: SinkId, payload: Payload<S>) -> Result<(), DeliveryError>;
}

impl<S, F> Delivery<S> for F
where
    F: Fn(SinkId, Payload<S>) -> Result<(), DeliveryError> + Send + Sync,
{
    fn deliver(&self, sink: SinkId, payload: Payload<S>) -> Result<(), DeliveryError> {
        self(sink, payload)
    }
}

/// Dispatches payloads to a per-sink consumer.
///
/// This is the explicit routing table that lets one bridge serve several sinks
/// (and several pipelines) while each consumer only sees its own stream.
pub struct DeliveryRouter<S> {
    routes: RwLock<HashMap<SinkId, Arc<dyn Delivery<S>>>>,
}

impl<S> Default for DeliveryRouter<S> {
    fn default() -> Self {
        DeliveryRouter {
            routes: RwLock::new(HashMap::new()),
        }
    }
}

impl<S: 'static> DeliveryRouter<S> {
    /// Creates an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes payloads from `sink` to `delivery`, replacing any previous route.
    ///
    /// Returns `true` if a previous route was replaced.
    pub fn route(&self, sink: SinkId, delivery: impl Delivery<S> + 'static) -> bool {
        let mut routes = self.routes.write().unwrap_or_else(|e| e.into_inner());
        let replaced = routes.insert(sink, Arc::new(delivery)).is_some();
        debug!(%sink, replaced, "Routed sink");
        replaced
    }

    /// Removes the route for `sink`. Returns `true` if one existed.
    pub fn unroute(&self, sink: SinkId) -> bool {
        let mut routes = self.routes.write().unwrap_or_else(|e| e.into_inner());
        routes.remove(&sink).is_some()
    }

    /// True if `sink` has a route.
    pub fn is_routed(&self, sink: SinkId) -> bool {
        let routes = self.routes.read().unwrap_or_else(|e| e.into_inner());
        routes.contains_key(&sink)
    }

    fn lookup(&self, sink: SinkId) -> Option<Arc<dyn Delivery<S>>> {
        let routes = self.routes.read().unwrap_or_else(|e| e.into_inner());
        routes.get(&sink).cloned()
    }
}

impl<S: Send + 'static> Delivery<S> for DeliveryRouter<S> {
    fn deliver(&self, sink: SinkId, payload: Payload<S>) -> Result<(), DeliveryError> {
        // The lock is released before the consumer runs.
        let delivery = self.lookup(sink).ok_or(DeliveryError::UnknownSink(sink))?;
        delivery.deliver(sink, payload)
    }
}
