// SPDX-FileCopyrightText: 2025 Contributors to the sinkbridge project.
// SPDX-License-Identifier: Apache-2.0

//! Binding named sink elements to identifiers.
//!
//! A [`SinkRegistry`] is an explicit table, owned by whoever builds the
//! pipeline, mapping element names to their [`SinkId`] and live subscription.
//! Each subscription's handler captures the identifier and the sink's counters
//! by value, so the streaming thread never looks anything up in the table.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::backend::{NewSampleHandler, PipelineBackend, SinkElement};
use crate::extractor::{SinkStats, SinkStatsSnapshot};
use crate::{CopyPolicy, Delivery, Error, Result, SampleExtractor, SinkId};

/// Sample type produced by a backend's sinks.
pub type SampleOf<B> = <<B as PipelineBackend>::Sink as SinkElement>::Sample;

struct Binding<B: PipelineBackend> {
    id: SinkId,
    stats: Arc<SinkStats>,
    // Dropping this disconnects the handler.
    _subscription: B::Subscription,
}

/// Table of sink bindings for pipelines of backend `B`.
///
/// Every binding shares one [`SampleExtractor`], so every sink of a registry
/// uses the same [`CopyPolicy`] and the same consumer.
pub struct SinkRegistry<B: PipelineBackend> {
    extractor: SampleExtractor<SampleOf<B>>,
    bindings: HashMap<String, Binding<B>>,
}

impl<B: PipelineBackend> SinkRegistry<B> {
    /// Creates an empty registry whose sinks feed `extractor`.
    pub fn new(extractor: SampleExtractor<SampleOf<B>>) -> Self {
        SinkRegistry {
            extractor,
            bindings: HashMap::new(),
        }
    }

    /// Creates an empty registry delivering to `delivery` under `policy`.
    pub fn with_delivery(
        policy: CopyPolicy,
        delivery: impl Delivery<SampleOf<B>> + 'static,
    ) -> Self {
        Self::new(SampleExtractor::new(policy, Arc::new(delivery)))
    }

    /// Ownership policy of every sink in this registry.
    pub fn policy(&self) -> CopyPolicy {
        self.extractor.policy()
    }

    /// Binds the element `name` of `pipeline` to `id` and starts delivering its
    /// samples.
    ///
    /// From the moment this returns, the extractor runs on the pipeline's
    /// streaming thread once per sample until the binding is removed.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyRegistered`] if `name` is already bound
    /// - [`Error::DuplicateSinkId`] if `id` is already bound to another element
    /// - [`Error::ElementNotFound`] or [`Error::NotASampleSink`] from the backend
    ///
    /// The registry is unchanged when an error is returned.
    pub fn register(&mut self, pipeline: &B, name: &str, id: SinkId) -> Result<()> {
        if self.bindings.contains_key(name) {
            return Err(Error::AlreadyRegistered {
                name: name.to_owned(),
            });
        }
        if self.bindings.values().any(|binding| binding.id == id) {
            return Err(Error::DuplicateSinkId(id));
        }

        let sink = pipeline.sink_by_name(name)?;

        let stats = Arc::new(SinkStats::default());
        let handler: NewSampleHandler<B::Sink> = {
            let extractor = self.extractor.clone();
            let stats = stats.clone();
            Box::new(move |sink: &B::Sink| {
                let outcome = extractor.process(sink, id);
                stats.record(outcome);
                outcome.status()
            })
        };
        let subscription = pipeline.subscribe(&sink, handler)?;

        debug!(name, %id, policy = ?self.policy(), "Registered sink");
        self.bindings.insert(
            name.to_owned(),
            Binding {
                id,
                stats,
                _subscription: subscription,
            },
        );
        Ok(())
    }

    /// Removes the binding for `name` and returns its identifier.
    ///
    /// The handler is disconnected before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRegistered`] if `name` is not bound.
    pub fn unregister(&mut self, name: &str) -> Result<SinkId> {
        let binding = self.bindings.remove(name).ok_or_else(|| Error::NotRegistered {
            name: name.to_owned(),
        })?;
        let id = binding.id;
        drop(binding);
        debug!(name, %id, "Unregistered sink");
        Ok(id)
    }

    /// Removes every binding.
    pub fn clear(&mut self) {
        for (name, binding) in self.bindings.drain() {
            debug!(%name, id = %binding.id, "Unregistered sink");
        }
    }

    /// Identifier bound to `name`, if any.
    pub fn identifier(&self, name: &str) -> Option<SinkId> {
        self.bindings.get(name).map(|binding| binding.id)
    }

    /// Counters of the sink bound to `name`, if any.
    pub fn stats(&self, name: &str) -> Option<SinkStatsSnapshot> {
        self.bindings.get(name).map(|binding| binding.stats.snapshot())
    }

    /// Names of all bound elements, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// True if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
