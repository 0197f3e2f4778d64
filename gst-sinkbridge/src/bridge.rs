// SPDX-FileCopyrightText: 2025 Contributors to the sinkbridge project.
// SPDX-License-Identifier: Apache-2.0

//! One pipeline and the registry of its attached sinks.

use std::sync::Arc;

use sinkbridge::queue::{self, DeliveryStream};
use sinkbridge::{
    CopyPolicy, Delivery, SampleExtractor, Settings, SinkId, SinkRegistry, SinkStatsSnapshot,
    SinkType,
};

use crate::{GstPipeline, GstSample, Result, next_pipeline_id};

/// Owns a [`GstPipeline`] and the sinks attached to it.
///
/// On drop the registry goes first, disconnecting every `new-sample` handler,
/// then the pipeline is stopped.
pub struct Bridge {
    // Field order is drop order.
    registry: SinkRegistry<GstPipeline>,
    pipeline: GstPipeline,
}

impl Bridge {
    /// Wraps `pipeline`, delivering every attached sink to `delivery`.
    pub fn new(
        pipeline: GstPipeline,
        policy: CopyPolicy,
        delivery: impl Delivery<GstSample> + 'static,
    ) -> Self {
        Self::with_extractor(pipeline, SampleExtractor::new(policy, Arc::new(delivery)))
    }

    /// Wraps `pipeline` around an existing extractor.
    pub fn with_extractor(pipeline: GstPipeline, extractor: SampleExtractor<GstSample>) -> Self {
        Bridge {
            registry: SinkRegistry::new(extractor),
            pipeline,
        }
    }

    /// Launches `description` under a freshly allocated pipeline id.
    pub fn launch(
        description: &str,
        policy: CopyPolicy,
        delivery: impl Delivery<GstSample> + 'static,
    ) -> Result<Self> {
        let pipeline = GstPipeline::launch(description, next_pipeline_id()?)?;
        Ok(Self::new(pipeline, policy, delivery))
    }

    /// Launches `description` with a queued hand-off sized from `settings`.
    ///
    /// Payloads arrive on the returned stream, off the streaming threads. Drain
    /// it by iterating on a worker thread or polling it as a `Stream`.
    pub fn launch_queued(
        description: &str,
        settings: &Settings,
    ) -> Result<(Self, DeliveryStream<GstSample>)> {
        let (delivery, stream) = queue::bounded(settings.queue_capacity);
        let bridge = Self::launch(description, settings.policy, delivery)?;
        Ok((bridge, stream))
    }

    /// Attaches the appsink `name` as sink `index` of kind `sink_type`.
    ///
    /// Returns the identifier its payloads are tagged with.
    pub fn attach(&mut self, name: &str, sink_type: SinkType, index: u16) -> Result<SinkId> {
        let id = SinkId::new(self.pipeline.id(), sink_type, index);
        self.registry.register(&self.pipeline, name, id)?;
        Ok(id)
    }

    /// Detaches the appsink `name`; no further payloads come from it.
    ///
    /// Safe while PLAYING: the appsink is left leaky, holding at most the
    /// newest buffer, so the pipeline keeps running without it.
    pub fn detach(&mut self, name: &str) -> Result<SinkId> {
        Ok(self.registry.unregister(name)?)
    }

    /// Sets the pipeline to PLAYING.
    pub fn start(&self) -> Result<()> {
        self.pipeline.start()
    }

    /// Sets the pipeline to NULL. Attached sinks stay attached.
    pub fn stop(&self) -> Result<()> {
        self.pipeline.stop()
    }

    /// Detaches every sink, then stops and releases the pipeline.
    pub fn close(self) -> Result<()> {
        let Bridge {
            mut registry,
            pipeline,
        } = self;
        registry.clear();
        drop(registry);
        pipeline.close()
    }

    /// The wrapped pipeline.
    pub fn pipeline(&self) -> &GstPipeline {
        &self.pipeline
    }

    /// The registry of attached sinks.
    pub fn registry(&self) -> &SinkRegistry<GstPipeline> {
        &self.registry
    }

    /// Counters of the sink attached as `name`.
    pub fn stats(&self, name: &str) -> Option<SinkStatsSnapshot> {
        self.registry.stats(name)
    }
}
