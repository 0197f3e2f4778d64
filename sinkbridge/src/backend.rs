// SPDX-FileCopyrightText: 2025 Contributors to the sinkbridge project.
// SPDX-License-Identifier: Apache-2.0

//! The interface a pipeline runtime must offer the bridge.
//!
//! The bridge never builds or owns a pipeline. It needs four things from one:
//! find an element by name, subscribe to that element's "new sample"
//! notification, pull one pending sample, and read a sample's buffer. Releasing
//! a sample is dropping it.

use std::time::Duration;

use crate::{FlowStatus, Result, SampleDuration};

/// Size and timing of a sample's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferInfo {
    /// Buffer length in bytes.
    pub size: usize,

    /// Buffer duration; [`SampleDuration::Unknown`] if the pipeline left it unset.
    pub duration: SampleDuration,

    /// Presentation timestamp, if set.
    pub pts: Option<Duration>,
}

/// One media sample as held by the pipeline runtime.
///
/// Dropping a value of this type releases the runtime's reference.
pub trait MediaSample: Send + 'static {
    /// Returns the buffer's size and timing, or `None` if the sample carries no
    /// buffer.
    fn buffer_info(&self) -> Option<BufferInfo>;

    /// Copies buffer bytes into `dest`, starting at offset 0, and returns how
    /// many bytes were written.
    fn extract(&self, dest: &mut [u8]) -> usize;
}

/// A sink element from which samples can be pulled.
pub trait SinkElement: Send + Sync + 'static {
    /// Sample type produced by this sink.
    type Sample: MediaSample;

    /// Pulls one pending sample without blocking.
    ///
    /// Returns `None` when nothing is pending, which happens routinely when a
    /// notification races with another pull.
    fn try_pull_sample(&self) -> Option<Self::Sample>;
}

/// Callback invoked on the runtime's streaming thread for each "new sample"
/// notification.
pub type NewSampleHandler<K> = Box<dyn Fn(&K) -> FlowStatus + Send + Sync + 'static>;

/// A pipeline whose named sink elements the bridge can attach to.
pub trait PipelineBackend {
    /// Sink element type.
    type Sink: SinkElement;

    /// Live notification subscription.
    ///
    /// Dropping it disconnects the handler. Once the drop returns no new
    /// invocation starts; one already running keeps its handler (and everything
    /// the handler captured) alive until it returns.
    type Subscription: Send + 'static;

    /// Looks up a sink element by name.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::ElementNotFound`] if no element has this name
    /// - [`crate::Error::NotASampleSink`] if the element cannot hand out samples
    fn sink_by_name(&self, name: &str) -> Result<Self::Sink>;

    /// Enables the sink's sample notification and connects `handler` to it.
    fn subscribe(
        &self,
        sink: &Self::Sink,
        handler: NewSampleHandler<Self::Sink>,
    ) -> Result<Self::Subscription>;
}
