//! GStreamer backend for sinkbridge
//!
//! This crate plugs GStreamer into the backend-independent `sinkbridge` core:
//!
//! - **pipeline**: [`GstPipeline`] launches a textual pipeline description and
//!   drives its state (start, stop, close)
//! - **appsink**: [`GstPipeline`] implements [`sinkbridge::PipelineBackend`] by
//!   looking up `appsink` elements by name and subscribing to their
//!   `new-sample` signal
//! - **bridge**: [`Bridge`] owns one pipeline together with the registry of its
//!   attached sinks
//!
//! ## GStreamer Concepts (for non-GStreamer developers)
//! - **appsink**: A sink element that lets the application pull the samples
//!   that reach it. With `emit-signals=true` it fires `new-sample` on the
//!   streaming thread each time one is ready
//! - **Sample**: A buffer plus its caps and segment. Buffers carry the bytes
//!   and the timing (PTS, duration)
//! - **Flow return**: What a sink tells upstream after each buffer. Anything
//!   but `OK` stops the stream and posts an error on the bus
//!
//! ## Example
//! ```no_run
//! use gst_sinkbridge::{Bridge, CopyPolicy, DeliveryError, GstSample, Payload, SinkId, SinkType};
//!
//! fn main() -> gst_sinkbridge::Result<()> {
//!     gst_sinkbridge::init()?;
//!     let consumer = |sink: SinkId, payload: Payload<GstSample>| -> Result<(), DeliveryError> {
//!         println!("{sink}: {} bytes", payload.len());
//!         Ok(())
//!     };
//!     let mut bridge = Bridge::launch(
//!         "videotestsrc num-buffers=10 ! x264enc ! appsink name=video",
//!         CopyPolicy::Copy,
//!         consumer,
//!     )?;
//!     bridge.attach("video", SinkType::VIDEO, 0)?;
//!     bridge.start()?;
//!     Ok(())
//! }
//! ```

// SPDX-FileCopyrightText: 2025 Contributors to the sinkbridge project.
// SPDX-License-Identifier: Apache-2.0

use std::sync::LazyLock;

use gstreamer as gst;

/// AppSink lookup, subscription, and the sample wrapper
mod appsink;

/// Pipeline plus sink registry
mod bridge;

/// Error type for this crate
mod error;

/// FlowStatus to GStreamer flow return conversions
mod flow;

/// Pipeline launch and lifecycle
mod pipeline;

pub use appsink::{AppSinkSubscription, GstAppSink, GstSample};
pub use bridge::Bridge;
pub use error::{Error, Result};
pub use flow::{flow_result, flow_return};
pub use pipeline::{GstPipeline, next_pipeline_id};

pub use sinkbridge::{
    CopiedSample, CopyPolicy, Delivery, DeliveryError, DeliveryRouter, FlowStatus, OwnedSample,
    Payload, PipelineId, SampleDuration, Settings, SinkId, SinkStatsSnapshot, SinkType, queue,
};

/// GStreamer debug category for bridge messages.
///
/// Set GST_DEBUG=sinkbridge:6 to see per-sample logs.
pub(crate) static CAT: LazyLock<gst::DebugCategory> = LazyLock::new(|| {
    gst::DebugCategory::new(
        "sinkbridge",
        gst::DebugColorFlags::empty(),
        Some("Pipeline sink bridge"),
    )
});

/// Initializes GStreamer. Safe to call more than once.
///
/// With the `tracing` feature a console subscriber is installed as well, unless
/// the application already set one.
pub fn init() -> Result<()> {
    #[cfg(feature = "tracing")]
    {
        use tracing_subscriber::filter::LevelFilter;
        use tracing_subscriber::util::SubscriberInitExt;

        let _ = tracing_subscriber::fmt()
            .compact()
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(true)
            .with_target(false)
            .with_max_level(LevelFilter::TRACE)
            .finish()
            .try_init();
    }

    gst::init().map_err(Error::Init)?;
    LazyLock::force(&CAT);
    Ok(())
}
