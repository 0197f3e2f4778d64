// SPDX-FileCopyrightText: 2025 Contributors to the sinkbridge project.
// SPDX-License-Identifier: Apache-2.0

//! AppSink side of the backend.
//!
//! Subscribing turns on `emit-signals` and connects a `new-sample` handler.
//! GStreamer runs that handler on the sink's streaming thread; it wraps the
//! emitting appsink, runs the bridge handler, and converts the resulting
//! [`FlowStatus`](sinkbridge::FlowStatus) into the signal's `GstFlowReturn`.

use std::time::Duration;

use gst::prelude::*;
use gstreamer as gst;
use gstreamer_app as gst_app;
use sinkbridge::{
    BufferInfo, MediaSample, NewSampleHandler, PipelineBackend, SampleDuration, SinkElement,
};

use crate::{CAT, GstPipeline, flow_return};

/// An `appsink` element found in a [`GstPipeline`].
#[derive(Debug, Clone)]
pub struct GstAppSink(gst_app::AppSink);

impl GstAppSink {
    /// The wrapped element.
    pub fn appsink(&self) -> &gst_app::AppSink {
        &self.0
    }
}

impl SinkElement for GstAppSink {
    type Sample = GstSample;

    fn try_pull_sample(&self) -> Option<GstSample> {
        // Inside new-sample a sample is already queued, so this never blocks.
        self.0.try_pull_sample(gst::ClockTime::ZERO).map(GstSample)
    }
}

/// A sample pulled from an appsink. Dropping it unrefs the `GstSample`.
#[derive(Debug, Clone)]
pub struct GstSample(gst::Sample);

impl GstSample {
    /// The wrapped GStreamer sample, with caps and segment.
    pub fn sample(&self) -> &gst::Sample {
        &self.0
    }

    /// Takes the GStreamer sample out of the wrapper.
    pub fn into_sample(self) -> gst::Sample {
        self.0
    }
}

fn to_duration(time: gst::ClockTime) -> Duration {
    Duration::from_nanos(time.nseconds())
}

impl MediaSample for GstSample {
    fn buffer_info(&self) -> Option<BufferInfo> {
        let buffer = self.0.buffer()?;
        Some(BufferInfo {
            size: buffer.size(),
            duration: SampleDuration::from(buffer.duration().map(to_duration)),
            pts: buffer.pts().map(to_duration),
        })
    }

    fn extract(&self, dest: &mut [u8]) -> usize {
        let Some(buffer) = self.0.buffer() else {
            return 0;
        };
        let len = dest.len().min(buffer.size());
        match buffer.copy_to_slice(0, &mut dest[..len]) {
            Ok(()) => len,
            Err(copied) => copied,
        }
    }
}

/// A connected `new-sample` handler.
///
/// Dropping it disconnects the handler and turns `emit-signals` back off, so
/// the bridge is never called for this sink again. Nothing pulls from the
/// appsink after that, so it is also made leaky (`drop=true`,
/// `max-buffers=1`) and emptied; a running pipeline keeps flowing without
/// the appsink queueing every later buffer.
#[derive(Debug)]
pub struct AppSinkSubscription {
    appsink: gst_app::AppSink,
    handler_id: Option<glib::SignalHandlerId>,
}

impl Drop for AppSinkSubscription {
    fn drop(&mut self) {
        if let Some(handler_id) = self.handler_id.take() {
            self.appsink.disconnect(handler_id);
        }
        self.appsink.set_property("emit-signals", false);
        self.appsink.set_drop(true);
        self.appsink.set_max_buffers(1);
        let mut drained = 0usize;
        while self.appsink.try_pull_sample(gst::ClockTime::ZERO).is_some() {
            drained += 1;
        }
        gst::debug!(
            CAT,
            obj = &self.appsink,
            "Disconnected new-sample handler, drained {} queued samples",
            drained
        );
    }
}

impl PipelineBackend for GstPipeline {
    type Sink = GstAppSink;
    type Subscription = AppSinkSubscription;

    fn sink_by_name(&self, name: &str) -> sinkbridge::Result<GstAppSink> {
        let element = self
            .pipeline()
            .by_name(name)
            .ok_or_else(|| sinkbridge::Error::ElementNotFound {
                name: name.to_owned(),
            })?;
        let appsink = element
            .downcast::<gst_app::AppSink>()
            .map_err(|_| sinkbridge::Error::NotASampleSink {
                name: name.to_owned(),
            })?;
        Ok(GstAppSink(appsink))
    }

    fn subscribe(
        &self,
        sink: &GstAppSink,
        handler: NewSampleHandler<GstAppSink>,
    ) -> sinkbridge::Result<AppSinkSubscription> {
        let appsink = sink.appsink().clone();
        appsink.set_property("emit-signals", true);

        let handler_id = appsink.connect("new-sample", false, move |args| {
            let appsink = match args[0].get::<gst_app::AppSink>() {
                Ok(appsink) => appsink,
                Err(err) => {
                    gst::error!(CAT, "new-sample emitted without an appsink: {}", err);
                    return Some(gst::FlowReturn::Error.to_value());
                }
            };

            let status = handler(&GstAppSink(appsink.clone()));
            if !status.is_ok() {
                appsink.post_error_message(gst::error_msg!(
                    gst::StreamError::Failed,
                    ["Consumer failed to take sample from {}", appsink.name()]
                ));
            }
            Some(flow_return(status).to_value())
        });

        gst::debug!(CAT, obj = &appsink, "Connected new-sample handler");
        Ok(AppSinkSubscription {
            appsink,
            handler_id: Some(handler_id),
        })
    }
}
