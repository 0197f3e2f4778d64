// SPDX-FileCopyrightText: 2025 Contributors to the sinkbridge project.
// SPDX-License-Identifier: Apache-2.0

//! Pipeline launch and lifecycle.
//!
//! A [`GstPipeline`] is built from a `gst-launch` style description and tagged
//! with the [`PipelineId`] that every sink identifier of that pipeline carries.
//! Dropping it sets the pipeline to NULL so no streaming thread outlives it.

use gst::prelude::*;
use gstreamer as gst;
use sinkbridge::{PipelineId, PipelineIds};

use crate::{CAT, Error, Result};

/// Process-wide pipeline id source; the first id handed out is 1.
static PIPELINE_IDS: PipelineIds = PipelineIds::new();

/// Allocates a fresh, never reused pipeline id.
pub fn next_pipeline_id() -> Result<PipelineId> {
    Ok(PIPELINE_IDS.allocate()?)
}

/// A GStreamer pipeline tagged with its bridge pipeline id.
#[derive(Debug)]
pub struct GstPipeline {
    pipeline: gst::Pipeline,
    id: PipelineId,
}

impl GstPipeline {
    /// Parses and instantiates `description`.
    ///
    /// # Errors
    ///
    /// - [`Error::Launch`] if the description does not parse or names an
    ///   unknown element
    /// - [`Error::NotAPipeline`] if it describes a single element
    pub fn launch(description: &str, id: PipelineId) -> Result<Self> {
        let element = gst::parse::launch(description)?;
        let pipeline = element
            .downcast::<gst::Pipeline>()
            .map_err(|_| Error::NotAPipeline)?;
        gst::debug!(CAT, obj = &pipeline, "Launched pipeline {}", id);
        Ok(GstPipeline { pipeline, id })
    }

    /// Wraps an already built pipeline.
    pub fn from_pipeline(pipeline: gst::Pipeline, id: PipelineId) -> Self {
        GstPipeline { pipeline, id }
    }

    /// The id stamped into every sink identifier of this pipeline.
    pub fn id(&self) -> PipelineId {
        self.id
    }

    /// The underlying GStreamer pipeline.
    pub fn pipeline(&self) -> &gst::Pipeline {
        &self.pipeline
    }

    /// The pipeline's message bus.
    pub fn bus(&self) -> Option<gst::Bus> {
        self.pipeline.bus()
    }

    /// Sets the pipeline to PLAYING.
    pub fn start(&self) -> Result<()> {
        self.pipeline.set_state(gst::State::Playing)?;
        gst::info!(CAT, obj = &self.pipeline, "Started");
        Ok(())
    }

    /// Sets the pipeline to NULL, stopping every streaming thread.
    pub fn stop(&self) -> Result<()> {
        self.pipeline.set_state(gst::State::Null)?;
        gst::info!(CAT, obj = &self.pipeline, "Stopped");
        Ok(())
    }

    /// Stops the pipeline and releases it, reporting a failed state change.
    pub fn close(self) -> Result<()> {
        self.stop()
    }
}

impl Drop for GstPipeline {
    fn drop(&mut self) {
        if let Err(err) = self.pipeline.set_state(gst::State::Null) {
            tracing::error!("Failed to stop pipeline {}: {}", self.id, err);
        }
    }
}
