// SPDX-FileCopyrightText: 2025 Contributors to the sinkbridge project.
// SPDX-License-Identifier: Apache-2.0

use gstreamer as gst;

/// Convenience result type using [`Error`] as the error variant.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors raised by the GStreamer backend.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Binding a sink failed in the bridge core.
    #[error(transparent)]
    Bridge(#[from] sinkbridge::Error),

    /// The pipeline description could not be parsed or instantiated.
    #[error("Failed to launch pipeline: {0}")]
    Launch(#[from] glib::Error),

    /// The description produced a single element rather than a pipeline.
    #[error("Launch description did not produce a pipeline")]
    NotAPipeline,

    /// The pipeline refused a state change.
    #[error("Pipeline state change failed: {0}")]
    StateChange(#[from] gst::StateChangeError),

    /// GStreamer itself could not be initialized.
    #[error("Failed to initialize GStreamer: {0}")]
    Init(glib::Error),
}
