// SPDX-FileCopyrightText: 2025 Contributors to the sinkbridge project.
// SPDX-License-Identifier: Apache-2.0

use gstreamer as gst;
use sinkbridge::FlowStatus;

/// Maps a bridge flow status onto the value a `new-sample` handler returns.
pub fn flow_return(status: FlowStatus) -> gst::FlowReturn {
    match status {
        FlowStatus::Ok => gst::FlowReturn::Ok,
        FlowStatus::Error => gst::FlowReturn::Error,
    }
}

/// Maps a bridge flow status onto the `Result` form used by element callbacks.
pub fn flow_result(status: FlowStatus) -> Result<gst::FlowSuccess, gst::FlowError> {
    match status {
        FlowStatus::Ok => Ok(gst::FlowSuccess::Ok),
        FlowStatus::Error => Err(gst::FlowError::Error),
    }
}
