// SPDX-FileCopyrightText: 2025 Contributors to the sinkbridge project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for registration and delivery.
//!
//! Registration problems surface as [`Error`] and are returned to whoever is
//! building the pipeline. Consumer failures surface as [`DeliveryError`] and are
//! turned into a non-ok flow status by the extractor, which is the only channel
//! back into the pipeline runtime.

use crate::SinkId;

/// Convenience result type using [`Error`] as the error variant.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors raised while binding sinks or allocating identifiers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No element with this name exists in the pipeline.
    ///
    /// Not fatal to the bridge. Whether the pipeline can run without this sink
    /// is the caller's decision.
    #[error("Element not found: {name}")]
    ElementNotFound {
        /// Name that was looked up.
        name: String,
    },

    /// The element exists but cannot hand out samples (it is not an appsink).
    #[error("Element {name} does not produce pullable samples")]
    NotASampleSink {
        /// Name of the offending element.
        name: String,
    },

    /// A binding for this element name already exists.
    #[error("Sink {name} is already registered")]
    AlreadyRegistered {
        /// Name of the element that is already bound.
        name: String,
    },

    /// No binding exists for this element name.
    #[error("Sink {name} is not registered")]
    NotRegistered {
        /// Name that was looked up.
        name: String,
    },

    /// The identifier is already bound to another element.
    #[error("Sink identifier {0} is already in use")]
    DuplicateSinkId(SinkId),

    /// Every pipeline id has been handed out.
    #[error("Pipeline ids exhausted")]
    PipelineIdsExhausted,
}

/// Errors reported by a consumer for a single delivery.
///
/// The extractor never swallows these: each one becomes
/// [`FlowStatus::Error`](crate::FlowStatus::Error) for the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The consumer refused or failed to process the payload.
    #[error("Delivery rejected: {0}")]
    Rejected(String),

    /// No consumer is routed for this sink.
    #[error("No consumer for sink {0}")]
    UnknownSink(SinkId),

    /// The consumer side of a queued hand-off has gone away.
    #[error("Consumer disconnected")]
    Disconnected,

    /// Any other consumer failure.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl DeliveryError {
    /// Builds a [`DeliveryError::Rejected`] from anything printable.
    pub fn rejected(reason: impl Into<String>) -> Self {
        DeliveryError::Rejected(reason.into())
    }
}
