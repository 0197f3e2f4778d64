// SPDX-FileCopyrightText: 2025 Contributors to the sinkbridge project.
// SPDX-License-Identifier: Apache-2.0

//! # sinkbridge
//!
//! Hands media samples from the sink elements of a running pipeline to a
//! consumer, safely, on the pipeline's own streaming threads.
//!
//! ## Overview
//!
//! A pipeline produces samples on named sinks (raw transport stream, encoded
//! video, encoded audio, ...). The bridge attaches to those sinks, and each
//! time one of them has a sample ready it pulls the sample, extracts its bytes
//! and timing, and calls the consumer with the sink's identifier. The
//! consumer's answer goes back to the pipeline as a flow status.
//!
//! ### Key Concepts
//!
//! - **Sink identifier** ([`SinkId`]): which pipeline, which kind of stream,
//!   which ordinal. Immutable once registered; packable into integers
//!   ([`SinkId::to_scalars`], [`SinkHandle`]).
//! - **Registry** ([`SinkRegistry`]): the explicit table binding element names
//!   to identifiers and live subscriptions.
//! - **Extractor** ([`SampleExtractor`]): the per-notification data path.
//! - **Delivery** ([`Delivery`]): the consumer entry point. [`DeliveryRouter`]
//!   dispatches per sink; [`queue::bounded`] moves work off the streaming
//!   thread.
//! - **Ownership policy** ([`CopyPolicy`]): either every payload is a
//!   standalone copy ([`CopiedSample`]) or every payload is the pipeline's own
//!   sample behind a move-only handle ([`OwnedSample`]).
//!
//! ## Architecture
//!
//! ```text
//! pipeline streaming thread
//!   │  new-sample
//!   ▼
//! SinkRegistry handler ── SampleExtractor ── Delivery ──► consumer
//!   (captures SinkId)      pull / copy or      (router, queue,
//!                          transfer            closure, ...)
//! ```
//!
//! The pipeline runtime itself is abstracted by the traits in [`backend`]; the
//! `gst-sinkbridge` crate implements them for GStreamer.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sinkbridge::{
//!     CopyPolicy, DeliveryError, Payload, PipelineBackend, PipelineId, SampleExtractor,
//!     SampleOf, SinkId, SinkRegistry, SinkType,
//! };
//!
//! fn attach<B: PipelineBackend>(pipeline: &B) -> sinkbridge::Result<SinkRegistry<B>> {
//!     let consumer = |sink: SinkId, payload: Payload<SampleOf<B>>| -> Result<(), DeliveryError> {
//!         println!("{sink}: {} bytes, duration {}", payload.len(), payload.duration());
//!         Ok(())
//!     };
//!     let mut registry = SinkRegistry::new(SampleExtractor::new(CopyPolicy::Copy, Arc::new(consumer)));
//!     registry.register(pipeline, "video", SinkId::primary(PipelineId::new(1), SinkType::VIDEO))?;
//!     Ok(registry)
//! }
//! ```
//!
//! ## Thread Safety
//!
//! The bridge starts no threads. Handlers run on whichever thread the pipeline
//! runtime calls them from, possibly several at once for different sinks. The
//! only state they share is immutable (identifiers, policy) or atomic
//! (counters).

pub mod backend;
pub mod config;
mod delivery;
mod error;
mod extractor;
mod id;
pub mod queue;
mod registry;
mod sample;

pub use backend::{BufferInfo, MediaSample, NewSampleHandler, PipelineBackend, SinkElement};
pub use config::{CopyPolicy, Settings};
pub use delivery::{Delivery, DeliveryRouter, FlowStatus};
pub use error::{DeliveryError, Error, Result};
pub use extractor::{SampleExtractor, SinkStats, SinkStatsSnapshot};
pub use id::{PipelineId, PipelineIds, SinkHandle, SinkId, SinkType};
pub use registry::{SampleOf, SinkRegistry};
pub use sample::{CopiedSample, OwnedSample, Payload, SampleDuration};
