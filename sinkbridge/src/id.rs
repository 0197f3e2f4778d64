// SPDX-FileCopyrightText: 2025 Contributors to the sinkbridge project.
// SPDX-License-Identifier: Apache-2.0

//! Sink identifiers and their scalar encodings.
//!
//! A [`SinkId`] names one logical sink of one pipeline. It is a plain `Copy`
//! value: once a sink is registered the identifier never changes, and every
//! callback receives it by value.
//!
//! Where an identifier has to travel through an interface that only carries
//! integers, it can be packed into two `u32`s ([`SinkId::to_scalars`]) or into
//! a single opaque [`SinkHandle`].

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::{Error, Result};

/// Identifies one pipeline among several running concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PipelineId(u32);

impl PipelineId {
    /// Id used when only one pipeline exists and no disambiguation is needed.
    ///
    /// [`PipelineIds`] never hands this value out.
    pub const UNSPECIFIED: PipelineId = PipelineId(0);

    /// Wraps a raw pipeline id.
    pub const fn new(raw: u32) -> Self {
        PipelineId(raw)
    }

    /// Returns the raw pipeline id.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PipelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of stream a sink produces.
///
/// The three well-known kinds have fixed codes. Any other code is accepted so
/// new sink kinds (captions, data tracks) can be added without touching the
/// bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SinkType(u16);

impl SinkType {
    /// The raw transport stream, before any demuxing.
    pub const RAW: SinkType = SinkType(0);

    /// An encoded video elementary stream.
    pub const VIDEO: SinkType = SinkType(1);

    /// An encoded audio elementary stream.
    pub const AUDIO: SinkType = SinkType(2);

    /// Creates a sink type from its numeric code.
    pub const fn from_code(code: u16) -> Self {
        SinkType(code)
    }

    /// Returns the numeric code of this sink type.
    pub const fn code(self) -> u16 {
        self.0
    }
}

impl fmt::Display for SinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            SinkType::RAW => f.write_str("raw"),
            SinkType::VIDEO => f.write_str("video"),
            SinkType::AUDIO => f.write_str("audio"),
            SinkType(code) => write!(f, "type-{code}"),
        }
    }
}

/// Identifies a registered sink: which pipeline, which kind, which ordinal.
///
/// The fields are read-only; an identifier is built once when the sink is
/// registered and copied into every callback afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SinkId {
    pipeline_id: PipelineId,
    sink_type: SinkType,
    index: u16,
}

impl SinkId {
    /// Creates an identifier for the `index`-th sink of `sink_type` in a pipeline.
    pub const fn new(pipeline_id: PipelineId, sink_type: SinkType, index: u16) -> Self {
        SinkId {
            pipeline_id,
            sink_type,
            index,
        }
    }

    /// Creates an identifier for the first (often only) sink of a kind.
    pub const fn primary(pipeline_id: PipelineId, sink_type: SinkType) -> Self {
        SinkId::new(pipeline_id, sink_type, 0)
    }

    /// Pipeline the sink belongs to.
    pub const fn pipeline_id(&self) -> PipelineId {
        self.pipeline_id
    }

    /// Kind of stream the sink produces.
    pub const fn sink_type(&self) -> SinkType {
        self.sink_type
    }

    /// Ordinal among sinks of the same kind in the same pipeline.
    pub const fn index(&self) -> u16 {
        self.index
    }

    /// Packs the identifier into two unsigned integers.
    ///
    /// The first is the pipeline id; the second carries the sink type code in
    /// its lower 16 bits and the index in its upper 16 bits. A primary sink
    /// (index 0) therefore packs to exactly `(pipeline id, sink type)`.
    pub const fn to_scalars(&self) -> (u32, u32) {
        (
            self.pipeline_id.0,
            ((self.index as u32) << 16) | self.sink_type.0 as u32,
        )
    }

    /// Reverses [`Self::to_scalars`].
    pub const fn from_scalars(pipeline_id: u32, kind: u32) -> Self {
        SinkId {
            pipeline_id: PipelineId(pipeline_id),
            sink_type: SinkType((kind & 0xffff) as u16),
            index: (kind >> 16) as u16,
        }
    }

    /// Packs the identifier into a single opaque handle.
    pub const fn handle(&self) -> SinkHandle {
        let (pipeline_id, kind) = self.to_scalars();
        SinkHandle(((pipeline_id as u64) << 32) | kind as u64)
    }
}

impl fmt::Display for SinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.pipeline_id, self.sink_type, self.index)
    }
}

/// A [`SinkId`] packed into one `u64`.
///
/// Consumers that keep their own routing table keyed by integers can store the
/// handle and turn it back into an identifier with [`SinkHandle::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SinkHandle(u64);

impl SinkHandle {
    /// Wraps a raw handle value.
    pub const fn from_raw(raw: u64) -> Self {
        SinkHandle(raw)
    }

    /// Returns the raw handle value.
    pub const fn as_raw(self) -> u64 {
        self.0
    }

    /// Recovers the identifier this handle was built from.
    pub const fn resolve(self) -> SinkId {
        SinkId::from_scalars((self.0 >> 32) as u32, self.0 as u32)
    }
}

impl From<SinkId> for SinkHandle {
    fn from(id: SinkId) -> Self {
        id.handle()
    }
}

/// Allocates pipeline ids for concurrently running pipelines.
///
/// Ids start at 1 and are never reused. Running out is reported as an error
/// rather than wrapping back to an id that may still be live.
#[derive(Debug)]
pub struct PipelineIds {
    next: AtomicU32,
}

impl Default for PipelineIds {
    fn default() -> Self {
        PipelineIds::new()
    }
}

impl PipelineIds {
    /// Creates an allocator whose first id is 1.
    pub const fn new() -> Self {
        PipelineIds {
            next: AtomicU32::new(1),
        }
    }

    /// Hands out the next unused pipeline id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PipelineIdsExhausted`] once the id space is used up.
    pub fn allocate(&self) -> Result<PipelineId> {
        self.next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |next| {
                next.checked_add(1)
            })
            .map(PipelineId)
            .map_err(|_| Error::PipelineIdsExhausted)
    }
}
