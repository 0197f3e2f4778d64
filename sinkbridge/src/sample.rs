// SPDX-FileCopyrightText: 2025 Contributors to the sinkbridge project.
// SPDX-License-Identifier: Apache-2.0

//! Delivered sample payloads.
//!
//! What a consumer receives depends on the bridge's [`CopyPolicy`]:
//!
//! - [`CopiedSample`]: a standalone copy of the buffer bytes. The pipeline's
//!   sample was released before the consumer was called, so nothing in here
//!   aliases pipeline memory.
//! - [`OwnedSample`]: the pipeline's sample itself. The consumer now holds the
//!   only reference the bridge took, and releases it exactly once by dropping
//!   the handle (or calling [`OwnedSample::release`]).

use std::fmt;
use std::ops::Deref;
use std::time::Duration;

use crate::backend::MediaSample;
use crate::config::CopyPolicy;

/// Duration of a sample, which the pipeline may have left unset.
///
/// An unset duration stays [`SampleDuration::Unknown`] end to end; it is never
/// turned into zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SampleDuration {
    /// The pipeline stamped the buffer with this duration.
    Known(Duration),

    /// The pipeline did not set a duration.
    #[default]
    Unknown,
}

impl SampleDuration {
    /// Returns the duration if the pipeline set one.
    pub const fn known(self) -> Option<Duration> {
        match self {
            SampleDuration::Known(duration) => Some(duration),
            SampleDuration::Unknown => None,
        }
    }

    /// True if the pipeline set a duration.
    pub const fn is_known(self) -> bool {
        matches!(self, SampleDuration::Known(_))
    }
}

impl From<Option<Duration>> for SampleDuration {
    fn from(value: Option<Duration>) -> Self {
        value.map_or(SampleDuration::Unknown, SampleDuration::Known)
    }
}

impl From<Duration> for SampleDuration {
    fn from(value: Duration) -> Self {
        SampleDuration::Known(value)
    }
}

impl fmt::Display for SampleDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleDuration::Known(duration) => write!(f, "{duration:?}"),
            SampleDuration::Unknown => f.write_str("unknown"),
        }
    }
}

/// Bridge-owned copy of one sample's buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopiedSample {
    /// The buffer bytes, copied out of pipeline memory.
    pub data: Vec<u8>,

    /// Buffer duration as stamped by the pipeline.
    pub duration: SampleDuration,

    /// Presentation timestamp, if the pipeline set one.
    pub pts: Option<Duration>,
}

impl CopiedSample {
    /// Number of payload bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the buffer was empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Owning handle to a pipeline sample handed over without copying.
///
/// There is exactly one release path: dropping the handle releases the
/// underlying sample. [`OwnedSample::into_inner`] moves the sample out so the
/// consumer can hand it on; it is then released wherever it is finally dropped.
pub struct OwnedSample<S> {
    sample: S,
}

impl<S: MediaSample> OwnedSample<S> {
    pub(crate) fn new(sample: S) -> Self {
        OwnedSample { sample }
    }

    /// Releases the sample now rather than at the end of scope.
    pub fn release(self) {
        drop(self)
    }

    /// Takes the backend sample out of the handle.
    pub fn into_inner(self) -> S {
        self.sample
    }

    /// Number of bytes in the sample's buffer (0 if there is none).
    pub fn len(&self) -> usize {
        self.sample.buffer_info().map_or(0, |info| info.size)
    }

    /// True if the sample has no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Buffer duration, [`SampleDuration::Unknown`] if unset or bufferless.
    pub fn duration(&self) -> SampleDuration {
        self.sample
            .buffer_info()
            .map_or(SampleDuration::Unknown, |info| info.duration)
    }

    /// Presentation timestamp, if set.
    pub fn pts(&self) -> Option<Duration> {
        self.sample.buffer_info().and_then(|info| info.pts)
    }

    /// Copies the buffer bytes out of the sample.
    pub fn to_copied(&self) -> CopiedSample {
        let info = self.sample.buffer_info().unwrap_or_default();
        let mut data = vec![0; info.size];
        let extracted = self.sample.extract(&mut data);
        data.truncate(extracted);
        CopiedSample {
            data,
            duration: info.duration,
            pts: info.pts,
        }
    }
}

impl<S> Deref for OwnedSample<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.sample
    }
}

impl<S> fmt::Debug for OwnedSample<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedSample").finish_non_exhaustive()
    }
}

/// What a consumer receives for one sample.
#[derive(Debug)]
pub enum Payload<S> {
    /// Produced under [`CopyPolicy::Copy`].
    Copied(CopiedSample),

    /// Produced under [`CopyPolicy::Transfer`].
    Transferred(OwnedSample<S>),
}

impl<S: MediaSample> Payload<S> {
    /// The policy this payload was produced under.
    pub fn policy(&self) -> CopyPolicy {
        match self {
            Payload::Copied(_) => CopyPolicy::Copy,
            Payload::Transferred(_) => CopyPolicy::Transfer,
        }
    }

    /// Number of payload bytes.
    pub fn len(&self) -> usize {
        match self {
            Payload::Copied(copied) => copied.len(),
            Payload::Transferred(owned) => owned.len(),
        }
    }

    /// True if the payload carries no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Payload duration.
    pub fn duration(&self) -> SampleDuration {
        match self {
            Payload::Copied(copied) => copied.duration,
            Payload::Transferred(owned) => owned.duration(),
        }
    }

    /// Presentation timestamp.
    pub fn pts(&self) -> Option<Duration> {
        match self {
            Payload::Copied(copied) => copied.pts,
            Payload::Transferred(owned) => owned.pts(),
        }
    }

    /// Converts into a standalone copy, releasing a transferred sample.
    pub fn into_copied(self) -> CopiedSample {
        match self {
            Payload::Copied(copied) => copied,
            Payload::Transferred(owned) => owned.to_copied(),
        }
    }
}
