// SPDX-FileCopyrightText: 2025 Contributors to the sinkbridge project.
// SPDX-License-Identifier: Apache-2.0

//! Bridge configuration.
//!
//! The ownership policy is a deployment-wide choice: one bridge either copies
//! every sample out or transfers every sample, never a mix. [`Settings`] can be
//! embedded in a host application's own configuration file.

use serde::{Deserialize, Serialize};

/// Default ownership policy.
pub const DEFAULT_POLICY: CopyPolicy = CopyPolicy::Copy;

/// Default capacity of a queued hand-off (see [`crate::queue::bounded`]).
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// How sample data crosses from the pipeline to the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CopyPolicy {
    /// Copy the buffer bytes out and release the pipeline sample before
    /// delivering.
    #[default]
    Copy,

    /// Hand the pipeline sample itself to the consumer, which releases it.
    Transfer,
}

/// User-facing bridge settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Ownership policy for every sink of the bridge.
    pub policy: CopyPolicy,

    /// Number of payloads a queued hand-off buffers before dropping.
    pub queue_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            policy: DEFAULT_POLICY,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}
