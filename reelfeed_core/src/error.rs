// Copyright 2026 the Reelfeed Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.
//!
//! Nothing in a feed is fatal: these errors describe a single rejected
//! operation (an event for an id the feed doesn't know, a malformed
//! configuration value) and callers are expected to log and carry on.

use crate::feed::ItemId;

/// An operation referenced state the feed does not have.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum FeedError {
    /// The id does not belong to this feed.
    #[error("unknown feed item {0:?}")]
    UnknownItem(ItemId),
    /// Volume must lie in `0.0..=1.0`.
    #[error("volume {0} is outside 0.0..=1.0")]
    InvalidVolume(f32),
}

/// A configuration value could not be accepted.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Visibility thresholds are ratios in `0.0..=1.0`.
    #[error("threshold {0} is outside 0.0..=1.0")]
    InvalidThreshold(f32),
    /// A root margin needs one to four `px` or `%` components.
    #[error("malformed root margin {0:?}")]
    MalformedMargin(alloc::string::String),
}
