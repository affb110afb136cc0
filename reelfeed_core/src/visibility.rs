// Copyright 2026 the Reelfeed Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visibility notifications.

use alloc::vec::Vec;

use crate::feed::{Feed, ItemId};
use crate::profile::ObserverConfig;

/// One observer report for one item.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibilityEntry {
    /// Which item.
    pub item: ItemId,
    /// Whether the item intersects the (margin-adjusted) root.
    pub intersecting: bool,
    /// Fraction of the item that is visible, `0.0..=1.0`.
    pub ratio: f32,
}

impl VisibilityEntry {
    /// Convenience constructor for an intersecting entry.
    #[must_use]
    pub const fn visible(item: ItemId, ratio: f32) -> Self {
        Self {
            item,
            intersecting: true,
            ratio,
        }
    }

    /// Convenience constructor for an entry that left the root.
    #[must_use]
    pub const fn hidden(item: ItemId) -> Self {
        Self {
            item,
            intersecting: false,
            ratio: 0.0,
        }
    }
}

/// A batch split by threshold, each half in ascending position order.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct SortedBatch {
    pub(crate) below: Vec<VisibilityEntry>,
    pub(crate) above: Vec<VisibilityEntry>,
}

/// Splits a notification batch into below- and above-threshold entries,
/// ordered by presentation position. Entries for unknown items are dropped.
pub(crate) fn sort_batch(
    entries: &[VisibilityEntry],
    feed: &Feed,
    config: &ObserverConfig,
) -> SortedBatch {
    let mut keyed: Vec<(usize, VisibilityEntry)> = entries
        .iter()
        .filter_map(|e| feed.position(e.item).ok().map(|p| (p, *e)))
        .collect();
    keyed.sort_by_key(|(pos, _)| *pos);

    let mut batch = SortedBatch::default();
    for (_, entry) in keyed {
        if config.admits(entry.intersecting, entry.ratio) {
            batch.above.push(entry);
        } else {
            batch.below.push(entry);
        }
    }
    batch
}
