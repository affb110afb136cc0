// Copyright 2026 the Reelfeed Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The feed: items, presentation order, and the feed-wide audio context.
//!
//! Items are stored in creation order and addressed by [`ItemId`]. The
//! presentation order is a separate permutation so that shuffling never
//! invalidates an id handed out to the platform layer.

use alloc::string::String;
use alloc::vec::Vec;

use rand::Rng;

use crate::error::FeedError;
use crate::video::{PlaybackState, SourceRef, Video};

/// Stable handle for a feed item (its index in creation order).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(pub u32);

impl ItemId {
    /// Returns the creation index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// One feed slot.
#[derive(Clone, Debug)]
pub struct Item {
    video: Video,
    ratio: f32,
    title: Option<String>,
}

impl Item {
    /// Creates an item around a video source.
    #[must_use]
    pub fn new(source: SourceRef) -> Self {
        Self {
            video: Video::new(source),
            ratio: 0.0,
            title: None,
        }
    }

    /// Attaches a display title (used when reporting views).
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// The item's video.
    #[must_use]
    pub fn video(&self) -> &Video {
        &self.video
    }

    /// Last reported playback-visibility ratio.
    #[must_use]
    pub const fn ratio(&self) -> f32 {
        self.ratio
    }

    /// The item's title, if the markup had one.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }
}

/// Feed-wide audio settings shared by every video.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AudioSettings {
    /// Whether every video is muted.
    pub muted: bool,
    /// Volume applied to every video, `0.0..=1.0`.
    pub volume: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            muted: true,
            volume: 0.5,
        }
    }
}

/// An ordered collection of items with fixed membership.
#[derive(Clone, Debug, Default)]
pub struct Feed {
    items: Vec<Item>,
    order: Vec<ItemId>,
    positions: Vec<usize>,
    audio: AudioSettings,
}

impl Feed {
    /// Creates a feed in the given presentation order.
    #[must_use]
    pub fn new(items: Vec<Item>) -> Self {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "a page never holds 2^32 videos"
        )]
        let order: Vec<ItemId> = (0..items.len()).map(|i| ItemId(i as u32)).collect();
        let positions = (0..items.len()).collect();
        Self {
            items,
            order,
            positions,
            audio: AudioSettings::default(),
        }
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the feed has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Ids in presentation order.
    #[must_use]
    pub fn order(&self) -> &[ItemId] {
        &self.order
    }

    /// Ids in creation order.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "a page never holds 2^32 videos"
    )]
    pub fn ids(&self) -> impl Iterator<Item = ItemId> + use<> {
        (0..self.items.len() as u32).map(ItemId)
    }

    /// Presentation position of `id`.
    pub fn position(&self, id: ItemId) -> Result<usize, FeedError> {
        self.positions
            .get(id.index())
            .copied()
            .ok_or(FeedError::UnknownItem(id))
    }

    /// The id shown at `position`, if any.
    #[must_use]
    pub fn at(&self, position: usize) -> Option<ItemId> {
        self.order.get(position).copied()
    }

    /// Looks up an item.
    pub fn item(&self, id: ItemId) -> Result<&Item, FeedError> {
        self.items.get(id.index()).ok_or(FeedError::UnknownItem(id))
    }

    pub(crate) fn item_mut(&mut self, id: ItemId) -> Result<&mut Item, FeedError> {
        self.items
            .get_mut(id.index())
            .ok_or(FeedError::UnknownItem(id))
    }

    /// Playback state of `id`.
    pub fn state(&self, id: ItemId) -> Result<PlaybackState, FeedError> {
        Ok(self.item(id)?.video.state())
    }

    /// Moves `id` to `next`, returning the previous state.
    pub(crate) fn set_state(
        &mut self,
        id: ItemId,
        next: PlaybackState,
    ) -> Result<PlaybackState, FeedError> {
        Ok(self.item_mut(id)?.video.set_state(next))
    }

    pub(crate) fn set_ratio(&mut self, id: ItemId, ratio: f32) -> Result<(), FeedError> {
        self.item_mut(id)?.ratio = ratio.clamp(0.0, 1.0);
        Ok(())
    }

    /// The feed-wide audio settings.
    #[must_use]
    pub const fn audio(&self) -> AudioSettings {
        self.audio
    }

    pub(crate) fn set_audio(&mut self, audio: AudioSettings) {
        self.audio = audio;
    }

    /// Number of videos currently in [`PlaybackState::Playing`].
    #[must_use]
    pub fn playing_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.video.state() == PlaybackState::Playing)
            .count()
    }

    /// Randomizes the presentation order with an unbiased shuffle.
    ///
    /// Ids stay valid; only [`order`](Self::order) and
    /// [`position`](Self::position) change.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        shuffle(&mut self.order, rng);
        for (position, id) in self.order.iter().enumerate() {
            self.positions[id.index()] = position;
        }
    }
}

/// Fisher–Yates shuffle.
///
/// For `i` from `n - 1` down to `1`, swaps `i` with a uniformly chosen
/// `j` in `0..=i`. Every permutation is equally likely. Slices of length
/// 0 or 1 are left untouched.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;
    use alloc::vec;
    use rand::SeedableRng as _;
    use rand::rngs::StdRng;

    fn feed_of(n: usize) -> Feed {
        Feed::new(
            (0..n)
                .map(|i| Item::new(SourceRef::Deferred(format!("v{i}.mp4"))))
                .collect(),
        )
    }

    #[test]
    fn shuffle_is_uniform_over_permutations() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut counts = [0_u32; 6];
        let runs = 60_000;
        for _ in 0..runs {
            let mut v = [0_u8, 1, 2];
            shuffle(&mut v, &mut rng);
            let idx = match v {
                [0, 1, 2] => 0,
                [0, 2, 1] => 1,
                [1, 0, 2] => 2,
                [1, 2, 0] => 3,
                [2, 0, 1] => 4,
                [2, 1, 0] => 5,
                _ => unreachable!("not a permutation: {v:?}"),
            };
            counts[idx] += 1;
        }
        // Expected 10_000 each; a biased swap direction skews some
        // permutations to ~7_400 or ~14_800.
        for (i, &c) in counts.iter().enumerate() {
            assert!((9_400..=10_600).contains(&c), "perm {i} drawn {c} times");
        }
    }

    #[test]
    fn shuffle_tiny_feeds_is_noop() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut empty: [u8; 0] = [];
        shuffle(&mut empty, &mut rng);
        let mut one = [7_u8];
        shuffle(&mut one, &mut rng);
        assert_eq!(one, [7]);
    }

    #[test]
    fn feed_shuffle_keeps_ids_and_updates_positions() {
        let mut feed = feed_of(8);
        let mut rng = StdRng::seed_from_u64(42);
        feed.shuffle(&mut rng);

        let mut seen = feed.order().to_vec();
        seen.sort();
        assert_eq!(seen, (0..8).map(ItemId).collect::<Vec<_>>());

        for (pos, &id) in feed.order().iter().enumerate() {
            assert_eq!(feed.position(id), Ok(pos));
            assert_eq!(feed.at(pos), Some(id));
        }
        assert_eq!(feed.item(ItemId(3)).unwrap().video().source().url(), "v3.mp4");
    }

    #[test]
    fn unknown_ids_are_errors() {
        let feed = feed_of(2);
        assert_eq!(feed.position(ItemId(9)), Err(FeedError::UnknownItem(ItemId(9))));
        assert!(feed.item(ItemId(2)).is_err());
    }

    #[test]
    fn default_audio_is_muted_half_volume() {
        let feed = Feed::new(vec![]);
        assert!(feed.is_empty());
        assert_eq!(
            feed.audio(),
            AudioSettings {
                muted: true,
                volume: 0.5
            }
        );
    }
}
