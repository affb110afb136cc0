// Copyright 2026 the Reelfeed Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Progressive source resolution around the visible item.
//!
//! The [`Loader`] keeps a window of resolved videos around whichever item
//! the load observer last reported: [`LoaderConfig::preload_ahead`] items in
//! the scroll direction and [`LoaderConfig::preload_behind`] against it.
//! Requests go through a [`LoadQueue`] ordered by priority, so items in the
//! scroll direction are attached first.
//!
//! With [`LoaderConfig::inter_item_delay`] set, the queue is drained one
//! item at a time: the next transfer starts only after the previous one
//! finished (or failed) and the delay elapsed. Otherwise every queued item
//! is attached at once.
//!
//! Completions and retry timers are checked against the video's current
//! state before being applied; a video that was unresolved in the meantime
//! ignores them.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::backend::MediaHost;
use crate::error::FeedError;
use crate::feed::{Feed, ItemId};
use crate::profile::LoaderConfig;
use crate::time::{Duration, HostTime};
use crate::trace::{
    LoadCompleteEvent, LoadFailedEvent, LoadStartedEvent, StateChangeEvent, Tracer, UnloadEvent,
};
use crate::video::PlaybackState;
use crate::visibility::VisibilityEntry;

/// Which way the user last scrolled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ScrollDirection {
    /// Toward higher positions.
    #[default]
    Forward,
    /// Toward lower positions.
    Backward,
}

/// Pending resolution requests; each item at most once, lowest priority
/// value first, ties in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadQueue {
    entries: Vec<(ItemId, u32)>,
}

impl LoadQueue {
    /// Creates an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Queues `id`. An item already queued keeps the more urgent of the two
    /// priorities. Returns `true` if the item was not queued before.
    pub fn push(&mut self, id: ItemId, priority: u32) -> bool {
        if let Some(entry) = self.entries.iter_mut().find(|(queued, _)| *queued == id) {
            entry.1 = entry.1.min(priority);
            return false;
        }
        self.entries.push((id, priority));
        true
    }

    /// Removes and returns the most urgent item.
    pub fn pop(&mut self) -> Option<ItemId> {
        let (idx, _) = self
            .entries
            .iter()
            .enumerate()
            .min_by_key(|(idx, (_, priority))| (*priority, *idx))?;
        Some(self.entries.remove(idx).0)
    }

    /// Drops `id` from the queue. Returns `true` if it was queued.
    pub fn remove(&mut self, id: ItemId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(queued, _)| *queued != id);
        self.entries.len() != before
    }

    /// Whether `id` is queued.
    #[must_use]
    pub fn contains(&self, id: ItemId) -> bool {
        self.entries.iter().any(|(queued, _)| *queued == id)
    }

    /// Number of queued items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Timing of a finished transfer, for performance reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadReport {
    /// Which item.
    pub item: ItemId,
    /// Time from attach to first playable data.
    pub elapsed: Duration,
}

#[derive(Clone, Copy, Debug)]
struct Retry {
    item: ItemId,
    at: HostTime,
}

/// Resolves video sources in a window around the visible item.
#[derive(Debug)]
pub struct Loader {
    config: LoaderConfig,
    current: Option<usize>,
    direction: ScrollDirection,
    queue: LoadQueue,
    in_flight: BTreeMap<ItemId, HostTime>,
    attempts: BTreeMap<ItemId, u8>,
    retries: Vec<Retry>,
    next_slot: HostTime,
    protected: Option<ItemId>,
}

impl Loader {
    /// Creates an idle loader.
    #[must_use]
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            config,
            current: None,
            direction: ScrollDirection::Forward,
            queue: LoadQueue::new(),
            in_flight: BTreeMap::new(),
            attempts: BTreeMap::new(),
            retries: Vec::new(),
            next_slot: HostTime(0),
            protected: None,
        }
    }

    /// The loader's configuration.
    #[must_use]
    pub const fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Position the window is centered on.
    #[must_use]
    pub const fn current(&self) -> Option<usize> {
        self.current
    }

    /// Last observed scroll direction.
    #[must_use]
    pub const fn direction(&self) -> ScrollDirection {
        self.direction
    }

    /// The pending queue.
    #[must_use]
    pub const fn queue(&self) -> &LoadQueue {
        &self.queue
    }

    /// Whether the loader serializes transfers.
    #[must_use]
    pub const fn is_serialized(&self) -> bool {
        self.config.inter_item_delay.is_some()
    }

    /// Number of transfers currently running.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Whether a failed transfer of `id` is waiting for its retry.
    #[must_use]
    pub fn retry_pending(&self, id: ItemId) -> bool {
        self.retries.iter().any(|r| r.item == id)
    }

    /// Marks the most recently active item so distant unloading skips it.
    pub fn protect(&mut self, id: Option<ItemId>) {
        self.protected = id;
    }

    /// Centers the window on the first item. Called once observation starts.
    pub fn start(
        &mut self,
        feed: &mut Feed,
        now: HostTime,
        host: &mut dyn MediaHost,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), FeedError> {
        match feed.at(0) {
            Some(first) => self.focus(feed, first, now, host, tracer),
            None => Ok(()),
        }
    }

    /// Handles a batch from the load observer. Each admitted entry, in
    /// ascending position, moves the window; the last one wins.
    pub fn on_visibility(
        &mut self,
        entries: &[VisibilityEntry],
        feed: &mut Feed,
        now: HostTime,
        host: &mut dyn MediaHost,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), FeedError> {
        let batch = crate::visibility::sort_batch(entries, feed, &self.config.observer);
        for entry in batch.above {
            self.focus(feed, entry.item, now, host, tracer)?;
        }
        Ok(())
    }

    /// Moves the window to `id`, queues the window members, unloads
    /// distant items, and starts whatever transfers the mode allows.
    pub fn focus(
        &mut self,
        feed: &mut Feed,
        id: ItemId,
        now: HostTime,
        host: &mut dyn MediaHost,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), FeedError> {
        let pos = feed.position(id)?;
        self.direction = match self.current {
            Some(prev) if pos < prev => ScrollDirection::Backward,
            Some(prev) if pos == prev => self.direction,
            _ => ScrollDirection::Forward,
        };
        self.current = Some(pos);

        self.enqueue(feed, id, 0)?;
        let (forward, backward) = match self.direction {
            ScrollDirection::Forward => (self.config.preload_ahead, self.config.preload_behind),
            ScrollDirection::Backward => (self.config.preload_behind, self.config.preload_ahead),
        };
        let ahead = self.config.preload_ahead;
        for d in 1..=ahead.max(self.config.preload_behind) {
            let d32 = u32::try_from(d).unwrap_or(u32::MAX);
            let lead = u32::try_from(ahead).unwrap_or(u32::MAX);
            let (fwd_pri, back_pri) = match self.direction {
                ScrollDirection::Forward => (d32, lead.saturating_add(d32)),
                ScrollDirection::Backward => (lead.saturating_add(d32), d32),
            };
            if d <= forward
                && let Some(next) = feed.at(pos + d)
            {
                self.enqueue(feed, next, fwd_pri)?;
            }
            if d <= backward
                && let Some(prev) = pos.checked_sub(d).and_then(|p| feed.at(p))
            {
                self.enqueue(feed, prev, back_pri)?;
            }
        }

        self.unload_distant(feed, host, tracer)?;
        self.pump(feed, now, host, tracer)
    }

    fn enqueue(&mut self, feed: &Feed, id: ItemId, priority: u32) -> Result<(), FeedError> {
        if feed.state(id)? == PlaybackState::Unloaded {
            self.queue.push(id, priority);
        }
        Ok(())
    }

    /// Attaches `id`'s source unless it is already loading or loaded.
    /// Returns `true` if a transfer started.
    pub fn resolve(
        &mut self,
        feed: &mut Feed,
        id: ItemId,
        now: HostTime,
        host: &mut dyn MediaHost,
        tracer: &mut Tracer<'_>,
    ) -> Result<bool, FeedError> {
        let from = feed.state(id)?;
        if from.is_resolved_or_pending() {
            return Ok(false);
        }
        self.queue.remove(id);
        feed.set_state(id, PlaybackState::Loading)?;
        tracer.state_change(&StateChangeEvent {
            item: id,
            from,
            to: PlaybackState::Loading,
        });
        host.attach_source(id, feed.item(id)?.video().source().url());
        self.in_flight.insert(id, now);
        tracer.load_started(&LoadStartedEvent {
            item: id,
            position: feed.position(id)?,
            at: now,
            attempt: self.attempts.get(&id).copied().unwrap_or(0),
        });
        Ok(true)
    }

    /// Starts queued transfers the current mode allows.
    pub fn pump(
        &mut self,
        feed: &mut Feed,
        now: HostTime,
        host: &mut dyn MediaHost,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), FeedError> {
        if self.is_serialized() {
            if !self.in_flight.is_empty() || now < self.next_slot {
                return Ok(());
            }
            while let Some(id) = self.queue.pop() {
                if self.resolve(feed, id, now, host, tracer)? {
                    break;
                }
            }
        } else {
            while let Some(id) = self.queue.pop() {
                self.resolve(feed, id, now, host, tracer)?;
            }
        }
        Ok(())
    }

    /// Records a finished transfer. Returns `None` for a stale completion
    /// (the video is no longer loading).
    pub fn on_loaded(
        &mut self,
        feed: &mut Feed,
        id: ItemId,
        now: HostTime,
        host: &mut dyn MediaHost,
        tracer: &mut Tracer<'_>,
    ) -> Result<Option<LoadReport>, FeedError> {
        if feed.state(id)? != PlaybackState::Loading {
            return Ok(None);
        }
        feed.set_state(id, PlaybackState::Ready)?;
        tracer.state_change(&StateChangeEvent {
            item: id,
            from: PlaybackState::Loading,
            to: PlaybackState::Ready,
        });
        let started = self.in_flight.remove(&id).unwrap_or(now);
        let report = LoadReport {
            item: id,
            elapsed: now.saturating_duration_since(started),
        };
        tracer.load_complete(&LoadCompleteEvent {
            item: id,
            elapsed: report.elapsed,
        });
        self.attempts.remove(&id);
        self.open_next_slot(now);
        self.pump(feed, now, host, tracer)?;
        Ok(Some(report))
    }

    /// Records a failed transfer and schedules a retry if the policy allows.
    pub fn on_failed(
        &mut self,
        feed: &mut Feed,
        id: ItemId,
        now: HostTime,
        host: &mut dyn MediaHost,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), FeedError> {
        if feed.state(id)? != PlaybackState::Loading {
            return Ok(());
        }
        feed.set_state(id, PlaybackState::Errored)?;
        tracer.state_change(&StateChangeEvent {
            item: id,
            from: PlaybackState::Loading,
            to: PlaybackState::Errored,
        });
        self.in_flight.remove(&id);

        let attempts = self.attempts.get(&id).copied().unwrap_or(0);
        let retry_at = match self.config.retry {
            Some(policy) if attempts < policy.max_attempts => {
                let at = now.saturating_add(policy.delay);
                self.attempts.insert(id, attempts + 1);
                self.retries.push(Retry { item: id, at });
                Some(at)
            }
            _ => None,
        };
        tracer.load_failed(&LoadFailedEvent {
            item: id,
            at: now,
            retry_at,
        });
        self.open_next_slot(now);
        self.pump(feed, now, host, tracer)
    }

    fn open_next_slot(&mut self, now: HostTime) {
        if let Some(delay) = self.config.inter_item_delay {
            self.next_slot = now.saturating_add(delay);
        }
    }

    /// Fires due retries and starts transfers whose slot has opened.
    pub fn poll(
        &mut self,
        feed: &mut Feed,
        now: HostTime,
        host: &mut dyn MediaHost,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), FeedError> {
        let (due, pending): (Vec<Retry>, Vec<Retry>) =
            self.retries.drain(..).partition(|r| r.at <= now);
        self.retries = pending;
        for retry in due {
            // Void if the item was unresolved or reloaded in the meantime.
            if feed.state(retry.item)? != PlaybackState::Errored {
                continue;
            }
            feed.set_state(retry.item, PlaybackState::Unloaded)?;
            tracer.state_change(&StateChangeEvent {
                item: retry.item,
                from: PlaybackState::Errored,
                to: PlaybackState::Unloaded,
            });
            self.queue.push(retry.item, 0);
        }
        self.pump(feed, now, host, tracer)
    }

    /// Earliest time [`poll`](Self::poll) has work to do.
    #[must_use]
    pub fn next_wakeup(&self) -> Option<HostTime> {
        let retry = self.retries.iter().map(|r| r.at).min();
        let slot = (self.is_serialized() && self.in_flight.is_empty() && !self.queue.is_empty())
            .then_some(self.next_slot);
        match (retry, slot) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Clears sources further than the unload distance from the window
    /// center, sparing the playing and the most recently active item.
    fn unload_distant(
        &mut self,
        feed: &mut Feed,
        host: &mut dyn MediaHost,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), FeedError> {
        let (Some(max), Some(center)) = (self.config.unload_distance, self.current) else {
            return Ok(());
        };
        let order = feed.order().to_vec();
        for (pos, id) in order.into_iter().enumerate() {
            let distance = pos.abs_diff(center);
            if distance <= max || Some(id) == self.protected {
                continue;
            }
            self.queue.remove(id);
            let from = feed.state(id)?;
            if matches!(from, PlaybackState::Unloaded | PlaybackState::Playing) {
                continue;
            }
            feed.set_state(id, PlaybackState::Unloaded)?;
            host.detach_source(id);
            self.queue.remove(id);
            self.in_flight.remove(&id);
            self.attempts.remove(&id);
            self.retries.retain(|r| r.item != id);
            tracer.state_change(&StateChangeEvent {
                item: id,
                from,
                to: PlaybackState::Unloaded,
            });
            tracer.unload(&UnloadEvent { item: id, distance });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{AudioSettings, Item};
    use crate::profile::{LoadingProfile, RetryPolicy};
    use crate::video::SourceRef;
    use alloc::format;

    #[derive(Debug, Default)]
    struct AttachLog {
        attached: Vec<ItemId>,
        detached: Vec<ItemId>,
    }

    impl MediaHost for AttachLog {
        fn attach_source(&mut self, id: ItemId, _url: &str) {
            self.attached.push(id);
        }
        fn detach_source(&mut self, id: ItemId) {
            self.detached.push(id);
        }
        fn play(&mut self, _id: ItemId) {}
        fn pause(&mut self, _id: ItemId) {}
        fn apply_audio(&mut self, _id: ItemId, _audio: AudioSettings) {}
    }

    fn feed_of(n: u32) -> Feed {
        Feed::new(
            (0..n)
                .map(|i| Item::new(SourceRef::Deferred(format!("v{i}.mp4"))))
                .collect(),
        )
    }

    fn standard() -> LoaderConfig {
        LoadingProfile::standard().loader.unwrap()
    }

    fn constrained() -> LoaderConfig {
        LoadingProfile::constrained().loader.unwrap()
    }

    fn ids(v: &[u32]) -> Vec<ItemId> {
        v.iter().copied().map(ItemId).collect()
    }

    #[test]
    fn queue_dedups_and_orders_by_priority() {
        let mut q = LoadQueue::new();
        assert!(q.push(ItemId(4), 3));
        assert!(q.push(ItemId(5), 1));
        assert!(q.push(ItemId(6), 1));
        assert!(!q.push(ItemId(4), 0));
        assert_eq!(q.len(), 3);
        assert_eq!(q.pop(), Some(ItemId(4)));
        assert_eq!(q.pop(), Some(ItemId(5)));
        assert!(q.remove(ItemId(6)));
        assert!(q.is_empty());
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn start_loads_first_and_three_ahead() {
        let mut feed = feed_of(10);
        let mut host = AttachLog::default();
        let mut loader = Loader::new(standard());
        loader
            .start(&mut feed, HostTime(0), &mut host, &mut Tracer::none())
            .unwrap();
        assert_eq!(host.attached, ids(&[0, 1, 2, 3]));
        assert_eq!(loader.in_flight(), 4);
        assert_eq!(feed.state(ItemId(3)), Ok(PlaybackState::Loading));
        assert_eq!(feed.state(ItemId(4)), Ok(PlaybackState::Unloaded));
    }

    #[test]
    fn window_covers_ahead_and_behind_forward_first() {
        let mut feed = feed_of(10);
        let mut host = AttachLog::default();
        let mut loader = Loader::new(standard());
        loader
            .focus(&mut feed, ItemId(5), HostTime(0), &mut host, &mut Tracer::none())
            .unwrap();
        // Current, then distance-ordered forward items, then behind.
        assert_eq!(host.attached, ids(&[5, 6, 7, 8, 4, 3]));
    }

    #[test]
    fn backward_scroll_flips_window() {
        let mut feed = feed_of(10);
        let mut host = AttachLog::default();
        let mut loader = Loader::new(standard());
        let mut tracer = Tracer::none();
        loader
            .focus(&mut feed, ItemId(8), HostTime(0), &mut host, &mut tracer)
            .unwrap();
        host.attached.clear();
        loader
            .focus(&mut feed, ItemId(6), HostTime(0), &mut host, &mut tracer)
            .unwrap();
        assert_eq!(loader.direction(), ScrollDirection::Backward);
        // 5, 4, 3 lie in scroll direction; 7 and 8 are already loading.
        assert_eq!(host.attached, ids(&[5, 4, 3]));
    }

    #[test]
    fn resolve_is_noop_when_loading_or_ready() {
        let mut feed = feed_of(2);
        let mut host = AttachLog::default();
        let mut loader = Loader::new(standard());
        let mut tracer = Tracer::none();
        assert_eq!(
            loader.resolve(&mut feed, ItemId(0), HostTime(0), &mut host, &mut tracer),
            Ok(true)
        );
        assert_eq!(
            loader.resolve(&mut feed, ItemId(0), HostTime(5), &mut host, &mut tracer),
            Ok(false)
        );
        loader
            .on_loaded(&mut feed, ItemId(0), HostTime(90_000), &mut host, &mut tracer)
            .unwrap();
        assert_eq!(
            loader.resolve(&mut feed, ItemId(0), HostTime(5), &mut host, &mut tracer),
            Ok(false)
        );
        assert_eq!(host.attached, ids(&[0]));
    }

    #[test]
    fn completion_reports_elapsed_and_ignores_stale() {
        let mut feed = feed_of(3);
        let mut host = AttachLog::default();
        let mut loader = Loader::new(standard());
        let mut tracer = Tracer::none();
        loader
            .resolve(&mut feed, ItemId(1), HostTime(1_000), &mut host, &mut tracer)
            .unwrap();
        let report = loader
            .on_loaded(&mut feed, ItemId(1), HostTime(251_000), &mut host, &mut tracer)
            .unwrap();
        assert_eq!(
            report,
            Some(LoadReport {
                item: ItemId(1),
                elapsed: Duration::from_millis(250),
            })
        );
        // Second completion for the same item is stale.
        assert_eq!(
            loader.on_loaded(&mut feed, ItemId(1), HostTime(300_000), &mut host, &mut tracer),
            Ok(None)
        );
        // Never attached at all.
        assert_eq!(
            loader.on_loaded(&mut feed, ItemId(2), HostTime(300_000), &mut host, &mut tracer),
            Ok(None)
        );
    }

    #[test]
    fn serialized_mode_waits_for_completion_and_delay() {
        let mut feed = feed_of(6);
        let mut host = AttachLog::default();
        let mut loader = Loader::new(constrained());
        let mut tracer = Tracer::none();
        loader
            .start(&mut feed, HostTime(0), &mut host, &mut tracer)
            .unwrap();
        assert_eq!(host.attached, ids(&[0]));
        assert_eq!(loader.queue().len(), 1);
        assert_eq!(loader.next_wakeup(), None, "blocked on the in-flight item");

        let t1 = HostTime(100_000);
        loader
            .on_loaded(&mut feed, ItemId(0), t1, &mut host, &mut tracer)
            .unwrap();
        assert_eq!(host.attached, ids(&[0]), "inter-item delay not elapsed");
        let wake = loader.next_wakeup().unwrap();
        assert_eq!(wake, t1 + Duration::from_millis(500));

        loader
            .poll(&mut feed, HostTime(wake.micros() - 1), &mut host, &mut tracer)
            .unwrap();
        assert_eq!(host.attached, ids(&[0]));
        loader.poll(&mut feed, wake, &mut host, &mut tracer).unwrap();
        assert_eq!(host.attached, ids(&[0, 1]));
    }

    #[test]
    fn failure_schedules_single_retry() {
        let mut feed = feed_of(2);
        let mut host = AttachLog::default();
        let mut cfg = standard();
        cfg.retry = Some(RetryPolicy {
            delay: Duration::from_millis(1_000),
            max_attempts: 1,
        });
        let mut loader = Loader::new(cfg);
        let mut tracer = Tracer::none();
        let id = ItemId(0);

        loader.resolve(&mut feed, id, HostTime(0), &mut host, &mut tracer).unwrap();
        loader.on_failed(&mut feed, id, HostTime(10), &mut host, &mut tracer).unwrap();
        assert_eq!(feed.state(id), Ok(PlaybackState::Errored));
        assert!(loader.retry_pending(id));
        assert!(!loader.retry_pending(ItemId(1)));
        let at = loader.next_wakeup().unwrap();
        assert_eq!(at, HostTime(10) + Duration::from_millis(1_000));

        loader.poll(&mut feed, at, &mut host, &mut tracer).unwrap();
        assert_eq!(feed.state(id), Ok(PlaybackState::Loading));
        assert_eq!(host.attached, ids(&[0, 0]));
        assert!(!loader.retry_pending(id), "fired retry is no longer pending");

        loader.on_failed(&mut feed, id, at, &mut host, &mut tracer).unwrap();
        assert_eq!(feed.state(id), Ok(PlaybackState::Errored));
        assert_eq!(loader.next_wakeup(), None, "retry budget spent");
    }

    #[test]
    fn unloading_cancels_pending_retry() {
        let mut feed = feed_of(12);
        let mut host = AttachLog::default();
        let mut loader = Loader::new(constrained());
        let mut tracer = Tracer::none();
        let id = ItemId(0);

        loader.start(&mut feed, HostTime(0), &mut host, &mut tracer).unwrap();
        loader.on_failed(&mut feed, id, HostTime(1), &mut host, &mut tracer).unwrap();
        assert!(loader.next_wakeup().is_some());

        // Jump far away; item 0 is now beyond the unload distance.
        loader.focus(&mut feed, ItemId(9), HostTime(2), &mut host, &mut tracer).unwrap();
        assert_eq!(feed.state(id), Ok(PlaybackState::Unloaded));
        assert!(host.detached.contains(&id));
        assert!(!loader.retry_pending(id));

        loader
            .poll(&mut feed, HostTime(10_000_000), &mut host, &mut tracer)
            .unwrap();
        assert_eq!(
            host.attached.iter().filter(|&&a| a == id).count(),
            1,
            "cancelled retry must not reattach"
        );
    }

    #[test]
    fn distant_unload_spares_playing_and_protected() {
        let mut feed = feed_of(12);
        let mut host = AttachLog::default();
        let mut loader = Loader::new(constrained());
        let mut tracer = Tracer::none();

        for i in 0..3 {
            let id = ItemId(i);
            loader.resolve(&mut feed, id, HostTime(0), &mut host, &mut tracer).unwrap();
            loader.on_loaded(&mut feed, id, HostTime(1), &mut host, &mut tracer).unwrap();
        }
        feed.set_state(ItemId(0), PlaybackState::Playing).unwrap();
        feed.set_state(ItemId(1), PlaybackState::Paused).unwrap();
        loader.protect(Some(ItemId(1)));

        loader.focus(&mut feed, ItemId(10), HostTime(2), &mut host, &mut tracer).unwrap();
        assert_eq!(feed.state(ItemId(0)), Ok(PlaybackState::Playing));
        assert_eq!(feed.state(ItemId(1)), Ok(PlaybackState::Paused));
        assert_eq!(feed.state(ItemId(2)), Ok(PlaybackState::Unloaded));
        assert_eq!(host.detached, ids(&[2]));
    }

    #[test]
    fn load_visibility_moves_window_to_last_admitted() {
        let mut feed = feed_of(10);
        let mut host = AttachLog::default();
        let mut loader = Loader::new(standard());
        loader
            .on_visibility(
                &[
                    VisibilityEntry::visible(ItemId(3), 0.4),
                    VisibilityEntry::visible(ItemId(2), 0.05),
                    VisibilityEntry::visible(ItemId(1), 0.9),
                ],
                &mut feed,
                HostTime(0),
                &mut host,
                &mut Tracer::none(),
            )
            .unwrap();
        assert_eq!(loader.current(), Some(3));
    }
}
