// Copyright 2026 the Reelfeed Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The playback controller: at most one playing video, driven by
//! visibility.
//!
//! [`PlaybackController`] owns the [`Feed`] (and with it the feed-wide
//! [`AudioSettings`]), the optional [`Loader`], and the per-item visibility
//! flags. Every platform notification is routed through one of its `on_*`
//! methods; every side effect goes out through a [`MediaHost`].
//!
//! # Transition rules
//!
//! - An item crossing **above** the playback threshold first pauses whatever
//!   else is playing, then plays if its video is playable. If the video is
//!   still loading the attempt is *deferred*: it fires when the video
//!   becomes ready, provided the item is still above the threshold and no
//!   newer crossing has replaced it. An errored item counts as still
//!   loading while the loader holds a retry for it.
//! - An item crossing **below** pauses if playing and drops its deferred
//!   attempt.
//! - A rejected play of the current player leaves the video paused. With
//!   [`LoadingProfile::gesture_unlock`] the attempt is repeated once on the
//!   next user gesture. Rejections arriving after the item lost playback are
//!   ignored.
//! - Mute and volume apply to every video at once, loaded or not.
//!
//! Within one notification batch, below-threshold entries are handled
//! before above-threshold ones, each in ascending position, and only the
//! topmost eligible above-threshold item claims playback.

use alloc::vec;
use alloc::vec::Vec;

use crate::backend::MediaHost;
use crate::error::FeedError;
use crate::feed::{AudioSettings, Feed, ItemId};
use crate::loader::{LoadReport, Loader};
use crate::profile::LoadingProfile;
use crate::time::HostTime;
use crate::trace::{AudioChangeEvent, PlayRejectedEvent, StateChangeEvent, Tracer, ViewEvent};
use crate::video::PlaybackState;
use crate::visibility::{VisibilityEntry, sort_batch};

/// Enforces the single-playing-video policy for one feed.
#[derive(Debug)]
pub struct PlaybackController {
    feed: Feed,
    profile: LoadingProfile,
    loader: Option<Loader>,
    playing: Option<ItemId>,
    above: Vec<bool>,
    deferred: Option<ItemId>,
    unlock_armed: Option<ItemId>,
    unlock_attempt: Option<ItemId>,
}

impl PlaybackController {
    /// Creates a controller for `feed`. A loader is created when the
    /// profile is progressive.
    #[must_use]
    pub fn new(feed: Feed, profile: LoadingProfile) -> Self {
        let above = vec![false; feed.len()];
        Self {
            loader: profile.loader.map(Loader::new),
            feed,
            profile,
            playing: None,
            above,
            deferred: None,
            unlock_armed: None,
            unlock_attempt: None,
        }
    }

    /// The feed.
    #[must_use]
    pub const fn feed(&self) -> &Feed {
        &self.feed
    }

    /// The profile the controller was built with.
    #[must_use]
    pub const fn profile(&self) -> &LoadingProfile {
        &self.profile
    }

    /// The loader, when progressive loading is on.
    #[must_use]
    pub const fn loader(&self) -> Option<&Loader> {
        self.loader.as_ref()
    }

    /// The video currently playing, if any.
    #[must_use]
    pub const fn playing(&self) -> Option<ItemId> {
        self.playing
    }

    /// The item whose play attempt waits for its video to become ready.
    #[must_use]
    pub const fn deferred(&self) -> Option<ItemId> {
        self.deferred
    }

    /// Playback state of `id`.
    pub fn state(&self, id: ItemId) -> Result<PlaybackState, FeedError> {
        self.feed.state(id)
    }

    /// Whether `id` is currently above the playback threshold.
    pub fn is_above(&self, id: ItemId) -> Result<bool, FeedError> {
        self.above
            .get(id.index())
            .copied()
            .ok_or(FeedError::UnknownItem(id))
    }

    /// Begins the feed: applies the audio settings to every video and
    /// resolves sources, either all at once or through the loader window.
    pub fn start(
        &mut self,
        now: HostTime,
        host: &mut dyn MediaHost,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), FeedError> {
        let audio = self.feed.audio();
        for id in self.feed.ids() {
            host.apply_audio(id, audio);
        }

        match &mut self.loader {
            Some(loader) => loader.start(&mut self.feed, now, host, tracer),
            None => {
                for id in self.feed.order().to_vec() {
                    let from = self.feed.state(id)?;
                    if from != PlaybackState::Unloaded {
                        continue;
                    }
                    self.feed.set_state(id, PlaybackState::Loading)?;
                    tracer.state_change(&StateChangeEvent {
                        item: id,
                        from,
                        to: PlaybackState::Loading,
                    });
                    host.attach_source(id, self.feed.item(id)?.video().source().url());
                }
                Ok(())
            }
        }
    }

    /// Handles a batch from the playback observer.
    pub fn on_playback_visibility(
        &mut self,
        entries: &[VisibilityEntry],
        host: &mut dyn MediaHost,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), FeedError> {
        let batch = sort_batch(entries, &self.feed, &self.profile.playback);

        for entry in &batch.below {
            self.feed.set_ratio(entry.item, entry.ratio)?;
            self.exit(entry.item, host, tracer)?;
        }

        let mut claimed = false;
        for entry in &batch.above {
            self.feed.set_ratio(entry.item, entry.ratio)?;
            let was_above = core::mem::replace(&mut self.above[entry.item.index()], true);
            if claimed || was_above || !self.can_claim(entry.item)? {
                continue;
            }
            claimed = true;
            self.enter(entry.item, host, tracer)?;
        }
        Ok(())
    }

    /// Handles a batch from the load observer. Ignored without a loader.
    pub fn on_load_visibility(
        &mut self,
        entries: &[VisibilityEntry],
        now: HostTime,
        host: &mut dyn MediaHost,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), FeedError> {
        match &mut self.loader {
            Some(loader) => loader.on_visibility(entries, &mut self.feed, now, host, tracer),
            None => Ok(()),
        }
    }

    fn enter(
        &mut self,
        id: ItemId,
        host: &mut dyn MediaHost,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), FeedError> {
        if let Some(current) = self.playing
            && current != id
        {
            self.pause(current, host, tracer)?;
        }
        self.deferred = None;
        self.unlock_armed = None;
        self.unlock_attempt = None;

        match self.feed.state(id)? {
            PlaybackState::Ready | PlaybackState::Paused => self.play(id, host, tracer),
            PlaybackState::Unloaded | PlaybackState::Loading | PlaybackState::Errored => {
                self.deferred = Some(id);
                Ok(())
            }
            PlaybackState::Playing => Ok(()),
        }
    }

    /// Errored items can still claim playback while the loader holds a
    /// retry for them; the attempt is deferred until the retry resolves.
    fn can_claim(&self, id: ItemId) -> Result<bool, FeedError> {
        Ok(match self.feed.state(id)? {
            PlaybackState::Errored => self
                .loader
                .as_ref()
                .is_some_and(|loader| loader.retry_pending(id)),
            _ => true,
        })
    }

    fn exit(
        &mut self,
        id: ItemId,
        host: &mut dyn MediaHost,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), FeedError> {
        let Some(flag) = self.above.get_mut(id.index()) else {
            return Err(FeedError::UnknownItem(id));
        };
        *flag = false;
        if self.deferred == Some(id) {
            self.deferred = None;
        }
        if self.unlock_armed == Some(id) {
            self.unlock_armed = None;
        }
        self.pause(id, host, tracer)
    }

    fn play(
        &mut self,
        id: ItemId,
        host: &mut dyn MediaHost,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), FeedError> {
        let from = self.feed.set_state(id, PlaybackState::Playing)?;
        tracer.state_change(&StateChangeEvent {
            item: id,
            from,
            to: PlaybackState::Playing,
        });
        host.play(id);
        self.playing = Some(id);
        if let Some(loader) = &mut self.loader {
            loader.protect(Some(id));
        }
        tracer.view(&ViewEvent {
            item: id,
            title: self.feed.item(id)?.title(),
        });
        Ok(())
    }

    fn pause(
        &mut self,
        id: ItemId,
        host: &mut dyn MediaHost,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), FeedError> {
        if self.feed.state(id)? == PlaybackState::Playing {
            self.feed.set_state(id, PlaybackState::Paused)?;
            tracer.state_change(&StateChangeEvent {
                item: id,
                from: PlaybackState::Playing,
                to: PlaybackState::Paused,
            });
            host.pause(id);
        }
        if self.playing == Some(id) {
            self.playing = None;
        }
        Ok(())
    }

    /// The platform reports enough data to play `id`. Returns the load
    /// timing when a loader measured it.
    ///
    /// A deferred play attempt for `id` fires here if the item is still
    /// above the threshold.
    pub fn on_loaded(
        &mut self,
        id: ItemId,
        now: HostTime,
        host: &mut dyn MediaHost,
        tracer: &mut Tracer<'_>,
    ) -> Result<Option<LoadReport>, FeedError> {
        let report = match &mut self.loader {
            Some(loader) => loader.on_loaded(&mut self.feed, id, now, host, tracer)?,
            None => {
                if self.feed.state(id)? == PlaybackState::Loading {
                    self.feed.set_state(id, PlaybackState::Ready)?;
                    tracer.state_change(&StateChangeEvent {
                        item: id,
                        from: PlaybackState::Loading,
                        to: PlaybackState::Ready,
                    });
                }
                None
            }
        };
        if self.feed.state(id)? != PlaybackState::Ready {
            return Ok(report);
        }
        host.apply_audio(id, self.feed.audio());

        if self.deferred == Some(id) {
            self.deferred = None;
            if self.is_above(id)? {
                if let Some(current) = self.playing
                    && current != id
                {
                    self.pause(current, host, tracer)?;
                }
                self.play(id, host, tracer)?;
            }
        }
        Ok(report)
    }

    /// The platform reports a failed transfer for `id`.
    pub fn on_load_failed(
        &mut self,
        id: ItemId,
        now: HostTime,
        host: &mut dyn MediaHost,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), FeedError> {
        match &mut self.loader {
            Some(loader) => loader.on_failed(&mut self.feed, id, now, host, tracer),
            None => {
                if self.feed.state(id)? == PlaybackState::Loading {
                    self.feed.set_state(id, PlaybackState::Errored)?;
                    tracer.state_change(&StateChangeEvent {
                        item: id,
                        from: PlaybackState::Loading,
                        to: PlaybackState::Errored,
                    });
                }
                Ok(())
            }
        }
    }

    /// The platform refused to play `id` (autoplay policy).
    ///
    /// Only a rejection of the current player counts. One that arrives after
    /// `id` lost playback (for example a pending `play()` aborted by the
    /// preempting pause) is traced and otherwise ignored.
    pub fn on_play_rejected(
        &mut self,
        id: ItemId,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), FeedError> {
        let state = self.feed.state(id)?;
        if self.playing != Some(id) {
            tracer.play_rejected(&PlayRejectedEvent {
                item: id,
                retry_on_gesture: false,
            });
            return Ok(());
        }
        if state == PlaybackState::Playing {
            self.feed.set_state(id, PlaybackState::Paused)?;
            tracer.state_change(&StateChangeEvent {
                item: id,
                from: PlaybackState::Playing,
                to: PlaybackState::Paused,
            });
        }
        self.playing = None;

        let spent = self.unlock_attempt.take() == Some(id);
        let retry_on_gesture = self.profile.gesture_unlock && !spent && self.is_above(id)?;
        if retry_on_gesture {
            self.unlock_armed = Some(id);
        }
        tracer.play_rejected(&PlayRejectedEvent {
            item: id,
            retry_on_gesture,
        });
        Ok(())
    }

    /// A qualifying user input (click, tap, key) happened. Repeats an armed
    /// rejected play attempt once.
    pub fn on_user_gesture(
        &mut self,
        host: &mut dyn MediaHost,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), FeedError> {
        let Some(id) = self.unlock_armed.take() else {
            return Ok(());
        };
        if !self.is_above(id)? || !self.feed.state(id)?.is_playable() {
            return Ok(());
        }
        if let Some(current) = self.playing
            && current != id
        {
            self.pause(current, host, tracer)?;
        }
        if self.feed.state(id)? != PlaybackState::Playing {
            self.unlock_attempt = Some(id);
            self.play(id, host, tracer)?;
        }
        Ok(())
    }

    /// Flips the feed-wide mute flag on every video and returns the new
    /// settings.
    pub fn toggle_mute(
        &mut self,
        host: &mut dyn MediaHost,
        tracer: &mut Tracer<'_>,
    ) -> AudioSettings {
        let mut audio = self.feed.audio();
        audio.muted = !audio.muted;
        self.apply_audio(audio, host, tracer);
        audio
    }

    /// Sets the feed-wide volume on every video.
    pub fn set_volume(
        &mut self,
        volume: f32,
        host: &mut dyn MediaHost,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), FeedError> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(FeedError::InvalidVolume(volume));
        }
        let audio = AudioSettings {
            volume,
            ..self.feed.audio()
        };
        self.apply_audio(audio, host, tracer);
        Ok(())
    }

    fn apply_audio(
        &mut self,
        audio: AudioSettings,
        host: &mut dyn MediaHost,
        tracer: &mut Tracer<'_>,
    ) {
        self.feed.set_audio(audio);
        for id in self.feed.ids() {
            host.apply_audio(id, audio);
        }
        tracer.audio_change(&AudioChangeEvent {
            audio,
            applied: self.feed.len(),
        });
    }

    /// Runs timer-driven loader work (retries, serialized queue slots).
    pub fn poll(
        &mut self,
        now: HostTime,
        host: &mut dyn MediaHost,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), FeedError> {
        match &mut self.loader {
            Some(loader) => loader.poll(&mut self.feed, now, host, tracer),
            None => Ok(()),
        }
    }

    /// Earliest time [`poll`](Self::poll) should run again.
    #[must_use]
    pub fn next_wakeup(&self) -> Option<HostTime> {
        self.loader.as_ref().and_then(Loader::next_wakeup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::Item;
    use crate::time::Duration;
    use crate::trace::TraceSink;
    use crate::video::SourceRef;
    use alloc::format;
    use alloc::string::String;

    #[derive(Clone, Debug, PartialEq)]
    enum Cmd {
        Attach(ItemId),
        Detach(ItemId),
        Play(ItemId),
        Pause(ItemId),
        Audio(ItemId, AudioSettings),
    }

    /// Records every host command in order.
    #[derive(Debug, Default)]
    struct FakeHost {
        log: Vec<Cmd>,
    }

    impl FakeHost {
        fn plays_and_pauses(&self) -> Vec<Cmd> {
            self.log
                .iter()
                .filter(|c| matches!(c, Cmd::Play(_) | Cmd::Pause(_)))
                .cloned()
                .collect()
        }

        fn audio_for(&self, id: ItemId) -> Option<AudioSettings> {
            self.log.iter().rev().find_map(|c| match c {
                Cmd::Audio(target, audio) if *target == id => Some(*audio),
                _ => None,
            })
        }
    }

    impl MediaHost for FakeHost {
        fn attach_source(&mut self, id: ItemId, _url: &str) {
            self.log.push(Cmd::Attach(id));
        }
        fn detach_source(&mut self, id: ItemId) {
            self.log.push(Cmd::Detach(id));
        }
        fn play(&mut self, id: ItemId) {
            self.log.push(Cmd::Play(id));
        }
        fn pause(&mut self, id: ItemId) {
            self.log.push(Cmd::Pause(id));
        }
        fn apply_audio(&mut self, id: ItemId, audio: AudioSettings) {
            self.log.push(Cmd::Audio(id, audio));
        }
    }

    fn feed_of(n: u32) -> Feed {
        Feed::new(
            (0..n)
                .map(|i| {
                    Item::new(SourceRef::Deferred(format!("v{i}.mp4"))).with_title(format!("Dish {i}"))
                })
                .collect(),
        )
    }

    fn started(n: u32, profile: LoadingProfile) -> (PlaybackController, FakeHost) {
        let mut c = PlaybackController::new(feed_of(n), profile);
        let mut host = FakeHost::default();
        c.start(HostTime(0), &mut host, &mut Tracer::none()).unwrap();
        host.log.clear();
        (c, host)
    }

    fn load(c: &mut PlaybackController, host: &mut FakeHost, id: u32, at: u64) {
        c.on_loaded(ItemId(id), HostTime(at), host, &mut Tracer::none())
            .unwrap();
    }

    fn show(c: &mut PlaybackController, host: &mut FakeHost, entries: &[VisibilityEntry]) {
        c.on_playback_visibility(entries, host, &mut Tracer::none())
            .unwrap();
        assert!(c.feed().playing_count() <= 1, "two videos playing");
    }

    fn vis(id: u32, ratio: f32) -> VisibilityEntry {
        VisibilityEntry::visible(ItemId(id), ratio)
    }

    fn gone(id: u32) -> VisibilityEntry {
        VisibilityEntry::hidden(ItemId(id))
    }

    #[test]
    fn eager_start_attaches_everything_and_applies_audio() {
        let mut c = PlaybackController::new(feed_of(3), LoadingProfile::eager());
        let mut host = FakeHost::default();
        c.start(HostTime(0), &mut host, &mut Tracer::none()).unwrap();
        for i in 0..3 {
            assert!(host.log.contains(&Cmd::Attach(ItemId(i))));
            assert_eq!(host.audio_for(ItemId(i)), Some(AudioSettings::default()));
            assert_eq!(c.state(ItemId(i)), Ok(PlaybackState::Loading));
        }
    }

    #[test]
    fn entering_item_preempts_playing_one_pause_first() {
        let (mut c, mut host) = started(3, LoadingProfile::eager());
        load(&mut c, &mut host, 0, 10);
        load(&mut c, &mut host, 1, 10);

        show(&mut c, &mut host, &[vis(0, 0.9)]);
        assert_eq!(c.playing(), Some(ItemId(0)));

        show(&mut c, &mut host, &[vis(1, 0.6)]);
        assert_eq!(
            host.plays_and_pauses(),
            vec![
                Cmd::Play(ItemId(0)),
                Cmd::Pause(ItemId(0)),
                Cmd::Play(ItemId(1))
            ]
        );
        assert_eq!(c.state(ItemId(0)), Ok(PlaybackState::Paused));
        assert_eq!(c.state(ItemId(1)), Ok(PlaybackState::Playing));
    }

    #[test]
    fn leaving_threshold_pauses() {
        let (mut c, mut host) = started(2, LoadingProfile::eager());
        load(&mut c, &mut host, 0, 10);
        show(&mut c, &mut host, &[vis(0, 1.0)]);
        show(&mut c, &mut host, &[vis(0, 0.3)]);
        assert_eq!(c.state(ItemId(0)), Ok(PlaybackState::Paused));
        assert_eq!(c.playing(), None);

        // Already below: no further effect.
        show(&mut c, &mut host, &[gone(0)]);
        assert_eq!(host.plays_and_pauses().len(), 2);
    }

    #[test]
    fn deferred_play_fires_on_resolution_not_before() {
        let (mut c, mut host) = started(4, LoadingProfile::standard());
        // Item 0 is loading from the initial window; 2 is in the window too.
        show(&mut c, &mut host, &[vis(2, 0.8)]);
        assert_eq!(c.state(ItemId(2)), Ok(PlaybackState::Loading));
        assert_eq!(c.deferred(), Some(ItemId(2)));
        assert!(host.plays_and_pauses().is_empty(), "must not play before ready");

        let report = c
            .on_loaded(ItemId(2), HostTime(100_000), &mut host, &mut Tracer::none())
            .unwrap();
        assert_eq!(report.map(|r| r.elapsed), Some(Duration::from_millis(100)));
        assert_eq!(c.state(ItemId(2)), Ok(PlaybackState::Playing));
        assert_eq!(host.plays_and_pauses(), vec![Cmd::Play(ItemId(2))]);
    }

    #[test]
    fn deferred_play_dropped_after_leaving() {
        let (mut c, mut host) = started(4, LoadingProfile::standard());
        show(&mut c, &mut host, &[vis(3, 0.8)]);
        show(&mut c, &mut host, &[gone(3)]);
        assert_eq!(c.deferred(), None);

        load(&mut c, &mut host, 3, 100_000);
        assert_eq!(c.state(ItemId(3)), Ok(PlaybackState::Ready));
        assert!(host.plays_and_pauses().is_empty());
    }

    #[test]
    fn newer_crossing_replaces_deferred_attempt() {
        let (mut c, mut host) = started(4, LoadingProfile::standard());
        load(&mut c, &mut host, 1, 5);
        show(&mut c, &mut host, &[vis(2, 0.8)]);
        show(&mut c, &mut host, &[vis(1, 0.9)]);
        assert_eq!(c.playing(), Some(ItemId(1)));

        // 2 is still partially above the threshold but lost the claim.
        load(&mut c, &mut host, 2, 10);
        assert_eq!(c.playing(), Some(ItemId(1)));
        assert_eq!(c.state(ItemId(2)), Ok(PlaybackState::Ready));
    }

    #[test]
    fn same_batch_crossings_yield_one_player() {
        let (mut c, mut host) = started(4, LoadingProfile::eager());
        for i in 0..4 {
            load(&mut c, &mut host, i, 1);
        }
        show(&mut c, &mut host, &[vis(3, 0.7), vis(1, 0.7), vis(2, 0.9)]);
        assert_eq!(c.playing(), Some(ItemId(1)), "topmost position wins");
        assert_eq!(host.plays_and_pauses(), vec![Cmd::Play(ItemId(1))]);
        assert!(c.is_above(ItemId(3)).unwrap());
    }

    #[test]
    fn batch_processes_exit_before_entry() {
        let (mut c, mut host) = started(3, LoadingProfile::eager());
        load(&mut c, &mut host, 0, 1);
        load(&mut c, &mut host, 1, 1);
        show(&mut c, &mut host, &[vis(0, 1.0)]);
        host.log.clear();

        // Observer delivers the entering item first; the exit still runs first.
        show(&mut c, &mut host, &[vis(1, 0.9), gone(0)]);
        assert_eq!(
            host.plays_and_pauses(),
            vec![Cmd::Pause(ItemId(0)), Cmd::Play(ItemId(1))]
        );
    }

    #[test]
    fn shuffled_feed_orders_batch_by_position() {
        use rand::SeedableRng as _;

        let mut feed = feed_of(5);
        feed.shuffle(&mut rand::rngs::StdRng::seed_from_u64(11));
        let top = feed.order()[0];
        let mut c = PlaybackController::new(feed, LoadingProfile::eager());
        let mut host = FakeHost::default();
        c.start(HostTime(0), &mut host, &mut Tracer::none()).unwrap();
        for i in 0..5 {
            load(&mut c, &mut host, i, 1);
        }
        let entries: Vec<_> = (0..5).map(|i| vis(i, 0.9)).collect();
        show(&mut c, &mut host, &entries);
        assert_eq!(c.playing(), Some(top));
    }

    #[test]
    fn errored_item_never_plays_and_does_not_block_others() {
        let (mut c, mut host) = started(3, LoadingProfile::eager());
        c.on_load_failed(ItemId(0), HostTime(1), &mut host, &mut Tracer::none())
            .unwrap();
        load(&mut c, &mut host, 1, 1);
        show(&mut c, &mut host, &[vis(0, 1.0), vis(1, 0.6)]);
        assert_eq!(c.state(ItemId(0)), Ok(PlaybackState::Errored));
        assert_eq!(c.playing(), Some(ItemId(1)));
    }

    #[test]
    fn mute_toggle_reaches_every_video_and_late_loads_inherit() {
        let (mut c, mut host) = started(5, LoadingProfile::standard());
        // Standard window from position 0 covers 0..=3; make 0 and 1 ready.
        load(&mut c, &mut host, 0, 1);
        load(&mut c, &mut host, 1, 1);
        assert_eq!(c.state(ItemId(4)), Ok(PlaybackState::Unloaded));
        host.log.clear();

        let audio = c.toggle_mute(&mut host, &mut Tracer::none());
        assert!(!audio.muted);
        for i in 0..5 {
            assert_eq!(host.audio_for(ItemId(i)), Some(audio), "item {i}");
        }

        // Item 2 resolves later and picks up the current flag.
        host.log.clear();
        load(&mut c, &mut host, 2, 50);
        assert_eq!(host.audio_for(ItemId(2)), Some(audio));
    }

    #[test]
    fn double_mute_toggle_restores_original() {
        let (mut c, mut host) = started(3, LoadingProfile::eager());
        let original = c.feed().audio();
        c.toggle_mute(&mut host, &mut Tracer::none());
        let back = c.toggle_mute(&mut host, &mut Tracer::none());
        assert_eq!(back, original);
        for i in 0..3 {
            assert_eq!(host.audio_for(ItemId(i)), Some(original));
        }
    }

    #[test]
    fn volume_is_validated() {
        let (mut c, mut host) = started(2, LoadingProfile::eager());
        assert_eq!(
            c.set_volume(1.5, &mut host, &mut Tracer::none()),
            Err(FeedError::InvalidVolume(1.5))
        );
        c.set_volume(0.25, &mut host, &mut Tracer::none()).unwrap();
        assert_eq!(host.audio_for(ItemId(1)).map(|a| a.volume), Some(0.25));
    }

    #[test]
    fn rejected_play_pauses_and_retries_once_on_gesture() {
        let (mut c, mut host) = started(2, LoadingProfile::standard());
        load(&mut c, &mut host, 0, 1);
        show(&mut c, &mut host, &[vis(0, 1.0)]);
        let mut tracer = Tracer::none();

        c.on_play_rejected(ItemId(0), &mut tracer).unwrap();
        assert_eq!(c.state(ItemId(0)), Ok(PlaybackState::Paused));
        assert_eq!(c.playing(), None);

        c.on_user_gesture(&mut host, &mut tracer).unwrap();
        assert_eq!(c.state(ItemId(0)), Ok(PlaybackState::Playing));

        // Rejected again: give up.
        c.on_play_rejected(ItemId(0), &mut tracer).unwrap();
        c.on_user_gesture(&mut host, &mut tracer).unwrap();
        assert_eq!(c.state(ItemId(0)), Ok(PlaybackState::Paused));
        assert_eq!(
            host.plays_and_pauses(),
            vec![Cmd::Play(ItemId(0)), Cmd::Play(ItemId(0))]
        );
    }

    #[test]
    fn rejection_without_unlock_is_final() {
        let (mut c, mut host) = started(1, LoadingProfile::eager());
        load(&mut c, &mut host, 0, 1);
        show(&mut c, &mut host, &[vis(0, 1.0)]);
        c.on_play_rejected(ItemId(0), &mut Tracer::none()).unwrap();
        c.on_user_gesture(&mut host, &mut Tracer::none()).unwrap();
        assert_eq!(c.state(ItemId(0)), Ok(PlaybackState::Paused));
    }

    #[test]
    fn gesture_after_scrolling_away_does_nothing() {
        let (mut c, mut host) = started(2, LoadingProfile::standard());
        load(&mut c, &mut host, 0, 1);
        show(&mut c, &mut host, &[vis(0, 1.0)]);
        c.on_play_rejected(ItemId(0), &mut Tracer::none()).unwrap();
        show(&mut c, &mut host, &[gone(0)]);
        c.on_user_gesture(&mut host, &mut Tracer::none()).unwrap();
        assert_eq!(c.playing(), None);
    }

    #[test]
    fn late_rejection_of_preempted_item_is_ignored() {
        let (mut c, mut host) = started(3, LoadingProfile::standard());
        load(&mut c, &mut host, 0, 1);
        load(&mut c, &mut host, 1, 1);
        show(&mut c, &mut host, &[vis(0, 1.0)]);
        show(&mut c, &mut host, &[vis(1, 0.6)]);
        assert_eq!(c.playing(), Some(ItemId(1)));

        // 0 is still above the threshold, but its pending play was aborted
        // by the preempting pause.
        c.on_play_rejected(ItemId(0), &mut Tracer::none()).unwrap();
        c.on_user_gesture(&mut host, &mut Tracer::none()).unwrap();
        assert_eq!(c.playing(), Some(ItemId(1)));
        assert_eq!(c.state(ItemId(0)), Ok(PlaybackState::Paused));
        assert_eq!(
            host.plays_and_pauses(),
            vec![
                Cmd::Play(ItemId(0)),
                Cmd::Pause(ItemId(0)),
                Cmd::Play(ItemId(1))
            ]
        );

        // A rejection of the current player still arms the unlock.
        c.on_play_rejected(ItemId(1), &mut Tracer::none()).unwrap();
        assert_eq!(c.playing(), None);
        c.on_user_gesture(&mut host, &mut Tracer::none()).unwrap();
        assert_eq!(c.playing(), Some(ItemId(1)));
    }

    #[test]
    fn errored_item_above_threshold_plays_after_retry() {
        let (mut c, mut host) = started(4, LoadingProfile::standard());
        c.on_load_failed(ItemId(0), HostTime(10), &mut host, &mut Tracer::none())
            .unwrap();
        assert_eq!(c.state(ItemId(0)), Ok(PlaybackState::Errored));

        show(&mut c, &mut host, &[vis(0, 1.0)]);
        assert_eq!(c.deferred(), Some(ItemId(0)));
        assert!(host.plays_and_pauses().is_empty());

        let at = c.next_wakeup().unwrap();
        c.poll(at, &mut host, &mut Tracer::none()).unwrap();
        assert_eq!(c.state(ItemId(0)), Ok(PlaybackState::Loading));

        load(&mut c, &mut host, 0, at.micros() + 50_000);
        assert_eq!(c.state(ItemId(0)), Ok(PlaybackState::Playing));
        assert_eq!(c.playing(), Some(ItemId(0)));
    }

    #[test]
    fn errored_item_without_retry_does_not_claim() {
        let (mut c, mut host) = started(4, LoadingProfile::standard());
        let mut tracer = Tracer::none();
        // Spend the single retry.
        c.on_load_failed(ItemId(0), HostTime(10), &mut host, &mut tracer).unwrap();
        let at = c.next_wakeup().unwrap();
        c.poll(at, &mut host, &mut tracer).unwrap();
        c.on_load_failed(ItemId(0), at, &mut host, &mut tracer).unwrap();

        load(&mut c, &mut host, 1, at.micros());
        show(&mut c, &mut host, &[vis(0, 1.0), vis(1, 0.6)]);
        assert_eq!(c.state(ItemId(0)), Ok(PlaybackState::Errored));
        assert_eq!(c.playing(), Some(ItemId(1)));
    }

    #[test]
    fn unloaded_item_plays_once_load_window_reaches_it() {
        let (mut c, mut host) = started(10, LoadingProfile::standard());
        assert_eq!(c.state(ItemId(7)), Ok(PlaybackState::Unloaded));

        show(&mut c, &mut host, &[vis(7, 0.8)]);
        assert_eq!(c.deferred(), Some(ItemId(7)));
        assert_eq!(c.state(ItemId(7)), Ok(PlaybackState::Unloaded));
        assert!(host.plays_and_pauses().is_empty(), "must not play unloaded");

        c.on_load_visibility(&[vis(7, 0.5)], HostTime(50_000), &mut host, &mut Tracer::none())
            .unwrap();
        assert!(host.log.contains(&Cmd::Attach(ItemId(7))));
        assert_eq!(c.state(ItemId(7)), Ok(PlaybackState::Loading));
        assert!(host.plays_and_pauses().is_empty());

        let report = c
            .on_loaded(ItemId(7), HostTime(150_000), &mut host, &mut Tracer::none())
            .unwrap();
        assert_eq!(report.map(|r| r.elapsed), Some(Duration::from_millis(100)));
        assert_eq!(c.state(ItemId(7)), Ok(PlaybackState::Playing));
        assert_eq!(host.plays_and_pauses(), vec![Cmd::Play(ItemId(7))]);
    }

    #[test]
    fn unknown_item_is_an_error_not_a_panic() {
        let (mut c, mut host) = started(2, LoadingProfile::eager());
        assert_eq!(
            c.on_loaded(ItemId(7), HostTime(0), &mut host, &mut Tracer::none()),
            Err(FeedError::UnknownItem(ItemId(7)))
        );
        // Visibility entries for unknown items are dropped silently.
        show(&mut c, &mut host, &[vis(9, 1.0)]);
    }

    #[test]
    fn random_event_storm_never_plays_two() {
        use rand::rngs::StdRng;
        use rand::{Rng as _, SeedableRng as _};

        let mut rng = StdRng::seed_from_u64(7);
        let (mut c, mut host) = started(6, LoadingProfile::constrained());
        let mut now = 0_u64;
        for _ in 0..2_000 {
            now += 10_000;
            let id = rng.random_range(0..6_u32);
            let mut tracer = Tracer::none();
            match rng.random_range(0..6) {
                0 | 1 => {
                    let ratio: f32 = rng.random();
                    show(&mut c, &mut host, &[vis(id, ratio)]);
                }
                2 => load(&mut c, &mut host, id, now),
                3 => c
                    .on_load_failed(ItemId(id), HostTime(now), &mut host, &mut tracer)
                    .unwrap(),
                4 => c.on_play_rejected(ItemId(id), &mut tracer).unwrap(),
                _ => {
                    c.on_load_visibility(&[vis(id, 0.5)], HostTime(now), &mut host, &mut tracer)
                        .unwrap();
                    c.poll(HostTime(now), &mut host, &mut tracer).unwrap();
                }
            }
            assert!(c.feed().playing_count() <= 1);
            if let Some(p) = c.playing() {
                assert_eq!(c.state(p), Ok(PlaybackState::Playing));
            }
        }
    }

    #[derive(Default)]
    struct ViewLog(Vec<Option<String>>);

    impl TraceSink for ViewLog {
        fn on_view(&mut self, e: &ViewEvent<'_>) {
            self.0.push(e.title.map(String::from));
        }
    }

    #[cfg(feature = "trace")]
    #[test]
    fn play_reports_view_with_title() {
        let (mut c, mut host) = started(2, LoadingProfile::eager());
        load(&mut c, &mut host, 1, 1);
        let mut views = ViewLog::default();
        c.on_playback_visibility(&[vis(1, 1.0)], &mut host, &mut Tracer::new(&mut views))
            .unwrap();
        assert_eq!(views.0, vec![Some(String::from("Dish 1"))]);
    }

    #[cfg(not(feature = "trace"))]
    #[test]
    fn view_sink_is_inert_without_trace_feature() {
        let mut views = ViewLog::default();
        views.on_view(&ViewEvent {
            item: ItemId(0),
            title: None,
        });
        assert_eq!(views.0.len(), 1);
    }
}
