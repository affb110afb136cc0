// Copyright 2026 the Reelfeed Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the feed.
//!
//! This module provides a [`TraceSink`] trait with one method per event the
//! controller and loader emit. All method bodies default to no-ops, so
//! implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).

use crate::feed::{AudioSettings, ItemId};
use crate::time::{Duration, HostTime};
use crate::video::PlaybackState;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// A video moved between playback states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateChangeEvent {
    /// Which item.
    pub item: ItemId,
    /// State before the transition.
    pub from: PlaybackState,
    /// State after the transition.
    pub to: PlaybackState,
}

/// The platform refused a play attempt (autoplay policy).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayRejectedEvent {
    /// Which item.
    pub item: ItemId,
    /// Whether one more attempt is armed for the next user gesture.
    pub retry_on_gesture: bool,
}

/// A source was attached and the transfer began.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadStartedEvent {
    /// Which item.
    pub item: ItemId,
    /// Presentation position of the item.
    pub position: usize,
    /// Host time the transfer began.
    pub at: HostTime,
    /// 0 for the first attempt, 1 for the first retry, and so on.
    pub attempt: u8,
}

/// A transfer finished and the video became playable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadCompleteEvent {
    /// Which item.
    pub item: ItemId,
    /// Time from attach to first playable data.
    pub elapsed: Duration,
}

/// A transfer failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadFailedEvent {
    /// Which item.
    pub item: ItemId,
    /// Host time of the failure.
    pub at: HostTime,
    /// When the automatic retry fires, if one was scheduled.
    pub retry_at: Option<HostTime>,
}

/// A distant item's source was cleared to bound memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnloadEvent {
    /// Which item.
    pub item: ItemId,
    /// Distance in positions from the visible item.
    pub distance: usize,
}

/// Feed-wide audio settings changed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AudioChangeEvent {
    /// New settings.
    pub audio: AudioSettings,
    /// Number of videos the settings were applied to.
    pub applied: usize,
}

/// A video started playing and counts as watched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewEvent<'a> {
    /// Which item.
    pub item: ItemId,
    /// The item's title, when the markup has one.
    pub title: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the controller and loader.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called on every playback state transition.
    fn on_state_change(&mut self, e: &StateChangeEvent) {
        _ = e;
    }

    /// Called when a play attempt is rejected.
    fn on_play_rejected(&mut self, e: &PlayRejectedEvent) {
        _ = e;
    }

    /// Called when a transfer starts.
    fn on_load_started(&mut self, e: &LoadStartedEvent) {
        _ = e;
    }

    /// Called when a transfer completes.
    fn on_load_complete(&mut self, e: &LoadCompleteEvent) {
        _ = e;
    }

    /// Called when a transfer fails.
    fn on_load_failed(&mut self, e: &LoadFailedEvent) {
        _ = e;
    }

    /// Called when a distant item is unresolved.
    fn on_unload(&mut self, e: &UnloadEvent) {
        _ = e;
    }

    /// Called when the feed-wide audio settings change.
    fn on_audio_change(&mut self, e: &AudioChangeEvent) {
        _ = e;
    }

    /// Called when a video starts playing.
    fn on_view(&mut self, e: &ViewEvent<'_>) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`StateChangeEvent`].
    #[inline]
    pub fn state_change(&mut self, e: &StateChangeEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_state_change(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PlayRejectedEvent`].
    #[inline]
    pub fn play_rejected(&mut self, e: &PlayRejectedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_play_rejected(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`LoadStartedEvent`].
    #[inline]
    pub fn load_started(&mut self, e: &LoadStartedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_load_started(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`LoadCompleteEvent`].
    #[inline]
    pub fn load_complete(&mut self, e: &LoadCompleteEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_load_complete(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`LoadFailedEvent`].
    #[inline]
    pub fn load_failed(&mut self, e: &LoadFailedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_load_failed(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`UnloadEvent`].
    #[inline]
    pub fn unload(&mut self, e: &UnloadEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_unload(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`AudioChangeEvent`].
    #[inline]
    pub fn audio_change(&mut self, e: &AudioChangeEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_audio_change(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ViewEvent`].
    #[inline]
    pub fn view(&mut self, e: &ViewEvent<'_>) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_view(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
