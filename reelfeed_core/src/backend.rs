// Copyright 2026 the Reelfeed Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend contract for platform integrations.
//!
//! Reelfeed splits platform-specific work into *backend* crates. Each backend
//! provides the following pieces:
//!
//! - **Visibility source**: Delivers batches of
//!   [`VisibilityEntry`](crate::visibility::VisibilityEntry) values (e.g. from
//!   an `IntersectionObserver`) configured from the profile's
//!   [`ObserverConfig`](crate::profile::ObserverConfig)s. Not abstracted by a
//!   trait because observer setup differs fundamentally across platforms.
//!
//! - **Time**: a `now() -> HostTime` free function reading the platform's
//!   monotonic clock, and a one-shot timer that calls
//!   [`PlaybackController::poll`](crate::controller::PlaybackController::poll)
//!   at [`next_wakeup`](crate::controller::PlaybackController::next_wakeup).
//!
//! - **Capability hints**: a function that fills in
//!   [`NetworkHints`](crate::profile::NetworkHints).
//!
//! - **Media host**: Implements the [`MediaHost`] trait to drive native
//!   video elements, and reports completions, failures, and play rejections
//!   back to the controller.
//!
//! # Crate boundaries
//!
//! `reelfeed_core` owns the data model, the state machine, and this contract
//! module. Backend crates depend on `reelfeed_core` and provide platform
//! glue. Application code depends on both and wires them together.

use crate::feed::{AudioSettings, ItemId};

/// Applies controller decisions to platform-native video elements.
///
/// Every method is fire-and-forget. Outcomes that arrive later (data
/// loaded, transfer error, play promise rejected) are reported back through
/// the controller's `on_*` methods.
///
/// # Event wiring pseudocode
///
/// ```rust,ignore
/// observer.on_entries(|entries| {
///     controller.on_playback_visibility(&entries, now(), &mut host, &mut tracer)?;
///     timer.arm(controller.next_wakeup());
/// });
/// video.on("loadeddata", |id| controller.on_loaded(id, now(), &mut host, &mut tracer));
/// video.on("error", |id| controller.on_load_failed(id, now(), &mut host, &mut tracer));
/// video.play().catch(|id| controller.on_play_rejected(id, &mut tracer));
/// ```
pub trait MediaHost {
    /// Attaches `url` as the video's source and starts the transfer.
    fn attach_source(&mut self, id: ItemId, url: &str);

    /// Clears the video's source and drops its buffered data.
    fn detach_source(&mut self, id: ItemId);

    /// Starts playback. A rejection is reported asynchronously.
    fn play(&mut self, id: ItemId);

    /// Pauses playback.
    fn pause(&mut self, id: ItemId);

    /// Applies the feed-wide mute flag and volume to one video.
    fn apply_audio(&mut self, id: ItemId, audio: AudioSettings);
}
