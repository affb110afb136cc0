// Copyright 2026 the Reelfeed Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trace events as `tracing` records.
//!
//! With a `tracing-wasm` subscriber installed these land in the browser
//! console.

use reelfeed_core::trace::{
    AudioChangeEvent, LoadCompleteEvent, LoadFailedEvent, LoadStartedEvent, PlayRejectedEvent,
    StateChangeEvent, TraceSink, UnloadEvent, ViewEvent,
};

/// Forwards controller and loader events to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleSink;

impl TraceSink for ConsoleSink {
    fn on_state_change(&mut self, e: &StateChangeEvent) {
        tracing::debug!(
            item = e.item.0,
            from = e.from.as_str(),
            to = e.to.as_str(),
            "state"
        );
    }

    fn on_play_rejected(&mut self, e: &PlayRejectedEvent) {
        tracing::info!(
            item = e.item.0,
            retry_on_gesture = e.retry_on_gesture,
            "autoplay prevented"
        );
    }

    fn on_load_started(&mut self, e: &LoadStartedEvent) {
        tracing::debug!(
            item = e.item.0,
            position = e.position,
            attempt = e.attempt,
            "loading"
        );
    }

    fn on_load_complete(&mut self, e: &LoadCompleteEvent) {
        tracing::info!(
            item = e.item.0,
            ms = e.elapsed.as_millis_f64(),
            "video loaded"
        );
    }

    fn on_load_failed(&mut self, e: &LoadFailedEvent) {
        match e.retry_at {
            Some(at) => tracing::warn!(item = e.item.0, retry_at_us = at.micros(), "load failed"),
            None => tracing::warn!(item = e.item.0, "load failed, giving up"),
        }
    }

    fn on_unload(&mut self, e: &UnloadEvent) {
        tracing::debug!(item = e.item.0, distance = e.distance, "unloaded");
    }

    fn on_audio_change(&mut self, e: &AudioChangeEvent) {
        tracing::info!(
            muted = e.audio.muted,
            volume = f64::from(e.audio.volume),
            videos = e.applied,
            "audio"
        );
    }

    fn on_view(&mut self, e: &ViewEvent<'_>) {
        match e.title {
            Some(title) => tracing::info!(item = e.item.0, title, "user watched"),
            None => tracing::info!(item = e.item.0, "user watched"),
        }
    }
}
