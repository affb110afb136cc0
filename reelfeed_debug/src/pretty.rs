// Copyright 2026 the Reelfeed Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Times are
//! printed in milliseconds.

use std::io::Write;

use reelfeed_core::time::HostTime;
use reelfeed_core::trace::{
    AudioChangeEvent, LoadCompleteEvent, LoadFailedEvent, LoadStartedEvent, PlayRejectedEvent,
    StateChangeEvent, TraceSink, UnloadEvent, ViewEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the destination.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer
    }
}

fn ms(t: HostTime) -> f64 {
    t.saturating_duration_since(HostTime(0)).as_millis_f64()
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_state_change(&mut self, e: &StateChangeEvent) {
        let _ = writeln!(
            self.writer,
            "[state] item={} {} -> {}",
            e.item.0,
            e.from.as_str(),
            e.to.as_str(),
        );
    }

    fn on_play_rejected(&mut self, e: &PlayRejectedEvent) {
        let retry = if e.retry_on_gesture {
            "retry on gesture"
        } else {
            "giving up"
        };
        let _ = writeln!(self.writer, "[rejected] item={} {retry}", e.item.0);
    }

    fn on_load_started(&mut self, e: &LoadStartedEvent) {
        let _ = writeln!(
            self.writer,
            "[load] item={} pos={} at={:.1}ms attempt={}",
            e.item.0,
            e.position,
            ms(e.at),
            e.attempt,
        );
    }

    fn on_load_complete(&mut self, e: &LoadCompleteEvent) {
        let _ = writeln!(
            self.writer,
            "[loaded] item={} in {:.2}ms",
            e.item.0,
            e.elapsed.as_millis_f64(),
        );
    }

    fn on_load_failed(&mut self, e: &LoadFailedEvent) {
        match e.retry_at {
            Some(at) => {
                let _ = writeln!(
                    self.writer,
                    "[failed] item={} at={:.1}ms retry at {:.1}ms",
                    e.item.0,
                    ms(e.at),
                    ms(at),
                );
            }
            None => {
                let _ = writeln!(
                    self.writer,
                    "[failed] item={} at={:.1}ms no retry",
                    e.item.0,
                    ms(e.at),
                );
            }
        }
    }

    fn on_unload(&mut self, e: &UnloadEvent) {
        let _ = writeln!(
            self.writer,
            "[unload] item={} distance={}",
            e.item.0, e.distance,
        );
    }

    fn on_audio_change(&mut self, e: &AudioChangeEvent) {
        let muted = if e.audio.muted { "muted" } else { "unmuted" };
        let _ = writeln!(
            self.writer,
            "[audio] {muted} volume={:.2} videos={}",
            e.audio.volume, e.applied,
        );
    }

    fn on_view(&mut self, e: &ViewEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[view] item={} {}",
            e.item.0,
            e.title.unwrap_or("(untitled)"),
        );
    }
}
