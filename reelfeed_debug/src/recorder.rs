// Copyright 2026 the Reelfeed Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as little-endian records. [`decode`] reads them back as an
//! iterator of [`RecordedEvent`].
//!
//! View titles are stored as length-prefixed UTF-8.

use reelfeed_core::feed::{AudioSettings, ItemId};
use reelfeed_core::time::{Duration, HostTime};
use reelfeed_core::trace::{
    AudioChangeEvent, LoadCompleteEvent, LoadFailedEvent, LoadStartedEvent, PlayRejectedEvent,
    StateChangeEvent, TraceSink, UnloadEvent, ViewEvent,
};
use reelfeed_core::video::PlaybackState;

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_STATE_CHANGE: u8 = 1;
const TAG_PLAY_REJECTED: u8 = 2;
const TAG_LOAD_STARTED: u8 = 3;
const TAG_LOAD_COMPLETE: u8 = 4;
const TAG_LOAD_FAILED: u8 = 5;
const TAG_UNLOAD: u8 = 6;
const TAG_AUDIO_CHANGE: u8 = 7;
const TAG_VIEW: u8 = 8;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Decodes everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        decode(&self.buf).collect()
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_usize(&mut self, v: usize) {
        self.write_u64(u64::try_from(v).unwrap_or(u64::MAX));
    }

    fn write_option_u64(&mut self, v: Option<u64>) {
        match v {
            Some(val) => {
                self.write_u8(1);
                self.write_u64(val);
            }
            None => {
                self.write_u8(0);
                self.write_u64(0);
            }
        }
    }

    fn write_state(&mut self, s: PlaybackState) {
        self.write_u8(match s {
            PlaybackState::Unloaded => 0,
            PlaybackState::Loading => 1,
            PlaybackState::Ready => 2,
            PlaybackState::Playing => 3,
            PlaybackState::Paused => 4,
            PlaybackState::Errored => 5,
        });
    }

    fn write_str(&mut self, s: &str) {
        let bytes = s.as_bytes();
        let len = bytes.len().min(u32::MAX as usize);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "title length capped at u32::MAX for recording"
        )]
        self.write_u32(len as u32);
        self.buf.extend_from_slice(&bytes[..len]);
    }
}

impl TraceSink for RecorderSink {
    fn on_state_change(&mut self, e: &StateChangeEvent) {
        self.write_u8(TAG_STATE_CHANGE);
        self.write_u32(e.item.0);
        self.write_state(e.from);
        self.write_state(e.to);
    }

    fn on_play_rejected(&mut self, e: &PlayRejectedEvent) {
        self.write_u8(TAG_PLAY_REJECTED);
        self.write_u32(e.item.0);
        self.write_u8(u8::from(e.retry_on_gesture));
    }

    fn on_load_started(&mut self, e: &LoadStartedEvent) {
        self.write_u8(TAG_LOAD_STARTED);
        self.write_u32(e.item.0);
        self.write_usize(e.position);
        self.write_u64(e.at.micros());
        self.write_u8(e.attempt);
    }

    fn on_load_complete(&mut self, e: &LoadCompleteEvent) {
        self.write_u8(TAG_LOAD_COMPLETE);
        self.write_u32(e.item.0);
        self.write_u64(e.elapsed.micros());
    }

    fn on_load_failed(&mut self, e: &LoadFailedEvent) {
        self.write_u8(TAG_LOAD_FAILED);
        self.write_u32(e.item.0);
        self.write_u64(e.at.micros());
        self.write_option_u64(e.retry_at.map(HostTime::micros));
    }

    fn on_unload(&mut self, e: &UnloadEvent) {
        self.write_u8(TAG_UNLOAD);
        self.write_u32(e.item.0);
        self.write_usize(e.distance);
    }

    fn on_audio_change(&mut self, e: &AudioChangeEvent) {
        self.write_u8(TAG_AUDIO_CHANGE);
        self.write_u8(u8::from(e.audio.muted));
        self.write_u32(e.audio.volume.to_bits());
        self.write_usize(e.applied);
    }

    fn on_view(&mut self, e: &ViewEvent<'_>) {
        self.write_u8(TAG_VIEW);
        self.write_u32(e.item.0);
        match e.title {
            Some(title) => {
                self.write_u8(1);
                self.write_str(title);
            }
            None => self.write_u8(0),
        }
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedEvent {
    /// A [`StateChangeEvent`].
    StateChange(StateChangeEvent),
    /// A [`PlayRejectedEvent`].
    PlayRejected(PlayRejectedEvent),
    /// A [`LoadStartedEvent`].
    LoadStarted(LoadStartedEvent),
    /// A [`LoadCompleteEvent`].
    LoadComplete(LoadCompleteEvent),
    /// A [`LoadFailedEvent`].
    LoadFailed(LoadFailedEvent),
    /// An [`UnloadEvent`].
    Unload(UnloadEvent),
    /// An [`AudioChangeEvent`].
    AudioChange(AudioChangeEvent),
    /// A [`ViewEvent`] with its title copied out.
    View {
        /// Which item.
        item: ItemId,
        /// The title, if the item had one.
        title: Option<String>,
    },
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take(&mut self, n: usize) -> Option<&[u8]> {
        let end = self.pos.checked_add(n)?;
        let slice = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    fn read_u8(&mut self) -> Option<u8> {
        Some(self.take(1)?[0])
    }

    fn read_u32(&mut self) -> Option<u32> {
        Some(u32::from_le_bytes(self.take(4)?.try_into().ok()?))
    }

    fn read_u64(&mut self) -> Option<u64> {
        Some(u64::from_le_bytes(self.take(8)?.try_into().ok()?))
    }

    fn read_usize(&mut self) -> Option<usize> {
        usize::try_from(self.read_u64()?).ok()
    }

    fn read_item(&mut self) -> Option<ItemId> {
        self.read_u32().map(ItemId)
    }

    fn read_option_u64(&mut self) -> Option<Option<u64>> {
        let present = self.read_u8()?;
        let val = self.read_u64()?;
        Some(if present != 0 { Some(val) } else { None })
    }

    fn read_state(&mut self) -> Option<PlaybackState> {
        Some(match self.read_u8()? {
            0 => PlaybackState::Unloaded,
            1 => PlaybackState::Loading,
            2 => PlaybackState::Ready,
            3 => PlaybackState::Playing,
            4 => PlaybackState::Paused,
            5 => PlaybackState::Errored,
            _ => return None,
        })
    }

    fn read_string(&mut self) -> Option<String> {
        let len = usize::try_from(self.read_u32()?).ok()?;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).ok()
    }

    fn decode_state_change(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::StateChange(StateChangeEvent {
            item: self.read_item()?,
            from: self.read_state()?,
            to: self.read_state()?,
        }))
    }

    fn decode_play_rejected(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PlayRejected(PlayRejectedEvent {
            item: self.read_item()?,
            retry_on_gesture: self.read_u8()? != 0,
        }))
    }

    fn decode_load_started(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::LoadStarted(LoadStartedEvent {
            item: self.read_item()?,
            position: self.read_usize()?,
            at: HostTime(self.read_u64()?),
            attempt: self.read_u8()?,
        }))
    }

    fn decode_load_complete(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::LoadComplete(LoadCompleteEvent {
            item: self.read_item()?,
            elapsed: Duration(self.read_u64()?),
        }))
    }

    fn decode_load_failed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::LoadFailed(LoadFailedEvent {
            item: self.read_item()?,
            at: HostTime(self.read_u64()?),
            retry_at: self.read_option_u64()?.map(HostTime),
        }))
    }

    fn decode_unload(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Unload(UnloadEvent {
            item: self.read_item()?,
            distance: self.read_usize()?,
        }))
    }

    fn decode_audio_change(&mut self) -> Option<RecordedEvent> {
        let muted = self.read_u8()? != 0;
        let volume = f32::from_bits(self.read_u32()?);
        Some(RecordedEvent::AudioChange(AudioChangeEvent {
            audio: AudioSettings { muted, volume },
            applied: self.read_usize()?,
        }))
    }

    fn decode_view(&mut self) -> Option<RecordedEvent> {
        let item = self.read_item()?;
        let title = match self.read_u8()? {
            0 => None,
            _ => Some(self.read_string()?),
        };
        Some(RecordedEvent::View { item, title })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_STATE_CHANGE => self.decode_state_change(),
            TAG_PLAY_REJECTED => self.decode_play_rejected(),
            TAG_LOAD_STARTED => self.decode_load_started(),
            TAG_LOAD_COMPLETE => self.decode_load_complete(),
            TAG_LOAD_FAILED => self.decode_load_failed(),
            TAG_UNLOAD => self.decode_unload(),
            TAG_AUDIO_CHANGE => self.decode_audio_change(),
            TAG_VIEW => self.decode_view(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
