// Copyright 2026 the Reelfeed Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-video playback state.

use alloc::string::String;

/// Playback lifecycle of one video.
///
/// ```text
///   Unloaded ──► Loading ──► Ready ──► Playing ◄──► Paused
///       ▲           │
///       │           ▼
///       └──────── Errored
/// ```
///
/// `Playing` and `Paused` are only reachable from `Ready`. Unresolving a
/// video (clearing its source) returns it to `Unloaded`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum PlaybackState {
    /// No source attached.
    #[default]
    Unloaded,
    /// Source attached, waiting for enough data to play.
    Loading,
    /// Enough data buffered; never played yet.
    Ready,
    /// Currently playing.
    Playing,
    /// Loaded and paused.
    Paused,
    /// The transfer failed.
    Errored,
}

impl PlaybackState {
    /// Returns `true` once enough data is buffered to start playback.
    #[must_use]
    pub const fn is_playable(self) -> bool {
        matches!(self, Self::Ready | Self::Playing | Self::Paused)
    }

    /// Returns `true` if the source is attached or already resolved, i.e. a
    /// new resolution request would be redundant.
    #[must_use]
    pub const fn is_resolved_or_pending(self) -> bool {
        matches!(
            self,
            Self::Loading | Self::Ready | Self::Playing | Self::Paused
        )
    }

    /// Short lowercase label, for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unloaded => "unloaded",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Errored => "errored",
        }
    }
}

/// Where a video's data comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceRef {
    /// The URL is already on the element (`src`); loading starts eagerly.
    Resolved(String),
    /// The URL is parked (`data-src`) until the loader attaches it.
    Deferred(String),
}

impl SourceRef {
    /// The URL regardless of resolution.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Resolved(url) | Self::Deferred(url) => url,
        }
    }

    /// Returns `true` for a deferred (`data-src`) source.
    #[must_use]
    pub const fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }
}

/// One video element's state as tracked by the controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Video {
    source: SourceRef,
    state: PlaybackState,
}

impl Video {
    /// Creates an unloaded video with the given source.
    #[must_use]
    pub const fn new(source: SourceRef) -> Self {
        Self {
            source,
            state: PlaybackState::Unloaded,
        }
    }

    /// The video's source reference.
    #[must_use]
    pub fn source(&self) -> &SourceRef {
        &self.source
    }

    /// The current playback state.
    #[must_use]
    pub const fn state(&self) -> PlaybackState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: PlaybackState) -> PlaybackState {
        core::mem::replace(&mut self.state, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString as _;

    #[test]
    fn playable_states() {
        assert!(!PlaybackState::Unloaded.is_playable());
        assert!(!PlaybackState::Loading.is_playable());
        assert!(PlaybackState::Ready.is_playable());
        assert!(PlaybackState::Paused.is_playable());
        assert!(!PlaybackState::Errored.is_playable());
        assert!(!PlaybackState::Errored.is_resolved_or_pending());
    }

    #[test]
    fn set_state_returns_previous() {
        let mut v = Video::new(SourceRef::Deferred("a.mp4".to_string()));
        assert_eq!(v.set_state(PlaybackState::Loading), PlaybackState::Unloaded);
        assert_eq!(v.state(), PlaybackState::Loading);
        assert_eq!(v.source().url(), "a.mp4");
        assert!(v.source().is_deferred());
    }
}
