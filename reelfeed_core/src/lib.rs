// Copyright 2026 the Reelfeed Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types and state machine for a visibility-driven video feed.
//!
//! `reelfeed_core` decides which video in a scrolling feed plays, which
//! sources are resolved, and when. It is `no_std` compatible (with `alloc`)
//! and never touches a platform API directly: visibility notifications and
//! media outcomes come in as method calls, decisions go out through the
//! [`MediaHost`](backend::MediaHost) trait.
//!
//! # Architecture
//!
//! ```text
//!   NetworkHints ──► CapabilityStrategy::select() ──► LoadingProfile
//!                                                         │
//!   Feed::shuffle() ──► Feed ─────────────────────────────┤
//!                                                         ▼
//!   playback observer ──► PlaybackController::on_playback_visibility()
//!   load observer ─────► PlaybackController::on_load_visibility() ──► Loader
//!   media outcomes ────► on_loaded() / on_load_failed() / on_play_rejected()
//!                                                         │
//!                                                         ▼
//!                                             MediaHost (play, pause, attach)
//! ```
//!
//! **[`feed`]**: Items, presentation order, the shuffle, and feed-wide
//! audio settings.
//!
//! **[`video`]**: Per-video playback state and source reference.
//!
//! **[`controller`]**: The single-playing-video state machine.
//!
//! **[`loader`]**: Windowed source resolution with an optional serialized
//! queue, bounded retry, and distant unloading.
//!
//! **[`profile`]**: Loading profiles, observer tuning, and the capability
//! strategy that picks a profile from network hints.
//!
//! **[`visibility`]**: Observer entries and batch ordering.
//!
//! **[`backend`]**: The [`MediaHost`](backend::MediaHost) trait that
//! platform backends implement.
//!
//! **[`time`]**: Host time and durations in microseconds.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types,
//! with a zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod backend;
pub mod controller;
pub mod error;
pub mod feed;
pub mod loader;
pub mod profile;
pub mod time;
pub mod trace;
pub mod video;
pub mod visibility;
