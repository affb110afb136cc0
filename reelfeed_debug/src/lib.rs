// Copyright 2026 the Reelfeed Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording and pretty-printing for reelfeed diagnostics.
//!
//! This crate provides [`TraceSink`](reelfeed_core::trace::TraceSink)
//! implementations for development and tests:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: compact binary recording with
//!   [`recorder::decode`] for playback and assertions.

pub mod pretty;
pub mod recorder;
