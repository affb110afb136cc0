// Copyright 2026 the Reelfeed Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for reelfeed.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`VisibilityObserver`]: `IntersectionObserver` visibility source
//! - [`DomMediaHost`]: `HtmlVideoElement` media host
//! - [`Timer`] / [`Interval`]: `setTimeout` / `setInterval` wrappers
//! - [`network_hints`]: `navigator.connection` capability hints
//! - [`ConsoleSink`]: trace events as `tracing` records
//! - [`redirect`]: restaurant page redirects
//! - [`dom`]: feed markup helpers (reordering, scroll snap, titles)

#![no_std]

extern crate alloc;

mod console;
pub mod dom;
mod hints;
mod host;
mod observer;
pub mod redirect;
mod timer;

pub use console::ConsoleSink;
pub use hints::network_hints;
pub use host::{DomMediaHost, MediaEvent};
pub use observer::VisibilityObserver;
pub use reelfeed_core::backend::MediaHost;
pub use timer::{Interval, Timer};

use reelfeed_core::feed::ItemId;
use reelfeed_core::time::HostTime;
use web_sys::Element;

/// Attribute carrying an element's [`ItemId`].
pub const ITEM_ATTR: &str = "data-item";

/// Returns the current host time from `performance.now()`, in microseconds.
#[must_use]
pub fn now() -> HostTime {
    HostTime::from_millis_f64(timer::performance_now())
}

/// Tags `element` with `id` so observers can map entries back to items.
pub fn tag_item(element: &Element, id: ItemId) -> Result<(), wasm_bindgen::JsValue> {
    element.set_attribute(ITEM_ATTR, &alloc::format!("{}", id.0))
}

/// Reads the [`ITEM_ATTR`] tag from `element`.
#[must_use]
pub fn item_id_of(element: &Element) -> Option<ItemId> {
    parse_item_id(&element.get_attribute(ITEM_ATTR)?)
}

fn parse_item_id(raw: &str) -> Option<ItemId> {
    raw.trim().parse().ok().map(ItemId)
}
