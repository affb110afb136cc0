// Copyright 2026 the Reelfeed Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Feed markup helpers.

use alloc::string::String;

use wasm_bindgen::JsValue;
use web_sys::{Element, HtmlElement};

use reelfeed_core::feed::ItemId;

/// Re-appends `items` to `container` in presentation `order`.
///
/// `items` is indexed by [`ItemId`]; appending an existing child moves it, so
/// the container ends up in exactly the given order.
pub fn reorder_children(
    container: &Element,
    items: &[Element],
    order: &[ItemId],
) -> Result<(), JsValue> {
    for id in order {
        if let Some(item) = items.get(id.index()) {
            container.append_child(item)?;
        }
    }
    Ok(())
}

/// Sets the container's `scroll-snap-type`; `"none"` disables snapping.
pub fn set_scroll_snap(container: &HtmlElement, value: &str) -> Result<(), JsValue> {
    container.style().set_property("scroll-snap-type", value)
}

/// Scrolls both the window and the feed container back to the top.
pub fn scroll_to_top(container: &Element) {
    if let Some(window) = web_sys::window() {
        window.scroll_to_with_x_and_y(0.0, 0.0);
    }
    container.set_scroll_top(0);
}

/// The text of the item's `h3`, if it has one.
#[must_use]
pub fn item_title(item: &Element) -> Option<String> {
    item.query_selector("h3")
        .ok()
        .flatten()?
        .text_content()
        .map(|t| String::from(t.trim()))
        .filter(|t| !t.is_empty())
}
