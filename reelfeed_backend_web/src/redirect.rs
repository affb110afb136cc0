// Copyright 2026 the Reelfeed Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Restaurant id → page URL redirects.

use alloc::string::String;
use alloc::vec::Vec;

use wasm_bindgen::JsValue;

/// A small lookup table of redirect targets.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RedirectTable {
    entries: Vec<(String, String)>,
}

impl RedirectTable {
    /// Creates an empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds or replaces the target for `id`.
    #[must_use]
    pub fn with(mut self, id: impl Into<String>, url: impl Into<String>) -> Self {
        self.insert(id, url);
        self
    }

    /// Adds or replaces the target for `id`.
    pub fn insert(&mut self, id: impl Into<String>, url: impl Into<String>) {
        let (id, url) = (id.into(), url.into());
        match self.entries.iter_mut().find(|(k, _)| *k == id) {
            Some(entry) => entry.1 = url,
            None => self.entries.push((id, url)),
        }
    }

    /// The target for `id`.
    #[must_use]
    pub fn url_for(&self, id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == id)
            .map(|(_, url)| url.as_str())
    }

    /// Navigates to the page for `id`. Unknown ids are logged and ignored;
    /// returns whether navigation started.
    pub fn redirect(&self, id: &str) -> Result<bool, JsValue> {
        tracing::info!(restaurant = id, "redirecting");
        let Some(url) = self.url_for(id) else {
            tracing::warn!(restaurant = id, "no page for restaurant");
            return Ok(false);
        };
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        window.location().set_href(url)?;
        Ok(true)
    }
}
