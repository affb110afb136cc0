// Copyright 2026 the Reelfeed Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `IntersectionObserver` visibility source.
//!
//! [`VisibilityObserver`] turns observer callbacks into batches of
//! [`VisibilityEntry`] values. Items are identified by the
//! [`ITEM_ATTR`](crate::ITEM_ATTR) attribute on the observed element;
//! entries for elements without one are dropped.

use alloc::boxed::Box;
use alloc::vec::Vec;

use js_sys::Array;
use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{Element, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

use reelfeed_core::profile::ObserverConfig;
use reelfeed_core::visibility::VisibilityEntry;

use crate::item_id_of;

type ObserverClosure = Closure<dyn FnMut(Array, IntersectionObserver)>;

/// Wraps an `IntersectionObserver` configured from an [`ObserverConfig`].
pub struct VisibilityObserver {
    observer: IntersectionObserver,
    _closure: ObserverClosure,
}

impl VisibilityObserver {
    /// Creates an observer that calls `callback` with each batch.
    pub fn new(
        config: &ObserverConfig,
        mut callback: impl FnMut(Vec<VisibilityEntry>) + 'static,
    ) -> Result<Self, JsValue> {
        let closure = Closure::wrap(Box::new(move |entries: Array, _: IntersectionObserver| {
            let batch: Vec<VisibilityEntry> = entries
                .iter()
                .filter_map(|v| v.dyn_into::<IntersectionObserverEntry>().ok())
                .filter_map(|entry| to_entry(&entry))
                .collect();
            if !batch.is_empty() {
                callback(batch);
            }
        }) as Box<dyn FnMut(Array, IntersectionObserver)>);

        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(f64::from(config.threshold)));
        init.set_root_margin(&config.root_margin.to_css());
        let observer =
            IntersectionObserver::new_with_options(closure.as_ref().unchecked_ref(), &init)?;

        Ok(Self {
            observer,
            _closure: closure,
        })
    }

    /// Starts observing `element`.
    pub fn observe(&self, element: &Element) {
        self.observer.observe(element);
    }

    /// Stops observing everything.
    pub fn disconnect(&self) {
        self.observer.disconnect();
    }
}

fn to_entry(entry: &IntersectionObserverEntry) -> Option<VisibilityEntry> {
    let item = item_id_of(&entry.target())?;
    #[expect(
        clippy::cast_possible_truncation,
        reason = "intersection ratio lies in 0.0..=1.0"
    )]
    let ratio = entry.intersection_ratio() as f32;
    Some(VisibilityEntry {
        item,
        intersecting: entry.is_intersecting(),
        ratio,
    })
}

impl Drop for VisibilityObserver {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

impl core::fmt::Debug for VisibilityObserver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VisibilityObserver").finish_non_exhaustive()
    }
}
