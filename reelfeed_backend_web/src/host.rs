// Copyright 2026 the Reelfeed Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `HtmlVideoElement` media host.
//!
//! [`DomMediaHost`] applies controller decisions to native video elements.
//! Outcomes the browser reports later (`loadeddata`, `error`, a rejected
//! `play()` promise) are delivered to a [`MediaEvent`] callback supplied at
//! construction, which the page routes back into the controller.
//!
//! The callback never runs synchronously inside a [`MediaHost`] method, so it
//! may freely borrow the controller.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;

use js_sys::Reflect;
use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::HtmlVideoElement;

use reelfeed_core::backend::MediaHost;
use reelfeed_core::feed::{AudioSettings, ItemId};

use crate::timer::defer;

/// `HTMLMediaElement.HAVE_CURRENT_DATA`.
const HAVE_CURRENT_DATA: u16 = 2;
const ABORT_ERROR: &str = "AbortError";

/// An asynchronous outcome reported by the browser.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaEvent {
    /// The video has data for its current frame.
    Loaded(ItemId),
    /// The transfer failed.
    Failed(ItemId),
    /// The `play()` promise was rejected by policy or a decode failure.
    PlayRejected(ItemId),
}

type Listener = Closure<dyn FnMut(JsValue)>;

struct Slot {
    video: HtmlVideoElement,
    _loaded: Listener,
    _failed: Listener,
    rejected: Listener,
}

/// Drives a fixed set of `<video>` elements, indexed by [`ItemId`].
pub struct DomMediaHost {
    slots: Vec<Slot>,
    on_event: Rc<dyn Fn(MediaEvent)>,
}

impl DomMediaHost {
    /// Wraps `videos` (in item id order) and registers the event listeners.
    pub fn new(
        videos: Vec<HtmlVideoElement>,
        on_event: impl Fn(MediaEvent) + 'static,
    ) -> Result<Self, JsValue> {
        let on_event: Rc<dyn Fn(MediaEvent)> = Rc::new(on_event);
        let mut slots = Vec::with_capacity(videos.len());
        for (index, video) in videos.into_iter().enumerate() {
            let id = ItemId(u32::try_from(index).map_err(|_| JsValue::from_str("too many videos"))?);
            let loaded = listener(&on_event, MediaEvent::Loaded(id));
            let failed = listener(&on_event, MediaEvent::Failed(id));
            let rejected = rejection_listener(&on_event, id);
            video.add_event_listener_with_callback("loadeddata", loaded.as_ref().unchecked_ref())?;
            video.add_event_listener_with_callback("error", failed.as_ref().unchecked_ref())?;
            slots.push(Slot {
                video,
                _loaded: loaded,
                _failed: failed,
                rejected,
            });
        }
        Ok(Self { slots, on_event })
    }

    /// The video element for `id`.
    #[must_use]
    pub fn video(&self, id: ItemId) -> Option<&HtmlVideoElement> {
        self.slots.get(id.index()).map(|s| &s.video)
    }

    /// Number of managed videos.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no videos are managed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn report_later(&self, event: MediaEvent) {
        let on_event = Rc::clone(&self.on_event);
        defer(move || on_event(event));
    }
}

fn listener(on_event: &Rc<dyn Fn(MediaEvent)>, event: MediaEvent) -> Listener {
    let on_event = Rc::clone(on_event);
    Closure::wrap(Box::new(move |_: JsValue| on_event(event)) as Box<dyn FnMut(JsValue)>)
}

/// `play()` rejections other than `AbortError`, which only means a pause or
/// source change interrupted the pending play.
fn rejection_listener(on_event: &Rc<dyn Fn(MediaEvent)>, id: ItemId) -> Listener {
    let on_event = Rc::clone(on_event);
    Closure::wrap(Box::new(move |err: JsValue| {
        if is_abort(&err) {
            tracing::debug!(item = id.0, "pending play aborted");
            return;
        }
        on_event(MediaEvent::PlayRejected(id));
    }) as Box<dyn FnMut(JsValue)>)
}

fn is_abort(err: &JsValue) -> bool {
    Reflect::get(err, &JsValue::from_str("name"))
        .ok()
        .and_then(|name| name.as_string())
        .as_deref()
        == Some(ABORT_ERROR)
}

impl MediaHost for DomMediaHost {
    fn attach_source(&mut self, id: ItemId, url: &str) {
        let Some(slot) = self.slots.get(id.index()) else {
            tracing::warn!(item = id.0, "attach for unknown video");
            return;
        };
        // Markup-resolved sources may have finished before we started
        // listening.
        if slot.video.get_attribute("src").as_deref() == Some(url) {
            if slot.video.ready_state() >= HAVE_CURRENT_DATA {
                self.report_later(MediaEvent::Loaded(id));
            }
            return;
        }
        slot.video.set_src(url);
        slot.video.load();
    }

    fn detach_source(&mut self, id: ItemId) {
        if let Some(slot) = self.slots.get(id.index()) {
            if let Err(err) = slot.video.remove_attribute("src") {
                tracing::warn!(item = id.0, ?err, "could not clear source");
                return;
            }
            slot.video.load();
        }
    }

    fn play(&mut self, id: ItemId) {
        let Some(slot) = self.slots.get(id.index()) else {
            return;
        };
        match slot.video.play() {
            Ok(promise) => {
                let _ = promise.catch(&slot.rejected);
            }
            Err(err) => {
                tracing::info!(item = id.0, ?err, "play threw");
                self.report_later(MediaEvent::PlayRejected(id));
            }
        }
    }

    fn pause(&mut self, id: ItemId) {
        if let Some(slot) = self.slots.get(id.index())
            && let Err(err) = slot.video.pause()
        {
            tracing::warn!(item = id.0, ?err, "pause threw");
        }
    }

    fn apply_audio(&mut self, id: ItemId, audio: AudioSettings) {
        if let Some(slot) = self.slots.get(id.index()) {
            slot.video.set_muted(audio.muted);
            slot.video.set_volume(f64::from(audio.volume));
        }
    }
}

impl core::fmt::Debug for DomMediaHost {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DomMediaHost")
            .field("videos", &self.slots.len())
            .finish_non_exhaustive()
    }
}
