// Copyright 2026 the Reelfeed Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Restaurant promo page: a shuffled, autoplaying short-video feed.
//!
//! The page markup provides a `.video-feed` container of `.video-item`
//! elements, each holding a `<video>` (with `src`, or `data-src` for
//! progressive loading) and optionally an `h3` title. This crate shuffles
//! the items, waits for the layout to settle, then hands playback to a
//! [`PlaybackController`]. It also animates the metric counters and wires the
//! restaurant redirect links.
//!
//! Build with: `wasm-pack build --target web demos/web_feed`
//! Then serve `demos/web_feed/` and open `index.html`.

#![no_std]
#![cfg_attr(
    not(target_arch = "wasm32"),
    allow(dead_code, reason = "this crate only runs in the browser")
)]

extern crate alloc;

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::string::ToString as _;
use alloc::vec::Vec;
use core::cell::{OnceCell, RefCell};

use rand::SeedableRng as _;
use rand::rngs::SmallRng;
use reelfeed_backend_web::redirect::RedirectTable;
use reelfeed_backend_web::{
    ConsoleSink, DomMediaHost, Interval, MediaEvent, Timer, VisibilityObserver, dom,
};
use reelfeed_core::controller::PlaybackController;
use reelfeed_core::error::FeedError;
use reelfeed_core::feed::{Feed, Item, ItemId};
use reelfeed_core::profile::{CapabilityStrategy, DefaultStrategy, FixedProfile, LoadingProfile};
use reelfeed_core::time::Duration;
use reelfeed_core::trace::{
    AudioChangeEvent, LoadCompleteEvent, LoadFailedEvent, LoadStartedEvent, PlayRejectedEvent,
    StateChangeEvent, TraceSink, Tracer, UnloadEvent, ViewEvent,
};
use reelfeed_core::video::SourceRef;
use reelfeed_core::visibility::VisibilityEntry;
use reelfeed_metrics::{COUNTER_STEP, MetricCounter, PerformanceTracker};
use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Event, HtmlElement, HtmlVideoElement};

/// Animated counters: element id, start, end, duration in ms.
const METRICS: &[(&str, i64, i64, u64)] = &[
    ("qr-scans", 124, 132, 2000),
    ("video-views", 892, 910, 2500),
    ("orders", 23, 27, 3000),
];
const REDIRECTS: &[(&str, &str)] = &[
    ("thai2go", "thai2go.html"),
    ("phoshizzle", "phoshizzle.html"),
    ("angkorwok", "angkorwok.html"),
    ("sweetalchemy", "sweetalchemy.html"),
];
const RECENT_LOADS: usize = 32;

/// Console logging plus performance tracking.
struct Sinks {
    console: ConsoleSink,
    perf: PerformanceTracker<RECENT_LOADS>,
}

impl TraceSink for Sinks {
    fn on_state_change(&mut self, e: &StateChangeEvent) {
        self.console.on_state_change(e);
    }

    fn on_play_rejected(&mut self, e: &PlayRejectedEvent) {
        self.console.on_play_rejected(e);
    }

    fn on_load_started(&mut self, e: &LoadStartedEvent) {
        self.console.on_load_started(e);
    }

    fn on_load_complete(&mut self, e: &LoadCompleteEvent) {
        self.console.on_load_complete(e);
        let report = self.perf.track_load(e.elapsed);
        tracing::info!(
            average_ms = report.average_load_ms,
            loaded = report.videos_loaded,
            "load average"
        );
    }

    fn on_load_failed(&mut self, e: &LoadFailedEvent) {
        self.console.on_load_failed(e);
    }

    fn on_unload(&mut self, e: &UnloadEvent) {
        self.console.on_unload(e);
    }

    fn on_audio_change(&mut self, e: &AudioChangeEvent) {
        self.console.on_audio_change(e);
    }

    fn on_view(&mut self, e: &ViewEvent<'_>) {
        self.console.on_view(e);
        self.perf.on_view(e);
    }
}

/// Everything the page's callbacks share.
struct Page {
    controller: PlaybackController,
    host: DomMediaHost,
    sinks: Sinks,
    wakeup: Timer,
    observers: Vec<VisibilityObserver>,
}

type PageRef = Rc<OnceCell<Weak<RefCell<Page>>>>;

/// Runs `f` on the page if it is alive and not already borrowed.
fn with_page(page: &PageRef, f: impl FnOnce(&mut Page)) {
    let Some(page) = page.get().and_then(Weak::upgrade) else {
        return;
    };
    match page.try_borrow_mut() {
        Ok(mut p) => f(&mut *p),
        Err(_) => tracing::warn!("page busy, event dropped"),
    }
}

fn log_err(result: Result<(), FeedError>) {
    if let Err(err) = result {
        tracing::warn!(%err, "event ignored");
    }
}

impl Page {
    fn parts(&mut self) -> (&mut PlaybackController, &mut DomMediaHost, Tracer<'_>) {
        (
            &mut self.controller,
            &mut self.host,
            Tracer::new(&mut self.sinks),
        )
    }

    fn rearm(&self) {
        self.wakeup
            .arm_at(self.controller.next_wakeup(), reelfeed_backend_web::now());
    }

    fn start(&mut self) {
        let now = reelfeed_backend_web::now();
        let (c, host, mut tracer) = self.parts();
        log_err(c.start(now, host, &mut tracer));
        self.rearm();
    }

    fn on_playback(&mut self, entries: &[VisibilityEntry]) {
        let (c, host, mut tracer) = self.parts();
        log_err(c.on_playback_visibility(entries, host, &mut tracer));
    }

    fn on_load(&mut self, entries: &[VisibilityEntry]) {
        let now = reelfeed_backend_web::now();
        let (c, host, mut tracer) = self.parts();
        log_err(c.on_load_visibility(entries, now, host, &mut tracer));
        self.rearm();
    }

    fn on_media(&mut self, event: MediaEvent) {
        let now = reelfeed_backend_web::now();
        let (c, host, mut tracer) = self.parts();
        let result = match event {
            MediaEvent::Loaded(id) => c.on_loaded(id, now, host, &mut tracer).map(|_| ()),
            MediaEvent::Failed(id) => c.on_load_failed(id, now, host, &mut tracer),
            MediaEvent::PlayRejected(id) => c.on_play_rejected(id, &mut tracer),
        };
        log_err(result);
        self.rearm();
    }

    fn poll(&mut self) {
        let now = reelfeed_backend_web::now();
        let (c, host, mut tracer) = self.parts();
        log_err(c.poll(now, host, &mut tracer));
        self.rearm();
    }

    fn gesture(&mut self) {
        let (c, host, mut tracer) = self.parts();
        log_err(c.on_user_gesture(host, &mut tracer));
    }

    fn toggle_mute(&mut self) {
        let (c, host, mut tracer) = self.parts();
        c.toggle_mute(host, &mut tracer);
    }

    fn report(&self) {
        let r = self.sinks.perf.report();
        tracing::info!(
            loaded = r.videos_loaded,
            watched = r.videos_watched,
            total_ms = r.total_load_ms,
            average_ms = r.average_load_ms,
            recent = %self.sinks.perf.sparkline_ascii(0.0, 2000.0),
            "performance report"
        );
    }
}

/// One feed item found in the markup.
struct Slot {
    item: Element,
    video: HtmlVideoElement,
}

fn collect_slots(feed_el: &Element) -> Result<Vec<Slot>, JsValue> {
    let nodes = feed_el.query_selector_all(".video-item")?;
    let mut slots = Vec::with_capacity(nodes.length() as usize);
    for i in 0..nodes.length() {
        let Some(item) = nodes.item(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
            continue;
        };
        let Some(video) = item
            .query_selector("video")?
            .and_then(|v| v.dyn_into::<HtmlVideoElement>().ok())
        else {
            tracing::warn!(index = i, "video item without a video");
            continue;
        };
        slots.push(Slot { item, video });
    }
    Ok(slots)
}

fn feed_item(slot: &Slot) -> Item {
    let source = match slot.video.get_attribute("data-src") {
        Some(url) => SourceRef::Deferred(url),
        None => SourceRef::Resolved(slot.video.get_attribute("src").unwrap_or_default()),
    };
    let item = Item::new(source);
    match dom::item_title(&slot.item) {
        Some(title) => item.with_title(title),
        None => item,
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "Math.random() lies in 0.0..1.0; only the bits matter"
)]
fn seed() -> u64 {
    let random = (js_sys::Math::random() * 9_007_199_254_740_992.0) as u64;
    random ^ reelfeed_backend_web::now().micros()
}

fn choose_profile(feed_el: &Element) -> LoadingProfile {
    let pinned = feed_el
        .get_attribute("data-profile")
        .and_then(|name| LoadingProfile::preset(&name));
    let hints = reelfeed_backend_web::network_hints();
    let profile = match pinned {
        Some(profile) => FixedProfile(profile).select(&hints),
        None => DefaultStrategy.select(&hints),
    };
    tracing::info!(
        progressive = profile.is_progressive(),
        pinned = pinned.is_some(),
        ?hints,
        "loading profile"
    );
    profile
}

fn listen(
    target: &web_sys::EventTarget,
    event: &str,
    f: impl FnMut(Event) + 'static,
) -> Result<(), JsValue> {
    let cb = Closure::wrap(Box::new(f) as Box<dyn FnMut(Event)>);
    target.add_event_listener_with_callback(event, cb.as_ref().unchecked_ref())?;
    cb.forget();
    Ok(())
}

/// Entry point for the feed page.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();

    let window = web_sys::window().expect("window");
    let document = window.document().expect("document");

    start_counters(&document);
    bind_redirects(&document)?;

    let Some(feed_el) = document.query_selector(".video-feed")? else {
        tracing::warn!("page has no .video-feed");
        return Ok(());
    };
    let feed_el: HtmlElement = feed_el.dyn_into()?;
    let slots = collect_slots(&feed_el)?;
    for (i, slot) in slots.iter().enumerate() {
        let id = ItemId(u32::try_from(i).map_err(|_| JsValue::from_str("feed too long"))?);
        reelfeed_backend_web::tag_item(&slot.item, id)?;
        reelfeed_backend_web::tag_item(&slot.video, id)?;
    }

    let mut feed = Feed::new(slots.iter().map(feed_item).collect());
    if feed_el.get_attribute("data-shuffle").as_deref() != Some("false") {
        feed.shuffle(&mut SmallRng::seed_from_u64(seed()));
        let items: Vec<Element> = slots.iter().map(|s| s.item.clone()).collect();
        dom::reorder_children(&feed_el, &items, feed.order())?;
    }

    // Snap would fight the reset while the reordered layout settles.
    dom::set_scroll_snap(&feed_el, "none")?;
    dom::scroll_to_top(&feed_el);

    let profile = choose_profile(&feed_el);
    let page_ref: PageRef = Rc::new(OnceCell::new());

    let events = Rc::clone(&page_ref);
    let host = DomMediaHost::new(
        slots.iter().map(|s| s.video.clone()).collect(),
        move |event| with_page(&events, |p| p.on_media(event)),
    )?;
    let wake = Rc::clone(&page_ref);
    let wakeup = Timer::new(move || with_page(&wake, Page::poll));

    let page = Rc::new(RefCell::new(Page {
        controller: PlaybackController::new(feed, profile),
        host,
        sinks: Sinks {
            console: ConsoleSink,
            perf: PerformanceTracker::new(),
        },
        wakeup,
        observers: Vec::new(),
    }));
    let _ = page_ref.set(Rc::downgrade(&page));

    for slot in &slots {
        let video_ref = Rc::clone(&page_ref);
        listen(&slot.video, "click", move |_| {
            with_page(&video_ref, Page::toggle_mute);
        })?;
    }
    for event in ["click", "touchend", "keydown"] {
        let gesture_ref = Rc::clone(&page_ref);
        listen(&window, event, move |_| with_page(&gesture_ref, Page::gesture))?;
    }
    let unload_ref = Rc::clone(&page_ref);
    listen(&window, "beforeunload", move |_| {
        with_page(&unload_ref, |p| p.report());
    })?;

    let settle_ref = Rc::clone(&page_ref);
    let settle_feed = feed_el.clone();
    let videos: Vec<Element> = slots.iter().map(|s| s.video.clone().into()).collect();
    let settle = Timer::new(move || {
        if let Err(err) = dom::set_scroll_snap(&settle_feed, "y mandatory") {
            tracing::warn!(?err, "could not restore scroll snap");
        }
        if let Err(err) = observe(&settle_ref, &videos) {
            tracing::warn!(?err, "could not start observers");
        }
        with_page(&settle_ref, Page::start);
    });
    settle.arm(profile.settle_delay);

    // The page state and its timers live as long as the document.
    core::mem::forget(settle);
    core::mem::forget(page);
    Ok(())
}

fn observe(page_ref: &PageRef, videos: &[Element]) -> Result<(), JsValue> {
    let Some(page) = page_ref.get().and_then(Weak::upgrade) else {
        return Ok(());
    };
    let profile = *page.borrow().controller.profile();

    let playback_ref = Rc::clone(page_ref);
    let playback = VisibilityObserver::new(&profile.playback, move |entries| {
        with_page(&playback_ref, |p| p.on_playback(&entries));
    })?;
    let mut observers = Vec::from([playback]);

    if let Some(loader) = profile.loader {
        let load_ref = Rc::clone(page_ref);
        observers.push(VisibilityObserver::new(&loader.observer, move |entries| {
            with_page(&load_ref, |p| p.on_load(&entries));
        })?);
    }
    for observer in &observers {
        for video in videos {
            observer.observe(video);
        }
    }
    page.borrow_mut().observers = observers;
    Ok(())
}

fn start_counters(document: &Document) {
    for &(id, start, end, ms) in METRICS {
        let Some(el) = document.get_element_by_id(id) else {
            continue;
        };
        let mut counter = MetricCounter::new(start, end, Duration::from_millis(ms));
        Interval::start(COUNTER_STEP, move || match counter.tick() {
            Some(step) => {
                el.set_text_content(Some(&step.value.to_string()));
                !step.done
            }
            None => false,
        })
        .detach();
    }
}

fn bind_redirects(document: &Document) -> Result<(), JsValue> {
    let table = Rc::new(
        REDIRECTS
            .iter()
            .fold(RedirectTable::new(), |t, (id, url)| t.with(*id, *url)),
    );
    let links = document.query_selector_all("[data-restaurant]")?;
    for i in 0..links.length() {
        let Some(link) = links.item(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
            continue;
        };
        let Some(id) = link.get_attribute("data-restaurant") else {
            continue;
        };
        let table = Rc::clone(&table);
        listen(&link, "click", move |_| {
            if let Err(err) = table.redirect(&id) {
                tracing::warn!(?err, "redirect failed");
            }
        })?;
    }
    Ok(())
}
