// Copyright 2026 the Reelfeed Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `setTimeout` / `setInterval` wrappers.
//!
//! [`Timer`] is a re-armable one-shot used to call
//! [`PlaybackController::poll`] at
//! [`next_wakeup`](reelfeed_core::controller::PlaybackController::next_wakeup).
//! [`Interval`] repeats until its callback returns `false`; the metric
//! counters run on it.
//!
//! [`PlaybackController::poll`]: reelfeed_core::controller::PlaybackController::poll

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use reelfeed_core::time::{Duration, HostTime};

// Direct global bindings instead of `web_sys::Window` methods; avoids
// fetching (and unwrapping) the Window object on every call.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "setTimeout")]
    fn set_timeout(callback: &JsValue, ms: i32) -> i32;

    #[wasm_bindgen(js_name = "clearTimeout")]
    fn clear_timeout(id: i32);

    #[wasm_bindgen(js_name = "setInterval")]
    fn set_interval(callback: &JsValue, ms: i32) -> i32;

    #[wasm_bindgen(js_name = "clearInterval")]
    fn clear_interval(id: i32);

    #[wasm_bindgen(js_name = "queueMicrotask")]
    fn queue_microtask(callback: &JsValue);
}

/// Converts a duration to a `setTimeout` delay, rounding up to whole
/// milliseconds so the callback never fires early.
pub(crate) fn delay_ms(d: Duration) -> i32 {
    let ms = d.micros().div_ceil(1000);
    i32::try_from(ms).unwrap_or(i32::MAX)
}

/// Runs `f` once, after the current task finishes.
pub(crate) fn defer(f: impl FnOnce() + 'static) {
    queue_microtask(&Closure::once_into_js(f));
}

type TimerClosure = Closure<dyn FnMut()>;

struct TimerInner {
    closure: RefCell<Option<TimerClosure>>,
    callback: RefCell<Box<dyn FnMut()>>,
    armed: Cell<bool>,
    handle: Cell<i32>,
}

/// A one-shot timer that can be re-armed from anywhere, including its own
/// callback.
pub struct Timer {
    inner: Rc<TimerInner>,
}

impl Timer {
    /// Creates a timer that is **not yet armed**.
    pub fn new(callback: impl FnMut() + 'static) -> Self {
        let inner = Rc::new(TimerInner {
            closure: RefCell::new(None),
            callback: RefCell::new(Box::new(callback)),
            armed: Cell::new(false),
            handle: Cell::new(0),
        });

        let weak = Rc::downgrade(&inner);
        let closure = Closure::wrap(Box::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if !inner.armed.replace(false) {
                return;
            }
            inner.callback.borrow_mut()();
        }) as Box<dyn FnMut()>);
        *inner.closure.borrow_mut() = Some(closure);

        Self { inner }
    }

    /// Fires the callback after `delay`, replacing any pending firing.
    pub fn arm(&self, delay: Duration) {
        self.cancel();
        if let Some(ref closure) = *self.inner.closure.borrow() {
            let id = set_timeout(closure.as_ref().unchecked_ref(), delay_ms(delay));
            self.inner.handle.set(id);
            self.inner.armed.set(true);
        }
    }

    /// Arms for host time `at`, or cancels when `at` is `None`.
    pub fn arm_at(&self, at: Option<HostTime>, now: HostTime) {
        match at {
            Some(at) => self.arm(at.saturating_duration_since(now)),
            None => self.cancel(),
        }
    }

    /// Cancels a pending firing, if any.
    pub fn cancel(&self) {
        if self.inner.armed.replace(false) {
            clear_timeout(self.inner.handle.get());
        }
    }

    /// Returns `true` while a firing is pending.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.inner.armed.get()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.cancel();
        // Drop the JS closure so it doesn't leak.
        self.inner.closure.borrow_mut().take();
    }
}

impl core::fmt::Debug for Timer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Timer")
            .field("armed", &self.inner.armed.get())
            .finish_non_exhaustive()
    }
}

/// A repeating timer. Stops itself when the callback returns `false`.
pub struct Interval {
    closure: Rc<RefCell<Option<TimerClosure>>>,
    handle: Rc<Cell<Option<i32>>>,
}

impl Interval {
    /// Starts calling `callback` every `period`.
    pub fn start(period: Duration, mut callback: impl FnMut() -> bool + 'static) -> Self {
        let handle: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
        let slot: Rc<RefCell<Option<TimerClosure>>> = Rc::new(RefCell::new(None));

        let cb_handle = Rc::clone(&handle);
        let closure = Closure::wrap(Box::new(move || {
            if !callback()
                && let Some(id) = cb_handle.take()
            {
                clear_interval(id);
            }
        }) as Box<dyn FnMut()>);
        let id = set_interval(closure.as_ref().unchecked_ref(), delay_ms(period));
        handle.set(Some(id));
        *slot.borrow_mut() = Some(closure);

        Self {
            closure: slot,
            handle,
        }
    }

    /// Returns `true` until the callback has asked to stop.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.get().is_some()
    }

    /// Detaches the interval from this handle; it keeps running until its
    /// callback returns `false`.
    pub fn detach(self) {
        core::mem::forget(self);
    }
}

impl Drop for Interval {
    fn drop(&mut self) {
        if let Some(id) = self.handle.take() {
            clear_interval(id);
        }
        self.closure.borrow_mut().take();
    }
}

impl core::fmt::Debug for Interval {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Interval")
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}
