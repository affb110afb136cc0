// Copyright 2026 the Reelfeed Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Capability hints from `navigator.connection` and `navigator.deviceMemory`.
//!
//! Both APIs are non-standard and missing in several browsers, so they are
//! read reflectively and every absent value stays `None`.

use js_sys::Reflect;
use wasm_bindgen::JsValue;

use reelfeed_core::profile::{EffectiveType, NetworkHints};

fn field(target: &JsValue, name: &str) -> Option<JsValue> {
    Reflect::get(target, &JsValue::from_str(name))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "bandwidth and memory hints are small"
)]
fn field_f32(target: &JsValue, name: &str) -> Option<f32> {
    field(target, name)?.as_f64().map(|v| v as f32)
}

/// Reads whatever capability hints the browser exposes.
#[must_use]
pub fn network_hints() -> NetworkHints {
    let Some(window) = web_sys::window() else {
        return NetworkHints::default();
    };
    let navigator: JsValue = window.navigator().into();
    let mut hints = NetworkHints {
        device_memory_gb: field_f32(&navigator, "deviceMemory"),
        ..NetworkHints::default()
    };
    if let Some(connection) = field(&navigator, "connection") {
        hints.effective_type = field(&connection, "effectiveType")
            .and_then(|v| v.as_string())
            .and_then(|s| EffectiveType::parse(&s));
        hints.save_data = field(&connection, "saveData")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        hints.downlink_mbps = field_f32(&connection, "downlink");
    }
    hints
}
