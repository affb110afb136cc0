// Copyright 2026 the Reelfeed Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Loading profiles and capability detection.
//!
//! Every tuning knob the controller and loader read lives in a
//! [`LoadingProfile`], resolved once at startup. Platform hints (connection
//! type, data saver, device memory) are collected into [`NetworkHints`] by
//! the backend and turned into a profile by a [`CapabilityStrategy`]; nothing
//! downstream of that branches on raw hints.

use alloc::string::{String, ToString as _};
use alloc::vec::Vec;
use core::fmt;

use crate::error::ConfigError;
use crate::time::Duration;

/// One component of an observer root margin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MarginValue {
    /// CSS pixels.
    Px(f32),
    /// Percentage of the root's size.
    Percent(f32),
}

impl MarginValue {
    fn parse(token: &str) -> Option<Self> {
        if let Some(n) = token.strip_suffix("px") {
            n.parse().ok().map(Self::Px)
        } else if let Some(n) = token.strip_suffix('%') {
            n.parse().ok().map(Self::Percent)
        } else if token == "0" {
            Some(Self::Px(0.0))
        } else {
            None
        }
    }
}

impl fmt::Display for MarginValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Px(v) => write!(f, "{v}px"),
            Self::Percent(v) => write!(f, "{v}%"),
        }
    }
}

/// Grows or shrinks the observer root box before intersection is computed.
///
/// A negative bottom margin biases visibility toward items at or above the
/// viewport center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RootMargin {
    /// Top edge.
    pub top: MarginValue,
    /// Right edge.
    pub right: MarginValue,
    /// Bottom edge.
    pub bottom: MarginValue,
    /// Left edge.
    pub left: MarginValue,
}

impl RootMargin {
    /// No margin.
    pub const ZERO: Self = Self::vertical_px(0.0);

    /// Equal pixel margin above and below, none at the sides.
    #[must_use]
    pub const fn vertical_px(px: f32) -> Self {
        Self {
            top: MarginValue::Px(px),
            right: MarginValue::Px(0.0),
            bottom: MarginValue::Px(px),
            left: MarginValue::Px(0.0),
        }
    }

    /// Only the bottom edge moves, by a percentage.
    #[must_use]
    pub const fn bottom_percent(pct: f32) -> Self {
        Self {
            bottom: MarginValue::Percent(pct),
            ..Self::ZERO
        }
    }

    /// Parses CSS margin shorthand with one to four components.
    pub fn parse(css: &str) -> Result<Self, ConfigError> {
        let malformed = || ConfigError::MalformedMargin(css.to_string());
        let values = css
            .split_whitespace()
            .map(MarginValue::parse)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(malformed)?;
        let (top, right, bottom, left) = match values.as_slice() {
            [all] => (*all, *all, *all, *all),
            [v, h] => (*v, *h, *v, *h),
            [t, h, b] => (*t, *h, *b, *h),
            [t, r, b, l] => (*t, *r, *b, *l),
            _ => return Err(malformed()),
        };
        Ok(Self {
            top,
            right,
            bottom,
            left,
        })
    }

    /// Renders the four-component CSS form, e.g. `"0px 0px -10% 0px"`.
    #[must_use]
    pub fn to_css(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}

/// Visibility observer settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObserverConfig {
    /// Minimum intersection ratio that counts as "above threshold".
    pub threshold: f32,
    /// Root margin applied by the observer.
    pub root_margin: RootMargin,
}

impl ObserverConfig {
    /// Creates a validated observer configuration.
    pub fn new(threshold: f32, root_margin: RootMargin) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::InvalidThreshold(threshold));
        }
        Ok(Self {
            threshold,
            root_margin,
        })
    }

    /// Whether an observer entry counts as above this threshold.
    #[must_use]
    pub fn admits(&self, intersecting: bool, ratio: f32) -> bool {
        intersecting && ratio >= self.threshold
    }
}

/// Automatic retry after a failed transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay between the failure and the retry.
    pub delay: Duration,
    /// Retries allowed per item.
    pub max_attempts: u8,
}

/// Progressive loading parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoaderConfig {
    /// Observer that moves the load window.
    pub observer: ObserverConfig,
    /// Items resolved ahead of the visible one, in scroll direction.
    pub preload_ahead: usize,
    /// Items resolved behind the visible one.
    pub preload_behind: usize,
    /// When set, resolution is serialized one item at a time with this
    /// pause after each completion.
    pub inter_item_delay: Option<Duration>,
    /// Resolved items further than this from the visible one are cleared.
    pub unload_distance: Option<usize>,
    /// Retry after a failed transfer.
    pub retry: Option<RetryPolicy>,
}

/// The resolved tuning for one page under one device/network condition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoadingProfile {
    /// Observer that drives play/pause.
    pub playback: ObserverConfig,
    /// Progressive loading; `None` resolves every source at startup.
    pub loader: Option<LoaderConfig>,
    /// Delay between page load and the start of observation.
    pub settle_delay: Duration,
    /// Retry a rejected autoplay once on the next user gesture.
    pub gesture_unlock: bool,
}

const SHORTS_PLAYBACK: ObserverConfig = ObserverConfig {
    threshold: 0.5,
    root_margin: RootMargin::bottom_percent(-10.0),
};

impl LoadingProfile {
    /// Progressive loading on a healthy connection: three ahead, two behind.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            playback: SHORTS_PLAYBACK,
            loader: Some(LoaderConfig {
                observer: ObserverConfig {
                    threshold: 0.1,
                    root_margin: RootMargin::vertical_px(150.0),
                },
                preload_ahead: 3,
                preload_behind: 2,
                inter_item_delay: None,
                unload_distance: None,
                retry: Some(RetryPolicy {
                    delay: Duration::from_millis(1_000),
                    max_attempts: 1,
                }),
            }),
            settle_delay: Duration::from_millis(200),
            gesture_unlock: true,
        }
    }

    /// Serialized, narrow-window loading for slow or metered links.
    #[must_use]
    pub const fn constrained() -> Self {
        Self {
            playback: SHORTS_PLAYBACK,
            loader: Some(LoaderConfig {
                observer: ObserverConfig {
                    threshold: 0.1,
                    root_margin: RootMargin::vertical_px(100.0),
                },
                preload_ahead: 1,
                preload_behind: 1,
                inter_item_delay: Some(Duration::from_millis(500)),
                unload_distance: Some(5),
                retry: Some(RetryPolicy {
                    delay: Duration::from_millis(4_000),
                    max_attempts: 1,
                }),
            }),
            settle_delay: Duration::from_millis(200),
            gesture_unlock: true,
        }
    }

    /// Every source attached up front; only playback is visibility-driven.
    #[must_use]
    pub const fn eager() -> Self {
        Self {
            playback: SHORTS_PLAYBACK,
            loader: None,
            settle_delay: Duration::from_millis(200),
            gesture_unlock: false,
        }
    }

    /// The minimal single-page variant: 60 % visibility, no margin, no
    /// settle delay beyond the scroll reset.
    #[must_use]
    pub const fn simple() -> Self {
        Self {
            playback: ObserverConfig {
                threshold: 0.6,
                root_margin: RootMargin::ZERO,
            },
            loader: None,
            settle_delay: Duration::from_millis(200),
            gesture_unlock: false,
        }
    }

    /// Returns `true` when a loader window drives source resolution.
    #[must_use]
    pub const fn is_progressive(&self) -> bool {
        self.loader.is_some()
    }

    /// Looks up a preset by name: `standard`, `constrained`, `eager`, or
    /// `simple`.
    #[must_use]
    pub fn preset(name: &str) -> Option<Self> {
        match name.trim() {
            "standard" => Some(Self::standard()),
            "constrained" => Some(Self::constrained()),
            "eager" => Some(Self::eager()),
            "simple" => Some(Self::simple()),
            _ => None,
        }
    }
}

impl Default for LoadingProfile {
    fn default() -> Self {
        Self::standard()
    }
}

/// Network Information API `effectiveType`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectiveType {
    /// `slow-2g`
    Slow2g,
    /// `2g`
    TwoG,
    /// `3g`
    ThreeG,
    /// `4g`
    FourG,
}

impl EffectiveType {
    /// Parses the browser's string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "slow-2g" => Some(Self::Slow2g),
            "2g" => Some(Self::TwoG),
            "3g" => Some(Self::ThreeG),
            "4g" => Some(Self::FourG),
            _ => None,
        }
    }
}

/// Raw capability hints gathered from the platform. Every field is optional
/// because browsers expose different subsets.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NetworkHints {
    /// Estimated connection class.
    pub effective_type: Option<EffectiveType>,
    /// The user asked for reduced data usage.
    pub save_data: bool,
    /// Estimated downlink bandwidth in Mbit/s.
    pub downlink_mbps: Option<f32>,
    /// Approximate device memory in GiB.
    pub device_memory_gb: Option<f32>,
}

/// Chooses a [`LoadingProfile`] from platform hints.
pub trait CapabilityStrategy {
    /// Resolves the profile for the given hints.
    fn select(&self, hints: &NetworkHints) -> LoadingProfile;
}

/// Uses [`LoadingProfile::constrained`] on slow, metered, or low-memory
/// devices and [`LoadingProfile::standard`] otherwise.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultStrategy;

impl DefaultStrategy {
    /// Downlink below this counts as constrained.
    pub const MIN_DOWNLINK_MBPS: f32 = 1.5;
    /// Device memory below this counts as constrained.
    pub const MIN_DEVICE_MEMORY_GB: f32 = 2.0;

    /// Returns `true` when the hints describe a constrained device or link.
    #[must_use]
    pub fn is_constrained(hints: &NetworkHints) -> bool {
        let slow_type = matches!(
            hints.effective_type,
            Some(EffectiveType::Slow2g | EffectiveType::TwoG | EffectiveType::ThreeG)
        );
        let slow_link = hints
            .downlink_mbps
            .is_some_and(|mbps| mbps < Self::MIN_DOWNLINK_MBPS);
        let low_memory = hints
            .device_memory_gb
            .is_some_and(|gb| gb < Self::MIN_DEVICE_MEMORY_GB);
        slow_type || hints.save_data || slow_link || low_memory
    }
}

impl CapabilityStrategy for DefaultStrategy {
    fn select(&self, hints: &NetworkHints) -> LoadingProfile {
        if Self::is_constrained(hints) {
            LoadingProfile::constrained()
        } else {
            LoadingProfile::standard()
        }
    }
}

/// Always returns the same profile, for pages that don't sniff.
#[derive(Clone, Copy, Debug)]
pub struct FixedProfile(pub LoadingProfile);

impl CapabilityStrategy for FixedProfile {
    fn select(&self, _hints: &NetworkHints) -> LoadingProfile {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_margin_renders_css() {
        assert_eq!(RootMargin::bottom_percent(-10.0).to_css(), "0px 0px -10% 0px");
        assert_eq!(RootMargin::vertical_px(150.0).to_css(), "150px 0px 150px 0px");
    }

    #[test]
    fn root_margin_parses_shorthand() {
        assert_eq!(
            RootMargin::parse("150px 0px"),
            Ok(RootMargin::vertical_px(150.0))
        );
        assert_eq!(
            RootMargin::parse("0px 0px -10% 0px"),
            Ok(RootMargin::bottom_percent(-10.0))
        );
        assert_eq!(RootMargin::parse("0"), Ok(RootMargin::ZERO));
        assert!(matches!(
            RootMargin::parse("10em"),
            Err(ConfigError::MalformedMargin(_))
        ));
        assert!(RootMargin::parse("").is_err());
        assert!(RootMargin::parse("1px 2px 3px 4px 5px").is_err());
    }

    #[test]
    fn presets_by_name() {
        assert_eq!(
            LoadingProfile::preset("constrained"),
            Some(LoadingProfile::constrained())
        );
        assert_eq!(LoadingProfile::preset(" simple "), Some(LoadingProfile::simple()));
        assert_eq!(LoadingProfile::preset("turbo"), None);
    }

    #[test]
    fn observer_threshold_validated() {
        assert!(ObserverConfig::new(0.5, RootMargin::ZERO).is_ok());
        assert_eq!(
            ObserverConfig::new(1.5, RootMargin::ZERO),
            Err(ConfigError::InvalidThreshold(1.5))
        );
    }

    #[test]
    fn admits_requires_intersection_and_ratio() {
        let cfg = LoadingProfile::standard().playback;
        assert!(cfg.admits(true, 0.5));
        assert!(!cfg.admits(true, 0.49));
        assert!(!cfg.admits(false, 0.9));
    }

    #[test]
    fn default_strategy_selects_by_hints() {
        let s = DefaultStrategy;
        assert_eq!(s.select(&NetworkHints::default()), LoadingProfile::standard());

        let slow = NetworkHints {
            effective_type: EffectiveType::parse("3g"),
            ..NetworkHints::default()
        };
        assert_eq!(s.select(&slow), LoadingProfile::constrained());

        let saver = NetworkHints {
            effective_type: Some(EffectiveType::FourG),
            save_data: true,
            ..NetworkHints::default()
        };
        assert_eq!(s.select(&saver), LoadingProfile::constrained());

        let thin = NetworkHints {
            downlink_mbps: Some(0.8),
            ..NetworkHints::default()
        };
        assert!(DefaultStrategy::is_constrained(&thin));

        let small = NetworkHints {
            device_memory_gb: Some(1.0),
            ..NetworkHints::default()
        };
        assert!(DefaultStrategy::is_constrained(&small));
    }

    #[test]
    fn constrained_serializes_and_retries_later() {
        let standard = LoadingProfile::standard().loader.unwrap();
        let constrained = LoadingProfile::constrained().loader.unwrap();
        assert!(standard.inter_item_delay.is_none());
        assert!(constrained.inter_item_delay.is_some());
        assert!(constrained.retry.unwrap().delay > standard.retry.unwrap().delay);
        assert!(!LoadingProfile::eager().is_progressive());
    }
}
