// Copyright 2026 the Reelfeed Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Feed performance metrics and animated metric counters for demo pages.

#![no_std]

extern crate alloc;

use alloc::string::String;
use reelfeed_core::time::Duration;
use reelfeed_core::trace::{LoadCompleteEvent, TraceSink, ViewEvent};

/// Snapshot returned by [`PerformanceTracker::report`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PerformanceReport {
    /// Videos that finished loading.
    pub videos_loaded: u64,
    /// Videos that started playing (a replay counts again).
    pub videos_watched: u64,
    /// Sum of all load times, in milliseconds.
    pub total_load_ms: f64,
    /// Mean load time in milliseconds, `0.0` before the first load.
    pub average_load_ms: f64,
}

/// Counts loads and views, with a fixed-size history of recent load times.
///
/// Feed it either directly ([`track_load`](Self::track_load),
/// [`track_view`](Self::track_view)) or as a [`TraceSink`].
#[derive(Debug)]
pub struct PerformanceTracker<const N: usize> {
    recent_ms: [f64; N],
    cursor: usize,
    report: PerformanceReport,
}

impl<const N: usize> Default for PerformanceTracker<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> PerformanceTracker<N> {
    /// Creates an empty tracker.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            recent_ms: [0.0; N],
            cursor: 0,
            report: PerformanceReport {
                videos_loaded: 0,
                videos_watched: 0,
                total_load_ms: 0.0,
                average_load_ms: 0.0,
            },
        }
    }

    /// Records one finished load and returns the updated report.
    pub fn track_load(&mut self, elapsed: Duration) -> PerformanceReport {
        let ms = elapsed.as_millis_f64();
        if N > 0 {
            self.recent_ms[self.cursor % N] = ms;
            self.cursor = (self.cursor + 1) % N;
        }
        let r = &mut self.report;
        r.videos_loaded = r.videos_loaded.saturating_add(1);
        r.total_load_ms += ms;
        r.average_load_ms = r.total_load_ms / r.videos_loaded as f64;
        *r
    }

    /// Records one view and returns the running total.
    pub fn track_view(&mut self) -> u64 {
        self.report.videos_watched = self.report.videos_watched.saturating_add(1);
        self.report.videos_watched
    }

    /// Returns the current totals.
    #[must_use]
    pub const fn report(&self) -> PerformanceReport {
        self.report
    }

    /// Returns recent load times oldest→newest, in milliseconds.
    ///
    /// Slots not yet written read as `0.0`.
    #[must_use]
    pub fn recent_loads(&self) -> [f64; N] {
        let mut out = [0.0; N];
        let mut i = 0;
        while i < N {
            out[i] = self.recent_ms[(self.cursor + i) % N];
            i += 1;
        }
        out
    }

    /// Returns an ASCII sparkline over [`recent_loads`](Self::recent_loads).
    #[must_use]
    pub fn sparkline_ascii(&self, min_ms: f64, max_ms: f64) -> String {
        const LEVELS: &[u8] = b" .:-=+*#%@";
        let mut out = String::with_capacity(N);
        let span = (max_ms - min_ms).max(f64::EPSILON);
        for v in self.recent_loads() {
            let t = (v.clamp(min_ms, max_ms) - min_ms) / span;
            #[expect(
                clippy::cast_possible_truncation,
                reason = "index is clamped to ASCII level count"
            )]
            let level = (t * (LEVELS.len() as f64 - 1.0) + 0.5) as usize;
            out.push(LEVELS[level.min(LEVELS.len() - 1)] as char);
        }
        out
    }
}

impl<const N: usize> TraceSink for PerformanceTracker<N> {
    fn on_load_complete(&mut self, e: &LoadCompleteEvent) {
        self.track_load(e.elapsed);
    }

    fn on_view(&mut self, e: &ViewEvent<'_>) {
        _ = e;
        self.track_view();
    }
}

/// Interval between counter updates.
pub const COUNTER_STEP: Duration = Duration::from_millis(50);

/// One update from [`MetricCounter::tick`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CounterStep {
    /// Value to display.
    pub value: i64,
    /// `true` on the final update; stop the interval afterwards.
    pub done: bool,
}

/// Animates a displayed integer from `start` to `end`.
///
/// Each [`tick`](Self::tick) advances by `(end - start) / (duration / 50ms)`
/// and displays the floor of the running value. The first tick that reaches
/// or passes `end` displays `end` exactly. Decreasing ranges work the same
/// way.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetricCounter {
    current: f64,
    end: i64,
    increment: f64,
    done: bool,
}

impl MetricCounter {
    /// Creates a counter. Durations shorter than one step finish on the
    /// first tick.
    #[must_use]
    pub fn new(start: i64, end: i64, duration: Duration) -> Self {
        let steps = duration.as_millis_f64() / COUNTER_STEP.as_millis_f64();
        let span = (end - start) as f64;
        let increment = if steps >= 1.0 { span / steps } else { span };
        Self {
            current: start as f64,
            end,
            increment,
            done: false,
        }
    }

    /// Whether the final value has been produced.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.done
    }

    /// Advances one step. Returns `None` once finished.
    pub fn tick(&mut self) -> Option<CounterStep> {
        if self.done {
            return None;
        }
        self.current += self.increment;
        let end = self.end as f64;
        let reached = (self.increment >= 0.0 && self.current >= end)
            || (self.increment < 0.0 && self.current <= end);
        if reached {
            self.done = true;
            return Some(CounterStep {
                value: self.end,
                done: true,
            });
        }
        Some(CounterStep {
            value: floor(self.current),
            done: false,
        })
    }
}

#[expect(clippy::cast_possible_truncation, reason = "display values are small")]
fn floor(v: f64) -> i64 {
    let t = v as i64;
    if (t as f64) > v { t - 1 } else { t }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn average_tracks_loads() {
        let mut t = PerformanceTracker::<4>::new();
        assert_eq!(t.report().average_load_ms, 0.0);
        t.track_load(Duration::from_millis(100));
        let r = t.track_load(Duration::from_millis(300));
        assert_eq!(r.videos_loaded, 2);
        assert!((r.total_load_ms - 400.0).abs() < 1e-9);
        assert!((r.average_load_ms - 200.0).abs() < 1e-9);
    }

    #[test]
    fn views_count_independently_of_loads() {
        let mut t = PerformanceTracker::<2>::new();
        t.track_view();
        assert_eq!(t.track_view(), 2);
        assert_eq!(t.report().videos_loaded, 0);
    }

    #[test]
    fn recent_loads_wrap_oldest_first() {
        let mut t = PerformanceTracker::<3>::new();
        for ms in [10, 20, 30, 40] {
            t.track_load(Duration::from_millis(ms));
        }
        assert_eq!(t.recent_loads(), [20.0, 30.0, 40.0]);
        assert_eq!(t.sparkline_ascii(0.0, 40.0).len(), 3);
    }

    #[test]
    fn tracker_as_sink_counts_events() {
        use reelfeed_core::feed::ItemId;

        let mut t = PerformanceTracker::<4>::new();
        t.on_load_complete(&LoadCompleteEvent {
            item: ItemId(0),
            elapsed: Duration::from_millis(50),
        });
        t.on_view(&ViewEvent {
            item: ItemId(0),
            title: Some("Pad Thai"),
        });
        assert_eq!(t.report().videos_loaded, 1);
        assert_eq!(t.report().videos_watched, 1);
    }

    fn run(mut c: MetricCounter) -> Vec<i64> {
        let mut out = Vec::new();
        while let Some(step) = c.tick() {
            out.push(step.value);
        }
        out
    }

    #[test]
    fn counter_reaches_end_value() {
        // 892 → 910 over 2.5s: 50 steps of 0.36.
        let values = run(MetricCounter::new(892, 910, Duration::from_millis(2500)));
        assert_eq!(values.last(), Some(&910));
        assert_eq!(values[0], 892);
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
        assert!(values.len() <= 51);
    }

    #[test]
    fn counter_counts_down() {
        let values = run(MetricCounter::new(10, 0, Duration::from_millis(500)));
        assert_eq!(values.first(), Some(&9));
        assert_eq!(values.last(), Some(&0));
        assert!(values.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn short_or_empty_counters_finish_at_once() {
        assert_eq!(run(MetricCounter::new(3, 8, Duration::ZERO)), [8]);
        assert_eq!(run(MetricCounter::new(5, 5, Duration::from_millis(1000))), [5]);
    }

    #[test]
    fn floor_rounds_toward_negative_infinity() {
        assert_eq!(floor(2.7), 2);
        assert_eq!(floor(-2.2), -3);
        assert_eq!(floor(-3.0), -3);
    }
}
