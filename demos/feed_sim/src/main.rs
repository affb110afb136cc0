// Copyright 2026 the Reelfeed Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated scroll session that exercises the controller, the loader, and
//! the diagnostics pipeline.
//!
//! A user flicks through a shuffled feed, one item every 1.5s, over a
//! simulated network with random latency. The first play is rejected by the
//! autoplay policy and unlocked by a tap; one transfer fails and is retried.
//! Events go to a [`PrettyPrintSink`](reelfeed_debug::pretty::PrettyPrintSink),
//! a [`RecorderSink`](reelfeed_debug::recorder::RecorderSink), and a
//! [`PerformanceTracker`](reelfeed_metrics::PerformanceTracker).
//!
//! Pass `--constrained` to simulate a slow 3G connection.

use rand::rngs::SmallRng;
use rand::{Rng as _, SeedableRng as _};

use reelfeed_core::backend::MediaHost;
use reelfeed_core::controller::PlaybackController;
use reelfeed_core::error::FeedError;
use reelfeed_core::feed::{AudioSettings, Feed, Item, ItemId};
use reelfeed_core::profile::{CapabilityStrategy as _, DefaultStrategy, EffectiveType, NetworkHints};
use reelfeed_core::time::{Duration, HostTime};
use reelfeed_core::trace::{
    AudioChangeEvent, LoadCompleteEvent, LoadFailedEvent, LoadStartedEvent, PlayRejectedEvent,
    StateChangeEvent, TraceSink, Tracer, UnloadEvent, ViewEvent,
};
use reelfeed_core::video::SourceRef;
use reelfeed_core::visibility::VisibilityEntry;

use reelfeed_debug::pretty::PrettyPrintSink;
use reelfeed_debug::recorder::{RecordedEvent, RecorderSink};
use reelfeed_metrics::PerformanceTracker;

const DISHES: &[&str] = &[
    "Pad see ew",
    "Pho tai",
    "Lok lak",
    "Boba float",
    "Green curry",
    "Banh mi",
    "Mango sticky rice",
    "Num banh chok",
];
/// How long the simulated user looks at each item.
const DWELL: Duration = Duration::from_millis(1500);
/// Delay between landing on the first item and the unlocking tap.
const TAP_AFTER: Duration = Duration::from_millis(300);
const SEED: u64 = 0x5EED;

/// Forwards every event to all three sinks.
struct Sinks {
    pretty: PrettyPrintSink,
    recorder: RecorderSink,
    perf: PerformanceTracker<16>,
}

impl TraceSink for Sinks {
    fn on_state_change(&mut self, e: &StateChangeEvent) {
        self.pretty.on_state_change(e);
        self.recorder.on_state_change(e);
    }

    fn on_play_rejected(&mut self, e: &PlayRejectedEvent) {
        self.pretty.on_play_rejected(e);
        self.recorder.on_play_rejected(e);
    }

    fn on_load_started(&mut self, e: &LoadStartedEvent) {
        self.pretty.on_load_started(e);
        self.recorder.on_load_started(e);
    }

    fn on_load_complete(&mut self, e: &LoadCompleteEvent) {
        self.pretty.on_load_complete(e);
        self.recorder.on_load_complete(e);
        self.perf.on_load_complete(e);
    }

    fn on_load_failed(&mut self, e: &LoadFailedEvent) {
        self.pretty.on_load_failed(e);
        self.recorder.on_load_failed(e);
    }

    fn on_unload(&mut self, e: &UnloadEvent) {
        self.pretty.on_unload(e);
        self.recorder.on_unload(e);
    }

    fn on_audio_change(&mut self, e: &AudioChangeEvent) {
        self.pretty.on_audio_change(e);
        self.recorder.on_audio_change(e);
    }

    fn on_view(&mut self, e: &ViewEvent<'_>) {
        self.pretty.on_view(e);
        self.recorder.on_view(e);
        self.perf.on_view(e);
    }
}

/// A transfer in flight on the simulated network.
struct Transfer {
    done_at: HostTime,
    item: ItemId,
    ok: bool,
}

/// Media host over a simulated network and autoplay policy.
struct SimHost {
    now: HostTime,
    rng: SmallRng,
    transfers: Vec<Transfer>,
    /// Items whose next transfer fails.
    flaky: Vec<ItemId>,
    /// The policy rejects the very first play.
    autoplay_locked: bool,
    rejected: Vec<ItemId>,
    latency_ms: (u64, u64),
}

impl MediaHost for SimHost {
    fn attach_source(&mut self, id: ItemId, _url: &str) {
        let (lo, hi) = self.latency_ms;
        let latency = Duration::from_millis(self.rng.random_range(lo..hi));
        let ok = !self.flaky.contains(&id);
        self.flaky.retain(|f| *f != id);
        self.transfers.push(Transfer {
            done_at: self.now + latency,
            item: id,
            ok,
        });
    }

    fn detach_source(&mut self, id: ItemId) {
        self.transfers.retain(|t| t.item != id);
    }

    fn play(&mut self, id: ItemId) {
        if self.autoplay_locked {
            self.rejected.push(id);
        }
    }

    fn pause(&mut self, _id: ItemId) {}

    fn apply_audio(&mut self, _id: ItemId, _audio: AudioSettings) {}
}

struct Session {
    controller: PlaybackController,
    host: SimHost,
    sinks: Sinks,
}

impl Session {
    /// Reports queued play rejections back to the controller.
    fn settle(&mut self) -> Result<(), FeedError> {
        for id in std::mem::take(&mut self.host.rejected) {
            self.controller
                .on_play_rejected(id, &mut Tracer::new(&mut self.sinks))?;
        }
        Ok(())
    }

    /// Processes transfer completions and loader wakeups up to `deadline`.
    fn run_until(&mut self, deadline: HostTime) -> Result<(), FeedError> {
        loop {
            let transfer = self
                .host
                .transfers
                .iter()
                .enumerate()
                .min_by_key(|(_, t)| t.done_at)
                .map(|(i, t)| (i, t.done_at));
            let wakeup = self.controller.next_wakeup();
            let next = match (transfer.map(|(_, at)| at), wakeup) {
                (Some(a), Some(b)) => a.min(b),
                (a, b) => match a.or(b) {
                    Some(at) => at,
                    None => break,
                },
            };
            if next > deadline {
                break;
            }
            self.host.now = next;

            if let Some((i, at)) = transfer
                && at == next
            {
                let t = self.host.transfers.swap_remove(i);
                let mut tracer = Tracer::new(&mut self.sinks);
                if t.ok {
                    self.controller
                        .on_loaded(t.item, next, &mut self.host, &mut tracer)?;
                } else {
                    self.controller
                        .on_load_failed(t.item, next, &mut self.host, &mut tracer)?;
                }
            }
            self.controller
                .poll(next, &mut self.host, &mut Tracer::new(&mut self.sinks))?;
            self.settle()?;
        }
        self.host.now = deadline;
        Ok(())
    }

    fn scroll_to(&mut self, position: usize) -> Result<(), FeedError> {
        let Some(id) = self.controller.feed().at(position) else {
            return Ok(());
        };
        let mut entries = vec![VisibilityEntry::visible(id, 1.0)];
        if let Some(prev) = position
            .checked_sub(1)
            .and_then(|p| self.controller.feed().at(p))
        {
            entries.push(VisibilityEntry::hidden(prev));
        }
        let now = self.host.now;
        self.controller.on_load_visibility(
            &[VisibilityEntry::visible(id, 1.0)],
            now,
            &mut self.host,
            &mut Tracer::new(&mut self.sinks),
        )?;
        self.controller.on_playback_visibility(
            &entries,
            &mut self.host,
            &mut Tracer::new(&mut self.sinks),
        )?;
        self.settle()
    }

    fn tap(&mut self) -> Result<(), FeedError> {
        println!("-- tap");
        self.host.autoplay_locked = false;
        let mut tracer = Tracer::new(&mut self.sinks);
        self.controller.on_user_gesture(&mut self.host, &mut tracer)?;
        self.controller.toggle_mute(&mut self.host, &mut tracer);
        self.settle()
    }
}

fn main() -> Result<(), FeedError> {
    let constrained = std::env::args().any(|a| a == "--constrained");
    let hints = if constrained {
        NetworkHints {
            effective_type: Some(EffectiveType::ThreeG),
            downlink_mbps: Some(0.8),
            ..NetworkHints::default()
        }
    } else {
        NetworkHints {
            effective_type: Some(EffectiveType::FourG),
            downlink_mbps: Some(10.0),
            ..NetworkHints::default()
        }
    };
    let profile = DefaultStrategy.select(&hints);
    println!("profile: progressive={} hints={hints:?}", profile.is_progressive());

    let mut rng = SmallRng::seed_from_u64(SEED);
    let mut feed = Feed::new(
        DISHES
            .iter()
            .enumerate()
            .map(|(i, dish)| {
                Item::new(SourceRef::Deferred(format!("videos/{i}.mp4"))).with_title(*dish)
            })
            .collect(),
    );
    feed.shuffle(&mut rng);
    let flaky = feed.at(2).into_iter().collect();

    let mut session = Session {
        controller: PlaybackController::new(feed, profile),
        host: SimHost {
            now: HostTime(0),
            rng,
            transfers: Vec::new(),
            flaky,
            autoplay_locked: true,
            rejected: Vec::new(),
            latency_ms: if constrained { (300, 1200) } else { (40, 400) },
        },
        sinks: Sinks {
            pretty: PrettyPrintSink::new(Box::new(std::io::stdout())),
            recorder: RecorderSink::new(),
            perf: PerformanceTracker::new(),
        },
    };

    session.controller.start(
        HostTime(0),
        &mut session.host,
        &mut Tracer::new(&mut session.sinks),
    )?;

    for position in 0..DISHES.len() {
        println!("-- scroll to {position}");
        session.scroll_to(position)?;
        let arrived = session.host.now;
        if position == 0 {
            session.run_until(arrived + TAP_AFTER)?;
            session.tap()?;
        }
        session.run_until(arrived + DWELL)?;
    }

    let perf = &session.sinks.perf;
    let report = perf.report();
    let events = session.sinks.recorder.events();
    let unloads = events
        .iter()
        .filter(|e| matches!(e, RecordedEvent::Unload(_)))
        .count();
    println!(
        "loaded={} watched={} avg={:.1}ms unloads={unloads} events={}",
        report.videos_loaded,
        report.videos_watched,
        report.average_load_ms,
        events.len(),
    );
    println!("recent loads [{}]", perf.sparkline_ascii(0.0, 1200.0));
    Ok(())
}
