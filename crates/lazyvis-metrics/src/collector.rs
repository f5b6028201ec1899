#![forbid(unsafe_code)]

//! Vitals collection.
//!
//! The collector passively aggregates the timing signals a host exposes
//! into a [`MetricsSnapshot`]. Every capability is optional and degrades
//! silently: an unsupported signal is logged and skipped, never surfaced as
//! an error. In the worst case (no timing capability at all) no scorecard
//! is produced and nothing else is affected.
//!
//! There is no process-wide collector: the handle is returned to whoever
//! created it, and ad hoc inspection passes the handle explicitly.

use std::time::Duration;

use lazyvis_core::{NavigationTiming, TimingEntry, TimingHost, TimingKind, TimingToken};
use tracing::{debug, info, warn};

use crate::snapshot::MetricsSnapshot;
use crate::vitals::{MetricKind, VitalsThresholds};

/// Delay after the page load event before navigation timing is read, giving
/// late paint/layout entries time to land first.
pub const NAVIGATION_SETTLE: Duration = Duration::from_millis(1000);

/// The observer-style signals the collector subscribes to. Navigation is
/// pull-based (a single record read once) and handled separately.
const OBSERVED_KINDS: [TimingKind; 4] = [
    TimingKind::Paint,
    TimingKind::LargestPaint,
    TimingKind::FirstInput,
    TimingKind::LayoutShift,
];

/// Best-effort, read-only aggregator of host timing signals.
#[derive(Debug)]
pub struct VitalsCollector {
    thresholds: VitalsThresholds,
    snapshot: MetricsSnapshot,
    subscriptions: Vec<TimingToken>,
    navigation_recorded: bool,
    active: bool,
}

impl VitalsCollector {
    /// Collector with the default thresholds. Call
    /// [`attach`](Self::attach) to start receiving entries.
    #[must_use]
    pub fn new() -> Self {
        Self::with_thresholds(VitalsThresholds::default())
    }

    /// Collector grading against caller-supplied thresholds.
    #[must_use]
    pub fn with_thresholds(thresholds: VitalsThresholds) -> Self {
        Self {
            thresholds,
            snapshot: MetricsSnapshot::default(),
            subscriptions: Vec::new(),
            navigation_recorded: false,
            active: true,
        }
    }

    /// Subscribe to every observer-style signal the host supports.
    ///
    /// Each signal is subscribed independently; one unsupported kind never
    /// blocks the others.
    pub fn attach(&mut self, host: &mut dyn TimingHost) {
        if !self.active {
            return;
        }
        for kind in OBSERVED_KINDS {
            match host.subscribe(kind) {
                Ok(token) => {
                    debug!(signal = kind.name(), "timing subscription started");
                    self.subscriptions.push(token);
                }
                Err(err) => {
                    warn!(signal = kind.name(), %err, "timing signal unavailable, skipping");
                }
            }
        }
    }

    /// Number of live timing subscriptions.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Apply one timing entry from the host. Ignored after
    /// [`cleanup`](Self::cleanup).
    pub fn ingest(&mut self, entry: TimingEntry) {
        if !self.active {
            return;
        }
        match entry {
            TimingEntry::Paint {
                first_contentful: true,
                start_ms,
            } => {
                if self.snapshot.fcp.is_none() {
                    self.snapshot.fcp = Some(start_ms);
                }
            }
            TimingEntry::Paint {
                first_contentful: false,
                ..
            } => {}
            // Later candidates supersede earlier ones.
            TimingEntry::LargestPaint { start_ms } => {
                self.snapshot.lcp = Some(start_ms);
            }
            TimingEntry::FirstInput {
                start_ms,
                processing_start_ms,
            } => {
                if self.snapshot.fid.is_none() {
                    self.snapshot.fid = Some(processing_start_ms - start_ms);
                }
            }
            TimingEntry::LayoutShift {
                value,
                had_recent_input: false,
            } => {
                // Running sum over every qualifying shift.
                self.snapshot.cls = Some(self.snapshot.cls.unwrap_or(0.0) + value);
            }
            TimingEntry::LayoutShift {
                had_recent_input: true,
                ..
            } => {}
        }
    }

    /// Derive the navigation metrics from the single navigation record.
    ///
    /// Only the first call takes effect; hosts should make it after the
    /// load event plus [`NAVIGATION_SETTLE`].
    pub fn record_navigation(&mut self, nav: &NavigationTiming) {
        if !self.active || self.navigation_recorded {
            return;
        }
        self.navigation_recorded = true;
        self.snapshot.ttfb = Some(nav.response_start_ms - nav.request_start_ms);
        self.snapshot.dom_content_loaded_ms =
            Some(nav.dom_content_loaded_end_ms - nav.dom_content_loaded_start_ms);
        self.snapshot.load_complete_ms = Some(nav.load_event_end_ms - nav.load_event_start_ms);
    }

    /// The metrics collected so far.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.snapshot
    }

    /// Overall 0–100 score over the present core vitals.
    #[must_use]
    pub fn overall_score(&self) -> u32 {
        self.snapshot.overall_score(&self.thresholds)
    }

    /// Log a scorecard of every present metric with its grade.
    pub fn report(&self) {
        let graded = [
            (MetricKind::Fcp, self.snapshot.fcp),
            (MetricKind::Lcp, self.snapshot.lcp),
            (MetricKind::Fid, self.snapshot.fid),
            (MetricKind::Cls, self.snapshot.cls),
            (MetricKind::Ttfb, self.snapshot.ttfb),
        ];
        for (kind, value) in graded {
            if let Some(value) = value {
                let grade = self.thresholds.for_kind(kind).grade(value);
                info!(metric = kind.name(), value, grade = grade.name(), "vital");
            }
        }
        if let Some(dcl) = self.snapshot.dom_content_loaded_ms {
            info!(value = dcl, "dom content loaded (ms)");
        }
        if let Some(load) = self.snapshot.load_complete_ms {
            info!(value = load, "load complete (ms)");
        }
        info!(score = self.overall_score(), "overall performance score");
    }

    /// Disconnect every subscription. Idempotent; entries arriving
    /// afterwards are ignored.
    pub fn cleanup(&mut self, host: &mut dyn TimingHost) {
        for token in self.subscriptions.drain(..) {
            host.unsubscribe(token);
        }
        if self.active {
            self.active = false;
            debug!("vitals collector cleaned up");
        }
    }
}

impl Default for VitalsCollector {
    fn default() -> Self {
        Self::new()
    }
}
