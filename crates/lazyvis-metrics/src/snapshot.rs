#![forbid(unsafe_code)]

//! Metric snapshots and scoring.

use crate::vitals::VitalsThresholds;

/// Aggregated timing metrics, every field optional: the underlying signal
/// may be unsupported by the host or simply not have fired yet.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(
    feature = "snapshot-json",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct MetricsSnapshot {
    /// First Contentful Paint, ms.
    pub fcp: Option<f64>,
    /// Largest Contentful Paint, ms. Latest observed entry wins.
    pub lcp: Option<f64>,
    /// First Input Delay, ms.
    pub fid: Option<f64>,
    /// Cumulative Layout Shift: running sum of non-input shift values.
    pub cls: Option<f64>,
    /// Time To First Byte, ms.
    pub ttfb: Option<f64>,
    /// DOM content loaded handler duration, ms.
    pub dom_content_loaded_ms: Option<f64>,
    /// Load event handler duration, ms.
    pub load_complete_ms: Option<f64>,
}

impl MetricsSnapshot {
    /// Overall 0–100 score: the average of the banded scores of the core
    /// vitals that are actually present (FCP, LCP, FID, CLS). Absent
    /// metrics do not penalize; with nothing present the score is 0.
    #[must_use]
    pub fn overall_score(&self, thresholds: &VitalsThresholds) -> u32 {
        let graded = [
            self.fcp.map(|v| thresholds.fcp.banded_score(v)),
            self.lcp.map(|v| thresholds.lcp.banded_score(v)),
            self.fid.map(|v| thresholds.fid.banded_score(v)),
            self.cls.map(|v| thresholds.cls.banded_score(v)),
        ];
        let present: Vec<u32> = graded.into_iter().flatten().collect();
        if present.is_empty() {
            return 0;
        }
        let sum: u32 = present.iter().sum();
        (f64::from(sum) / present.len() as f64).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_snapshot_scores_zero() {
        let snapshot = MetricsSnapshot::default();
        assert_eq!(snapshot.overall_score(&VitalsThresholds::default()), 0);
    }

    #[test]
    fn single_good_metric_scores_100() {
        // Absent metrics must not penalize the average.
        let snapshot = MetricsSnapshot {
            fcp: Some(1500.0),
            ..MetricsSnapshot::default()
        };
        assert_eq!(snapshot.overall_score(&VitalsThresholds::default()), 100);
    }

    #[test]
    fn mixed_metrics_average_and_round() {
        let snapshot = MetricsSnapshot {
            fcp: Some(1500.0), // good: 100
            lcp: Some(3000.0), // needs improvement: 50
            cls: Some(0.5),    // poor: 0
            ..MetricsSnapshot::default()
        };
        assert_eq!(snapshot.overall_score(&VitalsThresholds::default()), 50);
    }

    #[test]
    fn ttfb_and_navigation_fields_do_not_affect_score() {
        let snapshot = MetricsSnapshot {
            fcp: Some(1500.0),
            ttfb: Some(5000.0),
            dom_content_loaded_ms: Some(400.0),
            load_complete_ms: Some(900.0),
            ..MetricsSnapshot::default()
        };
        assert_eq!(snapshot.overall_score(&VitalsThresholds::default()), 100);
    }

    #[cfg(feature = "snapshot-json")]
    #[test]
    fn snapshot_round_trips_through_json() {
        let snapshot = MetricsSnapshot {
            fcp: Some(1234.5),
            cls: Some(0.08),
            ..MetricsSnapshot::default()
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: MetricsSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
