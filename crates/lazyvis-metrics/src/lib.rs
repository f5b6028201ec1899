#![forbid(unsafe_code)]

//! lazyvis metrics
//!
//! Best-effort Core Web Vitals collection and scoring.
//!
//! A [`VitalsCollector`] subscribes to whatever timing signals the host
//! supports, aggregates them into a [`MetricsSnapshot`], and grades the
//! result against [`VitalsThresholds`]. Collection is strictly passive:
//! it never influences page behavior, and a host with no timing support
//! just yields an empty snapshot.
//!
//! With the `snapshot-json` feature enabled, snapshots serialize through
//! serde for export.

pub mod collector;
pub mod snapshot;
pub mod vitals;

pub use collector::{NAVIGATION_SETTLE, VitalsCollector};
pub use snapshot::MetricsSnapshot;
pub use vitals::{Grade, MetricKind, Threshold, VitalsThresholds};
