#![forbid(unsafe_code)]

//! lazyvis core
//!
//! Foundation types for visibility-driven lazy activation:
//!
//! - [`capability`] — the host capability model: viewport-intersection and
//!   performance-timing capabilities, probed once and optional everywhere.
//! - [`margin`] — CSS-style root-margin parsing.
//! - [`config`] — per-observation configuration.
//! - [`tracker`] — the intersection tracker that owns [`VisibilityState`].
//!
//! # Role in lazyvis
//!
//! Everything above this crate (wrappers, the loading runtime, the metrics
//! collector) consumes these contracts; nothing here performs I/O or talks
//! to a concrete host. Hosts implement [`IntersectionHost`] / [`TimingHost`]
//! and feed events back in through whatever event loop they run.

pub mod capability;
pub mod config;
pub mod margin;
pub mod tracker;

pub use capability::{
    CapabilityError, ElementId, HostCapabilities, IntersectionEvent, IntersectionHost,
    NavigationTiming, ObservationToken, TimingEntry, TimingHost, TimingKind, TimingToken,
};
pub use config::ObservationConfig;
pub use margin::{MarginParseError, RootMargin};
pub use tracker::{IntersectionTracker, VisibilityState, VisibilityTransition};
