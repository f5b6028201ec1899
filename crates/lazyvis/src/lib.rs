#![forbid(unsafe_code)]

//! lazyvis public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users. It
//! re-exports common types from the internal crates and offers a
//! lightweight prelude for day-to-day usage.

// --- Core re-exports -------------------------------------------------------

pub use lazyvis_core::capability::{
    CapabilityError, ElementId, HostCapabilities, IntersectionEvent, IntersectionHost,
    NavigationTiming, ObservationToken, TimingEntry, TimingHost, TimingKind, TimingToken,
};
pub use lazyvis_core::config::ObservationConfig;
pub use lazyvis_core::margin::{MarginParseError, RootMargin};
pub use lazyvis_core::tracker::{IntersectionTracker, VisibilityState, VisibilityTransition};

// --- Widget re-exports -----------------------------------------------------

pub use lazyvis_widgets::image::{ImagePhase, ImageRequest, LazyImage};
pub use lazyvis_widgets::section::{LazySection, SectionContent};

// --- Runtime re-exports ----------------------------------------------------

#[cfg(feature = "runtime")]
pub use lazyvis_runtime::{
    Delay, Interval, LoadingDriver, LoadingPlan, LoadingStep, OrchestratorConfig, PageEvent,
    PageOrchestrator, PagePhase, PlanError, ProgressSimulator, ProgressState, SectionId,
    SimulatorConfig, Subscription, SubscriptionManager, TickOutcome,
};

// --- Metrics re-exports ----------------------------------------------------

#[cfg(feature = "metrics")]
pub use lazyvis_metrics::{
    Grade, MetricKind, MetricsSnapshot, Threshold, VitalsCollector, VitalsThresholds,
};

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        ElementId, IntersectionEvent, IntersectionHost, IntersectionTracker, LazyImage,
        LazySection, ObservationConfig, RootMargin, SectionContent, VisibilityState,
        VisibilityTransition,
    };

    #[cfg(feature = "runtime")]
    pub use crate::{
        LoadingPlan, PageEvent, PageOrchestrator, PagePhase, ProgressSimulator, ProgressState,
    };

    #[cfg(feature = "metrics")]
    pub use crate::{MetricsSnapshot, VitalsCollector, VitalsThresholds};

    pub use crate::{core, widgets};
    #[cfg(feature = "metrics")]
    pub use crate::metrics;
    #[cfg(feature = "runtime")]
    pub use crate::runtime;
}

pub use lazyvis_core as core;
#[cfg(feature = "metrics")]
pub use lazyvis_metrics as metrics;
#[cfg(feature = "runtime")]
pub use lazyvis_runtime as runtime;
pub use lazyvis_widgets as widgets;
