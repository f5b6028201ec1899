#![forbid(unsafe_code)]

//! lazyvis runtime
//!
//! The active half of lazyvis: timers, the staged loading simulation, and
//! the orchestrator that sequences the page lifecycle.
//!
//! # Key components
//!
//! - [`Subscription`] / [`SubscriptionManager`] — background timer sources
//!   delivering messages drained on the owner's thread.
//! - [`Interval`] / [`Delay`] — the built-in repeating and one-shot timers.
//! - [`ProgressSimulator`] / [`LoadingDriver`] — the splash-screen progress
//!   state machine and its timer-driven runner.
//! - [`PageOrchestrator`] — loading → reveal → lazy-section activation.
//!
//! # How it fits in the system
//!
//! The runtime consumes host capabilities from `lazyvis-core` and exposes
//! progress and activation state to the surrounding UI. Rendering decisions
//! themselves live in `lazyvis-widgets`.

pub mod loader;
pub mod orchestrator;
pub mod subscription;

pub use loader::{
    LoadingDriver, LoadingPlan, LoadingStep, PlanError, ProgressSimulator, ProgressState,
    SimulatorConfig, TickOutcome,
};
pub use orchestrator::{
    OrchestratorConfig, PageEvent, PageOrchestrator, PagePhase, SECTION_ROOT_MARGIN_PX, SectionId,
};
pub use subscription::{Delay, Interval, MockSubscription, StopSignal, SubId, Subscription, SubscriptionManager};
