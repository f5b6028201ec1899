#![forbid(unsafe_code)]

//! Intersection tracking.
//!
//! An [`IntersectionTracker`] wraps one renderable element, watches when it
//! enters the (margin-expanded) viewport, and maintains a [`VisibilityState`]
//! that downstream wrappers consult to decide what to mount.
//!
//! # Invariants
//!
//! 1. `has_ever_been_visible` is monotone: once set it never reverts for the
//!    tracker's lifetime.
//! 2. With trigger-once, observation stops permanently at the first entry;
//!    no further events are processed for that observation.
//! 3. After [`teardown`](IntersectionTracker::teardown), every callback is a
//!    no-op, even if it raced with a re-attach.
//!
//! # Degraded mode
//!
//! A host with no intersection capability yields a tracker that reports
//! visible immediately. Lazy sections then mount eagerly, which is the
//! correct worst case: a non-lazy page, never a broken one.

use tracing::{debug, trace, warn};

use crate::capability::{
    CapabilityError, ElementId, IntersectionEvent, IntersectionHost, ObservationToken,
};
use crate::config::ObservationConfig;

/// Visibility as last reported by the host, plus the sticky
/// has-ever-been-visible latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisibilityState {
    /// Whether the element currently meets the visibility threshold.
    pub is_visible: bool,
    /// Whether it ever has. Monotone.
    pub has_ever_been_visible: bool,
}

impl VisibilityState {
    /// State of a tracker that has never seen its element.
    #[must_use]
    pub const fn hidden() -> Self {
        Self {
            is_visible: false,
            has_ever_been_visible: false,
        }
    }

    /// State of a degraded (capability-less) tracker.
    #[must_use]
    pub const fn always_visible() -> Self {
        Self {
            is_visible: true,
            has_ever_been_visible: true,
        }
    }
}

/// A visibility change produced by one intersection event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityTransition {
    /// The element became visible for the first time.
    FirstEntered,
    /// The element became visible again (only with `trigger_once = false`).
    Entered,
    /// The element left the viewport.
    Exited,
}

/// Tracks one element's intersection with the scrolling viewport.
#[derive(Debug)]
pub struct IntersectionTracker {
    config: ObservationConfig,
    state: VisibilityState,
    element: Option<ElementId>,
    token: Option<ObservationToken>,
    degraded: bool,
    alive: bool,
}

impl IntersectionTracker {
    /// Create a detached tracker. Call [`attach`](Self::attach) to start
    /// observing.
    #[must_use]
    pub fn new(config: ObservationConfig) -> Self {
        Self {
            config,
            state: VisibilityState::hidden(),
            element: None,
            token: None,
            degraded: false,
            alive: true,
        }
    }

    /// Create a tracker that reports visible immediately, for hosts without
    /// an intersection capability.
    #[must_use]
    pub fn always_visible(config: ObservationConfig) -> Self {
        Self {
            config,
            state: VisibilityState::always_visible(),
            element: None,
            token: None,
            degraded: true,
            alive: true,
        }
    }

    /// The config this tracker was created with.
    #[must_use]
    pub fn config(&self) -> &ObservationConfig {
        &self.config
    }

    /// Current visibility state.
    #[must_use]
    pub fn state(&self) -> VisibilityState {
        self.state
    }

    /// Whether this tracker degraded to always-visible.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Whether an observation is currently active with the host.
    #[must_use]
    pub fn is_observing(&self) -> bool {
        self.token.is_some()
    }

    /// Associate the tracker with a live element and begin observing.
    ///
    /// Re-attaching to a new element (a re-render changed its identity)
    /// releases the old observation and keeps accumulated state. If the host
    /// reports the capability as unsupported, the tracker degrades to
    /// always-visible. No-op after teardown.
    pub fn attach(&mut self, host: &mut dyn IntersectionHost, element: ElementId) {
        if !self.alive {
            trace!(element = element.0, "attach after teardown ignored");
            return;
        }
        if self.degraded {
            return;
        }
        if let Some(old) = self.token.take() {
            host.unobserve(old);
        }
        self.element = Some(element);

        // Nothing left to observe for: trigger-once already fired.
        if self.config.trigger_once && self.state.has_ever_been_visible {
            return;
        }

        match host.observe(element, &self.config) {
            Ok(token) => {
                self.token = Some(token);
                debug!(element = element.0, token = token.0, "observation started");
            }
            Err(CapabilityError::Unsupported(what)) => {
                warn!(
                    capability = what,
                    "intersection capability unavailable, treating content as visible"
                );
                self.degraded = true;
                self.state = VisibilityState::always_visible();
            }
        }
    }

    /// Apply one intersection event from the host.
    ///
    /// Events carrying a stale token (from a released observation or after
    /// teardown) are discarded. Returns the transition this event caused,
    /// if any.
    pub fn on_intersection(
        &mut self,
        host: &mut dyn IntersectionHost,
        event: IntersectionEvent,
    ) -> Option<VisibilityTransition> {
        if !self.alive || self.token != Some(event.token) {
            trace!(token = event.token.0, "stale intersection event dropped");
            return None;
        }

        let visible = event.visible_ratio >= self.config.threshold;
        let was_visible = self.state.is_visible;

        if visible && !was_visible {
            let first = !self.state.has_ever_been_visible;
            self.state.is_visible = true;
            self.state.has_ever_been_visible = true;
            if self.config.trigger_once {
                // Resource cleanup: the latch cannot change again, so stop
                // observing and drop the token.
                if let Some(token) = self.token.take() {
                    host.unobserve(token);
                }
                debug!(element = event.element.0, "trigger-once observation released");
            }
            return Some(if first {
                VisibilityTransition::FirstEntered
            } else {
                VisibilityTransition::Entered
            });
        }

        if !visible && was_visible {
            self.state.is_visible = false;
            return Some(VisibilityTransition::Exited);
        }

        None
    }

    /// Stop observing and mark the tracker dead.
    ///
    /// Idempotent. Any event or attach arriving afterwards is a no-op.
    pub fn teardown(&mut self, host: &mut dyn IntersectionHost) {
        if let Some(token) = self.token.take() {
            host.unobserve(token);
        }
        if self.alive {
            self.alive = false;
            trace!("tracker torn down");
        }
    }
}
