#![forbid(unsafe_code)]

//! Host capability model.
//!
//! The hosting environment (a browser-like shell, an embedded webview, a test
//! harness) exposes two capabilities to this crate: viewport-intersection
//! observation and performance-timing signals. Both are optional. Capabilities
//! are probed once at startup; an absent capability short-circuits to a no-op
//! subscription instead of branching throughout the logic.
//!
//! Absence is never an error to the page: a host without intersection support
//! degrades to "everything visible immediately", a host without a timing
//! signal simply produces no entry for it.

use std::fmt;

use crate::config::ObservationConfig;

/// Identity of a renderable element as assigned by the host.
///
/// The host may re-create the underlying element (a re-render); trackers
/// handle identity changes by re-subscribing without losing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

/// Handle for one active intersection observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObservationToken(pub u64);

/// Handle for one active timing subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimingToken(pub u64);

bitflags::bitflags! {
    /// Capability set reported by a host, resolved once at startup.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HostCapabilities: u8 {
        const INTERSECTION  = 1 << 0;
        const PAINT         = 1 << 1;
        const LARGEST_PAINT = 1 << 2;
        const FIRST_INPUT   = 1 << 3;
        const LAYOUT_SHIFT  = 1 << 4;
        const NAVIGATION    = 1 << 5;
    }
}

impl HostCapabilities {
    /// Whether the host can deliver entries of the given timing kind.
    #[must_use]
    pub fn supports_timing(self, kind: TimingKind) -> bool {
        self.contains(match kind {
            TimingKind::Paint => Self::PAINT,
            TimingKind::LargestPaint => Self::LARGEST_PAINT,
            TimingKind::FirstInput => Self::FIRST_INPUT,
            TimingKind::LayoutShift => Self::LAYOUT_SHIFT,
            TimingKind::Navigation => Self::NAVIGATION,
        })
    }
}

/// A capability was requested that the host cannot provide.
///
/// Always recoverable: callers degrade (skip the subscription, or treat
/// content as immediately visible) rather than fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    /// The named capability is not present in this host.
    Unsupported(&'static str),
}

impl fmt::Display for CapabilityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported(what) => write!(f, "host capability not supported: {what}"),
        }
    }
}

impl std::error::Error for CapabilityError {}

/// One intersection-change report from the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEvent {
    /// The observation this event belongs to.
    pub token: ObservationToken,
    /// The element that changed intersection.
    pub element: ElementId,
    /// Fraction of the element's area visible within the (margin-expanded)
    /// viewport, in `0.0..=1.0`.
    pub visible_ratio: f64,
}

/// Viewport-intersection capability.
///
/// Registration-only: the host delivers [`IntersectionEvent`]s through
/// whatever event loop the caller runs, and the caller feeds them to the
/// owning tracker.
pub trait IntersectionHost {
    /// Begin observing an element with the given margin and threshold.
    fn observe(
        &mut self,
        element: ElementId,
        config: &ObservationConfig,
    ) -> Result<ObservationToken, CapabilityError>;

    /// Stop observing. Unknown or already-released tokens are ignored.
    fn unobserve(&mut self, token: ObservationToken);
}

/// The timing signal families a host may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingKind {
    /// Paint timing (first contentful paint).
    Paint,
    /// Largest-render timing.
    LargestPaint,
    /// First-interaction latency.
    FirstInput,
    /// Layout-instability signals.
    LayoutShift,
    /// The single navigation timing record.
    Navigation,
}

impl TimingKind {
    /// Stable name for logs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Paint => "paint",
            Self::LargestPaint => "largest-paint",
            Self::FirstInput => "first-input",
            Self::LayoutShift => "layout-shift",
            Self::Navigation => "navigation",
        }
    }
}

/// One timing entry delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimingEntry {
    /// A paint milestone.
    Paint {
        /// True for the first-contentful-paint entry; other paint entries
        /// are ignored by the collector.
        first_contentful: bool,
        start_ms: f64,
    },
    /// A largest-render candidate. Later entries supersede earlier ones.
    LargestPaint { start_ms: f64 },
    /// The first user interaction and when its handler started running.
    FirstInput {
        start_ms: f64,
        processing_start_ms: f64,
    },
    /// A layout shift with its instability value.
    LayoutShift {
        value: f64,
        /// Shifts caused by recent user input do not count toward CLS.
        had_recent_input: bool,
    },
}

/// The navigation timing record (first record wins if several exist).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NavigationTiming {
    pub request_start_ms: f64,
    pub response_start_ms: f64,
    pub dom_content_loaded_start_ms: f64,
    pub dom_content_loaded_end_ms: f64,
    pub load_event_start_ms: f64,
    pub load_event_end_ms: f64,
}

/// Performance-timing capability.
///
/// Each [`TimingKind`] is subscribed independently so that one unsupported
/// signal never blocks the others.
pub trait TimingHost {
    /// Subscribe to one timing signal family.
    fn subscribe(&mut self, kind: TimingKind) -> Result<TimingToken, CapabilityError>;

    /// Drop a subscription. Unknown or already-released tokens are ignored.
    fn unsubscribe(&mut self, token: TimingToken);
}

#[cfg(any(test, feature = "test-helpers"))]
pub mod mock {
    //! Recording hosts for tests.

    use std::collections::HashMap;

    use super::*;

    /// An intersection host that records observe/unobserve calls and can be
    /// configured as unsupported.
    #[derive(Debug, Default)]
    pub struct MockIntersectionHost {
        next_token: u64,
        active: HashMap<ObservationToken, (ElementId, ObservationConfig)>,
        /// Every observe call ever made, in order.
        pub observed: Vec<(ObservationToken, ElementId)>,
        /// Every unobserve call ever made, in order.
        pub released: Vec<ObservationToken>,
        /// When true, `observe` reports `Unsupported`.
        pub unsupported: bool,
    }

    impl MockIntersectionHost {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// A host with no intersection capability at all.
        #[must_use]
        pub fn without_capability() -> Self {
            Self {
                unsupported: true,
                ..Self::default()
            }
        }

        /// Whether the given token is still being observed.
        #[must_use]
        pub fn is_observing(&self, token: ObservationToken) -> bool {
            self.active.contains_key(&token)
        }

        /// Number of currently active observations.
        #[must_use]
        pub fn active_count(&self) -> usize {
            self.active.len()
        }

        /// Synthesize an intersection event for an active observation.
        ///
        /// Returns `None` if the token is no longer observed (which is how a
        /// real host behaves after `unobserve`).
        #[must_use]
        pub fn emit(&self, token: ObservationToken, visible_ratio: f64) -> Option<IntersectionEvent> {
            self.active.get(&token).map(|(element, _)| IntersectionEvent {
                token,
                element: *element,
                visible_ratio,
            })
        }
    }

    impl IntersectionHost for MockIntersectionHost {
        fn observe(
            &mut self,
            element: ElementId,
            config: &ObservationConfig,
        ) -> Result<ObservationToken, CapabilityError> {
            if self.unsupported {
                return Err(CapabilityError::Unsupported("intersection"));
            }
            self.next_token += 1;
            let token = ObservationToken(self.next_token);
            self.active.insert(token, (element, config.clone()));
            self.observed.push((token, element));
            Ok(token)
        }

        fn unobserve(&mut self, token: ObservationToken) {
            if self.active.remove(&token).is_some() {
                self.released.push(token);
            }
        }
    }

    /// A timing host with a configurable capability set.
    #[derive(Debug)]
    pub struct MockTimingHost {
        capabilities: HostCapabilities,
        next_token: u64,
        active: HashMap<TimingToken, TimingKind>,
        /// Every unsubscribe call ever made, in order.
        pub released: Vec<TimingToken>,
    }

    impl MockTimingHost {
        /// A host supporting every timing signal.
        #[must_use]
        pub fn full() -> Self {
            Self::with_capabilities(HostCapabilities::all())
        }

        /// A host supporting only the given signals.
        #[must_use]
        pub fn with_capabilities(capabilities: HostCapabilities) -> Self {
            Self {
                capabilities,
                next_token: 0,
                active: HashMap::new(),
                released: Vec::new(),
            }
        }

        /// Number of currently active subscriptions.
        #[must_use]
        pub fn active_count(&self) -> usize {
            self.active.len()
        }
    }

    impl TimingHost for MockTimingHost {
        fn subscribe(&mut self, kind: TimingKind) -> Result<TimingToken, CapabilityError> {
            if !self.capabilities.supports_timing(kind) {
                return Err(CapabilityError::Unsupported(kind.name()));
            }
            self.next_token += 1;
            let token = TimingToken(self.next_token);
            self.active.insert(token, kind);
            Ok(token)
        }

        fn unsubscribe(&mut self, token: TimingToken) {
            if self.active.remove(&token).is_some() {
                self.released.push(token);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{MockIntersectionHost, MockTimingHost};
    use super::*;

    #[test]
    fn capability_flags_map_to_timing_kinds() {
        let caps = HostCapabilities::PAINT | HostCapabilities::NAVIGATION;
        assert!(caps.supports_timing(TimingKind::Paint));
        assert!(caps.supports_timing(TimingKind::Navigation));
        assert!(!caps.supports_timing(TimingKind::LayoutShift));
    }

    #[test]
    fn mock_host_hands_out_distinct_tokens() {
        let mut host = MockIntersectionHost::new();
        let cfg = ObservationConfig::default();
        let a = host.observe(ElementId(1), &cfg).unwrap();
        let b = host.observe(ElementId(2), &cfg).unwrap();
        assert_ne!(a, b);
        assert_eq!(host.active_count(), 2);
    }

    #[test]
    fn mock_host_without_capability_reports_unsupported() {
        let mut host = MockIntersectionHost::without_capability();
        let err = host
            .observe(ElementId(1), &ObservationConfig::default())
            .unwrap_err();
        assert_eq!(err, CapabilityError::Unsupported("intersection"));
    }

    #[test]
    fn unobserve_stops_event_synthesis() {
        let mut host = MockIntersectionHost::new();
        let token = host
            .observe(ElementId(1), &ObservationConfig::default())
            .unwrap();
        assert!(host.emit(token, 0.5).is_some());
        host.unobserve(token);
        assert!(host.emit(token, 0.5).is_none());
        // Releasing twice is harmless.
        host.unobserve(token);
        assert_eq!(host.released.len(), 1);
    }

    #[test]
    fn timing_host_skips_unsupported_kinds() {
        let mut host = MockTimingHost::with_capabilities(HostCapabilities::PAINT);
        assert!(host.subscribe(TimingKind::Paint).is_ok());
        assert_eq!(
            host.subscribe(TimingKind::LayoutShift),
            Err(CapabilityError::Unsupported("layout-shift"))
        );
    }
}
