#![forbid(unsafe_code)]

//! Page orchestration.
//!
//! Sequences the page lifecycle: the loading screen runs first, then the
//! content tree is revealed after a short transition delay, and from that
//! point each registered section observes its own viewport intersection.
//!
//! ```text
//! Loading ── completion due ──► Revealing ── reveal delay ──► Ready
//! ```
//!
//! All state mutation happens on the owner's thread: timer callbacks arrive
//! as messages drained by [`pump`](PageOrchestrator::pump) in arrival order,
//! and intersection events enter through
//! [`handle_intersection`](PageOrchestrator::handle_intersection). After
//! [`teardown`](PageOrchestrator::teardown) every message is a no-op.

use std::time::Duration;

use lazyvis_core::{
    ElementId, IntersectionEvent, IntersectionHost, IntersectionTracker, ObservationConfig,
    VisibilityState, VisibilityTransition,
};
use tracing::{debug, trace};

use crate::loader::{LoadingPlan, ProgressSimulator, ProgressState, SimulatorConfig, TickOutcome};
use crate::subscription::{Delay, Interval, SubscriptionManager};

/// Delay between loading completion and revealing the content tree.
const DEFAULT_REVEAL_DELAY: Duration = Duration::from_millis(100);

/// Root margin used by page sections (wider than the widget default so
/// sections activate well before they scroll on screen).
pub const SECTION_ROOT_MARGIN_PX: i32 = 200;

/// Identity of one lazily-activated page section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectionId(pub u64);

/// Page lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagePhase {
    /// The loading screen is running.
    Loading,
    /// Loading finished; waiting out the reveal transition.
    Revealing,
    /// Content is mounted and sections observe their visibility.
    Ready,
}

/// Observable orchestrator output, in the order things happened.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    /// The loading screen advanced.
    Progress(ProgressState),
    /// The loading screen finished (progress pinned at 100).
    LoadingComplete,
    /// The content tree should mount now.
    RevealContent,
    /// A section became visible for the first time.
    SectionActivated(SectionId),
}

/// Timing knobs for the page lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    pub simulator: SimulatorConfig,
    pub reveal_delay: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            simulator: SimulatorConfig::default(),
            reveal_delay: DEFAULT_REVEAL_DELAY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Msg {
    Tick,
    Reveal,
}

const TICK_SUB_ID: u64 = 1;
const REVEAL_SUB_ID: u64 = 2;

struct Section {
    id: SectionId,
    element: ElementId,
    tracker: IntersectionTracker,
}

/// Owns the loading simulator and the per-section trackers, and drives the
/// page through its phases.
pub struct PageOrchestrator<H: IntersectionHost> {
    host: H,
    phase: PagePhase,
    simulator: ProgressSimulator,
    reveal_delay: Duration,
    manager: SubscriptionManager<Msg>,
    sections: Vec<Section>,
    alive: bool,
}

impl<H: IntersectionHost> PageOrchestrator<H> {
    /// Start the loading screen immediately.
    #[must_use]
    pub fn new(host: H, plan: LoadingPlan, config: OrchestratorConfig) -> Self {
        let mut manager = SubscriptionManager::new();
        manager.reconcile(vec![Box::new(Interval::with_id(
            TICK_SUB_ID,
            config.simulator.tick,
            || Msg::Tick,
        ))]);
        Self {
            host,
            phase: PagePhase::Loading,
            simulator: ProgressSimulator::new(plan, config.simulator),
            reveal_delay: config.reveal_delay,
            manager,
            sections: Vec::new(),
            alive: true,
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> PagePhase {
        self.phase
    }

    /// Current loading progress.
    #[must_use]
    pub fn progress(&self) -> ProgressState {
        self.simulator.state()
    }

    /// The host, for glue that needs to deliver events or inspect state.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Visibility of one registered section.
    #[must_use]
    pub fn section_state(&self, id: SectionId) -> Option<VisibilityState> {
        self.sections
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.tracker.state())
    }

    /// Register a lazily-activated section.
    ///
    /// Sections registered before the reveal start observing when the
    /// content tree mounts; registering in `Ready` attaches immediately.
    pub fn register_section(
        &mut self,
        id: SectionId,
        element: ElementId,
        config: ObservationConfig,
    ) {
        if !self.alive {
            return;
        }
        let mut section = Section {
            id,
            element,
            tracker: IntersectionTracker::new(config),
        };
        if self.phase == PagePhase::Ready {
            section.tracker.attach(&mut self.host, element);
        }
        self.sections.push(section);
    }

    /// Drain pending timer messages and apply them in order.
    pub fn pump(&mut self) -> Vec<PageEvent> {
        let mut events = Vec::new();
        for msg in self.manager.drain() {
            if !self.alive {
                break;
            }
            match msg {
                Msg::Tick => self.on_tick(&mut events),
                Msg::Reveal => self.on_reveal(&mut events),
            }
        }
        events
    }

    fn on_tick(&mut self, events: &mut Vec<PageEvent>) {
        if self.phase != PagePhase::Loading {
            // Straggler from the stopped loading interval.
            return;
        }
        let outcome = self.simulator.on_tick();
        events.push(PageEvent::Progress(self.simulator.state()));
        if outcome == TickOutcome::CompletionDue {
            debug!("loading complete, scheduling reveal");
            self.phase = PagePhase::Revealing;
            events.push(PageEvent::LoadingComplete);
            let delay = self.reveal_delay;
            self.manager
                .reconcile(vec![Box::new(Delay::with_id(REVEAL_SUB_ID, delay, || {
                    Msg::Reveal
                }))]);
        }
    }

    fn on_reveal(&mut self, events: &mut Vec<PageEvent>) {
        if self.phase != PagePhase::Revealing {
            return;
        }
        self.phase = PagePhase::Ready;
        self.manager.reconcile(vec![]);
        for section in &mut self.sections {
            section.tracker.attach(&mut self.host, section.element);
        }
        debug!(sections = self.sections.len(), "content revealed");
        events.push(PageEvent::RevealContent);
    }

    /// Route one intersection event from the host to its owning tracker.
    ///
    /// Events before the content tree is mounted (or after teardown) carry
    /// tokens no tracker owns and are dropped.
    pub fn handle_intersection(&mut self, event: IntersectionEvent) -> Vec<PageEvent> {
        let mut events = Vec::new();
        if !self.alive {
            return events;
        }
        for section in &mut self.sections {
            match section.tracker.on_intersection(&mut self.host, event) {
                Some(VisibilityTransition::FirstEntered) => {
                    debug!(section = section.id.0, "section activated");
                    events.push(PageEvent::SectionActivated(section.id));
                    break;
                }
                Some(_) => break,
                None => {}
            }
        }
        if events.is_empty() {
            trace!(token = event.token.0, "intersection event unrouted");
        }
        events
    }

    /// Stop all timers and observations. Idempotent; every later message or
    /// event is a no-op.
    pub fn teardown(&mut self) {
        if !self.alive {
            return;
        }
        self.alive = false;
        self.manager.stop_all();
        for section in &mut self.sections {
            section.tracker.teardown(&mut self.host);
        }
        debug!("page orchestrator torn down");
    }
}

impl<H: IntersectionHost> Drop for PageOrchestrator<H> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazyvis_core::capability::mock::MockIntersectionHost;
    use lazyvis_core::margin::RootMargin;
    use std::thread;
    use std::time::Instant;

    fn fast_config() -> OrchestratorConfig {
        OrchestratorConfig {
            simulator: SimulatorConfig {
                tick: Duration::from_millis(2),
                settle: Duration::from_millis(4),
            },
            reveal_delay: Duration::from_millis(4),
        }
    }

    fn fast_plan() -> LoadingPlan {
        use crate::loader::LoadingStep;
        LoadingPlan::new(vec![
            LoadingStep::new("a", Duration::from_millis(10)),
            LoadingStep::new("b", Duration::from_millis(10)),
        ])
        .unwrap()
    }

    fn section_config() -> ObservationConfig {
        ObservationConfig::new()
            .with_threshold(0.1)
            .with_root_margin(RootMargin::uniform(SECTION_ROOT_MARGIN_PX))
            .with_trigger_once(true)
    }

    fn pump_until<H, F>(orch: &mut PageOrchestrator<H>, mut done: F) -> Vec<PageEvent>
    where
        H: IntersectionHost,
        F: FnMut(&[PageEvent]) -> bool,
    {
        let mut seen = Vec::new();
        let deadline = Instant::now() + Duration::from_secs(2);
        while !done(&seen) {
            assert!(Instant::now() < deadline, "orchestrator stalled: {seen:?}");
            seen.extend(orch.pump());
            thread::sleep(Duration::from_millis(1));
        }
        seen
    }

    #[test]
    fn starts_in_loading_phase() {
        let orch =
            PageOrchestrator::new(MockIntersectionHost::new(), fast_plan(), fast_config());
        assert_eq!(orch.phase(), PagePhase::Loading);
        assert_eq!(orch.progress().percent, 0.0);
    }

    #[test]
    fn loading_then_reveal_in_order() {
        let mut orch =
            PageOrchestrator::new(MockIntersectionHost::new(), fast_plan(), fast_config());
        orch.register_section(SectionId(1), ElementId(10), section_config());

        let events = pump_until(&mut orch, |seen| {
            seen.iter().any(|e| *e == PageEvent::RevealContent)
        });

        let complete_at = events
            .iter()
            .position(|e| *e == PageEvent::LoadingComplete)
            .expect("loading must complete");
        let reveal_at = events
            .iter()
            .position(|e| *e == PageEvent::RevealContent)
            .expect("content must reveal");
        assert!(complete_at < reveal_at);
        assert_eq!(orch.phase(), PagePhase::Ready);
        assert_eq!(orch.progress().percent, 100.0);
        // The section's observation started at reveal.
        assert_eq!(orch.host_mut().active_count(), 1);
    }

    #[test]
    fn progress_events_are_monotone() {
        let mut orch =
            PageOrchestrator::new(MockIntersectionHost::new(), fast_plan(), fast_config());
        let events = pump_until(&mut orch, |seen| {
            seen.iter().any(|e| *e == PageEvent::LoadingComplete)
        });
        let mut last = 0.0;
        for event in &events {
            if let PageEvent::Progress(state) = event {
                assert!(state.percent >= last);
                last = state.percent;
            }
        }
        assert_eq!(last, 100.0);
    }

    #[test]
    fn section_activates_once_on_first_intersection() {
        let mut orch =
            PageOrchestrator::new(MockIntersectionHost::new(), fast_plan(), fast_config());
        orch.register_section(SectionId(1), ElementId(10), section_config());
        pump_until(&mut orch, |seen| {
            seen.iter().any(|e| *e == PageEvent::RevealContent)
        });

        let token = orch.host_mut().observed[0].0;
        let enter = orch.host_mut().emit(token, 0.5).unwrap();
        assert_eq!(
            orch.handle_intersection(enter),
            vec![PageEvent::SectionActivated(SectionId(1))]
        );
        // Trigger-once: observation released, latch sticky.
        assert_eq!(orch.host_mut().active_count(), 0);
        let state = orch.section_state(SectionId(1)).unwrap();
        assert!(state.has_ever_been_visible);

        // A straggler for the released token is dropped.
        let stale = IntersectionEvent {
            token,
            element: ElementId(10),
            visible_ratio: 0.0,
        };
        assert!(orch.handle_intersection(stale).is_empty());
        assert!(orch.section_state(SectionId(1)).unwrap().has_ever_been_visible);
    }

    #[test]
    fn intersection_before_reveal_is_dropped() {
        let mut orch =
            PageOrchestrator::new(MockIntersectionHost::new(), fast_plan(), fast_config());
        orch.register_section(SectionId(1), ElementId(10), section_config());
        // No observation exists yet, so any token is unknown.
        let phantom = IntersectionEvent {
            token: lazyvis_core::ObservationToken(99),
            element: ElementId(10),
            visible_ratio: 1.0,
        };
        assert!(orch.handle_intersection(phantom).is_empty());
        assert!(!orch.section_state(SectionId(1)).unwrap().has_ever_been_visible);
    }

    #[test]
    fn register_after_ready_attaches_immediately() {
        let mut orch =
            PageOrchestrator::new(MockIntersectionHost::new(), fast_plan(), fast_config());
        pump_until(&mut orch, |seen| {
            seen.iter().any(|e| *e == PageEvent::RevealContent)
        });
        orch.register_section(SectionId(2), ElementId(20), section_config());
        assert_eq!(orch.host_mut().active_count(), 1);
    }

    #[test]
    fn teardown_mid_loading_stops_everything() {
        let mut orch =
            PageOrchestrator::new(MockIntersectionHost::new(), fast_plan(), fast_config());
        orch.register_section(SectionId(1), ElementId(10), section_config());
        orch.teardown();
        assert_eq!(orch.phase(), PagePhase::Loading, "phase frozen at teardown");

        thread::sleep(Duration::from_millis(20));
        assert!(orch.pump().is_empty(), "no events after teardown");
        orch.teardown(); // idempotent
    }

    #[test]
    fn degraded_host_reveals_sections_as_visible() {
        let mut orch = PageOrchestrator::new(
            MockIntersectionHost::without_capability(),
            fast_plan(),
            fast_config(),
        );
        orch.register_section(SectionId(1), ElementId(10), section_config());
        pump_until(&mut orch, |seen| {
            seen.iter().any(|e| *e == PageEvent::RevealContent)
        });
        let state = orch.section_state(SectionId(1)).unwrap();
        assert!(state.is_visible, "no capability degrades to always visible");
        assert!(state.has_ever_been_visible);
    }
}
