#![forbid(unsafe_code)]

//! Staged loading simulation.
//!
//! A splash screen walks a fixed sequence of labelled steps, advancing a
//! 0–100 progress value smoothly inside each step and firing a completion
//! callback after a settle delay. The simulator here is the pure state
//! machine, advanced one timer tick at a time; [`LoadingDriver`] wires it to
//! a real [`Interval`] subscription.
//!
//! # Invariants
//!
//! 1. Progress is monotone non-decreasing for the whole run and never
//!    exceeds 100; at completion it is exactly 100.
//! 2. The label changes only at step transitions, so an observed label's
//!    cumulative target has never already been exceeded.
//! 3. Completion fires exactly once per run, and never after cancellation.
//!
//! Per-tick increments are sized so each step's target is reached at about
//! the step's nominal duration boundary, but the increment math is never
//! trusted: every tick clamps to the current step's target, so timer drift
//! can stretch a run yet can never overshoot a label's target.

use std::time::Duration;

use tracing::{debug, trace};

use crate::subscription::{Interval, SubscriptionManager};

/// Timer cadence for progress animation.
const DEFAULT_TICK: Duration = Duration::from_millis(50);

/// Pause at 100% before the completion callback fires.
const DEFAULT_SETTLE: Duration = Duration::from_millis(500);

/// Slack when comparing accumulated progress against a step target.
const TARGET_EPSILON: f64 = 1e-9;

/// One named loading step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingStep {
    pub label: String,
    pub duration: Duration,
}

impl LoadingStep {
    #[must_use]
    pub fn new(label: impl Into<String>, duration: Duration) -> Self {
        Self {
            label: label.into(),
            duration,
        }
    }
}

/// A malformed step sequence. Contract violations by the caller; the
/// simulator does not defend beyond refusing to divide by zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// The step sequence was empty.
    EmptyPlan,
    /// The step at this index had a zero duration.
    ZeroDurationStep(usize),
}

impl std::fmt::Display for PlanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPlan => write!(f, "loading plan has no steps"),
            Self::ZeroDurationStep(i) => write!(f, "loading step {i} has zero duration"),
        }
    }
}

impl std::error::Error for PlanError {}

/// An ordered, validated sequence of loading steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingPlan {
    steps: Vec<LoadingStep>,
    total: Duration,
}

impl LoadingPlan {
    /// Validate a step sequence. Every step needs a positive duration so
    /// per-step increments are well defined.
    pub fn new(steps: Vec<LoadingStep>) -> Result<Self, PlanError> {
        if steps.is_empty() {
            return Err(PlanError::EmptyPlan);
        }
        for (i, step) in steps.iter().enumerate() {
            if step.duration.is_zero() {
                return Err(PlanError::ZeroDurationStep(i));
            }
        }
        let total = steps.iter().map(|s| s.duration).sum();
        Ok(Self { steps, total })
    }

    #[must_use]
    pub fn steps(&self) -> &[LoadingStep] {
        &self.steps
    }

    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.total
    }

    /// Cumulative progress target after step `i` completes, in percent.
    #[must_use]
    pub fn target_percent(&self, step: usize) -> f64 {
        let done: Duration = self.steps[..=step].iter().map(|s| s.duration).sum();
        done.as_secs_f64() / self.total.as_secs_f64() * 100.0
    }

    /// Per-tick increment inside step `i`: the step's share of total
    /// progress spread over the ticks its nominal duration contains.
    #[must_use]
    pub fn increment_percent(&self, step: usize, tick: Duration) -> f64 {
        let share = self.steps[step].duration.as_secs_f64() / self.total.as_secs_f64() * 100.0;
        let ticks_in_step = self.steps[step].duration.as_secs_f64() / tick.as_secs_f64();
        share / ticks_in_step
    }
}

impl Default for LoadingPlan {
    /// The four-step portfolio splash sequence (2000ms total).
    fn default() -> Self {
        Self::new(vec![
            LoadingStep::new("Loading components...", Duration::from_millis(800)),
            LoadingStep::new("Preparing portfolio...", Duration::from_millis(600)),
            LoadingStep::new("Almost ready...", Duration::from_millis(400)),
            LoadingStep::new("Welcome!", Duration::from_millis(200)),
        ])
        .expect("default plan is well formed")
    }
}

/// Timer cadence and settle delay for a simulator run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatorConfig {
    /// Interval between progress ticks.
    pub tick: Duration,
    /// Delay between pinning 100% and firing completion.
    pub settle: Duration,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            tick: DEFAULT_TICK,
            settle: DEFAULT_SETTLE,
        }
    }
}

/// Observable progress snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressState {
    /// Index of the step whose label is showing.
    pub step_index: usize,
    /// Cumulative progress in `0.0..=100.0`. Monotone non-decreasing.
    pub percent: f64,
    /// Label of the current step.
    pub label: String,
}

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Progress advanced within the current step.
    Advanced,
    /// The current step finished; the label switched to this step index.
    StepChanged(usize),
    /// The final step finished; progress pinned at 100, settle underway.
    Settling,
    /// The settle delay elapsed. Reported exactly once per run.
    CompletionDue,
    /// The run already completed; the tick was a no-op.
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Running { step: usize },
    Settling { remaining_ticks: u32 },
    Complete,
}

/// Drives progress through a [`LoadingPlan`], one tick at a time.
///
/// Starts in the first step immediately; there is no observable idle state.
#[derive(Debug)]
pub struct ProgressSimulator {
    plan: LoadingPlan,
    config: SimulatorConfig,
    phase: Phase,
    percent: f64,
    step_index: usize,
}

impl ProgressSimulator {
    #[must_use]
    pub fn new(plan: LoadingPlan, config: SimulatorConfig) -> Self {
        Self {
            plan,
            config,
            phase: Phase::Running { step: 0 },
            percent: 0.0,
            step_index: 0,
        }
    }

    /// The tick period this simulator expects to be driven at.
    #[must_use]
    pub fn tick_period(&self) -> Duration {
        self.config.tick
    }

    /// Current progress snapshot.
    #[must_use]
    pub fn state(&self) -> ProgressState {
        ProgressState {
            step_index: self.step_index,
            percent: self.percent,
            label: self.plan.steps()[self.step_index].label.clone(),
        }
    }

    /// Whether the completion callback point has been reached.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Complete
    }

    fn settle_ticks(&self) -> u32 {
        let tick = self.config.tick.as_secs_f64();
        if tick <= 0.0 {
            return 0;
        }
        (self.config.settle.as_secs_f64() / tick).ceil() as u32
    }

    /// Advance one tick.
    pub fn on_tick(&mut self) -> TickOutcome {
        match self.phase {
            Phase::Complete => TickOutcome::Complete,
            Phase::Settling { remaining_ticks } => {
                if remaining_ticks <= 1 {
                    self.phase = Phase::Complete;
                    debug!("loading settle elapsed, completion due");
                    TickOutcome::CompletionDue
                } else {
                    self.phase = Phase::Settling {
                        remaining_ticks: remaining_ticks - 1,
                    };
                    TickOutcome::Settling
                }
            }
            Phase::Running { step } => {
                let target = self.plan.target_percent(step);
                let increment = self.plan.increment_percent(step, self.config.tick);
                // Clamp every tick: drift in timer delivery must never push
                // progress past the step target before the transition.
                self.percent = (self.percent + increment).min(target);
                trace!(step, percent = self.percent, "progress tick");

                if target - self.percent > TARGET_EPSILON {
                    return TickOutcome::Advanced;
                }
                // Pin to the boundary so the observed value at a transition
                // is the step target itself, not fp noise just below it.
                self.percent = target;

                if step + 1 < self.plan.steps().len() {
                    self.phase = Phase::Running { step: step + 1 };
                    self.step_index = step + 1;
                    debug!(
                        step = step + 1,
                        label = %self.plan.steps()[step + 1].label,
                        "loading step transition"
                    );
                    TickOutcome::StepChanged(step + 1)
                } else {
                    self.percent = 100.0;
                    self.phase = Phase::Settling {
                        remaining_ticks: self.settle_ticks(),
                    };
                    debug!("loading steps finished, settling at 100%");
                    TickOutcome::Settling
                }
            }
        }
    }
}

/// Runs a [`ProgressSimulator`] off a real interval timer and invokes a
/// completion callback exactly once.
///
/// Timer callbacks arrive as messages drained on the owner's thread by
/// [`pump`](LoadingDriver::pump), so completion always runs on the thread
/// that owns the surrounding UI state. [`cancel`](LoadingDriver::cancel)
/// stops the timer and guarantees the callback never fires afterwards.
pub struct LoadingDriver {
    simulator: ProgressSimulator,
    manager: SubscriptionManager<DriverMsg>,
    on_complete: Option<Box<dyn FnOnce()>>,
    cancelled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DriverMsg {
    Tick,
}

/// Subscription id for the driver's progress tick.
const TICK_SUB_ID: u64 = 1;

impl LoadingDriver {
    /// Start the timer immediately.
    #[must_use]
    pub fn new(
        plan: LoadingPlan,
        config: SimulatorConfig,
        on_complete: impl FnOnce() + 'static,
    ) -> Self {
        let mut manager = SubscriptionManager::new();
        manager.reconcile(vec![Box::new(Interval::with_id(
            TICK_SUB_ID,
            config.tick,
            || DriverMsg::Tick,
        ))]);
        Self {
            simulator: ProgressSimulator::new(plan, config),
            manager,
            on_complete: Some(Box::new(on_complete)),
            cancelled: false,
        }
    }

    /// Current progress snapshot.
    #[must_use]
    pub fn state(&self) -> ProgressState {
        self.simulator.state()
    }

    /// Whether the run finished (completion callback already invoked).
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.simulator.is_complete()
    }

    /// Drain pending timer messages and advance the simulator, in order.
    ///
    /// Invokes the completion callback on this thread when the settle delay
    /// elapses. Safe to call after completion or cancellation.
    pub fn pump(&mut self) -> ProgressState {
        for msg in self.manager.drain() {
            // A tick can be in flight when cancel() lands; it must not
            // advance the simulator or reach the callback.
            if self.cancelled {
                break;
            }
            match msg {
                DriverMsg::Tick => {
                    if self.simulator.on_tick() == TickOutcome::CompletionDue {
                        self.manager.stop_all();
                        if let Some(callback) = self.on_complete.take() {
                            callback();
                        }
                    }
                }
            }
        }
        self.simulator.state()
    }

    /// Stop the timer and suppress the completion callback permanently.
    /// Idempotent.
    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.on_complete = None;
        self.manager.stop_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn default_sim() -> ProgressSimulator {
        ProgressSimulator::new(LoadingPlan::default(), SimulatorConfig::default())
    }

    #[test]
    fn plan_rejects_empty_sequence() {
        assert_eq!(LoadingPlan::new(vec![]), Err(PlanError::EmptyPlan));
    }

    #[test]
    fn plan_rejects_zero_duration_step() {
        let steps = vec![
            LoadingStep::new("a", Duration::from_millis(100)),
            LoadingStep::new("b", Duration::ZERO),
        ];
        assert_eq!(LoadingPlan::new(steps), Err(PlanError::ZeroDurationStep(1)));
    }

    #[test]
    fn default_plan_totals_two_seconds() {
        let plan = LoadingPlan::default();
        assert_eq!(plan.steps().len(), 4);
        assert_eq!(plan.total_duration(), Duration::from_millis(2000));
        assert!((plan.target_percent(0) - 40.0).abs() < 1e-9);
        assert!((plan.target_percent(3) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn starts_in_first_step_with_zero_progress() {
        let sim = default_sim();
        let state = sim.state();
        assert_eq!(state.step_index, 0);
        assert_eq!(state.percent, 0.0);
        assert_eq!(state.label, "Loading components...");
    }

    #[test]
    fn progress_is_monotone_and_completes_at_exactly_100() {
        let mut sim = default_sim();
        let mut last = 0.0;
        let mut completions = 0;
        for _ in 0..200 {
            let outcome = sim.on_tick();
            let state = sim.state();
            assert!(state.percent >= last, "progress must never decrease");
            assert!(state.percent <= 100.0);
            last = state.percent;
            if outcome == TickOutcome::CompletionDue {
                completions += 1;
            }
            if sim.is_complete() {
                break;
            }
        }
        assert_eq!(completions, 1);
        assert_eq!(sim.state().percent, 100.0);
    }

    #[test]
    fn label_when_progress_first_reaches_40_is_second_step() {
        let mut sim = default_sim();
        loop {
            sim.on_tick();
            let state = sim.state();
            if state.percent >= 40.0 {
                assert_eq!(state.label, "Preparing portfolio...");
                break;
            }
            assert_eq!(state.label, "Loading components...");
        }
    }

    #[test]
    fn labels_change_only_at_step_transitions() {
        let mut sim = default_sim();
        let mut label = sim.state().label;
        for _ in 0..200 {
            let outcome = sim.on_tick();
            let state = sim.state();
            match outcome {
                TickOutcome::StepChanged(i) => {
                    assert_ne!(state.label, label);
                    assert_eq!(state.label, LoadingPlan::default().steps()[i].label);
                    label = state.label;
                }
                _ => assert_eq!(state.label, label),
            }
            if sim.is_complete() {
                break;
            }
        }
    }

    #[test]
    fn label_never_shows_with_its_target_exceeded() {
        let mut sim = default_sim();
        let plan = LoadingPlan::default();
        for _ in 0..200 {
            sim.on_tick();
            let state = sim.state();
            // The showing step's own target may be reached but not exceeded.
            assert!(state.percent <= plan.target_percent(state.step_index) + 1e-9);
            if sim.is_complete() {
                break;
            }
        }
    }

    #[test]
    fn default_cadence_completes_near_nominal_tick_count() {
        // 2000ms of steps at 50ms ticks = 40 ticks, then 500ms settle
        // = 10 ticks. Boundary rounding may cost one extra tick per step.
        let mut sim = default_sim();
        let mut ticks = 0;
        while !sim.is_complete() {
            sim.on_tick();
            ticks += 1;
            assert!(ticks <= 54, "run overshot the nominal schedule");
        }
        assert!(ticks >= 50);
    }

    #[test]
    fn ticks_after_completion_are_no_ops() {
        let mut sim = default_sim();
        while !sim.is_complete() {
            sim.on_tick();
        }
        assert_eq!(sim.on_tick(), TickOutcome::Complete);
        assert_eq!(sim.state().percent, 100.0);
    }

    #[test]
    fn settling_pins_progress_at_100() {
        let mut sim = default_sim();
        let mut seen_settling = false;
        while !sim.is_complete() {
            if sim.on_tick() == TickOutcome::Settling {
                seen_settling = true;
                assert_eq!(sim.state().percent, 100.0);
            }
        }
        assert!(seen_settling);
    }

    proptest! {
        #[test]
        fn arbitrary_plans_complete_monotonically(
            durations in proptest::collection::vec(50u64..1000, 1..6)
        ) {
            let steps = durations
                .iter()
                .enumerate()
                .map(|(i, ms)| LoadingStep::new(format!("step {i}"), Duration::from_millis(*ms)))
                .collect();
            let plan = LoadingPlan::new(steps).unwrap();
            let mut sim = ProgressSimulator::new(plan, SimulatorConfig::default());

            let mut last = 0.0;
            let mut completions = 0;
            for _ in 0..10_000 {
                if sim.on_tick() == TickOutcome::CompletionDue {
                    completions += 1;
                }
                let percent = sim.state().percent;
                prop_assert!(percent >= last);
                prop_assert!(percent <= 100.0);
                last = percent;
                if sim.is_complete() {
                    break;
                }
            }
            prop_assert!(sim.is_complete());
            prop_assert_eq!(completions, 1);
            prop_assert_eq!(sim.state().percent, 100.0);
        }
    }

    mod driver {
        use super::*;
        use std::sync::Arc;
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::thread;
        use std::time::Instant;

        fn fast_plan() -> LoadingPlan {
            LoadingPlan::new(vec![
                LoadingStep::new("one", Duration::from_millis(20)),
                LoadingStep::new("two", Duration::from_millis(20)),
            ])
            .unwrap()
        }

        fn fast_config() -> SimulatorConfig {
            SimulatorConfig {
                tick: Duration::from_millis(5),
                settle: Duration::from_millis(10),
            }
        }

        #[test]
        fn completion_callback_fires_exactly_once() {
            let calls = Arc::new(AtomicU32::new(0));
            let calls_in = calls.clone();
            let mut driver = LoadingDriver::new(fast_plan(), fast_config(), move || {
                calls_in.fetch_add(1, Ordering::SeqCst);
            });

            let deadline = Instant::now() + Duration::from_secs(2);
            while !driver.is_complete() {
                assert!(Instant::now() < deadline, "driver never completed");
                driver.pump();
                thread::sleep(Duration::from_millis(2));
            }
            // Extra pumps after completion must not re-fire.
            driver.pump();
            driver.pump();
            assert_eq!(calls.load(Ordering::SeqCst), 1);
            assert_eq!(driver.state().percent, 100.0);
        }

        #[test]
        fn cancel_before_completion_suppresses_callback() {
            let calls = Arc::new(AtomicU32::new(0));
            let calls_in = calls.clone();
            let mut driver = LoadingDriver::new(fast_plan(), fast_config(), move || {
                calls_in.fetch_add(1, Ordering::SeqCst);
            });

            driver.pump();
            driver.cancel();

            // Let any straggler timer messages land, then pump again.
            thread::sleep(Duration::from_millis(30));
            driver.pump();
            driver.cancel(); // idempotent
            assert_eq!(calls.load(Ordering::SeqCst), 0);
            assert!(!driver.is_complete());
        }
    }
}
