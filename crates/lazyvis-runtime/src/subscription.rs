#![forbid(unsafe_code)]

//! Timer subscriptions.
//!
//! The loading simulator and the orchestrator advance on timer cadences: a
//! repeating tick for progress animation, one-shots for settle and reveal
//! delays. Subscriptions deliver those timer callbacks as messages on a
//! channel drained by the owner's thread, so all state mutation stays
//! single-threaded and strictly ordered.
//!
//! # Lifecycle
//!
//! 1. The owner declares its active subscriptions.
//! 2. [`SubscriptionManager::reconcile`] starts new ones and stops removed
//!    ones, deduplicating by [`SubId`].
//! 3. The owner drains pending messages with
//!    [`SubscriptionManager::drain`] and applies them in order.
//!
//! Stopping is race-free from the owner's perspective: after
//! [`stop_all`](SubscriptionManager::stop_all) plus a drain, no further
//! messages are applied, so an in-flight timer callback can never mutate
//! state the owner already tore down.

use std::collections::HashSet;
use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

use tracing::{debug, trace};

/// Unique identifier for a subscription, used for reconcile deduplication.
pub type SubId = u64;

/// A continuous or one-shot message source driven by a background timer.
pub trait Subscription<M: Send + 'static>: Send {
    /// Identifier for deduplication: subscriptions with the same id are
    /// considered the same and are not restarted on reconcile.
    fn id(&self) -> SubId;

    /// Run on a background thread, sending messages until the channel
    /// disconnects or the stop signal fires.
    fn run(&self, sender: mpsc::Sender<M>, stop: StopSignal);
}

/// Cancellation signal observed by running subscriptions.
#[derive(Clone)]
pub struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    pub(crate) fn new() -> (Self, StopTrigger) {
        let inner = Arc::new((Mutex::new(false), Condvar::new()));
        (
            Self {
                inner: inner.clone(),
            },
            StopTrigger { inner },
        )
    }

    /// Whether the owner has requested a stop.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        let (lock, _) = &*self.inner;
        *lock.lock().unwrap()
    }

    /// Block until stopped or the timeout elapses. Returns `true` when
    /// stopped. Loops on the condvar to absorb spurious wakeups.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let mut stopped = lock.lock().unwrap();
        if *stopped {
            return true;
        }

        let start = std::time::Instant::now();
        let mut remaining = duration;
        loop {
            let (guard, result) = cvar.wait_timeout(stopped, remaining).unwrap();
            stopped = guard;
            if *stopped {
                return true;
            }
            if result.timed_out() {
                return false;
            }
            let elapsed = start.elapsed();
            if elapsed >= duration {
                return false;
            }
            remaining = duration - elapsed;
        }
    }
}

/// Owner-side handle that fires the matching [`StopSignal`].
pub(crate) struct StopTrigger {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopTrigger {
    pub(crate) fn stop(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock().unwrap() = true;
        cvar.notify_all();
    }
}

struct RunningSubscription {
    id: SubId,
    trigger: StopTrigger,
    thread: Option<thread::JoinHandle<()>>,
}

impl RunningSubscription {
    fn stop(mut self) {
        self.trigger.stop();
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RunningSubscription {
    fn drop(&mut self) {
        // Signal without joining; joining in drop could block the owner.
        self.trigger.stop();
    }
}

/// Starts, deduplicates, and stops timer subscriptions for one owner.
pub struct SubscriptionManager<M: Send + 'static> {
    active: Vec<RunningSubscription>,
    sender: mpsc::Sender<M>,
    receiver: mpsc::Receiver<M>,
}

impl<M: Send + 'static> SubscriptionManager<M> {
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            active: Vec::new(),
            sender,
            receiver,
        }
    }

    /// Bring the running set in line with the declared set: start ids not
    /// yet running, stop ids no longer declared, leave the rest alone.
    pub fn reconcile(&mut self, subscriptions: Vec<Box<dyn Subscription<M>>>) {
        let declared: HashSet<SubId> = subscriptions.iter().map(|s| s.id()).collect();

        let mut kept = Vec::new();
        for running in self.active.drain(..) {
            if declared.contains(&running.id) {
                kept.push(running);
            } else {
                debug!(sub_id = running.id, "stopping subscription");
                running.stop();
            }
        }
        self.active = kept;

        let mut running_ids: HashSet<SubId> = self.active.iter().map(|r| r.id).collect();
        for sub in subscriptions {
            let id = sub.id();
            if !running_ids.insert(id) {
                continue;
            }
            debug!(sub_id = id, "starting subscription");
            let (signal, trigger) = StopSignal::new();
            let sender = self.sender.clone();
            let thread = thread::spawn(move || sub.run(sender, signal));
            self.active.push(RunningSubscription {
                id,
                trigger,
                thread: Some(thread),
            });
        }
    }

    /// Drain every pending message, in arrival order.
    pub fn drain(&self) -> Vec<M> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.receiver.try_recv() {
            messages.push(msg);
        }
        messages
    }

    /// Number of running subscriptions.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Stop everything and join the timer threads.
    pub fn stop_all(&mut self) {
        for running in self.active.drain(..) {
            running.stop();
        }
        trace!("all subscriptions stopped");
    }
}

impl<M: Send + 'static> Default for SubscriptionManager<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Send + 'static> Drop for SubscriptionManager<M> {
    fn drop(&mut self) {
        self.stop_all();
    }
}

// --- Built-in timer subscriptions ---

/// Fires a message at a fixed interval, e.g. the 50ms progress tick.
pub struct Interval<M: Send + 'static> {
    id: SubId,
    period: Duration,
    make_msg: Box<dyn Fn() -> M + Send + Sync>,
}

impl<M: Send + 'static> Interval<M> {
    /// Tick subscription with an id derived from the period.
    pub fn new(period: Duration, make_msg: impl Fn() -> M + Send + Sync + 'static) -> Self {
        let id = period.as_nanos() as u64 ^ 0x4C41_5A59; // "LAZY"
        Self::with_id(id, period, make_msg)
    }

    /// Tick subscription with an explicit id.
    pub fn with_id(
        id: SubId,
        period: Duration,
        make_msg: impl Fn() -> M + Send + Sync + 'static,
    ) -> Self {
        Self {
            id,
            period,
            make_msg: Box::new(make_msg),
        }
    }
}

impl<M: Send + 'static> Subscription<M> for Interval<M> {
    fn id(&self) -> SubId {
        self.id
    }

    fn run(&self, sender: mpsc::Sender<M>, stop: StopSignal) {
        loop {
            if stop.wait_timeout(self.period) {
                break;
            }
            if sender.send((self.make_msg)()).is_err() {
                break;
            }
        }
    }
}

/// Fires a single message after a delay, e.g. the reveal transition.
pub struct Delay<M: Send + 'static> {
    id: SubId,
    delay: Duration,
    make_msg: Box<dyn Fn() -> M + Send + Sync>,
}

impl<M: Send + 'static> Delay<M> {
    /// One-shot subscription with an explicit id.
    pub fn with_id(
        id: SubId,
        delay: Duration,
        make_msg: impl Fn() -> M + Send + Sync + 'static,
    ) -> Self {
        Self {
            id,
            delay,
            make_msg: Box::new(make_msg),
        }
    }
}

impl<M: Send + 'static> Subscription<M> for Delay<M> {
    fn id(&self) -> SubId {
        self.id
    }

    fn run(&self, sender: mpsc::Sender<M>, stop: StopSignal) {
        if stop.wait_timeout(self.delay) {
            return;
        }
        let _ = sender.send((self.make_msg)());
    }
}

/// Sends queued messages immediately; for tests.
pub struct MockSubscription<M: Send + 'static> {
    id: SubId,
    messages: Vec<M>,
}

impl<M: Send + Clone + 'static> MockSubscription<M> {
    #[must_use]
    pub fn new(id: SubId, messages: Vec<M>) -> Self {
        Self { id, messages }
    }
}

impl<M: Send + Clone + 'static> Subscription<M> for MockSubscription<M> {
    fn id(&self) -> SubId {
        self.id
    }

    fn run(&self, sender: mpsc::Sender<M>, _stop: StopSignal) {
        for msg in &self.messages {
            if sender.send(msg.clone()).is_err() {
                break;
            }
        }
    }
}
