//! Cancellable timers
//!
//! Every scheduled action returns a `TimerHandle`. A fired timer is delivered
//! together with its handle so the owner can tell a live timer from one it has
//! already cancelled or replaced.
//!
//! `SimulatedClock` keeps a virtual clock and an ordered queue; nothing fires
//! until the owner advances it. `TokioScheduler` runs each timer as a tokio
//! task that sleeps and then sends on a channel.

use std::collections::BTreeMap;
use std::time::Duration;

use ahash::AHashMap;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::Instant;

use crate::battle::answer::AnswerResult;
use crate::core::types::{Millis, RoundNumber};

/// Identity of one scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// What a timer delivers when it fires
#[derive(Debug, Clone, PartialEq)]
pub enum TimerEvent {
    /// The simulated opponent's answer for `round`
    OpponentAnswered { round: RoundNumber, result: AnswerResult },
    /// The answer window for `round` closed
    RoundTimeout { round: RoundNumber },
    /// The pause after `round` is over; issue the next question
    NextRound { round: RoundNumber },
}

impl TimerEvent {
    pub fn round(&self) -> RoundNumber {
        match self {
            TimerEvent::OpponentAnswered { round, .. }
            | TimerEvent::RoundTimeout { round }
            | TimerEvent::NextRound { round } => *round,
        }
    }
}

/// A timer that went off
pub type FiredTimer = (TimerHandle, TimerEvent);

pub trait Scheduler: Send {
    /// Milliseconds since this scheduler was created
    fn now(&self) -> Millis;

    /// Deliver `event` after `delay_ms`
    fn schedule(&mut self, delay_ms: Millis, event: TimerEvent) -> TimerHandle;

    /// Stop a pending timer; unknown or already-fired handles are a no-op
    fn cancel(&mut self, handle: TimerHandle);
}

/// Holder for at most one live timer of a category
#[derive(Debug, Default)]
pub struct TimerSlot {
    handle: Option<TimerHandle>,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `event`, cancelling whatever this slot held before
    pub fn arm<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S, delay_ms: Millis, event: TimerEvent) {
        self.cancel(scheduler);
        self.handle = Some(scheduler.schedule(delay_ms, event));
    }

    pub fn cancel<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) {
        if let Some(handle) = self.handle.take() {
            scheduler.cancel(handle);
        }
    }

    /// Accept a fired timer if it is the one this slot is waiting for
    ///
    /// Clears the slot on a match; stale handles leave it untouched.
    pub fn claim(&mut self, handle: TimerHandle) -> bool {
        if self.handle == Some(handle) {
            self.handle = None;
            true
        } else {
            false
        }
    }

    pub fn is_armed(&self) -> bool {
        self.handle.is_some()
    }
}

/// Virtual clock for deterministic tests and headless simulation
#[derive(Debug, Default)]
pub struct SimulatedClock {
    now: Millis,
    next_id: u64,
    queue: BTreeMap<(Millis, u64), TimerEvent>,
    deadlines: AHashMap<u64, Millis>,
}

impl SimulatedClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Millis> {
        self.queue.keys().next().map(|&(at, _)| at)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Remove and return the earliest timer due at or before `until`
    ///
    /// Moves the clock to that timer's deadline. Timers with equal deadlines
    /// fire in scheduling order.
    pub fn pop_due(&mut self, until: Millis) -> Option<FiredTimer> {
        let (&(at, id), _) = self.queue.iter().next()?;
        if at > until {
            return None;
        }
        let event = self.queue.remove(&(at, id))?;
        self.deadlines.remove(&id);
        self.now = self.now.max(at);
        Some((TimerHandle(id), event))
    }

    /// Move the clock forward without firing anything; never goes backwards
    pub fn set_now(&mut self, at: Millis) {
        self.now = self.now.max(at);
    }
}

impl Scheduler for SimulatedClock {
    fn now(&self) -> Millis {
        self.now
    }

    fn schedule(&mut self, delay_ms: Millis, event: TimerEvent) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        let at = self.now.saturating_add(delay_ms);
        self.queue.insert((at, id), event);
        self.deadlines.insert(id, at);
        TimerHandle(id)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(at) = self.deadlines.remove(&handle.0) {
            self.queue.remove(&(at, handle.0));
        }
    }
}

/// Real-time scheduler backed by tokio tasks
///
/// Must be used from within a tokio runtime. Dropping it aborts every timer
/// still pending.
pub struct TokioScheduler {
    origin: Instant,
    next_id: u64,
    fired: mpsc::UnboundedSender<FiredTimer>,
    tasks: AHashMap<u64, AbortHandle>,
}

impl TokioScheduler {
    pub fn new(fired: mpsc::UnboundedSender<FiredTimer>) -> Self {
        Self {
            origin: Instant::now(),
            next_id: 0,
            fired,
            tasks: AHashMap::new(),
        }
    }

    /// Timers scheduled and not yet finished or cancelled
    pub fn pending(&self) -> usize {
        self.tasks.values().filter(|t| !t.is_finished()).count()
    }
}

impl Scheduler for TokioScheduler {
    fn now(&self) -> Millis {
        self.origin.elapsed().as_millis() as Millis
    }

    fn schedule(&mut self, delay_ms: Millis, event: TimerEvent) -> TimerHandle {
        self.tasks.retain(|_, task| !task.is_finished());

        let id = self.next_id;
        self.next_id += 1;
        let handle = TimerHandle(id);
        let fired = self.fired.clone();

        let task = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            // Receiver gone means the match is over
            let _ = fired.send((handle, event));
        });
        self.tasks.insert(id, task.abort_handle());
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(task) = self.tasks.remove(&handle.0) {
            task.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeout(round: RoundNumber) -> TimerEvent {
        TimerEvent::RoundTimeout { round }
    }

    #[test]
    fn test_simulated_clock_fires_in_deadline_order() {
        let mut clock = SimulatedClock::new();
        let late = clock.schedule(3000, timeout(1));
        let early = clock.schedule(1000, timeout(2));

        assert_eq!(clock.next_deadline(), Some(1000));
        assert_eq!(clock.pop_due(5000), Some((early, timeout(2))));
        assert_eq!(clock.now(), 1000);
        assert_eq!(clock.pop_due(5000), Some((late, timeout(1))));
        assert_eq!(clock.now(), 3000);
        assert_eq!(clock.pop_due(5000), None);
    }

    #[test]
    fn test_equal_deadlines_fire_in_schedule_order() {
        let mut clock = SimulatedClock::new();
        let first = clock.schedule(500, timeout(1));
        let second = clock.schedule(500, timeout(2));

        assert_eq!(clock.pop_due(500).map(|(h, _)| h), Some(first));
        assert_eq!(clock.pop_due(500).map(|(h, _)| h), Some(second));
    }

    #[test]
    fn test_nothing_fires_before_deadline() {
        let mut clock = SimulatedClock::new();
        clock.schedule(1000, timeout(1));
        assert_eq!(clock.pop_due(999), None);
        assert_eq!(clock.now(), 0);
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let mut clock = SimulatedClock::new();
        let handle = clock.schedule(1000, timeout(1));
        clock.cancel(handle);
        // Second cancel is a no-op
        clock.cancel(handle);

        assert_eq!(clock.pending(), 0);
        assert_eq!(clock.pop_due(10_000), None);
    }

    #[test]
    fn test_schedule_is_relative_to_now() {
        let mut clock = SimulatedClock::new();
        clock.set_now(4000);
        clock.schedule(1000, timeout(1));
        assert_eq!(clock.next_deadline(), Some(5000));

        clock.set_now(100);
        assert_eq!(clock.now(), 4000, "clock never runs backwards");
    }

    #[test]
    fn test_huge_delay_saturates() {
        let mut clock = SimulatedClock::new();
        clock.set_now(4000);
        clock.schedule(u64::MAX, timeout(1));
        assert_eq!(clock.next_deadline(), Some(u64::MAX));
    }

    #[test]
    fn test_slot_rearm_cancels_previous() {
        let mut clock = SimulatedClock::new();
        let mut slot = TimerSlot::new();

        slot.arm(&mut clock, 1000, timeout(1));
        slot.arm(&mut clock, 2000, timeout(2));
        assert_eq!(clock.pending(), 1);

        let (handle, event) = clock.pop_due(10_000).unwrap();
        assert_eq!(event, timeout(2));
        assert!(slot.claim(handle));
        assert!(!slot.is_armed());
    }

    #[test]
    fn test_slot_rejects_stale_handle() {
        let mut clock = SimulatedClock::new();
        let mut slot = TimerSlot::new();
        let stale = clock.schedule(10, timeout(1));

        slot.arm(&mut clock, 1000, timeout(2));
        assert!(!slot.claim(stale));
        assert!(slot.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_scheduler_delivers_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = TokioScheduler::new(tx);

        let handle = scheduler.schedule(1500, timeout(1));
        let (fired, event) = rx.recv().await.unwrap();

        assert_eq!(fired, handle);
        assert_eq!(event, timeout(1));
        assert_eq!(scheduler.now(), 1500);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_scheduler_cancel_aborts() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = TokioScheduler::new(tx);

        let cancelled = scheduler.schedule(1000, timeout(1));
        let kept = scheduler.schedule(2000, timeout(2));
        scheduler.cancel(cancelled);

        let (fired, _) = rx.recv().await.unwrap();
        assert_eq!(fired, kept);
    }
}
