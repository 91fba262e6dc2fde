//! Simulated position source
//!
//! Emits one fix per interval along a straight diagonal trajectory while the
//! heading turns slowly. Subscribers are push-notified in subscription order.

use crate::core::{Fix, GeoCoordinate};
use crate::source::clock::Clock;
use crate::source::scheduler::{Scheduler, TaskHandle};
use crate::utils::config::SourceConfig;
use crate::validation::{ScheduleError, SourceError};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

/// Subscriber callback for new fixes
pub type FixCallback = Box<dyn FnMut(&Fix)>;

/// Subscription registration handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionHandle(u32);

impl SubscriptionHandle {
    pub fn id(&self) -> u32 {
        self.0
    }
}

/// Deterministic trajectory generator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedTrajectory {
    origin: GeoCoordinate,
    step_deg: f64,
    heading_divisor: f64,
}

impl SimulatedTrajectory {
    pub fn new(config: &SourceConfig) -> Self {
        Self {
            origin: config.origin,
            step_deg: config.step_deg,
            heading_divisor: config.heading_divisor,
        }
    }

    /// Fix for counter value `t`
    pub fn fix_at(&self, t: u64, timestamp_ms: u64) -> Fix {
        let t_f = t as f64;
        Fix {
            lat: self.origin.lat + t_f * self.step_deg,
            lon: self.origin.lon + t_f * self.step_deg,
            heading: (t_f / self.heading_divisor).rem_euclid(360.0),
            sequence: t,
            timestamp_ms,
        }
    }
}

impl Default for SimulatedTrajectory {
    fn default() -> Self {
        Self::new(&SourceConfig::default())
    }
}

struct SourceState {
    trajectory: SimulatedTrajectory,
    counter: u64,
    next_subscription: u32,
    subscribers: BTreeMap<SubscriptionHandle, FixCallback>,
    /// Subscribers taken out for the emission in progress
    in_flight: BTreeSet<SubscriptionHandle>,
    pending_removals: BTreeSet<SubscriptionHandle>,
}

/// Push-style fix emitter
///
/// Cloning yields another handle onto the same source, which is how the
/// scheduled emission task shares it with the owner.
#[derive(Clone)]
pub struct PositionSource {
    state: Rc<RefCell<SourceState>>,
    interval_ms: u64,
}

impl PositionSource {
    pub fn new(config: &SourceConfig) -> Self {
        Self {
            state: Rc::new(RefCell::new(SourceState {
                trajectory: SimulatedTrajectory::new(config),
                counter: 0,
                next_subscription: 0,
                subscribers: BTreeMap::new(),
                in_flight: BTreeSet::new(),
                pending_removals: BTreeSet::new(),
            })),
            interval_ms: config.interval_ms,
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Register a subscriber; it receives every fix emitted from now on
    pub fn subscribe(&self, callback: FixCallback) -> SubscriptionHandle {
        let mut state = self.state.borrow_mut();
        state.next_subscription += 1;
        let handle = SubscriptionHandle(state.next_subscription);
        state.subscribers.insert(handle, callback);
        log::debug!("Position subscriber {} registered", handle.id());
        handle
    }

    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> Result<(), SourceError> {
        let mut state = self.state.borrow_mut();
        if state.subscribers.remove(&handle).is_some() {
            return Ok(());
        }
        if state.in_flight.contains(&handle) && state.pending_removals.insert(handle) {
            return Ok(());
        }
        Err(SourceError::UnknownSubscription { id: handle.id() })
    }

    pub fn subscriber_count(&self) -> usize {
        let state = self.state.borrow();
        state.subscribers.len() + state.in_flight.len() - state.pending_removals.len()
    }

    /// Emit fixes on the scheduler every `interval_ms`
    pub fn start<C: Clock>(&self, scheduler: &mut Scheduler<C>) -> Result<TaskHandle, ScheduleError> {
        let source = self.clone();
        let handle = scheduler.schedule_every(
            self.interval_ms,
            Box::new(move |due_ms| {
                source.emit_next(due_ms);
            }),
        )?;
        log::info!("Position source started, one fix every {} ms", self.interval_ms);
        Ok(handle)
    }

    /// Produce the next fix and deliver it to every subscriber
    pub fn emit_next(&self, timestamp_ms: u64) -> Fix {
        let (fix, mut subscribers) = {
            let mut state = self.state.borrow_mut();
            let fix = state.trajectory.fix_at(state.counter, timestamp_ms);
            state.counter += 1;
            let subscribers = std::mem::take(&mut state.subscribers);
            state.in_flight = subscribers.keys().copied().collect();
            (fix, subscribers)
        };

        log::trace!(
            "Fix {}: lat {:.6} lon {:.6} heading {:.1}",
            fix.sequence,
            fix.lat,
            fix.lon,
            fix.heading
        );

        for (handle, callback) in subscribers.iter_mut() {
            if self.state.borrow().pending_removals.contains(handle) {
                continue;
            }
            callback(&fix);
        }

        let mut state = self.state.borrow_mut();
        let removals = std::mem::take(&mut state.pending_removals);
        subscribers.retain(|handle, _| !removals.contains(handle));
        // Subscribers registered during delivery have higher ids
        let added = std::mem::take(&mut state.subscribers);
        subscribers.extend(added);
        state.subscribers = subscribers;
        state.in_flight.clear();

        fix
    }
}
