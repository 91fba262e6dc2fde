//! Single-threaded periodic task scheduler
//!
//! Tasks run to completion on the caller's thread. A task that is overdue by
//! several periods fires once per elapsed period, in due-time order, with
//! ties broken by registration order.

use crate::source::clock::Clock;
use crate::validation::ScheduleError;
use std::cell::Cell;
use std::rc::Rc;

/// Task body, called with the scheduled due time (milliseconds)
pub type TaskCallback = Box<dyn FnMut(u64)>;

/// Cancellation handle for a scheduled task
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: u32,
    cancelled: Rc<Cell<bool>>,
}

impl TaskHandle {
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Stop the task; it will not fire again
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

struct ScheduledTask {
    id: u32,
    interval_ms: u64,
    next_due_ms: u64,
    fired: u64,
    cancelled: Rc<Cell<bool>>,
    callback: TaskCallback,
}

pub struct Scheduler<C: Clock> {
    clock: C,
    tasks: Vec<ScheduledTask>,
    next_id: u32,
}

impl<C: Clock> Scheduler<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            tasks: Vec::new(),
            next_id: 0,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Run `callback` every `interval_ms`, first one interval from now
    pub fn schedule_every(&mut self, interval_ms: u64, callback: TaskCallback) -> Result<TaskHandle, ScheduleError> {
        if interval_ms == 0 {
            return Err(ScheduleError::InvalidInterval { interval_ms });
        }

        self.next_id += 1;
        let cancelled = Rc::new(Cell::new(false));
        self.tasks.push(ScheduledTask {
            id: self.next_id,
            interval_ms,
            next_due_ms: self.clock.now_ms().saturating_add(interval_ms),
            fired: 0,
            cancelled: Rc::clone(&cancelled),
            callback,
        });
        log::debug!("Scheduled task {} every {} ms", self.next_id, interval_ms);

        Ok(TaskHandle {
            id: self.next_id,
            cancelled,
        })
    }

    /// Cancel a task and drop it from the queue
    pub fn cancel(&mut self, handle: &TaskHandle) -> Result<(), ScheduleError> {
        let index = self
            .tasks
            .iter()
            .position(|task| task.id == handle.id)
            .ok_or(ScheduleError::UnknownTask { id: handle.id })?;
        handle.cancel();
        self.tasks.remove(index);
        Ok(())
    }

    /// Number of tasks that can still fire
    pub fn active_tasks(&self) -> usize {
        self.tasks.iter().filter(|task| !task.cancelled.get()).count()
    }

    /// Times a task has fired, `None` once it has been removed
    pub fn fire_count(&self, handle: &TaskHandle) -> Option<u64> {
        self.tasks.iter().find(|task| task.id == handle.id).map(|task| task.fired)
    }

    /// Earliest due time among live tasks
    pub fn next_due_ms(&self) -> Option<u64> {
        self.tasks
            .iter()
            .filter(|task| !task.cancelled.get())
            .map(|task| task.next_due_ms)
            .min()
    }

    /// Fire every task due at the current clock time, returning how many ran
    pub fn run_pending(&mut self) -> usize {
        self.fire_due(usize::MAX)
    }

    /// Fire due tasks in due order, stopping after `limit` firings
    fn fire_due(&mut self, limit: usize) -> usize {
        let now = self.clock.now_ms();
        let mut fired = 0;

        while fired < limit {
            self.tasks.retain(|task| !task.cancelled.get());

            let next = self
                .tasks
                .iter_mut()
                .filter(|task| task.next_due_ms <= now)
                .min_by_key(|task| (task.next_due_ms, task.id));

            let task = match next {
                Some(task) => task,
                None => break,
            };

            let due = task.next_due_ms;
            task.next_due_ms = due.saturating_add(task.interval_ms);
            task.fired += 1;
            log::trace!("Task {} firing (due {} ms, now {} ms)", task.id, due, now);
            (task.callback)(due);
            fired += 1;
        }

        fired
    }

    /// Advance the clock to `deadline_ms`, firing tasks along the way
    pub fn run_until(&mut self, deadline_ms: u64) -> usize {
        let mut fired = 0;
        while let Some(next) = self.next_due_ms() {
            if next > deadline_ms {
                break;
            }
            self.clock.sleep_until(next);
            fired += self.run_pending();
        }
        self.clock.sleep_until(deadline_ms);
        fired
    }

    /// Keep firing tasks until `max_firings` is reached or no task is left
    ///
    /// Never fires more than `max_firings`, even when catching up.
    pub fn run(&mut self, max_firings: Option<u64>) -> u64 {
        let mut fired = 0u64;
        loop {
            let remaining = match max_firings {
                Some(max) if fired >= max => break,
                Some(max) => usize::try_from(max - fired).unwrap_or(usize::MAX),
                None => usize::MAX,
            };
            let next = match self.next_due_ms() {
                Some(next) => next,
                None => break,
            };
            self.clock.sleep_until(next);
            fired += self.fire_due(remaining) as u64;
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::clock::VirtualClock;
    use std::cell::RefCell;

    fn recorder() -> (Rc<RefCell<Vec<(u32, u64)>>>, impl Fn(u32) -> TaskCallback) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let shared = Rc::clone(&log);
        let make = move |tag: u32| -> TaskCallback {
            let log = Rc::clone(&shared);
            Box::new(move |due| log.borrow_mut().push((tag, due)))
        };
        (log, make)
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut scheduler = Scheduler::new(VirtualClock::new());
        let result = scheduler.schedule_every(0, Box::new(|_| {}));
        assert_eq!(result.unwrap_err(), ScheduleError::InvalidInterval { interval_ms: 0 });
    }

    #[test]
    fn test_fires_once_per_period() {
        let clock = VirtualClock::new();
        let mut scheduler = Scheduler::new(clock.clone());
        let (log, make) = recorder();
        let handle = scheduler.schedule_every(1000, make(1)).unwrap();

        assert_eq!(scheduler.run_pending(), 0);
        assert_eq!(scheduler.run_until(3500), 3);
        assert_eq!(clock.now_ms(), 3500);
        assert_eq!(*log.borrow(), vec![(1, 1000), (1, 2000), (1, 3000)]);
        assert_eq!(scheduler.fire_count(&handle), Some(3));
    }

    #[test]
    fn test_overdue_task_catches_up() {
        let clock = VirtualClock::new();
        let mut scheduler = Scheduler::new(clock.clone());
        let (log, make) = recorder();
        scheduler.schedule_every(1000, make(1)).unwrap();

        clock.advance(5000);
        assert_eq!(scheduler.run_pending(), 5);
        assert_eq!(log.borrow().last(), Some(&(1, 5000)));
    }

    #[test]
    fn test_interleaved_tasks_in_due_order() {
        let clock = VirtualClock::new();
        let mut scheduler = Scheduler::new(clock.clone());
        let (log, make) = recorder();
        scheduler.schedule_every(1000, make(1)).unwrap();
        scheduler.schedule_every(400, make(2)).unwrap();

        scheduler.run_until(1200);
        assert_eq!(*log.borrow(), vec![(2, 400), (2, 800), (1, 1000), (2, 1200)]);
    }

    #[test]
    fn test_cancelled_task_never_fires() {
        let clock = VirtualClock::new();
        let mut scheduler = Scheduler::new(clock.clone());
        let (log, make) = recorder();
        let handle = scheduler.schedule_every(1000, make(1)).unwrap();

        scheduler.run_until(2000);
        handle.cancel();
        assert!(handle.is_cancelled());
        assert_eq!(scheduler.active_tasks(), 0);

        scheduler.run_until(10_000);
        assert_eq!(log.borrow().len(), 2);
        assert_eq!(scheduler.next_due_ms(), None);
    }

    #[test]
    fn test_cancel_through_scheduler() {
        let mut scheduler = Scheduler::new(VirtualClock::new());
        let handle = scheduler.schedule_every(1000, Box::new(|_| {})).unwrap();
        scheduler.cancel(&handle).unwrap();
        assert!(handle.is_cancelled());
        assert_eq!(scheduler.cancel(&handle), Err(ScheduleError::UnknownTask { id: handle.id() }));
    }

    #[test]
    fn test_task_can_cancel_itself() {
        let clock = VirtualClock::new();
        let mut scheduler = Scheduler::new(clock);
        let slot: Rc<RefCell<Option<TaskHandle>>> = Rc::new(RefCell::new(None));
        let count = Rc::new(Cell::new(0));

        let inner_slot = Rc::clone(&slot);
        let inner_count = Rc::clone(&count);
        let handle = scheduler
            .schedule_every(
                100,
                Box::new(move |_| {
                    inner_count.set(inner_count.get() + 1);
                    if inner_count.get() == 2 {
                        if let Some(handle) = inner_slot.borrow().as_ref() {
                            handle.cancel();
                        }
                    }
                }),
            )
            .unwrap();
        *slot.borrow_mut() = Some(handle);

        scheduler.run_until(1000);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_run_bounded_by_firings() {
        let clock = VirtualClock::new();
        let mut scheduler = Scheduler::new(clock.clone());
        let (log, make) = recorder();
        scheduler.schedule_every(1000, make(1)).unwrap();

        assert_eq!(scheduler.run(Some(4)), 4);
        assert_eq!(clock.now_ms(), 4000);
        assert_eq!(log.borrow().len(), 4);
    }

    #[test]
    fn test_run_bound_holds_while_catching_up() {
        let clock = VirtualClock::new();
        let mut scheduler = Scheduler::new(clock.clone());
        let (log, make) = recorder();
        let handle = scheduler.schedule_every(1000, make(1)).unwrap();

        // stalled for five periods
        clock.advance(5000);
        assert_eq!(scheduler.run(Some(2)), 2);
        assert_eq!(*log.borrow(), vec![(1, 1000), (1, 2000)]);
        assert_eq!(scheduler.next_due_ms(), Some(3000));

        // the rest is still owed
        assert_eq!(scheduler.run_pending(), 3);
        assert_eq!(scheduler.fire_count(&handle), Some(5));
    }
}
