//! Cooperative recurring-trigger registry.
//!
//! RULES:
//!   - Single-threaded. The host pumps `poll(now)`; nothing runs on its own.
//!   - A due task fires at most once per poll, however many intervals
//!     were missed. Missed fires are coalesced, never replayed.
//!   - A fired task is always re-armed at `now + interval`.
//!   - Cancellation is total: a cancelled task never fires again.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

#[derive(Debug, Clone)]
struct Task {
    interval: Duration,
    armed_at: DateTime<Utc>,
    due:      DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    next_id: u64,
    // BTreeMap keeps registration order for poll().
    tasks:   BTreeMap<TaskId, Task>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a recurring task. First fire is due at `now + interval`.
    pub fn schedule_repeating(&mut self, interval: Duration, now: DateTime<Utc>) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.insert(id, Task { interval, armed_at: now, due: due_after(now, interval) });
        log::debug!("scheduler: task {} armed every {}s", id.0, interval.num_seconds());
        id
    }

    /// Remove a task. Returns false if it was not registered.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let removed = self.tasks.remove(&id).is_some();
        if removed {
            log::debug!("scheduler: task {} cancelled", id.0);
        }
        removed
    }

    pub fn is_scheduled(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Collect every task due at `now`, re-arming each one.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Vec<TaskId> {
        let mut fired = Vec::new();
        for (id, task) in self.tasks.iter_mut() {
            if now < task.armed_at {
                // Clock moved backwards: restart the countdown from here.
                log::warn!("scheduler: clock moved backwards, re-arming task {}", id.0);
                task.armed_at = now;
                task.due = due_after(now, task.interval);
                continue;
            }
            if now >= task.due {
                task.armed_at = now;
                task.due = due_after(now, task.interval);
                fired.push(*id);
            }
        }
        fired
    }
}

/// `now + interval`, pinned to the far end of the calendar on overflow.
fn due_after(now: DateTime<Utc>, interval: Duration) -> DateTime<Utc> {
    now.checked_add_signed(interval).unwrap_or_else(|| {
        log::warn!("scheduler: interval {interval} overflows the calendar, task will not fire");
        DateTime::<Utc>::MAX_UTC
    })
}

/// One engine's handle on the scheduler.
/// Holds at most one live registration.
#[derive(Debug, Default, Clone)]
pub struct RecurringTrigger {
    handle: Option<TaskId>,
}

impl RecurringTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)start the trigger. Any prior registration is cancelled first.
    pub fn arm(&mut self, scheduler: &mut Scheduler, interval: Duration, now: DateTime<Utc>) {
        self.disarm(scheduler);
        self.handle = Some(scheduler.schedule_repeating(interval, now));
    }

    /// Stop the trigger. Safe when never armed.
    pub fn disarm(&mut self, scheduler: &mut Scheduler) {
        if let Some(id) = self.handle.take() {
            scheduler.cancel(id);
        }
    }

    pub fn is_armed(&self) -> bool {
        self.handle.is_some()
    }

    /// Did this trigger's task fire in the given poll result?
    pub fn fired(&self, fired: &[TaskId]) -> bool {
        self.handle.is_some_and(|id| fired.contains(&id))
    }
}
