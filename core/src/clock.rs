//! Wall-clock sources.
//!
//! RULE: Engines never read a clock. The host reads one of these and
//! passes `now` into every tick/load call explicitly.

use chrono::{DateTime, Duration, Utc};
use std::cell::Cell;

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// The real system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A settable clock for tests and fast-forward runs.
/// Interior mutability so it can be shared by `&` like a real clock.
#[derive(Debug, Clone)]
pub struct ManualClock {
    current: Cell<DateTime<Utc>>,
}

impl ManualClock {
    pub fn starting_at(at: DateTime<Utc>) -> Self {
        Self { current: Cell::new(at) }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.current.set(at);
    }

    /// Move the clock by `by` (may be negative, to model a clock adjustment).
    pub fn advance(&self, by: Duration) -> DateTime<Utc> {
        let next = self.current.get() + by;
        self.current.set(next);
        next
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.current.get()
    }
}
