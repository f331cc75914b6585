//! Source of the current date and time

use chrono::{Local, NaiveDateTime, TimeDelta};
use parking_lot::Mutex;

/// Tells the local date and time
pub trait Clock: Send + Sync {
    /// The current local date and time
    fn now(&self) -> NaiveDateTime;
}

/// The system's wall clock in the local time zone
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock(Mutex<NaiveDateTime>);

impl ManualClock {
    /// Create a clock standing at `at`
    pub fn new(at: NaiveDateTime) -> Self {
        Self(Mutex::new(at))
    }

    /// Move the clock to `at`
    pub fn set(&self, at: NaiveDateTime) {
        *self.0.lock() = at;
    }

    /// Move the clock forward by `delta`
    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.0.lock();
        *now += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.0.lock()
    }
}
