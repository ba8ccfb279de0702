use std::{
    cell::Cell,
    time::{SystemTime, UNIX_EPOCH},
};

use crate::time::{Delta, Time};

/// A source of the current time, in the same unit as event deadlines.
pub trait Clock {
    fn now(&self) -> Time;
}

/// Wall-clock seconds since the UNIX epoch.
#[derive(Debug, Default, Copy, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Time {
        let secs = match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_secs() as i64,
            Err(e) => -(e.duration().as_secs() as i64),
        };
        Time::new(secs)
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    now: Cell<Time>,
}

impl ManualClock {
    pub fn new(now: Time) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    pub fn set(&self, now: Time) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Delta) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Time {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Time {
        (**self).now()
    }
}
