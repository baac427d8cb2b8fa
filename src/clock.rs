/// Wall-clock source for the store, replaceable in tests.
use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, Duration, Local};

use crate::timeutil::truncate_millis;

pub trait Clock {
    fn now(&self) -> DateTime<Local>;
}

/// Local time truncated to milliseconds, the precision the blob stores.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        truncate_millis(Local::now())
    }
}

/// A clock that only moves when told to. Clones share the same instant.
#[derive(Clone)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<Local>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, to: DateTime<Local>) {
        self.now.set(to);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        self.now.get()
    }
}
