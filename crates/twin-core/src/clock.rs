//! # Clock: Host Time Primitive
//!
//! The core never calls the wall clock itself. Every mutating operation
//! receives `now` from the host, and hosts obtain it from a [`Clock`].
//!
//! The contract is monotonic and coarse: successive calls never go
//! backwards, and several calls may return the same value.

use parking_lot::Mutex;

use crate::temporal::Timestamp;

/// Source of the current time for one execution unit.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// The current time. Never earlier than a value previously returned.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time, clamped so it never runs backwards.
///
/// If the system clock steps back (NTP correction, VM migration) this clock
/// keeps returning the last value it handed out until real time catches up.
#[derive(Debug, Default)]
pub struct SystemClock {
    last: Mutex<Option<Timestamp>>,
}

impl SystemClock {
    /// Create a system clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// A system clock that never returns anything earlier than `floor`.
    ///
    /// Hosts seed it with the newest timestamp already persisted, so a wall
    /// clock that stepped back across a restart cannot stamp older events.
    pub fn not_before(floor: Timestamp) -> Self {
        Self {
            last: Mutex::new(Some(floor)),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let wall = Timestamp::now();
        let mut last = self.last.lock();
        let next = match *last {
            Some(prev) if prev > wall => prev,
            _ => wall,
        };
        *last = Some(next);
        next
    }
}

/// A clock driven explicitly by its owner.
///
/// Used by tests and by hosts that derive time from an external source
/// (e.g. a block height mapped to seconds).
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<Timestamp>,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    pub fn new(start: Timestamp) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    /// Move the clock forward by `secs` seconds. Negative values are ignored.
    pub fn advance(&self, secs: i64) {
        if secs <= 0 {
            return;
        }
        let mut current = self.current.lock();
        if let Ok(next) = current.checked_add_secs(secs) {
            *current = next;
        }
    }

    /// Set the clock to `ts` if it is not earlier than the current value.
    ///
    /// Returns `false` (and leaves the clock untouched) when `ts` would move
    /// time backwards.
    pub fn set(&self, ts: Timestamp) -> bool {
        let mut current = self.current.lock();
        if ts < *current {
            return false;
        }
        *current = ts;
        true
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.current.lock()
    }
}
