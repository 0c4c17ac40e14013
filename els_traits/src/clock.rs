//! Pacing clock for the tick driver.
//!
//! The runner sleeps one tick period between `update()` calls through this
//! trait so tests can substitute a virtual clock and run wall-clock-free.

use std::time::Duration;

pub trait Clock {
    /// Sleep for (at least) the given number of microseconds.
    fn sleep_us(&self, us: u64);
}

/// Host clock backed by `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    fn sleep_us(&self, us: u64) {
        std::thread::sleep(Duration::from_micros(us));
    }
}

impl<T: Clock + ?Sized> Clock for Box<T> {
    fn sleep_us(&self, us: u64) {
        (**self).sleep_us(us)
    }
}

impl<T: Clock + ?Sized> Clock for &T {
    fn sleep_us(&self, us: u64) {
        (**self).sleep_us(us)
    }
}
