//! Deterministic test and simulation doubles.
//!
//! `SimBus` is a shared-handle pin recorder with a manually-advanced
//! microsecond counter; `ScriptedAxis` is a settable spindle count;
//! `SimClock` makes the runner's sleeps advance the sim counter instead of
//! the wall clock. All three are `Clone` handles over shared cells so a test
//! (or the CLI's sim backend) can keep a handle while the controller owns
//! the other.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use els_traits::clock::Clock;
use els_traits::{LeadAxis, StepDirBus};

/// One recorded step-pin transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// Counter value when the transition was written.
    pub at_us: u32,
    /// Level after the transition (`true` = rising edge).
    pub step_high: bool,
    /// Direction pin level at the time of the transition.
    pub dir_right: bool,
}

#[derive(Debug, Default)]
struct SimBusInner {
    micros: u32,
    step_high: bool,
    dir_right: bool,
    edges: Vec<Edge>,
    dir_writes: u32,
    dir_changes: Vec<u32>,
}

/// Simulated step/dir bus with a scripted microsecond counter.
#[derive(Debug, Clone, Default)]
pub struct SimBus {
    inner: Rc<RefCell<SimBusInner>>,
}

impl SimBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the microsecond counter (wrapping, as real timers do).
    pub fn advance(&self, us: u32) {
        let mut inner = self.inner.borrow_mut();
        inner.micros = inner.micros.wrapping_add(us);
    }

    pub fn step_level(&self) -> bool {
        self.inner.borrow().step_high
    }

    pub fn dir_level(&self) -> bool {
        self.inner.borrow().dir_right
    }

    /// All step-pin transitions recorded so far.
    pub fn edges(&self) -> Vec<Edge> {
        self.inner.borrow().edges.clone()
    }

    /// Completed pulses (falling edges).
    pub fn pulses(&self) -> usize {
        self.inner
            .borrow()
            .edges
            .iter()
            .filter(|e| !e.step_high)
            .count()
    }

    /// How many times the direction pin has been written.
    pub fn dir_writes(&self) -> u32 {
        self.inner.borrow().dir_writes
    }

    /// Counter values at which the direction pin changed level.
    pub fn dir_changes(&self) -> Vec<u32> {
        self.inner.borrow().dir_changes.clone()
    }
}

impl StepDirBus for SimBus {
    fn read_step_pin(&self) -> bool {
        self.inner.borrow().step_high
    }

    fn write_step_pin(&mut self, high: bool) {
        let mut inner = self.inner.borrow_mut();
        if inner.step_high != high {
            let edge = Edge {
                at_us: inner.micros,
                step_high: high,
                dir_right: inner.dir_right,
            };
            inner.edges.push(edge);
        }
        inner.step_high = high;
    }

    fn write_dir_pin(&mut self, right: bool) {
        let mut inner = self.inner.borrow_mut();
        if inner.dir_right != right {
            let at = inner.micros;
            inner.dir_changes.push(at);
        }
        inner.dir_right = right;
        inner.dir_writes += 1;
    }

    fn micros(&self) -> u32 {
        self.inner.borrow().micros
    }
}

/// Settable spindle position.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAxis {
    position: Rc<Cell<i32>>,
}

impl ScriptedAxis {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, position: i32) {
        self.position.set(position);
    }

    pub fn advance(&self, counts: i32) {
        self.position.set(self.position.get().wrapping_add(counts));
    }

    pub fn get(&self) -> i32 {
        self.position.get()
    }
}

impl LeadAxis for ScriptedAxis {
    fn current_position(&self) -> i32 {
        self.position.get()
    }
}

/// Clock whose sleeps advance a [`SimBus`] counter instead of blocking.
#[derive(Debug, Clone)]
pub struct SimClock {
    bus: SimBus,
}

impl SimClock {
    pub fn new(bus: SimBus) -> Self {
        Self { bus }
    }
}

impl Clock for SimClock {
    fn sleep_us(&self, us: u64) {
        self.bus.advance(us.min(u64::from(u32::MAX)) as u32);
    }
}
