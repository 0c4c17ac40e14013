//! Global motion state shared between the tick loop and the UI.
//!
//! The original firmware kept this in a process-wide singleton; here it is a
//! value the tick loop owns and shares by `Arc`. Both fields are single-byte
//! atomics: UI writes land between ticks, readers see a snapshot, and no
//! ordering finer than "visible by the next tick" is promised.

use std::sync::atomic::{AtomicU8, Ordering};

/// Gates what the controller does each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MotionMode {
    /// No physical motion; logical position tracks the spindle exactly.
    Disabled = 0,
    /// Fixed-rate motion toward the expected position.
    Jog = 1,
    /// Ramped ratio tracking.
    Enabled = 2,
}

impl MotionMode {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Jog,
            2 => Self::Enabled,
            _ => Self::Disabled,
        }
    }
}

/// Whether the leadscrew has caught up with the spindle since tracking began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ThreadSync {
    Unsync = 0,
    Sync = 1,
}

/// Motion-mode and sync cells. Initial state: `Disabled`, `Unsync`.
#[derive(Debug, Default)]
pub struct SharedState {
    motion_mode: AtomicU8,
    thread_sync: AtomicU8,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn motion_mode(&self) -> MotionMode {
        MotionMode::from_u8(self.motion_mode.load(Ordering::Relaxed))
    }

    pub fn set_motion_mode(&self, mode: MotionMode) {
        self.motion_mode.store(mode as u8, Ordering::Relaxed);
    }

    pub fn thread_sync(&self) -> ThreadSync {
        if self.thread_sync.load(Ordering::Relaxed) == ThreadSync::Sync as u8 {
            ThreadSync::Sync
        } else {
            ThreadSync::Unsync
        }
    }

    pub fn set_thread_sync(&self, sync: ThreadSync) {
        self.thread_sync.store(sync as u8, Ordering::Relaxed);
    }
}

/// UI/CLI requests, applied by the runner between ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    SetRatio(f32),
    SetStop(crate::controller::StopSide, i32),
    UnsetStop(crate::controller::StopSide),
    SetMode(MotionMode),
    SetCurrentPosition(i32),
    IncrementCurrentPosition(i32),
    Shutdown,
}
