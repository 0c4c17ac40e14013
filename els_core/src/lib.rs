#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Electronic lead screw step-generation core (hardware-agnostic).
//!
//! This crate is the replacement for a lathe's mechanical change gears: a
//! stepper-driven lead screw tracks the sensed spindle position at a
//! configurable ratio. All hardware interactions go through the
//! `els_traits::StepDirBus` and `els_traits::LeadAxis` traits.
//!
//! ## Architecture
//!
//! - **Controller**: the per-tick step generator with trapezoidal ramping,
//!   direction management, soft stops and a jog sub-mode (`controller`)
//! - **Global state**: motion-mode / thread-sync atomic cells shared with
//!   the UI, plus the command channel (`state`)
//! - **Runner**: the tick driver that paces `update()` and drains UI
//!   commands between ticks (`runner`)
//! - **Configuration**: timing, geometry and behavior knobs (`config`)
//! - **Mocks**: deterministic bus/axis/clock doubles (`mocks`)
//!
//! ## Real-time discipline
//!
//! `Leadscrew::update()` is straight-line and allocation-free; every branch
//! returns within the tick. Schedule misses are absorbed by decelerating one
//! ramp quantum rather than bursting catch-up pulses.

pub mod builder;
pub mod config;
pub mod controller;
pub mod conversions;
pub mod error;
pub mod mocks;
pub mod runner;
pub mod state;

pub use builder::{build_leadscrew, BoxedLeadscrew, LeadscrewBuilder, Missing, Set};
pub use config::{GeometryCfg, TimingCfg, TrackingCfg};
pub use controller::{Direction, Leadscrew, StopSide};
pub use error::{BuildError, ElsError};
pub use state::{Command, MotionMode, SharedState, ThreadSync};
