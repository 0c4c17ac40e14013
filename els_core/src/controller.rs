//! The leadscrew step generator.
//!
//! One instance owns the step/dir bus and tracks the sensed lead axis. The
//! host calls [`Leadscrew::update`] at a fixed tick cadence; each tick the
//! controller decides whether to toggle the step pin, adjusts the inter-pulse
//! delay against the acceleration limit, and carries sub-step residue for
//! non-integer ratios in a fractional accumulator.
//!
//! Pulses are active-high with a high dwell of exactly one tick: a rising
//! edge on one tick, the falling edge on the next. A pulse is counted in
//! `current_position` exactly once, on the falling edge.

use els_traits::{LeadAxis, StepDirBus};

use crate::config::{GeometryCfg, TimingCfg, TrackingCfg};
use crate::state::{MotionMode, SharedState, ThreadSync};

/// Direction of leadscrew travel. `Unknown` iff at rest with zero error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Unknown,
}

impl Direction {
    fn from_error(position_error: i32) -> Self {
        if position_error > 0 {
            Self::Right
        } else if position_error < 0 {
            Self::Left
        } else {
            Self::Unknown
        }
    }

    fn signum(self) -> i32 {
        match self {
            Self::Left => -1,
            Self::Right => 1,
            Self::Unknown => 0,
        }
    }

    /// Direction pin level: 1 = RIGHT (advance), 0 = LEFT.
    fn pin_level(self) -> bool {
        self == Self::Right
    }
}

/// Which soft stop a call refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSide {
    Left,
    Right,
}

/// The step generator. Generic over the bus and axis capabilities; use
/// [`crate::builder::LeadscrewBuilder`] for boxed dispatch or
/// [`crate::builder::build_leadscrew`] for static dispatch.
pub struct Leadscrew<B: StepDirBus, A: LeadAxis> {
    pub(crate) bus: B,
    pub(crate) axis: A,
    pub(crate) timing: TimingCfg,
    pub(crate) geometry: GeometryCfg,
    pub(crate) tracking: TrackingCfg,

    pub(crate) ratio: f32,
    pub(crate) current_position: i32,
    pub(crate) accumulator: f32,
    pub(crate) current_pulse_delay: f32,
    pub(crate) last_pulse_micros: u32,
    pub(crate) last_full_pulse_duration_micros: u32,
    pub(crate) last_tick_micros: u32,
    pub(crate) current_direction: Direction,
    pub(crate) left_stop: Option<i32>,
    pub(crate) right_stop: Option<i32>,
    pub(crate) cycle_modulo: u32,
}

impl<B: StepDirBus, A: LeadAxis> core::fmt::Debug for Leadscrew<B, A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Leadscrew")
            .field("ratio", &self.ratio)
            .field("current_position", &self.current_position)
            .field("current_pulse_delay", &self.current_pulse_delay)
            .field("direction", &self.current_direction)
            .finish()
    }
}

impl<B: StepDirBus, A: LeadAxis> Leadscrew<B, A> {
    // ── UI-facing operations ─────────────────────────────────────────────

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    /// Change the tracking ratio and re-sync the believed position so the
    /// change itself produces no catch-up burst. Ratios must be finite,
    /// positive, and keep the per-pulse accumulator increment within one
    /// whole step; anything else is ignored, as the UI path has no error
    /// surface.
    pub fn set_ratio(&mut self, ratio: f32) {
        if !ratio.is_finite() || ratio <= 0.0 {
            tracing::warn!(ratio, "ignoring invalid ratio");
            return;
        }
        let unit = (self.geometry.steps_per_mm as f32 * ratio) / self.geometry.stepper_ppr as f32;
        if unit > 1.0 {
            tracing::warn!(ratio, unit, "ignoring ratio: accumulator unit would exceed one step");
            return;
        }
        self.ratio = ratio;
        self.reset_current_position();
    }

    pub fn current_position(&self) -> i32 {
        self.current_position
    }

    /// Overwrite the believed position (UI re-zeroing hook).
    pub fn set_current_position(&mut self, position: i32) {
        self.current_position = position;
    }

    /// Shift the believed position (UI nudge hook).
    pub fn increment_current_position(&mut self, amount: i32) {
        self.current_position = self.current_position.saturating_add(amount);
    }

    /// Where the leadscrew should be: `trunc(lead × ratio)`.
    pub fn expected_position(&self) -> i32 {
        (self.axis.current_position() as f32 * self.ratio) as i32
    }

    pub fn position_error(&self) -> i32 {
        let err = i64::from(self.expected_position()) - i64::from(self.current_position);
        err.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
    }

    /// Re-sync the believed position to the spindle. Called every tick in
    /// Disabled mode so re-enabling does not trigger a catch-up burst.
    pub fn reset_current_position(&mut self) {
        self.current_position = self.expected_position();
    }

    pub fn set_stop_position(&mut self, side: StopSide, position: i32) {
        match side {
            StopSide::Left => self.left_stop = Some(position),
            StopSide::Right => self.right_stop = Some(position),
        }
    }

    pub fn unset_stop_position(&mut self, side: StopSide) {
        match side {
            StopSide::Left => self.left_stop = None,
            StopSide::Right => self.right_stop = None,
        }
    }

    /// Configured stop position; `i32::MIN` / `i32::MAX` when unset, which
    /// keeps the comparison semantics of an unbounded side.
    pub fn stop_position(&self, side: StopSide) -> i32 {
        match side {
            StopSide::Left => self.left_stop.unwrap_or(i32::MIN),
            StopSide::Right => self.right_stop.unwrap_or(i32::MAX),
        }
    }

    pub fn direction(&self) -> Direction {
        self.current_direction
    }

    pub fn timing(&self) -> &TimingCfg {
        &self.timing
    }

    /// Scheduled inter-pulse interval in microseconds (telemetry).
    pub fn current_pulse_delay(&self) -> f32 {
        self.current_pulse_delay
    }

    /// Fractional steps owed due to a non-integer ratio (telemetry).
    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Position within one stepper revolution, for thread-phase display.
    pub fn position_within_cycle(&self) -> u32 {
        self.current_position.rem_euclid(self.cycle_modulo as i32) as u32
    }

    pub fn estimated_velocity_in_pulses_per_second(&self) -> f32 {
        if self.last_full_pulse_duration_micros == 0 {
            return 0.0;
        }
        1e6 / self.last_full_pulse_duration_micros as f32
    }

    pub fn estimated_velocity_in_mm_per_second(&self) -> f32 {
        self.estimated_velocity_in_pulses_per_second() / self.geometry.steps_per_mm as f32
    }

    // ── The tick ─────────────────────────────────────────────────────────

    /// One control tick. Straight-line, non-blocking, returns on every
    /// branch; the host calls this every `timer_us` microseconds.
    pub fn update(&mut self, shared: &SharedState) {
        // Genuinely sample the counter each tick; only differences are used,
        // so wraparound is harmless.
        let now = self.bus.micros();
        let elapsed = now.wrapping_sub(self.last_tick_micros);
        self.last_tick_micros = now;
        self.last_pulse_micros = self.last_pulse_micros.saturating_add(elapsed);

        match shared.motion_mode() {
            MotionMode::Disabled => self.coast(),
            MotionMode::Jog => self.jog_tick(shared),
            MotionMode::Enabled => self.tracking_tick(shared),
        }
    }

    /// Disabled: ignore the spindle physically but stay in logical sync.
    fn coast(&mut self) {
        // An in-flight pulse is never abandoned mid-high; pull it low first.
        if self.bus.read_step_pin() {
            self.send_pulse();
        }
        self.reset_current_position();
        self.current_direction = Direction::Unknown;
        self.current_pulse_delay = self.timing.initial_pulse_delay_us;
        self.last_pulse_micros = 0;
    }

    /// Jog: fixed-rate motion toward the expected position.
    fn jog_tick(&mut self, shared: &SharedState) {
        if self.bus.read_step_pin() {
            if self.send_pulse() {
                self.finish_pulse();
            }
            return;
        }

        let position_error = self.position_error();
        if position_error == 0 {
            // Jog target reached; hand the mode back.
            shared.set_motion_mode(MotionMode::Disabled);
            self.current_direction = Direction::Unknown;
            return;
        }

        if self.last_pulse_micros < self.timing.jog_pulse_delay_us {
            return;
        }

        let next_direction = Direction::from_error(position_error);
        if next_direction != self.current_direction {
            // Dir pin settles at least one tick before the rising edge.
            self.bus.write_dir_pin(next_direction.pin_level());
            self.current_direction = next_direction;
            return;
        }

        self.send_pulse();
    }

    /// Enabled: the ramped tracking loop.
    fn tracking_tick(&mut self, shared: &SharedState) {
        let position_error = self.position_error();
        let next_direction = Direction::from_error(position_error);

        // A started pulse always completes on the next tick: the high dwell
        // is exactly one tick, and only rising edges are schedule-gated.
        if self.bus.read_step_pin() {
            if self.send_pulse() {
                self.finish_tracking_pulse(position_error, next_direction);
            }
            return;
        }

        if position_error == 0 {
            // At a standstill the next direction is unknowable. Re-arm the
            // delay at the slowest speed so the next move ramps from rest.
            self.current_direction = Direction::Unknown;
            self.current_pulse_delay = self.timing.initial_pulse_delay_us;
            shared.set_thread_sync(ThreadSync::Sync);
            return;
        }

        // Entering motion from rest (or reversing after a full ramp-down):
        // latch the direction one tick ahead of the first rising edge.
        if self.current_pulse_delay == self.timing.initial_pulse_delay_us
            && next_direction != self.current_direction
        {
            tracing::trace!(?next_direction, "direction latch");
            self.bus.write_dir_pin(next_direction.pin_level());
            self.current_direction = next_direction;
            self.last_pulse_micros = 0;
            return;
        }

        let accel_change = self.accel_change();

        // Missed the schedule: recover locally by slowing one quantum.
        if self.last_pulse_micros as f32
            > self.current_pulse_delay + self.timing.pulse_delay_step_us
            && self.current_pulse_delay + accel_change < self.timing.initial_pulse_delay_us
        {
            tracing::trace!(
                last_pulse_micros = self.last_pulse_micros,
                accel_change,
                "schedule miss, decelerating"
            );
            self.current_pulse_delay += accel_change;
        }

        // Not yet due.
        if (self.last_pulse_micros as f32) < self.current_pulse_delay {
            return;
        }

        self.send_pulse();
    }

    /// Quantum by which the inter-pulse delay changes per decision, scaled
    /// by the elapsed time since the previous pulse (floored at the base
    /// step so a fresh start still moves).
    fn accel_change(&self) -> f32 {
        let change = self.timing.pulse_delay_step_us * self.last_pulse_micros as f32;
        if change == 0.0 {
            self.timing.pulse_delay_step_us
        } else {
            change
        }
    }

    /// Two-tick pulse: high→low completes it (returns true), low→high
    /// starts it. The step pin level transitions nowhere else.
    fn send_pulse(&mut self) -> bool {
        let high = self.bus.read_step_pin();
        self.bus.write_step_pin(!high);
        high
    }

    /// Falling-edge bookkeeping shared by jog and tracking: count the step,
    /// carry the fractional residue, restart the inter-pulse clock.
    fn finish_pulse(&mut self) -> i32 {
        self.last_full_pulse_duration_micros = self.last_pulse_micros;
        self.last_pulse_micros = 0;

        let step = self.current_direction.signum();
        self.current_position = self.current_position.saturating_add(step);
        self.accumulator += step as f32 * self.accumulator_unit();

        // Sub-step compensation: once a whole step of residue has built up,
        // consume it as one extra catch-up step.
        if self.accumulator.abs() > 1.0 {
            self.accumulator -= step as f32;
            self.current_position = self.current_position.saturating_add(step);
        }
        step
    }

    /// Falling-edge bookkeeping for tracking mode: ramp decision on top of
    /// the shared pulse accounting.
    fn finish_tracking_pulse(&mut self, position_error: i32, next_direction: Direction) {
        let accel_change = self.accel_change();
        let step = self.finish_pulse();

        // Steps needed to ramp down to rest at the current ramp rate.
        let stopping_distance_in_pulses =
            (self.timing.initial_pulse_delay_us - self.current_pulse_delay) / accel_change;

        // Error net of the step just counted: the final pulse of an
        // approach must decelerate, not re-accelerate off a stale error.
        let remaining = (i64::from(position_error) - i64::from(step)).abs() as f32;

        let mut should_stop = remaining - stopping_distance_in_pulses <= 0.0;
        should_stop |= next_direction != self.current_direction;
        if self.tracking.stop_aware_decel {
            if let Some(right) = self.right_stop {
                should_stop |=
                    self.current_position as f32 + stopping_distance_in_pulses >= right as f32;
            }
            if let Some(left) = self.left_stop {
                should_stop |=
                    self.current_position as f32 - stopping_distance_in_pulses <= left as f32;
            }
        }

        if should_stop {
            self.current_pulse_delay += accel_change;
        } else {
            self.current_pulse_delay -= accel_change;
        }
        self.current_pulse_delay = self
            .current_pulse_delay
            .clamp(0.0, self.timing.initial_pulse_delay_us);
    }

    /// Leadscrew step counts per emitted pulse: `steps_per_mm × ratio / ppr`.
    fn accumulator_unit(&self) -> f32 {
        (self.geometry.steps_per_mm as f32 * self.ratio) / self.geometry.stepper_ppr as f32
    }
}
