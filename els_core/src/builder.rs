//! Type-state builder and generic constructor for [`Leadscrew`].
//!
//! The builder enforces at compile time that the bus and axis are provided
//! before `build()` is available; `try_build()` is always available for
//! dynamic checks. `build_leadscrew` is the statically-dispatched variant.

use std::marker::PhantomData;

use els_traits::{LeadAxis, StepDirBus};

use crate::config::{GeometryCfg, TimingCfg, TrackingCfg};
use crate::controller::{Direction, Leadscrew};
use crate::error::{BuildError, Result};

/// Boxed-dispatch controller, as produced by [`LeadscrewBuilder`].
pub type BoxedLeadscrew = Leadscrew<Box<dyn StepDirBus>, Box<dyn LeadAxis>>;

// Type-state markers
pub struct Missing;
pub struct Set;

/// Builder for a boxed [`Leadscrew`]. All config is validated on build.
pub struct LeadscrewBuilder<B, A> {
    bus: Option<Box<dyn StepDirBus>>,
    axis: Option<Box<dyn LeadAxis>>,
    timing: Option<TimingCfg>,
    geometry: Option<GeometryCfg>,
    tracking: Option<TrackingCfg>,
    ratio: Option<f32>,
    _b: PhantomData<B>,
    _a: PhantomData<A>,
}

impl Default for LeadscrewBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            bus: None,
            axis: None,
            timing: None,
            geometry: None,
            tracking: None,
            ratio: None,
            _b: PhantomData,
            _a: PhantomData,
        }
    }
}

impl LeadscrewBuilder<Missing, Missing> {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Chainable setters that do not affect type-state.
impl<B, A> LeadscrewBuilder<B, A> {
    pub fn with_timing(mut self, timing: TimingCfg) -> Self {
        self.timing = Some(timing);
        self
    }
    pub fn with_geometry(mut self, geometry: GeometryCfg) -> Self {
        self.geometry = Some(geometry);
        self
    }
    pub fn with_tracking(mut self, tracking: TrackingCfg) -> Self {
        self.tracking = Some(tracking);
        self
    }
    pub fn with_ratio(mut self, ratio: f32) -> Self {
        self.ratio = Some(ratio);
        self
    }

    /// Fallible build available in any type-state; returns a typed
    /// `BuildError` for anything missing or out of range.
    pub fn try_build(self) -> Result<BoxedLeadscrew> {
        let LeadscrewBuilder {
            bus,
            axis,
            timing,
            geometry,
            tracking,
            ratio,
            _b: _,
            _a: _,
        } = self;

        let bus = bus.ok_or_else(|| eyre::Report::new(BuildError::MissingBus))?;
        let axis = axis.ok_or_else(|| eyre::Report::new(BuildError::MissingAxis))?;
        assemble(
            bus,
            axis,
            timing.unwrap_or_default(),
            geometry.unwrap_or_default(),
            tracking.unwrap_or_default(),
            ratio.unwrap_or(1.0),
        )
    }
}

impl<A> LeadscrewBuilder<Missing, A> {
    pub fn with_bus(self, bus: impl StepDirBus + 'static) -> LeadscrewBuilder<Set, A> {
        LeadscrewBuilder {
            bus: Some(Box::new(bus)),
            axis: self.axis,
            timing: self.timing,
            geometry: self.geometry,
            tracking: self.tracking,
            ratio: self.ratio,
            _b: PhantomData,
            _a: PhantomData,
        }
    }
}

impl<B> LeadscrewBuilder<B, Missing> {
    pub fn with_axis(self, axis: impl LeadAxis + 'static) -> LeadscrewBuilder<B, Set> {
        LeadscrewBuilder {
            bus: self.bus,
            axis: Some(Box::new(axis)),
            timing: self.timing,
            geometry: self.geometry,
            tracking: self.tracking,
            ratio: self.ratio,
            _b: PhantomData,
            _a: PhantomData,
        }
    }
}

impl LeadscrewBuilder<Set, Set> {
    /// Validate and build. Only available once bus and axis are set.
    pub fn build(self) -> Result<BoxedLeadscrew> {
        self.try_build()
    }
}

/// Build a statically-dispatched [`Leadscrew`] from concrete parts.
pub fn build_leadscrew<B, A>(
    bus: B,
    axis: A,
    timing: TimingCfg,
    geometry: GeometryCfg,
    tracking: TrackingCfg,
    ratio: f32,
) -> Result<Leadscrew<B, A>>
where
    B: StepDirBus,
    A: LeadAxis,
{
    assemble(bus, axis, timing, geometry, tracking, ratio)
}

fn assemble<B, A>(
    bus: B,
    axis: A,
    timing: TimingCfg,
    geometry: GeometryCfg,
    tracking: TrackingCfg,
    ratio: f32,
) -> Result<Leadscrew<B, A>>
where
    B: StepDirBus,
    A: LeadAxis,
{
    validate(&timing, &geometry, ratio)?;

    let last_tick_micros = bus.micros();
    Ok(Leadscrew {
        bus,
        axis,
        ratio,
        current_position: 0,
        accumulator: 0.0,
        current_pulse_delay: timing.initial_pulse_delay_us,
        last_pulse_micros: 0,
        last_full_pulse_duration_micros: 0,
        last_tick_micros,
        current_direction: Direction::Unknown,
        left_stop: None,
        right_stop: None,
        cycle_modulo: geometry.stepper_ppr,
        timing,
        geometry,
        tracking,
    })
}

fn validate(timing: &TimingCfg, geometry: &GeometryCfg, ratio: f32) -> Result<()> {
    if timing.timer_us == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "timer_us must be >= 1",
        )));
    }
    if !timing.initial_pulse_delay_us.is_finite() || timing.initial_pulse_delay_us <= 0.0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "initial_pulse_delay_us must be > 0",
        )));
    }
    if !timing.pulse_delay_step_us.is_finite() || timing.pulse_delay_step_us <= 0.0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "pulse_delay_step_us must be > 0",
        )));
    }
    if timing.jog_pulse_delay_us == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "jog_pulse_delay_us must be >= 1",
        )));
    }
    if geometry.stepper_ppr == 0 || geometry.steps_per_mm == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "stepper_ppr and steps_per_mm must be > 0",
        )));
    }
    if !ratio.is_finite() || ratio <= 0.0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "ratio must be finite and > 0",
        )));
    }
    // The per-pulse accumulator increment must stay within one whole step;
    // the consume branch retires residue one step at a time.
    let unit = (geometry.steps_per_mm as f32 * ratio) / geometry.stepper_ppr as f32;
    if unit > 1.0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "steps_per_mm * ratio must not exceed stepper_ppr",
        )));
    }
    Ok(())
}
