//! Controller configuration.
//!
//! All values are compile-time constants on the original target; here they
//! are plain structs with `Default`s so tests and the CLI can override them.

/// Pulse timing knobs.
///
/// `initial_pulse_delay_us` is the *slowest* (start/stop) inter-pulse
/// interval; the ramp shortens the delay from there. `pulse_delay_step_us`
/// is the base ramp quantum: the actual per-decision change scales with the
/// elapsed time since the previous pulse.
#[derive(Debug, Clone)]
pub struct TimingCfg {
    /// Slowest (start/stop) inter-pulse interval in microseconds.
    pub initial_pulse_delay_us: f32,
    /// Base quantum by which the inter-pulse delay changes per decision.
    pub pulse_delay_step_us: f32,
    /// Tick period the host drives `update()` at, in microseconds.
    pub timer_us: u32,
    /// Fixed inter-pulse interval for jog moves, in microseconds.
    pub jog_pulse_delay_us: u32,
}

impl Default for TimingCfg {
    fn default() -> Self {
        Self {
            initial_pulse_delay_us: 1000.0,
            pulse_delay_step_us: 10.0,
            timer_us: 5,
            jog_pulse_delay_us: 500,
        }
    }
}

/// Mechanical conversion constants.
#[derive(Debug, Clone)]
pub struct GeometryCfg {
    /// Stepper pulses per revolution.
    pub stepper_ppr: u32,
    /// Leadscrew steps per millimeter of carriage travel.
    pub steps_per_mm: u32,
}

impl Default for GeometryCfg {
    fn default() -> Self {
        Self {
            stepper_ppr: 2000,
            steps_per_mm: 200,
        }
    }
}

/// Tracking behavior switches.
#[derive(Debug, Clone, Default)]
pub struct TrackingCfg {
    /// Factor the configured soft stops into the deceleration predicate, so
    /// the ramp-down begins a stopping distance before a stop position.
    /// Off by default: the stock firmware ships with these clauses disabled.
    pub stop_aware_decel: bool,
}
