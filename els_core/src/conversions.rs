//! `From` implementations bridging `els_config` types to `els_core` types.

use crate::config::{GeometryCfg, TimingCfg, TrackingCfg};

impl From<&els_config::Timing> for TimingCfg {
    fn from(c: &els_config::Timing) -> Self {
        Self {
            initial_pulse_delay_us: c.initial_pulse_delay_us,
            pulse_delay_step_us: c.pulse_delay_step_us,
            timer_us: c.timer_us,
            jog_pulse_delay_us: c.jog_pulse_delay_us,
        }
    }
}

impl From<&els_config::Geometry> for GeometryCfg {
    fn from(c: &els_config::Geometry) -> Self {
        Self {
            stepper_ppr: c.stepper_ppr,
            steps_per_mm: c.steps_per_mm,
        }
    }
}

impl From<&els_config::Tracking> for TrackingCfg {
    fn from(c: &els_config::Tracking) -> Self {
        Self {
            stop_aware_decel: c.stop_aware_decel,
        }
    }
}
