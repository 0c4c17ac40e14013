use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Pins {
    pub step: u8,
    pub dir: u8,
}

#[derive(Debug, Deserialize)]
pub struct Timing {
    pub initial_pulse_delay_us: f32,
    pub pulse_delay_step_us: f32,
    pub timer_us: u32,
    pub jog_pulse_delay_us: u32,
}

#[derive(Debug, Deserialize)]
pub struct Geometry {
    pub stepper_ppr: u32,
    pub steps_per_mm: u32,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Tracking {
    // Fold the soft stops into the deceleration predicate (off = stock behavior)
    pub stop_aware_decel: bool,
    /// Startup ratio preset (leadscrew counts per lead-axis count).
    pub ratio: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub pins: Pins,
    pub timing: Timing,
    pub geometry: Geometry,
    #[serde(default)]
    pub tracking: Tracking,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    /// Shallow sanity checks on parsed values. The core builder re-validates
    /// on assembly; this exists so config problems surface before any
    /// controller is built.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.timing.timer_us == 0 {
            return Err("timing.timer_us must be >= 1");
        }
        if !self.timing.initial_pulse_delay_us.is_finite()
            || self.timing.initial_pulse_delay_us <= 0.0
        {
            return Err("timing.initial_pulse_delay_us must be > 0");
        }
        if !self.timing.pulse_delay_step_us.is_finite() || self.timing.pulse_delay_step_us <= 0.0 {
            return Err("timing.pulse_delay_step_us must be > 0");
        }
        if self.timing.jog_pulse_delay_us == 0 {
            return Err("timing.jog_pulse_delay_us must be >= 1");
        }
        if self.geometry.stepper_ppr == 0 || self.geometry.steps_per_mm == 0 {
            return Err("geometry values must be > 0");
        }
        if let Some(ratio) = self.tracking.ratio {
            if !ratio.is_finite() || ratio <= 0.0 {
                return Err("tracking.ratio must be finite and > 0");
            }
        }
        Ok(())
    }
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}
