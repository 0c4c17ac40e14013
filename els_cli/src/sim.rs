//! Simulation runs: config mapping, sim rig assembly, and run execution.
//!
//! Pin/timer bring-up is host-specific and lives outside this repo, so the
//! CLI always drives the deterministic sim backend from `els_core::mocks`.

use els_core::error::Result as CoreResult;
use els_core::mocks::{ScriptedAxis, SimBus, SimClock};
use els_core::runner::{run, RunParams, StopCondition};
use els_core::{
    build_leadscrew, GeometryCfg, Leadscrew, MotionMode, SharedState, ThreadSync, TimingCfg,
    TrackingCfg,
};

/// Outcome of a sim run, for the human and JSON summaries.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    pub ticks: u64,
    pub final_position: i32,
    pub expected_position: i32,
    pub pulses: usize,
    pub velocity_mm_per_s: f32,
}

struct SimRig {
    leadscrew: Leadscrew<SimBus, ScriptedAxis>,
    shared: SharedState,
    bus: SimBus,
    axis: ScriptedAxis,
    clock: SimClock,
}

fn build_rig(cfg: Option<&els_config::Config>, ratio_override: Option<f32>) -> CoreResult<SimRig> {
    let timing = cfg.map(|c| TimingCfg::from(&c.timing)).unwrap_or_default();
    let geometry = cfg
        .map(|c| GeometryCfg::from(&c.geometry))
        .unwrap_or_default();
    let tracking = cfg
        .map(|c| TrackingCfg::from(&c.tracking))
        .unwrap_or_default();
    let ratio = ratio_override
        .or_else(|| cfg.and_then(|c| c.tracking.ratio))
        .unwrap_or(1.0);

    let bus = SimBus::new();
    let axis = ScriptedAxis::new();
    let leadscrew = build_leadscrew(
        bus.clone(),
        axis.clone(),
        timing,
        geometry,
        tracking,
        ratio,
    )?;
    let clock = SimClock::new(bus.clone());
    Ok(SimRig {
        leadscrew,
        shared: SharedState::new(),
        bus,
        axis,
        clock,
    })
}

fn summarize(rig: &SimRig, ticks: u64) -> RunSummary {
    RunSummary {
        ticks,
        final_position: rig.leadscrew.current_position(),
        expected_position: rig.leadscrew.expected_position(),
        pulses: rig.bus.pulses(),
        velocity_mm_per_s: rig.leadscrew.estimated_velocity_in_mm_per_second(),
    }
}

/// Advance the simulated spindle and track it to sync.
pub fn run_track(
    cfg: Option<&els_config::Config>,
    ratio: Option<f32>,
    advance: i32,
    max_ticks: u64,
) -> CoreResult<RunSummary> {
    let mut rig = build_rig(cfg, ratio)?;
    rig.axis.set(advance);
    rig.shared.set_thread_sync(ThreadSync::Unsync);
    rig.shared.set_motion_mode(MotionMode::Enabled);
    tracing::info!(advance, ratio = rig.leadscrew.ratio(), "track start");

    let outcome = run(
        &mut rig.leadscrew,
        &rig.shared,
        None,
        &rig.clock,
        &RunParams {
            max_ticks,
            stop: StopCondition::Synced,
        },
    )?;

    let summary = summarize(&rig, outcome.ticks);
    tracing::info!(
        final_position = summary.final_position,
        ticks = summary.ticks,
        "track complete"
    );
    Ok(summary)
}

/// Jog the leadscrew by `distance` steps (negative jogs left).
pub fn run_jog(
    cfg: Option<&els_config::Config>,
    distance: i32,
    max_ticks: u64,
) -> CoreResult<RunSummary> {
    let mut rig = build_rig(cfg, None)?;
    // Offsetting the believed position makes the jog target the offset.
    rig.leadscrew.increment_current_position(-distance);
    rig.shared.set_motion_mode(MotionMode::Jog);
    tracing::info!(distance, "jog start");

    let outcome = run(
        &mut rig.leadscrew,
        &rig.shared,
        None,
        &rig.clock,
        &RunParams {
            max_ticks,
            stop: StopCondition::ModeDisabled,
        },
    )?;

    let summary = summarize(&rig, outcome.ticks);
    tracing::info!(ticks = summary.ticks, "jog complete");
    Ok(summary)
}

/// A tiny tracking run that proves the sim backend is assembled correctly.
pub fn self_check() -> CoreResult<RunSummary> {
    run_track(None, Some(1.0), 10, 1_000_000)
}
