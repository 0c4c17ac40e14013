//! End-to-end tracking scenarios: cold start, fractional ratios, reversal,
//! schedule misses, ratio changes, and coast re-sync.

use els_core::mocks::{ScriptedAxis, SimBus};
use els_core::{
    build_leadscrew, Direction, GeometryCfg, Leadscrew, MotionMode, SharedState, ThreadSync,
    TimingCfg, TrackingCfg,
};

const TIMER_US: u32 = 5;

type SimLeadscrew = Leadscrew<SimBus, ScriptedAxis>;

fn rig(ratio: f32) -> (SimLeadscrew, SharedState, SimBus, ScriptedAxis) {
    let bus = SimBus::new();
    let axis = ScriptedAxis::new();
    let leadscrew = build_leadscrew(
        bus.clone(),
        axis.clone(),
        TimingCfg::default(),
        GeometryCfg::default(),
        TrackingCfg::default(),
        ratio,
    )
    .expect("build leadscrew");
    (leadscrew, SharedState::new(), bus, axis)
}

fn tick(leadscrew: &mut SimLeadscrew, shared: &SharedState, bus: &SimBus) {
    bus.advance(TIMER_US);
    leadscrew.update(shared);
}

/// Tick until tracking has caught up and published sync. Panics on budget
/// exhaustion so a livelock shows up as a test failure, not a hang.
fn run_until_synced(
    leadscrew: &mut SimLeadscrew,
    shared: &SharedState,
    bus: &SimBus,
    budget: u64,
) -> u64 {
    for n in 0..budget {
        tick(leadscrew, shared, bus);
        if leadscrew.position_error() == 0 && shared.thread_sync() == ThreadSync::Sync {
            return n + 1;
        }
    }
    panic!("did not sync within {budget} ticks");
}

#[test]
fn cold_start_tracks_lead_advance() {
    let (mut ls, shared, bus, axis) = rig(1.0);
    shared.set_motion_mode(MotionMode::Enabled);
    axis.set(100);

    run_until_synced(&mut ls, &shared, &bus, 500_000);

    assert_eq!(ls.current_position(), 100);
    assert_eq!(shared.thread_sync(), ThreadSync::Sync);
    // Back at rest: slowest speed re-armed, direction unknowable.
    assert_eq!(
        ls.current_pulse_delay(),
        TimingCfg::default().initial_pulse_delay_us
    );
    assert_eq!(ls.direction(), Direction::Unknown);
    assert!(!bus.step_level(), "step pin must be low after completion");
}

#[test]
fn fractional_ratio_truncates_toward_zero_and_bounds_accumulator() {
    let (mut ls, shared, bus, axis) = rig(0.5);
    shared.set_motion_mode(MotionMode::Enabled);

    let mut max_accumulator: f32 = 0.0;
    for count in 1..=10 {
        axis.set(count);
        assert_eq!(ls.expected_position(), count / 2);
        for _ in 0..1_000 {
            tick(&mut ls, &shared, &bus);
            max_accumulator = max_accumulator.max(ls.accumulator().abs());
        }
    }

    assert_eq!(ls.current_position(), 5);
    assert_eq!(ls.position_error(), 0);
    assert!(
        max_accumulator <= 1.0 + 1e-4,
        "accumulator exceeded one step: {max_accumulator}"
    );
}

#[test]
fn reversal_decelerates_to_rest_before_reversing() {
    let (mut ls, shared, bus, axis) = rig(1.0);
    shared.set_motion_mode(MotionMode::Enabled);
    axis.set(100);

    let mut guard = 0u64;
    while ls.current_position() < 30 {
        tick(&mut ls, &shared, &bus);
        guard += 1;
        assert!(guard < 500_000, "never reached mid-motion");
    }

    // Retreat while the leadscrew is still moving right.
    axis.set(-100);
    run_until_synced(&mut ls, &shared, &bus, 2_000_000);
    assert_eq!(ls.current_position(), -100);

    // No tick may both change the direction pin and raise the step pin.
    let rising: Vec<u32> = bus
        .edges()
        .iter()
        .filter(|e| e.step_high)
        .map(|e| e.at_us)
        .collect();
    for at in bus.dir_changes() {
        assert!(
            !rising.contains(&at),
            "direction change and rising step edge in the same tick ({at} us)"
        );
    }
}

#[test]
fn schedule_miss_decelerates_one_quantum_without_burst() {
    let (mut ls, shared, bus, axis) = rig(1.0);
    shared.set_motion_mode(MotionMode::Enabled);
    axis.set(10_000);

    let mut guard = 0u64;
    while bus.pulses() < 5 {
        tick(&mut ls, &shared, &bus);
        guard += 1;
        assert!(guard < 500_000, "never reached full speed");
    }
    // Just completed a pulse: pin low, inter-pulse clock restarted, full speed.
    assert!(!bus.step_level());
    assert_eq!(ls.current_pulse_delay(), 0.0);

    let edges_before = bus.edges().len();

    // A 50 us stall: ten ticks arrive late as one.
    bus.advance(50);
    ls.update(&shared);

    // One quantum: pulse_delay_step_us x 50 us elapsed = 500.
    assert_eq!(ls.current_pulse_delay(), 500.0);
    // And no catch-up burst on the late tick.
    assert_eq!(bus.edges().len(), edges_before);
}

#[test]
fn ratio_change_resyncs_immediately() {
    let (mut ls, shared, bus, axis) = rig(1.0);
    shared.set_motion_mode(MotionMode::Enabled);
    axis.set(30);
    run_until_synced(&mut ls, &shared, &bus, 500_000);
    assert_eq!(ls.current_position(), 30);

    ls.set_ratio(2.0);
    assert_eq!(ls.position_error(), 0, "ratio change must not create error");
    assert_eq!(ls.current_position(), 60);

    // Subsequent motion tracks at the new ratio.
    axis.advance(10);
    run_until_synced(&mut ls, &shared, &bus, 500_000);
    assert_eq!(ls.current_position(), 80);
}

#[test]
fn invalid_ratio_is_ignored() {
    let (mut ls, _shared, _bus, axis) = rig(1.0);
    axis.set(10);
    ls.set_ratio(f32::NAN);
    ls.set_ratio(f32::INFINITY);
    ls.set_ratio(-1.0);
    ls.set_ratio(0.0);
    // Default geometry caps the ratio at 10: beyond that the per-pulse
    // accumulator increment would exceed one whole step.
    ls.set_ratio(50.0);
    assert_eq!(ls.ratio(), 1.0);
}

#[test]
fn oversized_ratio_is_rejected_at_build() {
    let bus = SimBus::new();
    let axis = ScriptedAxis::new();
    let result = build_leadscrew(
        bus,
        axis,
        TimingCfg::default(),
        GeometryCfg::default(),
        TrackingCfg::default(),
        20.0,
    );
    assert!(result.is_err(), "accumulator unit above one must not build");
}

#[test]
fn disabled_mode_keeps_logical_sync_without_motion() {
    let (mut ls, shared, bus, axis) = rig(1.25);

    for lead in [0, 3, 7, -4, 100, -250] {
        axis.set(lead);
        tick(&mut ls, &shared, &bus);
        assert_eq!(ls.current_position(), (lead as f32 * 1.25) as i32);
        assert_eq!(ls.position_error(), 0);
    }
    assert_eq!(bus.pulses(), 0, "coast must not emit pulses");
}

#[test]
fn reenabling_after_coast_causes_no_catchup_burst() {
    let (mut ls, shared, bus, axis) = rig(1.0);

    axis.set(5_000);
    tick(&mut ls, &shared, &bus); // coast tick re-syncs logical position

    shared.set_motion_mode(MotionMode::Enabled);
    for _ in 0..2_000 {
        tick(&mut ls, &shared, &bus);
    }
    assert_eq!(bus.pulses(), 0, "re-enable at zero error must stay at rest");
    assert_eq!(shared.thread_sync(), ThreadSync::Sync);
}

#[test]
fn expected_position_rounds_toward_zero() {
    let (ls, _shared, _bus, axis) = rig(0.75);
    axis.set(5); // 3.75
    assert_eq!(ls.expected_position(), 3);
    axis.set(-5); // -3.75
    assert_eq!(ls.expected_position(), -3);
}
