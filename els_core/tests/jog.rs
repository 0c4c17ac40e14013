//! Jog sub-mode: fixed-rate motion, arrival hand-back to Disabled.

use els_core::mocks::{ScriptedAxis, SimBus};
use els_core::{
    build_leadscrew, GeometryCfg, Leadscrew, MotionMode, SharedState, TimingCfg, TrackingCfg,
};

const TIMER_US: u32 = 5;
const JOG_PULSE_DELAY_US: u32 = 500;

type SimLeadscrew = Leadscrew<SimBus, ScriptedAxis>;

fn rig() -> (SimLeadscrew, SharedState, SimBus, ScriptedAxis) {
    let bus = SimBus::new();
    let axis = ScriptedAxis::new();
    let leadscrew = build_leadscrew(
        bus.clone(),
        axis.clone(),
        TimingCfg::default(),
        GeometryCfg::default(),
        TrackingCfg::default(),
        1.0,
    )
    .expect("build leadscrew");
    (leadscrew, SharedState::new(), bus, axis)
}

fn tick(leadscrew: &mut SimLeadscrew, shared: &SharedState, bus: &SimBus) {
    bus.advance(TIMER_US);
    leadscrew.update(shared);
}

#[test]
fn jog_paces_pulses_and_hands_mode_back_on_arrival() {
    let (mut ls, shared, bus, axis) = rig();
    axis.set(20);
    shared.set_motion_mode(MotionMode::Jog);

    let mut guard = 0u64;
    while shared.motion_mode() == MotionMode::Jog {
        tick(&mut ls, &shared, &bus);
        guard += 1;
        assert!(guard < 200_000, "jog never arrived");
    }

    assert_eq!(shared.motion_mode(), MotionMode::Disabled);
    assert_eq!(ls.current_position(), 20);
    assert_eq!(ls.position_error(), 0);

    // Jogging is fixed-rate: consecutive rising edges at least one jog
    // interval apart.
    let rising: Vec<u32> = bus
        .edges()
        .iter()
        .filter(|e| e.step_high)
        .map(|e| e.at_us)
        .collect();
    assert!(!rising.is_empty());
    for pair in rising.windows(2) {
        let gap = pair[1] - pair[0];
        assert!(
            gap >= JOG_PULSE_DELAY_US,
            "jog pulses {} us apart (minimum {JOG_PULSE_DELAY_US})",
            gap
        );
    }
}

#[test]
fn jog_at_target_flips_to_disabled_without_pulsing() {
    let (mut ls, shared, bus, _axis) = rig();
    shared.set_motion_mode(MotionMode::Jog);

    tick(&mut ls, &shared, &bus);

    assert_eq!(shared.motion_mode(), MotionMode::Disabled);
    assert_eq!(bus.pulses(), 0);
}

#[test]
fn jog_moves_left_for_negative_error() {
    let (mut ls, shared, bus, axis) = rig();
    axis.set(0);
    ls.set_current_position(15); // expected 0, so the screw must back up
    shared.set_motion_mode(MotionMode::Jog);

    let mut guard = 0u64;
    while shared.motion_mode() == MotionMode::Jog {
        tick(&mut ls, &shared, &bus);
        guard += 1;
        assert!(guard < 200_000, "jog never arrived");
    }

    assert_eq!(ls.current_position(), 0);
    // Every pulse was emitted with the direction pin low (LEFT).
    assert!(bus.edges().iter().all(|e| !e.dir_right));
}
