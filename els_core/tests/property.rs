//! Property tests: ramp clamping, accumulator bounds, convergence, and
//! coast re-sync over randomized lead profiles and ratios.

use els_core::mocks::{ScriptedAxis, SimBus};
use els_core::{
    build_leadscrew, Direction, GeometryCfg, Leadscrew, MotionMode, SharedState, ThreadSync,
    TimingCfg, TrackingCfg,
};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

const TIMER_US: u32 = 5;
const INITIAL_PULSE_DELAY_US: f32 = 1000.0;

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

fn check_invariants(ls: &SimLeadscrew) -> Result<(), TestCaseError> {
    let delay = ls.current_pulse_delay();
    prop_assert!(
        (0.0..=INITIAL_PULSE_DELAY_US).contains(&delay),
        "pulse delay out of range: {delay}"
    );
    prop_assert!(
        ls.accumulator().abs() < 2.0,
        "accumulator unbounded: {}",
        ls.accumulator()
    );
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn tracking_converges_with_bounded_ramp_and_accumulator(
        advances in prop::collection::vec(1i32..4, 1..32),
        ratio in 0.25f32..2.0,
    ) {
        let (mut ls, shared, bus, axis) = rig(ratio);
        shared.set_motion_mode(MotionMode::Enabled);

        for adv in &advances {
            axis.advance(*adv);
            for _ in 0..200 {
                tick(&mut ls, &shared, &bus);
                check_invariants(&ls)?;
            }
        }

        // Lead stopped: the controller must catch up and settle.
        let mut settled = false;
        for _ in 0..400_000u64 {
            tick(&mut ls, &shared, &bus);
            check_invariants(&ls)?;
            if ls.position_error() == 0 && shared.thread_sync() == ThreadSync::Sync {
                settled = true;
                break;
            }
        }
        prop_assert!(settled, "tracking never settled");
        prop_assert_eq!(ls.current_position(), ls.expected_position());
        // At rest with zero error the next direction is unknowable.
        prop_assert_eq!(ls.direction(), Direction::Unknown);
        prop_assert!(!bus.step_level());
    }

    #[test]
    fn coast_resync_holds_for_any_lead_walk(
        leads in prop::collection::vec(-10_000i32..10_000, 1..64),
        ratio in 0.25f32..2.0,
    ) {
        let (mut ls, shared, bus, axis) = rig(ratio);

        for lead in &leads {
            axis.set(*lead);
            tick(&mut ls, &shared, &bus);
            prop_assert_eq!(ls.position_error(), 0);
            prop_assert_eq!(ls.current_position(), (*lead as f32 * ratio) as i32);
        }
        prop_assert_eq!(bus.pulses(), 0);
    }

    #[test]
    fn jog_arrives_for_any_distance(distance in 1i32..60) {
        let (mut ls, shared, bus, axis) = rig(1.0);
        axis.set(distance);
        shared.set_motion_mode(MotionMode::Jog);

        let mut arrived = false;
        for _ in 0..400_000u64 {
            tick(&mut ls, &shared, &bus);
            check_invariants(&ls)?;
            if shared.motion_mode() == MotionMode::Disabled {
                arrived = true;
                break;
            }
        }
        prop_assert!(arrived, "jog never arrived");
        prop_assert_eq!(ls.position_error(), 0);
        prop_assert!(!bus.step_level());
    }
}
