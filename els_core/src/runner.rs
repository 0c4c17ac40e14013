//! The tick driver.
//!
//! Owns the per-tick cadence: drain any pending UI commands, run one
//! controller tick, then sleep one tick period on the injected clock.
//! Commands therefore always land between ticks, which is the whole
//! concurrency contract of the core.

use crossbeam_channel::{Receiver, TryRecvError};
use els_traits::clock::Clock;
use els_traits::{LeadAxis, StepDirBus};

use crate::controller::Leadscrew;
use crate::error::{ElsError, Result};
use crate::state::{Command, MotionMode, SharedState, ThreadSync};

/// When the run loop should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCondition {
    /// Tracking caught up: zero position error with sync published.
    Synced,
    /// The controller handed the mode back to `Disabled` (jog arrival).
    ModeDisabled,
    /// Run the full tick budget.
    Never,
}

#[derive(Debug, Clone)]
pub struct RunParams {
    pub max_ticks: u64,
    pub stop: StopCondition,
}

#[derive(Debug, Clone, Copy)]
pub struct RunOutcome {
    pub ticks: u64,
    /// True when a `Shutdown` command ended the run early.
    pub shut_down: bool,
}

/// Drive the controller until the stop condition holds, a `Shutdown`
/// command arrives, or the tick budget runs out. A spent budget with a real
/// stop condition is a typed error; with `StopCondition::Never` it is the
/// normal outcome.
pub fn run<B, A, C>(
    leadscrew: &mut Leadscrew<B, A>,
    shared: &SharedState,
    commands: Option<&Receiver<Command>>,
    clock: &C,
    params: &RunParams,
) -> Result<RunOutcome>
where
    B: StepDirBus,
    A: LeadAxis,
    C: Clock,
{
    let timer_us = u64::from(leadscrew.timing().timer_us);
    tracing::info!(
        max_ticks = params.max_ticks,
        stop = ?params.stop,
        "tick loop start"
    );

    for tick in 0..params.max_ticks {
        if let Some(rx) = commands {
            loop {
                match rx.try_recv() {
                    Ok(Command::Shutdown) => {
                        tracing::info!(tick, "shutdown requested");
                        return Ok(RunOutcome {
                            ticks: tick,
                            shut_down: true,
                        });
                    }
                    Ok(cmd) => apply_command(leadscrew, shared, cmd),
                    Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
                }
            }
        }

        leadscrew.update(shared);

        let met = match params.stop {
            StopCondition::Synced => {
                shared.thread_sync() == ThreadSync::Sync && leadscrew.position_error() == 0
            }
            StopCondition::ModeDisabled => shared.motion_mode() == MotionMode::Disabled,
            StopCondition::Never => false,
        };
        if met {
            tracing::info!(ticks = tick + 1, "tick loop stop condition met");
            return Ok(RunOutcome {
                ticks: tick + 1,
                shut_down: false,
            });
        }

        clock.sleep_us(timer_us);
    }

    if params.stop == StopCondition::Never {
        return Ok(RunOutcome {
            ticks: params.max_ticks,
            shut_down: false,
        });
    }
    tracing::error!(max_ticks = params.max_ticks, "tick budget exhausted");
    Err(eyre::Report::new(ElsError::SyncTimeout(params.max_ticks)))
}

fn apply_command<B, A>(leadscrew: &mut Leadscrew<B, A>, shared: &SharedState, cmd: Command)
where
    B: StepDirBus,
    A: LeadAxis,
{
    tracing::debug!(?cmd, "applying command");
    match cmd {
        Command::SetRatio(ratio) => leadscrew.set_ratio(ratio),
        Command::SetStop(side, position) => leadscrew.set_stop_position(side, position),
        Command::UnsetStop(side) => leadscrew.unset_stop_position(side),
        Command::SetMode(mode) => shared.set_motion_mode(mode),
        Command::SetCurrentPosition(position) => leadscrew.set_current_position(position),
        Command::IncrementCurrentPosition(amount) => leadscrew.increment_current_position(amount),
        Command::Shutdown => unreachable!("handled by the drain loop"),
    }
}
