//! Human-readable rendering of typed errors for the console.

use els_core::{BuildError, ElsError};

pub fn humanize(err: &eyre::Report) -> String {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingBus => {
                "What happened: No step/dir bus was provided to the controller.\nLikely causes: The sim or hardware bus failed to initialize or was not wired into the builder.\nHow to fix: Pass a bus via with_bus(...) before building.".to_string()
            }
            BuildError::MissingAxis => {
                "What happened: No lead axis was provided to the controller.\nLikely causes: The spindle encoder driver was not wired into the builder.\nHow to fix: Pass an axis via with_axis(...) before building.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See README for a sample."
            ),
        };
    }

    if let Some(ElsError::SyncTimeout(ticks)) = err.downcast_ref::<ElsError>() {
        return format!(
            "What happened: The leadscrew did not reach sync within {ticks} ticks.\nLikely causes: Tick budget too small for the requested advance, or a ratio that makes the move very long.\nHow to fix: Raise --max-ticks or reduce the advance."
        );
    }

    // String-based heuristics for errors coming from config loading
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("invalid configuration") {
        return "What happened: Configuration is invalid or incomplete.\nLikely causes: Missing or out-of-range values in the TOML ([timing], [geometry], [tracking]).\nHow to fix: Edit the TOML config and try again.".to_string();
    }

    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}
