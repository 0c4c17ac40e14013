//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "els", version, about = "Electronic lead screw CLI")]
pub struct Cli {
    /// Path to config TOML; built-in defaults apply without one
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Emit JSON lines (logs and summaries) instead of pretty output
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Track a simulated spindle advance at a given ratio
    Track {
        /// Leadscrew counts per spindle count; overrides the config preset
        #[arg(long)]
        ratio: Option<f32>,
        /// Spindle counts to advance in the simulation
        #[arg(long, allow_hyphen_values = true)]
        advance: i32,
        /// Tick budget for the run
        #[arg(long, value_name = "TICKS", default_value_t = 5_000_000)]
        max_ticks: u64,
    },
    /// Jog the leadscrew by a signed number of steps
    Jog {
        /// Steps to jog (negative jogs left)
        #[arg(long, allow_hyphen_values = true)]
        distance: i32,
        /// Tick budget for the run
        #[arg(long, value_name = "TICKS", default_value_t = 5_000_000)]
        max_ticks: u64,
    },
    /// Quick health check (sim backend ok)
    SelfCheck,
}
