use std::fs;

use clap::Parser;
use eyre::WrapErr;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

mod cli;
mod error_fmt;
mod sim;

use cli::{Cli, Commands, FILE_GUARD};
use error_fmt::humanize;
use sim::RunSummary;

/// Build a file sink writer with optional rotation, storing the non-blocking
/// guard in OnceLock so it lives for the whole process.
fn file_layer(
    file: Option<&str>,
    rotation: Option<&str>,
) -> Option<tracing_appender::non_blocking::NonBlocking> {
    let path = file?;
    let p = std::path::Path::new(path);
    if let Some(parent) = p.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let file_appender = match rotation.unwrap_or("never").to_ascii_lowercase().as_str() {
        "daily" => tracing_appender::rolling::daily(".", path),
        "hourly" => tracing_appender::rolling::hourly(".", path),
        _ => tracing_appender::rolling::never(".", path),
    };
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    let _ = FILE_GUARD.set(guard);
    Some(nb_writer)
}

/// Initialize tracing once for the whole app. Logs go to stderr so JSON
/// summaries on stdout stay machine-parseable.
fn init_tracing(json: bool, level: &str, file: Option<&str>, rotation: Option<&str>) {
    type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let console: BoxedLayer = if json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().with_writer(std::io::stderr).boxed()
    };
    let mut layers: Vec<BoxedLayer> = vec![console];
    if let Some(nb) = file_layer(file, rotation) {
        layers.push(fmt::layer().json().with_ansi(false).with_writer(nb).boxed());
    }
    tracing_subscriber::registry().with(layers).with(filter).init();
}

fn load_config(cli: &Cli) -> eyre::Result<Option<els_config::Config>> {
    match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|e| eyre::eyre!("read config {}: {e}", path.display()))?;
            let cfg = els_config::load_toml(&text)
                .map_err(|e| eyre::eyre!("parse config {}: {e}", path.display()))?;
            cfg.validate()
                .map_err(|e| eyre::eyre!(e))
                .wrap_err("invalid configuration")?;
            Ok(Some(cfg))
        }
        None => Ok(None),
    }
}

fn print_summary(event: &str, s: &RunSummary, json: bool) {
    if json {
        println!(
            "{}",
            serde_json::json!({
                "event": event,
                "ticks": s.ticks,
                "final_position": s.final_position,
                "expected_position": s.expected_position,
                "pulses": s.pulses,
                "velocity_mm_per_s": s.velocity_mm_per_s,
            })
        );
    } else {
        println!(
            "{event}: position {} ({} pulses, {} ticks, {:.3} mm/s)",
            s.final_position, s.pulses, s.ticks, s.velocity_mm_per_s
        );
    }
}

fn report_error(err: &eyre::Report, json: bool) {
    if json {
        eprintln!(
            "{}",
            serde_json::json!({"event": "error", "message": err.to_string()})
        );
    } else {
        eprintln!("{}", humanize(err));
    }
}

fn dispatch(cli: &Cli, cfg: Option<&els_config::Config>) -> eyre::Result<()> {
    match &cli.cmd {
        Commands::Track {
            ratio,
            advance,
            max_ticks,
        } => {
            let summary = sim::run_track(cfg, *ratio, *advance, *max_ticks)?;
            print_summary("track complete", &summary, cli.json);
        }
        Commands::Jog { distance, max_ticks } => {
            let summary = sim::run_jog(cfg, *distance, *max_ticks)?;
            print_summary("jog complete", &summary, cli.json);
        }
        Commands::SelfCheck => {
            let summary = sim::self_check()?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({"event": "self_check", "ok": true, "ticks": summary.ticks})
                );
            } else {
                println!("self-check ok ({} ticks)", summary.ticks);
            }
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    // Load config first so its [logging] table can shape the subscriber.
    let cfg = match load_config(&cli) {
        Ok(c) => c,
        Err(err) => {
            eprintln!("{}", humanize(&err));
            std::process::exit(1);
        }
    };

    let level = cfg
        .as_ref()
        .and_then(|c| c.logging.level.clone())
        .unwrap_or_else(|| cli.log_level.clone());
    let file = cfg.as_ref().and_then(|c| c.logging.file.clone());
    let rotation = cfg.as_ref().and_then(|c| c.logging.rotation.clone());
    init_tracing(cli.json, &level, file.as_deref(), rotation.as_deref());

    if let Err(err) = dispatch(&cli, cfg.as_ref()) {
        report_error(&err, cli.json);
        std::process::exit(1);
    }
}
