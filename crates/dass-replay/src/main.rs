use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dass_abr::{AbrOptions, Policy};
use dass_replay::{BandwidthTrace, ReplayConfig, Simulation, ladder, playlist, read_input};
use tracing::info;

/// Replay a tagged media playlist through the ABR controller.
#[derive(Debug, Parser)]
#[command(name = "dass-replay")]
#[command(about = "Semantic-aware ABR replay over a bandwidth trace", long_about = None)]
struct Cli {
    /// Media playlist carrying the custom segment tags.
    #[arg(long, value_name = "FILE")]
    playlist: PathBuf,

    /// Bandwidth trace, one `<timestamp_ms> <kbps>` pair per line.
    #[arg(long, value_name = "FILE")]
    trace: Option<PathBuf>,

    /// Constant bandwidth used when no trace is given.
    #[arg(long, default_value_t = 2_000.0, value_name = "KBPS")]
    bandwidth_kbps: f64,

    /// Level as NAME=BITRATE[/PEAK], lowest first. Repeat for each level.
    #[arg(long = "level", value_name = "SPEC", value_parser = ladder::parse_level)]
    levels: Vec<dass_abr::Level>,

    /// baseline, risk-ceiling, privacy or privacy-risk-ceiling.
    #[arg(long, default_value_t = Policy::Baseline)]
    policy: Policy,

    #[arg(long, default_value_t = 3.0, value_name = "SECS")]
    fast_half_life: f64,

    #[arg(long, default_value_t = 9.0, value_name = "SECS")]
    slow_half_life: f64,

    #[arg(long, default_value_t = 500_000.0, value_name = "BPS")]
    default_estimate: f64,

    /// Time to first byte of every request.
    #[arg(long, default_value_t = 50.0, value_name = "MS")]
    latency_ms: f64,

    /// Substring marking privacy-redacted level names.
    #[arg(long, default_value = "_privacy")]
    privacy_marker: String,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let segments = playlist::parse(&read_input(&cli.playlist)?)
        .with_context(|| format!("parsing {}", cli.playlist.display()))?;
    let trace = match &cli.trace {
        Some(path) => BandwidthTrace::parse(&read_input(path)?)
            .with_context(|| format!("parsing {}", path.display()))?,
        None => BandwidthTrace::constant(cli.bandwidth_kbps),
    };
    let levels = if cli.levels.is_empty() {
        ladder::default_ladder(&cli.privacy_marker)
    } else {
        cli.levels.clone()
    };

    let options = AbrOptions::default()
        .with_policy(cli.policy)
        .with_half_lives(cli.fast_half_life, cli.slow_half_life)
        .with_default_estimate_bps(cli.default_estimate)
        .with_privacy_marker(cli.privacy_marker.clone());
    let cfg = ReplayConfig {
        options,
        latency_ms: cli.latency_ms,
    };

    info!(
        policy = %cli.policy,
        segments = segments.len(),
        levels = levels.len(),
        "=== dass replay ==="
    );
    let names: Vec<String> = levels
        .iter()
        .enumerate()
        .map(|(index, level)| level.name.clone().unwrap_or_else(|| format!("#{index}")))
        .collect();

    let mut sim = Simulation::new(cfg, levels, trace)?;
    let records = sim.run(&segments);

    for record in &records {
        info!(
            sn = record.sn,
            level = %names[record.level],
            risk = %record.tags.risk_label(),
            event = %record.tags.event_label(),
            privacy = %record.tags.privacy_label(),
            estimate_kbps = record.estimate_bps / 1_000.0,
            fetch_ms = record.total_ms,
            "{}",
            record.uri
        );
    }

    let summary = sim.summarize(&records);
    for (name, count) in names.iter().zip(&summary.per_level) {
        info!(level = %name, fetches = count, "level usage");
    }
    info!(
        privacy_share = summary.privacy_share(),
        mean_kbps = summary.mean_bitrate_bps / 1_000.0,
        mean_chunk_bytes = summary.mean_chunk_bytes,
        mean_delay_secs = summary.mean_delay_secs,
        elapsed_ms = summary.elapsed_ms,
        "=== replay complete ==="
    );
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
