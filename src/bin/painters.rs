//! painters CLI: run one supervised painting session.

use clap::Parser;
use painters::config::Config;
use painters::engine::Supervisor;
use painters::telemetry::{TelemetryConfig, init_telemetry};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "painters", about = "Concurrent painters on a shared ASCII canvas")]
struct Cli {
    /// TOML config file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// Canvas width in cells
    #[arg(long)]
    width: Option<usize>,
    /// Canvas height in cells
    #[arg(long)]
    height: Option<usize>,
    /// Number of painters
    #[arg(long)]
    workers: Option<u32>,
    /// Drawing budget per painter, in seconds
    #[arg(long)]
    duration: Option<f64>,
    /// Number of snapshot rounds
    #[arg(long)]
    rounds: Option<usize>,
    /// Seconds between snapshot rounds
    #[arg(long)]
    interval: Option<f64>,
    /// Snapshot round (1-based) on which one painter is canceled
    #[arg(long, conflicts_with = "no_cancel")]
    cancel_round: Option<usize>,
    /// Never cancel a painter
    #[arg(long)]
    no_cancel: bool,
    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
    /// Write the run report as JSON to this path
    #[arg(long)]
    report: Option<PathBuf>,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(workers) = self.workers {
            config.worker_count = workers;
        }
        if let Some(duration) = self.duration {
            config.worker_duration_seconds = duration;
        }
        if let Some(rounds) = self.rounds {
            config.snapshot_rounds = rounds;
        }
        if let Some(interval) = self.interval {
            config.snapshot_interval_seconds = interval;
        }
        if let Some(round) = self.cancel_round {
            config.cancel_round = Some(round);
        }
        if self.no_cancel {
            config.cancel_round = None;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    config.validate()?;

    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "painters".to_string(),
        log_level: config.log_level.clone(),
    })?;

    let mut supervisor = Supervisor::new(config)?;
    let mut stdout = std::io::stdout().lock();
    let report = supervisor.run(&mut stdout).await?;

    if let Some(path) = cli.report {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(&path, json)?;
    }

    Ok(())
}
