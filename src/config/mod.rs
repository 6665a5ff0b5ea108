//! Typed run configuration.
//!
//! Compiled defaults, then an optional TOML file, then `PAINTERS_*`
//! environment variables; the CLI applies its flags last. Loaded once at
//! startup and validated before anything is allocated.

use crate::engine::subtask::SubTaskCommand;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Upper bound for any configured duration (one day).
const MAX_SECONDS: f64 = 86_400.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Canvas width in cells.
    pub width: usize,
    /// Canvas height in cells.
    pub height: usize,
    #[serde(alias = "workerCount")]
    pub worker_count: u32,
    /// Drawing budget of each painter.
    #[serde(alias = "workerDurationSeconds")]
    pub worker_duration_seconds: f64,
    #[serde(alias = "snapshotRounds")]
    pub snapshot_rounds: usize,
    #[serde(alias = "snapshotIntervalSeconds")]
    pub snapshot_interval_seconds: f64,
    /// 1-based snapshot round on which one live painter is canceled.
    #[serde(alias = "cancelRound")]
    pub cancel_round: Option<usize>,
    /// Delay between painter launches.
    #[serde(alias = "launchStaggerMs")]
    pub launch_stagger_ms: u64,
    #[serde(alias = "drawIntervalMinSeconds")]
    pub draw_interval_min_seconds: f64,
    #[serde(alias = "drawIntervalMaxSeconds")]
    pub draw_interval_max_seconds: f64,
    /// Chance per drawing iteration that a painter cancels its live sub-task.
    #[serde(alias = "subtaskCancelProbability")]
    pub subtask_cancel_probability: f64,
    pub subtask: SubTaskCommand,
    /// Run seed. Unset means fresh entropy per run.
    pub seed: Option<u64>,
    #[serde(alias = "otelEndpoint")]
    pub otel_endpoint: Option<String>,
    #[serde(alias = "logLevel")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 50,
            height: 15,
            worker_count: 2,
            worker_duration_seconds: 8.0,
            snapshot_rounds: 5,
            snapshot_interval_seconds: 3.0,
            cancel_round: Some(3),
            launch_stagger_ms: 100,
            draw_interval_min_seconds: 1.0,
            draw_interval_max_seconds: 2.0,
            subtask_cancel_probability: 0.2,
            subtask: SubTaskCommand::default(),
            seed: None,
            otel_endpoint: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Defaults, overlaid with `path` if given, then with the environment.
    ///
    /// Not validated: callers layer their own overrides on top and call
    /// [`Config::validate`] once the final values are in place.
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Parse a TOML file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("bad config {}: {e}", path.display())))
    }

    /// Override fields from `PAINTERS_*` variables (and `OTEL_ENDPOINT`,
    /// `LOG_LEVEL`) when they are set.
    pub fn apply_env(&mut self) -> Result<()> {
        override_var("PAINTERS_WIDTH", &mut self.width)?;
        override_var("PAINTERS_HEIGHT", &mut self.height)?;
        override_var("PAINTERS_WORKER_COUNT", &mut self.worker_count)?;
        override_var(
            "PAINTERS_WORKER_DURATION_SECONDS",
            &mut self.worker_duration_seconds,
        )?;
        override_var("PAINTERS_SNAPSHOT_ROUNDS", &mut self.snapshot_rounds)?;
        override_var(
            "PAINTERS_SNAPSHOT_INTERVAL_SECONDS",
            &mut self.snapshot_interval_seconds,
        )?;
        if let Some(seed) = parse_var("PAINTERS_SEED")? {
            self.seed = Some(seed);
        }
        if let Ok(endpoint) = std::env::var("OTEL_ENDPOINT") {
            self.otel_endpoint = Some(endpoint);
        }
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.log_level = level;
        }
        Ok(())
    }

    /// Fail fast on values the run cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::Config("canvas dimensions must be non-zero".into()));
        }
        if self.worker_count == 0 {
            return Err(Error::Config("worker_count must be at least 1".into()));
        }
        for (name, secs) in [
            ("worker_duration_seconds", self.worker_duration_seconds),
            ("snapshot_interval_seconds", self.snapshot_interval_seconds),
            ("draw_interval_min_seconds", self.draw_interval_min_seconds),
            ("draw_interval_max_seconds", self.draw_interval_max_seconds),
        ] {
            if !secs.is_finite() || !(0.0..=MAX_SECONDS).contains(&secs) {
                return Err(Error::Config(format!(
                    "{name} must be between 0 and {MAX_SECONDS} seconds, got {secs}"
                )));
            }
        }
        if self.draw_interval_min_seconds > self.draw_interval_max_seconds {
            return Err(Error::Config(
                "draw_interval_min_seconds exceeds draw_interval_max_seconds".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.subtask_cancel_probability) {
            return Err(Error::Config(format!(
                "subtask_cancel_probability must be within [0, 1], got {}",
                self.subtask_cancel_probability
            )));
        }
        if let Some(round) = self.cancel_round
            && (round == 0 || round > self.snapshot_rounds)
        {
            return Err(Error::Config(format!(
                "cancel_round {round} is outside 1..={}",
                self.snapshot_rounds
            )));
        }
        if self.subtask.program.is_empty() {
            return Err(Error::Config("subtask.program must not be empty".into()));
        }
        Ok(())
    }

    pub fn worker_duration(&self) -> Duration {
        seconds(self.worker_duration_seconds)
    }

    pub fn snapshot_interval(&self) -> Duration {
        seconds(self.snapshot_interval_seconds)
    }

    pub fn launch_stagger(&self) -> Duration {
        Duration::from_millis(self.launch_stagger_ms)
    }

    /// Bounds of the randomized pause between drawing iterations.
    pub fn draw_interval(&self) -> (Duration, Duration) {
        (
            seconds(self.draw_interval_min_seconds),
            seconds(self.draw_interval_max_seconds),
        )
    }
}

fn seconds(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or_default()
}

fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::Config(format!("{name}={raw:?} is invalid: {e}"))),
        Err(_) => Ok(None),
    }
}

fn override_var<T: FromStr>(name: &str, field: &mut T) -> Result<()>
where
    T::Err: std::fmt::Display,
{
    if let Some(value) = parse_var(name)? {
        *field = value;
    }
    Ok(())
}
