use std::env;
use std::fs;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::db::{ExerciseCategory, ExerciseDefinition};
use crate::error::AppError;

const DEFAULT_DATABASE_PATH: &str = "league_of_gains.db";
const DEFAULT_WORKER_THREADS: usize = 4;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;
const DEFAULT_RATE_LIMIT_TOKENS: u32 = 20;
const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 25;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;
const DEFAULT_MATCH_HISTORY_DEPTH: u32 = 15;
const DEFAULT_LOG_FILTER: &str = "info";

/// Where and how much to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Filter used when `RUST_LOG` is unset.
    pub default_filter: String,
    /// Daily rolling files are written here when set.
    pub dir: Option<PathBuf>,
    pub max_files: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub riot_api_key: String,
    pub database_path: PathBuf,
    pub worker_threads: usize,
    pub poll_interval: Duration,
    pub riot_rate_limit_tokens: NonZeroU32,
    pub riot_rate_limit_window: Duration,
    pub riot_request_timeout: Duration,
    pub match_history_depth: u32,
    pub exercises_file: Option<PathBuf>,
    pub log: LogSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let discord_token = lookup("DISCORD_TOKEN")
            .ok_or_else(|| AppError::Config("DISCORD_TOKEN must be set".into()))?;

        let riot_api_key = lookup("RIOT_API_KEY")
            .ok_or_else(|| AppError::Config("RIOT_API_KEY must be set".into()))?;

        let database_path = lookup("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH));

        let worker_threads = parsed(&lookup, "WORKER_THREADS")
            .filter(|n: &usize| *n > 0)
            .unwrap_or(DEFAULT_WORKER_THREADS);

        let poll_interval = Duration::from_secs(
            parsed(&lookup, "POLL_INTERVAL_SECS").unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
        );

        let riot_rate_limit_tokens = parsed(&lookup, "RIOT_RATE_LIMIT_TOKENS")
            .and_then(NonZeroU32::new)
            .unwrap_or_else(|| {
                NonZeroU32::new(DEFAULT_RATE_LIMIT_TOKENS).unwrap_or(NonZeroU32::MIN)
            });

        let riot_rate_limit_window = Duration::from_secs(
            parsed(&lookup, "RIOT_RATE_LIMIT_WINDOW_SECS")
                .unwrap_or(DEFAULT_RATE_LIMIT_WINDOW_SECS),
        );

        let riot_request_timeout = Duration::from_secs(
            parsed(&lookup, "RIOT_REQUEST_TIMEOUT_SECS").unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        );

        let match_history_depth = parsed(&lookup, "MATCH_HISTORY_DEPTH")
            .filter(|n: &u32| *n > 0)
            .unwrap_or(DEFAULT_MATCH_HISTORY_DEPTH);

        let exercises_file = lookup("EXERCISES_FILE").map(PathBuf::from);

        let log = LogSettings {
            default_filter: lookup("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            dir: lookup("LOG_DIR").map(PathBuf::from),
            max_files: parsed(&lookup, "LOG_MAX_FILES").filter(|n: &usize| *n > 0),
        };

        Ok(Self {
            discord_token,
            riot_api_key,
            database_path,
            worker_threads,
            poll_interval,
            riot_rate_limit_tokens,
            riot_rate_limit_window,
            riot_request_timeout,
            match_history_depth,
            exercises_file,
            log,
        })
    }
}

fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

#[derive(Debug, Deserialize)]
struct ExerciseEntry {
    #[serde(default = "default_exercise_name")]
    name: String,
    #[serde(default = "default_exercise_count")]
    count: u32,
    #[serde(default = "default_exercise_type", rename = "type")]
    kind: String,
}

fn default_exercise_name() -> String {
    "Unnamed Exercise".into()
}

fn default_exercise_count() -> u32 {
    10
}

fn default_exercise_type() -> String {
    "core".into()
}

/// Read the exercise catalogue, a JSON array of `{ "name", "count", "type" }`.
pub fn load_exercises(path: &Path) -> Result<Vec<ExerciseDefinition>, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    parse_exercises(&raw)
}

pub fn parse_exercises(raw: &str) -> Result<Vec<ExerciseDefinition>, AppError> {
    let entries: Vec<ExerciseEntry> = serde_json::from_str(raw)
        .map_err(|e| AppError::Config(format!("invalid exercise catalogue: {e}")))?;

    Ok(entries
        .into_iter()
        .map(|entry| ExerciseDefinition {
            name: entry.name,
            set_count: entry.count,
            category: ExerciseCategory::from_label(&entry.kind),
        })
        .collect())
}
