pub mod info;
pub mod list;
pub mod search;
pub mod track;

use anyhow::{Context as _, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::ValueEnum;
use commitlog_core::{RecordStore, TrackerConfig};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Settings resolved once from the global flags.
pub struct Context {
    pub repo: PathBuf,
    pub config: TrackerConfig,
    pub format: OutputFormat,
}

impl Context {
    pub fn new(
        repo: PathBuf,
        config_path: Option<PathBuf>,
        log: Option<PathBuf>,
        format: OutputFormat,
    ) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => TrackerConfig::load(&path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?,
            None => TrackerConfig::default(),
        };
        if let Some(log) = log {
            config = config.with_log_path(log);
        }

        Ok(Self {
            repo,
            config,
            format,
        })
    }

    pub fn store(&self) -> RecordStore {
        RecordStore::new(&self.config)
    }
}

pub fn parse_since(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_date(raw, NaiveTime::MIN)
}

pub fn parse_until(raw: &str) -> Result<DateTime<Utc>, String> {
    let end_of_day = NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999)
        .ok_or_else(|| "invalid end of day".to_string())?;
    parse_date(raw, end_of_day)
}

/// RFC 3339, or a bare `YYYY-MM-DD` taken at `time_of_day` UTC.
fn parse_date(raw: &str, time_of_day: NaiveTime) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| date.and_time(time_of_day).and_utc())
        .map_err(|_| format!("'{}' is not an RFC 3339 timestamp or YYYY-MM-DD date", raw))
}
