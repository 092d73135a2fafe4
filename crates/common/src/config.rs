use std::path::PathBuf;

use crate::{Error, Result};

const DEFAULT_SYMBOLS: &str = "AAPL,GOOGL,MSFT,TSLA,AMZN";

/// Upper bound on `HISTORY_DAYS`, roughly forty years of trading days.
pub const MAX_HISTORY_DAYS: usize = 10_000;

/// Job configuration loaded from environment variables at startup.
///
/// Every value has a default, so an empty environment yields a runnable
/// local configuration. Malformed values are reported as `Error::Config`.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Root of the local data store.
    pub data_dir: PathBuf,
    /// Key prefix under `data_dir` for collected series.
    pub data_prefix: String,
    /// Symbols to collect, upper-cased and de-duplicated in input order.
    pub symbols: Vec<String>,
    /// Trading days of history requested per symbol.
    pub history_days: usize,
    /// Optional TOML file with indicator windows.
    pub indicator_config_path: Option<PathBuf>,
    /// Forecast horizon for the prediction step.
    pub days_ahead: usize,
}

impl Config {
    /// Load configuration from the process environment.
    /// Loads `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let history_days = parse_usize(&lookup, "HISTORY_DAYS", 365)?;
        if history_days > MAX_HISTORY_DAYS {
            return Err(Error::Config(format!(
                "HISTORY_DAYS must be at most {MAX_HISTORY_DAYS}, got {history_days}"
            )));
        }

        let symbols = parse_symbols(
            &lookup("SYMBOLS").unwrap_or_else(|| DEFAULT_SYMBOLS.to_string()),
        )?;

        Ok(Config {
            data_dir: lookup("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./data")),
            data_prefix: lookup("DATA_PREFIX").unwrap_or_else(|| "raw-data".to_string()),
            symbols,
            history_days,
            indicator_config_path: lookup("INDICATOR_CONFIG_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            days_ahead: parse_usize(&lookup, "DAYS_AHEAD", 5)?,
        })
    }
}

fn parse_usize<F>(lookup: &F, key: &str, default: usize) -> Result<usize>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<usize>().map_err(|_| {
            Error::Config(format!("{key} must be a non-negative integer, got: '{raw}'"))
        }),
    }
}

fn parse_symbols(raw: &str) -> Result<Vec<String>> {
    let mut symbols: Vec<String> = Vec::new();
    for s in raw.split(',') {
        let s = s.trim().to_uppercase();
        if s.is_empty() {
            continue;
        }
        if !symbols.contains(&s) {
            symbols.push(s);
        }
    }
    if symbols.is_empty() {
        return Err(Error::Config("SYMBOLS must name at least one symbol".into()));
    }
    Ok(symbols)
}
