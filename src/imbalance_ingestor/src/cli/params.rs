use chrono::{DateTime, NaiveDate, Utc};

use crate::{config::IngestorConfig, errors::Error, tz::market_today};

/// Parses a `YYYY-MM-DD` command-line date.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD, got {s:?}: {e}"))
}

/// The date to resolve: the explicit one, else today in the market time zone.
pub fn target_date(explicit: Option<NaiveDate>, now: DateTime<Utc>) -> NaiveDate {
    explicit.unwrap_or_else(|| market_today(now))
}

/// Loads the config file if given, then applies environment overrides.
pub fn load_config(path: Option<&std::path::Path>) -> Result<IngestorConfig, Error> {
    let config = match path {
        Some(path) => IngestorConfig::from_path(path)?,
        None => IngestorConfig::default(),
    };
    Ok(config.with_env_overrides()?)
}
