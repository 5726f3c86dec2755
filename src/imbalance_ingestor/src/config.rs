//! Ingestor configuration: defaults, TOML loading and validation.
//!
//! Every knob has a default, so an empty file (or no file at all) is a valid
//! configuration. Bounds such as the lookback window or the publication times
//! are implementation choices rather than contracts of the remote service,
//! which is why they live here instead of in code.
//!
//! ```toml
//! base_url = "https://reports.sem-o.com"
//! cache_ttl_secs = 900
//!
//! [locator]
//! lookback_days = 5
//! indicative_window_minutes = 180
//! official_publication_times = ["2330", "2300", "0000"]
//! ```
//!
//! Entrypoints: [`IngestorConfig::from_toml_str`], [`IngestorConfig::from_path`],
//! [`IngestorConfig::with_env_overrides`].

use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use shared_utils::env::{EnvVarError, env_override};
use thiserror::Error;

use crate::{locator::PolicyStep, models::report::ReportKind};

/// Environment variable that overrides [`IngestorConfig::base_url`].
pub const BASE_URL_ENV: &str = "IMBALANCE_BASE_URL";

const MAX_LOOKBACK_DAYS: u32 = 31;
const MAX_WINDOW_MINUTES: u32 = 24 * 60;
const MAX_CACHE_TTL_SECS: u64 = 24 * 60 * 60;

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Env(#[from] EnvVarError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration of the ingestor.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestorConfig {
    /// Report site root, without a trailing slash.
    pub base_url: String,
    /// Browser-like identification sent with every request.
    pub user_agent: String,
    /// Timeout for directory-guess document requests.
    pub probe_timeout_secs: u64,
    /// Timeout for catalog queries and the documents they name.
    pub catalog_timeout_secs: u64,
    /// Request pacing against the remote service.
    pub requests_per_second: u32,
    /// How long a successful resolution is reused.
    pub cache_ttl_secs: u64,
    pub locator: LocatorConfig,
}

impl Default for IngestorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://reports.sem-o.com".to_string(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".to_string(),
            probe_timeout_secs: 5,
            catalog_timeout_secs: 20,
            requests_per_second: 4,
            cache_ttl_secs: 15 * 60,
            locator: LocatorConfig::default(),
        }
    }
}

/// Candidate planning bounds and catalog parameters.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocatorConfig {
    /// Prior calendar dates searched after the requested one.
    pub lookback_days: u32,
    /// How far back from "now" the 5-minute scan reaches.
    pub indicative_window_minutes: u32,
    /// `HHMM` stamps tried, in order, when guessing official document names.
    pub official_publication_times: Vec<String>,
    /// Catalog endpoint path below `base_url`.
    pub catalog_path: String,
    pub catalog_page_size: u32,
    pub official_report_name: String,
    pub indicative_report_name: String,
    /// Ordered (report, strategy) steps. Official steps must precede
    /// indicative ones.
    pub policy: Vec<PolicyStep>,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            lookback_days: 5,
            indicative_window_minutes: 180,
            official_publication_times: vec!["2330".into(), "2300".into(), "0000".into()],
            catalog_path: "/api/v1/documents/static-reports".to_string(),
            catalog_page_size: 100,
            official_report_name: "Imbalance Settlement Price 30 Minute Average".to_string(),
            indicative_report_name: "Imbalance Price 5 Minute".to_string(),
            policy: PolicyStep::default_policy(),
        }
    }
}

impl IngestorConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&s)
    }

    /// Applies [`BASE_URL_ENV`] if set, then re-validates.
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Some(base_url) = env_override::<String>(BASE_URL_ENV)? {
            self.base_url = base_url;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn catalog_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog_timeout_secs)
    }

    /// Clamped to a day, so an unvalidated config cannot overflow.
    pub fn cache_ttl(&self) -> chrono::Duration {
        let secs = self.cache_ttl_secs.min(MAX_CACHE_TTL_SECS);
        chrono::Duration::seconds(i64::try_from(secs).unwrap_or(0))
    }

    /// `base_url` without trailing slashes.
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.base().trim().is_empty() {
            return invalid("base_url cannot be empty".into());
        }
        if self.user_agent.trim().is_empty() {
            return invalid("user_agent cannot be empty".into());
        }
        if self.probe_timeout_secs == 0 || self.catalog_timeout_secs == 0 {
            return invalid("timeouts must be at least one second".into());
        }
        if self.requests_per_second == 0 {
            return invalid("requests_per_second must be positive".into());
        }
        if !(1..=MAX_CACHE_TTL_SECS).contains(&self.cache_ttl_secs) {
            return invalid(format!(
                "cache_ttl_secs must be within 1..={MAX_CACHE_TTL_SECS}, got {}",
                self.cache_ttl_secs
            ));
        }

        let loc = &self.locator;
        if loc.lookback_days > MAX_LOOKBACK_DAYS {
            return invalid(format!(
                "lookback_days {} exceeds {MAX_LOOKBACK_DAYS}",
                loc.lookback_days
            ));
        }
        if !(5..=MAX_WINDOW_MINUTES).contains(&loc.indicative_window_minutes) {
            return invalid(format!(
                "indicative_window_minutes must be within 5..={MAX_WINDOW_MINUTES}, got {}",
                loc.indicative_window_minutes
            ));
        }
        if let Some(bad) = loc
            .official_publication_times
            .iter()
            .find(|t| parse_hhmm(t).is_none())
        {
            return invalid(format!("publication time {bad:?} is not a valid HHMM stamp"));
        }
        if loc.catalog_page_size == 0 {
            return invalid("catalog_page_size must be positive".into());
        }
        if loc.policy.is_empty() {
            return invalid("policy must contain at least one step".into());
        }
        if let Some(first_indicative) = loc
            .policy
            .iter()
            .position(|step| step.report == ReportKind::Indicative)
        {
            if loc.policy[first_indicative..]
                .iter()
                .any(|step| step.report == ReportKind::Official)
            {
                return invalid("official policy steps must come before indicative ones".into());
            }
        }

        Ok(())
    }
}

/// Parses an `HHMM` stamp into (hour, minute).
pub fn parse_hhmm(stamp: &str) -> Option<(u32, u32)> {
    if stamp.len() != 4 || !stamp.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hour: u32 = stamp[..2].parse().ok()?;
    let minute: u32 = stamp[2..].parse().ok()?;
    (hour < 24 && minute < 60).then_some((hour, minute))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::Strategy;

    #[test]
    fn empty_document_is_the_default() {
        let config = IngestorConfig::from_toml_str("").unwrap();
        assert_eq!(config, IngestorConfig::default());
        assert_eq!(config.cache_ttl(), chrono::Duration::minutes(15));
        assert_eq!(config.probe_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let config = IngestorConfig::from_toml_str(
            r#"
base_url = "http://localhost:8080/"

[locator]
lookback_days = 6
official_publication_times = ["1100"]
"#,
        )
        .unwrap();
        assert_eq!(config.base(), "http://localhost:8080");
        assert_eq!(config.locator.lookback_days, 6);
        assert_eq!(config.locator.official_publication_times, ["1100"]);
        assert_eq!(config.locator.indicative_window_minutes, 180);
    }

    #[test]
    fn policy_is_read_from_toml() {
        let config = IngestorConfig::from_toml_str(
            r#"
[[locator.policy]]
report = "official"
strategy = "directory_guess"

[[locator.policy]]
report = "indicative"
strategy = "catalog"
"#,
        )
        .unwrap();
        assert_eq!(config.locator.policy.len(), 2);
        assert_eq!(config.locator.policy[0].strategy, Strategy::DirectoryGuess);
        assert_eq!(config.locator.policy[1].report, ReportKind::Indicative);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            IngestorConfig::from_toml_str("retries = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn indicative_before_official_is_rejected() {
        let err = IngestorConfig::from_toml_str(
            r#"
[[locator.policy]]
report = "indicative"
strategy = "catalog"

[[locator.policy]]
report = "official"
strategy = "catalog"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("official policy steps"));
    }

    #[test]
    fn out_of_range_bounds_are_rejected() {
        for doc in [
            "cache_ttl_secs = 0",
            "cache_ttl_secs = 100000000000000",
            "cache_ttl_secs = 86401",
            "probe_timeout_secs = 0",
            "requests_per_second = 0",
            "[locator]\nlookback_days = 400",
            "[locator]\nindicative_window_minutes = 0",
            "[locator]\nofficial_publication_times = [\"2460\"]",
            "[locator]\npolicy = []",
        ] {
            assert!(
                matches!(IngestorConfig::from_toml_str(doc), Err(ConfigError::Invalid(_))),
                "{doc} should be invalid"
            );
        }
    }

    #[test]
    fn cache_ttl_accepts_a_full_day() {
        let config = IngestorConfig::from_toml_str("cache_ttl_secs = 86400").unwrap();
        assert_eq!(config.cache_ttl(), chrono::Duration::days(1));
    }

    #[test]
    fn unvalidated_cache_ttl_is_clamped() {
        let config = IngestorConfig {
            cache_ttl_secs: u64::MAX,
            ..IngestorConfig::default()
        };
        assert_eq!(config.cache_ttl(), chrono::Duration::days(1));
    }

    #[test]
    fn hhmm_stamps() {
        assert_eq!(parse_hhmm("0000"), Some((0, 0)));
        assert_eq!(parse_hhmm("2330"), Some((23, 30)));
        assert_eq!(parse_hhmm("930"), None);
        assert_eq!(parse_hhmm("24:0"), None);
        assert_eq!(parse_hhmm("1260"), None);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = IngestorConfig::from_path(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
