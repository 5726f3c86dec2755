//! The two report families published by the market operator.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::models::dataset::SourceKind;

/// Width of one canonical settlement interval.
pub const SETTLEMENT_INTERVAL_MINUTES: i64 = 30;

/// Width of one indicative (provisional) interval.
pub const INDICATIVE_INTERVAL_MINUTES: i64 = 5;

/// Which report family a fetch targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// Finalized 30-minute average imbalance price report.
    Official,
    /// Provisional 5-minute imbalance price report.
    Indicative,
}

impl ReportKind {
    /// Document filename prefix used on the operator's document store.
    pub fn file_prefix(self) -> &'static str {
        match self {
            ReportKind::Official => "PUB_30MinAvgImbalPrc",
            ReportKind::Indicative => "PUB_5MinImbalPrc",
        }
    }

    /// Native interval width of rows in this report.
    pub fn resolution(self) -> Duration {
        match self {
            ReportKind::Official => Duration::minutes(SETTLEMENT_INTERVAL_MINUTES),
            ReportKind::Indicative => Duration::minutes(INDICATIVE_INTERVAL_MINUTES),
        }
    }

    /// Whether rows of this report must be rolled up to settlement resolution.
    pub fn needs_aggregation(self) -> bool {
        self.resolution() < Duration::minutes(SETTLEMENT_INTERVAL_MINUTES)
    }

    pub fn source_kind(self) -> SourceKind {
        match self {
            ReportKind::Official => SourceKind::Official,
            ReportKind::Indicative => SourceKind::Indicative,
        }
    }
}
