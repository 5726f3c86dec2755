//! The resolved, consumer-facing result of one acquisition.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{errors::ResolveError, locator::Strategy, models::settlement::SettlementRow};

/// Where the rows of a [`ResolvedDataset`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceKind {
    /// Finalized 30-minute settlement report.
    Official,
    /// Provisional 5-minute report, rolled up to 30-minute buckets.
    Indicative,
    /// Nothing could be resolved.
    None,
}

/// Output of [`AcquisitionEngine::resolve`](crate::engine::AcquisitionEngine::resolve).
///
/// Invariants:
/// - `rows` are strictly ascending by `interval_start`.
/// - `source_kind == SourceKind::None` implies `rows` is empty and
///   `resolved_date`/`strategy` are `None`.
/// - `source_kind == SourceKind::Indicative` implies `rows` are 30-minute buckets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedDataset {
    /// The date the caller asked for.
    pub requested_date: NaiveDate,
    /// The date that actually supplied the rows. Can be earlier than
    /// `requested_date` because the engine searches backward.
    pub resolved_date: Option<NaiveDate>,
    pub source_kind: SourceKind,
    /// Lookup strategy that produced the rows.
    pub strategy: Option<Strategy>,
    /// Documents that contributed at least one row.
    pub documents: Vec<String>,
    pub rows: Vec<SettlementRow>,
}

impl ResolvedDataset {
    /// An empty dataset signalling that every candidate was exhausted.
    pub fn none(requested_date: NaiveDate) -> Self {
        Self {
            requested_date,
            resolved_date: None,
            source_kind: SourceKind::None,
            strategy: None,
            documents: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// `true` when the dataset carries rows from some source.
    pub fn is_resolved(&self) -> bool {
        self.source_kind != SourceKind::None
    }

    /// `true` when the rows came from an earlier date than requested.
    pub fn is_fallback_date(&self) -> bool {
        self.resolved_date
            .is_some_and(|resolved| resolved != self.requested_date)
    }

    /// Converts a [`SourceKind::None`] dataset into [`ResolveError::NoDataAvailable`].
    pub fn require_data(self) -> Result<Self, ResolveError> {
        if self.is_resolved() {
            Ok(self)
        } else {
            Err(ResolveError::NoDataAvailable {
                requested: self.requested_date,
            })
        }
    }
}
