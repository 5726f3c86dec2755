//! Canonical in-memory representation of one settlement interval.
//!
//! Every report vintage, official or indicative, is normalized into this shape
//! before it reaches a consumer. See [`crate::normalize`] for the cleaning rules.

use serde::{Deserialize, Serialize};

use crate::tz::MarketTime;

/// A single imbalance interval: price and net imbalance volume.
///
/// Both values are always present. Rows whose source text could not be
/// coerced to a number are dropped during normalization instead of being
/// defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SettlementRow {
    /// Start of the interval in Europe/Dublin, with the offset in force so
    /// the repeated hour of the autumn clock change stays unambiguous.
    pub interval_start: MarketTime,

    /// Imbalance price in currency per MWh.
    pub price: f64,

    /// Net imbalance volume in MW. Negative means the system was short,
    /// positive means it was long.
    pub volume: f64,
}

impl SettlementRow {
    pub fn new(interval_start: MarketTime, price: f64, volume: f64) -> Self {
        Self {
            interval_start,
            price,
            volume,
        }
    }

    /// `true` when the system was short (negative NIV) during this interval.
    pub fn is_short(&self) -> bool {
        self.volume < 0.0
    }

    /// `true` when the system was long (positive NIV) during this interval.
    pub fn is_long(&self) -> bool {
        self.volume > 0.0
    }
}
