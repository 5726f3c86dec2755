//! Headline statistics shown next to the chart.

use serde::Serialize;

use crate::{models::settlement::SettlementRow, tz::MarketTime};

/// Metric-card values for one resolved table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub intervals: usize,
    pub first_interval: MarketTime,
    pub latest_interval: MarketTime,
    pub latest_price: f64,
    pub latest_volume: f64,
    pub mean_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    /// Sum of NIV across all intervals.
    pub net_volume: f64,
    pub short_intervals: usize,
    pub long_intervals: usize,
}

impl DatasetSummary {
    /// Summarizes rows that are already sorted ascending. Returns `None` for
    /// an empty table.
    pub fn from_rows(rows: &[SettlementRow]) -> Option<Self> {
        let first = rows.first()?;
        let latest = rows.last()?;

        let mut min_price = f64::INFINITY;
        let mut max_price = f64::NEG_INFINITY;
        let mut price_total = 0.0;
        let mut net_volume = 0.0;
        let mut short_intervals = 0;
        let mut long_intervals = 0;

        for row in rows {
            min_price = min_price.min(row.price);
            max_price = max_price.max(row.price);
            price_total += row.price;
            net_volume += row.volume;
            if row.is_short() {
                short_intervals += 1;
            } else if row.is_long() {
                long_intervals += 1;
            }
        }

        Some(Self {
            intervals: rows.len(),
            first_interval: first.interval_start,
            latest_interval: latest.interval_start,
            latest_price: latest.price,
            latest_volume: latest.volume,
            mean_price: price_total / rows.len() as f64,
            min_price,
            max_price,
            net_volume,
            short_intervals,
            long_intervals,
        })
    }
}
