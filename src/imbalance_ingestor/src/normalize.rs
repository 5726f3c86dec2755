//! Temporal normalization.
//!
//! Raw text -> typed [`SettlementRow`]s, in three steps:
//! 1. [`coerce_rows`]: numeric/time coercion, dropping rows with a missing
//!    price, volume or timestamp.
//! 2. [`finalize`]: ascending order and one row per `interval_start`, with
//!    sub-resolution reports rolled up to 30-minute buckets.
//! 3. [`normalize`]: both of the above for a single table.
//!
//! Indicative reports arrive one 5-minute document at a time, so the engine
//! coerces each document separately and calls [`finalize`] once on the union.

use std::collections::BTreeMap;

use crate::{
    models::{
        report::{ReportKind, SETTLEMENT_INTERVAL_MINUTES},
        settlement::SettlementRow,
    },
    parser::RawTable,
    schema::SchemaMapping,
    tz::{MarketTime, floor_market_time, parse_interval_start},
};

/// Parses a numeric cell. Blank, `"None"`, `NaN` and infinities are missing,
/// never zero.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Coerces every record of `table` using `mapping`, keeping only complete rows.
/// Output order follows the document.
pub fn coerce_rows(table: &RawTable, mapping: &SchemaMapping) -> Vec<SettlementRow> {
    table
        .records()
        .iter()
        .filter_map(|record| {
            let interval_start = parse_interval_start(record.get(&mapping.time_field)?)?;
            let price = parse_number(record.get(&mapping.price_field)?)?;
            let volume = parse_number(record.get(&mapping.volume_field)?)?;
            Some(SettlementRow::new(interval_start, price, volume))
        })
        .collect()
}

/// Sorts, deduplicates (first occurrence wins) and, for sub-resolution
/// reports, aggregates to settlement buckets.
///
/// Ordering and duplicates are by instant, so the two 01:30 intervals of the
/// autumn clock change are both kept.
pub fn finalize(mut rows: Vec<SettlementRow>, report: ReportKind) -> Vec<SettlementRow> {
    rows.sort_by_key(|row| row.interval_start);
    rows.dedup_by_key(|row| row.interval_start);

    if report.needs_aggregation() {
        aggregate(&rows, SETTLEMENT_INTERVAL_MINUTES)
    } else {
        rows
    }
}

/// Coerces and finalizes one table.
pub fn normalize(table: &RawTable, mapping: &SchemaMapping, report: ReportKind) -> Vec<SettlementRow> {
    finalize(coerce_rows(table, mapping), report)
}

/// Rolls rows up into day-aligned buckets of `minutes`: volume is summed,
/// price is the arithmetic mean. Buckets without rows are not emitted.
pub fn aggregate(rows: &[SettlementRow], minutes: i64) -> Vec<SettlementRow> {
    let mut buckets: BTreeMap<MarketTime, (f64, f64, usize)> = BTreeMap::new();
    for row in rows {
        let entry = buckets
            .entry(floor_market_time(row.interval_start, minutes))
            .or_insert((0.0, 0.0, 0));
        entry.0 += row.price;
        entry.1 += row.volume;
        entry.2 += 1;
    }

    buckets
        .into_iter()
        .map(|(start, (price_total, volume, count))| {
            SettlementRow::new(start, price_total / count as f64, volume)
        })
        .collect()
}
