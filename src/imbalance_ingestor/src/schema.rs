//! Column resolution across report vintages.
//!
//! The operator has renamed the price and volume columns several times. Each
//! role has a fixed priority list of historical names; the first one present in
//! a table wins.

use thiserror::Error;

/// Time column. Has never been renamed.
pub const TIME_FIELD: &str = "START_TIME";

/// Price column names, most preferred first.
pub const PRICE_ALIASES: [&str; 3] = [
    "IMBALANCE_SETTLEMENT_PRICE",
    "IMBALANCE_PRICE",
    "NET_IMBALANCE_PRICE",
];

/// Volume column names, most preferred first.
pub const VOLUME_ALIASES: [&str; 3] = ["NET_IMBALANCE_VOLUME", "QNIV", "VOLUME"];

/// Which raw field fills each canonical role for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaMapping {
    pub time_field: String,
    pub price_field: String,
    pub volume_field: String,
}

/// The table's columns did not match any known vintage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("format error: columns found = [{}]", .columns.join(", "))]
pub struct SchemaMismatch {
    /// Every field name present in the raw table, in first-seen order.
    pub columns: Vec<String>,
}

/// Maps the fields of a raw table onto the canonical schema.
///
/// All three roles must resolve; a table without a price or a volume column
/// cannot be normalized and yields [`SchemaMismatch`].
pub fn resolve_columns<S: AsRef<str>>(fields: &[S]) -> Result<SchemaMapping, SchemaMismatch> {
    let has = |name: &str| fields.iter().any(|f| f.as_ref() == name);
    let pick = |aliases: &[&'static str]| aliases.iter().copied().find(|&alias| has(alias));

    match (has(TIME_FIELD), pick(&PRICE_ALIASES[..]), pick(&VOLUME_ALIASES[..])) {
        (true, Some(price), Some(volume)) => Ok(SchemaMapping {
            time_field: TIME_FIELD.to_string(),
            price_field: price.to_string(),
            volume_field: volume.to_string(),
        }),
        _ => Err(SchemaMismatch {
            columns: fields.iter().map(|f| f.as_ref().to_string()).collect(),
        }),
    }
}
