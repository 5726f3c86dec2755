use chrono::NaiveDate;
use thiserror::Error;

use crate::{
    config::ConfigError, io::sink::SinkError, providers::ProviderInitError, schema::SchemaMismatch,
};

/// Caller-visible outcome of a failed resolution.
///
/// Per-candidate failures (fetch, parse, empty tables) never surface here; the
/// engine swallows them and moves on to the next candidate.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Every candidate was exhausted without producing a row.
    #[error(
        "no imbalance data for {requested} or the preceding days; the service may be unavailable"
    )]
    NoDataAvailable { requested: NaiveDate },

    /// Every candidate was exhausted and at least one report parsed but
    /// carried none of the known price/volume columns.
    #[error(transparent)]
    SchemaMismatch(#[from] SchemaMismatch),
}

/// The unified error type for the `imbalance_ingestor` crate.
#[derive(Debug, Error)]
pub enum Error {
    /// An error related to configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The HTTP document source could not be built.
    #[error("Provider initialization error: {0}")]
    ProviderInit(#[from] ProviderInitError),

    /// Resolution of a date failed.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Writing an export failed.
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),
}
