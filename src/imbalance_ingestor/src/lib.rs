//! Irish balancing-market imbalance data ingestor.
//!
//! Resolves the Net Imbalance Volume and Imbalance Price for a settlement day
//! from the market operator's published XML reports. Finalized 30-minute
//! reports are preferred; when none is published yet the provisional 5-minute
//! reports are rolled up to 30-minute buckets instead. Earlier days are tried
//! when the requested one has nothing at all.
//!
//! ```no_run
//! # async fn run() -> Result<(), imbalance_ingestor::errors::Error> {
//! use imbalance_ingestor::{build_engine, config::IngestorConfig};
//!
//! let engine = build_engine(&IngestorConfig::default())?;
//! let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
//! let dataset = engine.resolve(date).await?.require_data()?;
//! println!("{} rows from {:?}", dataset.rows.len(), dataset.source_kind);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod clock;
pub mod config;
pub mod engine;
pub mod errors;
pub mod io;
pub mod locator;
pub mod models;
pub mod normalize;
pub mod parser;
pub mod providers;
pub mod schema;
pub mod tz;

use clock::SystemClock;
use config::IngestorConfig;
use engine::AcquisitionEngine;
use providers::{ProviderInitError, semo_http::SemoHttpSource};

/// Builds an engine backed by the live report site and the system clock.
pub fn build_engine(config: &IngestorConfig) -> Result<AcquisitionEngine, ProviderInitError> {
    let source = SemoHttpSource::new(config)?;
    Ok(AcquisitionEngine::new(
        config,
        Arc::new(source),
        Arc::new(SystemClock),
    ))
}
