use std::path::PathBuf;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use snafu::{Backtrace, ResultExt, Snafu};

use crate::models::{dataset::ResolvedDataset, settlement::SettlementRow};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SinkError {
    /// Nothing was resolved, so there is no date to name the export after.
    #[snafu(display("nothing to export for {requested}: no data was resolved"))]
    Unresolved {
        requested: NaiveDate,
        backtrace: Backtrace,
    },

    /// Serializing rows to CSV failed.
    #[snafu(display("CSV serialization error: {source}"))]
    Csv {
        source: csv::Error,
        backtrace: Backtrace,
    },

    /// The CSV writer produced bytes that are not UTF-8.
    #[snafu(display("CSV output is not valid UTF-8: {source}"))]
    Encoding {
        source: std::string::FromUtf8Error,
        backtrace: Backtrace,
    },

    /// A generic I/O error.
    #[snafu(display("I/O error on {}: {source}", path.display()))]
    Io {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },
}

#[async_trait]
pub trait DataSink {
    /// The type of output returned after a successful write operation.
    ///
    /// A file sink returns the path it wrote; an in-memory sink could return
    /// the serialized text.
    type Output;

    /// Writes one resolved dataset to the destination.
    async fn write(&self, data: &ResolvedDataset) -> Result<Self::Output, SinkError>;
}

/// Export filename for a resolved date: `imbalance_{YYYY-MM-DD}.csv`.
pub fn export_file_name(resolved_date: NaiveDate) -> String {
    format!("imbalance_{}.csv", resolved_date.format("%Y-%m-%d"))
}

/// Timestamp layout of the export: Dublin wall clock plus its UTC offset.
const INTERVAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

#[derive(Serialize)]
struct CsvRow {
    interval_start: String,
    price: f64,
    volume: f64,
}

impl From<&SettlementRow> for CsvRow {
    fn from(row: &SettlementRow) -> Self {
        Self {
            interval_start: row.interval_start.format(INTERVAL_FORMAT).to_string(),
            price: row.price,
            volume: row.volume,
        }
    }
}

/// Serializes rows with an `interval_start,price,volume` header.
pub fn to_csv_bytes(rows: &[SettlementRow]) -> Result<Vec<u8>, SinkError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if rows.is_empty() {
        writer
            .write_record(["interval_start", "price", "volume"])
            .context(CsvSnafu)?;
    }
    for row in rows {
        writer.serialize(CsvRow::from(row)).context(CsvSnafu)?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
        .context(CsvSnafu)
}

pub fn to_csv_string(rows: &[SettlementRow]) -> Result<String, SinkError> {
    String::from_utf8(to_csv_bytes(rows)?).context(EncodingSnafu)
}

/// Writes each dataset to `{dir}/imbalance_{resolved date}.csv`, creating
/// `dir` if needed. Existing files are overwritten.
#[derive(Debug, Clone)]
pub struct CsvFileSink {
    dir: PathBuf,
}

impl CsvFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl DataSink for CsvFileSink {
    type Output = PathBuf;

    async fn write(&self, data: &ResolvedDataset) -> Result<PathBuf, SinkError> {
        let Some(resolved_date) = data.resolved_date else {
            return UnresolvedSnafu {
                requested: data.requested_date,
            }
            .fail();
        };

        let bytes = to_csv_bytes(&data.rows)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .context(IoSnafu { path: &self.dir })?;

        let path = self.dir.join(export_file_name(resolved_date));
        tokio::fs::write(&path, bytes)
            .await
            .context(IoSnafu { path: &path })?;
        tracing::info!(path = %path.display(), rows = data.rows.len(), "wrote CSV export");
        Ok(path)
    }
}
