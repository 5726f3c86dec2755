mod common;

use std::sync::Arc;

use common::*;
use imbalance_ingestor::{
    io::sink::{CsvFileSink, DataSink, SinkError},
    models::dataset::ResolvedDataset,
};

#[tokio::test]
async fn export_is_named_after_the_resolved_date() {
    let d = date(2024, 1, 15);
    let yesterday = date(2024, 1, 14);
    let source = Arc::new(StaticSource::new());
    source.serve(
        official_url(yesterday, "2330"),
        report_xml(
            &OFFICIAL_COLUMNS,
            &[
                &["2024-01-14T23:30:00", "80.25", "-12"],
                &["2024-01-14T23:00:00", "75", "4.5"],
            ],
        ),
    );
    let dataset = engine(source, clock_at(2024, 1, 15, 12, 0))
        .resolve(d)
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = CsvFileSink::new(dir.path().join("exports"))
        .write(&dataset)
        .await
        .unwrap();

    assert_eq!(path, dir.path().join("exports").join("imbalance_2024-01-14.csv"));
    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        written,
        "interval_start,price,volume\n\
         2024-01-14T23:00:00+00:00,75.0,4.5\n\
         2024-01-14T23:30:00+00:00,80.25,-12.0\n"
    );
}

#[tokio::test]
async fn unresolved_datasets_are_not_exported() {
    let dir = tempfile::tempdir().unwrap();
    let err = CsvFileSink::new(dir.path())
        .write(&ResolvedDataset::none(date(2024, 1, 15)))
        .await
        .unwrap_err();

    assert!(matches!(err, SinkError::Unresolved { .. }));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
