#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use imbalance_ingestor::{
    clock::ManualClock,
    config::IngestorConfig,
    engine::AcquisitionEngine,
    providers::{DocumentSource, FetchError, FetchRequest, NotFoundSnafu},
    tz::localize,
};

pub const BASE: &str = "https://reports.test";

pub const OFFICIAL_COLUMNS: [&str; 3] =
    ["START_TIME", "IMBALANCE_SETTLEMENT_PRICE", "NET_IMBALANCE_VOLUME"];
pub const INDICATIVE_COLUMNS: [&str; 3] = ["START_TIME", "IMBALANCE_PRICE", "NET_IMBALANCE_VOLUME"];

/// In-memory document source keyed by the request's display URL. Every
/// request is recorded with its timeout, hit or miss.
#[derive(Default)]
pub struct StaticSource {
    documents: Mutex<HashMap<String, Vec<u8>>>,
    calls: Mutex<Vec<(String, Duration)>>,
    latency: Option<Duration>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    pub fn serve(&self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> &Self {
        self.documents
            .lock()
            .unwrap()
            .insert(url.into(), body.into());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn was_requested(&self, url: &str) -> bool {
        self.calls.lock().unwrap().iter().any(|(u, _)| u == url)
    }

    /// Timeout of the first request for `url`.
    pub fn timeout_for(&self, url: &str) -> Option<Duration> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .find(|(u, _)| u == url)
            .map(|(_, timeout)| *timeout)
    }
}

#[async_trait]
impl DocumentSource for StaticSource {
    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<u8>, FetchError> {
        let url = request.display_url();
        self.calls
            .lock()
            .unwrap()
            .push((url.clone(), request.timeout));
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let body = self.documents.lock().unwrap().get(&url).cloned();
        match body {
            Some(body) => Ok(body),
            None => NotFoundSnafu { url }.fail(),
        }
    }
}

pub fn test_config() -> IngestorConfig {
    IngestorConfig {
        base_url: BASE.to_string(),
        ..IngestorConfig::default()
    }
}

pub fn engine(source: Arc<StaticSource>, clock: Arc<ManualClock>) -> AcquisitionEngine {
    AcquisitionEngine::new(&test_config(), source, clock)
}

/// A clock at the given UTC instant. In January Dublin wall clock equals UTC.
pub fn clock_at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> Arc<ManualClock> {
    Arc::new(ManualClock::new(utc(y, mo, d, h, mi)))
}

pub fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    date(y, mo, d).and_hms_opt(h, mi, 0).unwrap()
}

/// Dublin wall clock with its offset; the earlier reading on the autumn
/// clock-change day.
pub fn market(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<FixedOffset> {
    localize(local(y, mo, d, h, mi)).unwrap()
}

pub fn official_url(day: NaiveDate, hhmm: &str) -> String {
    format!(
        "{BASE}/documents/PUB_30MinAvgImbalPrc_{}{hhmm}.xml",
        day.format("%Y%m%d")
    )
}

pub fn indicative_url(ts: NaiveDateTime) -> String {
    format!(
        "{BASE}/documents/PUB_5MinImbalPrc_{}.xml",
        ts.format("%Y%m%d%H%M")
    )
}

pub fn document_url(resource_name: &str) -> String {
    format!("{BASE}/documents/{resource_name}")
}

pub fn catalog_url(report_name: &str, day: NaiveDate) -> String {
    format!(
        "{BASE}/api/v1/documents/static-reports?ReportName={report_name}&Date={}&page_size=100",
        day.format("%Y-%m-%d")
    )
}

pub fn catalog_body(resource_names: &[&str]) -> Vec<u8> {
    let items: Vec<String> = resource_names
        .iter()
        .map(|name| format!(r#"{{"ResourceName":"{name}"}}"#))
        .collect();
    format!(r#"{{"items":[{}]}}"#, items.join(",")).into_bytes()
}

/// A report document with one `<Row>` per entry of `rows`.
pub fn report_xml(columns: &[&str], rows: &[&[&str]]) -> Vec<u8> {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<REPORT>\n  <DATA>\n");
    for row in rows {
        xml.push_str("    <Row>");
        for (column, value) in columns.iter().zip(row.iter()) {
            xml.push_str(&format!("<{column}>{value}</{column}>"));
        }
        xml.push_str("</Row>\n");
    }
    xml.push_str("  </DATA>\n</REPORT>\n");
    xml.into_bytes()
}
