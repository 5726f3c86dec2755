//! Candidate planning.
//!
//! [`ReportLocator::plan`] turns a requested date into the ordered list of
//! places worth looking at. It never touches the network: the engine walks the
//! list and stops at the first candidate that yields rows.
//!
//! Two lookup strategies exist:
//! - [`Strategy::Catalog`]: ask the operator's static-reports search for the
//!   documents published on a date.
//! - [`Strategy::DirectoryGuess`]: construct document names from the naming
//!   convention and request them directly.
//!
//! Which strategy runs for which report, and in what order, is data: an
//! ordered list of [`PolicyStep`]s from the configuration. Within a step the
//! requested date comes first, followed by up to `lookback_days` prior dates.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    config::{IngestorConfig, LocatorConfig, parse_hhmm},
    models::{
        dataset::SourceKind,
        report::{INDICATIVE_INTERVAL_MINUTES, ReportKind},
    },
    tz::{floor_to_minutes, market_local},
};

/// How a candidate's documents are found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Catalog,
    DirectoryGuess,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::Catalog => "catalog",
            Strategy::DirectoryGuess => "directory_guess",
        })
    }
}

/// One entry of the lookup policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyStep {
    pub report: ReportKind,
    pub strategy: Strategy,
}

impl PolicyStep {
    pub const fn new(report: ReportKind, strategy: Strategy) -> Self {
        Self { report, strategy }
    }

    /// Official before indicative; catalog before directory guessing.
    pub fn default_policy() -> Vec<Self> {
        vec![
            Self::new(ReportKind::Official, Strategy::Catalog),
            Self::new(ReportKind::Official, Strategy::DirectoryGuess),
            Self::new(ReportKind::Indicative, Strategy::Catalog),
            Self::new(ReportKind::Indicative, Strategy::DirectoryGuess),
        ]
    }
}

/// What the engine has to fetch for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchPlan {
    /// Query the catalog, then download the documents it lists.
    Catalog {
        url: String,
        query: Vec<(String, String)>,
    },
    /// Download a single document.
    Document { url: String },
    /// Download every document that exists; the rows are combined.
    Scan { urls: Vec<String> },
}

/// One place the engine may find data for `date`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub report: ReportKind,
    pub strategy: Strategy,
    pub date: NaiveDate,
    pub fetch: FetchPlan,
}

impl Candidate {
    pub fn source_kind(&self) -> SourceKind {
        self.report.source_kind()
    }
}

/// Builds candidate plans from the locator configuration.
#[derive(Debug, Clone)]
pub struct ReportLocator {
    base: String,
    config: LocatorConfig,
}

impl ReportLocator {
    pub fn new(base_url: &str, config: LocatorConfig) -> Self {
        Self {
            base: base_url.trim_end_matches('/').to_string(),
            config,
        }
    }

    pub fn from_config(config: &IngestorConfig) -> Self {
        Self::new(config.base(), config.locator.clone())
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    /// `date`, then each prior date down to `date - lookback_days`.
    pub fn search_dates(&self, date: NaiveDate) -> Vec<NaiveDate> {
        (0..=i64::from(self.config.lookback_days))
            .filter_map(|offset| date.checked_sub_signed(Duration::days(offset)))
            .collect()
    }

    /// Public location of a published document.
    pub fn document_url(&self, resource_name: &str) -> String {
        format!("{}/documents/{}", self.base, resource_name)
    }

    pub fn catalog_url(&self) -> String {
        let path = self.config.catalog_path.trim_start_matches('/');
        format!("{}/{}", self.base, path)
    }

    /// Every candidate for `date`, in the order the engine must try them.
    ///
    /// `now` bounds the indicative scan: only 5-minute stamps within the
    /// configured window before `now` (market wall clock) are tried.
    pub fn plan(&self, date: NaiveDate, now: DateTime<Utc>) -> Vec<Candidate> {
        let dates = self.search_dates(date);
        let scan = self.scan_stamps(now);

        let mut candidates = Vec::new();
        for step in &self.config.policy {
            for &day in &dates {
                match step.strategy {
                    Strategy::Catalog => {
                        candidates.push(self.catalog_candidate(step.report, day));
                    }
                    Strategy::DirectoryGuess => match step.report {
                        ReportKind::Official => {
                            candidates.extend(self.official_guesses(day));
                        }
                        ReportKind::Indicative => {
                            if let Some(stamps) = scan.get(&day) {
                                candidates.push(self.indicative_scan(day, stamps));
                            }
                        }
                    },
                }
            }
        }
        candidates
    }

    fn catalog_candidate(&self, report: ReportKind, date: NaiveDate) -> Candidate {
        let report_name = match report {
            ReportKind::Official => &self.config.official_report_name,
            ReportKind::Indicative => &self.config.indicative_report_name,
        };
        Candidate {
            report,
            strategy: Strategy::Catalog,
            date,
            fetch: FetchPlan::Catalog {
                url: self.catalog_url(),
                query: vec![
                    ("ReportName".to_string(), report_name.clone()),
                    ("Date".to_string(), date.format("%Y-%m-%d").to_string()),
                    (
                        "page_size".to_string(),
                        self.config.catalog_page_size.to_string(),
                    ),
                ],
            },
        }
    }

    fn official_guesses(&self, date: NaiveDate) -> impl Iterator<Item = Candidate> + '_ {
        self.config
            .official_publication_times
            .iter()
            .filter_map(move |stamp| {
                let (hour, minute) = parse_hhmm(stamp)?;
                let published = date.and_hms_opt(hour, minute, 0)?;
                Some(Candidate {
                    report: ReportKind::Official,
                    strategy: Strategy::DirectoryGuess,
                    date,
                    fetch: FetchPlan::Document {
                        url: self.guessed_url(ReportKind::Official, published),
                    },
                })
            })
    }

    fn indicative_scan(&self, date: NaiveDate, stamps: &[NaiveDateTime]) -> Candidate {
        Candidate {
            report: ReportKind::Indicative,
            strategy: Strategy::DirectoryGuess,
            date,
            fetch: FetchPlan::Scan {
                urls: stamps
                    .iter()
                    .map(|&ts| self.guessed_url(ReportKind::Indicative, ts))
                    .collect(),
            },
        }
    }

    /// 5-minute stamps from floor(now) backward over the scan window, most
    /// recent first, grouped by calendar date.
    fn scan_stamps(&self, now: DateTime<Utc>) -> BTreeMap<NaiveDate, Vec<NaiveDateTime>> {
        let latest = floor_to_minutes(market_local(now), INDICATIVE_INTERVAL_MINUTES);
        let steps = i64::from(self.config.indicative_window_minutes) / INDICATIVE_INTERVAL_MINUTES;

        let mut by_date: BTreeMap<NaiveDate, Vec<NaiveDateTime>> = BTreeMap::new();
        for i in 0..steps {
            let ts = latest - Duration::minutes(i * INDICATIVE_INTERVAL_MINUTES);
            by_date.entry(ts.date()).or_default().push(ts);
        }
        by_date
    }

    fn guessed_url(&self, report: ReportKind, ts: NaiveDateTime) -> String {
        self.document_url(&format!(
            "{}_{}.xml",
            report.file_prefix(),
            ts.format("%Y%m%d%H%M")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn locator(lookback_days: u32, window: u32) -> ReportLocator {
        let config = LocatorConfig {
            lookback_days,
            indicative_window_minutes: window,
            official_publication_times: vec!["2330".into()],
            official_report_name: "OFFICIAL".into(),
            indicative_report_name: "INDICATIVE".into(),
            ..LocatorConfig::default()
        };
        ReportLocator::new("https://host/", config)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn describe(candidates: &[Candidate]) -> String {
        candidates
            .iter()
            .map(|c| {
                let target = match &c.fetch {
                    FetchPlan::Catalog { url, query } => {
                        let q: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
                        format!("{url}?{}", q.join("&"))
                    }
                    FetchPlan::Document { url } => url.clone(),
                    FetchPlan::Scan { urls } => urls.join(" "),
                };
                format!("{:?} {} {} {}", c.report, c.strategy, c.date, target)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn search_dates_run_backward_from_the_requested_date() {
        let dates = locator(5, 180).search_dates(day(15));
        assert_eq!(dates, [day(15), day(14), day(13), day(12), day(11), day(10)]);
    }

    #[test]
    fn plan_follows_policy_then_date_order() {
        // 00:07 UTC in January is 00:07 in Dublin; the scan crosses midnight.
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 0, 7, 0).unwrap();
        let plan = locator(1, 15).plan(day(15), now);

        insta::assert_snapshot!(describe(&plan), @r"
        Official catalog 2024-01-15 https://host/api/v1/documents/static-reports?ReportName=OFFICIAL&Date=2024-01-15&page_size=100
        Official catalog 2024-01-14 https://host/api/v1/documents/static-reports?ReportName=OFFICIAL&Date=2024-01-14&page_size=100
        Official directory_guess 2024-01-15 https://host/documents/PUB_30MinAvgImbalPrc_202401152330.xml
        Official directory_guess 2024-01-14 https://host/documents/PUB_30MinAvgImbalPrc_202401142330.xml
        Indicative catalog 2024-01-15 https://host/api/v1/documents/static-reports?ReportName=INDICATIVE&Date=2024-01-15&page_size=100
        Indicative catalog 2024-01-14 https://host/api/v1/documents/static-reports?ReportName=INDICATIVE&Date=2024-01-14&page_size=100
        Indicative directory_guess 2024-01-15 https://host/documents/PUB_5MinImbalPrc_202401150005.xml https://host/documents/PUB_5MinImbalPrc_202401150000.xml
        Indicative directory_guess 2024-01-14 https://host/documents/PUB_5MinImbalPrc_202401142355.xml
        ");
    }

    #[test]
    fn official_candidates_always_precede_indicative_ones() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let plan = locator(5, 180).plan(day(15), now);

        let first_indicative = plan
            .iter()
            .position(|c| c.source_kind() == SourceKind::Indicative)
            .unwrap();
        assert!(plan[..first_indicative]
            .iter()
            .all(|c| c.source_kind() == SourceKind::Official));
        assert!(plan[first_indicative..]
            .iter()
            .all(|c| c.source_kind() == SourceKind::Indicative));
    }

    #[test]
    fn scan_uses_market_local_time() {
        // 08:03 UTC in July is 09:03 in Dublin.
        let now = Utc.with_ymd_and_hms(2024, 7, 1, 8, 3, 0).unwrap();
        let locator = ReportLocator::new(
            "https://host",
            LocatorConfig {
                indicative_window_minutes: 10,
                policy: vec![PolicyStep::new(ReportKind::Indicative, Strategy::DirectoryGuess)],
                ..LocatorConfig::default()
            },
        );
        let plan = locator.plan(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(), now);

        assert_eq!(plan.len(), 1);
        assert_eq!(
            plan[0].fetch,
            FetchPlan::Scan {
                urls: vec![
                    "https://host/documents/PUB_5MinImbalPrc_202407010900.xml".to_string(),
                    "https://host/documents/PUB_5MinImbalPrc_202407010855.xml".to_string(),
                ]
            }
        );
    }

    #[test]
    fn dates_outside_the_scan_window_get_no_scan() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let plan = locator(2, 180).plan(day(3), now);
        assert!(plan.iter().all(|c| !matches!(c.fetch, FetchPlan::Scan { .. })));
        assert_eq!(plan.len(), 3 * 3);
    }

    #[test]
    fn official_guesses_follow_publication_time_order() {
        let config = LocatorConfig {
            lookback_days: 0,
            official_publication_times: vec!["0000".into(), "2330".into()],
            policy: vec![PolicyStep::new(ReportKind::Official, Strategy::DirectoryGuess)],
            ..LocatorConfig::default()
        };
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let plan = ReportLocator::new("https://host", config).plan(day(15), now);

        let urls: Vec<_> = plan
            .iter()
            .map(|c| match &c.fetch {
                FetchPlan::Document { url } => url.as_str(),
                other => panic!("unexpected plan {other:?}"),
            })
            .collect();
        assert_eq!(
            urls,
            [
                "https://host/documents/PUB_30MinAvgImbalPrc_202401150000.xml",
                "https://host/documents/PUB_30MinAvgImbalPrc_202401152330.xml",
            ]
        );
    }
}
