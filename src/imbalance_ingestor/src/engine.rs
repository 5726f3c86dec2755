//! The acquisition engine.
//!
//! Walks the locator's candidates in order and returns the first one that
//! yields at least one complete settlement row. Anything that goes wrong with a
//! single candidate (network error, timeout, malformed XML, unknown columns,
//! an empty table) only disqualifies that candidate.
//!
//! Successful resolutions are cached per requested date. Concurrent calls for
//! the same date wait on one another so only one network search runs.

use std::{collections::HashSet, sync::Arc, time::Duration};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::{
    cache::TtlCache,
    clock::Clock,
    config::IngestorConfig,
    errors::ResolveError,
    locator::{Candidate, FetchPlan, ReportLocator},
    models::{dataset::ResolvedDataset, report::ReportKind, settlement::SettlementRow},
    normalize::{coerce_rows, finalize},
    parser::parse_report,
    providers::{DocumentSource, FetchRequest, catalog::CatalogResponse},
    schema::{SchemaMismatch, resolve_columns},
};

pub struct AcquisitionEngine {
    source: Arc<dyn DocumentSource>,
    clock: Arc<dyn Clock>,
    locator: ReportLocator,
    probe_timeout: Duration,
    catalog_timeout: Duration,
    cache: TtlCache<NaiveDate, ResolvedDataset>,
}

/// Bookkeeping for one uncached resolution.
#[derive(Default)]
struct Search {
    attempted: HashSet<String>,
    last_mismatch: Option<SchemaMismatch>,
}

/// Rows gathered for one candidate before finalization.
struct Harvest {
    rows: Vec<SettlementRow>,
    documents: Vec<String>,
}

impl AcquisitionEngine {
    pub fn new(
        config: &IngestorConfig,
        source: Arc<dyn DocumentSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            locator: ReportLocator::from_config(config),
            probe_timeout: config.probe_timeout(),
            catalog_timeout: config.catalog_timeout(),
            cache: TtlCache::new(clock.clone(), config.cache_ttl()),
            clock,
        }
    }

    pub fn locator(&self) -> &ReportLocator {
        &self.locator
    }

    pub fn cache(&self) -> &TtlCache<NaiveDate, ResolvedDataset> {
        &self.cache
    }

    /// Resolves settlement data for `date`, falling back to earlier dates and
    /// to the indicative report as configured.
    ///
    /// Returns a [`SourceKind::None`](crate::models::dataset::SourceKind::None)
    /// dataset when every candidate is exhausted, or
    /// [`ResolveError::SchemaMismatch`] when documents were found but none of
    /// them had recognizable columns.
    pub async fn resolve(&self, date: NaiveDate) -> Result<ResolvedDataset, ResolveError> {
        if let Some(hit) = self.cache.get(&date) {
            info!(%date, source = ?hit.source_kind, "serving cached resolution");
            return Ok(hit);
        }

        let _guard = self.cache.lock_key(&date).await;
        if let Some(hit) = self.cache.get(&date) {
            info!(%date, source = ?hit.source_kind, "resolution completed by a concurrent caller");
            return Ok(hit);
        }

        let resolved = self.resolve_uncached(date).await?;
        if resolved.is_resolved() {
            self.cache.insert(date, resolved.clone());
        }
        Ok(resolved)
    }

    async fn resolve_uncached(&self, date: NaiveDate) -> Result<ResolvedDataset, ResolveError> {
        let candidates = self.locator.plan(date, self.clock.now());
        debug!(%date, candidates = candidates.len(), "planned candidates");

        let mut search = Search::default();
        for candidate in &candidates {
            let Some(harvest) = self.try_candidate(candidate, &mut search).await else {
                continue;
            };

            let rows = finalize(harvest.rows, candidate.report);
            if rows.is_empty() {
                debug!(date = %candidate.date, strategy = %candidate.strategy, "candidate produced no rows after normalization");
                continue;
            }

            info!(
                requested = %date,
                resolved = %candidate.date,
                source = ?candidate.source_kind(),
                strategy = %candidate.strategy,
                rows = rows.len(),
                "resolved imbalance data"
            );
            return Ok(ResolvedDataset {
                requested_date: date,
                resolved_date: Some(candidate.date),
                source_kind: candidate.source_kind(),
                strategy: Some(candidate.strategy),
                documents: harvest.documents,
                rows,
            });
        }

        if let Some(mismatch) = search.last_mismatch {
            warn!(%date, %mismatch, "no usable document; last one had unrecognized columns");
            return Err(mismatch.into());
        }

        warn!(
            %date,
            lookback_days = self.locator.config().lookback_days,
            "no imbalance data found"
        );
        Ok(ResolvedDataset::none(date))
    }

    /// Downloads and coerces every document of one candidate. `None` when no
    /// document contributed a complete row.
    async fn try_candidate(&self, candidate: &Candidate, search: &mut Search) -> Option<Harvest> {
        let (urls, timeout) = match &candidate.fetch {
            FetchPlan::Document { url } => (vec![url.clone()], self.probe_timeout),
            FetchPlan::Scan { urls } => (urls.clone(), self.probe_timeout),
            FetchPlan::Catalog { url, query } => {
                let urls = self
                    .catalog_documents(candidate.report, url, query)
                    .await?;
                (urls, self.catalog_timeout)
            }
        };

        let mut harvest = Harvest {
            rows: Vec::new(),
            documents: Vec::new(),
        };
        for url in urls {
            if !search.attempted.insert(url.clone()) {
                debug!(%url, "already attempted in this resolution");
                continue;
            }
            let rows = self.load_document(&url, timeout, search).await;
            if !rows.is_empty() {
                harvest.rows.extend(rows);
                harvest.documents.push(url);
            }
        }

        (!harvest.rows.is_empty()).then_some(harvest)
    }

    /// Document URLs listed by the catalog. The official report only ever
    /// needs its first listing; indicative listings are combined.
    async fn catalog_documents(
        &self,
        report: ReportKind,
        url: &str,
        query: &[(String, String)],
    ) -> Option<Vec<String>> {
        let request =
            FetchRequest::new(url, self.catalog_timeout).with_query(query.to_vec());
        let body = match self.source.fetch(&request).await {
            Ok(body) => body,
            Err(e) => {
                debug!(error = %e, "catalog query failed; skipping");
                return None;
            }
        };
        let catalog = match CatalogResponse::from_slice(&request.display_url(), &body) {
            Ok(catalog) => catalog,
            Err(e) => {
                debug!(error = %e, "catalog response unusable; skipping");
                return None;
            }
        };

        let limit = match report {
            ReportKind::Official => 1,
            ReportKind::Indicative => self.locator.config().catalog_page_size as usize,
        };
        let urls: Vec<String> = catalog
            .resource_names()
            .take(limit)
            .map(|name| self.locator.document_url(name))
            .collect();

        if urls.is_empty() {
            debug!(url = %request.display_url(), "catalog lists no documents");
            return None;
        }
        Some(urls)
    }

    /// Fetch, parse, resolve columns and coerce one document. Every failure
    /// is logged and turns into an empty result.
    async fn load_document(
        &self,
        url: &str,
        timeout: Duration,
        search: &mut Search,
    ) -> Vec<SettlementRow> {
        let body = match self.source.fetch(&FetchRequest::new(url, timeout)).await {
            Ok(body) => body,
            Err(e) => {
                debug!(error = %e, "fetch failed; skipping");
                return Vec::new();
            }
        };

        let table = match parse_report(&body) {
            Ok(table) => table,
            Err(e) => {
                debug!(%url, error = %e, "document did not parse; skipping");
                return Vec::new();
            }
        };

        let mapping = match resolve_columns(table.field_names().as_slice()) {
            Ok(mapping) => mapping,
            Err(mismatch) => {
                debug!(%url, %mismatch, "unrecognized columns; skipping");
                search.last_mismatch = Some(mismatch);
                return Vec::new();
            }
        };

        let rows = coerce_rows(&table, &mapping);
        if rows.is_empty() {
            debug!(%url, records = table.len(), "no complete rows; skipping");
        }
        rows
    }
}
