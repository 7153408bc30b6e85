//! Batch orchestration: search, normalize, enrich, persist.
//!
//! One batch unit runs through the stages of [`BatchStage`] in order, with
//! no branching and no retries. A failed search is reported and yields an
//! empty batch; a malformed result set aborts the batch (and any multi-batch
//! run it belongs to). Document fetch failures are absorbed by the enricher.
//!
//! # Output Paths
//!
//! | Window | Path |
//! |--------|------|
//! | Date range | `{output_dir}/{query_dir}/{start}_{end}.csv` |
//! | Trailing days | `{output_dir}/{query_dir}/recent_{days}d_{today}.csv` |
//!
//! `query_dir` is the percent-encoded query (see [`query_dir_name`]).

use crate::api::ApiClient;
use crate::enrich::enrich_records;
use crate::error::{ApiError, Error, Result};
use crate::models::{DateRange, DocumentBase, LinkProtocol, SearchResultSet};
use crate::normalize::normalize;
use crate::outputs::csv::append_batch;
use crate::outputs::error_log::ErrorLog;
use crate::utils::{query_dir_name, truncate_for_log};
use chrono::{Datelike, Local, NaiveDate};
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Stages a batch unit passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStage {
    Authenticated,
    Searched,
    Normalized,
    Enriched,
    Persisted,
}

impl fmt::Display for BatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BatchStage::Authenticated => "authenticated",
            BatchStage::Searched => "searched",
            BatchStage::Normalized => "normalized",
            BatchStage::Enriched => "enriched",
            BatchStage::Persisted => "persisted",
        };
        f.write_str(name)
    }
}

/// The time window a batch searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchWindow {
    /// Advanced search over an explicit date range.
    Range(DateRange),
    /// Simple search over the trailing number of days.
    TrailingDays(u32),
}

/// Fully resolved parameters of one batch unit.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub query: String,
    pub window: SearchWindow,
    pub max_count: u32,
    pub document_base: DocumentBase,
    pub link_protocol: LinkProtocol,
}

/// Outcome of one batch unit.
#[derive(Debug)]
pub struct BatchReport {
    pub path: PathBuf,
    /// Rows appended to `path`.
    pub records: usize,
    pub enrichment_failures: usize,
    pub search_failed: bool,
    pub elapsed: Duration,
}

/// One quarter of one year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarvestInterval {
    pub year: i32,
    pub quarter: u8,
    pub range: DateRange,
}

/// Quarterly intervals covering `from_year..=to_year`, in chronological order.
///
/// Both years must lie within the calendar range `chrono` can represent.
pub fn quarterly_intervals(from_year: i32, to_year: i32) -> Result<Vec<HarvestInterval>> {
    if from_year > to_year {
        return Err(Error::config(format!(
            "year range {from_year}..={to_year} is empty"
        )));
    }
    let supported = NaiveDate::MIN.year()..=NaiveDate::MAX.year();
    if let Some(year) = [from_year, to_year].into_iter().find(|y| !supported.contains(y)) {
        return Err(Error::config(format!(
            "year {year} is outside the supported range {}..={}",
            supported.start(),
            supported.end()
        )));
    }
    const QUARTERS: [((u32, u32), (u32, u32)); 4] = [
        ((1, 1), (3, 31)),
        ((4, 1), (6, 30)),
        ((7, 1), (9, 30)),
        ((10, 1), (12, 31)),
    ];

    // Bounded by the check above, so this cannot overflow.
    let mut intervals = Vec::with_capacity((to_year - from_year + 1) as usize * 4);
    for year in from_year..=to_year {
        for (index, ((sm, sd), (em, ed))) in QUARTERS.iter().copied().enumerate() {
            let date = |m, d| {
                NaiveDate::from_ymd_opt(year, m, d)
                    .ok_or_else(|| Error::config(format!("year {year} is out of range")))
            };
            let range = DateRange::new(date(sm, sd)?, date(em, ed)?)
                .ok_or_else(|| Error::config(format!("invalid quarter in {year}")))?;
            intervals.push(HarvestInterval {
                year,
                quarter: index as u8 + 1,
                range,
            });
        }
    }
    Ok(intervals)
}

/// Totals across the batches of a multi-batch run.
#[derive(Debug, Default)]
pub struct HarvestSummary {
    pub reports: Vec<BatchReport>,
}

impl HarvestSummary {
    pub fn rows(&self) -> usize {
        self.reports.iter().map(|r| r.records).sum()
    }

    pub fn failed_searches(&self) -> usize {
        self.reports.iter().filter(|r| r.search_failed).count()
    }

    pub fn enrichment_failures(&self) -> usize {
        self.reports.iter().map(|r| r.enrichment_failures).sum()
    }
}

/// Runs batch units against one authenticated client.
#[derive(Debug)]
pub struct Harvester<'a> {
    client: &'a ApiClient,
    output_dir: PathBuf,
    error_log: ErrorLog,
    concurrency: usize,
}

impl<'a> Harvester<'a> {
    pub fn new(
        client: &'a ApiClient,
        output_dir: impl Into<PathBuf>,
        error_log: ErrorLog,
        concurrency: usize,
    ) -> Self {
        Self {
            client,
            output_dir: output_dir.into(),
            error_log,
            concurrency,
        }
    }

    /// CSV path of the batch for `query` over `window`.
    pub fn output_path(&self, query: &str, window: &SearchWindow) -> PathBuf {
        let file_name = match window {
            SearchWindow::Range(range) => format!("{range}.csv"),
            SearchWindow::TrailingDays(days) => format!(
                "recent_{days}d_{}.csv",
                Local::now().date_naive().format("%Y-%m-%d")
            ),
        };
        self.output_dir.join(query_dir_name(query)).join(file_name)
    }

    /// Run one batch unit end to end.
    #[instrument(level = "info", skip_all, fields(query = %request.query, window = ?request.window))]
    pub async fn run_batch(&self, request: &BatchRequest) -> Result<BatchReport> {
        let t0 = Instant::now();
        let path = self.output_path(&request.query, &request.window);
        debug!(stage = %BatchStage::Authenticated, path = %path.display(), "Batch started");

        let searched = match request.window {
            SearchWindow::Range(range) => {
                self.client
                    .search(
                        &request.query,
                        range,
                        request.max_count,
                        request.document_base,
                        request.link_protocol,
                    )
                    .await
            }
            SearchWindow::TrailingDays(days) => {
                self.client
                    .simple_search(&request.query, days, request.max_count)
                    .await
            }
        };
        let (results, search_failed) = match searched {
            Ok(results) => (results, false),
            Err(ApiError::Decode(e)) => return Err(Error::MalformedResponse(e)),
            Err(e) => {
                let failure = Error::Search(e);
                warn!(
                    error = %truncate_for_log(&failure.to_string(), 500),
                    "Search failed; batch yields no records"
                );
                (SearchResultSet { result: Vec::new() }, true)
            }
        };
        debug!(stage = %BatchStage::Searched, hits = results.result.len(), "Batch stage reached");

        let records = normalize(results)?;
        debug!(stage = %BatchStage::Normalized, records = records.len(), "Batch stage reached");

        let outcome =
            enrich_records(self.client, records, self.concurrency, &self.error_log).await?;
        debug!(stage = %BatchStage::Enriched, failures = outcome.failures, "Batch stage reached");

        let written = append_batch(&path, &outcome.records).await?;
        let elapsed = t0.elapsed();
        info!(
            stage = %BatchStage::Persisted,
            path = %path.display(),
            rows = written,
            enrichment_failures = outcome.failures,
            search_failed,
            elapsed_ms = elapsed.as_millis() as u64,
            "Batch complete"
        );

        Ok(BatchReport {
            path,
            records: written,
            enrichment_failures: outcome.failures,
            search_failed,
            elapsed,
        })
    }

    /// Run one batch per interval, sequentially.
    ///
    /// Stops at the first fatal error; failed searches only zero out their
    /// own interval.
    #[instrument(level = "info", skip_all, fields(%query, intervals = intervals.len()))]
    pub async fn run_harvest(
        &self,
        query: &str,
        intervals: &[HarvestInterval],
        max_count: u32,
        document_base: DocumentBase,
        link_protocol: LinkProtocol,
    ) -> Result<HarvestSummary> {
        let mut summary = HarvestSummary::default();
        for interval in intervals {
            info!(
                year = interval.year,
                quarter = interval.quarter,
                range = %interval.range,
                "Harvesting interval"
            );
            let request = BatchRequest {
                query: query.to_string(),
                window: SearchWindow::Range(interval.range),
                max_count,
                document_base,
                link_protocol,
            };
            summary.reports.push(self.run_batch(&request).await?);
        }

        info!(
            batches = summary.reports.len(),
            rows = summary.rows(),
            failed_searches = summary.failed_searches(),
            enrichment_failures = summary.enrichment_failures(),
            "Harvest complete"
        );
        Ok(summary)
    }
}
