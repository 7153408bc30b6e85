//! # Eureka Harvest
//!
//! A batch harvesting client for the Eureka.cc document search API. It runs
//! a search, fetches every matching document's full text and metadata, and
//! appends the results to CSV files organized by query and date interval.
//!
//! ## Usage
//!
//! ```sh
//! eureka_harvest search -q "Griffintown" --start-date 2023-01-01 --end-date 2023-03-31 --max-count 500
//! eureka_harvest harvest -q "Griffintown" --from-year 2015 --to-year 2023
//! ```
//!
//! ## Architecture
//!
//! Each batch unit runs the same linear pipeline:
//! 1. **Search**: one bounded search request for the query and window
//! 2. **Normalize**: flatten each result into a fixed metadata record
//! 3. **Enrich**: fetch each full document (bounded concurrency, per-record failure isolation)
//! 4. **Persist**: append the batch to its CSV file, header written once

use chrono::NaiveDate;
use clap::Parser;
use std::error::Error as StdError;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod auth;
mod cli;
mod config;
mod enrich;
mod error;
mod harvest;
mod models;
mod normalize;
mod outputs;
mod utils;

use api::ApiClient;
use cli::{Cli, Command};
use error::{Error, Result};
use harvest::{BatchReport, BatchRequest, Harvester, SearchWindow, quarterly_intervals};
use models::DateRange;
use outputs::error_log::ErrorLog;
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn StdError>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = Instant::now();
    info!("eureka_harvest starting up");

    let args = Cli::parse();
    debug!(config = %args.config.display(), output_dir = %args.output_dir.display(), "Parsed CLI arguments");

    if let Err(e) = run(args).await {
        error!(error = %e, "Run aborted");
        return Err(e.into());
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

#[instrument(level = "info", skip_all)]
async fn run(args: Cli) -> Result<()> {
    // Validate everything the operator typed before touching the network.
    let plan = Plan::from_command(args.command)?;

    let config = config::load_config(&args.config).await?;
    ensure_writable_dir(&args.output_dir).await.inspect_err(|e| {
        error!(
            path = %args.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        )
    })?;

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout_secs))
        .build()
        .map_err(|e| Error::config(format!("cannot build HTTP client: {e}")))?;
    let credential =
        auth::authenticate(&http, &config.auth_url, &args.username, &args.password).await?;
    let client = ApiClient::new(http, config, credential);

    let error_log = ErrorLog::new(
        args.error_log
            .unwrap_or_else(|| args.output_dir.join("errors.log")),
    );
    let harvester = Harvester::new(&client, &args.output_dir, error_log, args.concurrency);

    match plan {
        Plan::Single(request) => {
            let report = harvester.run_batch(&request).await?;
            println!("{}", saved_message(&report));
            if report.enrichment_failures > 0 {
                println!(
                    "{} document(s) could not be fetched; see the error log.",
                    report.enrichment_failures
                );
            }
            println!("Operation took {:.2} seconds.", report.elapsed.as_secs_f64());
        }
        Plan::Harvest {
            query,
            from_year,
            to_year,
            max_count,
            document_base,
            link_protocol,
        } => {
            let intervals = quarterly_intervals(from_year, to_year)?;
            let summary = harvester
                .run_harvest(&query, &intervals, max_count, document_base, link_protocol)
                .await?;
            for report in summary.reports.iter().filter(|r| r.records > 0) {
                println!("Data saved to {}", report.path.display());
            }
            println!(
                "Harvested {} row(s) over {} interval(s); {} search(es) failed, {} document(s) could not be fetched.",
                summary.rows(),
                summary.reports.len(),
                summary.failed_searches(),
                summary.enrichment_failures()
            );
        }
    }
    Ok(())
}

/// What the operator asked for, validated.
enum Plan {
    Single(BatchRequest),
    Harvest {
        query: String,
        from_year: i32,
        to_year: i32,
        max_count: u32,
        document_base: models::DocumentBase,
        link_protocol: models::LinkProtocol,
    },
}

impl Plan {
    fn from_command(command: Command) -> Result<Self> {
        let plan = match command {
            Command::Search {
                query,
                start_date,
                end_date,
                max_count,
                target,
            } => Plan::Single(BatchRequest {
                query: non_empty(query)?,
                window: SearchWindow::Range(date_range(start_date, end_date)?),
                max_count: positive(max_count)?,
                document_base: target.document_base,
                link_protocol: target.link_protocol,
            }),
            Command::Harvest {
                query,
                from_year,
                to_year,
                max_count,
                target,
            } => {
                // Fail early on a bad year range.
                quarterly_intervals(from_year, to_year)?;
                Plan::Harvest {
                    query: non_empty(query)?,
                    from_year,
                    to_year,
                    max_count: positive(max_count)?,
                    document_base: target.document_base,
                    link_protocol: target.link_protocol,
                }
            }
            Command::Recent {
                query,
                days,
                max_count,
            } => Plan::Single(BatchRequest {
                query: non_empty(query)?,
                window: SearchWindow::TrailingDays(days),
                max_count: positive(max_count)?,
                document_base: Default::default(),
                link_protocol: Default::default(),
            }),
        };
        Ok(plan)
    }
}

/// Operator-facing line for a finished single batch.
fn saved_message(report: &BatchReport) -> String {
    if report.records > 0 {
        format!("Data saved to {}", report.path.display())
    } else if report.search_failed {
        "Search failed; no data was written.".to_string()
    } else {
        "No documents matched; no data was written.".to_string()
    }
}

fn non_empty(query: String) -> Result<String> {
    if query.trim().is_empty() {
        Err(Error::config("search query is empty"))
    } else {
        Ok(query)
    }
}

fn positive(max_count: u32) -> Result<u32> {
    if max_count == 0 {
        Err(Error::config("--max-count must be at least 1"))
    } else {
        Ok(max_count)
    }
}

fn date_range(start: NaiveDate, end: NaiveDate) -> Result<DateRange> {
    DateRange::new(start, end)
        .ok_or_else(|| Error::config(format!("start date {start} is after end date {end}")))
}
