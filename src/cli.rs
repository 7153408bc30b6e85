//! Command-line interface definitions for eureka_harvest.
//!
//! Credentials can be passed as flags or through the `EUREKA_USERNAME` and
//! `EUREKA_PASSWORD` environment variables. Global options go before the
//! subcommand.
//!
//! # Examples
//!
//! ```sh
//! # One batch over an explicit date range
//! eureka_harvest search -q "Griffintown" --start-date 2023-01-01 --end-date 2023-03-31 --max-count 500
//!
//! # Quarterly batches over several years
//! eureka_harvest -o ./corpus harvest -q "Griffintown" --from-year 2015 --to-year 2023
//!
//! # Last week's documents
//! eureka_harvest recent -q "Griffintown" --days 7 --max-count 100
//! ```

use crate::models::{DocumentBase, LinkProtocol};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the API configuration file (JSON, or YAML by extension)
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// Root directory for CSV output
    #[arg(short, long, default_value = "data")]
    pub output_dir: PathBuf,

    /// Error log path (defaults to `<output-dir>/errors.log`)
    #[arg(long)]
    pub error_log: Option<PathBuf>,

    /// Account username
    #[arg(short, long, env = "EUREKA_USERNAME")]
    pub username: String,

    /// Account password
    #[arg(short, long, env = "EUREKA_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Per-request timeout, in seconds (at least 1)
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: u64,

    /// Maximum number of document fetches in flight per batch
    #[arg(long, default_value_t = 4)]
    pub concurrency: usize,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one batch over an explicit date range
    Search {
        /// Search query
        #[arg(short, long)]
        query: String,

        /// First day of the range (YYYY-MM-DD)
        #[arg(long)]
        start_date: NaiveDate,

        /// Last day of the range (YYYY-MM-DD)
        #[arg(long)]
        end_date: NaiveDate,

        /// Maximum number of documents returned by the search
        #[arg(long)]
        max_count: u32,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// Run one batch per calendar quarter over a range of years
    Harvest {
        /// Search query
        #[arg(short, long)]
        query: String,

        /// First year to harvest
        #[arg(long)]
        from_year: i32,

        /// Last year to harvest (inclusive)
        #[arg(long)]
        to_year: i32,

        /// Maximum number of documents per quarterly search
        #[arg(long, default_value_t = 1000)]
        max_count: u32,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// Run one batch over the trailing days using the simple search
    Recent {
        /// Search query
        #[arg(short, long)]
        query: String,

        /// Number of days back from today (0 = today only)
        #[arg(long, default_value_t = 0)]
        days: u32,

        /// Maximum number of documents returned by the search
        #[arg(long)]
        max_count: u32,
    },
}

/// Document base and link protocol of an advanced search.
#[derive(Args, Debug)]
pub struct TargetArgs {
    /// Document base to search
    #[arg(long, value_enum, default_value_t = DocumentBase::News)]
    pub document_base: DocumentBase,

    /// Protocol of the external document links
    #[arg(long, value_enum, default_value_t = LinkProtocol::Https)]
    pub link_protocol: LinkProtocol,
}
