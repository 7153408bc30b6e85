//! Output writers for harvested batches.
//!
//! # Submodules
//!
//! - [`csv`]: appends enriched records to per-batch CSV files
//! - [`error_log`]: appends one line per failed document fetch
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── errors.log
//! └── griffintown/
//!     ├── 2023-01-01_2023-03-31.csv
//!     ├── 2023-04-01_2023-06-30.csv
//!     └── recent_7d_2024-05-02.csv
//! ```

pub mod csv;
pub mod error_log;
