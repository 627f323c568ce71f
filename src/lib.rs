//! bmx_rs
//!
//! A small Rust library for retrieving Banxico SIE statistical series as tidy
//! tables. Pairs with the `bmx` CLI.
//!
//! ### Features
//! - Fetch descriptive metadata for up to 20 series per call
//! - Fetch observations for a date range, the full history, or only the latest value
//! - Normalize `dd/mm/yyyy` dates and comma-grouped numbers into typed rows
//! - Save as CSV or JSON; quick per-series summary statistics
//!
//! ### Example
//! ```no_run
//! use bmx_rs::{Client, DataQuery, DateRange, IncrementMode};
//! use chrono::NaiveDate;
//!
//! let client = Client::new("my-token");
//! let range = DateRange::new(
//!     NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
//!     NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(),
//! )?;
//! let tables = client.get_data(
//!     &["SF43718".into()],
//!     &DataQuery::new().range(range).increment(IncrementMode::YearOverYear),
//! )?;
//! bmx_rs::storage::save_csv(&tables, "fix_2020.csv")?;
//! # Ok::<(), bmx_rs::BmxError>(())
//! ```

pub mod api;
pub mod error;
pub mod models;
pub mod normalize;
pub mod stats;
pub mod storage;
pub mod transport;

pub use api::Client;
pub use error::{BmxError, Result};
pub use models::{
    DataQuery, DataWindow, DateRange, IncrementMode, Language, MetadataRecord, MetadataTable,
    MissingPolicy, Observation, SeriesTable,
};
pub use transport::{ApiRequest, RawResponse, Transport};
