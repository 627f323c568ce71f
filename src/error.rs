//! Error type shared by the client, the normalizer and the storage helpers.

use chrono::NaiveDate;
use thiserror::Error;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, BmxError>;

/// Everything that can go wrong between building a request and writing a table.
#[derive(Error, Debug)]
pub enum BmxError {
    /// The API answered with a non-200 status or an `error` envelope.
    #[error("request to {url} failed with HTTP {status}: {message} ({detail})")]
    Request {
        /// Request URL with the token redacted.
        url: String,
        status: u16,
        /// `error.mensaje` from the response body.
        message: String,
        /// `error.detalle` from the response body.
        detail: String,
    },

    /// Connection, timeout or body-read failure below the HTTP status level.
    #[error("transport error: {0}")]
    Transport(String),

    /// A 200 response whose body is not the expected `bmx.series` shape.
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// Series list rejected before any request was sent.
    #[error("invalid series list: {0}")]
    MalformedSeriesList(String),

    /// Observation date not in `dd/mm/yyyy` form.
    #[error("series {series}: cannot parse date {raw:?} (expected dd/mm/yyyy)")]
    DateParse { series: String, raw: String },

    /// Observation value not numeric after removing thousands separators.
    #[error("series {series}: cannot parse value {raw:?} on {date}")]
    NumericParse {
        series: String,
        date: NaiveDate,
        raw: String,
    },

    /// The response does not contain exactly the requested series.
    #[error("response/request series mismatch (missing: {missing:?}, unexpected: {unexpected:?})")]
    SeriesMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    /// Start date after end date.
    #[error("invalid date range: {start} > {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BmxError {
    /// True for whole-request failures reported by the API itself.
    pub fn is_request_failure(&self) -> bool {
        matches!(self, BmxError::Request { .. })
    }

    /// True for per-row normalization failures (bad date or bad number).
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            BmxError::DateParse { .. } | BmxError::NumericParse { .. }
        )
    }
}
