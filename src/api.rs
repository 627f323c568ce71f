//! Synchronous client for the **Banxico SIE API REST (v1)**.
//!
//! Two endpoints are covered:
//! - `series/{ids}` returns descriptive metadata, one row per series;
//! - `series/{ids}/datos[/...]` returns observations, normalized here into one
//!   [`SeriesTable`](crate::models::SeriesTable) per requested series.
//!
//! ### Notes
//! - At most 20 series per call; the list is validated before any request.
//! - Failures come back as [`BmxError`]; a failed request never looks like an
//!   empty result.
//! - The token is sent as a query parameter and masked in every log line and
//!   error message.
//!
//! Typical usage:
//! ```no_run
//! # use bmx_rs::{Client, DataQuery};
//! let client = Client::new("my-token");
//! let tables = client.get_data(&["SF43718".into()], &DataQuery::new().latest(true))?;
//! # Ok::<(), bmx_rs::BmxError>(())
//! ```
use crate::error::{BmxError, Result};
use crate::models::{
    DataQuery, DataWindow, Envelope, ErrorEnvelope, Language, MAX_SERIES_PER_REQUEST,
    MetadataRecord, MetadataTable, RawSeries, SeriesTable,
};
use crate::normalize;
use crate::transport::{ApiRequest, RawResponse, ReqwestTransport, Transport};
use log::{debug, error, info, warn};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;
use std::sync::Arc;

pub const DEFAULT_BASE_URL: &str = "https://www.banxico.org.mx/SieAPIRest/service/v1";

#[derive(Clone)]
pub struct Client {
    base_url: String,
    token: String,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("token", &"***")
            .finish()
    }
}

// Allow -, _, . unescaped in series codes
const SAFE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

fn enc_join<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .map(|s| percent_encoding::utf8_percent_encode(s.trim(), SAFE).to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Check a series list before it reaches the network.
///
/// Rejects empty lists, lists over [`MAX_SERIES_PER_REQUEST`], blank codes,
/// codes containing a path or list separator, and duplicates.
pub fn validate_series(series_ids: &[String]) -> Result<()> {
    if series_ids.is_empty() {
        return Err(BmxError::MalformedSeriesList(
            "at least one series id required".into(),
        ));
    }
    if series_ids.len() > MAX_SERIES_PER_REQUEST {
        return Err(BmxError::MalformedSeriesList(format!(
            "{} series requested, the API accepts at most {}",
            series_ids.len(),
            MAX_SERIES_PER_REQUEST
        )));
    }
    for (i, id) in series_ids.iter().enumerate() {
        let id = id.trim();
        if id.is_empty() {
            return Err(BmxError::MalformedSeriesList(format!(
                "series id at position {i} is blank"
            )));
        }
        if id.contains([',', '/']) {
            return Err(BmxError::MalformedSeriesList(format!(
                "series id {id:?} contains a separator"
            )));
        }
        if series_ids[..i]
            .iter()
            .any(|prev| prev.trim().eq_ignore_ascii_case(id))
        {
            return Err(BmxError::MalformedSeriesList(format!(
                "series id {id:?} requested twice"
            )));
        }
    }
    Ok(())
}

impl Client {
    /// Client against the public endpoint using the default `reqwest` transport.
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_transport(token, Arc::new(ReqwestTransport::default()))
    }

    /// Like [`Client::new`], but fails instead of falling back when the HTTP
    /// client cannot be built.
    pub fn try_new(token: impl Into<String>) -> Result<Self> {
        Ok(Self::with_transport(token, Arc::new(ReqwestTransport::new()?)))
    }

    pub fn with_transport(token: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            token: token.into(),
            transport,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn base_request(&self, path: String, language: Language) -> ApiRequest {
        ApiRequest::new(format!("{}/{}", self.base_url, path))
            .param("token", self.token.as_str())
            .param("locale", language.locale())
            .param("mediaType", "json")
    }

    /// Build the metadata request without sending it.
    pub fn metadata_request(
        &self,
        series_ids: &[String],
        language: Language,
    ) -> Result<ApiRequest> {
        validate_series(series_ids)?;
        let ids = enc_join(series_ids.iter().map(|s| s.as_str()));
        Ok(self.base_request(format!("series/{ids}"), language))
    }

    /// Build the data request without sending it.
    ///
    /// Emits a warning when latest-value mode overrides a supplied date range.
    pub fn data_request(&self, series_ids: &[String], query: &DataQuery) -> Result<ApiRequest> {
        validate_series(series_ids)?;
        let window = query.window();
        if let DataWindow::Latest {
            overridden: Some(range),
        } = window
        {
            warn!("latest-value mode requested: ignoring date range {range}");
        }

        let ids = enc_join(series_ids.iter().map(|s| s.as_str()));
        let mut req = self.base_request(
            format!("series/{ids}/datos{}", window.path_suffix()),
            query.language,
        );
        if let Some(inc) = query.increment.to_query_param() {
            req = req.param("incremento", inc);
        }
        if query.decimals {
            req = req.param("decimales", "sinCeros");
        }
        Ok(req)
    }

    /// Fetch descriptive metadata, one row per series in request order.
    ///
    /// ### Errors
    /// - [`BmxError::MalformedSeriesList`] before any request is sent
    /// - [`BmxError::Request`] for a non-200 status or an `error` envelope
    /// - [`BmxError::Transport`] / [`BmxError::Decode`] for network and shape problems
    /// - [`BmxError::SeriesMismatch`] when the response does not cover the request
    pub fn get_metadata(&self, series_ids: &[String], language: Language) -> Result<MetadataTable> {
        let req = self.metadata_request(series_ids, language)?;
        let body = self.execute(&req)?;
        let env: Envelope<MetadataRecord> = serde_json::from_value(body)
            .map_err(|e| BmxError::Decode(format!("metadata envelope: {e}")))?;
        normalize::align_to_request(series_ids, env.bmx.series, |m| m.series_code.as_str())
    }

    /// Fetch observations, one normalized table per series in request order.
    ///
    /// ### Errors
    /// As [`Client::get_metadata`], plus [`BmxError::DateParse`] and
    /// [`BmxError::NumericParse`] for rows that fail normalization.
    pub fn get_data(&self, series_ids: &[String], query: &DataQuery) -> Result<Vec<SeriesTable>> {
        let req = self.data_request(series_ids, query)?;
        let body = self.execute(&req)?;
        let env: Envelope<RawSeries> = serde_json::from_value(body)
            .map_err(|e| BmxError::Decode(format!("data envelope: {e}")))?;
        let tables = normalize::unpack_series(series_ids, env.bmx.series, query.missing)?;
        info!(
            "fetched {} series, {} observations",
            tables.len(),
            tables.iter().map(SeriesTable::len).sum::<usize>()
        );
        Ok(tables)
    }

    /// Send the request and return the decoded body of a successful response.
    fn execute(&self, req: &ApiRequest) -> Result<Value> {
        let shown = req.redacted_url();
        debug!("GET {shown}");
        let resp = self.transport.get(req)?;
        check_response(&shown, resp)
    }
}

/// Turn a raw response into JSON, or into [`BmxError::Request`] when the API
/// reports a failure (non-200 status or an `error` object in a 200 body).
fn check_response(url: &str, resp: RawResponse) -> Result<Value> {
    let parsed: std::result::Result<Value, _> = serde_json::from_str(&resp.body);

    let api_error = parsed
        .as_ref()
        .ok()
        .filter(|v| v.get("error").is_some())
        .and_then(|v| serde_json::from_value::<ErrorEnvelope>(v.clone()).ok())
        .map(|e| e.error);

    if !resp.is_ok() || api_error.is_some() {
        let (message, detail) = match api_error {
            Some(e) => (e.mensaje, e.detalle),
            None => (
                format!("HTTP {}", resp.status),
                resp.body.chars().take(200).collect(),
            ),
        };
        error!(
            "request failed: {url} returned {}: {message} ({detail})",
            resp.status
        );
        return Err(BmxError::Request {
            url: url.to_string(),
            status: resp.status,
            message,
            detail,
        });
    }

    parsed.map_err(|e| BmxError::Decode(format!("invalid JSON: {e}")))
}
