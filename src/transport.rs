//! HTTP boundary of the client.
//!
//! [`Client`](crate::Client) never talks to `reqwest` directly; it hands an
//! [`ApiRequest`] to a [`Transport`] and gets the raw status and body back.
//! Tests plug in an in-memory transport here.

use crate::error::{BmxError, Result};
use log::warn;
use reqwest::blocking::Client as HttpClient;
use reqwest::header::ACCEPT;
use reqwest::redirect::Policy;
use std::time::Duration;

/// A fully built GET request: URL plus query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
        }
    }

    pub fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn get_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// URL with query string, suitable for logs: the token is masked.
    pub fn redacted_url(&self) -> String {
        let qs = self
            .query
            .iter()
            .map(|(k, v)| {
                if k == "token" {
                    format!("{k}=***")
                } else {
                    format!("{k}={v}")
                }
            })
            .collect::<Vec<_>>()
            .join("&");
        if qs.is_empty() {
            self.url.clone()
        } else {
            format!("{}?{}", self.url, qs)
        }
    }
}

/// Status and body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Executes one GET request. Non-200 statuses are returned, not raised.
pub trait Transport: Send + Sync {
    fn get(&self, request: &ApiRequest) -> Result<RawResponse>;
}

/// Blocking `reqwest` transport used by default.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: HttpClient,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30)) // total request timeout
            .connect_timeout(Duration::from_secs(10))
            .redirect(Policy::limited(5))
            .user_agent(concat!("bmx_rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BmxError::Transport(format!("build http client: {e}")))?;
        Ok(Self { http })
    }

    /// Wrap an already configured blocking client.
    pub fn with_client(http: HttpClient) -> Self {
        Self { http }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        match Self::new() {
            Ok(t) => t,
            Err(e) => {
                warn!("{e}; falling back to a default http client");
                Self::with_client(HttpClient::new())
            }
        }
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, request: &ApiRequest) -> Result<RawResponse> {
        // the response is consumed (and its connection released) before returning
        let resp = self
            .http
            .get(&request.url)
            .header(ACCEPT, "application/json")
            .query(&request.query)
            .send()
            .map_err(|e| {
                let kind = if e.is_timeout() {
                    "request timeout"
                } else if e.is_connect() {
                    "connection failed"
                } else {
                    "request failed"
                };
                BmxError::Transport(format!(
                    "{kind}: GET {}: {}",
                    request.redacted_url(),
                    e.without_url()
                ))
            })?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .map_err(|e| {
                BmxError::Transport(format!("read response body: {}", e.without_url()))
            })?;
        Ok(RawResponse { status, body })
    }
}
