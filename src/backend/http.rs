use super::{ScanBackend, ScanRequest, ScanToken};
use crate::config::Config;
use crate::error::{Result, ScanError};
use anyhow::Context;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::blocking::{Client, Response};
use std::time::Duration;
use tracing::debug;

/// Everything outside the RFC 3986 unreserved set gets escaped, `/` and `:` included.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub fn encode_query_value(raw: &str) -> String {
    utf8_percent_encode(raw, QUERY_VALUE).to_string()
}

/// Blocking client for the scanning service. One `reqwest` client (and its
/// connection pool) lives for the whole batch.
pub struct HttpBackend {
    client: Client,
    base_url: String,
    embedder: String,
    is_partner: bool,
    screenshot: bool,
}

impl HttpBackend {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let mut builder = Client::builder().user_agent(cfg.backend.user_agent.clone());
        if cfg.backend.request_timeout_seconds > 0 {
            builder = builder.timeout(Duration::from_secs(cfg.backend.request_timeout_seconds));
        }
        let client = builder.build().with_context(|| "building HTTP client")?;
        Ok(Self {
            client,
            base_url: cfg.backend.base_url.trim_end_matches('/').to_string(),
            embedder: cfg.backend.embedder.clone(),
            is_partner: cfg.backend.is_partner,
            screenshot: cfg.backend.screenshot,
        })
    }

    pub fn loading_url(&self, req: &ScanRequest) -> String {
        format!(
            "{}/loading?website={}&isPartner={}&embedder={}",
            self.base_url,
            encode_query_value(req.as_str()),
            self.is_partner,
            encode_query_value(&self.embedder)
        )
    }

    pub fn evaluate_url(&self, req: &ScanRequest, token: &ScanToken) -> String {
        format!(
            "{}/evaluate?website={}&screenshot={}&token={}&isPartner={}&embedder={}",
            self.base_url,
            encode_query_value(req.as_str()),
            self.screenshot,
            token,
            self.is_partner,
            encode_query_value(&self.embedder)
        )
    }

    pub fn details_url(&self, token: &ScanToken) -> String {
        format!(
            "{}/get-scan-details?scanId={}&embedder={}",
            self.base_url,
            token,
            encode_query_value(&self.embedder)
        )
    }

    fn get(&self, url: &str) -> std::result::Result<Response, String> {
        debug!("GET {url}");
        let resp = self.client.get(url).send().map_err(|e| e.to_string())?;
        resp.error_for_status().map_err(|e| e.to_string())
    }
}

impl ScanBackend for HttpBackend {
    fn loading_page(&self, req: &ScanRequest) -> Result<String> {
        let acquire = |reason: String| ScanError::AcquireFailure {
            url: req.to_string(),
            reason,
        };
        let resp = self.get(&self.loading_url(req)).map_err(acquire)?;
        resp.text().map_err(|e| acquire(e.to_string()))
    }

    fn evaluate(&self, req: &ScanRequest, token: &ScanToken) -> Result<()> {
        self.get(&self.evaluate_url(req, token))
            .map(|_| ())
            .map_err(|reason| ScanError::TriggerFailure {
                url: req.to_string(),
                reason,
            })
    }

    fn scan_details(&self, token: &ScanToken) -> Result<String> {
        let fetch = |reason: String| ScanError::FetchFailure {
            token: token.to_string(),
            reason,
        };
        let resp = self.get(&self.details_url(token)).map_err(fetch)?;
        resp.text().map_err(|e| fetch(e.to_string()))
    }
}
