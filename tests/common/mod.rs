#![allow(dead_code)]

use access_audit::{
    backend::{ScanBackend, ScanRequest, ScanToken},
    client::Sleeper,
    error::{Result, ScanError},
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

/// Where a scripted URL should break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Acquire,
    NoToken,
    Trigger,
    Fetch,
    Garbage,
}

/// In-memory backend. Each URL gets token `tok-<n>` in call order and a
/// details body scored from the URL's position.
#[derive(Default)]
pub struct FakeBackend {
    pub failures: HashMap<String, FailAt>,
    pub details: HashMap<String, String>,
    pub calls: RefCell<Vec<String>>,
    issued: RefCell<Vec<(String, String)>>,
}

impl FakeBackend {
    pub fn fail(mut self, url: &str, at: FailAt) -> Self {
        self.failures.insert(url.to_string(), at);
        self
    }

    pub fn with_details(mut self, url: &str, body: &str) -> Self {
        self.details.insert(url.to_string(), body.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn url_for(&self, token: &ScanToken) -> String {
        self.issued
            .borrow()
            .iter()
            .find(|(_, t)| t == token.as_str())
            .map(|(u, _)| u.clone())
            .unwrap_or_default()
    }

    fn failure(&self, url: &str) -> Option<FailAt> {
        self.failures.get(url).copied()
    }
}

impl ScanBackend for FakeBackend {
    fn loading_page(&self, req: &ScanRequest) -> Result<String> {
        self.calls.borrow_mut().push(format!("loading {req}"));
        match self.failure(req.as_str()) {
            Some(FailAt::Acquire) => Err(ScanError::AcquireFailure {
                url: req.to_string(),
                reason: "HTTP status server error (503 Service Unavailable)".into(),
            }),
            Some(FailAt::NoToken) => Ok("<html><body>loading...</body></html>".into()),
            _ => {
                let token = format!("tok-{}", self.issued.borrow().len() + 1);
                self.issued
                    .borrow_mut()
                    .push((req.to_string(), token.clone()));
                Ok(format!(
                    r#"<div class="scan" data-token="{token}" data-x="1"></div>"#
                ))
            }
        }
    }

    fn evaluate(&self, req: &ScanRequest, token: &ScanToken) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(format!("evaluate {req} {token}"));
        match self.failure(req.as_str()) {
            Some(FailAt::Trigger) => Err(ScanError::TriggerFailure {
                url: req.to_string(),
                reason: "HTTP status client error (400 Bad Request)".into(),
            }),
            _ => Ok(()),
        }
    }

    fn scan_details(&self, token: &ScanToken) -> Result<String> {
        self.calls.borrow_mut().push(format!("details {token}"));
        let url = self.url_for(token);
        match self.failure(&url) {
            Some(FailAt::Fetch) => Err(ScanError::FetchFailure {
                token: token.to_string(),
                reason: "connection reset".into(),
            }),
            Some(FailAt::Garbage) => Ok("<html>not json</html>".into()),
            _ => Ok(self.details.get(&url).cloned().unwrap_or_else(|| {
                r#"{"scanStatus":"success","result":{"verdict":"pass","score":90,"reports":{}}}"#
                    .to_string()
            })),
        }
    }
}

#[derive(Default)]
pub struct RecordingSleeper {
    pub slept: RefCell<Vec<Duration>>,
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, d: Duration) {
        self.slept.borrow_mut().push(d);
    }
}

impl RecordingSleeper {
    pub fn total(&self) -> Vec<Duration> {
        self.slept.borrow().clone()
    }
}

pub fn req(url: &str) -> ScanRequest {
    ScanRequest::parse(url, &[]).expect("valid test URL")
}
