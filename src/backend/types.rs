use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One absolute page URL to evaluate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanRequest(String);

impl ScanRequest {
    /// Checks well-formedness only (scheme + host). Reachability is left to the scan.
    pub fn parse(raw: &str, allowed_schemes: &[String]) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(anyhow!("empty URL"));
        }
        let parsed = url::Url::parse(raw).map_err(|e| anyhow!("invalid URL {raw}: {e}"))?;
        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(anyhow!("URL has no host: {raw}"));
        }
        if !allowed_schemes.is_empty()
            && !allowed_schemes
                .iter()
                .any(|s| s.eq_ignore_ascii_case(parsed.scheme()))
        {
            return Err(anyhow!(
                "URL scheme {} is not allowed: {raw}",
                parsed.scheme()
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScanRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Backend-issued correlation id for one scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanToken(String);

impl ScanToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScanToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The scan-details payload, kept as an untyped tree since the backend owns
/// its category and test keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawScanDocument(serde_json::Value);

impl RawScanDocument {
    /// Parses a details body. Anything other than a non-empty JSON object is rejected.
    pub fn from_json(body: &str) -> std::result::Result<Self, String> {
        let value: serde_json::Value = serde_json::from_str(body).map_err(|e| e.to_string())?;
        match value.as_object() {
            None => Err(format!("expected a JSON object, got {}", kind_of(&value))),
            Some(obj) if obj.is_empty() => Err("empty scan document".to_string()),
            Some(_) => Ok(Self(value)),
        }
    }

    pub fn from_value(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &serde_json::Value {
        &self.0
    }
}

fn kind_of(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
