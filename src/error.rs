use thiserror::Error;

/// Per-URL protocol failure. None of these abort a batch.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("loading page request failed for {url}: {reason}")]
    AcquireFailure { url: String, reason: String },

    #[error("no token found in loading page for {url}")]
    TokenMissing { url: String },

    #[error("evaluation trigger failed for {url}: {reason}")]
    TriggerFailure { url: String, reason: String },

    #[error("scan details request failed for token {token}: {reason}")]
    FetchFailure { token: String, reason: String },

    #[error("scan details for token {token} did not decode: {reason}")]
    DecodeFailure { token: String, reason: String },
}

impl ScanError {
    /// Short stable label, used in logs and the run summary.
    pub fn kind(&self) -> &'static str {
        match self {
            ScanError::AcquireFailure { .. } => "acquire_failure",
            ScanError::TokenMissing { .. } => "token_missing",
            ScanError::TriggerFailure { .. } => "trigger_failure",
            ScanError::FetchFailure { .. } => "fetch_failure",
            ScanError::DecodeFailure { .. } => "decode_failure",
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
