use crate::backend::ScanToken;
use anyhow::{anyhow, Result};
use regex::Regex;

/// Finds the scan token embedded in the loading-page markup.
#[derive(Debug, Clone)]
pub struct TokenExtractor {
    pattern: Regex,
}

impl TokenExtractor {
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern =
            Regex::new(pattern).map_err(|e| anyhow!("invalid backend.token_pattern: {e}"))?;
        if pattern.captures_len() < 2 {
            return Err(anyhow!(
                "backend.token_pattern needs a capture group for the token"
            ));
        }
        Ok(Self { pattern })
    }

    /// First match wins; an empty capture counts as no token.
    pub fn extract(&self, html: &str) -> Option<ScanToken> {
        self.pattern
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .filter(|t| !t.is_empty())
            .map(ScanToken::new)
    }
}
