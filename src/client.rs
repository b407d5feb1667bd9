use crate::{
    backend::{RawScanDocument, ScanBackend, ScanRequest},
    error::{Result, ScanError},
    token::TokenExtractor,
};
use std::time::Duration;
use tracing::{error, info};

/// Blocking pause. The scan wait and the inter-URL delay both go through
/// this, so tests can run without sleeping and a polling strategy can
/// replace the fixed wait later.
pub trait Sleeper {
    fn sleep(&self, d: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, d: Duration) {
        std::thread::sleep(d);
    }
}

impl<S: Sleeper + ?Sized> Sleeper for &S {
    fn sleep(&self, d: Duration) {
        (**self).sleep(d)
    }
}

/// Drives token → evaluate → wait → details for one URL at a time.
pub struct ScanClient<B: ScanBackend, S: Sleeper> {
    backend: B,
    sleeper: S,
    tokens: TokenExtractor,
    scan_wait: Duration,
}

impl<B: ScanBackend, S: Sleeper> ScanClient<B, S> {
    pub fn new(backend: B, sleeper: S, tokens: TokenExtractor, scan_wait: Duration) -> Self {
        Self {
            backend,
            sleeper,
            tokens,
            scan_wait,
        }
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    pub fn scan(
        &self,
        req: &ScanRequest,
        progress: &mut dyn FnMut(&str),
    ) -> Result<RawScanDocument> {
        info!("starting accessibility check for {req}");

        progress(&format!("Getting token for {req}"));
        let html = self.backend.loading_page(req).inspect_err(|e| {
            error!("error getting loading page: {e}");
        })?;
        let token = self.tokens.extract(&html).ok_or_else(|| {
            error!("could not extract token for {req}");
            ScanError::TokenMissing {
                url: req.to_string(),
            }
        })?;
        info!("token extracted for {req}: {token}");

        progress(&format!("Starting evaluation for {req}"));
        self.backend.evaluate(req, &token).inspect_err(|e| {
            error!("error starting evaluation: {e}");
        })?;
        info!("evaluation started for {req}");

        progress(&format!("Waiting for scan to complete for {req}"));
        self.sleeper.sleep(self.scan_wait);

        progress(&format!("Retrieving results for {req}"));
        let body = self.backend.scan_details(&token).inspect_err(|e| {
            error!("error getting scan details: {e}");
        })?;
        let doc = RawScanDocument::from_json(&body).map_err(|reason| {
            error!("error parsing scan details for token {token}: {reason}");
            ScanError::DecodeFailure {
                token: token.to_string(),
                reason,
            }
        })?;
        info!("scan details retrieved for token {token}");
        Ok(doc)
    }
}
