pub mod http;
pub mod types;

use crate::error::Result;

pub use types::{RawScanDocument, ScanRequest, ScanToken};

/// The three endpoints of the scanning service. Each call maps its own
/// transport and status failures onto the matching `ScanError` variant;
/// token extraction and body decoding are left to the caller.
pub trait ScanBackend {
    /// Step 1: fetch the loading page markup that embeds the token.
    fn loading_page(&self, req: &ScanRequest) -> Result<String>;
    /// Step 2: start the asynchronous evaluation.
    fn evaluate(&self, req: &ScanRequest, token: &ScanToken) -> Result<()>;
    /// Step 3: fetch the scan-details body for a token.
    fn scan_details(&self, token: &ScanToken) -> Result<String>;
}

impl<B: ScanBackend + ?Sized> ScanBackend for &B {
    fn loading_page(&self, req: &ScanRequest) -> Result<String> {
        (**self).loading_page(req)
    }

    fn evaluate(&self, req: &ScanRequest, token: &ScanToken) -> Result<()> {
        (**self).evaluate(req, token)
    }

    fn scan_details(&self, token: &ScanToken) -> Result<String> {
        (**self).scan_details(token)
    }
}
