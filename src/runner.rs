use crate::{
    backend::{RawScanDocument, ScanBackend, ScanRequest},
    client::{ScanClient, Sleeper},
    config::Config,
    flatten::flatten,
    record::{FlatRecord, ResultSet},
    util::ensure_dir,
};
use serde_json::Value;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Runs the scan client and flattener over a URL list, one URL at a time.
pub struct BatchRunner<B: ScanBackend, S: Sleeper> {
    cfg: Config,
    client: ScanClient<B, S>,
    raw_dir: Option<PathBuf>,
}

impl<B: ScanBackend, S: Sleeper> BatchRunner<B, S> {
    pub fn new(cfg: &Config, client: ScanClient<B, S>) -> Self {
        Self {
            cfg: cfg.clone(),
            client,
            raw_dir: None,
        }
    }

    /// Write each successful raw document into `dir` as `NNNN.json`.
    pub fn keep_raw_documents(mut self, dir: PathBuf) -> Self {
        self.raw_dir = Some(dir);
        self
    }

    pub fn report_link(&self, url: &str) -> String {
        format!("{}?website={}", self.cfg.backend.report_link_base, url)
    }

    /// Always returns exactly one record per input URL, in input order.
    pub fn run(&self, urls: &[ScanRequest], on_progress: &mut dyn FnMut(&str)) -> ResultSet {
        let schema = &self.cfg.schema;
        let delay = Duration::from_secs(self.cfg.timing.inter_url_delay_seconds);
        let mut results = ResultSet::new();
        let total = urls.len();

        let mut notify = |msg: &str| {
            if catch_unwind(AssertUnwindSafe(|| on_progress(msg))).is_err() {
                warn!("progress callback panicked; continuing batch");
            }
        };

        for (i, req) in urls.iter().enumerate() {
            info!("processing {} of {}: {}", i + 1, total, req);
            let link = self.report_link(req.as_str());

            let record = match self.client.scan(req, &mut notify) {
                Ok(doc) => {
                    self.store_raw(i, &doc);
                    let mut record = flatten(&doc, schema);
                    record.insert(schema.url_column.clone(), Value::from(req.as_str()));
                    record.insert(schema.link_column.clone(), Value::from(link));
                    record
                }
                Err(err) => {
                    warn!(kind = err.kind(), "scan failed for {req}: {err}");
                    FlatRecord::failed(req.as_str(), &link, schema)
                }
            };
            results.push(record);

            if i + 1 < total && !delay.is_zero() {
                debug!("pausing {:?} before next URL", delay);
                self.client.sleeper().sleep(delay);
            }
        }

        results
    }

    fn store_raw(&self, index: usize, doc: &RawScanDocument) {
        let Some(dir) = &self.raw_dir else {
            return;
        };
        let write = || -> anyhow::Result<()> {
            ensure_dir(dir)?;
            std::fs::write(
                dir.join(format!("{index:04}.json")),
                serde_json::to_string_pretty(doc)?,
            )?;
            Ok(())
        };
        if let Err(e) = write() {
            warn!("could not keep raw document {index}: {e:#}");
        }
    }
}
