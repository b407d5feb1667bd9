use crate::{
    backend::{RawScanDocument, http::HttpBackend},
    catalog::{Catalog, EMPTY_SELECTION, Selection, check_non_empty},
    client::{ScanClient, ThreadSleeper},
    config::Config,
    export,
    flatten::flatten,
    report::{RunIndex, RunReport},
    runner::BatchRunner,
    token::TokenExtractor,
    util::{ensure_dir, now_rfc3339, run_id},
};
use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "access-audit")]
#[command(about = "Batch accessibility scan orchestrator (token handshake + result flattening + spreadsheet export)")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./access-audit.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List catalog programs and their page counts.
    Catalog {},
    /// Scan catalog pages or ad-hoc URLs and export the results.
    Scan {
        /// Every page of every program.
        #[arg(long, conflicts_with_all = ["programs", "urls"])]
        all: bool,
        /// Program name from the catalog; repeatable.
        #[arg(long = "program", conflicts_with = "urls")]
        programs: Vec<String>,
        /// Single page URL; repeatable.
        #[arg(long = "url")]
        urls: Vec<String>,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Flatten a saved scan-details document and print the row.
    Flatten {
        #[arg(long)]
        input: PathBuf,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg_path = resolve_config_path(args.config.as_deref())?;
    let cfg = Config::load(&cfg_path)?;

    match &args.cmd {
        Command::Catalog {} => {
            let log_path = resolve_log_path(&cfg, None);
            let _guard = init_logging(&args, &cfg, log_path.as_deref())?;
            list_catalog(&cfg)
        }
        Command::Flatten { input } => {
            let log_path = resolve_log_path(&cfg, None);
            let _guard = init_logging(&args, &cfg, log_path.as_deref())?;
            flatten_file(&cfg, input)
        }
        Command::Scan {
            all,
            programs,
            urls,
            out_dir,
        } => {
            let selection = selection_from_flags(*all, programs, urls)?;
            scan(&args, &cfg, &selection, out_dir.as_deref())
        }
    }
}

fn resolve_config_path(user: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = user {
        return Ok(p.to_path_buf());
    }
    let default = PathBuf::from("access-audit.toml");
    if default.exists() {
        Ok(default)
    } else {
        Ok(PathBuf::from("access-audit.example.toml"))
    }
}

fn selection_from_flags(all: bool, programs: &[String], urls: &[String]) -> Result<Selection> {
    if all {
        Ok(Selection::All)
    } else if !programs.is_empty() {
        Ok(Selection::Programs(programs.to_vec()))
    } else if !urls.is_empty() {
        Ok(Selection::Urls(urls.to_vec()))
    } else {
        Err(anyhow!("nothing to scan: pass --all, --program <name> or --url <url>"))
    }
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn list_catalog(cfg: &Config) -> Result<()> {
    let catalog = Catalog::new(&cfg.programs);
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "programs": catalog.listing(),
            "total_pages": catalog.total_pages(),
        }))?
    );
    Ok(())
}

fn flatten_file(cfg: &Config, input: &Path) -> Result<()> {
    let body = std::fs::read_to_string(input)
        .with_context(|| format!("reading scan document: {}", input.display()))?;
    let doc = RawScanDocument::from_json(&body)
        .map_err(|e| anyhow!("scan document does not decode: {e}"))?;
    let record = flatten(&doc, &cfg.schema);
    if record.is_empty() {
        warn!("document has no result object; nothing to flatten");
    }
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn scan(args: &Args, cfg: &Config, selection: &Selection, out_override: Option<&Path>) -> Result<()> {
    let catalog = Catalog::new(&cfg.programs);
    let requests = catalog.resolve(selection, &cfg.security.allowed_schemes)?;

    if !check_non_empty(&requests, cfg.global.fail_on_empty)? {
        eprintln!("{EMPTY_SELECTION}");
        return Ok(());
    }

    let started = now_rfc3339();
    let url_strs: Vec<&str> = requests.iter().map(|r| r.as_str()).collect();
    let run_id = run_id(&cfg.normalized_for_hash(), &url_strs, &started);

    let out_root = out_override
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&cfg.paths.out_dir));
    let run_dir = out_root.join(&run_id);
    ensure_dir(&run_dir)?;
    ensure_dir(&run_dir.join("logs"))?;

    let log_path = resolve_log_path(cfg, Some(&run_dir));
    let _guard = init_logging(args, cfg, log_path.as_deref())?;

    info!("run_id={run_id} urls={} out={}", requests.len(), run_dir.display());

    if cfg.debug.dump_effective_config {
        let raw = toml::to_string(cfg).unwrap_or_default();
        std::fs::write(run_dir.join("effective-config.toml"), raw)?;
    }

    let backend = HttpBackend::new(cfg)?;
    let tokens = TokenExtractor::new(&cfg.backend.token_pattern)?;
    let client = ScanClient::new(
        backend,
        ThreadSleeper,
        tokens,
        Duration::from_secs(cfg.timing.scan_wait_seconds),
    );
    let mut runner = BatchRunner::new(cfg, client);
    if cfg.debug.keep_raw_documents {
        runner = runner.keep_raw_documents(run_dir.join("raw"));
    }

    let mut on_progress = |msg: &str| eprintln!("{msg}");
    let results = runner.run(&requests, &mut on_progress);
    let summary = results.summary(&cfg.schema);
    info!(
        "completed total={} success={} failed={} average_score={}",
        summary.total_pages,
        summary.successful_scans,
        summary.failed_scans,
        summary.average_score_display()
    );

    let mut index = RunIndex {
        run_id: run_id.clone(),
        started: started.clone(),
        finished: String::new(),
        spreadsheet: None,
        results: None,
        summary: None,
    };

    if cfg.output.write_xlsx {
        export::write_xlsx(
            &results,
            &cfg.schema,
            &cfg.output.sheet_name,
            &run_dir.join(&cfg.output.xlsx_filename),
        )?;
        index.spreadsheet = Some(cfg.output.xlsx_filename.clone());
    }

    if cfg.output.write_json {
        export::write_json(&results, &run_dir.join(&cfg.output.json_filename))?;
        index.results = Some(cfg.output.json_filename.clone());
    }

    let finished = now_rfc3339();
    let report = RunReport {
        run_id: run_id.clone(),
        started,
        finished: finished.clone(),
        selection: selection.describe(),
        summary,
    };

    if cfg.output.write_summary_json {
        std::fs::write(
            run_dir.join(&cfg.output.summary_filename),
            serde_json::to_string_pretty(&report)?,
        )?;
        index.summary = Some(cfg.output.summary_filename.clone());
    }

    if cfg.output.write_index_json {
        index.finished = finished;
        std::fs::write(run_dir.join("index.json"), serde_json::to_string_pretty(&index)?)?;
    }

    if cfg.global.print_summary {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "run_id": run_id,
                "run_dir": run_dir,
                "total_pages": report.summary.total_pages,
                "successful_scans": report.summary.successful_scans,
                "failed_scans": report.summary.failed_scans,
                "average_score": report.summary.average_score_display(),
                "score_distribution": report.summary.score_distribution,
            }))?
        );
    }

    Ok(())
}

fn resolve_log_path(cfg: &Config, run_dir: Option<&Path>) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }

    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }

    if let Some(run_dir) = run_dir {
        return Some(run_dir.join("logs").join("access-audit.log"));
    }

    Some(PathBuf::from(&cfg.paths.out_dir).join("access-audit.log"))
}
