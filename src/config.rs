use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: Global,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub timing: Timing,
    #[serde(default)]
    pub schema: Schema,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub debug: Debug,
    #[serde(default)]
    pub security: Security,
    #[serde(default)]
    pub programs: Vec<Program>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }

    /// A stable, normalization-friendly string for hashing.
    pub fn normalized_for_hash(&self) -> String {
        toml::to_string(self).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Global {
    pub print_summary: bool,
    /// Exit non-zero when a run produced no records at all.
    pub fail_on_empty: bool,
}
impl Default for Global {
    fn default() -> Self {
        Self {
            print_summary: true,
            fail_on_empty: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paths {
    pub out_dir: String,
}
impl Default for Paths {
    fn default() -> Self {
        Self {
            out_dir: "out".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Backend {
    pub base_url: String,
    pub report_link_base: String,
    pub embedder: String,
    pub is_partner: bool,
    pub screenshot: bool,
    pub user_agent: String,
    /// 0 disables the per-request timeout.
    pub request_timeout_seconds: u64,
    /// Regex with one capture group holding the token.
    pub token_pattern: String,
}
impl Default for Backend {
    fn default() -> Self {
        Self {
            base_url: "https://acsbace.com".into(),
            report_link_base: "https://accessibe.com/accessscan".into(),
            embedder: "accessibe.com".into(),
            is_partner: false,
            screenshot: true,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".into(),
            request_timeout_seconds: 60,
            token_pattern: r#"data-token="([^"]+)""#.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timing {
    pub scan_wait_seconds: u64,
    pub inter_url_delay_seconds: u64,
}
impl Default for Timing {
    fn default() -> Self {
        Self {
            scan_wait_seconds: 40,
            inter_url_delay_seconds: 2,
        }
    }
}

/// Field names on both sides of the flattener. Backend keys double as the
/// output metric names, as the service's own report does.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    pub status_key: String,
    pub result_key: String,
    pub verdict_key: String,
    pub score_key: String,
    pub platform_key: String,
    pub elements_key: String,
    pub duration_key: String,
    pub reports_key: String,
    pub failures_key: String,
    pub successes_key: String,
    pub url_column: String,
    pub link_column: String,
    pub success_status: String,
    pub failed_status: String,
}
impl Default for Schema {
    fn default() -> Self {
        Self {
            status_key: "scanStatus".into(),
            result_key: "result".into(),
            verdict_key: "verdict".into(),
            score_key: "score".into(),
            platform_key: "detectedCMS".into(),
            elements_key: "totalElements".into(),
            duration_key: "timeToScan".into(),
            reports_key: "reports".into(),
            failures_key: "failures".into(),
            successes_key: "successes".into(),
            url_column: "website_url".into(),
            link_column: "accessibe_url".into(),
            success_status: "success".into(),
            failed_status: "failed".into(),
        }
    }
}

impl Schema {
    /// Columns that lead every export, in order.
    pub fn leading_columns(&self) -> [&str; 5] {
        [
            self.url_column.as_str(),
            self.link_column.as_str(),
            self.status_key.as_str(),
            self.verdict_key.as_str(),
            self.score_key.as_str(),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    pub write_xlsx: bool,
    pub write_json: bool,
    pub write_summary_json: bool,
    pub write_index_json: bool,
    pub xlsx_filename: String,
    pub json_filename: String,
    pub summary_filename: String,
    pub sheet_name: String,
}
impl Default for Output {
    fn default() -> Self {
        Self {
            write_xlsx: true,
            write_json: true,
            write_summary_json: true,
            write_index_json: true,
            xlsx_filename: "accessibility_results.xlsx".into(),
            json_filename: "results.json".into(),
            summary_filename: "summary.json".into(),
            sheet_name: "Results".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: true,
            file_path: "".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Debug {
    pub dump_effective_config: bool,
    pub keep_raw_documents: bool,
}
impl Default for Debug {
    fn default() -> Self {
        Self {
            dump_effective_config: true,
            keep_raw_documents: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Security {
    pub allowed_schemes: Vec<String>,
}
impl Default for Security {
    fn default() -> Self {
        Self {
            allowed_schemes: vec!["http".into(), "https".into()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub name: String,
    pub main_url: String,
    #[serde(default)]
    pub pages: Vec<String>,
}
