use crate::{backend::ScanRequest, config::Program};
use anyhow::{anyhow, Result};
use serde::Serialize;

/// What the user asked to scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    Programs(Vec<String>),
    Urls(Vec<String>),
}

impl Selection {
    pub fn describe(&self) -> Vec<String> {
        match self {
            Selection::All => vec!["all".to_string()],
            Selection::Programs(names) => names.iter().map(|n| format!("program:{n}")).collect(),
            Selection::Urls(urls) => urls.iter().map(|u| format!("url:{u}")).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgramListing {
    pub name: String,
    pub main_url: String,
    pub page_count: usize,
}

pub struct Catalog<'a> {
    programs: &'a [Program],
}

impl<'a> Catalog<'a> {
    pub fn new(programs: &'a [Program]) -> Self {
        Self { programs }
    }

    pub fn listing(&self) -> Vec<ProgramListing> {
        self.programs
            .iter()
            .map(|p| ProgramListing {
                name: p.name.clone(),
                main_url: p.main_url.clone(),
                page_count: p.pages.len(),
            })
            .collect()
    }

    pub fn total_pages(&self) -> usize {
        self.programs.iter().map(|p| p.pages.len()).sum()
    }

    /// Program names match case-insensitively.
    pub fn find(&self, name: &str) -> Option<&'a Program> {
        self.programs
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Resolves a selection into validated scan requests, keeping catalog
    /// order and duplicates. Any malformed URL rejects the whole selection.
    pub fn resolve(&self, sel: &Selection, allowed_schemes: &[String]) -> Result<Vec<ScanRequest>> {
        let raw: Vec<&str> = match sel {
            Selection::All => self
                .programs
                .iter()
                .flat_map(|p| p.pages.iter().map(String::as_str))
                .collect(),
            Selection::Programs(names) => {
                let mut out = Vec::new();
                for name in names {
                    let program = self
                        .find(name)
                        .ok_or_else(|| anyhow!("unknown program: {name}"))?;
                    out.extend(program.pages.iter().map(String::as_str));
                }
                out
            }
            Selection::Urls(urls) => urls.iter().map(String::as_str).collect(),
        };

        raw.into_iter()
            .map(|u| ScanRequest::parse(u, allowed_schemes))
            .collect()
    }
}

pub const EMPTY_SELECTION: &str = "selection resolved to zero URLs; no results would be generated";

/// Decides what an empty resolution means for the run. Returns `Ok(true)`
/// when there is work to do, `Ok(false)` when the run should end quietly,
/// and an error when `fail_on_empty` is set.
pub fn check_non_empty(requests: &[ScanRequest], fail_on_empty: bool) -> Result<bool> {
    if !requests.is_empty() {
        return Ok(true);
    }
    if fail_on_empty {
        return Err(anyhow!(EMPTY_SELECTION));
    }
    Ok(false)
}
