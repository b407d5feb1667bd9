use crate::config::Schema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// One report row keyed by metric name. Key order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatRecord(BTreeMap<String, Value>);

impl FlatRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Row for a URL whose scan never produced a document.
    pub fn failed(url: &str, report_link: &str, schema: &Schema) -> Self {
        let mut r = Self::new();
        r.insert(schema.url_column.clone(), Value::from(url));
        r.insert(schema.link_column.clone(), Value::from(report_link));
        r.insert(
            schema.status_key.clone(),
            Value::from(schema.failed_status.as_str()),
        );
        r.insert(schema.verdict_key.clone(), Value::from(""));
        r.insert(schema.score_key.clone(), Value::from(""));
        r
    }

    pub fn insert(&mut self, key: String, value: Value) -> Option<Value> {
        self.0.insert(key, value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn status<'a>(&'a self, schema: &Schema) -> Option<&'a str> {
        self.get(&schema.status_key).and_then(Value::as_str)
    }

    pub fn is_success(&self, schema: &Schema) -> bool {
        self.status(schema) == Some(schema.success_status.as_str())
    }

    /// Score as a number, accepting numeric strings the way the backend sometimes sends them.
    pub fn numeric_score(&self, schema: &Schema) -> Option<f64> {
        match self.get(&schema.score_key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        }
    }
}

/// All rows of one run, in request order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet(Vec<FlatRecord>);

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: FlatRecord) {
        self.0.push(record);
    }

    pub fn records(&self) -> &[FlatRecord] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Union of keys across all rows: the schema's leading columns first, the
    /// rest in lexical order. Leading columns are always present even if no
    /// row carries them.
    pub fn columns(&self, schema: &Schema) -> Vec<String> {
        let leading = schema.leading_columns();
        let rest: BTreeSet<&str> = self
            .0
            .iter()
            .flat_map(FlatRecord::keys)
            .filter(|k| !leading.contains(k))
            .collect();
        leading
            .iter()
            .map(|s| s.to_string())
            .chain(rest.into_iter().map(String::from))
            .collect()
    }

    pub fn summary(&self, schema: &Schema) -> RunSummary {
        let successes: Vec<&FlatRecord> =
            self.0.iter().filter(|r| r.is_success(schema)).collect();

        let mut scores: Vec<f64> = successes
            .iter()
            .filter_map(|r| r.numeric_score(schema))
            .collect();
        let average_score = if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        };

        scores.sort_by(f64::total_cmp);
        let mut score_distribution: Vec<ScoreCount> = Vec::new();
        for score in scores {
            match score_distribution.last_mut() {
                Some(last) if last.score == score => last.count += 1,
                _ => score_distribution.push(ScoreCount { score, count: 1 }),
            }
        }

        RunSummary {
            total_pages: self.0.len(),
            successful_scans: successes.len(),
            failed_scans: self.0.len() - successes.len(),
            average_score,
            score_distribution,
        }
    }
}

impl IntoIterator for ResultSet {
    type Item = FlatRecord;
    type IntoIter = std::vec::IntoIter<FlatRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_pages: usize,
    pub successful_scans: usize,
    /// Anything not reporting the success status, synthetic failures included.
    pub failed_scans: usize,
    /// Mean over successful rows with a numeric score. `None` when there are none.
    pub average_score: Option<f64>,
    /// Ascending by score.
    pub score_distribution: Vec<ScoreCount>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreCount {
    pub score: f64,
    pub count: usize,
}

impl RunSummary {
    pub fn average_score_display(&self) -> String {
        match self.average_score {
            Some(avg) => format!("{avg:.1}"),
            None => "N/A".to_string(),
        }
    }
}
