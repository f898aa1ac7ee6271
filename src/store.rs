use std::io::Read;
use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

use crate::models::{SolvedProblemRow, Stats};
use crate::stats;

/// Read access to a user's solved problems.
#[async_trait]
pub trait ProblemStore: Send + Sync {
    async fn list_solved_problems(&self, user_email: &str) -> anyhow::Result<Vec<SolvedProblemRow>>;
}

/// Loads a user's records from `store` and aggregates them as of `today`.
pub async fn user_stats(
    store: &dyn ProblemStore,
    user_email: &str,
    today: NaiveDate,
) -> anyhow::Result<Stats> {
    let rows = store.list_solved_problems(user_email).await?;
    debug!(user_email, rows = rows.len(), "aggregating solved problems");
    let stats = stats::compute_stats(&rows, today)?;
    Ok(stats)
}

/// One line of a solved-problem CSV export.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportRow {
    pub full_name: String,
    pub email: String,
    pub title: String,
    pub difficulty: String,
    pub platform: String,
    /// Semicolon-separated topic names.
    #[serde(default)]
    pub topics: String,
    pub date_solved: String,
    pub source_key: Option<String>,
}

impl ImportRow {
    pub fn topic_list(&self) -> Vec<String> {
        self.topics
            .split(';')
            .map(str::trim)
            .filter(|topic| !topic.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn to_solved_row(&self, line: usize) -> SolvedProblemRow {
        SolvedProblemRow {
            id: self
                .source_key
                .clone()
                .unwrap_or_else(|| format!("line-{line}")),
            title: self.title.clone(),
            difficulty: self.difficulty.clone(),
            platform: self.platform.clone(),
            topics: self.topic_list(),
            date_solved: self.date_solved.clone(),
        }
    }
}

/// In-memory snapshot of a CSV export, for working without a database.
pub struct CsvProblemStore {
    rows: Vec<ImportRow>,
}

impl CsvProblemStore {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> anyhow::Result<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let mut rows = Vec::new();
        for (index, result) in reader.deserialize::<ImportRow>().enumerate() {
            // Header is line 1.
            let row = result
                .with_context(|| format!("malformed CSV record on line {}", index + 2))?;
            rows.push(row);
        }
        Ok(Self { rows })
    }
}

#[async_trait]
impl ProblemStore for CsvProblemStore {
    async fn list_solved_problems(
        &self,
        user_email: &str,
    ) -> anyhow::Result<Vec<SolvedProblemRow>> {
        Ok(self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.email.eq_ignore_ascii_case(user_email))
            .map(|(index, row)| row.to_solved_row(index + 2))
            .collect())
    }
}
