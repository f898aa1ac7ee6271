use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "EASY",
            Difficulty::Medium => "MEDIUM",
            Difficulty::Hard => "HARD",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EASY" => Ok(Difficulty::Easy),
            "MEDIUM" => Ok(Difficulty::Medium),
            "HARD" => Ok(Difficulty::Hard),
            other => Err(EngineError::Validation(format!(
                "unknown difficulty '{other}'"
            ))),
        }
    }
}

/// A solved-problem row as the record store hands it over, before decoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolvedProblemRow {
    pub id: String,
    pub title: String,
    pub difficulty: String,
    pub platform: String,
    pub topics: Vec<String>,
    pub date_solved: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolvedProblem {
    pub id: String,
    pub title: String,
    pub difficulty: Difficulty,
    pub platform: String,
    pub topics: BTreeSet<String>,
    pub date_solved: NaiveDate,
}

impl TryFrom<&SolvedProblemRow> for SolvedProblem {
    type Error = EngineError;

    fn try_from(row: &SolvedProblemRow) -> Result<Self, Self::Error> {
        let date_solved = NaiveDate::parse_from_str(row.date_solved.trim(), "%Y-%m-%d")
            .map_err(|err| {
                EngineError::Validation(format!(
                    "problem {} has unparseable solve date '{}': {err}",
                    row.id, row.date_solved
                ))
            })?;
        let difficulty = row.difficulty.parse::<Difficulty>().map_err(|err| match err {
            EngineError::Validation(msg) => {
                EngineError::Validation(format!("problem {}: {msg}", row.id))
            }
            other => other,
        })?;

        Ok(SolvedProblem {
            id: row.id.clone(),
            title: row.title.clone(),
            difficulty,
            platform: row.platform.trim().to_string(),
            topics: row
                .topics
                .iter()
                .map(|topic| topic.trim())
                .filter(|topic| !topic.is_empty())
                .map(str::to_string)
                .collect(),
            date_solved,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyBreakdown {
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPoint {
    pub date: NaiveDate,
    pub cumulative_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentProblem {
    pub id: String,
    pub title: String,
    pub difficulty: Difficulty,
    pub platform: String,
    pub topics: Vec<String>,
    pub date_solved: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_solved: usize,
    pub current_streak: u32,
    pub weekly_average: f64,
    pub difficulty_breakdown: DifficultyBreakdown,
    pub platform_breakdown: BTreeMap<String, usize>,
    pub topic_distribution: Vec<TopicCount>,
    pub daily_activity: Vec<DailyCount>,
    pub progress_data: Vec<ProgressPoint>,
    pub recent_problems: Vec<RecentProblem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub solved: u32,
    pub total: u32,
}

/// Raw counters for one external profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalProfileData {
    pub total_count: u32,
    pub easy_count: u32,
    pub medium_count: u32,
    pub hard_count: u32,
    pub tag_counts: Vec<TagCount>,
    /// Epoch seconds of recent accepted submissions.
    pub recent_submission_timestamps: Vec<i64>,
    pub acceptance_rate_percent: f64,
    pub ranking: Option<u64>,
    pub contest_count: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub volume: u32,
    pub difficulty: u32,
    pub consistency: u32,
    pub speed: u32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u32 {
        self.volume + self.difficulty + self.consistency + self.speed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileScore {
    pub username: String,
    pub total_score: u32,
    pub breakdown: ScoreBreakdown,
    pub total_problems: u32,
    pub easy_count: u32,
    pub medium_count: u32,
    pub hard_count: u32,
    pub strong_topics: Vec<String>,
    pub weak_topics: Vec<String>,
    pub consistency: u32,
    pub problem_solving_speed: u32,
    pub ranking: u64,
    pub recommendations: Vec<String>,
}

impl ProfileScore {
    pub fn hard_ratio(&self) -> f64 {
        self.hard_count as f64 / self.total_problems.max(1) as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub profiles: Vec<ProfileScore>,
    pub common_topics: BTreeSet<String>,
    pub analysis: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(difficulty: &str, date: &str) -> SolvedProblemRow {
        SolvedProblemRow {
            id: "p-1".to_string(),
            title: "Two Sum".to_string(),
            difficulty: difficulty.to_string(),
            platform: "LeetCode".to_string(),
            topics: vec!["Array".to_string(), " Hash Table ".to_string(), "".to_string()],
            date_solved: date.to_string(),
        }
    }

    #[test]
    fn decodes_valid_rows() {
        let problem = SolvedProblem::try_from(&row("medium", "2024-03-09")).unwrap();
        assert_eq!(problem.difficulty, Difficulty::Medium);
        assert_eq!(problem.date_solved, NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        let topics: Vec<&str> = problem.topics.iter().map(String::as_str).collect();
        assert_eq!(topics, vec!["Array", "Hash Table"]);
    }

    #[test]
    fn rejects_unparseable_dates() {
        let err = SolvedProblem::try_from(&row("EASY", "2024-13-40")).unwrap_err();
        assert!(matches!(err, EngineError::Validation(msg) if msg.contains("p-1")));
    }

    #[test]
    fn rejects_unknown_difficulty() {
        let err = SolvedProblem::try_from(&row("EXTREME", "2024-01-01")).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn difficulty_serializes_uppercase() {
        let json = serde_json::to_string(&Difficulty::Hard).unwrap();
        assert_eq!(json, "\"HARD\"");
    }
}
