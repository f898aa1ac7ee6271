use std::collections::HashMap;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::models::{ExternalProfileData, TagCount};

/// Source of raw counters for an external profile.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// `sample_size` is how many recent accepted submissions to return.
    async fn fetch_profile(
        &self,
        username: &str,
        sample_size: usize,
    ) -> EngineResult<ExternalProfileData>;
}

const PROFILE_QUERY: &str = r#"
query userProfile($username: String!, $limit: Int!) {
  matchedUser(username: $username) {
    username
    profile { ranking }
    submitStatsGlobal {
      acSubmissionNum { difficulty count submissions }
      totalSubmissionNum { difficulty count submissions }
    }
    tagProblemCounts {
      advanced { tagName tagSlug problemsSolved }
      intermediate { tagName tagSlug problemsSolved }
      fundamental { tagName tagSlug problemsSolved }
    }
  }
  userContestRanking(username: $username) { attendedContestsCount }
  recentAcSubmissionList(username: $username, limit: $limit) { timestamp }
}
"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileData {
    matched_user: Option<MatchedUser>,
    user_contest_ranking: Option<ContestRanking>,
    #[serde(default)]
    recent_ac_submission_list: Option<Vec<RecentSubmission>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchedUser {
    profile: Option<UserProfile>,
    submit_stats_global: SubmitStats,
    tag_problem_counts: TagProblemCounts,
}

#[derive(Debug, Deserialize)]
struct UserProfile {
    ranking: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitStats {
    ac_submission_num: Vec<DifficultyCount>,
    total_submission_num: Vec<DifficultyCount>,
}

#[derive(Debug, Deserialize)]
struct DifficultyCount {
    difficulty: String,
    count: u32,
    submissions: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TagProblemCounts {
    advanced: Vec<TagSolved>,
    intermediate: Vec<TagSolved>,
    fundamental: Vec<TagSolved>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TagSolved {
    tag_name: String,
    tag_slug: String,
    problems_solved: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContestRanking {
    attended_contests_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RecentSubmission {
    timestamp: String,
}

#[derive(Debug, Deserialize)]
struct QuestionTotal {
    total: u32,
}

/// GraphQL client for leetcode.com profiles.
pub struct LeetCodeClient {
    client: Client,
    endpoint: String,
}

impl LeetCodeClient {
    pub fn new(endpoint: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("practice-insights/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    async fn post<T>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> EngineResult<GraphQlResponse<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Referer", "https://leetcode.com")
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::UpstreamUnavailable(format!(
                "profile source answered {status}"
            )));
        }

        Ok(response.json().await?)
    }

    /// Question totals for each tag slug, in slug order, batched into one
    /// aliased query. Any missing total fails the whole lookup.
    async fn tag_totals(&self, slugs: &[String]) -> EngineResult<Vec<u32>> {
        if slugs.is_empty() {
            return Ok(Vec::new());
        }

        let mut params = Vec::with_capacity(slugs.len());
        let mut fields = Vec::with_capacity(slugs.len());
        let mut variables = serde_json::Map::new();
        for (index, slug) in slugs.iter().enumerate() {
            params.push(format!("$t{index}: [String!]"));
            fields.push(format!(
                "t{index}: problemsetQuestionList(categorySlug: \"\", limit: 1, skip: 0, \
                 filters: {{tags: $t{index}}}) {{ total: totalNum }}"
            ));
            variables.insert(format!("t{index}"), json!([slug]));
        }
        let query = format!(
            "query tagTotals({}) {{ {} }}",
            params.join(", "),
            fields.join(" ")
        );

        let body: GraphQlResponse<HashMap<String, Option<QuestionTotal>>> = self
            .post(&query, serde_json::Value::Object(variables))
            .await?;
        if let Some(error) = body.errors.first() {
            return Err(EngineError::UpstreamUnavailable(format!(
                "tag totals lookup failed: {}",
                error.message
            )));
        }
        let data = body.data.unwrap_or_default();

        slugs
            .iter()
            .enumerate()
            .map(|(index, slug)| {
                data.get(&format!("t{index}"))
                    .and_then(|total| total.as_ref())
                    .map(|total| total.total)
                    .ok_or_else(|| {
                        EngineError::UpstreamUnavailable(format!(
                            "no question total for tag {slug}"
                        ))
                    })
            })
            .collect()
    }
}

#[async_trait]
impl ProfileSource for LeetCodeClient {
    async fn fetch_profile(
        &self,
        username: &str,
        sample_size: usize,
    ) -> EngineResult<ExternalProfileData> {
        debug!(username, sample_size, endpoint = %self.endpoint, "fetching profile");

        let body: GraphQlResponse<ProfileData> = self
            .post(
                PROFILE_QUERY,
                json!({ "username": username, "limit": sample_size }),
            )
            .await?;
        let Some(data) = body.data else {
            let message = body
                .errors
                .first()
                .map(|error| error.message.clone())
                .unwrap_or_else(|| "empty profile response".to_string());
            return Err(EngineError::UpstreamUnavailable(message));
        };

        // An unknown user comes back as a null match plus an error entry.
        let user = data
            .matched_user
            .ok_or_else(|| EngineError::ProfileNotFound(username.to_string()))?;
        if let Some(error) = body.errors.first() {
            return Err(EngineError::UpstreamUnavailable(error.message.clone()));
        }

        let solved_tags: Vec<TagSolved> = user
            .tag_problem_counts
            .advanced
            .into_iter()
            .chain(user.tag_problem_counts.intermediate)
            .chain(user.tag_problem_counts.fundamental)
            .collect();
        let slugs: Vec<String> = solved_tags.iter().map(|tag| tag.tag_slug.clone()).collect();
        let totals = self.tag_totals(&slugs).await?;

        let recent_submission_timestamps = data
            .recent_ac_submission_list
            .unwrap_or_default()
            .into_iter()
            .map(|submission| {
                submission.timestamp.parse::<i64>().map_err(|err| {
                    EngineError::UpstreamUnavailable(format!(
                        "malformed submission timestamp '{}': {err}",
                        submission.timestamp
                    ))
                })
            })
            .collect::<EngineResult<Vec<_>>>()?;

        let profile = build_profile(
            &user.submit_stats_global,
            solved_tags,
            &totals,
            recent_submission_timestamps,
            user.profile.and_then(|profile| profile.ranking),
            data.user_contest_ranking
                .and_then(|ranking| ranking.attended_contests_count),
        );

        info!(
            username,
            total = profile.total_count,
            tags = profile.tag_counts.len(),
            "profile fetched"
        );
        Ok(profile)
    }
}

fn build_profile(
    stats: &SubmitStats,
    solved_tags: Vec<TagSolved>,
    totals: &[u32],
    recent_submission_timestamps: Vec<i64>,
    ranking: Option<u64>,
    contest_count: Option<u32>,
) -> ExternalProfileData {
    let solved = |difficulty: &str| {
        stats
            .ac_submission_num
            .iter()
            .find(|entry| entry.difficulty == difficulty)
            .map(|entry| entry.count)
            .unwrap_or(0)
    };
    let submissions = |entries: &[DifficultyCount]| {
        entries
            .iter()
            .find(|entry| entry.difficulty == "All")
            .map(|entry| entry.submissions)
            .unwrap_or(0)
    };

    let accepted = submissions(&stats.ac_submission_num);
    let attempted = submissions(&stats.total_submission_num);
    let acceptance_rate_percent = if attempted == 0 {
        0.0
    } else {
        (accepted as f64 * 100.0 / attempted as f64).clamp(0.0, 100.0)
    };

    let tag_counts = solved_tags
        .into_iter()
        .zip(totals)
        .map(|(tag, total)| TagCount {
            tag: tag.tag_name,
            solved: tag.problems_solved,
            total: *total,
        })
        .collect();

    ExternalProfileData {
        total_count: solved("All"),
        easy_count: solved("Easy"),
        medium_count: solved("Medium"),
        hard_count: solved("Hard"),
        tag_counts,
        recent_submission_timestamps,
        acceptance_rate_percent,
        ranking,
        contest_count,
    }
}
