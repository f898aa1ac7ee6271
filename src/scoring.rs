use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate};

use crate::error::{EngineError, EngineResult};
use crate::models::{ExternalProfileData, ProfileScore, ScoreBreakdown, TagCount};

pub const VOLUME_CAP: u32 = 30;
pub const DIFFICULTY_CAP: u32 = 40;
pub const CONSISTENCY_CAP: u32 = 20;
pub const SPEED_CAP: u32 = 10;

/// Problems needed to saturate the volume component.
const VOLUME_SATURATION: f64 = 100.0;
const TOPIC_LIMIT: usize = 3;
const HARD_RATIO_TARGET: f64 = 0.10;
const CONSISTENCY_TARGET: u32 = 70;
const CONTEST_TARGET: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringConfig {
    /// Divisor for the distinct-active-days ratio.
    pub consistency_window: usize,
}

impl ScoringConfig {
    pub fn with_window(consistency_window: usize) -> Self {
        Self { consistency_window }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            consistency_window: 30,
        }
    }
}

pub fn score_profile(
    username: &str,
    raw: &ExternalProfileData,
    config: &ScoringConfig,
) -> EngineResult<ProfileScore> {
    validate(raw)?;

    let consistency =
        consistency_percent(&raw.recent_submission_timestamps, config.consistency_window)?;
    let breakdown = score_components(raw, consistency);
    let strong_topics = strong_topics(&raw.tag_counts);
    let weak_topics = weak_topics(&raw.tag_counts);
    let recommendations = recommendations(raw, consistency, &weak_topics);

    Ok(ProfileScore {
        username: username.to_string(),
        total_score: breakdown.total(),
        breakdown,
        total_problems: raw.total_count,
        easy_count: raw.easy_count,
        medium_count: raw.medium_count,
        hard_count: raw.hard_count,
        strong_topics,
        weak_topics,
        consistency,
        problem_solving_speed: capped(raw.acceptance_rate_percent, 100),
        ranking: raw.ranking.unwrap_or(0),
        recommendations,
    })
}

/// Each component is rounded and capped on its own before the sum.
pub fn score_components(raw: &ExternalProfileData, consistency: u32) -> ScoreBreakdown {
    let total = raw.total_count as f64;
    let weighted =
        raw.easy_count as f64 + 2.0 * raw.medium_count as f64 + 3.0 * raw.hard_count as f64;
    let difficulty_score = weighted / total.max(1.0);

    ScoreBreakdown {
        volume: capped(total / VOLUME_SATURATION * VOLUME_CAP as f64, VOLUME_CAP),
        difficulty: capped(difficulty_score * DIFFICULTY_CAP as f64, DIFFICULTY_CAP),
        consistency: capped(consistency as f64 * 0.2, CONSISTENCY_CAP),
        speed: capped(raw.acceptance_rate_percent * 0.1, SPEED_CAP),
    }
}

/// Distinct UTC days among the sampled submissions, as a share of `window`.
pub fn consistency_percent(timestamps: &[i64], window: usize) -> EngineResult<u32> {
    let days = timestamps
        .iter()
        .map(|ts| {
            DateTime::from_timestamp(*ts, 0)
                .map(|instant| instant.date_naive())
                .ok_or_else(|| {
                    EngineError::Validation(format!("submission timestamp {ts} is out of range"))
                })
        })
        .collect::<EngineResult<BTreeSet<NaiveDate>>>()?;

    let ratio = days.len() as f64 / window.max(1) as f64;
    Ok(capped(ratio * 100.0, 100))
}

pub fn strong_topics(tags: &[TagCount]) -> Vec<String> {
    let mut ranked: Vec<&TagCount> = tags.iter().filter(|tag| tag.solved > 0).collect();
    ranked.sort_by(|a, b| b.solved.cmp(&a.solved).then_with(|| a.tag.cmp(&b.tag)));
    ranked
        .into_iter()
        .take(TOPIC_LIMIT)
        .map(|tag| tag.tag.clone())
        .collect()
}

pub fn weak_topics(tags: &[TagCount]) -> Vec<String> {
    let mut attempted: Vec<(&TagCount, f64)> = tags
        .iter()
        .filter(|tag| tag.solved > 0)
        .map(|tag| (tag, tag.solved as f64 / tag.total.max(tag.solved) as f64))
        .collect();
    attempted.sort_by(|(a, a_ratio), (b, b_ratio)| {
        a_ratio
            .total_cmp(b_ratio)
            .then_with(|| a.tag.cmp(&b.tag))
    });
    attempted
        .into_iter()
        .take(TOPIC_LIMIT)
        .map(|(tag, _)| tag.tag.clone())
        .collect()
}

/// Rules fire in a fixed order so the output is reproducible.
pub fn recommendations(
    raw: &ExternalProfileData,
    consistency: u32,
    weak_topics: &[String],
) -> Vec<String> {
    let mut advice = Vec::new();

    let hard_ratio = raw.hard_count as f64 / raw.total_count.max(1) as f64;
    if hard_ratio < HARD_RATIO_TARGET {
        advice.push(
            "Try solving more hard problems to strengthen your problem-solving depth".to_string(),
        );
    }
    if consistency < CONSISTENCY_TARGET {
        advice.push("Practice daily to build a more consistent solving habit".to_string());
    }
    if let Some(weakest) = weak_topics.first() {
        advice.push(format!("Focus on improving your {weakest} skills"));
    }
    if raw.contest_count.unwrap_or(0) < CONTEST_TARGET {
        advice.push("Participate in more contests to practice under time pressure".to_string());
    }

    if advice.is_empty() {
        advice.push("Great work! Keep challenging yourself with harder problems".to_string());
    }
    advice
}

fn validate(raw: &ExternalProfileData) -> EngineResult<()> {
    if !raw.acceptance_rate_percent.is_finite()
        || !(0.0..=100.0).contains(&raw.acceptance_rate_percent)
    {
        return Err(EngineError::Validation(format!(
            "acceptance rate {} is outside 0..=100",
            raw.acceptance_rate_percent
        )));
    }

    let by_difficulty = raw.easy_count as u64 + raw.medium_count as u64 + raw.hard_count as u64;
    if by_difficulty > raw.total_count as u64 {
        return Err(EngineError::Validation(format!(
            "difficulty counts sum to {by_difficulty} but total is {}",
            raw.total_count
        )));
    }

    if let Some(tag) = raw.tag_counts.iter().find(|tag| tag.solved > tag.total) {
        return Err(EngineError::Validation(format!(
            "tag {} reports {} solved out of {}",
            tag.tag, tag.solved, tag.total
        )));
    }

    Ok(())
}

fn capped(value: f64, cap: u32) -> u32 {
    (value.round().max(0.0) as u32).min(cap)
}
