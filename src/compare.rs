use std::collections::BTreeSet;

use futures::future::join_all;
use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};
use crate::leetcode::ProfileSource;
use crate::models::{ComparisonResult, ProfileScore};
use crate::scoring::{score_profile, ScoringConfig};

const SIGNIFICANT_GAP: u32 = 30;
const HARD_RATIO_SPREAD: f64 = 0.1;
const HIGH_CONSISTENCY: u32 = 80;

/// Fetches and scores one profile. Every failure is returned to the caller.
pub async fn analyze_profile(
    source: &dyn ProfileSource,
    username: &str,
    config: &ScoringConfig,
) -> EngineResult<ProfileScore> {
    let username = username.trim();
    if username.is_empty() {
        return Err(EngineError::Validation("username must not be empty".to_string()));
    }

    let raw = source
        .fetch_profile(username, config.consistency_window)
        .await?;
    score_profile(username, &raw, config)
}

/// Scores every username concurrently; individual failures drop that
/// profile, but fewer than two survivors fails the comparison.
pub async fn compare_profiles(
    source: &dyn ProfileSource,
    usernames: &[String],
    config: &ScoringConfig,
) -> EngineResult<ComparisonResult> {
    let usernames: Vec<&str> = usernames
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .collect();
    if usernames.len() < 2 {
        return Err(EngineError::Validation(
            "at least 2 usernames are required for a comparison".to_string(),
        ));
    }

    let outcomes = join_all(
        usernames
            .iter()
            .map(|username| analyze_profile(source, username, config)),
    )
    .await;

    let mut profiles = Vec::with_capacity(outcomes.len());
    for (username, outcome) in usernames.iter().zip(outcomes) {
        match outcome {
            Ok(profile) => profiles.push(profile),
            Err(err) => {
                warn!(username = %username, error = %err, "dropping profile from comparison")
            }
        }
    }

    if profiles.len() < 2 {
        return Err(EngineError::InsufficientProfiles {
            resolved: profiles.len(),
            requested: usernames.len(),
        });
    }

    info!(
        requested = usernames.len(),
        resolved = profiles.len(),
        "profiles compared"
    );

    Ok(ComparisonResult {
        common_topics: common_topics(&profiles),
        analysis: analysis(&profiles),
        profiles,
    })
}

pub fn common_topics(profiles: &[ProfileScore]) -> BTreeSet<String> {
    let mut iter = profiles.iter();
    let Some(first) = iter.next() else {
        return BTreeSet::new();
    };

    let mut common: BTreeSet<String> = first.strong_topics.iter().cloned().collect();
    for profile in iter {
        common.retain(|topic| profile.strong_topics.contains(topic));
    }
    common
}

/// Narrative summary. Ties for top or bottom go to the earliest profile.
pub fn analysis(profiles: &[ProfileScore]) -> String {
    let (Some(top), Some(bottom)) = (
        extreme_by(profiles, |p| p.total_score as f64, true),
        extreme_by(profiles, |p| p.total_score as f64, false),
    ) else {
        return String::new();
    };

    let gap = top.total_score - bottom.total_score;
    let mut text = if gap > SIGNIFICANT_GAP {
        format!(
            "{} leads with a score of {}, {} points ahead of {}. \
             There is a significant performance gap between these profiles.",
            top.username, top.total_score, gap, bottom.username
        )
    } else {
        format!(
            "These profiles show similar performance, with scores between {} and {}.",
            bottom.total_score, top.total_score
        )
    };

    if let (Some(hardest), Some(lightest)) = (
        extreme_by(profiles, ProfileScore::hard_ratio, true),
        extreme_by(profiles, ProfileScore::hard_ratio, false),
    ) {
        if hardest.hard_ratio() - lightest.hard_ratio() > HARD_RATIO_SPREAD {
            text.push_str(&format!(
                " {} focuses more on hard problems ({:.0}% of solved problems are hard).",
                hardest.username,
                hardest.hard_ratio() * 100.0
            ));
        }
    }

    let consistent: Vec<&str> = profiles
        .iter()
        .filter(|p| p.consistency > HIGH_CONSISTENCY)
        .map(|p| p.username.as_str())
        .collect();
    if !consistent.is_empty() {
        text.push_str(&format!(
            " High consistency in recent practice: {}.",
            consistent.join(", ")
        ));
    }

    text
}

fn extreme_by<F>(profiles: &[ProfileScore], key: F, highest: bool) -> Option<&ProfileScore>
where
    F: Fn(&ProfileScore) -> f64,
{
    let mut best: Option<&ProfileScore> = None;
    for profile in profiles {
        let better = match best {
            None => true,
            Some(current) if highest => key(profile) > key(current),
            Some(current) => key(profile) < key(current),
        };
        if better {
            best = Some(profile);
        }
    }
    best
}
