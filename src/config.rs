use std::time::Duration;

use anyhow::Context;

pub const DEFAULT_LEETCODE_GRAPHQL_URL: &str = "https://leetcode.com/graphql";

/// Runtime settings read from the environment (and `.env`, when present).
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub leetcode_graphql_url: String,
    pub upstream_timeout: Duration,
    /// Consistency divisor and recent-submission sample size when analyzing
    /// a single profile.
    pub analyze_consistency_window: usize,
    /// Consistency divisor and sample size when comparing profiles.
    pub compare_consistency_window: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            leetcode_graphql_url: DEFAULT_LEETCODE_GRAPHQL_URL.to_string(),
            upstream_timeout: Duration::from_secs(10),
            analyze_consistency_window: 30,
            compare_consistency_window: 20,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parse_usize = |key: &str, default: usize| -> anyhow::Result<usize> {
            match lookup(key) {
                Some(value) => {
                    let parsed = value
                        .trim()
                        .parse::<usize>()
                        .with_context(|| format!("{key} must be a positive integer"))?;
                    anyhow::ensure!(parsed > 0, "{key} must be greater than zero");
                    Ok(parsed)
                }
                None => Ok(default),
            }
        };

        let timeout_secs = parse_usize(
            "UPSTREAM_TIMEOUT_SECS",
            defaults.upstream_timeout.as_secs() as usize,
        )?;

        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            leetcode_graphql_url: lookup("LEETCODE_GRAPHQL_URL")
                .unwrap_or(defaults.leetcode_graphql_url),
            upstream_timeout: Duration::from_secs(timeout_secs as u64),
            analyze_consistency_window: parse_usize(
                "ANALYZE_CONSISTENCY_WINDOW",
                defaults.analyze_consistency_window,
            )?,
            compare_consistency_window: parse_usize(
                "COMPARE_CONSISTENCY_WINDOW",
                defaults.compare_consistency_window,
            )?,
        })
    }

    pub fn require_database_url(&self) -> anyhow::Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL must be set to a production Postgres instance")
    }
}
