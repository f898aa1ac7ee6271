use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{ComparisonResult, ProfileScore, Stats};

pub fn build_report(user: &str, today: NaiveDate, stats: &Stats) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Practice Report");
    let _ = writeln!(output, "Generated for {} as of {}", user, today);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");
    let _ = writeln!(output, "- Total solved: {}", stats.total_solved);
    let _ = writeln!(output, "- Current streak: {} days", stats.current_streak);
    let _ = writeln!(output, "- Weekly average (last 4 weeks): {:.1}", stats.weekly_average);
    let _ = writeln!(
        output,
        "- Difficulty: {} easy / {} medium / {} hard",
        stats.difficulty_breakdown.easy,
        stats.difficulty_breakdown.medium,
        stats.difficulty_breakdown.hard
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Platforms");
    if stats.platform_breakdown.is_empty() {
        let _ = writeln!(output, "No problems recorded yet.");
    } else {
        for (platform, count) in &stats.platform_breakdown {
            let _ = writeln!(output, "- {}: {}", platform, count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Topics");
    if stats.topic_distribution.is_empty() {
        let _ = writeln!(output, "No topics recorded yet.");
    } else {
        for topic in stats.topic_distribution.iter().take(10) {
            let _ = writeln!(output, "- {}: {}", topic.name, topic.count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Last 30 Days");
    let active_days = stats.daily_activity.iter().filter(|day| day.count > 0).count();
    let _ = writeln!(
        output,
        "Active on {} of {} days.",
        active_days,
        stats.daily_activity.len()
    );
    for day in stats.daily_activity.iter().filter(|day| day.count > 0) {
        let _ = writeln!(output, "- {}: {}", day.date, day.count);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Progress");
    if stats.progress_data.is_empty() {
        let _ = writeln!(output, "No progress to chart yet.");
    } else {
        for point in &stats.progress_data {
            let _ = writeln!(output, "- {}: {}", point.date, point.cumulative_count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recently Solved");
    if stats.recent_problems.is_empty() {
        let _ = writeln!(output, "No problems recorded yet.");
    } else {
        for problem in &stats.recent_problems {
            let topics = if problem.topics.is_empty() {
                "no topics".to_string()
            } else {
                problem.topics.join(", ")
            };
            let _ = writeln!(
                output,
                "- {} ({}, {}) on {}: {}",
                problem.title, problem.difficulty, problem.platform, problem.date_solved, topics
            );
        }
    }

    output
}

pub fn render_profile(score: &ProfileScore) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "{}: score {}/100", score.username, score.total_score);
    let _ = writeln!(
        output,
        "  volume {} + difficulty {} + consistency {} + speed {}",
        score.breakdown.volume,
        score.breakdown.difficulty,
        score.breakdown.consistency,
        score.breakdown.speed
    );
    let _ = writeln!(
        output,
        "  solved {} ({} easy, {} medium, {} hard), ranking {}",
        score.total_problems, score.easy_count, score.medium_count, score.hard_count, score.ranking
    );
    let _ = writeln!(
        output,
        "  consistency {}%, solving speed {}%",
        score.consistency, score.problem_solving_speed
    );
    let _ = writeln!(output, "  strong topics: {}", list_or_none(&score.strong_topics));
    let _ = writeln!(output, "  weak topics: {}", list_or_none(&score.weak_topics));
    let _ = writeln!(output, "  recommendations:");
    for recommendation in &score.recommendations {
        let _ = writeln!(output, "  - {}", recommendation);
    }

    output
}

pub fn render_comparison(result: &ComparisonResult) -> String {
    let mut ranked: Vec<&ProfileScore> = result.profiles.iter().collect();
    ranked.sort_by(|a, b| b.total_score.cmp(&a.total_score));

    let mut output = String::new();
    let _ = writeln!(output, "Comparison of {} profiles", ranked.len());
    for (place, score) in ranked.iter().enumerate() {
        let _ = writeln!(
            output,
            "{}. {} score {} (consistency {}%, {} hard of {})",
            place + 1,
            score.username,
            score.total_score,
            score.consistency,
            score.hard_count,
            score.total_problems
        );
    }
    let common: Vec<String> = result.common_topics.iter().cloned().collect();
    let _ = writeln!(output, "Common strong topics: {}", list_or_none(&common));
    let _ = writeln!(output);
    let _ = writeln!(output, "{}", result.analysis);

    output
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}
