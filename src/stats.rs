use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate};

use crate::error::EngineResult;
use crate::models::{
    DailyCount, Difficulty, DifficultyBreakdown, ProgressPoint, RecentProblem, SolvedProblem,
    SolvedProblemRow, Stats, TopicCount,
};

pub const ACTIVITY_WINDOW_DAYS: i64 = 30;
pub const WEEKLY_AVERAGE_WINDOW_DAYS: i64 = 28;
pub const PROGRESS_SEGMENTS: i64 = 7;
pub const RECENT_PROBLEM_LIMIT: usize = 5;

/// Decodes every row and summarizes the result. A single malformed row fails
/// the whole request.
pub fn compute_stats(rows: &[SolvedProblemRow], today: NaiveDate) -> EngineResult<Stats> {
    let problems = rows
        .iter()
        .map(SolvedProblem::try_from)
        .collect::<EngineResult<Vec<_>>>()?;

    Ok(summarize(&problems, today))
}

pub fn summarize(problems: &[SolvedProblem], today: NaiveDate) -> Stats {
    let mut per_day: HashMap<NaiveDate, usize> = HashMap::new();
    let mut difficulty_breakdown = DifficultyBreakdown::default();
    let mut platform_breakdown: BTreeMap<String, usize> = BTreeMap::new();

    for problem in problems {
        *per_day.entry(problem.date_solved).or_insert(0) += 1;
        match problem.difficulty {
            Difficulty::Easy => difficulty_breakdown.easy += 1,
            Difficulty::Medium => difficulty_breakdown.medium += 1,
            Difficulty::Hard => difficulty_breakdown.hard += 1,
        }
        *platform_breakdown.entry(problem.platform.clone()).or_insert(0) += 1;
    }

    Stats {
        total_solved: problems.len(),
        current_streak: current_streak(&per_day, today),
        weekly_average: weekly_average(problems, today),
        difficulty_breakdown,
        platform_breakdown,
        topic_distribution: topic_distribution(problems),
        daily_activity: daily_activity(&per_day, today),
        progress_data: progress_data(problems, today),
        recent_problems: recent_problems(problems),
    }
}

/// Consecutive days ending today with at least one solve. No grace day.
pub fn current_streak(per_day: &HashMap<NaiveDate, usize>, today: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut day = Some(today);

    while let Some(current) = day {
        if per_day.get(&current).copied().unwrap_or(0) == 0 {
            break;
        }
        streak += 1;
        day = current.pred_opt();
    }

    streak
}

pub fn weekly_average(problems: &[SolvedProblem], today: NaiveDate) -> f64 {
    let window_start = today
        .checked_sub_signed(Duration::days(WEEKLY_AVERAGE_WINDOW_DAYS - 1))
        .unwrap_or(NaiveDate::MIN);
    let solved = problems
        .iter()
        .filter(|problem| problem.date_solved >= window_start && problem.date_solved <= today)
        .count();
    let weeks = (WEEKLY_AVERAGE_WINDOW_DAYS / 7) as f64;

    ((solved as f64 / weeks) * 10.0).round() / 10.0
}

/// One entry per day for the trailing window, oldest first. Days before the
/// earliest representable date are left out.
pub fn daily_activity(per_day: &HashMap<NaiveDate, usize>, today: NaiveDate) -> Vec<DailyCount> {
    (0..ACTIVITY_WINDOW_DAYS)
        .rev()
        .filter_map(|days_ago| today.checked_sub_signed(Duration::days(days_ago)))
        .map(|date| DailyCount {
            date,
            count: per_day.get(&date).copied().unwrap_or(0),
        })
        .collect()
}

/// Samples the running total roughly every `span / 7` days from the first
/// solve, then pins the last point to `today` with the full total.
pub fn progress_data(problems: &[SolvedProblem], today: NaiveDate) -> Vec<ProgressPoint> {
    let mut dates: Vec<NaiveDate> = problems.iter().map(|problem| problem.date_solved).collect();
    dates.sort();

    let Some(&earliest) = dates.first() else {
        return Vec::new();
    };

    let total_days = (today - earliest).num_days().max(0);
    let stride = Duration::days((total_days / PROGRESS_SEGMENTS).max(1));
    let mut points = Vec::new();
    let mut sample = earliest;

    while sample < today {
        points.push(ProgressPoint {
            date: sample,
            cumulative_count: dates.partition_point(|date| *date <= sample),
        });
        match sample.checked_add_signed(stride) {
            Some(next) => sample = next,
            None => break,
        }
    }

    points.push(ProgressPoint {
        date: today,
        cumulative_count: dates.len(),
    });

    points
}

pub fn topic_distribution(problems: &[SolvedProblem]) -> Vec<TopicCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for topic in problems.iter().flat_map(|problem| problem.topics.iter()) {
        *counts.entry(topic.as_str()).or_insert(0) += 1;
    }

    let mut distribution: Vec<TopicCount> = counts
        .into_iter()
        .map(|(name, count)| TopicCount {
            name: name.to_string(),
            count,
        })
        .collect();
    // Stable sort keeps the alphabetical order from the map for equal counts.
    distribution.sort_by(|a, b| b.count.cmp(&a.count));
    distribution
}

pub fn recent_problems(problems: &[SolvedProblem]) -> Vec<RecentProblem> {
    let mut recent: Vec<&SolvedProblem> = problems.iter().collect();
    recent.sort_by(|a, b| {
        b.date_solved
            .cmp(&a.date_solved)
            .then_with(|| b.id.cmp(&a.id))
    });

    recent
        .into_iter()
        .take(RECENT_PROBLEM_LIMIT)
        .map(|problem| RecentProblem {
            id: problem.id.clone(),
            title: problem.title.clone(),
            difficulty: problem.difficulty,
            platform: problem.platform.clone(),
            topics: problem.topics.iter().cloned().collect(),
            date_solved: problem.date_solved,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn problem(
        id: &str,
        difficulty: Difficulty,
        platform: &str,
        topics: &[&str],
        date_solved: NaiveDate,
    ) -> SolvedProblem {
        SolvedProblem {
            id: id.to_string(),
            title: format!("Problem {id}"),
            difficulty,
            platform: platform.to_string(),
            topics: topics.iter().map(|t| t.to_string()).collect(),
            date_solved,
        }
    }

    fn sample_problems() -> Vec<SolvedProblem> {
        vec![
            problem("1", Difficulty::Easy, "LeetCode", &["Array"], date(2024, 1, 1)),
            problem(
                "2",
                Difficulty::Medium,
                "LeetCode",
                &["Array", "Hash Table"],
                date(2024, 1, 2),
            ),
            problem("3", Difficulty::Hard, "Codeforces", &["Graph"], date(2024, 1, 2)),
        ]
    }

    #[test]
    fn scenario_with_fixed_today() {
        let stats = summarize(&sample_problems(), date(2024, 1, 2));

        assert_eq!(stats.total_solved, 3);
        assert_eq!(stats.current_streak, 2);
        assert_eq!(
            stats.difficulty_breakdown,
            DifficultyBreakdown {
                easy: 1,
                medium: 1,
                hard: 1
            }
        );
        assert_eq!(stats.platform_breakdown.get("LeetCode"), Some(&2));
        assert_eq!(stats.platform_breakdown.get("Codeforces"), Some(&1));
        assert_eq!(stats.weekly_average, 0.8);
    }

    #[test]
    fn breakdowns_sum_to_total() {
        let stats = summarize(&sample_problems(), date(2024, 2, 1));
        let breakdown = &stats.difficulty_breakdown;
        assert_eq!(
            breakdown.easy + breakdown.medium + breakdown.hard,
            stats.total_solved
        );
        assert_eq!(
            stats.platform_breakdown.values().sum::<usize>(),
            stats.total_solved
        );
    }

    #[test]
    fn streak_is_zero_without_a_solve_today() {
        let problems = vec![
            problem("1", Difficulty::Easy, "LeetCode", &[], date(2024, 1, 1)),
            problem("2", Difficulty::Easy, "LeetCode", &[], date(2024, 1, 2)),
            problem("3", Difficulty::Easy, "LeetCode", &[], date(2024, 1, 3)),
        ];
        let stats = summarize(&problems, date(2024, 1, 4));
        assert_eq!(stats.current_streak, 0);
    }

    #[test]
    fn streak_stops_at_first_gap() {
        let problems = vec![
            problem("1", Difficulty::Easy, "LeetCode", &[], date(2023, 12, 30)),
            problem("2", Difficulty::Medium, "LeetCode", &[], date(2024, 1, 1)),
            problem("3", Difficulty::Hard, "LeetCode", &[], date(2024, 1, 2)),
        ];
        let stats = summarize(&problems, date(2024, 1, 2));
        assert_eq!(stats.current_streak, 2);
    }

    #[test]
    fn weekly_average_covers_trailing_28_days() {
        let today = date(2024, 3, 1);
        let mut problems: Vec<SolvedProblem> = (0..5)
            .map(|i| {
                problem(
                    &format!("in-{i}"),
                    Difficulty::Easy,
                    "LeetCode",
                    &[],
                    today - Duration::days(i * 6),
                )
            })
            .collect();
        problems.push(problem(
            "out",
            Difficulty::Easy,
            "LeetCode",
            &[],
            today - Duration::days(28),
        ));

        // 5 solves inside the window: 5 / 4 = 1.25, rounded to one decimal.
        assert_eq!(weekly_average(&problems, today), 1.3);
    }

    #[test]
    fn daily_activity_is_dense_and_ends_today() {
        let today = date(2024, 1, 2);
        let stats = summarize(&sample_problems(), today);

        assert_eq!(stats.daily_activity.len(), 30);
        assert_eq!(stats.daily_activity.last().unwrap().date, today);
        assert_eq!(stats.daily_activity.last().unwrap().count, 2);
        assert_eq!(stats.daily_activity[0].date, date(2023, 12, 4));
        assert!(stats
            .daily_activity
            .windows(2)
            .all(|pair| pair[0].date < pair[1].date));
        assert_eq!(
            stats.daily_activity.iter().map(|d| d.count).sum::<usize>(),
            3
        );
    }

    #[test]
    fn progress_samples_are_monotonic_and_end_at_total() {
        let today = date(2024, 1, 29);
        let problems: Vec<SolvedProblem> = (0..10)
            .map(|i| {
                problem(
                    &i.to_string(),
                    Difficulty::Medium,
                    "LeetCode",
                    &[],
                    date(2024, 1, 1) + Duration::days(i * 3),
                )
            })
            .collect();

        let progress = progress_data(&problems, today);

        // 28 days at a stride of 4 gives 7 samples plus the pinned final point.
        assert_eq!(progress.len(), 8);
        assert_eq!(progress[0].date, date(2024, 1, 1));
        assert_eq!(progress[0].cumulative_count, 1);
        let last = progress.last().unwrap();
        assert_eq!(last.date, today);
        assert_eq!(last.cumulative_count, 10);
        assert!(progress
            .windows(2)
            .all(|pair| pair[0].cumulative_count <= pair[1].cumulative_count
                && pair[0].date < pair[1].date));
    }

    #[test]
    fn progress_with_first_solve_today_is_a_single_point() {
        let today = date(2024, 5, 5);
        let problems = vec![problem("1", Difficulty::Easy, "LeetCode", &[], today)];
        let progress = progress_data(&problems, today);
        assert_eq!(
            progress,
            vec![ProgressPoint {
                date: today,
                cumulative_count: 1
            }]
        );
    }

    #[test]
    fn topic_distribution_orders_by_count_then_name() {
        let stats = summarize(&sample_problems(), date(2024, 1, 2));
        let topics: Vec<(&str, usize)> = stats
            .topic_distribution
            .iter()
            .map(|t| (t.name.as_str(), t.count))
            .collect();
        assert_eq!(topics, vec![("Array", 2), ("Graph", 1), ("Hash Table", 1)]);
    }

    #[test]
    fn recent_problems_keep_five_newest() {
        let problems: Vec<SolvedProblem> = (0..8)
            .map(|i| {
                problem(
                    &format!("p{i}"),
                    Difficulty::Easy,
                    "LeetCode",
                    &["Array"],
                    date(2024, 1, 1) + Duration::days(i),
                )
            })
            .collect();

        let recent = recent_problems(&problems);
        let ids: Vec<&str> = recent.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p7", "p6", "p5", "p4", "p3"]);
        assert_eq!(recent[0].topics, vec!["Array".to_string()]);
    }

    #[test]
    fn empty_input_yields_zeroed_stats() {
        let today = date(2024, 1, 2);
        let stats = summarize(&[], today);

        assert_eq!(stats.total_solved, 0);
        assert_eq!(stats.current_streak, 0);
        assert_eq!(stats.weekly_average, 0.0);
        assert!(stats.topic_distribution.is_empty());
        assert!(stats.progress_data.is_empty());
        assert!(stats.recent_problems.is_empty());
        assert_eq!(stats.daily_activity.len(), 30);
        assert!(stats.daily_activity.iter().all(|d| d.count == 0));
    }

    #[test]
    fn future_records_count_in_totals_only() {
        let today = date(2024, 1, 10);
        let problems = vec![
            problem("1", Difficulty::Easy, "LeetCode", &[], date(2024, 1, 5)),
            problem("2", Difficulty::Hard, "LeetCode", &[], date(2024, 1, 15)),
        ];
        let stats = summarize(&problems, today);

        assert_eq!(stats.total_solved, 2);
        assert_eq!(stats.difficulty_breakdown.hard, 1);
        assert_eq!(stats.current_streak, 0);
        assert_eq!(stats.weekly_average, 0.3);
        assert_eq!(
            stats.daily_activity.iter().map(|d| d.count).sum::<usize>(),
            1
        );
        let last = stats.progress_data.last().unwrap();
        assert_eq!((last.date, last.cumulative_count), (today, 2));
        assert!(stats.progress_data.iter().all(|p| p.date <= today));
    }

    #[test]
    fn malformed_row_fails_the_request() {
        let rows = vec![
            SolvedProblemRow {
                id: "ok".to_string(),
                title: "Valid".to_string(),
                difficulty: "EASY".to_string(),
                platform: "LeetCode".to_string(),
                topics: vec![],
                date_solved: "2024-01-01".to_string(),
            },
            SolvedProblemRow {
                id: "broken".to_string(),
                title: "Broken".to_string(),
                difficulty: "EASY".to_string(),
                platform: "LeetCode".to_string(),
                topics: vec![],
                date_solved: "yesterday".to_string(),
            },
        ];

        let err = compute_stats(&rows, date(2024, 1, 2)).unwrap_err();
        assert!(matches!(err, EngineError::Validation(msg) if msg.contains("broken")));
    }

    #[test]
    fn windows_truncate_at_the_earliest_date() {
        let stats = summarize(
            &[problem("1", Difficulty::Easy, "LeetCode", &[], NaiveDate::MIN)],
            NaiveDate::MIN,
        );

        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.weekly_average, 0.3);
        assert_eq!(
            stats.daily_activity,
            vec![DailyCount {
                date: NaiveDate::MIN,
                count: 1
            }]
        );
        assert_eq!(stats.progress_data.len(), 1);

        let today = NaiveDate::MIN + Duration::days(10);
        let activity = daily_activity(&HashMap::new(), today);
        assert_eq!(activity.len(), 11);
        assert_eq!(activity[0].date, NaiveDate::MIN);
        assert_eq!(activity[10].date, today);
    }
}
