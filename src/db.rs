use anyhow::Context;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::models::{Difficulty, SolvedProblemRow};
use crate::store::{ImportRow, ProblemStore};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

struct NewProblem<'a> {
    full_name: &'a str,
    email: &'a str,
    title: &'a str,
    difficulty: Difficulty,
    platform: &'a str,
    topics: &'a [String],
    date_solved: NaiveDate,
    source_key: &'a str,
}

/// Inserts one solved problem with its topics. Returns false when the
/// `source_key` was already imported.
async fn insert_problem(pool: &PgPool, problem: &NewProblem<'_>) -> anyhow::Result<bool> {
    let mut tx = pool.begin().await?;

    let user_id: Uuid = sqlx::query(
        r#"
        INSERT INTO practice.users (id, full_name, email)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO UPDATE
        SET full_name = EXCLUDED.full_name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(problem.full_name)
    .bind(problem.email)
    .fetch_one(&mut *tx)
    .await?
    .get("id");

    let inserted = sqlx::query(
        r#"
        INSERT INTO practice.solved_problems
        (id, user_id, title, difficulty, platform, date_solved, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (source_key) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(problem.title)
    .bind(problem.difficulty.as_str())
    .bind(problem.platform)
    .bind(problem.date_solved)
    .bind(problem.source_key)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(row) = inserted else {
        tx.rollback().await?;
        return Ok(false);
    };
    let problem_id: Uuid = row.get("id");

    for topic in problem.topics {
        let topic_id: i32 = sqlx::query(
            r#"
            INSERT INTO practice.topics (name)
            VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(topic)
        .fetch_one(&mut *tx)
        .await?
        .get("id");

        sqlx::query(
            "INSERT INTO practice.problem_topics (problem_id, topic_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(problem_id)
        .bind(topic_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(true)
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<usize> {
    let today = Utc::now().date_naive();
    let problems = vec![
        (
            "Avery Lee",
            "avery.lee@example.com",
            "Two Sum",
            Difficulty::Easy,
            "LeetCode",
            "Array;Hash Table",
            0,
            "seed-001",
        ),
        (
            "Avery Lee",
            "avery.lee@example.com",
            "Course Schedule",
            Difficulty::Medium,
            "LeetCode",
            "Graph;Topological Sort",
            1,
            "seed-002",
        ),
        (
            "Avery Lee",
            "avery.lee@example.com",
            "Median of Two Sorted Arrays",
            Difficulty::Hard,
            "LeetCode",
            "Array;Binary Search",
            2,
            "seed-003",
        ),
        (
            "Avery Lee",
            "avery.lee@example.com",
            "Watermelon",
            Difficulty::Easy,
            "Codeforces",
            "Math",
            5,
            "seed-004",
        ),
        (
            "Avery Lee",
            "avery.lee@example.com",
            "Coin Change",
            Difficulty::Medium,
            "LeetCode",
            "Dynamic Programming",
            12,
            "seed-005",
        ),
        (
            "Avery Lee",
            "avery.lee@example.com",
            "Longest Increasing Subsequence",
            Difficulty::Medium,
            "HackerRank",
            "Dynamic Programming;Binary Search",
            40,
            "seed-006",
        ),
        (
            "Jules Moreno",
            "jules.moreno@example.com",
            "Valid Parentheses",
            Difficulty::Easy,
            "LeetCode",
            "Stack;String",
            3,
            "seed-007",
        ),
        (
            "Jules Moreno",
            "jules.moreno@example.com",
            "Word Ladder",
            Difficulty::Hard,
            "LeetCode",
            "Graph;Breadth-First Search",
            9,
            "seed-008",
        ),
    ];

    let mut inserted = 0usize;
    for (full_name, email, title, difficulty, platform, topics, days_ago, source_key) in problems {
        let topics: Vec<String> = topics.split(';').map(str::to_string).collect();
        let created = insert_problem(
            pool,
            &NewProblem {
                full_name,
                email,
                title,
                difficulty,
                platform,
                topics: &topics,
                date_solved: today - Duration::days(days_ago),
                source_key,
            },
        )
        .await?;
        if created {
            inserted += 1;
        }
    }

    Ok(inserted)
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for (index, result) in reader.deserialize::<ImportRow>().enumerate() {
        let line = index + 2;
        let row = result.with_context(|| format!("malformed CSV record on line {line}"))?;
        let difficulty = row
            .difficulty
            .parse::<Difficulty>()
            .with_context(|| format!("line {line}"))?;
        let date_solved = NaiveDate::parse_from_str(row.date_solved.trim(), "%Y-%m-%d")
            .with_context(|| format!("line {line}: invalid date_solved '{}'", row.date_solved))?;
        let source_key = row
            .source_key
            .clone()
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));
        let topics = row.topic_list();

        let created = insert_problem(
            pool,
            &NewProblem {
                full_name: &row.full_name,
                email: &row.email,
                title: &row.title,
                difficulty,
                platform: row.platform.trim(),
                topics: &topics,
                date_solved,
                source_key: &source_key,
            },
        )
        .await?;

        if created {
            inserted += 1;
        }
    }

    info!(inserted, path = %csv_path.display(), "CSV import finished");
    Ok(inserted)
}

/// Postgres-backed record store.
pub struct PgProblemStore {
    pool: PgPool,
}

impl PgProblemStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProblemStore for PgProblemStore {
    async fn list_solved_problems(
        &self,
        user_email: &str,
    ) -> anyhow::Result<Vec<SolvedProblemRow>> {
        let records = sqlx::query(
            r#"
            SELECT p.id::text AS id, p.title, p.difficulty, p.platform,
                   to_char(p.date_solved, 'YYYY-MM-DD') AS date_solved,
                   COALESCE(
                       array_agg(t.name ORDER BY t.name) FILTER (WHERE t.name IS NOT NULL),
                       '{}'::text[]
                   ) AS topics
            FROM practice.solved_problems p
            JOIN practice.users u ON u.id = p.user_id
            LEFT JOIN practice.problem_topics pt ON pt.problem_id = p.id
            LEFT JOIN practice.topics t ON t.id = pt.topic_id
            WHERE lower(u.email) = lower($1)
            GROUP BY p.id
            ORDER BY p.date_solved
            "#,
        )
        .bind(user_email)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("failed to load solved problems for {user_email}"))?;

        let mut rows = Vec::with_capacity(records.len());
        for row in records {
            rows.push(SolvedProblemRow {
                id: row.get("id"),
                title: row.get("title"),
                difficulty: row.get("difficulty"),
                platform: row.get("platform"),
                topics: row.get("topics"),
                date_solved: row.get("date_solved"),
            });
        }

        Ok(rows)
    }
}
