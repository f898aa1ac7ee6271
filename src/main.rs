use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod compare;
mod config;
mod db;
mod error;
mod leetcode;
mod models;
mod report;
mod scoring;
mod stats;
mod store;

use config::AppConfig;
use leetcode::LeetCodeClient;
use scoring::ScoringConfig;
use store::{CsvProblemStore, ProblemStore};

#[derive(Parser)]
#[command(name = "practice-insights")]
#[command(about = "Solved-problem statistics and LeetCode profile scoring", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import solved problems from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Show practice statistics for a user
    Stats {
        #[arg(long)]
        email: String,
        /// Read records from a CSV export instead of the database
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Evaluate as of this date (YYYY-MM-DD); defaults to today (UTC)
        #[arg(long)]
        today: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown practice report
    Report {
        #[arg(long)]
        email: String,
        #[arg(long)]
        csv: Option<PathBuf>,
        #[arg(long)]
        today: Option<NaiveDate>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Score a LeetCode profile
    Analyze {
        username: String,
        /// Consistency window; overrides ANALYZE_CONSISTENCY_WINDOW
        #[arg(long)]
        window: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Compare two or more LeetCode profiles
    Compare {
        #[arg(required = true, num_args = 2..)]
        usernames: Vec<String>,
        /// Consistency window; overrides COMPARE_CONSISTENCY_WINDOW
        #[arg(long)]
        window: Option<usize>,
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("practice_insights=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    match cli.command {
        Commands::InitDb => {
            let pool = connect(&config).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect(&config).await?;
            let inserted = db::seed(&pool).await?;
            println!("Seed data inserted ({inserted} new problems).");
        }
        Commands::Import { csv } => {
            let pool = connect(&config).await?;
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} solved problems from {}.", csv.display());
        }
        Commands::Stats {
            email,
            csv,
            today,
            json,
        } => {
            let today = today.unwrap_or_else(|| Utc::now().date_naive());
            let store = open_store(&config, csv.as_deref()).await?;
            let stats = store::user_stats(store.as_ref(), &email, today).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print!("{}", report::build_report(&email, today, &stats));
            }
        }
        Commands::Report {
            email,
            csv,
            today,
            out,
        } => {
            let today = today.unwrap_or_else(|| Utc::now().date_naive());
            let store = open_store(&config, csv.as_deref()).await?;
            let stats = store::user_stats(store.as_ref(), &email, today).await?;
            std::fs::write(&out, report::build_report(&email, today, &stats))
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Analyze {
            username,
            window,
            json,
        } => {
            let client = profile_client(&config)?;
            let scoring =
                ScoringConfig::with_window(window.unwrap_or(config.analyze_consistency_window));
            let score = compare::analyze_profile(&client, &username, &scoring)
                .await
                .map_err(|err| {
                    warn!(
                        username = %username,
                        status = err.status_code(),
                        "profile analysis failed"
                    );
                    err
                })?;

            if json {
                println!("{}", serde_json::to_string_pretty(&score)?);
            } else {
                print!("{}", report::render_profile(&score));
            }
        }
        Commands::Compare {
            usernames,
            window,
            json,
        } => {
            let client = profile_client(&config)?;
            let scoring =
                ScoringConfig::with_window(window.unwrap_or(config.compare_consistency_window));
            let result = compare::compare_profiles(&client, &usernames, &scoring)
                .await
                .map_err(|err| {
                    warn!(status = err.status_code(), "profile comparison failed");
                    err
                })?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", report::render_comparison(&result));
            }
        }
    }

    Ok(())
}

async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let database_url = config.require_database_url()?;
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")
}

async fn open_store(
    config: &AppConfig,
    csv: Option<&Path>,
) -> anyhow::Result<Box<dyn ProblemStore>> {
    match csv {
        Some(path) => {
            info!(path = %path.display(), "reading solved problems from CSV");
            Ok(Box::new(CsvProblemStore::from_path(path)?))
        }
        None => Ok(Box::new(db::PgProblemStore::new(connect(config).await?))),
    }
}

fn profile_client(config: &AppConfig) -> anyhow::Result<LeetCodeClient> {
    LeetCodeClient::new(&config.leetcode_graphql_url, config.upstream_timeout)
}
