use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use eduinsight_stats::analysis::{FeedbackAnalyzer, HeuristicAnalyzer};
use eduinsight_stats::models::{CategoryFilter, FeedbackRecord};
use eduinsight_stats::state::{Action, AppState, StatsUpdater};
use eduinsight_stats::summary::DigestSummarizer;
use eduinsight_stats::{dataset, report, InsightError, ScoringConfig};

#[derive(Parser)]
#[command(name = "eduinsight")]
#[command(about = "Teacher quality scoring and risk triage from student feedback", long_about = None)]
struct Cli {
    /// Dataset JSON file (teachers and feedback)
    #[arg(long, global = true, env = "EDUINSIGHT_DATASET", default_value = "dataset.json")]
    dataset: PathBuf,

    /// Scoring policy TOML file
    #[arg(long, global = true, env = "EDUINSIGHT_CONFIG")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the built-in dataset to the dataset path
    Seed,
    /// Import feedback rows from a CSV file into the dataset
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Rank teachers by quality score
    Score {
        #[arg(long, value_enum, default_value_t = CategoryFilter::All)]
        category: CategoryFilter,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Print full stats for one teacher as JSON
    Stats {
        #[arg(long)]
        teacher: String,
    },
    /// Submit new feedback for a teacher and print the updated stats
    Submit {
        #[arg(long)]
        teacher: String,
        #[arg(long)]
        rating: f64,
        #[arg(long)]
        comment: String,
    },
    /// Generate a markdown report
    Report {
        #[arg(long, value_enum, default_value_t = CategoryFilter::All)]
        category: CategoryFilter,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("eduinsight={level},eduinsight_stats={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the dataset, scores it and waits for every summary to merge.
async fn scored_state(cli: &Cli, config: ScoringConfig) -> anyhow::Result<StatsUpdater> {
    let data = dataset::load_or_fallback(&cli.dataset)
        .with_context(|| format!("failed to load dataset {}", cli.dataset.display()))?;
    let mut updater = StatsUpdater::new(AppState::new(config), Arc::new(DigestSummarizer));
    updater.dispatch(Action::LoadDataset(data));
    updater.drain().await;
    Ok(updater)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = ScoringConfig::load_or_default(cli.config.as_deref())
        .context("failed to load scoring config")?;
    debug!(?config, "scoring policy");

    match &cli.command {
        Commands::Seed => {
            dataset::save(&cli.dataset, &dataset::fallback_dataset())?;
            println!("Seed dataset written to {}.", cli.dataset.display());
        }
        Commands::Import { csv } => {
            let mut data = dataset::load_or_fallback(&cli.dataset)?;
            let inserted = dataset::import_csv(&mut data, csv, &HeuristicAnalyzer)
                .with_context(|| format!("failed to import {}", csv.display()))?;
            dataset::save(&cli.dataset, &data)?;
            println!("Inserted {inserted} feedback rows from {}.", csv.display());
        }
        Commands::Score { category, limit } => {
            let updater = scored_state(&cli, config).await?;
            let state = updater.state();
            let filtered = report::filter_by_category(&state.teachers, &state.stats, *category);
            let board = report::leaderboard(&state.teachers, &filtered);

            if board.is_empty() {
                println!("No teachers found for this category.");
                return Ok(());
            }

            println!("Top teachers by quality score:");
            for entry in board.iter().take(*limit) {
                println!(
                    "- {} ({}) score {:.2}, rating {:.2}, {} risk",
                    entry.name,
                    entry.teacher_id,
                    entry.quality_score,
                    entry.average_rating,
                    entry.risk_level
                );
            }
        }
        Commands::Stats { teacher } => {
            let updater = scored_state(&cli, config).await?;
            let Some(stats) = updater.state().stats_for(teacher) else {
                return Err(InsightError::UnknownTeacher(teacher.clone()).into());
            };
            println!("{}", serde_json::to_string_pretty(stats)?);
        }
        Commands::Submit {
            teacher,
            rating,
            comment,
        } => {
            if !(1.0..=10.0).contains(rating) {
                bail!("rating must be between 1 and 10, got {rating}");
            }
            let mut updater = scored_state(&cli, config).await?;
            if updater.state().teacher(teacher).is_none() {
                return Err(InsightError::UnknownTeacher(teacher.clone()).into());
            }

            let analysis = HeuristicAnalyzer.analyze(comment, *rating);
            let record = FeedbackRecord::submit(teacher, *rating, comment, analysis, Utc::now());
            info!(teacher = %teacher, id = %record.id, "feedback submitted");
            updater.dispatch(Action::SubmitFeedback(record));
            updater.drain().await;

            let state = updater.into_state();
            dataset::save(&cli.dataset, &state.dataset())?;
            if let Some(stats) = state.stats_for(teacher) {
                println!("{}", serde_json::to_string_pretty(stats)?);
            }
        }
        Commands::Report {
            category,
            limit,
            out,
        } => {
            let updater = scored_state(&cli, config).await?;
            let state = updater.state();
            let output = report::build_report(&state.teachers, &state.stats, *category, *limit);
            std::fs::write(out, output)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
