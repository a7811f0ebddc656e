//! Command-line client for the system-design sandbox
//!
//! Rendering glue over the session library: list challenges, submit a
//! graph for evaluation, browse history and best scores.

use anyhow::Context;
use clap::{Parser, Subcommand};
use sdg_client::{ApiClient, HttpApiClient, DEFAULT_RUN_LIMIT};
use sdg_model::Graph;
use sdg_session::{HistoryScope, Session};
use sdg_store::DraftStore;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "sdg", version, about = "System-design sandbox client")]
struct Cli {
    /// Backend base URL
    #[arg(long, global = true, default_value = "http://127.0.0.1:8000")]
    api_url: String,

    /// Directory for locally persisted drafts and seeds
    #[arg(long, global = true, default_value = ".sdg")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List available challenges
    Challenges,
    /// Show one challenge in detail
    Show {
        /// Challenge slug
        slug: String,
    },
    /// Evaluate a graph against a challenge
    Run {
        /// Challenge slug
        slug: String,
        /// Graph JSON file; omitted, the locally saved draft is used
        #[arg(long)]
        graph: Option<PathBuf>,
        /// Determinism seed; omitted, the last-used seed is kept
        #[arg(long)]
        seed: Option<i64>,
    },
    /// Show run history, most recent first
    History {
        /// Restrict to one challenge
        #[arg(long, conflicts_with = "all")]
        challenge: Option<String>,
        /// Show runs across all challenges
        #[arg(long)]
        all: bool,
        /// Maximum entries
        #[arg(long, default_value_t = DEFAULT_RUN_LIMIT)]
        limit: usize,
    },
    /// Show per-challenge best scores
    Best,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let api = HttpApiClient::new(&cli.api_url)?;

    match cli.command {
        Command::Challenges => {
            for challenge in api.list_challenges().await? {
                println!(
                    "{:<24} [{}] {}",
                    challenge.slug, challenge.difficulty, challenge.title
                );
            }
        }
        Command::Show { slug } => {
            let challenge = api.get_challenge(&slug).await?;
            println!("{} ({})", challenge.title, challenge.difficulty);
            println!(
                "targets: {} rps, p95 {} ms, budget ${:.2}/mo",
                challenge.target_throughput,
                challenge.target_latency_p95_ms,
                challenge.budget_monthly_usd
            );
            for requirement in &challenge.requirements {
                println!("  - {requirement}");
            }
            for hint in &challenge.hints {
                println!("  hint: {hint}");
            }
        }
        Command::Run { slug, graph, seed } => {
            let mut session = Session::new(api, DraftStore::new(&cli.data_dir));
            session.select_challenge(&slug).await?;

            if let Some(path) = graph {
                let bytes = std::fs::read(&path)
                    .with_context(|| format!("reading graph file {}", path.display()))?;
                let graph: Graph = serde_json::from_slice(&bytes)
                    .with_context(|| format!("parsing graph file {}", path.display()))?;
                session.replace_graph(graph).await?;
            }
            if let Some(seed) = seed {
                session.set_seed(seed).await?;
            }

            let result = session.run_evaluation().await?;
            println!("run #{} (seed {})", result.run_id, result.seed);
            println!(
                "  {} rps, p95 {} ms, {:.2}% available, ${:.2}/mo",
                result.metrics.throughput_rps,
                result.metrics.latency_p95_ms,
                result.metrics.availability_pct,
                result.metrics.monthly_cost_usd
            );
            println!("  score {:.2}", result.score.total);
            for explanation in &result.score.explanations {
                println!("    {explanation}");
            }
            if let Some(delta) = session.delta() {
                println!(
                    "  vs previous: {:+} rps, {:+} ms p95, {:+.2}% avail, {:+.2} $/mo, {:+.2} total",
                    delta.throughput_rps,
                    delta.latency_p95_ms,
                    delta.availability_pct,
                    delta.monthly_cost_usd,
                    delta.total
                );
            }
        }
        Command::History {
            challenge,
            all,
            limit,
        } => {
            let mut session =
                Session::new(api, DraftStore::new(&cli.data_dir)).with_history_limit(limit);
            if all {
                session.set_history_scope(HistoryScope::AllChallenges).await?;
            } else if let Some(slug) = challenge {
                session.select_challenge(&slug).await?;
            } else {
                session.set_history_scope(HistoryScope::AllChallenges).await?;
            }
            for record in session.history() {
                println!(
                    "#{:<5} {:<24} seed {:<6} score {:.2}",
                    record.run_id(),
                    record.result.challenge_slug,
                    record.result.seed,
                    record.total()
                );
            }
        }
        Command::Best => {
            for best in api.best_scores().await? {
                println!(
                    "{:<24} {:.2} (run #{})",
                    best.challenge_slug, best.total, best.run_id
                );
            }
        }
    }

    Ok(())
}
