//! Run records and the compare delta
//!
//! Everything a finished evaluation hands back:
//! - Metrics bundle and weighted score breakdown
//! - Run result/record wire types (records carry the submitted graph)
//! - Per-challenge best scores
//! - Signed delta between two consecutive runs

use crate::graph::Graph;
use serde::{Deserialize, Serialize};

/// Seed the backend assumes when none was chosen
pub const DEFAULT_SEED: i64 = 42;

fn default_seed() -> i64 {
    DEFAULT_SEED
}

/// Evaluation request body for `POST /runs/evaluate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    /// Challenge being attempted
    pub challenge_slug: String,
    /// The exact current graph
    pub graph: Graph,
    /// Determinism seed, user-controlled
    #[serde(default = "default_seed")]
    pub seed: i64,
}

/// Simulated metrics for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Sustained throughput in requests per second
    pub throughput_rps: i64,
    /// p95 latency in milliseconds
    pub latency_p95_ms: i64,
    /// Availability percentage
    pub availability_pct: f64,
    /// Monthly cost in USD
    pub monthly_cost_usd: f64,
}

/// Weighted score breakdown for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Total score
    pub total: f64,
    /// Requirements sub-score
    pub requirements: f64,
    /// Reliability sub-score
    pub reliability: f64,
    /// Performance sub-score
    pub performance: f64,
    /// Cost sub-score
    pub cost: f64,
    /// Free-text explanations from the scorer
    #[serde(default)]
    pub explanations: Vec<String>,
}

/// Outcome of one evaluation
///
/// Immutable once received. `run_id` is assigned server-side and
/// increases monotonically; history listings come back most recent
/// first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Server-assigned run identifier
    pub run_id: i64,
    /// Echoed challenge slug
    pub challenge_slug: String,
    /// Echoed seed
    pub seed: i64,
    /// Simulated metrics
    pub metrics: Metrics,
    /// Score breakdown
    pub score: ScoreBreakdown,
    /// Server timestamp
    pub created_at: String,
}

/// A run result plus the graph that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// The run outcome
    #[serde(flatten)]
    pub result: RunResult,
    /// The graph submitted for this run
    pub graph: Graph,
}

impl RunRecord {
    /// Server-assigned run identifier
    #[inline]
    #[must_use]
    pub fn run_id(&self) -> i64 {
        self.result.run_id
    }

    /// Total score of this run
    #[inline]
    #[must_use]
    pub fn total(&self) -> f64 {
        self.result.score.total
    }
}

/// Per-challenge record of the highest total score observed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestScore {
    /// Challenge the score belongs to
    pub challenge_slug: String,
    /// Highest total score
    pub total: f64,
    /// Run that produced it
    pub run_id: i64,
    /// Server timestamp of the last improvement
    pub updated_at: String,
}

/// Signed differences between the most recent run and the one before it
///
/// Transient and never persisted; recomputed (or discarded) after every
/// evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunDelta {
    /// Throughput difference, unrounded
    pub throughput_rps: i64,
    /// Latency difference, unrounded
    pub latency_p95_ms: i64,
    /// Availability difference, rounded to 2 decimals
    pub availability_pct: f64,
    /// Monthly cost difference, rounded to 2 decimals
    pub monthly_cost_usd: f64,
    /// Total score difference, rounded to 2 decimals
    pub total: f64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl RunDelta {
    /// Compute `current - previous`
    ///
    /// Availability, cost, and total are rounded to 2 decimals to absorb
    /// floating-point noise from the backend; throughput and latency are
    /// integer metrics and stay exact.
    #[must_use]
    pub fn between(current: &RunRecord, previous: &RunRecord) -> Self {
        let (cur, prev) = (&current.result, &previous.result);
        Self {
            throughput_rps: cur.metrics.throughput_rps - prev.metrics.throughput_rps,
            latency_p95_ms: cur.metrics.latency_p95_ms - prev.metrics.latency_p95_ms,
            availability_pct: round2(cur.metrics.availability_pct - prev.metrics.availability_pct),
            monthly_cost_usd: round2(cur.metrics.monthly_cost_usd - prev.metrics.monthly_cost_usd),
            total: round2(cur.score.total - prev.score.total),
        }
    }
}
