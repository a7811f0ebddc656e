//! Testing utilities for the SDG workspace
//!
//! Shared fixtures plus `FakeBackend`, an in-memory stand-in for the
//! remote evaluation service: run ids increase monotonically, listings
//! come back most recent first, and failures can be injected per
//! operation.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::Utc;
use sdg_client::{ApiClient, ApiError};
use sdg_model::{
    BestScore, Challenge, Graph, Metrics, NodeConfig, NodeType, RunRecord, RunRequest, RunResult,
    ScoreBreakdown,
};
use std::sync::Mutex;

/// A small, valid challenge fixture
pub fn sample_challenge(slug: &str) -> Challenge {
    Challenge {
        slug: slug.to_string(),
        title: format!("Challenge {slug}"),
        difficulty: "easy".to_string(),
        requirements: vec!["Serve 1k rps".to_string()],
        hints: vec![],
        required_node_types: vec![NodeType::Api, NodeType::Db],
        reliability_features: vec![NodeType::Lb, NodeType::Cache],
        target_throughput: 1000,
        target_latency_p95_ms: 120,
        budget_monthly_usd: 450.0,
    }
}

/// A graph with `n` api nodes chained by sync edges
pub fn chain_graph(n: usize) -> Graph {
    let mut graph = Graph::new();
    for i in 0..n {
        graph
            .add_node(format!("api-{i}"), NodeType::Api, NodeConfig::new())
            .unwrap();
        if i > 0 {
            graph
                .add_edge(
                    format!("api-{}", i - 1),
                    format!("api-{i}"),
                    sdg_model::EdgeMode::Sync,
                )
                .unwrap();
        }
    }
    graph
}

#[derive(Debug, Default)]
struct Injected {
    evaluate: Option<String>,
    list_runs: Option<String>,
    best_scores: Option<String>,
}

/// In-memory backend fake
///
/// Metrics and scores are a deterministic function of the submitted
/// graph and seed, so reruns with the same input produce identical
/// numbers under fresh run ids — mirroring the real simulator's
/// seed-scoped determinism.
#[derive(Debug)]
pub struct FakeBackend {
    challenges: Vec<Challenge>,
    runs: Mutex<Vec<RunRecord>>,
    next_run_id: Mutex<i64>,
    injected: Mutex<Injected>,
}

impl FakeBackend {
    pub fn new(challenges: Vec<Challenge>) -> Self {
        Self {
            challenges,
            runs: Mutex::new(Vec::new()),
            next_run_id: Mutex::new(1),
            injected: Mutex::new(Injected::default()),
        }
    }

    pub fn with_challenges(slugs: &[&str]) -> Self {
        Self::new(slugs.iter().map(|s| sample_challenge(s)).collect())
    }

    /// Fail the next `evaluate` call with this message
    pub fn fail_next_evaluate(&self, detail: &str) {
        self.injected.lock().unwrap().evaluate = Some(detail.to_string());
    }

    /// Fail the next `list_runs` call with this message
    pub fn fail_next_list_runs(&self, detail: &str) {
        self.injected.lock().unwrap().list_runs = Some(detail.to_string());
    }

    /// Fail the next `best_scores` call with this message
    pub fn fail_next_best_scores(&self, detail: &str) {
        self.injected.lock().unwrap().best_scores = Some(detail.to_string());
    }

    /// Number of runs recorded so far
    pub fn run_count(&self) -> usize {
        self.runs.lock().unwrap().len()
    }

    fn simulate(graph: &Graph, seed: i64) -> (Metrics, ScoreBreakdown) {
        let nodes = graph.node_count() as i64;
        let edges = graph.edge_count() as i64;
        let metrics = Metrics {
            throughput_rps: 800 + 120 * nodes + seed % 17,
            latency_p95_ms: 200 - 10 * nodes.min(12),
            availability_pct: (99.0 + 0.1 * nodes as f64).min(99.99),
            monthly_cost_usd: 80.0 * nodes as f64 + 15.0 * edges as f64,
        };
        let total = (40.0 + 5.0 * nodes as f64 + 2.0 * edges as f64).min(100.0);
        let score = ScoreBreakdown {
            total,
            requirements: total * 0.4,
            reliability: total * 0.25,
            performance: total * 0.2,
            cost: total * 0.15,
            explanations: vec![],
        };
        (metrics, score)
    }
}

#[async_trait]
impl ApiClient for FakeBackend {
    async fn list_challenges(&self) -> Result<Vec<Challenge>, ApiError> {
        Ok(self.challenges.clone())
    }

    async fn get_challenge(&self, slug: &str) -> Result<Challenge, ApiError> {
        self.challenges
            .iter()
            .find(|c| c.slug == slug)
            .cloned()
            .ok_or_else(|| ApiError::status(404, "Challenge not found"))
    }

    async fn evaluate(&self, request: &RunRequest) -> Result<RunResult, ApiError> {
        if let Some(detail) = self.injected.lock().unwrap().evaluate.take() {
            return Err(ApiError::status(503, detail));
        }
        if !self.challenges.iter().any(|c| c.slug == request.challenge_slug) {
            return Err(ApiError::status(404, "Challenge not found"));
        }
        if request.graph.is_empty() {
            return Err(ApiError::status(400, "Graph must include at least one node"));
        }

        let run_id = {
            let mut next = self.next_run_id.lock().unwrap();
            let id = *next;
            *next += 1;
            id
        };

        let (metrics, score) = Self::simulate(&request.graph, request.seed);
        let result = RunResult {
            run_id,
            challenge_slug: request.challenge_slug.clone(),
            seed: request.seed,
            metrics,
            score,
            created_at: Utc::now().to_rfc3339(),
        };

        // Most recent first, like the real listing.
        self.runs.lock().unwrap().insert(
            0,
            RunRecord {
                result: result.clone(),
                graph: request.graph.clone(),
            },
        );
        Ok(result)
    }

    async fn list_runs(
        &self,
        challenge_slug: Option<&str>,
        limit: usize,
    ) -> Result<Vec<RunRecord>, ApiError> {
        if let Some(detail) = self.injected.lock().unwrap().list_runs.take() {
            return Err(ApiError::status(503, detail));
        }
        Ok(self
            .runs
            .lock()
            .unwrap()
            .iter()
            .filter(|run| challenge_slug.map_or(true, |slug| run.result.challenge_slug == slug))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get_run(&self, run_id: i64) -> Result<RunRecord, ApiError> {
        self.runs
            .lock()
            .unwrap()
            .iter()
            .find(|run| run.run_id() == run_id)
            .cloned()
            .ok_or_else(|| ApiError::status(404, "Run not found"))
    }

    async fn best_scores(&self) -> Result<Vec<BestScore>, ApiError> {
        if let Some(detail) = self.injected.lock().unwrap().best_scores.take() {
            return Err(ApiError::status(503, detail));
        }
        let runs = self.runs.lock().unwrap();
        let mut best: Vec<BestScore> = Vec::new();
        for run in runs.iter() {
            match best
                .iter_mut()
                .find(|b| b.challenge_slug == run.result.challenge_slug)
            {
                Some(entry) if entry.total >= run.total() => {}
                Some(entry) => {
                    entry.total = run.total();
                    entry.run_id = run.run_id();
                    entry.updated_at = run.result.created_at.clone();
                }
                None => best.push(BestScore {
                    challenge_slug: run.result.challenge_slug.clone(),
                    total: run.total(),
                    run_id: run.run_id(),
                    updated_at: run.result.created_at.clone(),
                }),
            }
        }
        Ok(best)
    }
}
