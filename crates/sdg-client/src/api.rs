//! The consumed backend contract

use crate::error::ApiError;
use async_trait::async_trait;
use sdg_model::{BestScore, Challenge, RunRecord, RunRequest, RunResult};

/// Default history page size (the backend's own default; it caps at 100)
pub const DEFAULT_RUN_LIMIT: usize = 20;

/// Remote evaluation service contract
///
/// Implemented by [`crate::HttpApiClient`] for the real backend and by
/// in-memory fakes for orchestration tests.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// List all challenges
    async fn list_challenges(&self) -> Result<Vec<Challenge>, ApiError>;

    /// Fetch a single challenge by slug
    async fn get_challenge(&self, slug: &str) -> Result<Challenge, ApiError>;

    /// Submit a graph for evaluation; the backend assigns the run id
    async fn evaluate(&self, request: &RunRequest) -> Result<RunResult, ApiError>;

    /// List run records, most recent first
    ///
    /// `challenge_slug` scopes the listing to one challenge; `None`
    /// returns runs across all challenges.
    async fn list_runs(
        &self,
        challenge_slug: Option<&str>,
        limit: usize,
    ) -> Result<Vec<RunRecord>, ApiError>;

    /// Fetch a single run record by id
    async fn get_run(&self, run_id: i64) -> Result<RunRecord, ApiError>;

    /// Per-challenge best total scores
    async fn best_scores(&self) -> Result<Vec<BestScore>, ApiError>;
}
