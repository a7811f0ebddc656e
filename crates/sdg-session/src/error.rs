//! Session error types
//!
//! Three recovery classes:
//! - Validation variants: local, pre-network, rejected inline
//! - `Api`: one user-visible message per failed remote operation
//! - Store read failures never appear here; they fall back to defaults

use sdg_client::ApiError;
use sdg_model::GraphError;

/// Session-level errors
///
/// None are fatal; the session survives every variant and the user may
/// retry.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No challenge selected yet
    #[error("select a challenge first")]
    NoChallengeSelected,

    /// Graph has no nodes
    #[error("add at least one node before running")]
    EmptyGraph,

    /// An evaluation is already in flight
    #[error("an evaluation is already in progress")]
    EvaluationInProgress,

    /// Graph mutation rejected
    #[error("{0}")]
    Graph(#[from] GraphError),

    /// Remote call failed; the message is user-facing as-is
    #[error("{0}")]
    Api(#[from] ApiError),
}

impl SessionError {
    /// True for local validation failures that never touched the network
    #[inline]
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NoChallengeSelected | Self::EmptyGraph | Self::EvaluationInProgress | Self::Graph(_)
        )
    }
}
