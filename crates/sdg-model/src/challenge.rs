//! Challenge records
//!
//! Immutable scenario descriptions fetched from the backend; read-only to
//! the client.

use crate::graph::NodeType;
use serde::{Deserialize, Serialize};

/// A scenario the user designs against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    /// Stable identifier, used to namespace drafts and runs
    pub slug: String,
    /// Display title
    pub title: String,
    /// Difficulty label
    pub difficulty: String,
    /// Requirement text shown to the user
    pub requirements: Vec<String>,
    /// Hint text
    #[serde(default)]
    pub hints: Vec<String>,
    /// Node types the design must include
    #[serde(default)]
    pub required_node_types: Vec<NodeType>,
    /// Node types counting toward the reliability score
    #[serde(default)]
    pub reliability_features: Vec<NodeType>,
    /// Target throughput in requests per second
    pub target_throughput: i64,
    /// Target p95 latency in milliseconds
    pub target_latency_p95_ms: i64,
    /// Monthly budget in USD
    pub budget_monthly_usd: f64,
}
