//! SDG Model - Graph model and wire types
//!
//! The pure-data heart of the client:
//! - Node/edge graph structure with mutation and validation rules
//! - Challenge, run, and score records exchanged with the backend
//! - Compare-delta computation between consecutive runs
//!
//! No I/O lives here; everything is plain data plus validation.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod challenge;
pub mod graph;
pub mod run;

// Re-exports for convenience
pub use challenge::Challenge;
pub use graph::{
    ConfigValue, Edge, EdgeMode, Graph, GraphError, Node, NodeConfig, NodeType,
};
pub use run::{
    BestScore, Metrics, RunDelta, RunRecord, RunRequest, RunResult, ScoreBreakdown, DEFAULT_SEED,
};
