//! SDG Session - graph authoring and run orchestration
//!
//! The client's state machine:
//! - Owns the selected challenge, draft graph, and seed
//! - Persists the draft on every mutation
//! - Drives evaluations and reconciles history, best scores, and the
//!   compare delta afterwards
//! - Keeps the history list consistent with its scope
//!
//! # Example
//!
//! ```rust,ignore
//! use sdg_client::HttpApiClient;
//! use sdg_session::Session;
//! use sdg_store::DraftStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let api = HttpApiClient::new("http://127.0.0.1:8000")?;
//! let store = DraftStore::new(".sdg");
//! let mut session = Session::new(api, store);
//!
//! session.select_challenge("url-shortener").await?;
//! session.add_node("api-1", sdg_model::NodeType::Api, Default::default()).await?;
//! let result = session.run_evaluation().await?;
//!
//! println!("run {} scored {}", result.run_id, result.score.total);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod session;

// Re-exports for convenience
pub use error::SessionError;
pub use session::{HistoryScope, RunState, Session};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with an SDG session
    pub use crate::{HistoryScope, RunState, Session, SessionError};
    pub use sdg_client::{ApiClient, HttpApiClient};
    pub use sdg_model::{EdgeMode, Graph, NodeConfig, NodeType};
    pub use sdg_store::DraftStore;
}
