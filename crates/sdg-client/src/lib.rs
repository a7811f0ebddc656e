//! SDG Client - boundary to the remote evaluation service
//!
//! Thin request/response layer over the backend contract:
//! - Challenge listings (`GET /challenges`, `GET /challenges/{slug}`)
//! - Run evaluation (`POST /runs/evaluate`)
//! - Run history and best scores (`GET /runs`, `GET /runs/{id}`,
//!   `GET /best-scores`)
//!
//! The scoring itself is owned by the backend; this crate only consumes
//! the documented shape.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod api;
pub mod error;
pub mod http;

// Re-exports for convenience
pub use api::{ApiClient, DEFAULT_RUN_LIMIT};
pub use error::ApiError;
pub use http::HttpApiClient;
