//! reqwest-backed implementation of the backend contract

use crate::api::ApiClient;
use crate::error::ApiError;
use async_trait::async_trait;
use sdg_model::{BestScore, Challenge, RunRecord, RunRequest, RunResult};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Error body shape the backend uses for non-success responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// HTTP client for the evaluation service
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpApiClient {
    /// Create a client against `base_url` (no trailing slash)
    ///
    /// # Errors
    /// `ApiError::Transport` when the underlying client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Base URL this client talks to
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Decode a response, mapping non-success statuses to `ApiError::Status`
    ///
    /// The backend's `detail` string is surfaced verbatim when present.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let detail = serde_json::from_slice::<ErrorBody>(&bytes)
                .ok()
                .and_then(|body| body.detail)
                .unwrap_or_else(|| {
                    format!(
                        "{} {}",
                        status.as_u16(),
                        status.canonical_reason().unwrap_or("request failed")
                    )
                });
            return Err(ApiError::status(status.as_u16(), detail));
        }

        serde_json::from_slice(&bytes).map_err(|err| ApiError::Decode(err.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        tracing::debug!(path, "GET");
        let response = self.client.get(self.url(path)).query(query).send().await?;
        Self::decode(response).await
    }
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn list_challenges(&self) -> Result<Vec<Challenge>, ApiError> {
        self.get_json("/challenges", &[]).await
    }

    async fn get_challenge(&self, slug: &str) -> Result<Challenge, ApiError> {
        self.get_json(&format!("/challenges/{slug}"), &[]).await
    }

    async fn evaluate(&self, request: &RunRequest) -> Result<RunResult, ApiError> {
        tracing::debug!(challenge = %request.challenge_slug, seed = request.seed, "POST /runs/evaluate");
        let response = self
            .client
            .post(self.url("/runs/evaluate"))
            .json(request)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn list_runs(
        &self,
        challenge_slug: Option<&str>,
        limit: usize,
    ) -> Result<Vec<RunRecord>, ApiError> {
        let mut query = vec![("limit", limit.to_string())];
        if let Some(slug) = challenge_slug {
            query.push(("challenge_slug", slug.to_string()));
        }
        self.get_json("/runs", &query).await
    }

    async fn get_run(&self, run_id: i64) -> Result<RunRecord, ApiError> {
        self.get_json(&format!("/runs/{run_id}"), &[]).await
    }

    async fn best_scores(&self) -> Result<Vec<BestScore>, ApiError> {
        self.get_json("/best-scores", &[]).await
    }
}
