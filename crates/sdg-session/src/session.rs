//! The editing session and run orchestrator
//!
//! One explicit aggregate owns all mutable client state: the selected
//! challenge, the draft graph and seed, the run state machine, the
//! history list and its scope, best scores, the loaded-run pointer, and
//! the pending compare delta. Orchestration logic lives here so it is
//! testable without any rendering surface.

use crate::error::SessionError;
use sdg_client::{ApiClient, DEFAULT_RUN_LIMIT};
use sdg_model::{
    BestScore, Challenge, EdgeMode, Graph, NodeConfig, NodeType, RunDelta, RunRecord, RunRequest,
    RunResult, DEFAULT_SEED,
};
use sdg_store::DraftStore;

/// Run state machine
///
/// `Running` only spans the evaluation round-trip plus its dependent
/// history/score refresh; success and failure both land back on `Idle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunState {
    /// No evaluation in flight
    #[default]
    Idle,
    /// Evaluation request outstanding
    Running,
}

/// Which runs the history list shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HistoryScope {
    /// Only the selected challenge's runs
    #[default]
    SelectedChallenge,
    /// Runs across all challenges
    AllChallenges,
}

/// Delta against the immediately preceding run
///
/// Produced only when the refreshed history's top entry is the run just
/// completed and a previous run exists underneath it; any other shape
/// (stale read, out-of-scope listing, first run ever) yields `None`
/// rather than a misleading comparison.
fn delta_for(history: &[RunRecord], run_id: i64) -> Option<RunDelta> {
    match history {
        [current, previous, ..] if current.run_id() == run_id => {
            Some(RunDelta::between(current, previous))
        }
        _ => None,
    }
}

/// The editing session for one user
#[derive(Debug)]
pub struct Session<C: ApiClient> {
    api: C,
    store: DraftStore,
    history_limit: usize,
    challenge: Option<Challenge>,
    graph: Graph,
    seed: i64,
    run_state: RunState,
    scope: HistoryScope,
    history: Vec<RunRecord>,
    best_scores: Vec<BestScore>,
    loaded_run_id: Option<i64>,
    delta: Option<RunDelta>,
}

impl<C: ApiClient> Session<C> {
    /// Create a session over a backend client and a draft store
    #[inline]
    #[must_use]
    pub fn new(api: C, store: DraftStore) -> Self {
        Self {
            api,
            store,
            history_limit: DEFAULT_RUN_LIMIT,
            challenge: None,
            graph: Graph::new(),
            seed: DEFAULT_SEED,
            run_state: RunState::Idle,
            scope: HistoryScope::default(),
            history: Vec::new(),
            best_scores: Vec::new(),
            loaded_run_id: None,
            delta: None,
        }
    }

    /// With a history page size other than the backend default
    #[inline]
    #[must_use]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Backend client
    #[inline]
    #[must_use]
    pub fn api(&self) -> &C {
        &self.api
    }

    /// Selected challenge, if any
    #[inline]
    #[must_use]
    pub fn challenge(&self) -> Option<&Challenge> {
        self.challenge.as_ref()
    }

    /// Current draft graph
    #[inline]
    #[must_use]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Current seed
    #[inline]
    #[must_use]
    pub fn seed(&self) -> i64 {
        self.seed
    }

    /// Run state
    #[inline]
    #[must_use]
    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Active history scope
    #[inline]
    #[must_use]
    pub fn scope(&self) -> HistoryScope {
        self.scope
    }

    /// Displayed history, most recent first
    #[inline]
    #[must_use]
    pub fn history(&self) -> &[RunRecord] {
        &self.history
    }

    /// Per-challenge best scores
    #[inline]
    #[must_use]
    pub fn best_scores(&self) -> &[BestScore] {
        &self.best_scores
    }

    /// Identifier of the currently loaded run, if any
    ///
    /// Tracked independently of scope; used to annotate the matching
    /// history row when it is still present after a re-fetch.
    #[inline]
    #[must_use]
    pub fn loaded_run_id(&self) -> Option<i64> {
        self.loaded_run_id
    }

    /// Delta against the previous run, when one applies
    #[inline]
    #[must_use]
    pub fn delta(&self) -> Option<&RunDelta> {
        self.delta.as_ref()
    }

    /// Select the active challenge
    ///
    /// Restores that challenge's last-saved draft graph and seed
    /// (defaulting to an empty graph and seed 42), clears the loaded-run
    /// pointer and delta, and refreshes the history list for the current
    /// scope. The previous list is cleared up front so a failed re-fetch
    /// never leaves another challenge's rows visible.
    pub async fn select_challenge(&mut self, slug: &str) -> Result<(), SessionError> {
        if self.run_state == RunState::Running {
            return Err(SessionError::EvaluationInProgress);
        }

        let challenge = self.api.get_challenge(slug).await?;
        tracing::info!(slug, "selected challenge");

        self.graph = self.store.load_draft_graph(slug).await.unwrap_or_default();
        self.seed = self
            .store
            .load_last_seed(slug)
            .await
            .unwrap_or(DEFAULT_SEED);
        self.challenge = Some(challenge);
        self.loaded_run_id = None;
        self.delta = None;
        self.history.clear();

        self.refresh_history().await
    }

    /// Add a node to the draft, then persist
    pub async fn add_node(
        &mut self,
        id: impl Into<String>,
        node_type: NodeType,
        config: NodeConfig,
    ) -> Result<(), SessionError> {
        self.require_challenge()?;
        self.graph.add_node(id, node_type, config)?;
        self.persist_draft().await;
        Ok(())
    }

    /// Remove a node (and its edges) from the draft, then persist
    pub async fn remove_node(&mut self, id: &str) -> Result<(), SessionError> {
        self.require_challenge()?;
        self.graph.remove_node(id)?;
        self.persist_draft().await;
        Ok(())
    }

    /// Add an edge to the draft, then persist
    pub async fn add_edge(
        &mut self,
        source: impl Into<String>,
        target: impl Into<String>,
        mode: EdgeMode,
    ) -> Result<(), SessionError> {
        self.require_challenge()?;
        self.graph.add_edge(source, target, mode)?;
        self.persist_draft().await;
        Ok(())
    }

    /// Remove an edge by position, then persist
    pub async fn remove_edge(&mut self, index: usize) -> Result<(), SessionError> {
        self.require_challenge()?;
        self.graph.remove_edge(index)?;
        self.persist_draft().await;
        Ok(())
    }

    /// Replace the draft wholesale, then persist
    ///
    /// Used when importing a graph from outside the editor; the incoming
    /// graph is re-validated since the per-mutation checks never ran on
    /// it.
    pub async fn replace_graph(&mut self, graph: Graph) -> Result<(), SessionError> {
        self.require_challenge()?;
        graph.validate()?;
        self.graph = graph;
        self.persist_draft().await;
        Ok(())
    }

    /// Set the evaluation seed, then persist
    ///
    /// The seed is user-controlled and never mutated by the orchestrator,
    /// so deliberate same-seed reruns stay possible.
    pub async fn set_seed(&mut self, seed: i64) -> Result<(), SessionError> {
        self.require_challenge()?;
        self.seed = seed;
        self.persist_seed().await;
        Ok(())
    }

    /// Run one evaluation
    ///
    /// Preconditions fail fast with no network interaction. On success
    /// the history and best-score listings are refreshed concurrently
    /// and committed together, the new run becomes the loaded run, and
    /// the compare delta is recomputed. On any failure the session drops
    /// back to `Idle` with history, scores, loaded-run pointer, and
    /// delta untouched.
    pub async fn run_evaluation(&mut self) -> Result<RunResult, SessionError> {
        let slug = self
            .challenge
            .as_ref()
            .map(|c| c.slug.clone())
            .ok_or(SessionError::NoChallengeSelected)?;
        if self.graph.is_empty() {
            return Err(SessionError::EmptyGraph);
        }
        if self.run_state == RunState::Running {
            return Err(SessionError::EvaluationInProgress);
        }

        self.run_state = RunState::Running;
        tracing::info!(slug, seed = self.seed, "evaluating run");

        let request = RunRequest {
            challenge_slug: slug,
            graph: self.graph.clone(),
            seed: self.seed,
        };
        let outcome = self.evaluate_and_refresh(&request).await;
        self.run_state = RunState::Idle;

        match outcome {
            Ok((result, history, best_scores)) => {
                self.history = history;
                self.best_scores = best_scores;
                self.loaded_run_id = Some(result.run_id);
                self.delta = delta_for(&self.history, result.run_id);
                tracing::info!(
                    run_id = result.run_id,
                    total = result.score.total,
                    "run completed"
                );
                Ok(result)
            }
            Err(err) => {
                tracing::warn!(%err, "run failed");
                Err(err)
            }
        }
    }

    /// Load a historical run into the editor
    ///
    /// Replaces the live graph and seed with the record's, persists
    /// both, marks the run as loaded, and clears the delta (a manually
    /// loaded run has no "previous run" context). Does not re-evaluate.
    /// A record outside the current history is fetched by id; when it
    /// belongs to a different challenge, that challenge becomes the
    /// selected one.
    pub async fn load_run(&mut self, run_id: i64) -> Result<(), SessionError> {
        if self.run_state == RunState::Running {
            return Err(SessionError::EvaluationInProgress);
        }

        let record = match self.history.iter().find(|r| r.run_id() == run_id) {
            Some(record) => record.clone(),
            None => self.api.get_run(run_id).await?,
        };

        let switched = self
            .challenge
            .as_ref()
            .map_or(true, |c| c.slug != record.result.challenge_slug);
        if switched {
            self.challenge = Some(self.api.get_challenge(&record.result.challenge_slug).await?);
        }

        self.graph = record.graph;
        self.seed = record.result.seed;
        self.loaded_run_id = Some(run_id);
        self.delta = None;
        self.persist_draft().await;
        self.persist_seed().await;
        tracing::info!(run_id, "loaded historical run");

        if switched {
            self.history.clear();
            self.refresh_history().await?;
        }
        Ok(())
    }

    /// Switch the history scope and replace the displayed list
    pub async fn set_history_scope(&mut self, scope: HistoryScope) -> Result<(), SessionError> {
        self.scope = scope;
        self.history.clear();
        self.refresh_history().await
    }

    /// Re-fetch the history list for the active scope
    ///
    /// With the selected-challenge scope and no challenge selected, the
    /// list is simply empty.
    pub async fn refresh_history(&mut self) -> Result<(), SessionError> {
        let slug = match self.scope {
            HistoryScope::SelectedChallenge => match &self.challenge {
                Some(challenge) => Some(challenge.slug.clone()),
                None => {
                    self.history.clear();
                    return Ok(());
                }
            },
            HistoryScope::AllChallenges => None,
        };

        self.history = self
            .api
            .list_runs(slug.as_deref(), self.history_limit)
            .await?;
        Ok(())
    }

    /// Re-fetch the best-score listing
    pub async fn refresh_best_scores(&mut self) -> Result<(), SessionError> {
        self.best_scores = self.api.best_scores().await?;
        Ok(())
    }

    /// Evaluation plus its dependent refreshes, all-or-nothing
    ///
    /// The two post-run reads are logically independent and are joined
    /// before any state is touched; the evaluation itself is strictly
    /// sequenced before them.
    async fn evaluate_and_refresh(
        &self,
        request: &RunRequest,
    ) -> Result<(RunResult, Vec<RunRecord>, Vec<BestScore>), SessionError> {
        let result = self.api.evaluate(request).await?;

        let scope_slug = match self.scope {
            HistoryScope::SelectedChallenge => Some(request.challenge_slug.as_str()),
            HistoryScope::AllChallenges => None,
        };
        let (history, best_scores) = tokio::try_join!(
            self.api.list_runs(scope_slug, self.history_limit),
            self.api.best_scores(),
        )?;

        Ok((result, history, best_scores))
    }

    fn require_challenge(&self) -> Result<(), SessionError> {
        if self.challenge.is_none() {
            return Err(SessionError::NoChallengeSelected);
        }
        Ok(())
    }

    /// On-commit hook: persist the draft graph for the selected challenge
    ///
    /// Fire-and-forget by design; a failed write is logged and never
    /// blocks the mutation that triggered it.
    async fn persist_draft(&self) {
        if let Some(challenge) = &self.challenge {
            if let Err(err) = self.store.save_draft_graph(&challenge.slug, &self.graph).await {
                tracing::warn!(slug = %challenge.slug, %err, "failed to persist draft graph");
            }
        }
    }

    /// On-commit hook: persist the seed for the selected challenge
    async fn persist_seed(&self) {
        if let Some(challenge) = &self.challenge {
            if let Err(err) = self.store.save_last_seed(&challenge.slug, self.seed).await {
                tracing::warn!(slug = %challenge.slug, %err, "failed to persist seed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sdg_test_utils::{chain_graph, FakeBackend};
    use tempfile::TempDir;

    fn session_with(slugs: &[&str]) -> (TempDir, Session<FakeBackend>) {
        let dir = TempDir::new().unwrap();
        let session = Session::new(
            FakeBackend::with_challenges(slugs),
            DraftStore::new(dir.path()),
        );
        (dir, session)
    }

    async fn selected_session(slug: &str) -> (TempDir, Session<FakeBackend>) {
        let (dir, mut session) = session_with(&[slug, "other"]);
        session.select_challenge(slug).await.unwrap();
        (dir, session)
    }

    #[tokio::test]
    async fn select_challenge_defaults_to_empty_graph_and_seed_42() {
        let (_dir, mut session) = session_with(&["a"]);
        session.select_challenge("a").await.unwrap();

        assert!(session.graph().is_empty());
        assert_eq!(session.seed(), DEFAULT_SEED);
        assert_eq!(session.loaded_run_id(), None);
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn select_unknown_challenge_fails_cleanly() {
        let (_dir, mut session) = session_with(&["a"]);
        let err = session.select_challenge("nope").await.unwrap_err();
        assert_eq!(err.to_string(), "Challenge not found");
        assert!(session.challenge().is_none());
    }

    #[tokio::test]
    async fn mutations_require_a_selected_challenge() {
        let (_dir, mut session) = session_with(&["a"]);
        let err = session
            .add_node("api-1", NodeType::Api, NodeConfig::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NoChallengeSelected));
    }

    #[tokio::test]
    async fn drafts_survive_across_sessions() {
        let dir = TempDir::new().unwrap();

        let mut session = Session::new(
            FakeBackend::with_challenges(&["a"]),
            DraftStore::new(dir.path()),
        );
        session.select_challenge("a").await.unwrap();
        session.add_node("api-1", NodeType::Api, NodeConfig::new()).await.unwrap();
        session.add_node("db-1", NodeType::Db, NodeConfig::new()).await.unwrap();
        session.add_edge("api-1", "db-1", EdgeMode::Sync).await.unwrap();
        session.set_seed(1337).await.unwrap();
        drop(session);

        // Same device, new process.
        let mut session = Session::new(
            FakeBackend::with_challenges(&["a"]),
            DraftStore::new(dir.path()),
        );
        session.select_challenge("a").await.unwrap();
        assert_eq!(session.graph().node_count(), 2);
        assert_eq!(session.graph().edge_count(), 1);
        assert_eq!(session.seed(), 1337);
    }

    #[tokio::test]
    async fn switching_challenges_restores_each_ones_draft() {
        let (_dir, mut session) = session_with(&["a", "b"]);

        session.select_challenge("a").await.unwrap();
        session.add_node("api-1", NodeType::Api, NodeConfig::new()).await.unwrap();

        session.select_challenge("b").await.unwrap();
        assert!(session.graph().is_empty());
        session.add_node("cache-1", NodeType::Cache, NodeConfig::new()).await.unwrap();

        session.select_challenge("a").await.unwrap();
        assert_eq!(session.graph().nodes[0].id, "api-1");
    }

    #[tokio::test]
    async fn replace_graph_validates_and_persists() {
        let (_dir, mut session) = selected_session("a").await;

        let err = session
            .replace_graph(serde_imported_graph_with_dangling_edge())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Graph(_)));
        assert!(session.graph().is_empty());

        session.replace_graph(chain_graph(3)).await.unwrap();
        assert_eq!(session.graph().node_count(), 3);
    }

    fn serde_imported_graph_with_dangling_edge() -> Graph {
        let mut graph = chain_graph(1);
        graph.edges.push(sdg_model::Edge {
            source: "api-0".to_string(),
            target: "gone".to_string(),
            mode: EdgeMode::Sync,
        });
        graph
    }

    #[tokio::test]
    async fn run_without_challenge_is_rejected_before_network() {
        let (_dir, mut session) = session_with(&["a"]);
        let err = session.run_evaluation().await.unwrap_err();
        assert!(matches!(err, SessionError::NoChallengeSelected));
        assert_eq!(session.api().run_count(), 0);
    }

    #[tokio::test]
    async fn run_with_empty_graph_is_rejected_before_network() {
        let (_dir, mut session) = selected_session("a").await;
        let err = session.run_evaluation().await.unwrap_err();
        assert!(matches!(err, SessionError::EmptyGraph));
        assert_eq!(session.api().run_count(), 0);
    }

    #[tokio::test]
    async fn single_node_graph_reaches_the_backend() {
        let (_dir, mut session) = selected_session("a").await;
        session.add_node("api-1", NodeType::Api, NodeConfig::new()).await.unwrap();

        let result = session.run_evaluation().await.unwrap();
        assert_eq!(result.run_id, 1);
        assert_eq!(session.api().run_count(), 1);
        assert_eq!(session.run_state(), RunState::Idle);
    }

    #[tokio::test]
    async fn first_run_has_no_delta_second_run_does() {
        let (_dir, mut session) = selected_session("a").await;
        session.add_node("api-1", NodeType::Api, NodeConfig::new()).await.unwrap();

        let first = session.run_evaluation().await.unwrap();
        assert_eq!(session.delta(), None);
        assert_eq!(session.loaded_run_id(), Some(first.run_id));
        assert_eq!(session.history().len(), 1);

        session.add_node("db-1", NodeType::Db, NodeConfig::new()).await.unwrap();
        let second = session.run_evaluation().await.unwrap();

        assert_eq!(session.history().len(), 2);
        assert_eq!(session.loaded_run_id(), Some(second.run_id));
        let delta = session.delta().expect("delta for consecutive runs");
        let expected = second.score.total - first.score.total;
        assert_eq!(delta.total, (expected * 100.0).round() / 100.0);
    }

    #[tokio::test]
    async fn run_refreshes_best_scores() {
        let (_dir, mut session) = selected_session("a").await;
        session.add_node("api-1", NodeType::Api, NodeConfig::new()).await.unwrap();
        session.run_evaluation().await.unwrap();

        assert_eq!(session.best_scores().len(), 1);
        assert_eq!(session.best_scores()[0].challenge_slug, "a");
    }

    #[tokio::test]
    async fn rerun_with_same_seed_gets_fresh_id_and_same_numbers() {
        let (_dir, mut session) = selected_session("a").await;
        session.add_node("api-1", NodeType::Api, NodeConfig::new()).await.unwrap();

        let first = session.run_evaluation().await.unwrap();
        let second = session.run_evaluation().await.unwrap();

        assert_ne!(first.run_id, second.run_id);
        assert_eq!(first.metrics, second.metrics);
        assert_eq!(first.score.total, second.score.total);
        // Identical runs difference out to zero.
        assert_eq!(session.delta().unwrap().total, 0.0);
    }

    #[tokio::test]
    async fn failed_evaluation_leaves_state_untouched_and_retryable() {
        let (_dir, mut session) = selected_session("a").await;
        session.add_node("api-1", NodeType::Api, NodeConfig::new()).await.unwrap();
        session.run_evaluation().await.unwrap();
        let history_before = session.history().to_vec();

        session.api().fail_next_evaluate("simulator unavailable");
        let err = session.run_evaluation().await.unwrap_err();
        assert_eq!(err.to_string(), "simulator unavailable");
        assert_eq!(session.run_state(), RunState::Idle);
        assert_eq!(session.history(), history_before.as_slice());
        assert_eq!(session.loaded_run_id(), Some(1));

        // Retry works.
        session.run_evaluation().await.unwrap();
        assert_eq!(session.history().len(), 2);
    }

    #[tokio::test]
    async fn failed_history_refresh_commits_nothing() {
        let (_dir, mut session) = selected_session("a").await;
        session.add_node("api-1", NodeType::Api, NodeConfig::new()).await.unwrap();

        session.api().fail_next_list_runs("history unavailable");
        let err = session.run_evaluation().await.unwrap_err();
        assert_eq!(err.to_string(), "history unavailable");

        // The run happened server-side, but no partial view update.
        assert_eq!(session.api().run_count(), 1);
        assert!(session.history().is_empty());
        assert!(session.best_scores().is_empty());
        assert_eq!(session.loaded_run_id(), None);
        assert_eq!(session.delta(), None);

        // A manual refresh recovers the view.
        session.refresh_history().await.unwrap();
        assert_eq!(session.history().len(), 1);
    }

    #[tokio::test]
    async fn scope_switch_replaces_the_visible_list() {
        let (_dir, mut session) = session_with(&["a", "b"]);

        // Two runs for a through the session.
        session.select_challenge("a").await.unwrap();
        session.add_node("api-1", NodeType::Api, NodeConfig::new()).await.unwrap();
        session.run_evaluation().await.unwrap();
        session.run_evaluation().await.unwrap();

        // Three runs for b, directly against the backend.
        for _ in 0..3 {
            session
                .api()
                .evaluate(&RunRequest {
                    challenge_slug: "b".to_string(),
                    graph: chain_graph(2),
                    seed: DEFAULT_SEED,
                })
                .await
                .unwrap();
        }

        assert_eq!(session.history().len(), 2);

        session.set_history_scope(HistoryScope::AllChallenges).await.unwrap();
        assert_eq!(session.history().len(), 5);

        session
            .set_history_scope(HistoryScope::SelectedChallenge)
            .await
            .unwrap();
        assert_eq!(session.history().len(), 2);
        assert!(session
            .history()
            .iter()
            .all(|r| r.result.challenge_slug == "a"));
    }

    #[tokio::test]
    async fn challenge_switch_refetches_the_scoped_list() {
        let (_dir, mut session) = session_with(&["a", "b"]);
        session.select_challenge("a").await.unwrap();
        session.add_node("api-1", NodeType::Api, NodeConfig::new()).await.unwrap();
        session.run_evaluation().await.unwrap();
        assert_eq!(session.history().len(), 1);

        session.select_challenge("b").await.unwrap();
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn load_run_replaces_graph_seed_and_clears_delta() {
        let (_dir, mut session) = selected_session("a").await;
        session.add_node("api-1", NodeType::Api, NodeConfig::new()).await.unwrap();
        session.set_seed(7).await.unwrap();
        let first = session.run_evaluation().await.unwrap();

        session.add_node("db-1", NodeType::Db, NodeConfig::new()).await.unwrap();
        session.set_seed(8).await.unwrap();
        session.run_evaluation().await.unwrap();
        assert!(session.delta().is_some());

        session.load_run(first.run_id).await.unwrap();
        assert_eq!(session.graph().node_count(), 1);
        assert_eq!(session.seed(), 7);
        assert_eq!(session.loaded_run_id(), Some(first.run_id));
        assert_eq!(session.delta(), None);
        // No new evaluation happened.
        assert_eq!(session.api().run_count(), 2);
    }

    #[tokio::test]
    async fn loaded_run_becomes_the_persisted_draft() {
        let dir = TempDir::new().unwrap();
        let mut session = Session::new(
            FakeBackend::with_challenges(&["a"]),
            DraftStore::new(dir.path()),
        );
        session.select_challenge("a").await.unwrap();
        session.add_node("api-1", NodeType::Api, NodeConfig::new()).await.unwrap();
        let first = session.run_evaluation().await.unwrap();
        session.add_node("db-1", NodeType::Db, NodeConfig::new()).await.unwrap();

        session.load_run(first.run_id).await.unwrap();
        drop(session);

        let mut session = Session::new(
            FakeBackend::with_challenges(&["a"]),
            DraftStore::new(dir.path()),
        );
        session.select_challenge("a").await.unwrap();
        assert_eq!(session.graph().node_count(), 1);
    }

    #[tokio::test]
    async fn load_run_outside_history_falls_back_to_fetch_and_switches() {
        let (_dir, mut session) = selected_session("a").await;

        // A run for another challenge, not visible in the scoped history.
        let foreign = session
            .api()
            .evaluate(&RunRequest {
                challenge_slug: "other".to_string(),
                graph: chain_graph(3),
                seed: 5,
            })
            .await
            .unwrap();
        assert!(session.history().is_empty());

        session.load_run(foreign.run_id).await.unwrap();
        assert_eq!(session.challenge().unwrap().slug, "other");
        assert_eq!(session.graph().node_count(), 3);
        assert_eq!(session.seed(), 5);
        // Scoped history now follows the newly selected challenge.
        assert_eq!(session.history().len(), 1);
    }

    #[tokio::test]
    async fn delta_requires_matching_top_entry() {
        let (_dir, mut session) = session_with(&["a", "b"]);
        session.select_challenge("a").await.unwrap();
        session.add_node("api-1", NodeType::Api, NodeConfig::new()).await.unwrap();
        session.set_history_scope(HistoryScope::AllChallenges).await.unwrap();
        session.run_evaluation().await.unwrap();
        session.run_evaluation().await.unwrap();
        assert!(session.delta().is_some());

        // Under the all-challenges scope a foreign run can outrank ours;
        // the next evaluation of "a" still tops the refreshed list, so
        // this exercises the matching path end-to-end. The mismatch path
        // is covered below on delta_for directly.
        session
            .api()
            .evaluate(&RunRequest {
                challenge_slug: "b".to_string(),
                graph: chain_graph(1),
                seed: DEFAULT_SEED,
            })
            .await
            .unwrap();
        session.run_evaluation().await.unwrap();
        assert!(session.delta().is_some());
    }

    mod delta_rules {
        use super::*;
        use pretty_assertions::assert_eq;
        use sdg_model::{Metrics, RunResult, ScoreBreakdown};

        fn record(run_id: i64, total: f64) -> RunRecord {
            RunRecord {
                result: RunResult {
                    run_id,
                    challenge_slug: "a".to_string(),
                    seed: DEFAULT_SEED,
                    metrics: Metrics {
                        throughput_rps: 1000,
                        latency_p95_ms: 120,
                        availability_pct: 99.5,
                        monthly_cost_usd: 400.0,
                    },
                    score: ScoreBreakdown {
                        total,
                        requirements: 0.0,
                        reliability: 0.0,
                        performance: 0.0,
                        cost: 0.0,
                        explanations: vec![],
                    },
                    created_at: "2026-01-01T00:00:00Z".to_string(),
                },
                graph: Graph::new(),
            }
        }

        #[test]
        fn produced_only_for_matching_top_and_two_entries() {
            let history = vec![record(10, 72.0), record(9, 68.5)];
            let delta = delta_for(&history, 10).expect("matching top entry");
            assert_eq!(delta.total, 3.5);
        }

        #[test]
        fn stale_top_entry_yields_none() {
            // History top is not the run just produced.
            let history = vec![record(11, 80.0), record(10, 72.0)];
            assert_eq!(delta_for(&history, 10), None);
        }

        #[test]
        fn single_entry_yields_none() {
            let history = vec![record(10, 72.0)];
            assert_eq!(delta_for(&history, 10), None);
        }

        #[test]
        fn empty_history_yields_none() {
            assert_eq!(delta_for(&[], 10), None);
        }
    }
}
