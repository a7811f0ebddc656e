//! SDG Store - durable draft persistence
//!
//! Per-challenge storage of the not-yet-evaluated draft:
//! - Draft graphs under `graphs/<slug>.json`
//! - Last-used seeds under `seeds/<slug>.json`
//!
//! Writes are unconditional overwrites (write to a temp file, then
//! rename). Reads validate structurally and degrade silently to "no
//! draft" on any malformed payload; a corrupted local cache must never
//! block usage.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

use sdg_model::Graph;
use std::path::{Path, PathBuf};

/// Store I/O errors
///
/// Only writes surface these; reads fall back to `None`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem operation failed
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    /// Value could not be serialized
    #[error("store encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Durable key-value store for drafts, namespaced by challenge slug
#[derive(Debug, Clone)]
pub struct DraftStore {
    root: PathBuf,
}

impl DraftStore {
    /// Create a store rooted at `root`
    ///
    /// Directories are created lazily on first write.
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist the draft graph for a challenge (unconditional overwrite)
    pub async fn save_draft_graph(&self, slug: &str, graph: &Graph) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(graph)?;
        self.write_atomic(&self.graph_path(slug), bytes).await
    }

    /// Restore the draft graph for a challenge
    ///
    /// Returns `None` when nothing was saved, or when the stored payload
    /// is unreadable, structurally malformed, or fails graph validation.
    pub async fn load_draft_graph(&self, slug: &str) -> Option<Graph> {
        let path = self.graph_path(slug);
        let bytes = tokio::fs::read(&path).await.ok()?;

        let graph: Graph = match serde_json::from_slice(&bytes) {
            Ok(graph) => graph,
            Err(err) => {
                tracing::debug!(slug, %err, "discarding malformed draft graph");
                return None;
            }
        };
        if let Err(err) = graph.validate() {
            tracing::debug!(slug, %err, "discarding invalid draft graph");
            return None;
        }
        Some(graph)
    }

    /// Persist the last-used seed for a challenge
    pub async fn save_last_seed(&self, slug: &str, seed: i64) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(&seed)?;
        self.write_atomic(&self.seed_path(slug), bytes).await
    }

    /// Restore the last-used seed for a challenge
    ///
    /// Accepted only when the payload parses as a JSON integer; anything
    /// else is treated as absent.
    pub async fn load_last_seed(&self, slug: &str) -> Option<i64> {
        let path = self.seed_path(slug);
        let bytes = tokio::fs::read(&path).await.ok()?;

        match serde_json::from_slice::<serde_json::Value>(&bytes) {
            Ok(value) => {
                let seed = value.as_i64();
                if seed.is_none() {
                    tracing::debug!(slug, %value, "discarding non-integer seed");
                }
                seed
            }
            Err(err) => {
                tracing::debug!(slug, %err, "discarding malformed seed");
                None
            }
        }
    }

    fn graph_path(&self, slug: &str) -> PathBuf {
        self.root
            .join("graphs")
            .join(format!("{}.json", sanitize_slug(slug)))
    }

    fn seed_path(&self, slug: &str) -> PathBuf {
        self.root
            .join("seeds")
            .join(format!("{}.json", sanitize_slug(slug)))
    }

    /// Write to a sibling temp file, then rename into place
    async fn write_atomic(&self, path: &Path, bytes: Vec<u8>) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

/// Reduce a slug to a conservative filename character set
///
/// Keeps the per-slug namespace inside the store directory no matter
/// what the backend hands out as a slug.
fn sanitize_slug(slug: &str) -> String {
    let mut out: String = slug
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if out.is_empty() || out.chars().all(|c| c == '.') {
        out = "_".to_string();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdg_model::{EdgeMode, NodeConfig, NodeType};
    use tempfile::TempDir;

    fn store() -> (TempDir, DraftStore) {
        let dir = TempDir::new().unwrap();
        let store = DraftStore::new(dir.path());
        (dir, store)
    }

    fn sample_graph() -> Graph {
        let mut graph = Graph::new();
        graph.add_node("api-1", NodeType::Api, NodeConfig::new()).unwrap();
        graph.add_node("db-1", NodeType::Db, NodeConfig::new()).unwrap();
        graph.add_edge("api-1", "db-1", EdgeMode::Sync).unwrap();
        graph
    }

    #[tokio::test]
    async fn graph_round_trip() {
        let (_dir, store) = store();
        let graph = sample_graph();

        store.save_draft_graph("url-shortener", &graph).await.unwrap();
        let restored = store.load_draft_graph("url-shortener").await;

        assert_eq!(restored, Some(graph));
    }

    #[tokio::test]
    async fn drafts_are_isolated_per_challenge() {
        let (_dir, store) = store();
        store.save_draft_graph("challenge-a", &sample_graph()).await.unwrap();

        assert!(store.load_draft_graph("challenge-b").await.is_none());
    }

    #[tokio::test]
    async fn save_overwrites_previous_draft() {
        let (_dir, store) = store();
        store.save_draft_graph("c", &sample_graph()).await.unwrap();
        store.save_draft_graph("c", &Graph::new()).await.unwrap();

        assert_eq!(store.load_draft_graph("c").await, Some(Graph::new()));
    }

    #[tokio::test]
    async fn malformed_graph_payload_degrades_to_none() {
        let (dir, store) = store();
        let path = dir.path().join("graphs").join("broken.json");
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();

        // nodes must be a sequence
        tokio::fs::write(&path, br#"{"nodes": 3, "edges": []}"#).await.unwrap();
        assert!(store.load_draft_graph("broken").await.is_none());

        // not JSON at all
        tokio::fs::write(&path, b"not json").await.unwrap();
        assert!(store.load_draft_graph("broken").await.is_none());
    }

    #[tokio::test]
    async fn structurally_valid_but_inconsistent_graph_is_discarded() {
        let (dir, store) = store();
        let path = dir.path().join("graphs").join("dangling.json");
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(
            &path,
            br#"{"nodes": [{"id": "a", "type": "api", "config": {}}],
                 "edges": [{"source": "a", "target": "gone", "mode": "sync"}]}"#,
        )
        .await
        .unwrap();

        assert!(store.load_draft_graph("dangling").await.is_none());
    }

    #[tokio::test]
    async fn seed_round_trip_and_default_absence() {
        let (_dir, store) = store();
        assert_eq!(store.load_last_seed("c").await, None);

        store.save_last_seed("c", 1337).await.unwrap();
        assert_eq!(store.load_last_seed("c").await, Some(1337));
    }

    #[tokio::test]
    async fn non_integer_seed_is_treated_as_absent() {
        let (dir, store) = store();
        let path = dir.path().join("seeds").join("c.json");
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();

        tokio::fs::write(&path, b"\"forty-two\"").await.unwrap();
        assert_eq!(store.load_last_seed("c").await, None);

        tokio::fs::write(&path, b"42.5").await.unwrap();
        assert_eq!(store.load_last_seed("c").await, None);
    }

    #[tokio::test]
    async fn hostile_slugs_stay_inside_the_namespace() {
        let (dir, store) = store();
        store.save_last_seed("../escape", 1).await.unwrap();
        store.save_last_seed("..%2Fescape", 2).await.unwrap();

        // Nothing written outside the seeds directory.
        assert!(dir.path().join("seeds").is_dir());
        assert!(!dir.path().join("..").join("escape.json").exists());

        assert_eq!(store.load_last_seed("../escape").await, Some(1));
        assert_eq!(store.load_last_seed("..%2Fescape").await, Some(2));
    }

    #[test]
    fn sanitize_maps_to_conservative_charset() {
        assert_eq!(sanitize_slug("url-shortener"), "url-shortener");
        assert_eq!(sanitize_slug("a/b\\c:d"), "a_b_c_d");
        assert_eq!(sanitize_slug(""), "_");
        assert_eq!(sanitize_slug(".."), "_");
    }
}
