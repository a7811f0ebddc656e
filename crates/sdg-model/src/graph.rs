//! Graph model and mutation rules
//!
//! The candidate architecture a user assembles for a challenge:
//! - Nodes: typed infrastructure components with an open config mapping
//! - Edges: directed, sync or async, validated against the node set
//! - Mutations preserve insertion order (display order) and never leave
//!   an edge referencing a removed node

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Infrastructure component types recognized by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// Load balancer
    Lb,
    /// Application/API server
    Api,
    /// Database
    Db,
    /// Cache tier
    Cache,
    /// Message queue
    Queue,
    /// Content delivery network
    Cdn,
    /// Object store
    ObjectStore,
}

impl NodeType {
    /// Wire name as sent to the backend
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Lb => "lb",
            NodeType::Api => "api",
            NodeType::Db => "db",
            NodeType::Cache => "cache",
            NodeType::Queue => "queue",
            NodeType::Cdn => "cdn",
            NodeType::ObjectStore => "object_store",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Edge invocation mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeMode {
    /// Synchronous request/response
    #[default]
    Sync,
    /// Asynchronous (queued) hand-off
    Async,
}

impl EdgeMode {
    /// Wire name as sent to the backend
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeMode::Sync => "sync",
            EdgeMode::Async => "async",
        }
    }
}

impl std::fmt::Display for EdgeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar value accepted in the open config mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Number(f64),
    String(String),
}

/// Node configuration
///
/// `replicas` and `shards` are the keys the simulator recognizes; any
/// other scalar key is carried through opaquely. Defaults are omitted
/// from the wire form: `replicas` is only stored when greater than 1,
/// and `shards` only for database nodes (same greater-than-1 rule).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Replica count (omitted when 1, the implicit default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<u32>,
    /// Shard count, meaningful only for database nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shards: Option<u32>,
    /// Passthrough scalar keys, opaque to the client
    #[serde(flatten)]
    pub extra: IndexMap<String, ConfigValue>,
}

impl NodeConfig {
    /// Create empty configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With replica count
    #[inline]
    #[must_use]
    pub fn with_replicas(mut self, replicas: u32) -> Self {
        self.replicas = Some(replicas);
        self
    }

    /// With shard count
    #[inline]
    #[must_use]
    pub fn with_shards(mut self, shards: u32) -> Self {
        self.shards = Some(shards);
        self
    }

    /// With a passthrough scalar entry
    #[inline]
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: ConfigValue) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Drop implicit defaults so the wire payload stays minimal
    ///
    /// `replicas <= 1` is the implicit default and is removed; `shards`
    /// is removed for non-database nodes and when `<= 1`.
    #[must_use]
    pub fn normalized(mut self, node_type: NodeType) -> Self {
        self.replicas = self.replicas.filter(|r| *r > 1);
        self.shards = match node_type {
            NodeType::Db => self.shards.filter(|s| *s > 1),
            _ => None,
        };
        self
    }
}

/// A single infrastructure component in the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Identifier, unique within its graph
    pub id: String,
    /// Component type
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Configuration mapping
    #[serde(default)]
    pub config: NodeConfig,
}

/// A directed connection between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Source node id
    pub source: String,
    /// Target node id
    pub target: String,
    /// Invocation mode
    #[serde(default)]
    pub mode: EdgeMode,
}

/// Graph mutation and validation errors
// Display/Error are implemented by hand because thiserror treats any field
// named `source` as an error source, and these variants use `source` for a
// plain node id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Node id must be non-empty
    EmptyNodeId,

    /// Node id already present
    DuplicateNodeId(String),

    /// Referenced node does not exist
    UnknownNode(String),

    /// Edge endpoint(s) missing from the node set
    UnknownEndpoint { source: String, target: String },

    /// Exact (source, target, mode) triple already present
    DuplicateEdge {
        source: String,
        target: String,
        mode: EdgeMode,
    },

    /// Positional edge removal out of range
    EdgeIndexOutOfRange { index: usize, len: usize },
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyNodeId => write!(f, "node id must not be empty"),
            Self::DuplicateNodeId(id) => write!(f, "duplicate node id: {id}"),
            Self::UnknownNode(id) => write!(f, "unknown node: {id}"),
            Self::UnknownEndpoint { source, target } => {
                write!(f, "edge references unknown node(s): {source} -> {target}")
            }
            Self::DuplicateEdge {
                source,
                target,
                mode,
            } => write!(f, "duplicate {mode} edge: {source} -> {target}"),
            Self::EdgeIndexOutOfRange { index, len } => {
                write!(f, "edge index {index} out of range (len {len})")
            }
        }
    }
}

impl std::error::Error for GraphError {}

/// The user's candidate architecture for one challenge
///
/// Node and edge order is insertion order; it is display order only and
/// carries no semantics. Owned exclusively by the editing session for a
/// single challenge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    /// Nodes in insertion order
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Edges in insertion order
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Graph {
    /// Create empty graph
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the graph has no nodes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges
    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Look up a node by id
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// True when a node with this id exists
    #[inline]
    #[must_use]
    pub fn has_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Add a node
    ///
    /// Appends at the end; the config is normalized on entry.
    ///
    /// # Errors
    /// - `GraphError::EmptyNodeId` when `id` is empty
    /// - `GraphError::DuplicateNodeId` when `id` is already present
    pub fn add_node(
        &mut self,
        id: impl Into<String>,
        node_type: NodeType,
        config: NodeConfig,
    ) -> Result<(), GraphError> {
        let id = id.into();
        if id.is_empty() {
            return Err(GraphError::EmptyNodeId);
        }
        if self.has_node(&id) {
            return Err(GraphError::DuplicateNodeId(id));
        }

        self.nodes.push(Node {
            id,
            node_type,
            config: config.normalized(node_type),
        });
        Ok(())
    }

    /// Remove a node and every edge touching it
    ///
    /// The cascade is an invariant: no edge may reference a removed node.
    ///
    /// # Errors
    /// - `GraphError::UnknownNode` when `id` is not present
    pub fn remove_node(&mut self, id: &str) -> Result<(), GraphError> {
        let idx = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))?;

        self.nodes.remove(idx);
        self.edges.retain(|e| e.source != id && e.target != id);
        Ok(())
    }

    /// Add a directed edge
    ///
    /// Self-loops are permitted; the same node pair may appear once per
    /// mode.
    ///
    /// # Errors
    /// - `GraphError::UnknownEndpoint` when either endpoint is absent
    /// - `GraphError::DuplicateEdge` when the exact triple exists
    pub fn add_edge(
        &mut self,
        source: impl Into<String>,
        target: impl Into<String>,
        mode: EdgeMode,
    ) -> Result<(), GraphError> {
        let source = source.into();
        let target = target.into();

        if !self.has_node(&source) || !self.has_node(&target) {
            return Err(GraphError::UnknownEndpoint { source, target });
        }
        if self
            .edges
            .iter()
            .any(|e| e.source == source && e.target == target && e.mode == mode)
        {
            return Err(GraphError::DuplicateEdge {
                source,
                target,
                mode,
            });
        }

        self.edges.push(Edge {
            source,
            target,
            mode,
        });
        Ok(())
    }

    /// Remove an edge by position
    ///
    /// Later positions shift down; callers must not cache indices across
    /// mutations.
    ///
    /// # Errors
    /// - `GraphError::EdgeIndexOutOfRange` when `index >= edge_count()`
    pub fn remove_edge(&mut self, index: usize) -> Result<Edge, GraphError> {
        if index >= self.edges.len() {
            return Err(GraphError::EdgeIndexOutOfRange {
                index,
                len: self.edges.len(),
            });
        }
        Ok(self.edges.remove(index))
    }

    /// Re-check every structural invariant
    ///
    /// Used on untrusted graphs (restored drafts) where the per-mutation
    /// checks have not run: unique non-empty node ids, no dangling edge
    /// endpoints, no duplicate (source, target, mode) triples.
    pub fn validate(&self) -> Result<(), GraphError> {
        let mut seen_ids = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if node.id.is_empty() {
                return Err(GraphError::EmptyNodeId);
            }
            if seen_ids.contains(&node.id.as_str()) {
                return Err(GraphError::DuplicateNodeId(node.id.clone()));
            }
            seen_ids.push(node.id.as_str());
        }

        for (i, edge) in self.edges.iter().enumerate() {
            if !self.has_node(&edge.source) || !self.has_node(&edge.target) {
                return Err(GraphError::UnknownEndpoint {
                    source: edge.source.clone(),
                    target: edge.target.clone(),
                });
            }
            if self.edges[..i]
                .iter()
                .any(|e| e.source == edge.source && e.target == edge.target && e.mode == edge.mode)
            {
                return Err(GraphError::DuplicateEdge {
                    source: edge.source.clone(),
                    target: edge.target.clone(),
                    mode: edge.mode,
                });
            }
        }

        Ok(())
    }
}
