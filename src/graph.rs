//! Personalized knowledge graph: data model and store
//!
//! Every node belongs to exactly one owner; edges live inside their source
//! node as an adjacency list and may only reference nodes of the same owner.
//! There is no shared or global graph state, so no cross-user race exists by
//! construction.
//!
//! Mutations that cascade across the whole owner graph (merge, delete) run in
//! two phases: a read-only pass collecting every edge to rewrite or remove,
//! then a separate write pass. These scans are O(V·E) per owner and are kept
//! acceptable by a configurable per-owner node ceiling.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::config::GraphConfig;
use crate::constants::{EDGE_REINFORCEMENT_FACTOR, EDGE_SIBLING_DECAY, EDGE_STRENGTHEN_INCREMENT};
use crate::errors::{MemoryError, Result};
use crate::validation::{validate_confidence, validate_owner_id, validate_weight};

/// Node types in the personal knowledge graph (closed set)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum NodeType {
    User,
    Content,
    Contact,
    Session,
    Task,
    Event,
    Location,
    Topic,
    Entity,
    Concept,
    Preference,
    Skill,
    Project,
    Organization,
}

impl NodeType {
    /// Get string representation of the node type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Content => "Content",
            Self::Contact => "Contact",
            Self::Session => "Session",
            Self::Task => "Task",
            Self::Event => "Event",
            Self::Location => "Location",
            Self::Topic => "Topic",
            Self::Entity => "Entity",
            Self::Concept => "Concept",
            Self::Preference => "Preference",
            Self::Skill => "Skill",
            Self::Project => "Project",
            Self::Organization => "Organization",
        }
    }
}

/// Relation types between nodes (closed set of 19)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RelationKind {
    Visited,
    Knows,
    WorksWith,
    LivesIn,
    LocatedIn,
    PartOf,
    Contains,
    Uses,
    CreatedBy,
    Likes,
    Dislikes,
    RelatedTo,
    Precedes,
    Follows,
    SimilarTo,
    Mentions,
    AttendedWith,
    PurchasedAt,
    ParticipatedIn,
}

impl RelationKind {
    /// Get string representation of the relation kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Visited => "VISITED",
            Self::Knows => "KNOWS",
            Self::WorksWith => "WORKS_WITH",
            Self::LivesIn => "LIVES_IN",
            Self::LocatedIn => "LOCATED_IN",
            Self::PartOf => "PART_OF",
            Self::Contains => "CONTAINS",
            Self::Uses => "USES",
            Self::CreatedBy => "CREATED_BY",
            Self::Likes => "LIKES",
            Self::Dislikes => "DISLIKES",
            Self::RelatedTo => "RELATED_TO",
            Self::Precedes => "PRECEDES",
            Self::Follows => "FOLLOWS",
            Self::SimilarTo => "SIMILAR_TO",
            Self::Mentions => "MENTIONS",
            Self::AttendedWith => "ATTENDED_WITH",
            Self::PurchasedAt => "PURCHASED_AT",
            Self::ParticipatedIn => "PARTICIPATED_IN",
        }
    }
}

/// Directed, weighted, typed relation held inside its source node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// Target node id (same owner as the source node, always)
    pub target: Uuid,

    /// Relation type
    pub kind: RelationKind,

    /// Relation strength in [0, 1]
    pub weight: f32,

    /// When this edge was first created
    pub created_at: DateTime<Utc>,

    /// When this edge was last reinforced or strengthened
    pub updated_at: DateTime<Utc>,
}

/// Atomic unit of personalized knowledge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier
    pub id: Uuid,

    /// Owning user; nodes are never shared across owners
    pub owner_id: String,

    /// Node type
    pub node_type: NodeType,

    /// Short human-readable label
    pub label: String,

    /// Free-text content
    pub content: String,

    /// Extraction/assertion confidence in [0, 1]
    pub confidence: f32,

    /// When this node was created
    pub created_at: DateTime<Utc>,

    /// When this node was last mutated
    pub updated_at: DateTime<Utc>,

    /// Optional structured properties
    #[serde(default)]
    pub properties: HashMap<String, serde_json::Value>,

    /// Out-edges owned by this node
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Node {
    /// Find this node's out-edge to `target`, if any
    pub fn edge_to(&self, target: &Uuid) -> Option<&Edge> {
        self.edges.iter().find(|e| e.target == *target)
    }

    /// Sum of out-edge weights
    pub fn weighted_out_degree(&self) -> f32 {
        self.edges.iter().map(|e| e.weight).sum()
    }
}

/// Parameters for creating a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDraft {
    pub node_type: NodeType,
    pub label: String,
    pub content: String,
    pub confidence: f32,
    #[serde(default)]
    pub properties: HashMap<String, serde_json::Value>,
}

impl NodeDraft {
    pub fn new(node_type: NodeType, label: &str) -> Self {
        Self {
            node_type,
            label: label.to_string(),
            content: String::new(),
            confidence: 1.0,
            properties: HashMap::new(),
        }
    }

    pub fn content(mut self, content: &str) -> Self {
        self.content = content.to_string();
        self
    }

    pub fn confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn property(mut self, key: &str, value: serde_json::Value) -> Self {
        self.properties.insert(key.to_string(), value);
        self
    }
}

/// Patch for updating a node in place; `None` fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodePatch {
    pub label: Option<String>,
    pub content: Option<String>,
    pub confidence: Option<f32>,
    pub properties: Option<HashMap<String, serde_json::Value>>,
}

/// Node and edge counts for one owner's graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
}

/// In-memory graph store, keyed by owner then node id
///
/// The store is synchronous; the lock only makes it `Sync` for embedding in
/// a threaded host. Serialization of concurrent mutations within one owner's
/// subgraph is the storage collaborator's responsibility.
pub struct GraphStore {
    /// owner id → (node id → node)
    graphs: RwLock<HashMap<String, HashMap<Uuid, Node>>>,

    /// node id → owner id, to distinguish cross-owner access from not-found
    owner_index: RwLock<HashMap<Uuid, String>>,

    config: GraphConfig,
}

impl GraphStore {
    pub fn new(config: GraphConfig) -> Self {
        Self {
            graphs: RwLock::new(HashMap::new()),
            owner_index: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Create a node for `owner`, returning its id
    ///
    /// Fails with a resource-limit error when the owner's node count would
    /// exceed the configured ceiling.
    pub fn create_node(&self, owner: &str, draft: NodeDraft) -> Result<Uuid> {
        validate_owner_id(owner)?;
        validate_confidence(draft.confidence)?;
        if draft.label.trim().is_empty() {
            return Err(MemoryError::validation("label", "label cannot be empty"));
        }

        let mut graphs = self.graphs.write();
        let graph = graphs.entry(owner.to_string()).or_default();

        if graph.len() >= self.config.max_nodes_per_owner {
            return Err(MemoryError::ResourceLimit {
                resource: format!("nodes for owner '{owner}'"),
                current: graph.len(),
                limit: self.config.max_nodes_per_owner,
            });
        }

        let now = Utc::now();
        let node = Node {
            id: Uuid::new_v4(),
            owner_id: owner.to_string(),
            node_type: draft.node_type,
            label: draft.label,
            content: draft.content,
            confidence: draft.confidence,
            created_at: now,
            updated_at: now,
            properties: draft.properties,
            edges: Vec::new(),
        };
        let id = node.id;
        graph.insert(id, node);
        self.owner_index.write().insert(id, owner.to_string());

        tracing::debug!(%id, owner, "created node");
        Ok(id)
    }

    /// Fetch a node by id
    pub fn get_node(&self, owner: &str, id: &Uuid) -> Result<Node> {
        let graphs = self.graphs.read();
        match graphs.get(owner).and_then(|g| g.get(id)) {
            Some(node) => Ok(node.clone()),
            None => Err(self.missing_node_error(owner, id)),
        }
    }

    /// Patch a node's label/content/confidence/properties in place
    pub fn update_node(&self, owner: &str, id: &Uuid, patch: NodePatch) -> Result<()> {
        if let Some(confidence) = patch.confidence {
            validate_confidence(confidence)?;
        }

        let mut graphs = self.graphs.write();
        let node = graphs
            .get_mut(owner)
            .and_then(|g| g.get_mut(id))
            .ok_or_else(|| self.missing_node_error(owner, id))?;

        if let Some(label) = patch.label {
            node.label = label;
        }
        if let Some(content) = patch.content {
            node.content = content;
        }
        if let Some(confidence) = patch.confidence {
            node.confidence = confidence;
        }
        if let Some(properties) = patch.properties {
            node.properties.extend(properties);
        }
        node.updated_at = Utc::now();
        Ok(())
    }

    /// Create or reinforce an edge `source → target`
    ///
    /// If the edge already exists it is reinforced as
    /// `w' = min(1, w + weight · 0.1)` instead of appended, so repeated
    /// interaction events cannot grow a relation without bound. With
    /// `bidirectional`, the same create-or-reinforce logic is mirrored on
    /// `target → source`.
    pub fn create_edge(
        &self,
        owner: &str,
        source: &Uuid,
        target: &Uuid,
        kind: RelationKind,
        weight: f32,
        bidirectional: bool,
    ) -> Result<()> {
        validate_weight(weight)?;

        let mut graphs = self.graphs.write();
        let graph = graphs
            .get_mut(owner)
            .ok_or_else(|| self.missing_node_error(owner, source))?;
        if !graph.contains_key(source) {
            return Err(self.missing_node_error(owner, source));
        }
        if !graph.contains_key(target) {
            return Err(self.missing_node_error(owner, target));
        }

        Self::upsert_edge(graph, source, target, kind, weight);
        if bidirectional {
            Self::upsert_edge(graph, target, source, kind, weight);
        }

        tracing::debug!(%source, %target, kind = kind.as_str(), weight, bidirectional, "created edge");
        Ok(())
    }

    fn upsert_edge(
        graph: &mut HashMap<Uuid, Node>,
        source: &Uuid,
        target: &Uuid,
        kind: RelationKind,
        weight: f32,
    ) {
        let now = Utc::now();
        // Both endpoints were checked by the caller.
        let node = graph.get_mut(source).expect("source checked");
        match node.edges.iter_mut().find(|e| e.target == *target) {
            Some(edge) => {
                edge.weight = (edge.weight + weight * EDGE_REINFORCEMENT_FACTOR).min(1.0);
                edge.updated_at = now;
            }
            None => node.edges.push(Edge {
                target: *target,
                kind,
                weight: weight.clamp(0.0, 1.0),
                created_at: now,
                updated_at: now,
            }),
        }
        node.updated_at = now;
    }

    /// Strengthen one out-edge of `source` and decay its siblings
    ///
    /// The targeted edge gains `increment` (clamped to 1.0); every other
    /// out-edge of `source` is multiplied by 0.99, modeling limited attention
    /// across a node's relations.
    pub fn strengthen_edge(
        &self,
        owner: &str,
        source: &Uuid,
        target: &Uuid,
        increment: Option<f32>,
    ) -> Result<f32> {
        let increment = increment.unwrap_or(EDGE_STRENGTHEN_INCREMENT);
        validate_weight(increment)?;

        let mut graphs = self.graphs.write();
        let node = graphs
            .get_mut(owner)
            .and_then(|g| g.get_mut(source))
            .ok_or_else(|| self.missing_node_error(owner, source))?;

        if !node.edges.iter().any(|e| e.target == *target) {
            return Err(MemoryError::NotFound {
                kind: "edge",
                id: format!("{source} -> {target}"),
            });
        }

        let now = Utc::now();
        let mut new_weight = 0.0;
        for edge in node.edges.iter_mut() {
            if edge.target == *target {
                edge.weight = (edge.weight + increment).min(1.0);
                edge.updated_at = now;
                new_weight = edge.weight;
            } else {
                edge.weight *= EDGE_SIBLING_DECAY;
            }
        }
        node.updated_at = now;

        tracing::trace!(%source, %target, new_weight, "strengthened edge");
        Ok(new_weight)
    }

    /// Merge `source` into `target`, rewriting the owner's whole graph
    ///
    /// Edge lists are unioned with target-wins dedup by edge target, the
    /// merged content/confidence is patched onto `target`, every edge in the
    /// owner's graph pointing at `source` is redirected to `target`, and
    /// `source` is deleted. Self-loops produced by the merge are dropped.
    pub fn merge_nodes(
        &self,
        owner: &str,
        source: &Uuid,
        target: &Uuid,
        merged_content: &str,
        merged_confidence: f32,
    ) -> Result<()> {
        validate_confidence(merged_confidence)?;
        if source == target {
            return Err(MemoryError::validation(
                "target",
                "cannot merge a node into itself",
            ));
        }

        let mut graphs = self.graphs.write();
        let graph = graphs
            .get_mut(owner)
            .ok_or_else(|| self.missing_node_error(owner, source))?;

        let source_node = graph
            .get(source)
            .cloned()
            .ok_or_else(|| self.missing_node_error(owner, source))?;
        if !graph.contains_key(target) {
            return Err(self.missing_node_error(owner, target));
        }

        // Phase 1 (read): union edge lists and collect inbound rewrites.
        let target_node = graph.get(target).expect("target checked");
        let mut merged_edges: Vec<Edge> = target_node
            .edges
            .iter()
            .filter(|e| e.target != *source)
            .cloned()
            .collect();
        for edge in &source_node.edges {
            // Target's edges win ties; skip edges that would become
            // self-loops or dangle on the deleted source.
            if edge.target == *target || edge.target == *source {
                continue;
            }
            if !merged_edges.iter().any(|e| e.target == edge.target) {
                merged_edges.push(edge.clone());
            }
        }

        let rewrites: Vec<Uuid> = graph
            .values()
            .filter(|node| node.id != *source && node.edges.iter().any(|e| e.target == *source))
            .map(|node| node.id)
            .collect();

        // Phase 2 (write): patch target, redirect inbound edges, drop source.
        let now = Utc::now();
        let target_node = graph.get_mut(target).expect("target checked");
        target_node.content = merged_content.to_string();
        target_node.confidence = merged_confidence;
        target_node.edges = merged_edges;
        target_node.updated_at = now;

        for node_id in rewrites {
            let node = graph.get_mut(&node_id).expect("collected in read pass");
            let already_points_at_target = node.edges.iter().any(|e| e.target == *target);
            if already_points_at_target || node_id == *target {
                // Redirect would duplicate an existing edge (or self-loop);
                // keep the existing relation and drop the stale one.
                node.edges.retain(|e| e.target != *source);
            } else {
                for edge in node.edges.iter_mut() {
                    if edge.target == *source {
                        edge.target = *target;
                        edge.updated_at = now;
                    }
                }
            }
            node.updated_at = now;
        }

        graph.remove(source);
        self.owner_index.write().remove(source);

        tracing::debug!(%source, %target, owner, "merged nodes");
        Ok(())
    }

    /// Delete a node and every edge in the owner's graph targeting it
    pub fn delete_node(&self, owner: &str, id: &Uuid) -> Result<()> {
        let mut graphs = self.graphs.write();
        let graph = graphs
            .get_mut(owner)
            .ok_or_else(|| self.missing_node_error(owner, id))?;
        if !graph.contains_key(id) {
            return Err(self.missing_node_error(owner, id));
        }

        // Phase 1 (read): collect nodes holding an edge to the victim.
        let affected: Vec<Uuid> = graph
            .values()
            .filter(|node| node.edges.iter().any(|e| e.target == *id))
            .map(|node| node.id)
            .collect();

        // Phase 2 (write): strip those edges, then remove the node.
        let now = Utc::now();
        for node_id in &affected {
            if let Some(node) = graph.get_mut(node_id) {
                node.edges.retain(|e| e.target != *id);
                node.updated_at = now;
            }
        }
        graph.remove(id);
        self.owner_index.write().remove(id);

        tracing::debug!(%id, owner, inbound_removed = affected.len(), "deleted node");
        Ok(())
    }

    /// Number of nodes owned by `owner`
    pub fn node_count(&self, owner: &str) -> usize {
        self.graphs.read().get(owner).map_or(0, |g| g.len())
    }

    /// Node and edge counts for `owner`
    pub fn stats(&self, owner: &str) -> GraphStats {
        let graphs = self.graphs.read();
        let graph = graphs.get(owner);
        GraphStats {
            node_count: graph.map_or(0, |g| g.len()),
            edge_count: graph.map_or(0, |g| g.values().map(|n| n.edges.len()).sum()),
        }
    }

    /// Remove an owner's entire graph (owner-deletion request)
    pub fn clear_owner(&self, owner: &str) -> usize {
        let removed = self.graphs.write().remove(owner);
        let count = removed.as_ref().map_or(0, |g| g.len());
        if let Some(graph) = removed {
            let mut index = self.owner_index.write();
            for id in graph.keys() {
                index.remove(id);
            }
        }
        if count > 0 {
            tracing::info!(owner, nodes = count, "cleared owner graph");
        }
        count
    }

    /// Clone a consistent snapshot of an owner's graph
    ///
    /// Traversal, relationship scoring and centrality all operate over
    /// snapshots rather than holding the store lock across their scans.
    pub fn snapshot(&self, owner: &str) -> HashMap<Uuid, Node> {
        self.graphs.read().get(owner).cloned().unwrap_or_default()
    }

    /// Distinguish a cross-owner access from a genuinely unknown node
    fn missing_node_error(&self, owner: &str, id: &Uuid) -> MemoryError {
        let index = self.owner_index.read();
        match index.get(id) {
            Some(actual_owner) if actual_owner != owner => MemoryError::Authorization {
                owner_id: owner.to_string(),
                resource: format!("node {id}"),
            },
            _ => MemoryError::node_not_found(id),
        }
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new(GraphConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> GraphStore {
        GraphStore::default()
    }

    fn node(store: &GraphStore, owner: &str, label: &str) -> Uuid {
        store
            .create_node(owner, NodeDraft::new(NodeType::Topic, label))
            .unwrap()
    }

    #[test]
    fn test_create_and_get_node() {
        let store = store();
        let id = store
            .create_node(
                "u1",
                NodeDraft::new(NodeType::Contact, "Alice")
                    .content("met at RustConf")
                    .confidence(0.9),
            )
            .unwrap();
        let fetched = store.get_node("u1", &id).unwrap();
        assert_eq!(fetched.label, "Alice");
        assert_eq!(fetched.node_type, NodeType::Contact);
        assert!((fetched.confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_cross_owner_access_is_authorization_error() {
        let store = store();
        let id = node(&store, "u1", "private");
        let err = store.get_node("u2", &id).unwrap_err();
        assert_eq!(err.code(), "AUTHORIZATION");
    }

    #[test]
    fn test_unknown_node_is_not_found() {
        let store = store();
        node(&store, "u1", "a");
        let err = store.get_node("u1", &Uuid::new_v4()).unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn test_edge_reinforcement_is_soft() {
        let store = store();
        let a = node(&store, "u1", "a");
        let b = node(&store, "u1", "b");
        store
            .create_edge("u1", &a, &b, RelationKind::RelatedTo, 0.5, false)
            .unwrap();
        store
            .create_edge("u1", &a, &b, RelationKind::RelatedTo, 0.5, false)
            .unwrap();

        let edge_weight = store.get_node("u1", &a).unwrap().edge_to(&b).unwrap().weight;
        // 0.5 + 0.5 * 0.1 = 0.55, not 1.0
        assert!((edge_weight - 0.55).abs() < 1e-6);
    }

    #[test]
    fn test_bidirectional_edge_mirrors() {
        let store = store();
        let a = node(&store, "u1", "a");
        let b = node(&store, "u1", "b");
        store
            .create_edge("u1", &a, &b, RelationKind::Knows, 0.4, true)
            .unwrap();
        assert!(store.get_node("u1", &a).unwrap().edge_to(&b).is_some());
        assert!(store.get_node("u1", &b).unwrap().edge_to(&a).is_some());
    }

    #[test]
    fn test_strengthen_decays_siblings() {
        let store = store();
        let a = node(&store, "u1", "a");
        let b = node(&store, "u1", "b");
        let c = node(&store, "u1", "c");
        store
            .create_edge("u1", &a, &b, RelationKind::Visited, 0.5, false)
            .unwrap();
        store
            .create_edge("u1", &a, &c, RelationKind::Visited, 0.8, false)
            .unwrap();

        let new_weight = store.strengthen_edge("u1", &a, &b, Some(0.05)).unwrap();
        assert!((new_weight - 0.55).abs() < 1e-6);

        let sibling = store.get_node("u1", &a).unwrap().edge_to(&c).unwrap().weight;
        assert!((sibling - 0.8 * 0.99).abs() < 1e-6);
    }

    #[test]
    fn test_strengthen_unknown_edge_not_found() {
        let store = store();
        let a = node(&store, "u1", "a");
        let b = node(&store, "u1", "b");
        let err = store.strengthen_edge("u1", &a, &b, None).unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn test_weights_stay_in_unit_interval() {
        let store = store();
        let a = node(&store, "u1", "a");
        let b = node(&store, "u1", "b");
        store
            .create_edge("u1", &a, &b, RelationKind::Uses, 1.0, false)
            .unwrap();
        for _ in 0..50 {
            store
                .create_edge("u1", &a, &b, RelationKind::Uses, 1.0, false)
                .unwrap();
            store.strengthen_edge("u1", &a, &b, Some(0.5)).unwrap();
        }
        let weight = store.get_node("u1", &a).unwrap().edge_to(&b).unwrap().weight;
        assert!((0.0..=1.0).contains(&weight));
    }

    #[test]
    fn test_invalid_weight_rejected() {
        let store = store();
        let a = node(&store, "u1", "a");
        let b = node(&store, "u1", "b");
        let err = store
            .create_edge("u1", &a, &b, RelationKind::Uses, 1.5, false)
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION");
    }

    #[test]
    fn test_merge_rewrites_inbound_and_deletes_source() {
        let store = store();
        let a = node(&store, "u1", "a");
        let b = node(&store, "u1", "b");
        let c = node(&store, "u1", "c");
        // c → a must be rewritten to c → b after merging a into b.
        store
            .create_edge("u1", &c, &a, RelationKind::Mentions, 0.7, false)
            .unwrap();

        store.merge_nodes("u1", &a, &b, "merged", 0.8).unwrap();

        assert_eq!(store.get_node("u1", &a).unwrap_err().code(), "NOT_FOUND");
        let c_node = store.get_node("u1", &c).unwrap();
        assert!(c_node.edge_to(&b).is_some());
        assert!(c_node.edge_to(&a).is_none());

        let b_node = store.get_node("u1", &b).unwrap();
        assert_eq!(b_node.content, "merged");
        assert!((b_node.confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_merge_unions_edges_target_wins() {
        let store = store();
        let a = node(&store, "u1", "a");
        let b = node(&store, "u1", "b");
        let shared = node(&store, "u1", "shared");
        let only_a = node(&store, "u1", "only-a");
        store
            .create_edge("u1", &a, &shared, RelationKind::RelatedTo, 0.2, false)
            .unwrap();
        store
            .create_edge("u1", &a, &only_a, RelationKind::RelatedTo, 0.6, false)
            .unwrap();
        store
            .create_edge("u1", &b, &shared, RelationKind::RelatedTo, 0.9, false)
            .unwrap();

        store.merge_nodes("u1", &a, &b, "merged", 0.5).unwrap();

        let b_node = store.get_node("u1", &b).unwrap();
        // No duplicate targets, and the tie went to target's weight.
        let shared_edges: Vec<_> = b_node.edges.iter().filter(|e| e.target == shared).collect();
        assert_eq!(shared_edges.len(), 1);
        assert!((shared_edges[0].weight - 0.9).abs() < 1e-6);
        assert!(b_node.edge_to(&only_a).is_some());
    }

    #[test]
    fn test_merge_drops_source_self_loop() {
        let store = store();
        let a = node(&store, "u1", "a");
        let b = node(&store, "u1", "b");
        store
            .create_edge("u1", &a, &a, RelationKind::RelatedTo, 0.5, false)
            .unwrap();

        store.merge_nodes("u1", &a, &b, "merged", 0.5).unwrap();

        // The self-loop must not survive as an edge to the deleted node.
        let b_node = store.get_node("u1", &b).unwrap();
        assert!(b_node.edge_to(&a).is_none());
        assert!(b_node.edges.is_empty());
        assert_eq!(store.stats("u1").edge_count, 0);
    }

    #[test]
    fn test_delete_cascades_inbound_edges() {
        let store = store();
        let a = node(&store, "u1", "a");
        let b = node(&store, "u1", "b");
        store
            .create_edge("u1", &b, &a, RelationKind::Knows, 0.5, false)
            .unwrap();

        store.delete_node("u1", &a).unwrap();

        assert_eq!(store.get_node("u1", &a).unwrap_err().code(), "NOT_FOUND");
        assert!(store.get_node("u1", &b).unwrap().edges.is_empty());
    }

    #[test]
    fn test_node_ceiling_enforced() {
        let config = GraphConfig {
            max_nodes_per_owner: 2,
        };
        let store = GraphStore::new(config);
        node(&store, "u1", "a");
        node(&store, "u1", "b");
        let err = store
            .create_node("u1", NodeDraft::new(NodeType::Topic, "c"))
            .unwrap_err();
        assert_eq!(err.code(), "RESOURCE_LIMIT");
        // Other owners are unaffected by u1's ceiling.
        assert!(store.create_node("u2", NodeDraft::new(NodeType::Topic, "c")).is_ok());
    }

    #[test]
    fn test_clear_owner() {
        let store = store();
        let a = node(&store, "u1", "a");
        node(&store, "u1", "b");
        assert_eq!(store.clear_owner("u1"), 2);
        assert_eq!(store.node_count("u1"), 0);
        assert_eq!(store.get_node("u1", &a).unwrap_err().code(), "NOT_FOUND");
    }

    #[test]
    fn test_stats_counts() {
        let store = store();
        let a = node(&store, "u1", "a");
        let b = node(&store, "u1", "b");
        store
            .create_edge("u1", &a, &b, RelationKind::Knows, 0.5, true)
            .unwrap();
        let stats = store.stats("u1");
        assert_eq!(stats.node_count, 2);
        assert_eq!(stats.edge_count, 2);
    }
}
