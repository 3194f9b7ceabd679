//! Graph traversal over store snapshots
//!
//! Breadth-first traversal, fewest-hop shortest path, bounded subgraph
//! extraction and degree-centrality ranking. All operations clone a snapshot
//! of the owner's graph up front instead of holding the store lock across
//! their scans, and every operation is bounded by an explicit depth or node
//! cap.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use uuid::Uuid;

use crate::constants::{
    DEFAULT_CENTRALITY_LIMIT, DEFAULT_SHORTEST_PATH_DEPTH, DEFAULT_SUBGRAPH_MAX_NODES,
    DEFAULT_SUBGRAPH_MIN_WEIGHT, DEFAULT_TRAVERSE_DEPTH, DEFAULT_TRAVERSE_MIN_WEIGHT,
};
use crate::errors::Result;
use crate::graph::{GraphStore, Node, NodeType, RelationKind};

/// Options for [`traverse`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraverseOptions {
    /// Maximum hop distance from the start node
    pub max_depth: usize,

    /// Follow only these relation kinds; `None` follows all
    pub kinds: Option<Vec<RelationKind>>,

    /// Prune edges below this weight
    pub min_weight: f32,
}

impl Default for TraverseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_TRAVERSE_DEPTH,
            kinds: None,
            min_weight: DEFAULT_TRAVERSE_MIN_WEIGHT,
        }
    }
}

/// One node reached by [`traverse`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraversalEntry {
    /// The reached node
    pub node: Node,

    /// Hop distance from the start node
    pub depth: usize,

    /// Node ids from the start node to this node, inclusive
    pub path: Vec<Uuid>,
}

/// Result of [`find_shortest_path`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathResult {
    /// Whether a path was found within the hop bound
    pub found: bool,

    /// Node ids from source to target, inclusive; empty when not found
    pub path: Vec<Uuid>,

    /// Path length in hops; 0 when not found or source == target
    pub length: usize,
}

impl PathResult {
    fn not_found() -> Self {
        Self {
            found: false,
            path: Vec::new(),
            length: 0,
        }
    }
}

/// Edge in an extracted subgraph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubgraphEdge {
    pub source: Uuid,
    pub target: Uuid,
    pub kind: RelationKind,
    pub weight: f32,
}

/// Bounded neighborhood extracted by [`extract_subgraph`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subgraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<SubgraphEdge>,
}

/// One entry in a centrality ranking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CentralityEntry {
    pub node: Node,

    /// Degree centrality: `(weighted_out_degree + weighted_in_degree) / 2`
    pub centrality: f32,
}

/// Breadth-first traversal from `start`
///
/// Returns `{node, depth, path}` entries for every node reachable within
/// `max_depth` hops over edges passing the weight and kind filters. The start
/// node itself is never included.
pub fn traverse(
    store: &GraphStore,
    owner: &str,
    start: &Uuid,
    opts: &TraverseOptions,
) -> Result<Vec<TraversalEntry>> {
    // Surfaces Authorization/NotFound before the snapshot scan.
    store.get_node(owner, start)?;
    let graph = store.snapshot(owner);

    let mut results = Vec::new();
    let mut visited: HashSet<Uuid> = HashSet::from([*start]);
    let mut queue: VecDeque<(Uuid, usize, Vec<Uuid>)> = VecDeque::new();
    queue.push_back((*start, 0, vec![*start]));

    while let Some((current, depth, path)) = queue.pop_front() {
        if depth >= opts.max_depth {
            continue;
        }
        let Some(node) = graph.get(&current) else {
            continue;
        };

        for edge in &node.edges {
            if edge.weight < opts.min_weight {
                continue;
            }
            if let Some(kinds) = &opts.kinds {
                if !kinds.contains(&edge.kind) {
                    continue;
                }
            }
            if !visited.insert(edge.target) {
                continue;
            }
            let Some(neighbor) = graph.get(&edge.target) else {
                continue;
            };

            let mut next_path = path.clone();
            next_path.push(edge.target);
            results.push(TraversalEntry {
                node: neighbor.clone(),
                depth: depth + 1,
                path: next_path.clone(),
            });
            queue.push_back((edge.target, depth + 1, next_path));
        }
    }

    tracing::trace!(owner, %start, reached = results.len(), "traversal complete");
    Ok(results)
}

/// Fewest-hop path between two nodes via breadth-first search
///
/// Unweighted on purpose: hop count, not edge weight, defines "shortest"
/// here, while weight-aware scoring lives in the relationship scorer.
/// Returns `found: false` if no path exists within `max_depth` hops.
pub fn find_shortest_path(
    store: &GraphStore,
    owner: &str,
    source: &Uuid,
    target: &Uuid,
    max_depth: Option<usize>,
) -> Result<PathResult> {
    store.get_node(owner, source)?;
    store.get_node(owner, target)?;
    let max_depth = max_depth.unwrap_or(DEFAULT_SHORTEST_PATH_DEPTH);

    if source == target {
        return Ok(PathResult {
            found: true,
            path: vec![*source],
            length: 0,
        });
    }

    let graph = store.snapshot(owner);
    let mut visited: HashSet<Uuid> = HashSet::from([*source]);
    let mut queue: VecDeque<Vec<Uuid>> = VecDeque::from([vec![*source]]);

    while let Some(path) = queue.pop_front() {
        let hops = path.len() - 1;
        if hops >= max_depth {
            continue;
        }
        let current = *path.last().expect("paths are never empty");
        let Some(node) = graph.get(&current) else {
            continue;
        };

        for edge in &node.edges {
            if !visited.insert(edge.target) {
                continue;
            }
            let mut next_path = path.clone();
            next_path.push(edge.target);
            if edge.target == *target {
                return Ok(PathResult {
                    found: true,
                    length: next_path.len() - 1,
                    path: next_path,
                });
            }
            queue.push_back(next_path);
        }
    }

    Ok(PathResult::not_found())
}

/// Grow a bounded subgraph from `seed`
///
/// Breadth-first growth following only edges with weight ≥ `min_weight`,
/// capped at `max_nodes` nodes including the seed. The edge list contains
/// every qualifying edge between included nodes.
pub fn extract_subgraph(
    store: &GraphStore,
    owner: &str,
    seed: &Uuid,
    min_weight: Option<f32>,
    max_nodes: Option<usize>,
) -> Result<Subgraph> {
    store.get_node(owner, seed)?;
    let min_weight = min_weight.unwrap_or(DEFAULT_SUBGRAPH_MIN_WEIGHT);
    let max_nodes = max_nodes.unwrap_or(DEFAULT_SUBGRAPH_MAX_NODES);
    let graph = store.snapshot(owner);

    let mut included: HashSet<Uuid> = HashSet::from([*seed]);
    let mut order: Vec<Uuid> = vec![*seed];
    let mut queue: VecDeque<Uuid> = VecDeque::from([*seed]);

    while let Some(current) = queue.pop_front() {
        if included.len() >= max_nodes {
            break;
        }
        let Some(node) = graph.get(&current) else {
            continue;
        };
        for edge in &node.edges {
            if edge.weight < min_weight || included.contains(&edge.target) {
                continue;
            }
            if included.len() >= max_nodes {
                break;
            }
            if graph.contains_key(&edge.target) {
                included.insert(edge.target);
                order.push(edge.target);
                queue.push_back(edge.target);
            }
        }
    }

    let mut edges = Vec::new();
    for id in &order {
        let node = &graph[id];
        for edge in &node.edges {
            if edge.weight >= min_weight && included.contains(&edge.target) {
                edges.push(SubgraphEdge {
                    source: *id,
                    target: edge.target,
                    kind: edge.kind,
                    weight: edge.weight,
                });
            }
        }
    }

    let nodes = order.iter().map(|id| graph[id].clone()).collect();
    Ok(Subgraph { nodes, edges })
}

/// Rank an owner's nodes by degree centrality
///
/// Centrality = `(weighted_out_degree + weighted_in_degree) / 2`, computed by
/// one full scan of the owner's graph. Optionally restricted to one node
/// type; returns the top `limit` entries, highest first.
pub fn rank_by_centrality(
    store: &GraphStore,
    owner: &str,
    type_filter: Option<NodeType>,
    limit: Option<usize>,
) -> Vec<CentralityEntry> {
    let limit = limit.unwrap_or(DEFAULT_CENTRALITY_LIMIT);
    let graph = store.snapshot(owner);

    // One pass accumulates inbound weight for every node.
    let mut in_degree: HashMap<Uuid, f32> = HashMap::new();
    for node in graph.values() {
        for edge in &node.edges {
            *in_degree.entry(edge.target).or_insert(0.0) += edge.weight;
        }
    }

    let mut entries: Vec<CentralityEntry> = graph
        .values()
        .filter(|node| type_filter.map_or(true, |t| node.node_type == t))
        .map(|node| {
            let out = node.weighted_out_degree();
            let inbound = in_degree.get(&node.id).copied().unwrap_or(0.0);
            CentralityEntry {
                node: node.clone(),
                centrality: (out + inbound) / 2.0,
            }
        })
        .collect();

    entries.sort_by_key(|e| std::cmp::Reverse(OrderedFloat(e.centrality)));
    entries.truncate(limit);
    entries
}
