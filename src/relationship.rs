//! Pairwise relationship strength and connection suggestions
//!
//! Strength blends the direct and reverse edge weights with the Jaccard
//! overlap of the two nodes' out-neighborhoods, so a pair can score high
//! either through explicit relations or through shared context.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::constants::{
    STRENGTH_DIRECT_WEIGHT, STRENGTH_JACCARD_WEIGHT, STRENGTH_REVERSE_WEIGHT,
    SUGGESTION_SAME_TYPE_FALLBACK,
};
use crate::errors::Result;
use crate::graph::{GraphStore, Node};
use crate::validation::validate_limit;

/// A suggested new connection for a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionSuggestion {
    /// Candidate node to connect to
    pub node: Node,

    /// Suggestion score in [0, 1]
    pub score: f32,

    /// Out-edge targets shared with the source node
    pub shared_neighbors: usize,
}

/// Compute pairwise relationship strength between two nodes
///
/// `strength = 0.4·direct + 0.3·reverse + 0.3·jaccard(out-neighbors)`, where
/// the direct/reverse terms are the edge weights in each direction (0 if
/// absent) and Jaccard is computed over each node's out-edge target sets.
pub fn relationship_strength(
    store: &GraphStore,
    owner: &str,
    source: &Uuid,
    target: &Uuid,
) -> Result<f32> {
    let source_node = store.get_node(owner, source)?;
    let target_node = store.get_node(owner, target)?;

    let direct = source_node.edge_to(target).map_or(0.0, |e| e.weight);
    let reverse = target_node.edge_to(source).map_or(0.0, |e| e.weight);
    let jaccard = jaccard_overlap(&source_node, &target_node);

    Ok(STRENGTH_DIRECT_WEIGHT * direct
        + STRENGTH_REVERSE_WEIGHT * reverse
        + STRENGTH_JACCARD_WEIGHT * jaccard)
}

/// Jaccard similarity of two nodes' out-edge target sets
fn jaccard_overlap(a: &Node, b: &Node) -> f32 {
    let targets_a: HashSet<Uuid> = a.edges.iter().map(|e| e.target).collect();
    let targets_b: HashSet<Uuid> = b.edges.iter().map(|e| e.target).collect();

    if targets_a.is_empty() && targets_b.is_empty() {
        return 0.0;
    }

    let intersection = targets_a.intersection(&targets_b).count();
    let union = targets_a.union(&targets_b).count();
    intersection as f32 / union as f32
}

/// Suggest connections for `node` from the owner's graph
///
/// Candidates sharing at least one out-edge target score
/// `shared / candidate_out_degree`; candidates of the same node type with no
/// shared neighbors receive a flat fallback of 0.3. Everything else is
/// excluded. Results are sorted by descending score.
pub fn suggest_connections(
    store: &GraphStore,
    owner: &str,
    node_id: &Uuid,
    limit: usize,
) -> Result<Vec<ConnectionSuggestion>> {
    validate_limit(limit)?;
    let node = store.get_node(owner, node_id)?;
    let graph = store.snapshot(owner);

    let own_targets: HashSet<Uuid> = node.edges.iter().map(|e| e.target).collect();

    let mut suggestions: Vec<ConnectionSuggestion> = graph
        .values()
        .filter(|candidate| candidate.id != *node_id)
        .filter_map(|candidate| {
            let shared = candidate
                .edges
                .iter()
                .filter(|e| own_targets.contains(&e.target))
                .count();

            let score = if shared > 0 {
                shared as f32 / candidate.edges.len() as f32
            } else if candidate.node_type == node.node_type {
                SUGGESTION_SAME_TYPE_FALLBACK
            } else {
                return None;
            };

            Some(ConnectionSuggestion {
                node: candidate.clone(),
                score,
                shared_neighbors: shared,
            })
        })
        .collect();

    suggestions.sort_by_key(|s| std::cmp::Reverse(OrderedFloat(s.score)));
    suggestions.truncate(limit);
    Ok(suggestions)
}
