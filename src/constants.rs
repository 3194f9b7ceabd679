//! Documented constants for the memory core
//!
//! All tunable parameters live here with their role in the scoring and graph
//! formulas. Centralizing constants prevents magic numbers and makes tuning
//! easier.

// =============================================================================
// GRAPH EDGE CONSTANTS
// =============================================================================

/// Reinforcement factor applied when an existing edge is re-created
///
/// Re-creating edge A→B with weight w adds only `w * 0.1` to the stored
/// weight (clamped to 1.0). Repeated interaction events therefore strengthen
/// a relation asymptotically instead of growing without bound.
pub const EDGE_REINFORCEMENT_FACTOR: f32 = 0.1;

/// Default increment for `strengthen_edge`
pub const EDGE_STRENGTHEN_INCREMENT: f32 = 0.05;

/// Multiplicative decay applied to a node's *other* out-edges when one edge
/// is strengthened
///
/// Models limited attention across a node's relations: attention paid to one
/// neighbor slightly dims all the others.
pub const EDGE_SIBLING_DECAY: f32 = 0.99;

/// Default per-owner node-count ceiling
///
/// Merge, delete-cascade and centrality are O(V·E) full-graph scans per
/// owner; the ceiling keeps them bounded. Override with
/// `SMRITI_MAX_NODES_PER_OWNER`.
pub const DEFAULT_MAX_NODES_PER_OWNER: usize = 10_000;

// =============================================================================
// TRAVERSAL DEFAULTS
// =============================================================================

/// Default BFS depth for `traverse`
pub const DEFAULT_TRAVERSE_DEPTH: usize = 2;

/// Default minimum edge weight followed by `traverse`
pub const DEFAULT_TRAVERSE_MIN_WEIGHT: f32 = 0.1;

/// Default hop bound for `find_shortest_path`
pub const DEFAULT_SHORTEST_PATH_DEPTH: usize = 5;

/// Default minimum edge weight for `extract_subgraph`
pub const DEFAULT_SUBGRAPH_MIN_WEIGHT: f32 = 0.3;

/// Default node cap for `extract_subgraph`
pub const DEFAULT_SUBGRAPH_MAX_NODES: usize = 50;

/// Default result count for `rank_by_centrality`
pub const DEFAULT_CENTRALITY_LIMIT: usize = 10;

// =============================================================================
// RELATIONSHIP SCORING WEIGHTS
// Components of pairwise relationship strength; must sum to 1.0.
// =============================================================================

/// Weight of the direct edge (source → target)
pub const STRENGTH_DIRECT_WEIGHT: f32 = 0.4;

/// Weight of the reverse edge (target → source)
pub const STRENGTH_REVERSE_WEIGHT: f32 = 0.3;

/// Weight of out-neighbor Jaccard overlap
pub const STRENGTH_JACCARD_WEIGHT: f32 = 0.3;

/// Fallback score for same-type candidates with no shared neighbors
pub const SUGGESTION_SAME_TYPE_FALLBACK: f32 = 0.3;

// =============================================================================
// EMBEDDING FUSION CONSTANTS
// =============================================================================

/// Default modality weights when the caller does not supply one
///
/// Text dominates because it carries the most semantic signal in typical
/// personal-memory workloads; video contributes least per unit cost.
pub const DEFAULT_TEXT_WEIGHT: f32 = 0.4;
pub const DEFAULT_IMAGE_WEIGHT: f32 = 0.3;
pub const DEFAULT_AUDIO_WEIGHT: f32 = 0.2;
pub const DEFAULT_VIDEO_WEIGHT: f32 = 0.1;

/// Base fusion confidence before modality and weight bonuses
pub const FUSION_BASE_CONFIDENCE: f32 = 0.7;

/// Confidence bonus per contributing modality (capped)
pub const FUSION_MODALITY_BONUS: f32 = 0.1;

/// Cap on the total modality-count bonus
pub const FUSION_MODALITY_BONUS_CAP: f32 = 0.3;

/// Coefficient on the average modality weight in the confidence formula
pub const FUSION_WEIGHT_BONUS: f32 = 0.1;

/// Hard ceiling on fusion confidence
pub const FUSION_CONFIDENCE_CEILING: f32 = 0.95;

// =============================================================================
// SIMILARITY RANKING DEFAULTS
// =============================================================================

/// Default similarity cutoff; candidates scoring below this are discarded
pub const DEFAULT_MIN_SIMILARITY: f32 = 0.5;

/// Default recency half-life in days
///
/// `recency = 0.5^(age_days / half_life_days)` — a 30-day half-life keeps a
/// month-old record at half its recency credit.
pub const DEFAULT_RECENCY_HALF_LIFE_DAYS: f64 = 30.0;

/// Default weight of cosine similarity in the fused score
pub const DEFAULT_SIMILARITY_WEIGHT: f32 = 0.6;

/// Default weight of record confidence in the fused score
pub const DEFAULT_CONFIDENCE_WEIGHT: f32 = 0.3;

/// Default weight of recency in the fused score
pub const DEFAULT_RECENCY_WEIGHT: f32 = 0.1;

/// Search weights must sum to 1.0 within this tolerance
pub const SEARCH_WEIGHT_SUM_TOLERANCE: f32 = 0.01;

/// Hard cap on ranked results regardless of requested limit
pub const MAX_SEARCH_RESULTS: usize = 100;

/// Default result count when the caller does not specify a limit
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Score boost applied when a record reappears across query clusters
///
/// Accumulation is `score += 0.5 * new_score` rather than overwrite, so a
/// record matching several query vectors outranks a single strong match.
pub const MULTI_QUERY_REPEAT_BOOST: f32 = 0.5;

/// Default relevance/diversity trade-off for MMR re-ranking
pub const DEFAULT_MMR_LAMBDA: f32 = 0.5;

// =============================================================================
// EMBEDDING STORE LIMITS
// =============================================================================

/// Maximum accepted embedding dimension
pub const MAX_EMBEDDING_DIMENSION: usize = 8192;

/// Maximum items per batch store call
pub const MAX_BATCH_SIZE: usize = 1_000;
