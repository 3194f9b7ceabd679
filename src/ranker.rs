//! Weighted similarity ranking with MMR diversity re-ranking
//!
//! Scores a pre-filtered candidate set of embedding records against a query
//! vector. Namespace/content-type/domain/tag filtering and exclusion lists
//! are the caller's job; this engine only fuses similarity, record
//! confidence and recency into one score, applies domain boosts, and
//! optionally re-ranks for diversity.

use chrono::Utc;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::config::RankerConfig;
use crate::constants::{
    DEFAULT_CONFIDENCE_WEIGHT, DEFAULT_MIN_SIMILARITY, DEFAULT_MMR_LAMBDA,
    DEFAULT_RECENCY_HALF_LIFE_DAYS, DEFAULT_RECENCY_WEIGHT, DEFAULT_SEARCH_LIMIT,
    DEFAULT_SIMILARITY_WEIGHT, MAX_SEARCH_RESULTS, MULTI_QUERY_REPEAT_BOOST,
};
use crate::embedding_store::EmbeddingRecord;
use crate::errors::Result;
use crate::validation::{validate_limit, validate_vector, validate_weight_sum};
use crate::vector_math::cosine_similarity;

/// Weights fusing similarity, confidence and recency into one score
///
/// Must sum to 1.0 within tolerance; validated on every ranking call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SearchWeights {
    /// Weight of cosine similarity to the query
    pub similarity: f32,

    /// Weight of the record's quality/confidence score
    pub confidence: f32,

    /// Weight of recency decay
    pub recency: f32,
}

impl Default for SearchWeights {
    fn default() -> Self {
        Self {
            similarity: DEFAULT_SIMILARITY_WEIGHT,
            confidence: DEFAULT_CONFIDENCE_WEIGHT,
            recency: DEFAULT_RECENCY_WEIGHT,
        }
    }
}

impl SearchWeights {
    fn validate(&self) -> Result<()> {
        validate_weight_sum(&[self.similarity, self.confidence, self.recency])
    }
}

/// Options for one ranking call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankerOptions {
    /// Candidates scoring below this cosine similarity are discarded
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f32,

    /// Whether recency decay contributes to the score
    #[serde(default = "default_true")]
    pub time_decay: bool,

    /// Recency half-life in days
    #[serde(default = "default_half_life")]
    pub half_life_days: f64,

    /// Score fusion weights
    #[serde(default)]
    pub weights: SearchWeights,

    /// Per-domain score multipliers: `score *= 1 + boost` on a domain match
    #[serde(default)]
    pub domain_boosts: HashMap<String, f32>,

    /// Requested result count, capped at [`MAX_SEARCH_RESULTS`]
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_min_similarity() -> f32 {
    DEFAULT_MIN_SIMILARITY
}

fn default_true() -> bool {
    true
}

fn default_half_life() -> f64 {
    DEFAULT_RECENCY_HALF_LIFE_DAYS
}

fn default_limit() -> usize {
    DEFAULT_SEARCH_LIMIT
}

impl Default for RankerOptions {
    fn default() -> Self {
        Self {
            min_similarity: DEFAULT_MIN_SIMILARITY,
            time_decay: true,
            half_life_days: DEFAULT_RECENCY_HALF_LIFE_DAYS,
            weights: SearchWeights::default(),
            domain_boosts: HashMap::new(),
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl RankerOptions {
    /// Build options from deployment configuration defaults
    pub fn from_config(config: &RankerConfig) -> Self {
        Self {
            min_similarity: config.min_similarity,
            half_life_days: config.half_life_days,
            ..Default::default()
        }
    }
}

/// One ranked candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedResult {
    /// The candidate record
    pub record: EmbeddingRecord,

    /// Raw cosine similarity to the query
    pub similarity: f32,

    /// Recency decay factor in (0, 1]; 1.0 when time decay is disabled
    pub recency: f32,

    /// Fused score in [0, 1] (multi-query accumulation may exceed 1)
    pub score: f32,
}

/// Rank candidates against a single query vector
///
/// 1. Cosine similarity; discard below `min_similarity`.
/// 2. `recency = 0.5^(age_days / half_life_days)` when time decay is on.
/// 3. Fuse `similarity·w_s + confidence·w_c + recency·w_r`, apply the
///    domain boost if one is configured for the record's domain, clamp to
///    [0, 1].
/// 4. Sort descending, return the top `min(limit, 100)`.
pub fn rank(
    query: &[f32],
    candidates: &[EmbeddingRecord],
    opts: &RankerOptions,
) -> Result<Vec<RankedResult>> {
    validate_vector(query)?;
    validate_limit(opts.limit)?;
    opts.weights.validate()?;

    let now = Utc::now();
    let mut results = Vec::new();

    for record in candidates {
        let similarity = cosine_similarity(query, &record.vector)?;
        if similarity < opts.min_similarity {
            continue;
        }

        let recency = if opts.time_decay {
            let age_days =
                (now - record.created_at).num_seconds().max(0) as f64 / 86_400.0;
            0.5_f64.powf(age_days / opts.half_life_days) as f32
        } else {
            1.0
        };

        let mut score = similarity * opts.weights.similarity
            + record.quality_score * opts.weights.confidence
            + recency * opts.weights.recency;

        if let Some(domain) = &record.domain {
            if let Some(boost) = opts.domain_boosts.get(domain) {
                score *= 1.0 + boost;
            }
        }

        results.push(RankedResult {
            record: record.clone(),
            similarity,
            recency,
            score: score.clamp(0.0, 1.0),
        });
    }

    results.sort_by_key(|r| std::cmp::Reverse(OrderedFloat(r.score)));
    results.truncate(opts.limit.min(MAX_SEARCH_RESULTS));

    tracing::trace!(
        candidates = candidates.len(),
        returned = results.len(),
        "ranked candidates"
    );
    Ok(results)
}

/// Rank against a set of query vectors, accumulating across result sets
///
/// Each query is ranked independently; when a record reappears in a later
/// result set its accumulated score is boosted by `0.5 · new_score` instead
/// of overwritten, so records matching several query clusters rise to the
/// top. The merged list is re-sorted and capped like a single-query rank.
pub fn rank_multi(
    queries: &[Vec<f32>],
    candidates: &[EmbeddingRecord],
    opts: &RankerOptions,
) -> Result<Vec<RankedResult>> {
    let mut merged: HashMap<Uuid, RankedResult> = HashMap::new();

    for query in queries {
        for result in rank(query, candidates, opts)? {
            match merged.get_mut(&result.record.id) {
                Some(existing) => {
                    existing.score += MULTI_QUERY_REPEAT_BOOST * result.score;
                    if result.similarity > existing.similarity {
                        existing.similarity = result.similarity;
                    }
                }
                None => {
                    merged.insert(result.record.id, result);
                }
            }
        }
    }

    let mut results: Vec<RankedResult> = merged.into_values().collect();
    results.sort_by_key(|r| std::cmp::Reverse(OrderedFloat(r.score)));
    results.truncate(opts.limit.min(MAX_SEARCH_RESULTS));
    Ok(results)
}

/// Maximal Marginal Relevance re-ranking
///
/// Iteratively picks the remaining candidate maximizing
/// `λ·relevance − (1−λ)·penalty` with
/// `penalty = 1 − max_cosine_similarity_to_selected`. With nothing selected
/// yet the penalty is a constant 1.0 for every candidate, so the first pick
/// is always the highest-relevance result. `λ = 1` reduces to pure
/// relevance ordering.
pub fn mmr_rerank(
    results: &[RankedResult],
    lambda: Option<f32>,
    k: usize,
) -> Result<Vec<RankedResult>> {
    let lambda = lambda.unwrap_or(DEFAULT_MMR_LAMBDA).clamp(0.0, 1.0);
    let k = k.min(results.len());

    let mut selected: Vec<RankedResult> = Vec::with_capacity(k);
    let mut remaining: Vec<&RankedResult> = results.iter().collect();

    while selected.len() < k && !remaining.is_empty() {
        let mut best_idx = 0;
        let mut best_score = f32::NEG_INFINITY;

        for (idx, candidate) in remaining.iter().enumerate() {
            let mut max_sim: f32 = 0.0;
            for picked in &selected {
                let sim =
                    cosine_similarity(&candidate.record.vector, &picked.record.vector)?;
                max_sim = max_sim.max(sim);
            }
            let diversity_penalty = 1.0 - max_sim;
            let mmr = lambda * candidate.score - (1.0 - lambda) * diversity_penalty;
            if mmr > best_score {
                best_score = mmr;
                best_idx = idx;
            }
        }

        selected.push(remaining.remove(best_idx).clone());
    }

    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding_store::ContentType;
    use chrono::Duration;

    fn record(vector: Vec<f32>, quality: f32, age_days: i64) -> EmbeddingRecord {
        EmbeddingRecord {
            id: Uuid::new_v4(),
            owner_id: "u1".to_string(),
            dimension: vector.len(),
            vector,
            model_id: "test-model".to_string(),
            content_type: ContentType::Text,
            source_ref: None,
            content_hash: Uuid::new_v4().to_string(),
            created_at: Utc::now() - Duration::days(age_days),
            expires_at: None,
            quality_score: quality,
            domain: None,
        }
    }

    #[test]
    fn test_results_sorted_descending() {
        let candidates = vec![
            record(vec![0.9, 0.1], 0.5, 0),
            record(vec![1.0, 0.0], 0.9, 0),
            record(vec![0.7, 0.3], 0.7, 0),
        ];
        let results = rank(&[1.0, 0.0], &candidates, &RankerOptions::default()).unwrap();
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_min_similarity_discards() {
        let candidates = vec![
            record(vec![1.0, 0.0], 1.0, 0),
            record(vec![0.0, 1.0], 1.0, 0), // orthogonal, sim 0
        ];
        let results = rank(&[1.0, 0.0], &candidates, &RankerOptions::default()).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].similarity > 0.99);
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let opts = RankerOptions {
            weights: SearchWeights {
                similarity: 0.5,
                confidence: 0.2,
                recency: 0.1,
            },
            ..Default::default()
        };
        let err = rank(&[1.0], &[record(vec![1.0], 1.0, 0)], &opts).unwrap_err();
        assert_eq!(err.code(), "VALIDATION");
    }

    #[test]
    fn test_recency_decay_halves_at_half_life() {
        let candidates = vec![record(vec![1.0, 0.0], 1.0, 30)];
        let results = rank(&[1.0, 0.0], &candidates, &RankerOptions::default()).unwrap();
        assert!((results[0].recency - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_time_decay_disabled_is_neutral() {
        let opts = RankerOptions {
            time_decay: false,
            ..Default::default()
        };
        let candidates = vec![record(vec![1.0, 0.0], 1.0, 365)];
        let results = rank(&[1.0, 0.0], &candidates, &opts).unwrap();
        assert_eq!(results[0].recency, 1.0);
    }

    #[test]
    fn test_recency_breaks_ties() {
        let fresh = record(vec![1.0, 0.0], 0.8, 0);
        let stale = record(vec![1.0, 0.0], 0.8, 90);
        let fresh_id = fresh.id;
        let results =
            rank(&[1.0, 0.0], &[stale, fresh], &RankerOptions::default()).unwrap();
        assert_eq!(results[0].record.id, fresh_id);
    }

    #[test]
    fn test_domain_boost_applied() {
        let mut boosted = record(vec![1.0, 0.0], 0.5, 0);
        boosted.domain = Some("work".to_string());
        let boosted_id = boosted.id;
        let plain = record(vec![1.0, 0.0], 0.5, 0);

        let mut opts = RankerOptions::default();
        opts.domain_boosts.insert("work".to_string(), 0.2);

        let results = rank(&[1.0, 0.0], &[plain, boosted], &opts).unwrap();
        assert_eq!(results[0].record.id, boosted_id);
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn test_scores_clamped_to_unit_interval() {
        let mut rec = record(vec![1.0, 0.0], 1.0, 0);
        rec.domain = Some("work".to_string());
        let mut opts = RankerOptions::default();
        opts.domain_boosts.insert("work".to_string(), 5.0);

        let results = rank(&[1.0, 0.0], &[rec], &opts).unwrap();
        assert!(results[0].score <= 1.0);
    }

    #[test]
    fn test_limit_capped_at_hundred() {
        let candidates: Vec<EmbeddingRecord> =
            (0..150).map(|_| record(vec![1.0, 0.0], 1.0, 0)).collect();
        let opts = RankerOptions {
            limit: 500,
            ..Default::default()
        };
        let results = rank(&[1.0, 0.0], &candidates, &opts).unwrap();
        assert_eq!(results.len(), 100);
    }

    #[test]
    fn test_multi_query_repeat_boost() {
        // `both` matches both queries; the singles match one each.
        let both = record(vec![1.0, 1.0], 0.8, 0);
        let only_x = record(vec![1.0, 0.05], 0.8, 0);
        let only_y = record(vec![0.05, 1.0], 0.8, 0);
        let both_id = both.id;

        let opts = RankerOptions {
            min_similarity: 0.6,
            ..Default::default()
        };
        let queries = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let results = rank_multi(&queries, &[both, only_x, only_y], &opts).unwrap();

        assert_eq!(results[0].record.id, both_id);
        // Accumulated score exceeds anything a single query could produce.
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn test_mmr_first_pick_is_max_relevance() {
        let candidates = vec![
            record(vec![1.0, 0.0], 1.0, 0),
            record(vec![0.95, 0.05], 0.3, 0),
            record(vec![0.6, 0.4], 0.9, 0),
        ];
        let opts = RankerOptions {
            min_similarity: 0.0,
            ..Default::default()
        };
        let ranked = rank(&[1.0, 0.0], &candidates, &opts).unwrap();
        let top_id = ranked[0].record.id;

        let reranked = mmr_rerank(&ranked, Some(0.3), 3).unwrap();
        assert_eq!(reranked[0].record.id, top_id);
    }

    #[test]
    fn test_mmr_second_pick_maximizes_objective() {
        let dup = record(vec![0.999, 0.01, 0.0], 0.95, 0);
        let diverse = record(vec![0.5, 0.0, 0.8], 0.9, 0);
        let top = record(vec![1.0, 0.0, 0.0], 1.0, 0);

        let opts = RankerOptions {
            min_similarity: 0.0,
            ..Default::default()
        };
        let ranked = rank(&[1.0, 0.0, 0.0], &[dup, diverse, top], &opts).unwrap();
        let reranked = mmr_rerank(&ranked, Some(0.5), 2).unwrap();
        assert_eq!(reranked.len(), 2);

        // Verify the second pick maximizes λ·score − (1−λ)·(1 − sim_to_first).
        let first = &reranked[0];
        let mut best_id = None;
        let mut best = f32::NEG_INFINITY;
        for candidate in ranked.iter().filter(|r| r.record.id != first.record.id) {
            let sim =
                cosine_similarity(&candidate.record.vector, &first.record.vector).unwrap();
            let objective = 0.5 * candidate.score - 0.5 * (1.0 - sim);
            if objective > best {
                best = objective;
                best_id = Some(candidate.record.id);
            }
        }
        assert_eq!(reranked[1].record.id, best_id.unwrap());
    }

    #[test]
    fn test_mmr_lambda_one_keeps_relevance_order() {
        let candidates = vec![
            record(vec![1.0, 0.0], 1.0, 0),
            record(vec![0.9, 0.1], 0.8, 0),
            record(vec![0.8, 0.2], 0.6, 0),
        ];
        let opts = RankerOptions {
            min_similarity: 0.0,
            ..Default::default()
        };
        let ranked = rank(&[1.0, 0.0], &candidates, &opts).unwrap();
        let reranked = mmr_rerank(&ranked, Some(1.0), 3).unwrap();

        let original: Vec<Uuid> = ranked.iter().map(|r| r.record.id).collect();
        let rr: Vec<Uuid> = reranked.iter().map(|r| r.record.id).collect();
        assert_eq!(original, rr);
    }

    #[test]
    fn test_empty_candidates() {
        let results = rank(&[1.0], &[], &RankerOptions::default()).unwrap();
        assert!(results.is_empty());
        assert!(mmr_rerank(&results, None, 5).unwrap().is_empty());
    }
}
