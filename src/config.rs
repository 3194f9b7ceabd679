//! Configuration for the memory core
//!
//! Sensible defaults, overridable in production via `SMRITI_*` environment
//! variables. The host service constructs one [`MemoryConfig`] at startup and
//! hands the pieces to the store and ranker.

use std::env;

use crate::constants::{
    DEFAULT_MAX_NODES_PER_OWNER, DEFAULT_MIN_SIMILARITY, DEFAULT_MMR_LAMBDA,
    DEFAULT_RECENCY_HALF_LIFE_DAYS,
};

/// Graph store limits
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Per-owner node-count ceiling bounding the O(V·E) full-graph scans
    pub max_nodes_per_owner: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_nodes_per_owner: DEFAULT_MAX_NODES_PER_OWNER,
        }
    }
}

impl GraphConfig {
    /// Load from environment variables
    ///
    /// - `SMRITI_MAX_NODES_PER_OWNER`: per-owner node ceiling
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(n) = env_parse::<usize>("SMRITI_MAX_NODES_PER_OWNER") {
            if n > 0 {
                config.max_nodes_per_owner = n;
            }
        }
        config
    }
}

/// Ranker defaults applied when a caller does not override per request
#[derive(Debug, Clone)]
pub struct RankerConfig {
    /// Similarity cutoff below which candidates are discarded
    pub min_similarity: f32,

    /// Recency half-life in days for time decay
    pub half_life_days: f64,

    /// Relevance/diversity trade-off for MMR re-ranking
    pub mmr_lambda: f32,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            min_similarity: DEFAULT_MIN_SIMILARITY,
            half_life_days: DEFAULT_RECENCY_HALF_LIFE_DAYS,
            mmr_lambda: DEFAULT_MMR_LAMBDA,
        }
    }
}

impl RankerConfig {
    /// Load from environment variables
    ///
    /// - `SMRITI_MIN_SIMILARITY`: similarity cutoff in [0, 1]
    /// - `SMRITI_RECENCY_HALF_LIFE_DAYS`: recency half-life in days
    /// - `SMRITI_MMR_LAMBDA`: MMR lambda in [0, 1]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = env_parse::<f32>("SMRITI_MIN_SIMILARITY") {
            if (0.0..=1.0).contains(&v) {
                config.min_similarity = v;
            }
        }
        if let Some(v) = env_parse::<f64>("SMRITI_RECENCY_HALF_LIFE_DAYS") {
            if v > 0.0 {
                config.half_life_days = v;
            }
        }
        if let Some(v) = env_parse::<f32>("SMRITI_MMR_LAMBDA") {
            if (0.0..=1.0).contains(&v) {
                config.mmr_lambda = v;
            }
        }
        config
    }
}

/// Top-level configuration for the memory core
#[derive(Debug, Clone, Default)]
pub struct MemoryConfig {
    pub graph: GraphConfig,
    pub ranker: RankerConfig,
}

impl MemoryConfig {
    /// Load all sections from the environment and log the effective values
    pub fn from_env() -> Self {
        let config = Self {
            graph: GraphConfig::from_env(),
            ranker: RankerConfig::from_env(),
        };
        tracing::info!(
            max_nodes_per_owner = config.graph.max_nodes_per_owner,
            min_similarity = config.ranker.min_similarity,
            half_life_days = config.ranker.half_life_days,
            mmr_lambda = config.ranker.mmr_lambda,
            "memory core configuration loaded"
        );
        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}
