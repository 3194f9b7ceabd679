//! Smriti-Memory Library
//!
//! Per-user personalized semantic memory core: a typed knowledge graph of
//! entities, topics and events linked by weighted relations, plus a
//! retrieval engine ranking stored multi-modal embedding vectors against a
//! query vector.
//!
//! # Key Features
//! - Owner-scoped knowledge graph with soft edge reinforcement and
//!   attention-biased strengthening
//! - BFS traversal, fewest-hop shortest path, bounded subgraph extraction,
//!   degree-centrality ranking
//! - Multi-modal embedding fusion (weighted-concat, attention, average)
//! - Weighted similarity ranking with recency decay, domain boosts and MMR
//!   diversity re-ranking
//! - Content-hash deduplicated embedding storage with per-item batch
//!   manifests
//!
//! # Boundaries
//! Authentication, consent filtering, event ingestion, durable storage and
//! embedding-model inference are external collaborators. This core consumes
//! and produces opaque fixed-length vectors and already-materialized graph
//! data; every operation is synchronous and bounded.

pub mod config;
pub mod constants;
pub mod embedding_store;
pub mod errors;
pub mod fusion;
pub mod graph;
pub mod ranker;
pub mod relationship;
pub mod tracing_setup;
pub mod traversal;
pub mod validation;
pub mod vector_math;

// Re-export dependencies to ensure tests/benchmarks use the same version
pub use chrono;
pub use parking_lot;
pub use uuid;

pub use config::{GraphConfig, MemoryConfig, RankerConfig};
pub use embedding_store::{
    BatchItemOutcome, ContentType, EmbeddingRecord, EmbeddingStore, RecordDraft, StoreOutcome,
};
pub use errors::{MemoryError, Result};
pub use fusion::{fuse, FusedEmbedding, FusionStrategy, Modality, ModalityVector};
pub use graph::{Edge, GraphStats, GraphStore, Node, NodeDraft, NodePatch, NodeType, RelationKind};
pub use ranker::{mmr_rerank, rank, rank_multi, RankedResult, RankerOptions, SearchWeights};
pub use relationship::{relationship_strength, suggest_connections, ConnectionSuggestion};
pub use traversal::{
    extract_subgraph, find_shortest_path, rank_by_centrality, traverse, CentralityEntry,
    PathResult, Subgraph, SubgraphEdge, TraversalEntry, TraverseOptions,
};
