//! Retrieval Pipeline Tests
//!
//! End-to-end flow: fuse multi-modal vectors, store the result with dedup,
//! rank the candidate pool against a query, re-rank with MMR.

use smriti_memory::chrono::{Duration, Utc};
use smriti_memory::embedding_store::{ContentType, EmbeddingStore, RecordDraft};
use smriti_memory::fusion::{fuse, FusionStrategy, Modality, ModalityVector};
use smriti_memory::ranker::{mmr_rerank, rank, rank_multi, RankerOptions};

const OWNER: &str = "retrieval-user";

fn draft(hash: &str, vector: Vec<f32>, quality: f32) -> RecordDraft {
    RecordDraft {
        owner_id: OWNER.to_string(),
        vector,
        model_id: "clip-vit".to_string(),
        content_type: ContentType::Multimodal,
        content_hash: hash.to_string(),
        source_ref: None,
        expires_at: None,
        quality_score: quality,
        domain: None,
    }
}

#[test]
fn weighted_concat_preserves_dimensions_and_unit_norm() {
    // A 1536-d text vector and a 512-d image vector concatenate to 2048.
    let text = ModalityVector::new(Modality::Text, vec![0.5; 1536]);
    let image = ModalityVector::new(Modality::Image, vec![0.25; 512]);

    let fused = fuse(&[image, text], FusionStrategy::WeightedConcat).unwrap();

    assert_eq!(fused.dimension, 2048);
    assert_eq!(fused.vector.len(), 2048);
    let norm: f32 = fused.vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-4);
    // Concatenation order is fixed by modality, not by input order.
    assert!(fused.vector[0] != 0.0);
    assert!(fused.confidence <= 0.95);
}

#[test]
fn fused_output_flows_into_the_store_and_ranker() {
    let store = EmbeddingStore::new();

    let fused = fuse(
        &[
            ModalityVector::new(Modality::Text, vec![1.0, 0.0]),
            ModalityVector::new(Modality::Image, vec![0.9, 0.1]),
        ],
        FusionStrategy::Average,
    )
    .unwrap();

    let hash = EmbeddingStore::content_hash(b"morning run note + photo");
    store
        .store(draft(&hash, fused.vector.clone(), fused.confidence))
        .unwrap();
    store
        .store(draft("other", vec![0.0, 1.0], 0.9))
        .unwrap();

    let candidates = store.candidates_for(OWNER);
    let results = rank(&fused.vector, &candidates, &RankerOptions::default()).unwrap();

    // Only the fused record clears the similarity floor against itself.
    assert_eq!(results.len(), 1);
    assert!(results[0].similarity > 0.999);
}

#[test]
fn storing_identical_content_twice_keeps_one_record() {
    let store = EmbeddingStore::new();
    let hash = EmbeddingStore::content_hash(b"same photo");

    let first = store.store(draft(&hash, vec![1.0, 0.0], 0.8)).unwrap();
    let second = store.store(draft(&hash, vec![0.8, 0.2], 0.9)).unwrap();

    assert!(second.deduplicated);
    assert_eq!(first.id, second.id);
    assert_eq!(store.record_count(OWNER), 1);
    // The later store refreshed the vector and quality.
    let record = store.get(OWNER, &first.id).unwrap();
    assert_eq!(record.vector, vec![0.8, 0.2]);
    assert!((record.quality_score - 0.9).abs() < 1e-6);
}

#[test]
fn batch_with_bad_item_reports_but_stores_the_rest() {
    let store = EmbeddingStore::new();
    let batch = vec![
        draft("a", vec![1.0, 0.0], 1.0),
        draft("b", vec![], 1.0), // empty vector, rejected
        draft("c", vec![0.0, 1.0], 1.2), // confidence out of range
        draft("d", vec![0.5, 0.5], 0.7),
    ];

    let outcomes = store.store_batch(batch).unwrap();
    assert_eq!(outcomes.len(), 4);
    assert!(outcomes[0].stored.is_some());
    assert_eq!(outcomes[1].error.as_ref().unwrap().code, "VALIDATION");
    assert_eq!(outcomes[2].error.as_ref().unwrap().code, "VALIDATION");
    assert!(outcomes[3].stored.is_some());
    assert_eq!(store.record_count(OWNER), 2);
}

#[test]
fn recency_separates_equal_matches() {
    let store = EmbeddingStore::new();
    store.store(draft("fresh", vec![1.0, 0.0], 0.8)).unwrap();
    let stale_id = {
        let outcome = store.store(draft("stale", vec![1.0, 0.0], 0.8)).unwrap();
        outcome.id
    };

    // candidates_for returns clones, so backdate the stale record there.
    let mut candidates = store.candidates_for(OWNER);
    for record in &mut candidates {
        if record.id == stale_id {
            record.created_at = Utc::now() - Duration::days(120);
        }
    }

    let results = rank(&[1.0, 0.0], &candidates, &RankerOptions::default()).unwrap();
    assert_eq!(results.len(), 2);
    assert_ne!(results[0].record.id, stale_id);
    assert!(results[0].score > results[1].score);
}

#[test]
fn multi_query_surfaces_cross_cluster_records() {
    let store = EmbeddingStore::new();
    store.store(draft("both", vec![1.0, 1.0], 0.8)).unwrap();
    store.store(draft("x", vec![1.0, 0.05], 0.8)).unwrap();
    store.store(draft("y", vec![0.05, 1.0], 0.8)).unwrap();

    let opts = RankerOptions {
        min_similarity: 0.6,
        ..Default::default()
    };
    let queries = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
    let results = rank_multi(&queries, &store.candidates_for(OWNER), &opts).unwrap();

    assert_eq!(results[0].record.content_hash, "both");
}

#[test]
fn mmr_first_pick_matches_plain_ranking() {
    let store = EmbeddingStore::new();
    store.store(draft("a", vec![1.0, 0.0, 0.0], 1.0)).unwrap();
    store.store(draft("b", vec![0.9, 0.1, 0.0], 0.4)).unwrap();
    store.store(draft("c", vec![0.6, 0.0, 0.4], 0.9)).unwrap();

    let opts = RankerOptions {
        min_similarity: 0.0,
        ..Default::default()
    };
    let ranked = rank(&[1.0, 0.0, 0.0], &store.candidates_for(OWNER), &opts).unwrap();
    let reranked = mmr_rerank(&ranked, Some(0.4), 2).unwrap();

    assert_eq!(reranked[0].record.id, ranked[0].record.id);
    assert_eq!(reranked.len(), 2);
}

#[test]
fn dimension_mismatch_in_pool_fails_loud() {
    let store = EmbeddingStore::new();
    store.store(draft("2d", vec![1.0, 0.0], 1.0)).unwrap();
    store.store(draft("3d", vec![1.0, 0.0, 0.0], 1.0)).unwrap();

    let err = rank(
        &[1.0, 0.0],
        &store.candidates_for(OWNER),
        &RankerOptions::default(),
    )
    .unwrap_err();
    assert_eq!(err.code(), "DIMENSION_MISMATCH");
}

#[test]
fn attention_fusion_handles_mixed_dimensions() {
    let inputs = vec![
        ModalityVector::with_weight(Modality::Text, vec![1.0; 768], 0.7),
        ModalityVector::with_weight(Modality::Audio, vec![0.5; 256], 0.3),
    ];
    let fused = fuse(&inputs, FusionStrategy::Attention).unwrap();

    // Projected up to the widest input.
    assert_eq!(fused.dimension, 768);
    let norm: f32 = fused.vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-4);
}
