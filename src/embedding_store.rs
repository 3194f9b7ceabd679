//! Embedding record storage with content-hash dedup
//!
//! Holds the per-owner embedding records the ranker retrieves over. Records
//! are created by the fusion/generation pipeline, updated in place on a
//! content-hash dedup hit, and deleted on expiry sweep or owner-deletion
//! request. Batch storage skips invalid items and reports a per-item outcome
//! manifest instead of aborting the whole batch.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use uuid::Uuid;

use crate::constants::MAX_BATCH_SIZE;
use crate::errors::{ErrorDetail, MemoryError, Result};
use crate::validation::{validate_confidence, validate_owner_id, validate_vector};

/// Content type of an embedding record
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ContentType {
    Text,
    Image,
    Audio,
    Video,
    Multimodal,
}

impl ContentType {
    /// Get string representation of the content type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Multimodal => "multimodal",
        }
    }
}

/// A stored embedding vector with its provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// Unique identifier
    pub id: Uuid,

    /// Owning user
    pub owner_id: String,

    /// The embedding vector
    pub vector: Vec<f32>,

    /// Declared dimensionality; always equals `vector.len()`
    pub dimension: usize,

    /// Identifier of the model that produced the vector
    pub model_id: String,

    /// Modality of the source content
    pub content_type: ContentType,

    /// Opaque reference to the source item (document id, media URI)
    pub source_ref: Option<String>,

    /// Dedup key, unique per owner
    pub content_hash: String,

    /// When this record was stored
    pub created_at: DateTime<Utc>,

    /// Optional expiry; expired records are removed by the sweep
    pub expires_at: Option<DateTime<Utc>>,

    /// Quality of the source embedding in [0, 1]
    pub quality_score: f32,

    /// Optional domain tag used for ranking boosts
    pub domain: Option<String>,
}

/// Parameters for storing an embedding record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordDraft {
    pub owner_id: String,
    pub vector: Vec<f32>,
    pub model_id: String,
    pub content_type: ContentType,
    pub content_hash: String,
    #[serde(default)]
    pub source_ref: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default = "default_quality")]
    pub quality_score: f32,
    #[serde(default)]
    pub domain: Option<String>,
}

fn default_quality() -> f32 {
    1.0
}

/// Result of storing one record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreOutcome {
    /// Id of the stored (or pre-existing) record
    pub id: Uuid,

    /// True when the content hash matched an existing record, which was
    /// updated in place instead of duplicated
    pub deduplicated: bool,
}

/// Per-item outcome in a batch store manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItemOutcome {
    /// Position of the item in the input batch
    pub index: usize,

    /// Outcome on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored: Option<StoreOutcome>,

    /// Error detail on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

/// In-memory embedding record store, keyed by owner then record id
pub struct EmbeddingStore {
    /// owner id → (record id → record)
    records: RwLock<HashMap<String, HashMap<Uuid, EmbeddingRecord>>>,

    /// (owner id, content hash) → record id, for O(1) dedup lookups
    hash_index: RwLock<HashMap<(String, String), Uuid>>,
}

impl EmbeddingStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            hash_index: RwLock::new(HashMap::new()),
        }
    }

    /// Hex-encoded SHA-256 of source content, for use as a dedup key
    pub fn content_hash(content: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content);
        format!("{:x}", hasher.finalize())
    }

    /// Store a record, deduplicating by content hash within the owner
    ///
    /// A dedup hit updates the existing record in place (vector, quality,
    /// expiry, model id) and returns the existing id; no duplicate is
    /// created.
    pub fn store(&self, draft: RecordDraft) -> Result<StoreOutcome> {
        validate_owner_id(&draft.owner_id)?;
        validate_vector(&draft.vector)?;
        validate_confidence(draft.quality_score)?;
        if draft.content_hash.is_empty() {
            return Err(MemoryError::validation("content_hash", "cannot be empty"));
        }

        let hash_key = (draft.owner_id.clone(), draft.content_hash.clone());
        let existing = self.hash_index.read().get(&hash_key).copied();

        let mut records = self.records.write();
        if let Some(id) = existing {
            let record = records
                .get_mut(&draft.owner_id)
                .and_then(|m| m.get_mut(&id))
                .ok_or_else(|| MemoryError::record_not_found(id))?;
            record.dimension = draft.vector.len();
            record.vector = draft.vector;
            record.model_id = draft.model_id;
            record.quality_score = draft.quality_score;
            record.expires_at = draft.expires_at;
            if draft.source_ref.is_some() {
                record.source_ref = draft.source_ref;
            }
            if draft.domain.is_some() {
                record.domain = draft.domain;
            }

            tracing::debug!(%id, owner = record.owner_id, "dedup hit, updated record in place");
            return Ok(StoreOutcome {
                id,
                deduplicated: true,
            });
        }

        let record = EmbeddingRecord {
            id: Uuid::new_v4(),
            owner_id: draft.owner_id.clone(),
            dimension: draft.vector.len(),
            vector: draft.vector,
            model_id: draft.model_id,
            content_type: draft.content_type,
            source_ref: draft.source_ref,
            content_hash: draft.content_hash,
            created_at: Utc::now(),
            expires_at: draft.expires_at,
            quality_score: draft.quality_score,
            domain: draft.domain,
        };
        let id = record.id;
        records
            .entry(draft.owner_id)
            .or_default()
            .insert(id, record);
        self.hash_index.write().insert(hash_key, id);

        Ok(StoreOutcome {
            id,
            deduplicated: false,
        })
    }

    /// Store a batch, skipping invalid items
    ///
    /// Never aborts: every input yields one [`BatchItemOutcome`] in input
    /// order, carrying either the stored id or the per-item error.
    pub fn store_batch(&self, drafts: Vec<RecordDraft>) -> Result<Vec<BatchItemOutcome>> {
        if drafts.len() > MAX_BATCH_SIZE {
            return Err(MemoryError::ResourceLimit {
                resource: "batch items".to_string(),
                current: drafts.len(),
                limit: MAX_BATCH_SIZE,
            });
        }

        let outcomes: Vec<BatchItemOutcome> = drafts
            .into_iter()
            .enumerate()
            .map(|(index, draft)| match self.store(draft) {
                Ok(stored) => BatchItemOutcome {
                    index,
                    stored: Some(stored),
                    error: None,
                },
                Err(err) => BatchItemOutcome {
                    index,
                    stored: None,
                    error: Some(err.to_detail()),
                },
            })
            .collect();

        let failed = outcomes.iter().filter(|o| o.error.is_some()).count();
        if failed > 0 {
            tracing::warn!(total = outcomes.len(), failed, "batch store completed with failures");
        }
        Ok(outcomes)
    }

    /// Fetch a record by id
    pub fn get(&self, owner: &str, id: &Uuid) -> Result<EmbeddingRecord> {
        self.records
            .read()
            .get(owner)
            .and_then(|m| m.get(id))
            .cloned()
            .ok_or_else(|| MemoryError::record_not_found(id))
    }

    /// Delete a record by id
    pub fn delete(&self, owner: &str, id: &Uuid) -> Result<()> {
        let mut records = self.records.write();
        let owner_records = records
            .get_mut(owner)
            .ok_or_else(|| MemoryError::record_not_found(id))?;
        let removed = owner_records
            .remove(id)
            .ok_or_else(|| MemoryError::record_not_found(id))?;
        self.hash_index
            .write()
            .remove(&(removed.owner_id, removed.content_hash));
        Ok(())
    }

    /// All live (non-expired) records for an owner
    ///
    /// This is the raw candidate pool; consent/namespace filtering happens in
    /// the caller before the pool reaches the ranker.
    pub fn candidates_for(&self, owner: &str) -> Vec<EmbeddingRecord> {
        let now = Utc::now();
        self.records
            .read()
            .get(owner)
            .map(|m| {
                m.values()
                    .filter(|r| r.expires_at.map_or(true, |t| t > now))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Remove every record whose expiry has passed, across all owners
    pub fn remove_expired(&self, now: DateTime<Utc>) -> usize {
        let mut records = self.records.write();
        let mut hash_index = self.hash_index.write();
        let mut removed = 0;

        for owner_records in records.values_mut() {
            // Two-phase: collect expired ids, then remove.
            let expired: Vec<Uuid> = owner_records
                .values()
                .filter(|r| r.expires_at.map_or(false, |t| t <= now))
                .map(|r| r.id)
                .collect();
            for id in expired {
                if let Some(record) = owner_records.remove(&id) {
                    hash_index.remove(&(record.owner_id, record.content_hash));
                    removed += 1;
                }
            }
        }
        records.retain(|_, m| !m.is_empty());

        if removed > 0 {
            tracing::info!(removed, "expired embedding records swept");
        }
        removed
    }

    /// Remove all records for an owner (owner-deletion request)
    pub fn delete_owner(&self, owner: &str) -> usize {
        let removed = self.records.write().remove(owner);
        let count = removed.as_ref().map_or(0, |m| m.len());
        if let Some(owner_records) = removed {
            let mut hash_index = self.hash_index.write();
            for record in owner_records.into_values() {
                hash_index.remove(&(record.owner_id, record.content_hash));
            }
        }
        if count > 0 {
            tracing::info!(owner, records = count, "deleted owner embedding records");
        }
        count
    }

    /// Number of records stored for an owner
    pub fn record_count(&self, owner: &str) -> usize {
        self.records.read().get(owner).map_or(0, |m| m.len())
    }
}

impl Default for EmbeddingStore {
    fn default() -> Self {
        Self::new()
    }
}
