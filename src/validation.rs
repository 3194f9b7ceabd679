//! Input validation helpers
//!
//! Shared range and shape checks used at every public entry point.

use crate::constants::{MAX_EMBEDDING_DIMENSION, SEARCH_WEIGHT_SUM_TOLERANCE};
use crate::errors::{MemoryError, Result};

/// Maximum owner id length
pub const MAX_OWNER_ID_LENGTH: usize = 128;

/// Validate an owner id: non-empty, bounded, restricted character set
pub fn validate_owner_id(owner_id: &str) -> Result<()> {
    if owner_id.is_empty() {
        return Err(MemoryError::validation("owner_id", "cannot be empty"));
    }
    if owner_id.len() > MAX_OWNER_ID_LENGTH {
        return Err(MemoryError::validation(
            "owner_id",
            format!(
                "too long: {} chars (max: {MAX_OWNER_ID_LENGTH})",
                owner_id.len()
            ),
        ));
    }
    if !owner_id
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '@' | '.'))
    {
        return Err(MemoryError::validation(
            "owner_id",
            "contains invalid characters (allowed: alphanumeric, -, _, @, .)",
        ));
    }
    Ok(())
}

/// Validate an edge weight or increment in [0, 1]
pub fn validate_weight(weight: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&weight) || !weight.is_finite() {
        return Err(MemoryError::validation(
            "weight",
            format!("must be between 0.0 and 1.0, got: {weight}"),
        ));
    }
    Ok(())
}

/// Validate a confidence score in [0, 1]
pub fn validate_confidence(confidence: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&confidence) || !confidence.is_finite() {
        return Err(MemoryError::validation(
            "confidence",
            format!("must be between 0.0 and 1.0, got: {confidence}"),
        ));
    }
    Ok(())
}

/// Validate an embedding vector: non-empty, bounded dimension, finite values
pub fn validate_vector(vector: &[f32]) -> Result<()> {
    if vector.is_empty() {
        return Err(MemoryError::validation("vector", "cannot be empty"));
    }
    if vector.len() > MAX_EMBEDDING_DIMENSION {
        return Err(MemoryError::validation(
            "vector",
            format!(
                "dimension {} exceeds maximum {MAX_EMBEDDING_DIMENSION}",
                vector.len()
            ),
        ));
    }
    if vector.iter().any(|v| !v.is_finite()) {
        return Err(MemoryError::validation(
            "vector",
            "contains NaN or infinite values",
        ));
    }
    Ok(())
}

/// Validate a result limit: non-zero
pub fn validate_limit(limit: usize) -> Result<()> {
    if limit == 0 {
        return Err(MemoryError::validation(
            "limit",
            "must be greater than 0",
        ));
    }
    Ok(())
}

/// Validate that search weights sum to 1.0 within tolerance
pub fn validate_weight_sum(weights: &[f32]) -> Result<()> {
    let sum: f32 = weights.iter().sum();
    if (sum - 1.0).abs() > SEARCH_WEIGHT_SUM_TOLERANCE {
        return Err(MemoryError::validation(
            "weights",
            format!("must sum to 1.0 (±{SEARCH_WEIGHT_SUM_TOLERANCE}), got: {sum}"),
        ));
    }
    Ok(())
}
