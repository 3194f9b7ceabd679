//! Pure vector operations for similarity and fusion
//!
//! Stateless helpers shared by the fusion and ranking engines: cosine
//! similarity, L2 normalization, and cheap dimension alignment.

use crate::errors::{MemoryError, Result};

/// Dot product of two equal-length slices
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Euclidean (L2) norm
#[inline]
pub fn l2_norm(v: &[f32]) -> f32 {
    dot(v, v).sqrt()
}

/// Compute cosine similarity between two vectors
///
/// Fails with [`MemoryError::DimensionMismatch`] if lengths differ; callers
/// needing tolerance must pre-align with [`project_to_dimension`]. Returns
/// 0.0 if either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(MemoryError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot(a, b) / (norm_a * norm_b))
}

/// Divide a vector by its L2 norm
///
/// Returns the input unchanged if its norm is zero.
pub fn normalize(v: &[f32]) -> Vec<f32> {
    let norm = l2_norm(v);
    if norm == 0.0 {
        return v.to_vec();
    }
    v.iter().map(|x| x / norm).collect()
}

/// Align a vector to `target_dim`
///
/// - identity if the length already matches
/// - zero-pad if shorter
/// - if longer, partition into `ceil(len/target_dim)`-sized contiguous chunks
///   and average each chunk down to exactly `target_dim` outputs
///
/// The downsampling path is lossy chunked averaging, not PCA; it exists so
/// mixed-dimension modality vectors can be fused cheaply.
pub fn project_to_dimension(v: &[f32], target_dim: usize) -> Vec<f32> {
    if v.len() == target_dim {
        return v.to_vec();
    }

    if v.len() < target_dim {
        let mut out = v.to_vec();
        out.resize(target_dim, 0.0);
        return out;
    }

    // ceil division so every input element lands in exactly one chunk
    let chunk_size = v.len().div_ceil(target_dim);
    let mut out = Vec::with_capacity(target_dim);

    for chunk in v.chunks(chunk_size) {
        let mean = chunk.iter().sum::<f32>() / chunk.len() as f32;
        out.push(mean);
    }

    // chunks() can produce fewer than target_dim outputs when len is not a
    // multiple of chunk_size; pad the remainder with zeros
    out.resize(target_dim, 0.0);
    out
}
