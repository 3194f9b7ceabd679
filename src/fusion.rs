//! Multi-modal embedding fusion
//!
//! Combines per-modality vectors (text/image/audio/video) into a single
//! normalized embedding plus a confidence estimate. Absent modalities are
//! simply omitted from the input; the engine never calls out to the models
//! that produced the raw vectors.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_AUDIO_WEIGHT, DEFAULT_IMAGE_WEIGHT, DEFAULT_TEXT_WEIGHT, DEFAULT_VIDEO_WEIGHT,
    FUSION_BASE_CONFIDENCE, FUSION_CONFIDENCE_CEILING, FUSION_MODALITY_BONUS,
    FUSION_MODALITY_BONUS_CAP, FUSION_WEIGHT_BONUS,
};
use crate::errors::{MemoryError, Result};
use crate::validation::validate_weight;
use crate::vector_math::{normalize, project_to_dimension};

/// Input modality of an embedding vector
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Modality {
    // Order matters: weighted-concat output follows this declaration order.
    Text,
    Image,
    Audio,
    Video,
}

impl Modality {
    /// Default fusion weight for this modality when the caller supplies none
    pub fn default_weight(&self) -> f32 {
        match self {
            Self::Text => DEFAULT_TEXT_WEIGHT,
            Self::Image => DEFAULT_IMAGE_WEIGHT,
            Self::Audio => DEFAULT_AUDIO_WEIGHT,
            Self::Video => DEFAULT_VIDEO_WEIGHT,
        }
    }

    /// Get string representation of the modality
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }
}

/// One per-modality vector contributed to a fusion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModalityVector {
    /// Raw embedding produced by an external model
    pub vector: Vec<f32>,

    /// Relative weight of this modality; `None` uses the modality default
    pub weight: Option<f32>,

    /// Which modality produced the vector
    pub modality: Modality,
}

impl ModalityVector {
    pub fn new(modality: Modality, vector: Vec<f32>) -> Self {
        Self {
            vector,
            weight: None,
            modality,
        }
    }

    pub fn with_weight(modality: Modality, vector: Vec<f32>, weight: f32) -> Self {
        Self {
            vector,
            weight: Some(weight),
            modality,
        }
    }

    fn effective_weight(&self) -> f32 {
        self.weight.unwrap_or_else(|| self.modality.default_weight())
    }
}

/// Strategy used to combine modality vectors
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum FusionStrategy {
    /// Scale each vector by its normalized weight and concatenate in fixed
    /// modality order; output dimension = sum of input dimensions
    #[default]
    WeightedConcat,

    /// Project all vectors to the largest input dimension, then weighted sum
    /// with `weight / total_weight` attention coefficients
    Attention,

    /// Project to the largest input dimension, unweighted mean
    Average,
}

/// Result of fusing one or more modality vectors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusedEmbedding {
    /// L2-normalized fused vector (unchanged only if all inputs were zero)
    pub vector: Vec<f32>,

    /// Output dimensionality (== `vector.len()`)
    pub dimension: usize,

    /// Strategy that produced this embedding
    pub strategy: FusionStrategy,

    /// Confidence estimate in [0, 0.95], higher with more modalities and
    /// heavier weights
    pub confidence: f32,
}

/// Fuse a set of per-modality vectors into one normalized embedding
///
/// Fails with a validation error if `inputs` is empty or any vector is empty.
pub fn fuse(inputs: &[ModalityVector], strategy: FusionStrategy) -> Result<FusedEmbedding> {
    if inputs.is_empty() {
        return Err(MemoryError::validation(
            "inputs",
            "fusion requires at least one modality vector",
        ));
    }
    for input in inputs {
        if input.vector.is_empty() {
            return Err(MemoryError::validation(
                "inputs",
                format!("{} vector is empty", input.modality.as_str()),
            ));
        }
        if let Some(weight) = input.weight {
            validate_weight(weight)?;
        }
    }

    let vector = match strategy {
        FusionStrategy::WeightedConcat => weighted_concat(inputs),
        FusionStrategy::Attention => attention(inputs),
        FusionStrategy::Average => average(inputs),
    };

    let vector = normalize(&vector);
    let dimension = vector.len();
    let confidence = fusion_confidence(inputs);

    tracing::trace!(
        modalities = inputs.len(),
        dimension,
        confidence,
        ?strategy,
        "fused modality vectors"
    );

    Ok(FusedEmbedding {
        vector,
        dimension,
        strategy,
        confidence,
    })
}

/// Scale by normalized weight and concatenate in fixed modality order
fn weighted_concat(inputs: &[ModalityVector]) -> Vec<f32> {
    let mut ordered: Vec<&ModalityVector> = inputs.iter().collect();
    ordered.sort_by_key(|input| input.modality);

    let total_weight: f32 = ordered.iter().map(|i| i.effective_weight()).sum();
    let total_dim: usize = ordered.iter().map(|i| i.vector.len()).sum();

    let mut out = Vec::with_capacity(total_dim);
    for input in ordered {
        let w = if total_weight > 0.0 {
            input.effective_weight() / total_weight
        } else {
            1.0 / inputs.len() as f32
        };
        out.extend(input.vector.iter().map(|x| x * w));
    }
    out
}

/// Project to max input dimension, weighted sum with attention coefficients
fn attention(inputs: &[ModalityVector]) -> Vec<f32> {
    let target_dim = inputs.iter().map(|i| i.vector.len()).max().unwrap_or(0);
    let total_weight: f32 = inputs.iter().map(|i| i.effective_weight()).sum();

    let mut out = vec![0.0; target_dim];
    for input in inputs {
        let coeff = if total_weight > 0.0 {
            input.effective_weight() / total_weight
        } else {
            1.0 / inputs.len() as f32
        };
        let projected = project_to_dimension(&input.vector, target_dim);
        for (acc, x) in out.iter_mut().zip(projected.iter()) {
            *acc += coeff * x;
        }
    }
    out
}

/// Project to max input dimension, unweighted mean
fn average(inputs: &[ModalityVector]) -> Vec<f32> {
    let target_dim = inputs.iter().map(|i| i.vector.len()).max().unwrap_or(0);
    let n = inputs.len() as f32;

    let mut out = vec![0.0; target_dim];
    for input in inputs {
        let projected = project_to_dimension(&input.vector, target_dim);
        for (acc, x) in out.iter_mut().zip(projected.iter()) {
            *acc += x / n;
        }
    }
    out
}

/// Confidence = min(0.95, 0.7 + min(0.3, 0.1·modality_count) + 0.1·avg_weight)
fn fusion_confidence(inputs: &[ModalityVector]) -> f32 {
    let modality_bonus =
        (FUSION_MODALITY_BONUS * inputs.len() as f32).min(FUSION_MODALITY_BONUS_CAP);
    let avg_weight =
        inputs.iter().map(|i| i.effective_weight()).sum::<f32>() / inputs.len() as f32;

    (FUSION_BASE_CONFIDENCE + modality_bonus + FUSION_WEIGHT_BONUS * avg_weight)
        .min(FUSION_CONFIDENCE_CEILING)
}
