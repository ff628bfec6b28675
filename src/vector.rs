//! Embedding vector codec: literal form, BLOB form, and cosine similarity.
//!
//! The store receives vectors as text literals (`[0.1,0.2,...]`) so that the
//! wire shape is independent of how a backend persists them.

use thiserror::Error;

/// Dimension every stored embedding must have.
pub const EMBEDDING_DIMS: usize = 1536;
const EMBEDDING_BLOB_SIZE: usize = EMBEDDING_DIMS * 4; // f32 little-endian

/// Vector validation and parsing failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VectorError {
    #[error("expected {expected} dimensions, got {actual}")]
    MismatchedDimensions { expected: usize, actual: usize },

    #[error("vector contains NaN or infinite values")]
    NonFinite,

    #[error("cannot compute similarity with empty vector")]
    Empty,

    #[error("malformed vector literal: {0}")]
    Malformed(String),

    #[error("invalid BLOB size: expected {expected} bytes, got {actual} bytes")]
    InvalidBlobSize { expected: usize, actual: usize },
}

/// Check that a vector has exactly [`EMBEDDING_DIMS`] finite components.
pub fn validate(vec: &[f32]) -> Result<(), VectorError> {
    if vec.len() != EMBEDDING_DIMS {
        return Err(VectorError::MismatchedDimensions {
            expected: EMBEDDING_DIMS,
            actual: vec.len(),
        });
    }
    if vec.iter().any(|x| !x.is_finite()) {
        return Err(VectorError::NonFinite);
    }
    Ok(())
}

/// Serialize an embedding into the store's vector literal form.
///
/// # Errors
///
/// Returns an error if the vector does not pass [`validate`].
pub fn to_literal(vec: &[f32]) -> Result<String, VectorError> {
    validate(vec)?;
    let parts: Vec<String> = vec.iter().map(|x| x.to_string()).collect();
    Ok(format!("[{}]", parts.join(",")))
}

/// Parse a vector literal produced by [`to_literal`].
pub fn parse_literal(literal: &str) -> Result<Vec<f32>, VectorError> {
    let inner = literal
        .trim()
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| VectorError::Malformed("missing brackets".to_string()))?;

    let vec = inner
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f32>()
                .map_err(|e| VectorError::Malformed(format!("'{}': {e}", part.trim())))
        })
        .collect::<Result<Vec<f32>, _>>()?;

    validate(&vec)?;
    Ok(vec)
}

/// Convert an embedding to a BLOB (little-endian bytes).
pub fn vec_to_blob(vec: &[f32]) -> Result<Vec<u8>, VectorError> {
    validate(vec)?;
    Ok(vec.iter().flat_map(|&x| x.to_le_bytes()).collect())
}

/// Convert a BLOB (little-endian bytes) back into an embedding.
pub fn blob_to_vec(blob: &[u8]) -> Result<Vec<f32>, VectorError> {
    if blob.len() != EMBEDDING_BLOB_SIZE {
        return Err(VectorError::InvalidBlobSize {
            expected: EMBEDDING_BLOB_SIZE,
            actual: blob.len(),
        });
    }
    Ok(blob
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Compute cosine similarity between two embedding vectors.
///
/// Zero-norm vectors have similarity 0.0 with everything.
///
/// # Errors
///
/// - `VectorError::Empty` if either vector is empty.
/// - `VectorError::MismatchedDimensions` if lengths differ.
/// - `VectorError::NonFinite` if any value is NaN or infinite.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64, VectorError> {
    if a.is_empty() || b.is_empty() {
        return Err(VectorError::Empty);
    }

    if a.len() != b.len() {
        return Err(VectorError::MismatchedDimensions {
            expected: a.len(),
            actual: b.len(),
        });
    }

    if a.iter().chain(b.iter()).any(|x| !x.is_finite()) {
        return Err(VectorError::NonFinite);
    }

    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / (norm_a * norm_b))
}
