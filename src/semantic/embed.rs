//! Fixed-dimension bag-of-words hashing embedding. Not a learned embedding:
//! each `\w+` token in the lowercased text increments the bucket at
//! `fnv1a64(token) mod EMBEDDING_DIM`, and the resulting vector is
//! L2-normalized. Deterministic across runs and platforms, so two
//! preparations of identical input produce identical vectors.

use regex::Regex;
use std::sync::OnceLock;

pub const EMBEDDING_DIM: usize = 256;

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\w+").unwrap())
}

fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for &byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

pub fn embed_text(text: &str) -> Vec<f32> {
    let lowered = text.to_lowercase();
    let mut vector = vec![0.0f32; EMBEDDING_DIM];
    for token_match in token_regex().find_iter(&lowered) {
        let bucket = (fnv1a64(token_match.as_str().as_bytes()) % EMBEDDING_DIM as u64) as usize;
        vector[bucket] += 1.0;
    }
    l2_normalize(&mut vector);
    vector
}

fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return;
    }
    for value in vector.iter_mut() {
        *value /= norm;
    }
}

/// Dot product of two L2-normalized vectors (= cosine similarity). Returns
/// `None` on a dimension mismatch so callers can reject malformed records
/// instead of panicking.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }
    let score: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    if score.is_finite() {
        Some(score)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_is_correct_dimension() {
        assert_eq!(embed_text("hello world").len(), EMBEDDING_DIM);
    }

    #[test]
    fn identical_text_produces_identical_vectors() {
        let a = embed_text("File: notes.txt\nalpha beta");
        let b = embed_text("File: notes.txt\nalpha beta");
        assert_eq!(a, b);
    }

    #[test]
    fn empty_text_is_zero_vector() {
        let vector = embed_text("");
        assert!(vector.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn zero_vector_cosine_similarity_is_zero() {
        let zero = vec![0.0f32; EMBEDDING_DIM];
        let other = embed_text("alpha");
        assert_eq!(cosine_similarity(&zero, &other), Some(0.0));
    }

    #[test]
    fn self_similarity_is_near_one() {
        let vector = embed_text("the quick brown fox jumps over the lazy dog");
        let similarity = cosine_similarity(&vector, &vector).unwrap();
        assert!((similarity - 1.0).abs() < 1e-5);
    }

    #[test]
    fn dimension_mismatch_is_none() {
        assert_eq!(cosine_similarity(&[0.0; 10], &[0.0; 20]), None);
    }
}
