//! Embedding & similarity scoring.
//!
//! The scorer turns text into a fixed-dimension vector and maps the cosine
//! similarity of a resume against a job description to an integer relevance
//! score in [0, 100]. The backend is an injected `Arc<dyn Embedder>` held in
//! `AppState` — no process-wide singleton model.
//!
//! The default backend is a deterministic feature-hashed bag-of-words
//! embedder: fast, dependency-free at runtime, and stable for a given
//! dimension. The trait seam is where a remote or model-backed embedding
//! service plugs in.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use thiserror::Error;

/// Output dimensionality of every embedder backend.
pub const EMBEDDING_DIM: usize = 384;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("embedding dimensions don't match: {0} vs {1}")]
    DimensionMismatch(usize, usize),

    #[error("embedding backend error: {0}")]
    Backend(String),
}

/// The embedding capability: text in, fixed-dimension vector out.
/// Same text and same backend must yield the same vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ScoringError>;

    fn backend(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// HashedEmbedder — default deterministic backend
// ────────────────────────────────────────────────────────────────────────────

/// Feature-hashed bag-of-words embedder. Each token is hashed with blake3
/// into a bucket and a sign; the vector is L2-normalized. Deterministic
/// across processes and platforms.
pub struct HashedEmbedder {
    dim: usize,
}

impl HashedEmbedder {
    pub fn new() -> Self {
        Self { dim: EMBEDDING_DIM }
    }

    fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dim];
        for token in tokenize(text) {
            let digest = blake3::hash(token.as_bytes());
            let bytes = digest.as_bytes();
            let bucket = u64::from_le_bytes(bytes[0..8].try_into().unwrap()) as usize % self.dim;
            let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        l2_normalize(&mut vector);
        vector
    }
}

impl Default for HashedEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for HashedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ScoringError> {
        Ok(self.embed_sync(text))
    }

    fn backend(&self) -> &'static str {
        "hashed-bow"
    }
}

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[a-z0-9+#]+").unwrap())
}

fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    token_re()
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Similarity → relevance
// ────────────────────────────────────────────────────────────────────────────

/// Cosine similarity of two vectors. Zero-norm input yields 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, ScoringError> {
    if a.len() != b.len() {
        return Err(ScoringError::DimensionMismatch(a.len(), b.len()));
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (norm_a * norm_b))
}

/// Maps raw cosine similarity to an integer relevance score.
///
/// Negative similarity is clamped to 0 so the [0, 100] invariant holds
/// unconditionally (the upstream system left negative scores unclamped).
pub fn relevance_from_cosine(cosine: f32) -> i32 {
    ((cosine * 100.0).round() as i32).clamp(0, 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_embedding_is_deterministic() {
        let embedder = HashedEmbedder::new();
        let a = embedder.embed("Python backend engineer").await.unwrap();
        let b = embedder.embed("Python backend engineer").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_embedding_has_fixed_dimension() {
        let embedder = HashedEmbedder::new();
        let v = embedder.embed("any text at all").await.unwrap();
        assert_eq!(v.len(), EMBEDDING_DIM);
    }

    #[tokio::test]
    async fn test_empty_text_embeds_to_zero_vector() {
        let embedder = HashedEmbedder::new();
        let v = embedder.embed("").await.unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[tokio::test]
    async fn test_self_similarity_maps_to_100() {
        let embedder = HashedEmbedder::new();
        let v = embedder
            .embed("Seeking a Python backend engineer with Django experience")
            .await
            .unwrap();
        let cos = cosine_similarity(&v, &v).unwrap();
        assert!((cos - 1.0).abs() < 1e-6, "cosine was {cos}");
        assert_eq!(relevance_from_cosine(cos), 100);
    }

    #[tokio::test]
    async fn test_matching_resume_outscores_unrelated_one() {
        let embedder = HashedEmbedder::new();
        let job = embedder
            .embed("Seeking a Python backend engineer with Django experience")
            .await
            .unwrap();
        let relevant = embedder
            .embed("Python, Django, 3 years backend")
            .await
            .unwrap();
        let unrelated = embedder.embed("Photoshop, Illustrator").await.unwrap();

        let score_relevant =
            relevance_from_cosine(cosine_similarity(&job, &relevant).unwrap());
        let score_unrelated =
            relevance_from_cosine(cosine_similarity(&job, &unrelated).unwrap());
        assert!(
            score_relevant > score_unrelated,
            "relevant={score_relevant} unrelated={score_unrelated}"
        );
    }

    #[test]
    fn test_dimension_mismatch_is_an_error() {
        let a = vec![1.0_f32; 3];
        let b = vec![1.0_f32; 4];
        assert!(cosine_similarity(&a, &b).is_err());
    }

    #[test]
    fn test_zero_vector_similarity_is_zero() {
        let a = vec![0.0_f32; 4];
        let b = vec![1.0_f32; 4];
        assert_eq!(cosine_similarity(&a, &b).unwrap(), 0.0);
    }

    #[test]
    fn test_negative_cosine_clamps_to_zero() {
        assert_eq!(relevance_from_cosine(-0.4), 0);
    }

    #[test]
    fn test_relevance_mapping_rounds() {
        assert_eq!(relevance_from_cosine(0.674), 67);
        assert_eq!(relevance_from_cosine(0.675), 68);
        assert_eq!(relevance_from_cosine(1.0), 100);
    }

    #[test]
    fn test_tokenizer_keeps_symbolic_skills() {
        assert_eq!(tokenize("C++ and C#"), vec!["c++", "and", "c#"]);
    }
}
