//! Semantic similarity between a job description and a resume.
//!
//! The embedding model is opaque: anything implementing [`Encoder`] maps a
//! batch of texts to fixed-length vectors. Concrete encoders (fastembed,
//! OpenAI, Ollama) live in the application crate and are passed in
//! explicitly, which lets tests substitute a deterministic fake.
//!
//! The score is `round(cos(jd, resume) × 100, 2)`, so it ranges over
//! `[-100, 100]`. It is not clamped here or during fusion.

use anyhow::{bail, Result};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::scoring::round2;

/// Text-to-vector model.
///
/// Implementations must return exactly one vector per input text, in input
/// order, each of length [`dims`](Encoder::dims).
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Model identifier (e.g. `"all-minilm-l6-v2"`).
    fn model_name(&self) -> &str;
    /// Vector dimensionality (e.g. `384`).
    fn dims(&self) -> usize;
    /// Embed a batch of texts.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Cosine similarity of two vectors, in `[-1.0, 1.0]`.
///
/// Returns `0.0` for empty vectors, vectors of different lengths, or
/// vectors with (near) zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

/// Scale a cosine similarity to a percentage rounded to 2 decimals.
pub fn similarity_score(a: &[f32], b: &[f32]) -> f64 {
    round2(cosine_similarity(a, b) as f64 * 100.0)
}

/// Embed both texts in one batch and return their similarity score.
pub async fn compute_semantic_score(
    encoder: &dyn Encoder,
    jd_text: &str,
    resume_text: &str,
) -> Result<f64> {
    let texts = [jd_text.to_string(), resume_text.to_string()];
    let vectors = encoder.embed(&texts).await?;
    if vectors.len() != texts.len() {
        bail!(
            "encoder '{}' returned {} vectors for {} texts",
            encoder.model_name(),
            vectors.len(),
            texts.len()
        );
    }
    Ok(similarity_score(&vectors[0], &vectors[1]))
}

fn content_key(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Memoizing decorator around another encoder.
///
/// Vectors are keyed by the SHA-256 of the text, so a job description that
/// is scored against many resumes is embedded once.
pub struct CachedEncoder {
    inner: Arc<dyn Encoder>,
    cache: RwLock<HashMap<String, Vec<f32>>>,
}

impl CachedEncoder {
    pub fn new(inner: Arc<dyn Encoder>) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Number of distinct texts currently cached.
    pub fn len(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Encoder for CachedEncoder {
    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dims(&self) -> usize {
        self.inner.dims()
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let keys: Vec<String> = texts.iter().map(|t| content_key(t)).collect();

        let mut miss_keys: Vec<String> = Vec::new();
        let mut miss_texts: Vec<String> = Vec::new();
        {
            let cache = self
                .cache
                .read()
                .map_err(|_| anyhow::anyhow!("embedding cache lock poisoned"))?;
            for (key, text) in keys.iter().zip(texts) {
                if !cache.contains_key(key) && !miss_keys.contains(key) {
                    miss_keys.push(key.clone());
                    miss_texts.push(text.clone());
                }
            }
        }

        if !miss_texts.is_empty() {
            let fresh = self.inner.embed(&miss_texts).await?;
            if fresh.len() != miss_texts.len() {
                bail!(
                    "encoder '{}' returned {} vectors for {} texts",
                    self.inner.model_name(),
                    fresh.len(),
                    miss_texts.len()
                );
            }
            let mut cache = self
                .cache
                .write()
                .map_err(|_| anyhow::anyhow!("embedding cache lock poisoned"))?;
            for (key, vector) in miss_keys.into_iter().zip(fresh) {
                cache.insert(key, vector);
            }
        }

        let cache = self
            .cache
            .read()
            .map_err(|_| anyhow::anyhow!("embedding cache lock poisoned"))?;
        keys.iter()
            .map(|key| {
                cache
                    .get(key)
                    .cloned()
                    .ok_or_else(|| anyhow::anyhow!("embedding cache miss after fill"))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Maps each text to a fixed vector by keyword, counting texts embedded.
    struct KeywordEncoder {
        calls: AtomicUsize,
    }

    impl KeywordEncoder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Encoder for KeywordEncoder {
        fn model_name(&self) -> &str {
            "keyword-fake"
        }
        fn dims(&self) -> usize {
            2
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(texts.len(), Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|t| {
                    if t.contains("backend") {
                        vec![1.0, 0.0]
                    } else if t.contains("frontend") {
                        vec![0.0, 1.0]
                    } else if t.contains("anti") {
                        vec![-1.0, 0.0]
                    } else {
                        vec![1.0, 1.0]
                    }
                })
                .collect())
        }
    }

    struct ShortEncoder;

    #[async_trait]
    impl Encoder for ShortEncoder {
        fn model_name(&self) -> &str {
            "short"
        }
        fn dims(&self) -> usize {
            1
        }
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![1.0]])
        }
    }

    #[test]
    fn test_cosine_identical() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn similarity_is_scaled_and_rounded() {
        assert_eq!(similarity_score(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]), 100.0);
        // cos 45° = 0.70710678…
        assert_eq!(similarity_score(&[1.0, 0.0], &[1.0, 1.0]), 70.71);
    }

    #[tokio::test]
    async fn semantic_score_uses_encoder() {
        let enc = KeywordEncoder::new();
        let same = compute_semantic_score(&enc, "backend role", "backend dev")
            .await
            .unwrap();
        assert_eq!(same, 100.0);

        let orthogonal = compute_semantic_score(&enc, "backend role", "frontend dev")
            .await
            .unwrap();
        assert_eq!(orthogonal, 0.0);
    }

    #[tokio::test]
    async fn anti_correlated_texts_score_negative() {
        let enc = KeywordEncoder::new();
        let score = compute_semantic_score(&enc, "backend role", "anti profile")
            .await
            .unwrap();
        assert_eq!(score, -100.0);
    }

    #[tokio::test]
    async fn wrong_vector_count_is_an_error() {
        let err = compute_semantic_score(&ShortEncoder, "a", "b")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("returned 1 vectors for 2 texts"));
    }

    #[tokio::test]
    async fn cached_encoder_embeds_each_text_once() {
        let inner = Arc::new(KeywordEncoder::new());
        let cached = CachedEncoder::new(inner.clone());

        let jd = "backend engineer";
        for resume in ["backend dev", "frontend dev", "backend dev"] {
            compute_semantic_score(&cached, jd, resume).await.unwrap();
        }

        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
        assert_eq!(cached.len(), 3);
        assert_eq!(cached.model_name(), "keyword-fake");
    }

    #[tokio::test]
    async fn cached_encoder_preserves_order_with_duplicates() {
        let cached = CachedEncoder::new(Arc::new(KeywordEncoder::new()));
        let texts = vec![
            "frontend".to_string(),
            "backend".to_string(),
            "frontend".to_string(),
        ];
        let vectors = cached.embed(&texts).await.unwrap();
        assert_eq!(vectors, vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![0.0, 1.0]]);
    }
}
