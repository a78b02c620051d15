//! One-resume scoring: hard match, semantic match, fusion, verdict.

use std::sync::Arc;
use thiserror::Error;

use crate::keywords::compute_hard_match;
use crate::models::MatchResult;
use crate::scoring::{get_verdict, FusionWeights};
use crate::semantic::{compute_semantic_score, Encoder};

#[derive(Debug, Error)]
pub enum ScoreError {
    /// The job description contains no word tokens, so nothing can match.
    #[error("job description has no keywords to match against")]
    EmptyInput,

    #[error("semantic scoring failed: {0}")]
    Embedding(#[from] anyhow::Error),
}

/// Scores resumes against a job description.
///
/// Holds the (optional) encoder and the fusion weights. Without an encoder
/// the semantic score is `0.0` and only the hard match contributes.
#[derive(Clone)]
pub struct Scorer {
    encoder: Option<Arc<dyn Encoder>>,
    weights: FusionWeights,
}

impl Scorer {
    pub fn new(encoder: Option<Arc<dyn Encoder>>, weights: FusionWeights) -> Self {
        Self { encoder, weights }
    }

    /// A scorer that only uses the keyword signal.
    pub fn keyword_only(weights: FusionWeights) -> Self {
        Self::new(None, weights)
    }

    pub fn weights(&self) -> FusionWeights {
        self.weights
    }

    pub fn encoder(&self) -> Option<&Arc<dyn Encoder>> {
        self.encoder.as_ref()
    }

    pub async fn score(&self, jd_text: &str, resume_text: &str) -> Result<MatchResult, ScoreError> {
        let hard = compute_hard_match(jd_text, resume_text);
        if hard.is_empty() {
            return Err(ScoreError::EmptyInput);
        }

        let semantic_score = match &self.encoder {
            Some(encoder) => compute_semantic_score(encoder.as_ref(), jd_text, resume_text).await?,
            None => 0.0,
        };

        let final_score = self.weights.fuse(hard.score, semantic_score);

        Ok(MatchResult {
            hard_score: hard.score,
            missing_keywords: hard.missing,
            semantic_score,
            final_score,
            verdict: get_verdict(final_score),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Verdict;
    use anyhow::Result;
    use async_trait::async_trait;

    /// Returns the same vector for every text: similarity is always 100.
    struct ConstantEncoder;

    #[async_trait]
    impl Encoder for ConstantEncoder {
        fn model_name(&self) -> &str {
            "constant"
        }
        fn dims(&self) -> usize {
            3
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.5, 0.5, 0.5]).collect())
        }
    }

    struct FailingEncoder;

    #[async_trait]
    impl Encoder for FailingEncoder {
        fn model_name(&self) -> &str {
            "failing"
        }
        fn dims(&self) -> usize {
            3
        }
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            anyhow::bail!("model unavailable")
        }
    }

    #[tokio::test]
    async fn fuses_hard_and_semantic() {
        let scorer = Scorer::new(Some(Arc::new(ConstantEncoder)), FusionWeights::default());
        let r = scorer
            .score("Python SQL Python", "I know python and Java")
            .await
            .unwrap();
        assert_eq!(r.hard_score, 66.67);
        assert_eq!(r.semantic_score, 100.0);
        // 0.6 * 66.67 + 0.4 * 100 = 80.002
        assert_eq!(r.final_score, 80.0);
        assert_eq!(r.verdict, Verdict::High);
        assert_eq!(r.missing_keywords, vec!["sql"]);
    }

    #[tokio::test]
    async fn verdict_follows_final_score_not_hard_score() {
        let scorer = Scorer::keyword_only(FusionWeights::default());
        let r = scorer.score("rust tokio", "rust and tokio").await.unwrap();
        assert_eq!(r.hard_score, 100.0);
        assert_eq!(r.final_score, 60.0);
        assert_eq!(r.verdict, Verdict::Medium);
    }

    #[tokio::test]
    async fn empty_jd_is_rejected() {
        let scorer = Scorer::keyword_only(FusionWeights::default());
        let err = scorer.score("   ", "anything").await.unwrap_err();
        assert!(matches!(err, ScoreError::EmptyInput));
    }

    #[tokio::test]
    async fn encoder_failure_propagates() {
        let scorer = Scorer::new(Some(Arc::new(FailingEncoder)), FusionWeights::default());
        let err = scorer.score("rust", "rust").await.unwrap_err();
        assert!(matches!(err, ScoreError::Embedding(_)));
        assert!(err.to_string().contains("model unavailable"));
    }

    #[tokio::test]
    async fn custom_weights_apply() {
        let weights = FusionWeights::new(1.0, 0.0).unwrap();
        let scorer = Scorer::new(Some(Arc::new(ConstantEncoder)), weights);
        let r = scorer.score("a b c d", "a b").await.unwrap();
        assert_eq!(r.final_score, 50.0);
        assert_eq!(r.verdict, Verdict::Medium);
    }
}
