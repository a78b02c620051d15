//! Embedding backends for the semantic signal.
//!
//! Each backend implements [`Encoder`] from the core crate:
//! - **[`LocalEncoder`]**: sentence embeddings via fastembed
//!   (`all-minilm-l6-v2` by default). The model is downloaded on first use,
//!   loaded once per process, and shared across calls.
//! - **[`OpenAIEncoder`]**: `POST /v1/embeddings` on the OpenAI API.
//! - **[`OllamaEncoder`]**: `POST /api/embed` on a local Ollama instance.
//!
//! Use [`create_encoder`] to build the configured backend. It returns
//! `None` for `provider = "disabled"`, in which case semantic scores are
//! `0.0`. Every encoder it returns is wrapped in a [`CachedEncoder`], so a
//! job description scored against many resumes is embedded once.
//!
//! # Retry Strategy
//!
//! The HTTP backends retry transient failures with exponential backoff:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use resume_relevance_core::semantic::{CachedEncoder, Encoder};

use crate::config::EmbeddingConfig;

const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";
const OLLAMA_DEFAULT_URL: &str = "http://localhost:11434";
pub const DEFAULT_LOCAL_MODEL: &str = "all-minilm-l6-v2";

/// Build the configured encoder, or `None` when the semantic signal is off.
///
/// | Config Value | Encoder |
/// |-------------|---------|
/// | `"disabled"` | none (semantic score is `0.0`) |
/// | `"local"` | [`LocalEncoder`] (requires the `local-embeddings` feature) |
/// | `"openai"` | [`OpenAIEncoder`] |
/// | `"ollama"` | [`OllamaEncoder`] |
pub fn create_encoder(config: &EmbeddingConfig) -> Result<Option<Arc<dyn Encoder>>> {
    if !config.is_enabled() {
        tracing::warn!("embedding provider is disabled; semantic scores will be 0.0");
        return Ok(None);
    }

    let inner: Arc<dyn Encoder> = match config.provider.as_str() {
        "openai" => Arc::new(OpenAIEncoder::new(config)?),
        "ollama" => Arc::new(OllamaEncoder::new(config)?),
        #[cfg(feature = "local-embeddings")]
        "local" => Arc::new(LocalEncoder::new(config)?),
        #[cfg(not(feature = "local-embeddings"))]
        "local" => bail!("Local embedding provider requires --features local-embeddings"),
        other => bail!("Unknown embedding provider: {}", other),
    };

    tracing::info!(
        provider = %config.provider,
        model = inner.model_name(),
        dims = inner.dims(),
        "embedding encoder ready"
    );
    Ok(Some(Arc::new(CachedEncoder::new(inner))))
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(1 << (attempt - 1).min(5))
}

fn check_dims(model: &str, expected: usize, vectors: &[Vec<f32>]) -> Result<()> {
    if let Some(v) = vectors.iter().find(|v| v.len() != expected) {
        bail!(
            "model '{}' returned a {}-dim vector, expected {}",
            model,
            v.len(),
            expected
        );
    }
    Ok(())
}

fn http_client(config: &EmbeddingConfig) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?)
}

// ============ OpenAI ============

/// Encoder backed by the OpenAI embeddings API.
///
/// Requires `OPENAI_API_KEY` in the environment. Texts are sent in batches
/// of `embedding.batch_size`.
pub struct OpenAIEncoder {
    model: String,
    dims: usize,
    api_key: String,
    batch_size: usize,
    max_retries: u32,
    client: reqwest::Client,
}

impl OpenAIEncoder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("embedding.model required for OpenAI provider"))?;
        let dims = config
            .dims
            .ok_or_else(|| anyhow::anyhow!("embedding.dims required for OpenAI provider"))?;
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;

        Ok(Self {
            model,
            dims,
            api_key,
            batch_size: config.batch_size,
            max_retries: config.max_retries,
            client: http_client(config)?,
        })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                tokio::time::sleep(backoff(attempt)).await;
            }

            let resp = self
                .client
                .post(OPENAI_EMBEDDINGS_URL)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json().await?;
                        return parse_openai_response(&json);
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    if status.as_u16() == 429 || status.is_server_error() {
                        tracing::warn!(%status, attempt, "OpenAI embedding request failed, retrying");
                        last_err = Some(anyhow::anyhow!(
                            "OpenAI API error {}: {}",
                            status,
                            body_text
                        ));
                        continue;
                    }

                    bail!("OpenAI API error {}: {}", status, body_text);
                }
                Err(e) => {
                    tracing::warn!(error = %e, attempt, "OpenAI request error, retrying");
                    last_err = Some(e.into());
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Embedding failed after retries")))
    }
}

#[async_trait]
impl Encoder for OpenAIEncoder {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size.max(1)) {
            out.extend(self.embed_batch(batch).await?);
        }
        check_dims(&self.model, self.dims, &out)?;
        Ok(out)
    }
}

/// Extract `data[].embedding`, ordered by each item's `index`.
fn parse_openai_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing data array"))?;

    let mut indexed = Vec::with_capacity(data.len());
    for (pos, item) in data.iter().enumerate() {
        let embedding = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing embedding"))?;
        let index = item
            .get("index")
            .and_then(|i| i.as_u64())
            .unwrap_or(pos as u64);

        let vec: Vec<f32> = embedding
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();
        indexed.push((index, vec));
    }

    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, v)| v).collect())
}

// ============ Ollama ============

/// Encoder backed by a local Ollama instance.
///
/// Requires Ollama to be running with an embedding model pulled
/// (e.g. `ollama pull nomic-embed-text`).
pub struct OllamaEncoder {
    model: String,
    dims: usize,
    url: String,
    batch_size: usize,
    max_retries: u32,
    client: reqwest::Client,
}

impl OllamaEncoder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("embedding.model required for Ollama provider"))?;
        let dims = config
            .dims
            .ok_or_else(|| anyhow::anyhow!("embedding.dims required for Ollama provider"))?;
        let url = config
            .url
            .clone()
            .unwrap_or_else(|| OLLAMA_DEFAULT_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            model,
            dims,
            url,
            batch_size: config.batch_size,
            max_retries: config.max_retries,
            client: http_client(config)?,
        })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                tokio::time::sleep(backoff(attempt)).await;
            }

            let resp = self
                .client
                .post(format!("{}/api/embed", self.url))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json().await?;
                        return parse_ollama_response(&json);
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    if status.as_u16() == 429 || status.is_server_error() {
                        tracing::warn!(%status, attempt, "Ollama embedding request failed, retrying");
                        last_err = Some(anyhow::anyhow!(
                            "Ollama API error {}: {}",
                            status,
                            body_text
                        ));
                        continue;
                    }

                    bail!("Ollama API error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(anyhow::anyhow!(
                        "Ollama connection error (is Ollama running at {}?): {}",
                        self.url,
                        e
                    ));
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Ollama embedding failed after retries")))
    }
}

#[async_trait]
impl Encoder for OllamaEncoder {
    fn model_name(&self) -> &str {
        &self.model
    }
    fn dims(&self) -> usize {
        self.dims
    }
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size.max(1)) {
            out.extend(self.embed_batch(batch).await?);
        }
        check_dims(&self.model, self.dims, &out)?;
        Ok(out)
    }
}

fn parse_ollama_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let embeddings = json
        .get("embeddings")
        .and_then(|e| e.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid Ollama response: missing embeddings array"))?;

    let mut result = Vec::with_capacity(embeddings.len());

    for embedding in embeddings {
        let vec: Vec<f32> = embedding
            .as_array()
            .ok_or_else(|| anyhow::anyhow!("Invalid Ollama response: embedding is not an array"))?
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();
        result.push(vec);
    }

    Ok(result)
}

// ============ Local (fastembed) ============

/// Resolve the local model name and its vector size.
pub fn resolve_local_model(config: &EmbeddingConfig) -> (String, usize) {
    let model_name = config
        .model
        .clone()
        .unwrap_or_else(|| DEFAULT_LOCAL_MODEL.to_string());

    let dims = config.dims.unwrap_or(match model_name.as_str() {
        "all-minilm-l6-v2" | "all-minilm-l12-v2" => 384,
        "bge-small-en-v1.5" => 384,
        "bge-base-en-v1.5" => 768,
        "bge-large-en-v1.5" => 1024,
        "nomic-embed-text-v1" | "nomic-embed-text-v1.5" => 768,
        _ => 384,
    });

    (model_name, dims)
}

#[cfg(feature = "local-embeddings")]
fn config_to_fastembed_model(name: &str) -> Result<fastembed::EmbeddingModel> {
    match name {
        "all-minilm-l6-v2" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2),
        "all-minilm-l12-v2" => Ok(fastembed::EmbeddingModel::AllMiniLML12V2),
        "bge-small-en-v1.5" => Ok(fastembed::EmbeddingModel::BGESmallENV15),
        "bge-base-en-v1.5" => Ok(fastembed::EmbeddingModel::BGEBaseENV15),
        "bge-large-en-v1.5" => Ok(fastembed::EmbeddingModel::BGELargeENV15),
        "nomic-embed-text-v1" => Ok(fastembed::EmbeddingModel::NomicEmbedTextV1),
        "nomic-embed-text-v1.5" => Ok(fastembed::EmbeddingModel::NomicEmbedTextV15),
        other => bail!(
            "Unknown local embedding model: '{}'. Supported models: \
             all-minilm-l6-v2, all-minilm-l12-v2, \
             bge-small-en-v1.5, bge-base-en-v1.5, bge-large-en-v1.5, \
             nomic-embed-text-v1, nomic-embed-text-v1.5",
            other
        ),
    }
}

/// A model built on first use and shared afterwards.
///
/// Concurrent first callers wait on a single build. A failed build leaves the
/// cell empty, so the next call tries again.
pub struct LazyModel<T> {
    cell: tokio::sync::OnceCell<Arc<T>>,
}

impl<T: Send + Sync + 'static> LazyModel<T> {
    pub fn new() -> Self {
        Self {
            cell: tokio::sync::OnceCell::new(),
        }
    }

    /// Return the model, running `load` on the blocking pool if it is not built yet.
    pub async fn get_or_load<F>(&self, load: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let model = self
            .cell
            .get_or_try_init(|| async {
                let loaded = tokio::task::spawn_blocking(load).await??;
                Ok::<_, anyhow::Error>(Arc::new(loaded))
            })
            .await?;
        Ok(model.clone())
    }
}

impl<T: Send + Sync + 'static> Default for LazyModel<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// In-process sentence embeddings via fastembed.
///
/// The ONNX model is loaded lazily on the first `embed` call and reused for
/// the life of the encoder. Loading and inference run on the blocking pool.
#[cfg(feature = "local-embeddings")]
pub struct LocalEncoder {
    model_name: String,
    dims: usize,
    batch_size: usize,
    model: LazyModel<std::sync::Mutex<fastembed::TextEmbedding>>,
}

#[cfg(feature = "local-embeddings")]
impl LocalEncoder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let (model_name, dims) = resolve_local_model(config);
        // Fail on unknown names now rather than on first use.
        config_to_fastembed_model(&model_name)?;
        Ok(Self {
            model_name,
            dims,
            batch_size: config.batch_size,
            model: LazyModel::new(),
        })
    }

    async fn model(&self) -> Result<Arc<std::sync::Mutex<fastembed::TextEmbedding>>> {
        let which = config_to_fastembed_model(&self.model_name)?;
        let name = self.model_name.clone();
        self.model
            .get_or_load(move || {
                tracing::info!(model = %name, "loading local embedding model");
                let loaded = fastembed::TextEmbedding::try_new(
                    fastembed::InitOptions::new(which).with_show_download_progress(true),
                )
                .map_err(|e| anyhow::anyhow!("Failed to initialize local embedding model: {}", e))?;
                Ok(std::sync::Mutex::new(loaded))
            })
            .await
    }
}

#[cfg(feature = "local-embeddings")]
#[async_trait]
impl Encoder for LocalEncoder {
    fn model_name(&self) -> &str {
        &self.model_name
    }
    fn dims(&self) -> usize {
        self.dims
    }
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let model = self.model().await?;
        let batch_size = self.batch_size;
        let texts = texts.to_vec();

        let vectors = tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|_| anyhow::anyhow!("local embedding model lock poisoned"))?;
            model
                .embed(texts, Some(batch_size))
                .map_err(|e| anyhow::anyhow!("Local embedding failed: {}", e))
        })
        .await??;

        check_dims(&self.model_name, self.dims, &vectors)?;
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn disabled_provider_yields_no_encoder() {
        let encoder = create_encoder(&EmbeddingConfig::disabled()).unwrap();
        assert!(encoder.is_none());
    }

    #[test]
    fn unknown_provider_is_an_error() {
        let config = EmbeddingConfig {
            provider: "magic".to_string(),
            ..EmbeddingConfig::default()
        };
        let err = create_encoder(&config).err().unwrap();
        assert!(err.to_string().contains("Unknown embedding provider"));
    }

    #[test]
    fn ollama_encoder_uses_configured_model() {
        let config = EmbeddingConfig {
            provider: "ollama".to_string(),
            model: Some("nomic-embed-text".to_string()),
            dims: Some(768),
            url: Some("http://127.0.0.1:11434/".to_string()),
            ..EmbeddingConfig::default()
        };
        let encoder = create_encoder(&config).unwrap().unwrap();
        assert_eq!(encoder.model_name(), "nomic-embed-text");
        assert_eq!(encoder.dims(), 768);
    }

    #[test]
    fn local_model_defaults() {
        let (name, dims) = resolve_local_model(&EmbeddingConfig::default());
        assert_eq!(name, DEFAULT_LOCAL_MODEL);
        assert_eq!(dims, 384);

        let config = EmbeddingConfig {
            model: Some("bge-base-en-v1.5".to_string()),
            ..EmbeddingConfig::default()
        };
        assert_eq!(resolve_local_model(&config).1, 768);
    }

    #[test]
    fn openai_response_is_ordered_by_index() {
        let json = serde_json::json!({
            "data": [
                {"index": 1, "embedding": [0.0, 1.0]},
                {"index": 0, "embedding": [1.0, 0.0]}
            ]
        });
        let vectors = parse_openai_response(&json).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn malformed_responses_are_errors() {
        assert!(parse_openai_response(&serde_json::json!({"nope": []})).is_err());
        assert!(parse_ollama_response(&serde_json::json!({"embeddings": [1, 2]})).is_err());
    }

    #[test]
    fn ollama_response_parses() {
        let json = serde_json::json!({"embeddings": [[0.5, 0.25], [1.0, 0.0]]});
        let vectors = parse_ollama_response(&json).unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0], vec![0.5, 0.25]);
    }

    /// Encoder over a fake model that counts how often it is built.
    struct CountingEncoder {
        model: LazyModel<Vec<f32>>,
        loads: Arc<AtomicUsize>,
        fail_first: bool,
    }

    impl CountingEncoder {
        fn new(fail_first: bool) -> Self {
            Self {
                model: LazyModel::new(),
                loads: Arc::new(AtomicUsize::new(0)),
                fail_first,
            }
        }
    }

    #[async_trait]
    impl Encoder for CountingEncoder {
        fn model_name(&self) -> &str {
            "counting"
        }
        fn dims(&self) -> usize {
            2
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let loads = self.loads.clone();
            let fail_first = self.fail_first;
            let model = self
                .model
                .get_or_load(move || {
                    let n = loads.fetch_add(1, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(20));
                    if fail_first && n == 0 {
                        bail!("model download interrupted");
                    }
                    Ok(vec![1.0, 0.0])
                })
                .await?;
            Ok(texts.iter().map(|_| (*model).clone()).collect())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn local_model_loads_once_across_concurrent_calls() {
        let encoder = Arc::new(CountingEncoder::new(false));
        let texts = vec!["rust".to_string()];

        let mut handles = Vec::new();
        for _ in 0..8 {
            let encoder = encoder.clone();
            let texts = texts.clone();
            handles.push(tokio::spawn(async move { encoder.embed(&texts).await }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), vec![vec![1.0, 0.0]]);
        }
        encoder.embed(&texts).await.unwrap();
        encoder.embed(&texts).await.unwrap();

        assert_eq!(encoder.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_model_load_is_retried() {
        let encoder = CountingEncoder::new(true);
        let texts = vec!["rust".to_string()];

        let err = encoder.embed(&texts).await.unwrap_err();
        assert!(err.to_string().contains("download interrupted"));

        assert_eq!(encoder.embed(&texts).await.unwrap(), vec![vec![1.0, 0.0]]);
        encoder.embed(&texts).await.unwrap();
        assert_eq!(encoder.loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn wrong_dims_are_rejected() {
        let err = check_dims("m", 3, &[vec![1.0, 2.0, 3.0], vec![1.0]]).unwrap_err();
        assert!(err.to_string().contains("1-dim"));
    }
}
