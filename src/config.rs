//! TOML configuration parsing and validation.
//!
//! Only `[db]` is required; every other section has defaults. See
//! `config/rrc.example.toml` for a complete file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use resume_relevance_core::FusionWeights;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScoringConfig {
    #[serde(default = "default_hard_weight")]
    pub hard_weight: f64,
    #[serde(default = "default_semantic_weight")]
    pub semantic_weight: f64,
    /// How many distinct missing keywords to show per resume.
    #[serde(default = "default_top_missing")]
    pub top_missing: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            hard_weight: default_hard_weight(),
            semantic_weight: default_semantic_weight(),
            top_missing: default_top_missing(),
        }
    }
}

fn default_hard_weight() -> f64 {
    0.6
}
fn default_semantic_weight() -> f64 {
    0.4
}
fn default_top_missing() -> usize {
    5
}

impl ScoringConfig {
    pub fn weights(&self) -> Result<FusionWeights> {
        FusionWeights::new(self.hard_weight, self.semantic_weight)
            .with_context(|| "Invalid [scoring] weights")
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Base URL for the Ollama provider.
    #[serde(default)]
    pub url: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            dims: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
            url: None,
        }
    }
}

fn default_provider() -> String {
    "local".to_string()
}
fn default_batch_size() -> usize {
    32
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }

    /// A config with the semantic signal switched off.
    pub fn disabled() -> Self {
        Self {
            provider: "disabled".to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractConfig {
    /// Documents larger than this are rejected before parsing.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
        }
    }
}

fn default_max_bytes() -> u64 {
    20 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct BatchConfig {
    #[serde(default = "default_max_resumes")]
    pub max_resumes: usize,
    /// Globs (relative to the scanned directory) selecting documents for `rrc matrix`.
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_resumes: default_max_resumes(),
            include_globs: default_include_globs(),
        }
    }
}

fn default_max_resumes() -> usize {
    200
}
fn default_include_globs() -> Vec<String> {
    vec!["**/*.pdf".to_string(), "**/*.docx".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    /// Default `tracing` filter level when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Defaults for commands that can run without a config file.
    pub fn minimal() -> Self {
        Self {
            db: DbConfig {
                path: PathBuf::from("./data/rrc.sqlite"),
            },
            scoring: ScoringConfig::default(),
            embedding: EmbeddingConfig::default(),
            extract: ExtractConfig::default(),
            batch: BatchConfig::default(),
            log: LogConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_config(&content)?;
    Ok(config)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    // Validate scoring
    config.scoring.weights()?;
    if config.scoring.top_missing == 0 {
        anyhow::bail!("scoring.top_missing must be > 0");
    }

    // Validate batch
    if config.batch.max_resumes == 0 {
        anyhow::bail!("batch.max_resumes must be > 0");
    }
    if config.batch.include_globs.is_empty() {
        anyhow::bail!("batch.include_globs must not be empty");
    }

    if config.extract.max_bytes == 0 {
        anyhow::bail!("extract.max_bytes must be > 0");
    }

    // Validate embedding
    if config.embedding.batch_size == 0 {
        anyhow::bail!("embedding.batch_size must be > 0");
    }
    match config.embedding.provider.as_str() {
        "disabled" | "local" => {}
        "openai" | "ollama" => {
            if config.embedding.model.is_none() {
                anyhow::bail!(
                    "embedding.model must be specified when provider is '{}'",
                    config.embedding.provider
                );
            }
            if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
                anyhow::bail!(
                    "embedding.dims must be > 0 when provider is '{}'",
                    config.embedding.provider
                );
            }
        }
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled, local, openai, or ollama.",
            other
        ),
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_db_is_required() {
        let cfg = parse_config("[db]\npath = \"./x.sqlite\"\n").unwrap();
        assert_eq!(cfg.scoring.hard_weight, 0.6);
        assert_eq!(cfg.scoring.semantic_weight, 0.4);
        assert_eq!(cfg.embedding.provider, "local");
        assert_eq!(cfg.batch.max_resumes, 200);
        assert_eq!(cfg.log.level, "info");
        assert!(cfg.embedding.is_enabled());
    }

    #[test]
    fn disabled_provider_is_not_enabled() {
        let cfg =
            parse_config("[db]\npath = \"x\"\n[embedding]\nprovider = \"disabled\"\n").unwrap();
        assert!(!cfg.embedding.is_enabled());
        assert!(!EmbeddingConfig::disabled().is_enabled());
    }

    #[test]
    fn weights_must_sum_to_one() {
        let err = parse_config(
            "[db]\npath = \"x\"\n[scoring]\nhard_weight = 0.7\nsemantic_weight = 0.7\n",
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("sum to 1.0"));
    }

    #[test]
    fn remote_providers_need_model_and_dims() {
        let err = parse_config("[db]\npath = \"x\"\n[embedding]\nprovider = \"openai\"\n")
            .unwrap_err();
        assert!(err.to_string().contains("embedding.model"));

        let cfg = parse_config(
            "[db]\npath = \"x\"\n[embedding]\nprovider = \"ollama\"\nmodel = \"nomic-embed-text\"\ndims = 768\n",
        )
        .unwrap();
        assert_eq!(cfg.embedding.dims, Some(768));
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let err = parse_config("[db]\npath = \"x\"\n[embedding]\nprovider = \"magic\"\n")
            .unwrap_err();
        assert!(err.to_string().contains("Unknown embedding provider"));
    }
}
