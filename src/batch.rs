//! Score a batch of resumes against one job description.
//!
//! Resumes are processed sequentially in input order. Each one is loaded,
//! extracted, scored, and (optionally) recorded; a failure at any step is
//! captured in [`BatchReport::failures`] with the resume name and the error,
//! and the rest of the batch continues. Only problems with the job
//! description itself, or an oversized batch, abort the whole run.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use resume_relevance_core::models::{LogEntry, MatchResult};
use resume_relevance_core::store::{self, LogStore};
use resume_relevance_core::{tokenize, ScoreError, Scorer};

use crate::extract::{Document, Extractor};
use crate::progress::{ScoreProgressEvent, ScoreProgressReporter};

/// A successfully scored resume.
#[derive(Debug, Clone)]
pub struct ScoredResume {
    pub name: String,
    pub result: MatchResult,
    /// The persisted row, when the batch records results.
    pub entry: Option<LogEntry>,
}

/// A resume that could not be scored or recorded.
#[derive(Debug, Clone)]
pub struct FailedResume {
    pub name: String,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub jd_name: String,
    pub scored: Vec<ScoredResume>,
    pub failures: Vec<FailedResume>,
}

impl BatchReport {
    /// True when there was at least one resume and none succeeded.
    pub fn all_failed(&self) -> bool {
        self.scored.is_empty() && !self.failures.is_empty()
    }
}

/// Everything a batch run needs, passed in explicitly.
pub struct Batch<'a> {
    pub scorer: &'a Scorer,
    pub extractor: Extractor,
    /// `None` skips recording.
    pub store: Option<&'a dyn LogStore>,
    pub max_resumes: usize,
    pub progress: &'a dyn ScoreProgressReporter,
}

/// A job description ready for scoring.
#[derive(Debug, Clone)]
pub struct JobDescription {
    pub name: String,
    pub text: String,
}

impl JobDescription {
    /// Load and extract a job description, rejecting one with no keywords.
    pub async fn load(extractor: Extractor, path: &Path) -> Result<Self> {
        let text = extract_blocking(extractor, path.to_path_buf())
            .await
            .with_context(|| format!("Failed to read job description {}", path.display()))?;
        Self::from_text(display_name(path), text)
    }

    pub fn from_text(name: impl Into<String>, text: String) -> Result<Self> {
        if tokenize(&text).is_empty() {
            return Err(ScoreError::EmptyInput.into());
        }
        Ok(Self {
            name: name.into(),
            text,
        })
    }
}

impl Batch<'_> {
    /// Score resumes from disk.
    pub async fn run(&self, jd: &JobDescription, resumes: &[PathBuf]) -> Result<BatchReport> {
        self.check_size(resumes.len())?;
        tracing::info!(jd = %jd.name, resumes = resumes.len(), "scoring batch");

        let mut report = BatchReport {
            jd_name: jd.name.clone(),
            ..BatchReport::default()
        };
        let total = resumes.len() as u64;

        for (i, path) in resumes.iter().enumerate() {
            let name = display_name(path);
            self.progress.report(ScoreProgressEvent::Scoring {
                jd: jd.name.clone(),
                resume: name.clone(),
                n: i as u64 + 1,
                total,
            });

            let outcome = match extract_blocking(self.extractor, path.clone()).await {
                Ok(text) => self.score_text(jd, &name, &text).await,
                Err(e) => Err(e),
            };
            push_outcome(&mut report, name, outcome);
        }

        tracing::info!(
            jd = %jd.name,
            scored = report.scored.len(),
            failed = report.failures.len(),
            "batch complete"
        );
        Ok(report)
    }

    /// Score in-memory uploads.
    pub async fn run_documents(
        &self,
        jd: &JobDescription,
        resumes: Vec<Document>,
    ) -> Result<BatchReport> {
        self.check_size(resumes.len())?;

        let mut report = BatchReport {
            jd_name: jd.name.clone(),
            ..BatchReport::default()
        };
        let total = resumes.len() as u64;

        for (i, doc) in resumes.into_iter().enumerate() {
            let name = doc.name.clone();
            self.progress.report(ScoreProgressEvent::Scoring {
                jd: jd.name.clone(),
                resume: name.clone(),
                n: i as u64 + 1,
                total,
            });

            let extractor = self.extractor;
            let extracted = tokio::task::spawn_blocking(move || extractor.extract(&doc))
                .await
                .context("extraction task failed");
            let outcome = match extracted {
                Ok(Ok(text)) => self.score_text(jd, &name, &text).await,
                Ok(Err(e)) => Err(e.into()),
                Err(e) => Err(e),
            };
            push_outcome(&mut report, name, outcome);
        }
        Ok(report)
    }

    async fn score_text(&self, jd: &JobDescription, name: &str, text: &str) -> Result<ScoredResume> {
        let result = self.scorer.score(&jd.text, text).await?;
        let entry = match self.store {
            Some(log) => Some(
                store::record(log, name, &result)
                    .await
                    .context("Failed to record result")?,
            ),
            None => None,
        };
        Ok(ScoredResume {
            name: name.to_string(),
            result,
            entry,
        })
    }

    fn check_size(&self, n: usize) -> Result<()> {
        if n > self.max_resumes {
            bail!(
                "Batch of {} resumes exceeds batch.max_resumes ({})",
                n,
                self.max_resumes
            );
        }
        Ok(())
    }
}

fn push_outcome(report: &mut BatchReport, name: String, outcome: Result<ScoredResume>) {
    match outcome {
        Ok(scored) => {
            tracing::debug!(
                resume = %scored.name,
                final_score = scored.result.final_score,
                verdict = %scored.result.verdict,
                "scored"
            );
            report.scored.push(scored);
        }
        Err(e) => {
            tracing::warn!(resume = %name, error = %format!("{:#}", e), "resume failed");
            report.failures.push(FailedResume {
                name,
                error: format!("{:#}", e),
            });
        }
    }
}

/// Load and extract a document on the blocking pool.
pub async fn extract_blocking(extractor: Extractor, path: PathBuf) -> Result<String> {
    let text = tokio::task::spawn_blocking(move || extractor.extract_path(&path))
        .await
        .context("extraction task failed")??;
    Ok(text)
}

/// The file name of a path, or the whole path when it has none.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
