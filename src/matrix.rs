//! Score every job description in one directory against every resume in
//! another.
//!
//! Documents are discovered with `batch.include_globs`. Each resume is
//! extracted once and reused for every job description. Results are not
//! recorded in the audit log; they are returned as [`MatrixRow`]s for CSV
//! export and ranking. Documents are named by their path relative to the
//! scanned directory, so equal file names in different subdirectories stay
//! apart.

use anyhow::{bail, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use resume_relevance_core::Scorer;

use crate::batch::{extract_blocking, FailedResume, JobDescription};
use crate::config::BatchConfig;
use crate::export::MatrixRow;
use crate::extract::Extractor;
use crate::progress::{ScoreProgressEvent, ScoreProgressReporter};

#[derive(Debug, Default)]
pub struct MatrixReport {
    /// Rows in discovery order: job descriptions, then resumes.
    pub rows: Vec<MatrixRow>,
    /// Documents (job descriptions or resumes) that could not be used.
    pub failures: Vec<FailedResume>,
}

impl MatrixReport {
    /// The `n` best resumes for each job description, by final score.
    /// Keyed by the job description's path relative to `jd_dir`.
    pub fn top_per_jd(&self, n: usize) -> BTreeMap<String, Vec<&MatrixRow>> {
        let mut by_jd: BTreeMap<String, Vec<&MatrixRow>> = BTreeMap::new();
        for row in &self.rows {
            by_jd.entry(row.jd_file.clone()).or_default().push(row);
        }
        for rows in by_jd.values_mut() {
            rows.sort_by(|a, b| b.final_score.total_cmp(&a.final_score));
            rows.truncate(n);
        }
        by_jd
    }
}

/// Files under `root` whose relative path matches `include_globs`, sorted.
pub fn scan_documents(root: &Path, include_globs: &[String]) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        bail!("Directory does not exist: {}", root.display());
    }
    let include_set = build_globset(include_globs)?;

    let mut paths = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        if include_set.is_match(relative) {
            paths.push(path.to_path_buf());
        }
    }

    paths.sort();
    Ok(paths)
}

/// `path` relative to `root`, with `/` separators.
pub fn relative_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(GlobBuilder::new(pattern).case_insensitive(true).build()?);
    }
    Ok(builder.build()?)
}

pub async fn run_matrix(
    scorer: &Scorer,
    extractor: Extractor,
    batch: &BatchConfig,
    jd_dir: &Path,
    resume_dir: &Path,
    progress: &dyn ScoreProgressReporter,
) -> Result<MatrixReport> {
    progress.report(ScoreProgressEvent::Discovering {
        dir: jd_dir.display().to_string(),
    });
    let jd_paths = scan_documents(jd_dir, &batch.include_globs)?;
    progress.report(ScoreProgressEvent::Discovering {
        dir: resume_dir.display().to_string(),
    });
    let resume_paths = scan_documents(resume_dir, &batch.include_globs)?;

    if resume_paths.len() > batch.max_resumes {
        bail!(
            "{} resumes found in {}, exceeds batch.max_resumes ({})",
            resume_paths.len(),
            resume_dir.display(),
            batch.max_resumes
        );
    }
    tracing::info!(
        jds = jd_paths.len(),
        resumes = resume_paths.len(),
        "scoring matrix"
    );

    let mut report = MatrixReport::default();

    let mut resumes = Vec::with_capacity(resume_paths.len());
    for path in &resume_paths {
        let name = relative_name(resume_dir, path);
        match extract_blocking(extractor, path.clone()).await {
            Ok(text) => resumes.push((name, text)),
            Err(e) => {
                tracing::warn!(resume = %name, error = %format!("{:#}", e), "skipping resume");
                report.failures.push(FailedResume {
                    name,
                    error: format!("{:#}", e),
                });
            }
        }
    }

    let total = resumes.len() as u64;
    for jd_path in &jd_paths {
        let name = relative_name(jd_dir, jd_path);
        let jd = match JobDescription::load(extractor, jd_path).await {
            Ok(jd) => JobDescription { name, ..jd },
            Err(e) => {
                tracing::warn!(jd = %name, error = %format!("{:#}", e), "skipping job description");
                report.failures.push(FailedResume {
                    name,
                    error: format!("{:#}", e),
                });
                continue;
            }
        };

        for (i, (name, text)) in resumes.iter().enumerate() {
            progress.report(ScoreProgressEvent::Scoring {
                jd: jd.name.clone(),
                resume: name.clone(),
                n: i as u64 + 1,
                total,
            });
            match scorer.score(&jd.text, text).await {
                Ok(result) => report.rows.push(MatrixRow::new(&jd.name, name, &result)),
                Err(e) => report.failures.push(FailedResume {
                    name: format!("{} × {}", jd.name, name),
                    error: e.to_string(),
                }),
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use resume_relevance_core::models::MatchResult;
    use resume_relevance_core::{FusionWeights, Verdict};
    use std::io::Write;

    fn write_docx(path: &Path, text: &str) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        let xml = format!(
            "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:body></w:document>",
            text
        );
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }

    fn row(jd: &str, resume: &str, final_score: f64) -> MatrixRow {
        MatrixRow::new(
            jd,
            resume,
            &MatchResult {
                hard_score: 0.0,
                missing_keywords: vec![],
                semantic_score: 0.0,
                final_score,
                verdict: Verdict::Low,
            },
        )
    }

    #[test]
    fn scan_respects_globs_case_insensitively() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("nested")).unwrap();
        std::fs::write(tmp.path().join("a.pdf"), b"x").unwrap();
        std::fs::write(tmp.path().join("nested/B.DOCX"), b"x").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), b"x").unwrap();

        let globs = vec!["**/*.pdf".to_string(), "**/*.docx".to_string()];
        let found = scan_documents(tmp.path(), &globs).unwrap();
        let names: Vec<String> = found.iter().map(|p| relative_name(tmp.path(), p)).collect();
        assert_eq!(names, vec!["a.pdf", "nested/B.DOCX"]);
    }

    #[test]
    fn top_per_jd_ranks_by_final_score() {
        let report = MatrixReport {
            rows: vec![
                row("jd1", "a", 10.0),
                row("jd1", "b", 90.0),
                row("jd1", "c", 50.0),
                row("jd2", "a", 5.0),
            ],
            failures: vec![],
        };
        let top = report.top_per_jd(2);
        let jd1: Vec<&str> = top["jd1"].iter().map(|r| r.resume_file.as_str()).collect();
        assert_eq!(jd1, vec!["b", "c"]);
        assert_eq!(top["jd2"].len(), 1);
    }

    #[tokio::test]
    async fn every_jd_is_scored_against_every_resume() {
        let tmp = tempfile::TempDir::new().unwrap();
        let jds = tmp.path().join("jds");
        let resumes = tmp.path().join("resumes");
        std::fs::create_dir_all(&jds).unwrap();
        std::fs::create_dir_all(&resumes).unwrap();
        write_docx(&jds.join("backend.docx"), "rust sql");
        write_docx(&jds.join("data.docx"), "python sql");
        write_docx(&resumes.join("alice.docx"), "rust sql kafka");
        write_docx(&resumes.join("bob.docx"), "python sql");
        std::fs::write(resumes.join("broken.pdf"), b"not a pdf").unwrap();

        let scorer = Scorer::keyword_only(FusionWeights::default());
        let report = run_matrix(
            &scorer,
            Extractor::unbounded(),
            &BatchConfig::default(),
            &jds,
            &resumes,
            &NoProgress,
        )
        .await
        .unwrap();

        assert_eq!(report.rows.len(), 4);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].name, "broken.pdf");

        let top = report.top_per_jd(1);
        assert_eq!(top["backend.docx"][0].resume_file, "alice.docx");
        assert_eq!(top["data.docx"][0].resume_file, "bob.docx");
    }

    #[tokio::test]
    async fn same_named_jds_in_subdirectories_rank_separately() {
        let tmp = tempfile::TempDir::new().unwrap();
        let jds = tmp.path().join("jds");
        let resumes = tmp.path().join("resumes");
        std::fs::create_dir_all(jds.join("team-a")).unwrap();
        std::fs::create_dir_all(jds.join("team-b")).unwrap();
        std::fs::create_dir_all(&resumes).unwrap();
        write_docx(&jds.join("team-a/backend.docx"), "rust tokio");
        write_docx(&jds.join("team-b/backend.docx"), "java spring");
        write_docx(&resumes.join("alice.docx"), "rust tokio");
        write_docx(&resumes.join("bob.docx"), "java spring");

        let scorer = Scorer::keyword_only(FusionWeights::default());
        let report = run_matrix(
            &scorer,
            Extractor::unbounded(),
            &BatchConfig::default(),
            &jds,
            &resumes,
            &NoProgress,
        )
        .await
        .unwrap();

        let top = report.top_per_jd(1);
        assert_eq!(top.len(), 2);
        assert_eq!(top["team-a/backend.docx"][0].resume_file, "alice.docx");
        assert_eq!(top["team-b/backend.docx"][0].resume_file, "bob.docx");
        assert!(report.rows.iter().all(|r| r.jd_file.starts_with("team-")));
    }
}
