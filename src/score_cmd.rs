//! `rrc score` and `rrc matrix`.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

use resume_relevance_core::highlight::{highlight_keywords, top_missing};
use resume_relevance_core::store::LogStore;
use resume_relevance_core::Scorer;

use crate::batch::{Batch, BatchReport, JobDescription};
use crate::config::Config;
use crate::embedding::create_encoder;
use crate::export::{self, ExportRow};
use crate::extract::Extractor;
use crate::matrix;
use crate::progress::ProgressMode;
use crate::sqlite_store::SqliteLogStore;

const HIGHLIGHT_OPEN: &str = "**";
const HIGHLIGHT_CLOSE: &str = "**";

pub struct ScoreOptions {
    pub csv: Option<PathBuf>,
    pub record: bool,
    pub highlight: bool,
    pub progress: ProgressMode,
}

/// Build a scorer from the `[embedding]` and `[scoring]` sections.
pub fn build_scorer(config: &Config) -> Result<Scorer> {
    let encoder = create_encoder(&config.embedding)?;
    Ok(Scorer::new(encoder, config.scoring.weights()?))
}

pub async fn run_score(
    config: &Config,
    jd_path: &Path,
    resumes: &[PathBuf],
    opts: ScoreOptions,
) -> Result<()> {
    let extractor = Extractor::new(config.extract.max_bytes);
    let jd = JobDescription::load(extractor, jd_path).await?;
    let scorer = build_scorer(config)?;

    let store = if opts.record {
        Some(SqliteLogStore::open(config).await?)
    } else {
        None
    };
    let reporter = opts.progress.reporter();

    let batch = Batch {
        scorer: &scorer,
        extractor,
        store: store.as_ref().map(|s| s as &dyn LogStore),
        max_resumes: config.batch.max_resumes,
        progress: &*reporter,
    };
    let report = batch.run(&jd, resumes).await?;
    if let Some(store) = store {
        store.close().await;
    }

    print_report(&report, &jd, config.scoring.top_missing, opts.highlight);

    if let Some(path) = &opts.csv {
        let rows: Vec<ExportRow> = report.scored.iter().map(ExportRow::from).collect();
        export::export_log_csv(path, &rows)?;
        eprintln!("Wrote {} rows to {}", rows.len(), path.display());
    }

    if report.all_failed() {
        bail!("All {} resumes failed", report.failures.len());
    }
    Ok(())
}

fn print_report(report: &BatchReport, jd: &JobDescription, top_n: usize, highlight: bool) {
    println!("Job description: {}", report.jd_name);
    println!();

    if !report.scored.is_empty() {
        println!(
            "{:<32} {:>8} {:>9} {:>8}  {}",
            "RESUME", "HARD", "SEMANTIC", "FINAL", "VERDICT"
        );
        println!("{}", "-".repeat(70));
        for s in &report.scored {
            println!(
                "{:<32} {:>8.2} {:>9.2} {:>8.2}  {}",
                truncate(&s.name, 32),
                s.result.hard_score,
                s.result.semantic_score,
                s.result.final_score,
                s.result.verdict
            );
            let missing = top_missing(&s.result.missing_keywords, top_n);
            if !missing.is_empty() {
                println!("    missing: {}", missing.join(", "));
            }
        }
    }

    if highlight {
        for s in &report.scored {
            println!();
            println!("--- {} (missing keywords marked) ---", s.name);
            println!("{}", highlighted_jd(&jd.text, &s.name, &s.result.missing_keywords));
        }
    }

    if !report.failures.is_empty() {
        eprintln!();
        eprintln!("Failed ({}):", report.failures.len());
        for f in &report.failures {
            eprintln!("  {}: {}", f.name, f.error);
        }
    }
}

/// The JD with `missing` marked, or the plain JD when the keywords cannot be compiled.
fn highlighted_jd(jd_text: &str, resume: &str, missing: &[String]) -> String {
    match highlight_keywords(jd_text, missing, HIGHLIGHT_OPEN, HIGHLIGHT_CLOSE) {
        Ok(marked) => marked,
        Err(e) => {
            tracing::warn!(resume = %resume, error = %e, "could not highlight missing keywords");
            jd_text.to_string()
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

pub async fn run_matrix(
    config: &Config,
    jd_dir: &Path,
    resume_dir: &Path,
    output: &Path,
    top: usize,
    progress: ProgressMode,
) -> Result<()> {
    let extractor = Extractor::new(config.extract.max_bytes);
    let scorer = build_scorer(config)?;
    let reporter = progress.reporter();

    let report = matrix::run_matrix(
        &scorer,
        extractor,
        &config.batch,
        jd_dir,
        resume_dir,
        &*reporter,
    )
    .await?;

    export::export_matrix_csv(output, &report.rows)?;
    eprintln!("Wrote {} rows to {}", report.rows.len(), output.display());

    for (jd, rows) in report.top_per_jd(top) {
        println!();
        println!("Top {} for {}:", rows.len(), jd);
        for (rank, row) in rows.iter().enumerate() {
            println!(
                "  {}. {:<32} {:>8.2}  {}",
                rank + 1,
                truncate(&row.resume_file, 32),
                row.final_score,
                row.verdict
            );
        }
    }

    if !report.failures.is_empty() {
        eprintln!();
        eprintln!("Skipped ({}):", report.failures.len());
        for f in &report.failures {
            eprintln!("  {}: {}", f.name, f.error);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_long_names() {
        assert_eq!(truncate("short.pdf", 32), "short.pdf");
        assert_eq!(truncate("abcdef", 4), "abc…");
    }

    #[test]
    fn highlighted_jd_marks_missing_words() {
        let missing = vec!["sql".to_string(), "sql".to_string()];
        assert_eq!(
            highlighted_jd("Python, SQL and MySQL", "cv.pdf", &missing),
            "Python, **SQL** and MySQL"
        );
        assert_eq!(highlighted_jd("Python", "cv.pdf", &[]), "Python");
    }

    #[test]
    fn disabled_embeddings_build_a_keyword_only_scorer() {
        let mut config = Config::minimal();
        config.embedding = crate::config::EmbeddingConfig::disabled();
        let scorer = build_scorer(&config).unwrap();
        assert!(scorer.encoder().is_none());
        assert_eq!(scorer.weights().hard(), 0.6);
    }
}
