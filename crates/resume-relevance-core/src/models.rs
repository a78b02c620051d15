//! Core data models shared by the scoring pipeline and the log store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse relevance tier derived from a numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    High,
    Medium,
    Low,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::High => "High",
            Verdict::Medium => "Medium",
            Verdict::Low => "Low",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "High" => Ok(Verdict::High),
            "Medium" => Ok(Verdict::Medium),
            "Low" => Ok(Verdict::Low),
            other => Err(format!("unknown verdict: '{}'", other)),
        }
    }
}

/// Outcome of scoring one resume against one job description.
///
/// `final_score` is always `round(hard·w_h + semantic·w_s, 2)` for the
/// weights the [`Scorer`](crate::pipeline::Scorer) was built with, and
/// `verdict` is derived from `final_score` alone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub hard_score: f64,
    /// JD tokens absent from the resume, in JD order, duplicates kept.
    pub missing_keywords: Vec<String>,
    pub semantic_score: f64,
    pub final_score: f64,
    pub verdict: Verdict,
}

impl MatchResult {
    /// The persisted form of `missing_keywords`: comma-space-joined.
    pub fn missing_keywords_joined(&self) -> String {
        self.missing_keywords.join(", ")
    }
}

/// A log row before the store assigns its id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLogEntry {
    pub resume_name: String,
    pub hard_score: f64,
    pub semantic_score: f64,
    pub final_score: f64,
    pub verdict: Verdict,
    pub missing_keywords: String,
}

impl NewLogEntry {
    pub fn from_result(resume_name: &str, result: &MatchResult) -> Self {
        Self {
            resume_name: resume_name.to_string(),
            hard_score: result.hard_score,
            semantic_score: result.semantic_score,
            final_score: result.final_score,
            verdict: result.verdict,
            missing_keywords: result.missing_keywords_joined(),
        }
    }
}

/// An immutable audit-log row. Created once per scored resume.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub id: i64,
    pub resume_name: String,
    pub hard_score: f64,
    pub semantic_score: f64,
    pub final_score: f64,
    pub verdict: Verdict,
    pub missing_keywords: String,
    pub created_at: DateTime<Utc>,
}

impl LogEntry {
    /// Split the stored keyword string back into tokens.
    pub fn missing_keywords_list(&self) -> Vec<String> {
        if self.missing_keywords.is_empty() {
            return Vec::new();
        }
        self.missing_keywords
            .split(", ")
            .map(|s| s.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_parses_its_own_display() {
        for v in [Verdict::High, Verdict::Medium, Verdict::Low] {
            assert_eq!(v.to_string().parse::<Verdict>().unwrap(), v);
        }
        assert!("high".parse::<Verdict>().is_err());
    }

    #[test]
    fn empty_keyword_string_splits_to_nothing() {
        let entry = LogEntry {
            id: 1,
            resume_name: "a.pdf".to_string(),
            hard_score: 100.0,
            semantic_score: 50.0,
            final_score: 80.0,
            verdict: Verdict::High,
            missing_keywords: String::new(),
            created_at: Utc::now(),
        };
        assert!(entry.missing_keywords_list().is_empty());

        let entry = LogEntry {
            missing_keywords: "sql, sql, docker".to_string(),
            ..entry
        };
        assert_eq!(entry.missing_keywords_list(), vec!["sql", "sql", "docker"]);
    }
}
