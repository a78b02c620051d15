//! Keyword ("hard") matching between a job description and a resume.
//!
//! # Algorithm
//!
//! 1. Lowercase both texts and split them into word tokens (runs of Unicode
//!    word characters: letters, digits, underscore). Anything else separates.
//! 2. Collect the resume tokens into a set.
//! 3. Walk the JD tokens in order, duplicates included. A token is *matched*
//!    if the resume set contains it, otherwise *missing*.
//! 4. `score = round(100 × matched / jd_tokens, 2)`.
//!
//! A JD with no tokens scores `0.0` with nothing missing.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::scoring::round2;

fn word_pattern() -> &'static Regex {
    static WORD: OnceLock<Regex> = OnceLock::new();
    WORD.get_or_init(|| Regex::new(r"\w+").expect("constant pattern"))
}

/// Split text into lowercase word tokens, preserving order and duplicates.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    word_pattern()
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Result of [`compute_hard_match`].
#[derive(Debug, Clone, PartialEq)]
pub struct HardMatch {
    /// Percentage of JD tokens found in the resume, rounded to 2 decimals.
    pub score: f64,
    /// JD tokens present in the resume, in JD order.
    pub matched: Vec<String>,
    /// JD tokens absent from the resume, in JD order.
    pub missing: Vec<String>,
}

impl HardMatch {
    /// True when the job description produced no tokens at all.
    pub fn is_empty(&self) -> bool {
        self.matched.is_empty() && self.missing.is_empty()
    }
}

/// Compute the keyword overlap of `resume_text` against `jd_text`.
pub fn compute_hard_match(jd_text: &str, resume_text: &str) -> HardMatch {
    let jd_tokens = tokenize(jd_text);
    let resume_set: HashSet<String> = tokenize(resume_text).into_iter().collect();

    let (matched, missing): (Vec<String>, Vec<String>) = jd_tokens
        .into_iter()
        .partition(|token| resume_set.contains(token));

    let total = matched.len() + missing.len();
    let score = if total == 0 {
        0.0
    } else {
        round2(matched.len() as f64 / total as f64 * 100.0)
    };

    HardMatch {
        score,
        matched,
        missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_lowercases_and_splits_on_punctuation() {
        assert_eq!(
            tokenize("Rust, C++ & Node.js; k8s_ops"),
            vec!["rust", "c", "node", "js", "k8s_ops"]
        );
    }

    #[test]
    fn tokenize_keeps_unicode_words() {
        assert_eq!(tokenize("Café Über-Team"), vec!["café", "über", "team"]);
    }

    #[test]
    fn python_sql_scenario() {
        let m = compute_hard_match("Python SQL Python", "I know python and Java");
        assert_eq!(m.matched, vec!["python", "python"]);
        assert_eq!(m.missing, vec!["sql"]);
        assert_eq!(m.score, 66.67);
    }

    #[test]
    fn one_of_thirty_two_rounds_half_to_even() {
        let filler: Vec<String> = (0..31).map(|i| format!("w{}", i)).collect();
        let jd = format!("hit {}", filler.join(" "));
        let m = compute_hard_match(&jd, "hit");
        assert_eq!(m.matched, vec!["hit"]);
        assert_eq!(m.missing.len(), 31);
        assert_eq!(m.score, 3.12);

        let jd = format!("a b c d e {}", filler[..27].join(" "));
        assert_eq!(compute_hard_match(&jd, "a b c d e").score, 15.62);
    }

    #[test]
    fn empty_jd_scores_zero() {
        let m = compute_hard_match("", "plenty of resume text");
        assert_eq!(m.score, 0.0);
        assert!(m.missing.is_empty());
        assert!(m.is_empty());

        let m = compute_hard_match("  --- !!! ", "text");
        assert_eq!(m.score, 0.0);
        assert!(m.is_empty());
    }

    #[test]
    fn empty_resume_misses_everything() {
        let m = compute_hard_match("docker kubernetes docker", "");
        assert_eq!(m.score, 0.0);
        assert_eq!(m.missing, vec!["docker", "kubernetes", "docker"]);
    }

    #[test]
    fn full_overlap_scores_hundred() {
        let m = compute_hard_match("Rust; Tokio.", "tokio and RUST daily");
        assert_eq!(m.score, 100.0);
        assert!(m.missing.is_empty());
    }

    #[test]
    fn matching_is_whole_token_not_substring() {
        // "java" is a substring of "javascript" but not a token of it.
        let m = compute_hard_match("java", "javascript developer");
        assert_eq!(m.missing, vec!["java"]);
    }

    #[test]
    fn score_in_range_and_partition_covers_jd_tokens() {
        let cases = [
            ("senior rust engineer, async rust", "rust async"),
            ("a b c d e f g", "g f e"),
            ("Data: SQL, SQL, SQL", "nothing relevant"),
            ("one", "one"),
        ];
        for (jd, resume) in cases {
            let m = compute_hard_match(jd, resume);
            assert!((0.0..=100.0).contains(&m.score), "score {} for {:?}", m.score, jd);

            let jd_set: HashSet<String> = tokenize(jd).into_iter().collect();
            let union: HashSet<String> = m
                .matched
                .iter()
                .chain(m.missing.iter())
                .cloned()
                .collect();
            assert_eq!(union, jd_set);
            assert_eq!(m.matched.len() + m.missing.len(), tokenize(jd).len());
        }
    }

    #[test]
    fn repeated_calls_are_identical() {
        let jd = "Kafka, Flink and Spark streaming; Kafka Connect";
        let resume = "Built Spark jobs and Kafka consumers";
        assert_eq!(
            compute_hard_match(jd, resume),
            compute_hard_match(jd, resume)
        );
    }
}
