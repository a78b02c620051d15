//! Marking keywords inside text for display.
//!
//! Matching is case-insensitive and respects word boundaries, so `java`
//! never lights up inside `javascript`. All keywords are matched in a single
//! pass; inserted markers are never re-scanned.

use regex::RegexBuilder;
use std::collections::HashSet;

/// Compiled-size ceiling for the keyword alternation (the `regex` default).
const PATTERN_SIZE_LIMIT: usize = 10 * (1 << 20);

/// Wrap every whole-word occurrence of any keyword in `open`/`close`.
///
/// Fails only when the keyword set is too large to compile into one pattern.
pub fn highlight_keywords(
    text: &str,
    keywords: &[String],
    open: &str,
    close: &str,
) -> Result<String, regex::Error> {
    highlight_with_limit(text, keywords, open, close, PATTERN_SIZE_LIMIT)
}

fn highlight_with_limit(
    text: &str,
    keywords: &[String],
    open: &str,
    close: &str,
    size_limit: usize,
) -> Result<String, regex::Error> {
    let mut unique: Vec<&str> = Vec::new();
    let mut seen = HashSet::new();
    for kw in keywords {
        if !kw.is_empty() && seen.insert(kw.as_str()) {
            unique.push(kw.as_str());
        }
    }
    if unique.is_empty() {
        return Ok(text.to_string());
    }
    // Longest first so a keyword that prefixes another never wins the alternation.
    unique.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));

    let alternation = unique
        .iter()
        .map(|kw| regex::escape(kw))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(r"(?i)\b(?:{})\b", alternation);

    let re = RegexBuilder::new(&pattern).size_limit(size_limit).build()?;
    Ok(re
        .replace_all(text, |caps: &regex::Captures| {
            format!("{}{}{}", open, &caps[0], close)
        })
        .into_owned())
}

/// First `n` distinct keywords, in their original order.
pub fn top_missing(missing: &[String], n: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    missing
        .iter()
        .filter(|kw| seen.insert(kw.as_str()))
        .take(n)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kws(words: &[&str]) -> Vec<String> {
        words.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn highlights_whole_words_only() {
        let out = highlight_keywords(
            "Java and JavaScript; java.",
            &kws(&["java"]),
            "[",
            "]",
        )
        .unwrap();
        assert_eq!(out, "[Java] and JavaScript; [java].");
    }

    #[test]
    fn overlapping_keywords_do_not_nest() {
        // A naive sequential replace would wrap "span" inside the first marker.
        let out =
            highlight_keywords("sql span", &kws(&["sql", "span"]), "<span>", "</span>").unwrap();
        assert_eq!(out, "<span>sql</span> <span>span</span>");
    }

    #[test]
    fn no_keywords_leaves_text_unchanged() {
        assert_eq!(highlight_keywords("plain", &[], "[", "]").unwrap(), "plain");
    }

    #[test]
    fn oversized_pattern_is_reported() {
        let err = highlight_with_limit("rust tokio", &kws(&["rust", "tokio"]), "[", "]", 16)
            .unwrap_err();
        assert!(matches!(err, regex::Error::CompiledTooBig(_)));

        let out = highlight_with_limit("plain", &[], "[", "]", 16).unwrap();
        assert_eq!(out, "plain");
    }

    #[test]
    fn top_missing_dedups_in_order() {
        let missing = kws(&["sql", "docker", "sql", "aws", "docker", "gcp"]);
        assert_eq!(top_missing(&missing, 3), kws(&["sql", "docker", "aws"]));
        assert_eq!(top_missing(&missing, 10).len(), 4);
    }
}
