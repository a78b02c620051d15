//! # Resume Relevance Core
//!
//! Runtime-agnostic scoring logic for Resume Relevance: tokenization, the
//! keyword ("hard") matcher, verdict tiers, weighted score fusion, semantic
//! scoring over an injected [`semantic::Encoder`], and the append-only
//! [`store::LogStore`] abstraction.
//!
//! This crate contains no tokio, sqlx, filesystem I/O, or model runtime.
//! Text extraction, embedding providers, and SQLite persistence live in the
//! `resume-relevance` application crate.
//!
//! ## Pipeline
//!
//! ```text
//!  JD text ─┬─▶ keywords::compute_hard_match ──┐
//!           │                                  ├─▶ FusionWeights::fuse ─▶ get_verdict ─▶ MatchResult
//!  resume ──┴─▶ semantic::compute_semantic_score┘
//! ```

pub mod highlight;
pub mod keywords;
pub mod models;
pub mod pipeline;
pub mod scoring;
pub mod semantic;
pub mod store;

pub use keywords::{compute_hard_match, tokenize, HardMatch};
pub use models::{LogEntry, MatchResult, NewLogEntry, Verdict};
pub use pipeline::{ScoreError, Scorer};
pub use scoring::{final_score, get_verdict, FusionWeights};
pub use semantic::{compute_semantic_score, Encoder};
