//! # Resume Relevance
//!
//! Scores resumes against a job description and keeps an audit log of every
//! result.
//!
//! Each resume gets two signals: a hard keyword-overlap score (share of the
//! job description's distinct words present in the resume) and a semantic
//! score (cosine similarity of sentence embeddings). They are fused with
//! fixed weights (0.6 / 0.4 by default) into a final score and a
//! High / Medium / Low verdict.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────────────┐   ┌───────────┐
//! │  Extract   │──▶│ Hard match  Semantic │──▶│  Fuse +   │
//! │ PDF / DOCX │   │  (keywords) (embed)  │   │  verdict  │
//! └────────────┘   └──────────────────────┘   └─────┬─────┘
//!                                                   │
//!                          ┌────────────────────────┤
//!                          ▼                        ▼
//!                    ┌───────────┐            ┌──────────┐
//!                    │  SQLite   │            │ CLI/CSV  │
//!                    │ audit log │            │  (rrc)   │
//!                    └───────────┘            └──────────┘
//! ```
//!
//! The scoring algorithms live in `resume-relevance-core`; this crate adds
//! document extraction, embedding backends, persistence, and the CLI.
//!
//! ## Quick Start
//!
//! ```bash
//! rrc init
//! rrc score --jd jd.docx alice.pdf bob.docx --csv results.csv
//! rrc log --limit 20
//! rrc matrix --jd-dir jds/ --resume-dir resumes/ --output matrix.csv
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`extract`] | PDF / DOCX text extraction |
//! | [`embedding`] | Local, OpenAI, and Ollama encoders |
//! | [`batch`] | One JD against many resumes, failure-isolated |
//! | [`matrix`] | Every JD against every resume |
//! | [`export`] | CSV output |
//! | [`sqlite_store`] | SQLite-backed audit log |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`progress`] | Batch progress on stderr |
//! | [`stats`] | Audit log summary |

pub mod batch;
pub mod config;
pub mod db;
pub mod embedding;
pub mod export;
pub mod extract;
pub mod log_cmd;
pub mod matrix;
pub mod migrate;
pub mod progress;
pub mod score_cmd;
pub mod sqlite_store;
pub mod stats;

pub use extract::{extract_text, Document, DocumentKind, ExtractError};
