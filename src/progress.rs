//! Batch progress reporting.
//!
//! `rrc score` and `rrc matrix` report which document is being scored and
//! how many are left. Progress goes to **stderr** so stdout (tables, CSV)
//! stays parseable for scripts.

use std::io::Write;

/// A single progress event for a scoring run.
#[derive(Clone, Debug)]
pub enum ScoreProgressEvent {
    /// Scanning a directory for documents. Total unknown.
    Discovering { dir: String },
    /// Scoring: `n` resumes done out of `total` for this job description.
    Scoring {
        jd: String,
        resume: String,
        n: u64,
        total: u64,
    },
}

/// Reports scoring progress. Implementations write to stderr (human or JSON).
pub trait ScoreProgressReporter: Send + Sync {
    fn report(&self, event: ScoreProgressEvent);
}

/// Human-friendly progress on stderr: "score jd.docx  12 / 40  alice.pdf".
pub struct StderrProgress;

impl ScoreProgressReporter for StderrProgress {
    fn report(&self, event: ScoreProgressEvent) {
        let line = match &event {
            ScoreProgressEvent::Discovering { dir } => format!("scan {}  discovering...\n", dir),
            ScoreProgressEvent::Scoring { jd, resume, n, total } => format!(
                "score {}  {} / {}  {}\n",
                jd,
                format_number(*n),
                format_number(*total),
                resume
            ),
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ScoreProgressReporter for JsonProgress {
    fn report(&self, event: ScoreProgressEvent) {
        let obj = match &event {
            ScoreProgressEvent::Discovering { dir } => serde_json::json!({
                "event": "progress",
                "phase": "discovering",
                "dir": dir
            }),
            ScoreProgressEvent::Scoring { jd, resume, n, total } => serde_json::json!({
                "event": "progress",
                "phase": "scoring",
                "jd": jd,
                "resume": resume,
                "n": n,
                "total": total
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ScoreProgressReporter for NoProgress {
    fn report(&self, _event: ScoreProgressEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn ScoreProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
