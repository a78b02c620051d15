//! # Resume Relevance CLI (`rrc`)
//!
//! Scores resumes against a job description, records every result in a
//! SQLite audit log, and exports results as CSV.
//!
//! ## Usage
//!
//! ```bash
//! rrc --config ./config/rrc.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rrc init` | Create the SQLite database and run schema migrations |
//! | `rrc extract <file>` | Print the plain text of a PDF or DOCX |
//! | `rrc score --jd <file> <resume>...` | Score resumes against a job description |
//! | `rrc matrix --jd-dir <dir> --resume-dir <dir>` | Score every JD against every resume |
//! | `rrc log` | Show the audit log, newest first |
//! | `rrc stats` | Verdict counts and mean scores |
//! | `rrc completions <shell>` | Print shell completions |

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use resume_relevance::config::{self, Config};
use resume_relevance::extract::Extractor;
use resume_relevance::progress::ProgressMode;
use resume_relevance::score_cmd::{self, ScoreOptions};
use resume_relevance::{log_cmd, migrate, stats};

/// Resume Relevance CLI: keyword and embedding based resume scoring.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/rrc.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "rrc",
    about = "Score resumes against a job description with keyword overlap and sentence embeddings",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/rrc.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the `resume_logs` table.
    /// Running it again is safe.
    Init,

    /// Print the extracted plain text of a PDF or DOCX file.
    ///
    /// Does not need a config file.
    Extract {
        /// Document to extract.
        file: PathBuf,
    },

    /// Score resumes against a job description.
    ///
    /// Each resume is extracted, scored, and recorded in the audit log.
    /// A resume that fails is reported and the rest continue.
    Score {
        /// Job description (PDF or DOCX).
        #[arg(long)]
        jd: PathBuf,

        /// Resumes (PDF or DOCX).
        #[arg(required = true)]
        resumes: Vec<PathBuf>,

        /// Also write the results to this CSV file.
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Do not record results in the audit log.
        #[arg(long)]
        no_record: bool,

        /// Print the job description with each resume's missing keywords marked.
        #[arg(long)]
        highlight: bool,

        /// Progress output on stderr. Defaults to human when stderr is a TTY.
        #[arg(long, value_enum)]
        progress: Option<ProgressArg>,
    },

    /// Score every job description in a directory against every resume in another.
    ///
    /// Results go to a CSV file and are not recorded in the audit log.
    Matrix {
        #[arg(long)]
        jd_dir: PathBuf,

        #[arg(long)]
        resume_dir: PathBuf,

        /// CSV output path.
        #[arg(long, default_value = "matrix_results.csv")]
        output: PathBuf,

        /// How many top resumes to print per job description.
        #[arg(long, default_value_t = 3)]
        top: usize,

        #[arg(long, value_enum)]
        progress: Option<ProgressArg>,
    },

    /// Show the audit log, newest first.
    Log {
        /// Show at most this many entries.
        #[arg(long)]
        limit: Option<usize>,

        /// Also export the shown entries to this CSV file.
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Verdict counts and mean scores over the audit log.
    Stats,

    /// Print shell completions to stdout.
    Completions {
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ProgressArg {
    Off,
    Human,
    Json,
}

fn progress_mode(arg: Option<ProgressArg>) -> ProgressMode {
    match arg {
        Some(ProgressArg::Off) => ProgressMode::Off,
        Some(ProgressArg::Human) => ProgressMode::Human,
        Some(ProgressArg::Json) => ProgressMode::Json,
        None => ProgressMode::default_for_tty(),
    }
}

/// Logs go to stderr. `RUST_LOG` wins over the configured level.
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Commands that don't require config
    match &cli.command {
        Commands::Completions { shell } => {
            clap_complete::generate(*shell, &mut Cli::command(), "rrc", &mut std::io::stdout());
            return Ok(());
        }
        Commands::Extract { file } => {
            // Use config if available, otherwise a minimal default
            let cfg = config::load_config(&cli.config).unwrap_or_else(|_| Config::minimal());
            init_tracing(&cfg.log.level);
            let text = Extractor::new(cfg.extract.max_bytes)
                .extract_path(file)
                .with_context(|| format!("Failed to extract {}", file.display()))?;
            println!("{}", text);
            return Ok(());
        }
        _ => {}
    }

    let cfg = config::load_config(&cli.config)?;
    init_tracing(&cfg.log.level);

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Score {
            jd,
            resumes,
            csv,
            no_record,
            highlight,
            progress,
        } => {
            let opts = ScoreOptions {
                csv,
                record: !no_record,
                highlight,
                progress: progress_mode(progress),
            };
            score_cmd::run_score(&cfg, &jd, &resumes, opts).await?;
        }
        Commands::Matrix {
            jd_dir,
            resume_dir,
            output,
            top,
            progress,
        } => {
            score_cmd::run_matrix(
                &cfg,
                &jd_dir,
                &resume_dir,
                &output,
                top,
                progress_mode(progress),
            )
            .await?;
        }
        Commands::Log { limit, csv } => {
            log_cmd::run_log(&cfg, limit, csv.as_deref()).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Completions { .. } | Commands::Extract { .. } => {
            // Handled above (before config loading)
        }
    }

    Ok(())
}
