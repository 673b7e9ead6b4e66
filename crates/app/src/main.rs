//! exam: take a timed exam in the terminal, export papers, and show results.

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod db;
mod terminal;

#[derive(Parser)]
#[command(name = "exam", version, about = "Timed exam sessions in the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Overrides for settings otherwise read from `EXAM_*` environment variables.
#[derive(Args, Debug, Clone, Default)]
pub struct StorageArgs {
    /// SQLite database (default: EXAM_DB_URL or sqlite:exam.sqlite3)
    #[arg(long)]
    pub db: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Take (or resume) an exam
    Take {
        /// Paper JSON file
        #[arg(long)]
        paper: PathBuf,

        /// Candidate id; progress is saved and resumed under this id
        #[arg(long)]
        candidate_id: String,

        /// Candidate name
        #[arg(long)]
        name: String,

        /// Endpoint receiving the result as JSON (default: EXAM_RESULT_SINK_URL)
        #[arg(long)]
        sink_url: Option<String>,

        #[command(flatten)]
        storage: StorageArgs,
    },

    /// Print the question paper or its answer key
    Export {
        /// Paper JSON file
        #[arg(long)]
        paper: PathBuf,

        /// Print the answer key instead of the questions
        #[arg(long)]
        answer_key: bool,

        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Show the question-wise analysis of a submitted exam
    Result {
        /// Paper JSON file the exam was taken on
        #[arg(long)]
        paper: PathBuf,

        /// Candidate id
        #[arg(long)]
        candidate_id: String,

        #[command(flatten)]
        storage: StorageArgs,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,services=info")),
        )
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let result = runtime.block_on(async {
        match cli.command {
            Commands::Take {
                paper,
                candidate_id,
                name,
                sink_url,
                storage,
            } => commands::take::execute(paper, candidate_id, name, sink_url, storage).await,
            Commands::Export {
                paper,
                answer_key,
                output,
            } => commands::export::execute(paper, answer_key, output).await,
            Commands::Result {
                paper,
                candidate_id,
                storage,
            } => commands::result::execute(paper, candidate_id, storage).await,
        }
    });

    // A pending stdin read cannot be cancelled; do not wait for it.
    runtime.shutdown_background();

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
