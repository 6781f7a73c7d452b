//! The `examkit` binary.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod commands;
mod render;

#[derive(Parser)]
#[command(
    name = "examkit",
    version,
    about = "Timed exams with negative-marking scoring"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate exam files
    Validate {
        /// Path to an exam file (.toml/.json) or a directory of them
        #[arg(long)]
        exam: PathBuf,
    },

    /// Score one answer sheet
    Score {
        /// Path to the exam file
        #[arg(long)]
        exam: PathBuf,

        /// Path to the answer sheet JSON
        #[arg(long)]
        answers: PathBuf,

        /// User id recorded on the report
        #[arg(long)]
        user: Option<String>,

        /// Persist the report through the configured store
        #[arg(long)]
        save: bool,

        /// Output format: text, json, html
        #[arg(long, default_value = "text")]
        format: String,

        /// Output file (json/html)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Take a timed exam interactively
    Take {
        /// Path to the exam file
        #[arg(long)]
        exam: PathBuf,

        /// User id recorded on the report
        #[arg(long)]
        user: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Score a directory of answer sheets
    Grade {
        /// Path to the exam file
        #[arg(long)]
        exam: PathBuf,

        /// Directory of answer sheets; each file stem is the user id
        #[arg(long)]
        answers_dir: PathBuf,

        /// Max concurrent sheets (defaults to the configured value)
        #[arg(long)]
        parallelism: Option<usize>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List or delete stored reports
    Reports {
        /// User whose reports to list
        #[arg(long)]
        user: String,

        /// Delete the report with this id instead of listing
        #[arg(long)]
        delete: Option<Uuid>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and a sample exam
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("examkit=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { exam } => commands::validate::execute(exam),
        Commands::Score {
            exam,
            answers,
            user,
            save,
            format,
            output,
            config,
        } => commands::score::execute(exam, answers, user, save, format, output, config).await,
        Commands::Take { exam, user, config } => {
            commands::take::execute(exam, user, config).await
        }
        Commands::Grade {
            exam,
            answers_dir,
            parallelism,
            config,
        } => commands::grade::execute(exam, answers_dir, parallelism, config).await,
        Commands::Reports {
            user,
            delete,
            config,
        } => commands::reports::execute(user, delete, config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
