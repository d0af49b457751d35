//! CLI frontend for the hotaru scene player.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "hotaru",
    about = "Play, check, and inspect hotaru scene scripts",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a scene script interactively in the terminal
    Play {
        /// Path to the scene script JSON
        script: PathBuf,

        /// Progress file to record into (default: hotaru-progress.json)
        #[arg(short, long)]
        progress: Option<PathBuf>,

        /// Keep progress in memory for this run only
        #[arg(long)]
        ephemeral: bool,
    },

    /// Validate a scene script and report diagnostics
    Check {
        /// Path to the scene script JSON
        script: PathBuf,
    },

    /// Summarize a scene script's lines, commands, and assets
    Show {
        /// Path to the scene script JSON
        script: PathBuf,
    },

    /// Inspect or manage the saved progress record
    Progress {
        /// Progress file to read
        #[arg(short, long, default_value = "hotaru-progress.json")]
        file: PathBuf,

        /// Scene total used for the completion rate
        #[arg(long, default_value_t = hotaru_progress::DEFAULT_TOTAL_SCENES)]
        total: usize,

        /// Print the raw record as JSON
        #[arg(long)]
        export: bool,

        /// Clear the record back to a fresh state
        #[arg(long)]
        reset: bool,
    },

    /// Create a scene project with a starter script
    Init {
        /// Name of the directory to create
        name: String,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Play {
            script,
            progress,
            ephemeral,
        } => commands::play::run(&script, progress.as_deref(), ephemeral),
        Commands::Check { script } => commands::check::run(&script),
        Commands::Show { script } => commands::show::run(&script),
        Commands::Progress {
            file,
            total,
            export,
            reset,
        } => commands::progress::run(&file, total, export, reset),
        Commands::Init { name } => commands::init::run(&name),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
