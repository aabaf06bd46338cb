mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "subtrace",
    about = "Correlate delegated Claude tasks with the files they created, edited and deleted",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: $CLAUDE_PROJECT_DIR, else auto-detect from .claude/ or .git/)
    #[arg(long, global = true, env = "SUBTRACE_ROOT")]
    root: Option<PathBuf>,

    /// Turn internal failures into blocking hook responses
    #[arg(long, global = true)]
    strict: bool,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Handle one hook event: JSON on stdin, JSON on stdout
    Hook,

    /// Classify a transcript without touching the pending-task store
    Analyze {
        /// Path to the transcript (.jsonl)
        transcript: PathBuf,

        /// Directory relative paths in the transcript resolve against
        #[arg(long)]
        cwd: Option<PathBuf>,
    },

    /// List pending task records
    Pending,

    /// Remove pending task records whose stop event never arrived
    Prune {
        /// Remove records started more than this many hours ago
        #[arg(long)]
        older_than_hours: u32,

        /// Show what would be removed without writing
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    // stdout carries the hook response; all logging goes to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::level_filters::LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Hook => cmd::hook::run(&root, cli.strict),
        Commands::Analyze { transcript, cwd } => {
            cmd::analyze::run(&root, &transcript, cwd.as_deref())
        }
        Commands::Pending => cmd::pending::run(&root, cli.json),
        Commands::Prune {
            older_than_hours,
            dry_run,
        } => cmd::prune::run(&root, older_than_hours, dry_run, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
