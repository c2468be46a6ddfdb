mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    changespec::ChangeSpecSubcommand, commit::CommitSubcommand, hook::HookSubcommand,
    query::QuerySubcommand, status::StatusSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "cs",
    about = "Track in-flight changes: status, commits, proposals, hooks and reviews",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .changespec/ or .git/)
    #[arg(long, global = true, env = "CHANGESPEC_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a project in the current directory
    Init {
        /// Project name (default: directory name)
        #[arg(long)]
        name: Option<String>,
    },

    /// Manage ChangeSpecs
    #[command(name = "changespec", visible_alias = "cl")]
    ChangeSpec {
        #[command(subcommand)]
        subcommand: ChangeSpecSubcommand,
    },

    /// Add commit and proposal entries
    Commit {
        #[command(subcommand)]
        subcommand: CommitSubcommand,
    },

    /// Manage hooks and inspect which ones need attention
    Hook {
        #[command(subcommand)]
        subcommand: HookSubcommand,
    },

    /// Filter ChangeSpecs with the query language
    Query {
        #[command(subcommand)]
        subcommand: QuerySubcommand,
    },

    /// Inspect the status transition table
    Status {
        #[command(subcommand)]
        subcommand: StatusSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    tracing::debug!(root = %root.display(), "resolved project root");

    let result = match cli.command {
        Commands::Init { name } => cmd::init::run(&root, name.as_deref(), cli.json),
        Commands::ChangeSpec { subcommand } => cmd::changespec::run(&root, subcommand, cli.json),
        Commands::Commit { subcommand } => cmd::commit::run(&root, subcommand, cli.json),
        Commands::Hook { subcommand } => cmd::hook::run(&root, subcommand, cli.json),
        Commands::Query { subcommand } => cmd::query::run(&root, subcommand, cli.json),
        Commands::Status { subcommand } => cmd::status::run(subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
