use anyhow::Result;
use clap::{Parser, Subcommand};
use sdg_slicer::commands::{
    add_program_command, init_project_command, list_programs_command, list_runs_command,
    project_info_command, slice_command, SliceArgs,
};
use tracing_subscriber::EnvFilter;

/// Statement-level program slicer.
///
/// This CLI is a thin wrapper around `sdg-core`; the analyses live in the
/// library so they can be tested and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "sdg-slicer",
    version,
    about = "Statement-level slicing over system dependence graphs",
    long_about = None
)]
struct Cli {
    /// Log analysis progress to stderr (overridden by RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new slicing project at the given root.
    ///
    /// Creates `.slicer/project.json`, the project database and the
    /// `programs`, `graphs` and `reports` directories.
    InitProject {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Optional project name. If omitted, the name is derived from the root directory.
        #[arg(long)]
        name: Option<String>,
    },

    /// Show configuration, directories and counts for an existing project.
    ProjectInfo {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Register a program model file (JSON or YAML) in the project database.
    AddProgram {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Path to the program model file.
        #[arg(long)]
        path: String,

        /// Optional name. Defaults to the file stem.
        #[arg(long)]
        name: Option<String>,

        /// Optional precomputed hash. If omitted, the CLI computes SHA-256 unless `--skip-hash` is set.
        #[arg(long)]
        hash: Option<String>,

        /// Skip hash computation (stores no hash).
        #[arg(long, default_value_t = false)]
        skip_hash: bool,
    },

    /// List all programs registered in the project database.
    ListPrograms {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Slice a registered program from the first call to `--src-callee`
    /// inside `--src-caller`.
    Slice(SliceArgs),

    /// List recorded slice runs.
    ListRuns {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Only show runs for this program.
        #[arg(long)]
        program: Option<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::InitProject { root, name } => init_project_command(&root, name)?,
        Command::ProjectInfo { root, json } => project_info_command(&root, json)?,
        Command::AddProgram { root, path, name, hash, skip_hash } => {
            add_program_command(&root, &path, name, hash, skip_hash)?
        }
        Command::ListPrograms { root, json } => list_programs_command(&root, json)?,
        Command::Slice(args) => slice_command(&args)?,
        Command::ListRuns { root, program, json } => {
            list_runs_command(&root, program.as_deref(), json)?
        }
    }

    Ok(())
}
