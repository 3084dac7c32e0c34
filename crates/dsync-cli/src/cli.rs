use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "dsync",
    about = "Synchronize a local document dataset with its remote counterpart",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Print per-phase progress
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Local dataset directory
    #[arg(short, long, global = true, default_value = ".")]
    pub dataset: PathBuf,

    /// Root directory of the remote service
    #[arg(long, global = true)]
    pub remote_root: Option<PathBuf>,

    /// Config file (defaults to <dataset>/dsync.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize a local dataset
    Init(InitArgs),
    /// Link the local dataset to a remote dataset
    Link(LinkArgs),
    /// Run a sync policy
    Sync(SyncArgs),
    /// Compare local documents with their remote copies
    Validate(ValidateArgs),
    /// Find, and optionally delete, duplicate remote records
    Dedupe(DedupeArgs),
    /// Show where the dataset pair stands
    Status(StatusArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Dataset id
    pub id: String,
}

#[derive(Args)]
pub struct LinkArgs {
    /// Remote dataset id
    pub remote: String,
    /// Create the remote dataset if it does not exist
    #[arg(long)]
    pub create: bool,
}

#[derive(Args)]
pub struct SyncArgs {
    /// download-new, upload-new, mirror-to-remote, mirror-from-remote or two-way
    pub policy: String,
    /// Preview without changing anything
    #[arg(long)]
    pub dry_run: bool,
    /// Transfer attachment bytes too
    #[arg(long)]
    pub files: bool,
    /// Send documents one at a time
    #[arg(long)]
    pub serial: bool,
    /// Maximum documents per upload chunk
    #[arg(long)]
    pub chunk_size: Option<usize>,
    /// Maximum ids per delete call
    #[arg(long)]
    pub delete_batch: Option<usize>,
    /// Remote dataset, overriding the linkage
    #[arg(long)]
    pub remote: Option<String>,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// bulk or serial
    #[arg(long)]
    pub mode: Option<String>,
    /// Print a unified diff for each mismatch
    #[arg(long)]
    pub diff: bool,
}

#[derive(Args)]
pub struct DedupeArgs {
    /// Delete the duplicates instead of listing them
    #[arg(long)]
    pub delete: bool,
    #[arg(long)]
    pub dry_run: bool,
    #[arg(long)]
    pub delete_batch: Option<usize>,
}

#[derive(Args)]
pub struct StatusArgs {}
