use std::path::PathBuf;

use anyhow::{bail, Context};
use colored::Colorize;

use dsync_engine::{
    FileUploadStrategy, MismatchReason, SyncEngine, SyncOptions, SyncOutcome, SyncPolicy,
    ValidationMode,
};
use dsync_index::FileIndexStore;
use dsync_store::{DirLocalStore, DirRemoteStore, LocalStore};
use dsync_types::{ChunkStatus, DatasetId, LogicalId, RemoteDatasetId};

use crate::cli::*;
use crate::config::FileConfig;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = FileConfig::load(cli.config.as_deref(), &cli.dataset)?;
    let mut options = config.sync_options()?;
    options.verbose |= cli.verbose;
    let remote_root = cli.remote_root.clone().or_else(|| config.remote_root.clone());
    let ctx = Workspace {
        dataset: cli.dataset,
        remote_root,
    };

    match cli.command {
        Command::Init(args) => cmd_init(&ctx, args),
        Command::Link(args) => cmd_link(&ctx, options, args),
        Command::Sync(args) => cmd_sync(&ctx, options, args),
        Command::Validate(args) => cmd_validate(&ctx, options, args),
        Command::Dedupe(args) => cmd_dedupe(&ctx, options, args),
        Command::Status(_) => cmd_status(&ctx, options),
    }
}

/// Where the stores live for this invocation.
struct Workspace {
    dataset: PathBuf,
    remote_root: Option<PathBuf>,
}

impl Workspace {
    fn local(&self) -> anyhow::Result<DirLocalStore> {
        DirLocalStore::open(&self.dataset)
            .with_context(|| format!("opening dataset at {}", self.dataset.display()))
    }

    fn remote(&self) -> anyhow::Result<DirRemoteStore> {
        let Some(root) = &self.remote_root else {
            bail!("no remote root: pass --remote-root or set remote_root in dsync.toml");
        };
        Ok(DirRemoteStore::open(root)?)
    }

    fn index(&self) -> FileIndexStore {
        FileIndexStore::new(&self.dataset)
    }
}

fn cmd_init(ctx: &Workspace, args: InitArgs) -> anyhow::Result<()> {
    let id = DatasetId::parse(args.id)?;
    DirLocalStore::init(&ctx.dataset, id.clone())?;
    println!(
        "{} Initialized dataset {} in {}",
        "✓".green().bold(),
        id.to_string().bold(),
        ctx.dataset.display()
    );
    Ok(())
}

fn cmd_link(ctx: &Workspace, options: SyncOptions, args: LinkArgs) -> anyhow::Result<()> {
    let (local, remote, index) = (ctx.local()?, ctx.remote()?, ctx.index());
    let remote_id = RemoteDatasetId::parse(args.remote)?;
    if args.create {
        remote.create_dataset(&remote_id)?;
    } else if !remote.datasets()?.contains(&remote_id) {
        bail!("remote dataset {remote_id} does not exist (use --create)");
    }
    SyncEngine::new(&local, &remote, &index, options).link(&remote_id)?;
    println!(
        "{} Linked {} → {}",
        "✓".green().bold(),
        local_name(&local).bold(),
        remote_id.to_string().cyan()
    );
    Ok(())
}

fn cmd_sync(ctx: &Workspace, mut options: SyncOptions, args: SyncArgs) -> anyhow::Result<()> {
    let policy: SyncPolicy = args.policy.parse()?;
    options.dry_run |= args.dry_run;
    options.sync_files |= args.files;
    if args.serial {
        options.file_upload_strategy = FileUploadStrategy::Serial;
    }
    if args.chunk_size.is_some() {
        options.max_chunk_size = args.chunk_size;
    }
    if args.delete_batch.is_some() {
        options.max_delete_batch = args.delete_batch;
    }

    let (local, remote, index) = (ctx.local()?, ctx.remote()?, ctx.index());
    let mut engine = SyncEngine::new(&local, &remote, &index, options);
    if let Some(remote_id) = args.remote {
        engine = engine.with_remote_dataset(RemoteDatasetId::parse(remote_id)?);
    }

    match engine.run(policy) {
        Ok(outcome) => {
            print_outcome(&outcome);
            Ok(())
        }
        Err(err) => {
            if let Some(report) = err.report() {
                for (ids, status) in report.chunks() {
                    println!("  {} {}", status_tag(status), join(ids));
                }
            }
            Err(err.into())
        }
    }
}

fn print_outcome(outcome: &SyncOutcome) {
    if outcome.dry_run {
        println!("{} {} (dry run)", "Preview of".bold(), outcome.policy.to_string().cyan());
        for line in outcome.would_lines() {
            println!("  {}", line.yellow());
        }
        return;
    }
    for line in outcome.trace.progress_lines() {
        println!("  {}", line.dimmed());
    }
    let rows = [
        ("uploaded", &outcome.uploaded),
        ("downloaded", &outcome.downloaded),
        ("deleted remotely", &outcome.deleted_remote),
        ("deleted locally", &outcome.deleted_local),
    ];
    for (label, ids) in rows {
        if !ids.is_empty() {
            println!("  {:<17} {}", format!("{label}:"), join(ids));
        }
    }
    if outcome.is_noop() {
        println!("{} {} already in sync", "✓".green().bold(), outcome.pair);
    } else {
        println!(
            "{} {} complete: {} change(s)",
            "✓".green().bold(),
            outcome.policy.to_string().cyan(),
            outcome.changed()
        );
    }
}

fn cmd_validate(ctx: &Workspace, mut options: SyncOptions, args: ValidateArgs) -> anyhow::Result<()> {
    if let Some(mode) = args.mode {
        options.validation_mode = mode.parse::<ValidationMode>()?;
    }
    let (local, remote, index) = (ctx.local()?, ctx.remote()?, ctx.index());
    let report = SyncEngine::new(&local, &remote, &index, options).validate()?;

    println!(
        "local only: {}  remote only: {}  common: {}",
        report.local_only.len(),
        report.remote_only.len(),
        report.common.len()
    );
    for mismatch in &report.mismatch_details {
        let reason = match &mismatch.reason {
            MismatchReason::RetrievalFailed(msg) => format!("{}: {msg}", mismatch.reason),
            other => other.to_string(),
        };
        println!("  {} {} {}", "✗".red().bold(), mismatch.logical_id, reason.dimmed());
        if args.diff && !mismatch.rendered.is_empty() {
            for line in mismatch.rendered.lines() {
                println!("      {line}");
            }
        }
    }
    if report.mismatched.is_empty() {
        println!("{} No mismatches.", "✓".green().bold());
    } else {
        println!("{} {} mismatched document(s)", "✗".red().bold(), report.mismatched.len());
    }
    Ok(())
}

fn cmd_dedupe(ctx: &Workspace, mut options: SyncOptions, args: DedupeArgs) -> anyhow::Result<()> {
    options.dry_run |= args.dry_run;
    if args.delete_batch.is_some() {
        options.max_delete_batch = args.delete_batch;
    }
    let (local, remote, index) = (ctx.local()?, ctx.remote()?, ctx.index());
    let engine = SyncEngine::new(&local, &remote, &index, options);

    let scan = if args.delete {
        let outcome = engine.remove_duplicates()?;
        for line in outcome.trace.would_lines() {
            println!("  {}", line.yellow());
        }
        outcome.scan
    } else {
        engine.find_duplicates()?
    };

    for group in &scan.groups {
        println!(
            "{}  keep {}  drop {}",
            group.logical_id.to_string().bold(),
            group.original.to_string().green(),
            group
                .duplicates
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(", ")
                .red()
        );
    }
    if scan.is_empty() {
        println!("{} No duplicates.", "✓".green().bold());
    } else {
        let verb = if args.delete && !engine.options().dry_run { "Removed" } else { "Found" };
        println!("{verb} {} duplicate record(s)", scan.duplicate_count());
    }
    Ok(())
}

fn cmd_status(ctx: &Workspace, options: SyncOptions) -> anyhow::Result<()> {
    let (local, remote, index) = (ctx.local()?, ctx.remote()?, ctx.index());
    let status = SyncEngine::new(&local, &remote, &index, options).status()?;

    println!("Pair: {}", status.pair.to_string().bold());
    println!("  common:      {}", status.common.len());
    println!("  local only:  {}", count(status.local_only.len()));
    println!("  remote only: {}", count(status.remote_only.len()));
    if status.remote_duplicates > 0 {
        println!("  duplicates:  {}", status.remote_duplicates.to_string().red());
    }
    match &status.baseline {
        Some(_) => println!(
            "  since last sync: {} new local, {} new remote",
            status.new_local_since_sync.len(),
            status.new_remote_since_sync.len()
        ),
        None => println!("  {}", "never synced".dimmed()),
    }
    if status.is_in_sync() {
        println!("{} In sync.", "✓".green().bold());
    }
    Ok(())
}

fn local_name(local: &DirLocalStore) -> String {
    local.dataset_id().to_string()
}

fn count(n: usize) -> colored::ColoredString {
    if n == 0 {
        n.to_string().normal()
    } else {
        n.to_string().yellow()
    }
}

fn status_tag(status: ChunkStatus) -> colored::ColoredString {
    match status {
        ChunkStatus::Success => "success".green(),
        ChunkStatus::Failure => "failure".red().bold(),
        ChunkStatus::NotAttempted => "not attempted".yellow(),
        ChunkStatus::DryRun => "dry run".dimmed(),
    }
}

fn join(ids: &[LogicalId]) -> String {
    ids.iter().map(|id| id.as_str()).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use dsync_store::RemoteStore;
    use dsync_types::Document;

    fn run(args: &[&str]) -> anyhow::Result<()> {
        run_command(Cli::try_parse_from(args)?)
    }

    #[test]
    fn init_link_and_mirror() {
        let local_dir = tempfile::tempdir().unwrap();
        let remote_dir = tempfile::tempdir().unwrap();
        let dataset = local_dir.path().to_str().unwrap();
        let remote_root = remote_dir.path().to_str().unwrap();

        run(&["dsync", "--dataset", dataset, "init", "lab"]).unwrap();
        run(&["dsync", "--dataset", dataset, "--remote-root", remote_root, "link", "cloud", "--create"])
            .unwrap();

        let local = DirLocalStore::open(dataset).unwrap();
        local.add(&Document::new("sample-1")).unwrap();
        local.add(&Document::new("sample-2")).unwrap();

        let sync = ["dsync", "--dataset", dataset, "--remote-root", remote_root, "sync"];
        run(&[&sync[..], &["mirror-to-remote", "--dry-run"][..]].concat()).unwrap();
        let remote = DirRemoteStore::open(remote_root).unwrap();
        let cloud = RemoteDatasetId::from("cloud");
        assert!(remote.list_document_ids(&cloud).unwrap().is_empty());

        run(&[&sync[..], &["mirror-to-remote"][..]].concat()).unwrap();
        assert_eq!(remote.list_document_ids(&cloud).unwrap().len(), 2);

        run(&["dsync", "--dataset", dataset, "--remote-root", remote_root, "status"]).unwrap();
        run(&["dsync", "--dataset", dataset, "--remote-root", remote_root, "validate"]).unwrap();
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let local_dir = tempfile::tempdir().unwrap();
        let remote_dir = tempfile::tempdir().unwrap();
        let dataset = local_dir.path().to_str().unwrap();
        run(&["dsync", "--dataset", dataset, "init", "lab"]).unwrap();
        let err = run(&[
            "dsync",
            "--dataset",
            dataset,
            "--remote-root",
            remote_dir.path().to_str().unwrap(),
            "sync",
            "sideways",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("unknown policy"));
    }

    #[test]
    fn link_requires_existing_remote() {
        let local_dir = tempfile::tempdir().unwrap();
        let remote_dir = tempfile::tempdir().unwrap();
        let dataset = local_dir.path().to_str().unwrap();
        run(&["dsync", "--dataset", dataset, "init", "lab"]).unwrap();
        assert!(run(&[
            "dsync",
            "--dataset",
            dataset,
            "--remote-root",
            remote_dir.path().to_str().unwrap(),
            "link",
            "missing",
        ])
        .is_err());
    }
}
