///
/// This module implements the full CLI interface for packrat — command
/// parsing, the interactive workflow gates, and user-visible invocations.
///
/// All core business logic (scanning, the ledger, the upload engine, site
/// rendering and publishing) lives in the [`packrat-core`] crate. This module
/// is strictly CLI glue and orchestration: it sequences the phases
/// scan → confirm → upload → render → publish and owns every prompt.
///
/// ## Features
/// - Entry struct [`Cli`] defines all user-facing options and subcommands.
/// - Subcommand routing (`run`, `render`, `publish`) and argument validation.
/// - Async entrypoint ([`run`]) for programmatic invocation and integration
///   testing.
/// - Logging, tracing, and structured error output at CLI level.
///
/// ## How To Use
/// - For command-line users: use the installed `packrat` binary with `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed
///   [`Cli`].
///
/// ## Extending
/// When adding features or subcommands, update [`Commands`] below and keep
/// all non-trivial business logic inside `packrat-core`.
///
/// ---
///
/// [`packrat-core`]: ../../packrat-core/
/// [`Cli`]: struct.Cli.html
/// [`run`]: fn.run.html
/// [`Commands`]: enum.Commands.html
use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use packrat_core::archive::ArchiveOrgClient;
use packrat_core::config::RunConfig;
use packrat_core::contract::ItemMetadata;
use packrat_core::ledger::Ledger;
use packrat_core::publish::{offer_publish_retry, publish_site, PublishError};
use packrat_core::scan::{estimate_upload_secs, scan};
use packrat_core::site::write_site;
use packrat_core::state::FileStateStore;
use packrat_core::upload::{item_id_for_run, run_batch};
use packrat_core::vcs::GitCli;

use crate::load_config::load_run_config;
use crate::prompt;

/// CLI for packrat: archive a directory tree and publish its index.
#[derive(Parser)]
#[clap(
    name = "packrat",
    version,
    about = "Upload a directory tree to archive.org with a dedup ledger and a publishable index page"
)]
pub struct Cli {
    /// Path to a YAML file overriding the built-in defaults
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan, upload and optionally publish in one interactive pass
    Run {
        /// Directory to upload (prompted for when omitted)
        #[clap(long)]
        source: Option<PathBuf>,
        /// Uploader name recorded in the ledger (prompted for when omitted)
        #[clap(long)]
        uploader: Option<String>,
        /// Answer yes to every confirmation gate
        #[clap(long)]
        yes: bool,
    },
    /// Rebuild the index page from the ledger without uploading
    Render,
    /// Retry pushing the rendered page to the pages branch
    Publish {
        /// Skip the confirmation gate
        #[clap(long)]
        yes: bool,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    let config = load_run_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Run {
            source,
            uploader,
            yes,
        } => run_workflow(&config, source, uploader, yes).await,
        Commands::Render => run_render(&config),
        Commands::Publish { yes } => run_publish(&config, yes).await,
    }
}

/// The full interactive workflow:
/// scan → confirm → upload → render → offer publish. When the worklist is
/// empty the upload phase is skipped, but a pending publish left behind by a
/// previous run is still offered.
async fn run_workflow(
    config: &RunConfig,
    source: Option<PathBuf>,
    uploader: Option<String>,
    yes: bool,
) -> Result<()> {
    let state = FileStateStore::new(&config.state_path);
    let ledger = Ledger::from_config(config);

    // --- Scanning ---
    let source = match source {
        Some(path) => path,
        None => PathBuf::from(prompt::ask("Enter path to upload: ")?),
    };
    if !source.is_dir() {
        bail!("invalid source path: {}", source.display());
    }

    let known_hashes = ledger.uploaded_hashes()?;
    let outcome = scan(&source, config, &known_hashes)?;

    if outcome.worklist.is_empty() {
        println!("All files already uploaded.");
        offer_pending_publish(config, &state, yes).await?;
        return Ok(());
    }

    // --- Confirmation gate ---
    let estimate_secs = estimate_upload_secs(outcome.total_bytes, config.assumed_upload_mb_per_sec);
    println!(
        "Found {} files ({:.2} MiB), estimated upload time {:.1} minutes",
        outcome.worklist.len(),
        outcome.total_mb(),
        estimate_secs / 60.0
    );
    if outcome.skipped_oversize + outcome.skipped_dedup > 0 {
        println!(
            "Skipped {} oversized and {} already-uploaded files",
            outcome.skipped_oversize, outcome.skipped_dedup
        );
    }
    if !yes && !prompt::confirm("Start upload?")? {
        println!("Upload cancelled.");
        return Ok(());
    }

    let uploader = match uploader {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        Some(_) | None if yes => bail!("--uploader is required together with --yes"),
        _ => prompt::ask("Enter uploader name: ")?,
    };
    if uploader.is_empty() {
        bail!("uploader name required");
    }

    // --- Uploading ---
    let basename = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("upload"));
    let item_id = item_id_for_run(&uploader, &basename);
    let metadata = ItemMetadata::for_run(&uploader, &basename, &config.collection);
    let store = ArchiveOrgClient::new_from_env().map_err(|e| {
        anyhow::anyhow!("archive.org credentials unavailable ({e}); set IA_ACCESS_KEY and IA_SECRET_KEY")
    })?;

    let report = run_batch(
        config,
        &store,
        &ledger,
        &outcome.worklist,
        &uploader,
        &item_id,
        &metadata,
    )
    .await?;
    tracing::info!(
        report = %serde_json::to_string_pretty(&report)?,
        "Upload batch finished"
    );
    println!(
        "Upload complete. Success: {}/{}",
        report.succeeded, report.attempted
    );

    // --- Publishing (optional) ---
    let entries = ledger.read_entries()?;
    let rendered = write_site(&entries, &config.download_base_url, &config.site_path, &state)?;
    if rendered {
        println!("Rendered {}", config.site_path.display());
        if yes || prompt::confirm("Push to GitHub Pages?")? {
            publish_with_guidance(config, &state, yes).await?;
        }
    } else {
        offer_pending_publish(config, &state, yes).await?;
    }
    Ok(())
}

/// Cross-run resumption: a pending flag plus an existing page means a
/// previous run rendered output that was never confirmed pushed.
async fn offer_pending_publish(config: &RunConfig, state: &FileStateStore, yes: bool) -> Result<()> {
    if !offer_publish_retry(state, &config.site_path) {
        return Ok(());
    }
    println!("A previous index page was rendered but never pushed.");
    if yes || prompt::confirm("Push to GitHub Pages now?")? {
        publish_with_guidance(config, state, yes).await?;
    }
    Ok(())
}

/// Publish, reporting pre-flight misconfiguration as guidance instead of a
/// hard failure: the run itself still completed.
async fn publish_with_guidance(config: &RunConfig, state: &FileStateStore, yes: bool) -> Result<()> {
    match try_publish(config, state, yes).await {
        Ok(()) => Ok(()),
        Err(e) => match e.downcast_ref::<PublishError>() {
            Some(publish_err) if publish_err.is_preflight() => {
                eprintln!("{publish_err}");
                Ok(())
            }
            _ => Err(e),
        },
    }
}

async fn try_publish(config: &RunConfig, state: &FileStateStore, yes: bool) -> Result<()> {
    let vcs = GitCli::new(".");
    let confirm_switch = |current: &str, target: &str| {
        if yes {
            return true;
        }
        prompt::confirm(&format!(
            "You're on '{current}' but the pages branch is '{target}'. Switch branch?"
        ))
        .unwrap_or(false)
    };

    let info = publish_site(&vcs, state, &config.site_path, confirm_switch).await?;
    println!(
        "Pushed {} to '{}'. Your files should appear at {} shortly.",
        config.site_path.display(),
        info.branch,
        info.repo.pages_url()
    );
    Ok(())
}

fn run_render(config: &RunConfig) -> Result<()> {
    let state = FileStateStore::new(&config.state_path);
    let ledger = Ledger::from_config(config);
    let entries = ledger.read_entries()?;
    let rendered = write_site(&entries, &config.download_base_url, &config.site_path, &state)?;
    if rendered {
        println!("Rendered {}", config.site_path.display());
    } else {
        println!("Ledger is empty, nothing to render.");
    }
    Ok(())
}

async fn run_publish(config: &RunConfig, yes: bool) -> Result<()> {
    let state = FileStateStore::new(&config.state_path);
    if !config.site_path.exists() {
        bail!(
            "no rendered page at {}; run `packrat render` first",
            config.site_path.display()
        );
    }
    if !yes && !prompt::confirm("Push to GitHub Pages?")? {
        println!("Publish cancelled.");
        return Ok(());
    }
    try_publish(config, &state, yes).await
}
