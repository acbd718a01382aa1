use std::process::ExitCode;

use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use ares_bootstrap::app::{BootstrapOptions, Bootstrapper};
use ares_bootstrap::config::Settings;
use ares_bootstrap::error::AresError;
use ares_bootstrap::hub::HubHttpClient;
use ares_bootstrap::layout::DataLayout;
use ares_bootstrap::output::{JsonOutput, OutputMode, TextOutput};
use ares_bootstrap::restore::SystemMongoRestore;

#[derive(Parser)]
#[command(name = "ares-bootstrap")]
#[command(about = "Populate a local ARES data directory from the hosted dataset repository")]
#[command(version, author)]
struct Cli {
    /// Output directory for dataset artifacts (default: ~/ares/data)
    out_dir: Option<String>,

    /// Dataset repository on the hub
    #[arg(long)]
    repo: Option<String>,

    /// Address of the local MongoDB the annotation dump is restored into
    #[arg(long)]
    mongo_host: Option<String>,

    /// Resolve and report planned actions without downloading
    #[arg(long)]
    dry_run: bool,

    /// Leave the extracted annotation dump on disk without running mongorestore
    #[arg(long)]
    skip_restore: bool,

    /// Keep the compressed intermediates after extraction
    #[arg(long)]
    keep_archives: bool,

    /// Print a JSON result to stdout instead of plain-text progress
    #[arg(long)]
    non_interactive: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<AresError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &AresError) -> u8 {
    match error {
        AresError::MissingToken(_) => 1,
        AresError::HubHttp(_)
        | AresError::HubStatus { .. }
        | AresError::ListingParse(_)
        | AresError::MissingTool(_)
        | AresError::Restore(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let settings = Settings::resolve(
        cli.out_dir.as_deref(),
        cli.repo.as_deref(),
        cli.mongo_host.as_deref(),
    )?;
    tracing::info!(out_dir = %settings.out_dir, repo = %settings.repo, "resolved settings");

    let hub = HubHttpClient::new(&settings.token, &settings.repo)?;
    let restore = SystemMongoRestore::new(&settings.mongo_host);
    if !cli.dry_run && !cli.skip_restore && !restore.is_available() {
        return Err(AresError::MissingTool("mongorestore".to_string()).into());
    }
    let layout = DataLayout::new(settings.out_dir.clone());
    let bootstrapper = Bootstrapper::new(layout, hub, restore, settings.repo.clone());

    let options = BootstrapOptions {
        dry_run: cli.dry_run,
        skip_restore: cli.skip_restore,
        keep_archives: cli.keep_archives,
    };

    match output_mode {
        OutputMode::NonInteractive => {
            let result = bootstrapper.bootstrap(options, &JsonOutput)?;
            JsonOutput::print_bootstrap(&result).into_diagnostic()?;
        }
        OutputMode::Interactive => {
            let sink = TextOutput;
            let result = bootstrapper.bootstrap(options, &sink)?;
            TextOutput::print_summary(&result);
        }
    }
    Ok(())
}
