use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use ruby_builder::cli::{BuildRequest, Builder};
use ruby_builder::config::{self, BuildEnv};
use ruby_builder::domain::Architecture;
use ruby_builder::guard::VersionGuard;
use ruby_builder::{changelog, shutdown, ui};

#[derive(clap::Parser)]
#[command(
    name = "ruby-builder",
    version,
    about = "Compile a Ruby release into a relocatable tarball for a given stack"
)]
struct Args {
    /// Scratch space for the temporary source and install directories
    #[arg(required_unless_present = "changelog")]
    workspace_dir: Option<PathBuf>,

    /// Root of the stack/architecture artifact tree
    #[arg(required_unless_present = "changelog")]
    output_dir: Option<PathBuf>,

    /// Source tarballs are downloaded here once and reused
    #[arg(required_unless_present = "changelog")]
    cache_dir: Option<PathBuf>,

    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(long, help = "Print the build plan and artifact path without building")]
    dry_run: bool,

    #[arg(
        long,
        conflicts_with = "dry_run",
        help = "Run ruby -v and gem -v from the already built artifact instead of building"
    )]
    check: bool,

    #[arg(long, help = "Print the changelog entry for VERSION and exit")]
    changelog: bool,

    #[arg(short, long, help = "Show debug diagnostics")]
    verbose: bool,
}

/// Setup logging based on verbose flag or RUST_LOG environment variable
fn setup_logging(verbose: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("ruby_builder=debug")
    } else {
        EnvFilter::new("ruby_builder=info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args = Args::parse();
    setup_logging(args.verbose);

    if let Err(e) = run(args) {
        ui::display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    if args.changelog {
        let version = config::version_from_env()?;
        print!("{}", changelog::changelog(&version)?);
        return Ok(());
    }

    let config = config::load_config(args.config.as_deref()).context("Error loading config")?;
    let env = BuildEnv::from_env()?;
    let jobs = config.resolve_jobs(env.jobs.as_deref())?;
    let architecture = Architecture::detect()?;

    let (Some(workspace_dir), Some(output_dir), Some(cache_dir)) =
        (args.workspace_dir, args.output_dir, args.cache_dir)
    else {
        anyhow::bail!("WORKSPACE_DIR, OUTPUT_DIR and CACHE_DIR are required");
    };

    let request = BuildRequest {
        version: env.version,
        stack: env.stack,
        architecture,
        jobs,
        workspace_dir,
        output_dir,
        cache_dir,
    };
    let builder = Builder::new(config.artifact_layout(), VersionGuard::default())
        .with_inventory(config.inventory.clone());

    if args.dry_run {
        let planned = builder.plan(&request)?;
        ui::display_warning("Dry run, nothing is downloaded or built");
        ui::display_plan(
            &planned.plan,
            &planned.download_url,
            &planned.artifact.display().to_string(),
        );
        return Ok(());
    }

    shutdown::install_handlers().context("Error installing signal handlers")?;

    if args.check {
        let report = builder.check(&request, &mut ui::StdoutSink::new())?;
        print!(
            "{}",
            report.summary(&request.version, &request.stack, request.architecture)
        );
        return Ok(());
    }

    ui::display_status(&format!(
        "Building Ruby {} for {} ({}) with {} jobs",
        request.version, request.stack, request.architecture, request.jobs
    ));

    let outcome = builder.build(&request, &mut ui::StdoutSink::new())?;

    ui::display_success(&format!(
        "Built Ruby {} for {} ({}): {}",
        outcome.version,
        outcome.stack,
        outcome.architecture,
        outcome.artifact.display()
    ));
    ui::display_status(&format!(
        "sha256 {} recorded in {}",
        outcome.sha256,
        outcome.inventory.display()
    ));
    Ok(())
}
