use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use release_updater::config::Settings;
use release_updater::desktop::{AlwaysGranted, ConsolePrompt, HttpDownloadService};
use release_updater::update::version::is_update;
use release_updater::update::ReleaseFetcher;
use release_updater::{CheckOutcome, Decision, UpdateConfig, UpdateError, UpdateListener, Updater};

#[derive(Parser, Debug)]
#[command(name = "release-updater")]
#[command(about = "Check a GitHub repository for a newer release and install it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Repository owner (user or organisation)
    #[arg(long, global = true)]
    owner: Option<String>,

    /// Repository name
    #[arg(long, global = true)]
    repo: Option<String>,

    /// Version string of the installed build, compared verbatim to the release tag
    #[arg(long = "current", global = true)]
    current_version: Option<String>,

    /// API root (defaults to https://api.github.com)
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// HTTP timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report whether a newer release exists
    Check,

    /// Check, prompt, download and install
    Update {
        /// Answer yes to the update prompt
        #[arg(short, long)]
        yes: bool,

        /// Where to save the download (defaults to the Downloads folder)
        #[arg(long)]
        download_dir: Option<PathBuf>,

        /// Installer command; the downloaded file is appended, e.g. "adb install -r"
        #[arg(long)]
        installer: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = Settings::load().context("Failed to load config")?;
    let config = build_config(&cli, &settings)?;

    match cli.command {
        Command::Check => run_check_command(&config),
        Command::Update {
            yes,
            download_dir,
            installer,
        } => run_update_command(config, &settings, yes, download_dir, installer),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "release_updater=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(cli: &Cli, settings: &Settings) -> Result<UpdateConfig> {
    let mut builder = settings.apply(UpdateConfig::builder());
    if let Some(owner) = &cli.owner {
        builder = builder.owner(owner);
    }
    if let Some(repo) = &cli.repo {
        builder = builder.repo(repo);
    }
    if let Some(version) = &cli.current_version {
        builder = builder.current_version(version);
    }
    if let Some(base) = &cli.api_base {
        builder = builder.api_base(base);
    }
    if let Some(secs) = cli.timeout {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build().context("Invalid update configuration")
}

fn run_check_command(config: &UpdateConfig) -> Result<()> {
    println!("{}", "Checking for updates...".cyan());

    let release = ReleaseFetcher::new(config)?
        .fetch_latest(&config.owner, &config.repo)
        .context("Update check failed")?;

    if !is_update(&config.current_version, &release.version) {
        println!(
            "{} You're running the latest version ({})",
            "✓".green(),
            config.current_version
        );
    } else {
        println!(
            "{} New version available: {} → {}",
            "↑".yellow(),
            config.current_version.dimmed(),
            release.version.green()
        );
        println!("  {}", release.download_url.dimmed());
        println!("  Run `release-updater update` to install");
    }
    Ok(())
}

struct ConsoleListener;

impl UpdateListener for ConsoleListener {
    fn on_update_available(&self, download_url: &str) {
        println!("{} {}", "↓".cyan(), download_url.dimmed());
    }

    // Reported once more by the returned outcome.
    fn on_update_failed(&self, error: &UpdateError) {
        tracing::debug!(%error, "listener saw failure");
    }
}

fn run_update_command(
    config: UpdateConfig,
    settings: &Settings,
    yes: bool,
    download_dir: Option<PathBuf>,
    installer: Option<String>,
) -> Result<()> {
    let download_dir = download_dir
        .or_else(|| settings.download_dir.clone())
        .unwrap_or_else(HttpDownloadService::default_download_dir);
    let installer = installer
        .map(|cmd| cmd.split_whitespace().map(str::to_string).collect())
        .or_else(|| settings.installer.clone())
        .unwrap_or_default();

    let service = HttpDownloadService::new(download_dir)?
        .with_installer(installer)
        .with_progress(true);
    let updater = Updater::new(
        config,
        Arc::new(service),
        Arc::new(AlwaysGranted),
        Arc::new(ConsolePrompt::new(yes)),
    )?;

    println!("{}", "Checking for updates...".cyan());
    let outcome = updater.check_for_updates(Arc::new(ConsoleListener))?.wait();

    match outcome {
        CheckOutcome::UpToDate { version } => {
            println!("{} You're running the latest version ({})", "✓".green(), version);
            Ok(())
        }
        CheckOutcome::UpdateAvailable { release, decision } => match decision {
            Decision::Declined => {
                println!("{}", "Update skipped".dimmed());
                Ok(())
            }
            Decision::AwaitingPermission => Err(anyhow!("Waiting for permissions")),
            Decision::DownloadRejected(e) => Err(e).context("Could not start download"),
            Decision::Downloading(ticket) => {
                let path = ticket.wait().context("Failed to install update")?;
                println!(
                    "\n{} Downloaded {} to {}",
                    "✓".green(),
                    release.version.green(),
                    path.display()
                );
                Ok(())
            }
        },
        CheckOutcome::Failed(e) => Err(e).context("Update check failed"),
        CheckOutcome::Cancelled => Ok(()),
    }
}
