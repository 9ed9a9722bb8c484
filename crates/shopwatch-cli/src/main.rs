mod commands;
mod run;
mod site;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "shopwatch")]
#[command(about = "Track product prices and stock across e-commerce listing pages")]
struct Cli {
    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Flags that take precedence over the environment.
#[derive(Debug, Default, Args)]
struct Overrides {
    /// Site catalog (.csv, .yaml or .yml)
    #[arg(long, global = true, value_name = "PATH")]
    sites: Option<PathBuf>,

    /// Directory for history, snapshot and debug files
    #[arg(long, global = true, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Number of sites scraped in parallel
    #[arg(long, global = true)]
    max_concurrent: Option<usize>,
}

impl Overrides {
    fn apply(&self, config: &mut shopwatch_core::AppConfig) {
        if let Some(path) = &self.sites {
            config.sites_path.clone_from(path);
        }
        if let Some(dir) = &self.out_dir {
            config.out_dir.clone_from(dir);
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout_secs = secs;
        }
        if let Some(n) = self.max_concurrent {
            config.max_concurrent_sites = n.max(1);
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape every enabled site, append to history and rebuild the snapshot (default)
    Run {
        /// Only scrape the site with this name
        #[arg(long)]
        site: Option<String>,

        /// Print the page plan without fetching anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Rebuild the snapshot from the existing history
    Snapshot,
    /// Validate the site catalog and list accepted and rejected rows
    Check,
}

/// Filter from `RUST_LOG`, else `log_level`. When neither parses the
/// filter is plain `info` and the second value says why.
fn log_filter(rust_log: Option<&str>, log_level: &str) -> (EnvFilter, Option<String>) {
    if let Some(directives) = rust_log {
        if let Ok(filter) = EnvFilter::try_new(directives) {
            return (filter, None);
        }
    }
    match EnvFilter::try_new(log_level) {
        Ok(filter) => (filter, None),
        Err(e) => (
            EnvFilter::new("info"),
            Some(format!("invalid log filter '{log_level}' ({e}); logging at info")),
        ),
    }
}

fn init_tracing(log_level: &str) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let (env_filter, fallback) = log_filter(rust_log.as_deref(), log_level);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    if let Some(reason) = fallback {
        tracing::warn!("{reason}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let (mut config, config_issues) = shopwatch_core::load_app_config();
    cli.overrides.apply(&mut config);
    init_tracing(&config.log_level);
    for issue in &config_issues {
        tracing::warn!(error = %issue, "ignoring invalid setting; using its default");
    }

    match cli.command {
        None => {
            run::run_scrape(&config, None, false).await;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Run { site, dry_run }) => {
            run::run_scrape(&config, site.as_deref(), dry_run).await;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Snapshot) => {
            commands::rebuild_snapshot(&config);
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Check) => commands::check_catalog(&config, &config_issues),
    }
}
