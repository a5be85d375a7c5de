//! hyperkit CLI: capability scans, default configurations and smoke runs
//! over the native component catalog.

mod commands;

use clap::Parser;
use hyperkit_core::Capability;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// hyperkit: search spaces and smoke tests for native estimators
#[derive(Parser, Debug)]
#[command(name = "hyperkit", version, about, long_about = None)]
struct Cli {
    /// Workspace directory
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Configuration file path (merged over the workspace config)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// List components, optionally only those with one capability
    Scan {
        /// classifier, regressor or transformer
        #[arg(long)]
        capability: Option<Capability>,
    },
    /// Print a component's search space
    Space {
        component: String,
    },
    /// Print a component's default configuration
    Defaults {
        component: String,
        /// Emit TOML instead of JSON
        #[arg(long)]
        toml: bool,
    },
    /// Fit a component with its defaults and report how it did
    Smoke {
        component: String,
        /// Dataset to use (defaults depend on the component's capability)
        #[arg(long)]
        dataset: Option<String>,
        /// Use sparse inputs (transformers only)
        #[arg(long)]
        sparse: bool,
        /// Inject NaNs into the dtype check (transformers only)
        #[arg(long)]
        nans: bool,
    },
    /// List loadable datasets
    Datasets,
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Create a default configuration file in the workspace
    Init,
    /// Show the current configuration
    Show,
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "hyperkit", "hyperkit")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "hyperkit.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    commands::handle_command(cli.command, &workspace, cli.config.as_deref())
}
