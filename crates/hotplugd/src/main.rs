//! hotplugd: the hotplug governor daemon.
//!
//! Assembles the governor with its Linux collaborators:
//! - Unit control (sysfs, or in memory with `--dry-run`)
//! - Load probe (/proc/stat)
//! - Power state source (signals)
//!
//! # Usage
//!
//! ```text
//! hotplugd run --config /etc/hotplug.toml
//! hotplugd print-config > /etc/hotplug.toml
//! kill -USR1 $(pidof hotplugd)   # entering low-power state
//! kill -USR2 $(pidof hotplugd)   # leaving low-power state
//! ```

mod signals;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use hotplug_core::{HotplugConfig, InMemoryUnits, UnitController};
use hotplug_governor::{GovernorHandle, HotplugScheduler};
use hotplug_sysfs::{ProcStatProbe, SysfsUnits};

const DEFAULT_LOG_FILTER: &str = "info,hotplugd=debug,hotplug=debug";

#[derive(Parser)]
#[command(name = "hotplugd", about = "Load-driven CPU hotplug governor")]
struct Cli {
    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Run the governor until SIGTERM or Ctrl-C.
    Run {
        /// Configuration file; built-in defaults when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Sample real load but switch in-memory units instead of sysfs.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the default configuration as TOML.
    PrintConfig,
    /// Validate a configuration file.
    CheckConfig {
        #[arg(long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Command::Run { config, dry_run } => run(config, dry_run).await,
        Command::PrintConfig => {
            print!("{}", HotplugConfig::default().to_toml_string()?);
            Ok(())
        }
        Command::CheckConfig { config } => {
            let tunables = HotplugConfig::from_file(&config)?.tunables()?;
            info!(path = %config.display(), ?tunables, "configuration is valid");
            Ok(())
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(config_path: Option<PathBuf>, dry_run: bool) -> anyhow::Result<()> {
    info!("hotplug daemon starting");

    let config = match &config_path {
        Some(path) => HotplugConfig::from_file(path)?,
        None => HotplugConfig::default(),
    };
    let tunables = config.tunables()?;
    info!(?tunables, "configuration loaded");

    // ── Collaborators ──────────────────────────────────────────

    let sysfs = SysfsUnits::open(&config.sysfs.cpu_root)?;
    let units: Arc<dyn UnitController> = if dry_run {
        info!("dry run: unit transitions stay in memory");
        Arc::new(InMemoryUnits::new(sysfs.total_units(), sysfs.online_count()))
    } else {
        Arc::new(sysfs)
    };

    let probe = ProcStatProbe::open(
        &config.sysfs.proc_stat,
        &config.sysfs.cpu_root,
        config.sysfs.scale_by_frequency,
    )?;

    // ── Governor ───────────────────────────────────────────────

    let scheduler = HotplugScheduler::new(tunables, Box::new(probe), units)?;
    let handle = GovernorHandle::spawn(scheduler)?;

    signals::forward_until_shutdown(&handle).await?;

    handle.shutdown().await?;
    info!("hotplug daemon stopped");
    Ok(())
}
