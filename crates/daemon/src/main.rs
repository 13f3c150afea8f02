// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// The `tomato` daemon: owns cluster state and the driver/job background
/// tasks (spec §4.1). Shared flags match the CLI's: `port`,
/// `app-directory`, `data-directory`, `log-directory`, `-v/-q` (spec §9
/// "Shared flags").
#[derive(Parser, Debug)]
#[command(name = "tomato-daemon")]
struct Args {
    /// Port to bind the control socket on; 0 lets the OS choose.
    #[arg(long, default_value_t = 0)]
    port: u16,

    /// Directory holding `settings.toml`.
    #[arg(long = "app-directory")]
    app_directory: Option<PathBuf>,

    /// Overrides the `datadir` from `settings.toml`.
    #[arg(long = "data-directory")]
    data_directory: Option<PathBuf>,

    /// Directory for rotating log files; defaults to `<datadir>/logs`.
    #[arg(long = "log-directory")]
    log_directory: Option<PathBuf>,

    /// Increase log verbosity; repeatable.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease log verbosity; repeatable.
    #[arg(short = 'q', long = "quiet", action = clap::ArgAction::Count)]
    quiet: u8,
}

fn default_appdir() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("tomato")
}

fn verbosity_filter(verbose: u8, quiet: u8) -> EnvFilter {
    let level = 2i16 + i16::from(verbose) - i16::from(quiet);
    let directive = match level {
        i16::MIN..=0 => "error",
        1 => "warn",
        2 => "info",
        3 => "debug",
        _ => "trace",
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive))
}

fn sibling_binary(name: &str) -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.join(name)))
        .unwrap_or_else(|| PathBuf::from(name))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt().with_env_filter(verbosity_filter(args.verbose, args.quiet)).init();

    let appdir = args.app_directory.unwrap_or_else(default_appdir);
    let settings = tomato_storage::load_settings(&appdir)?;
    let datadir = args.data_directory.unwrap_or_else(|| settings.datadir.clone());
    std::fs::create_dir_all(&datadir)?;
    let _log_directory = args.log_directory.unwrap_or_else(|| datadir.join("logs"));

    let config = tomato_daemon::DaemonConfig {
        port: args.port,
        verbosity: 2u8.saturating_add(args.verbose).saturating_sub(args.quiet),
        datadir,
        jobs_storage: settings.jobs.storage.clone(),
        driver_bin: sibling_binary("tomato-driver"),
        job_bin: sibling_binary("tomato-job"),
    };

    tomato_daemon::run(config).await?;
    Ok(())
}
