// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// One `tomato-job` process, spawned by the job manager (spec §4.3
/// "dispatcher"): `tomato-job --port <daemon_port> <jobdata_path>`.
#[derive(Parser, Debug)]
#[command(name = "tomato-job")]
struct Args {
    /// The daemon's control socket port.
    #[arg(long)]
    port: u16,

    /// Path to this job's `jobdata.json`.
    jobdata_path: PathBuf,

    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let directive = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive)))
        .init();

    tomato_job::run(args.port, &args.jobdata_path).await?;
    Ok(())
}
