// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// One `tomato-driver` process, spawned by the daemon's supervisor (spec
/// §4.2): `tomato-driver --name <driver> --port 0 --daemon-port <port>`.
#[derive(Parser, Debug)]
#[command(name = "tomato-driver")]
struct Args {
    /// Driver name, resolved against the compiled-in registry.
    #[arg(long)]
    name: String,

    /// Port to bind this driver's own control socket on; 0 lets the OS
    /// choose (always the case in practice — the supervisor never passes
    /// anything else, matching `original_source`'s `port=0` convention).
    #[arg(long, default_value_t = 0)]
    port: u16,

    /// The daemon's control socket port, used to self-register.
    #[arg(long = "daemon-port")]
    daemon_port: u16,

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

    tomato_driver::run(&args.name, args.port, args.daemon_port).await?;
    Ok(())
}
