// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tomato`: the control CLI (spec §6 "Control: status, start, stop, init,
//! reload, pipeline load/eject/ready").

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::json;

use tomato_cli::{client, exit_on_result, output, ExitError, SharedFlags};
use tomato_wire::Request;

#[derive(Parser, Debug)]
#[command(name = "tomato", about = "Control the tomato daemon and its pipelines")]
struct Cli {
    #[command(flatten)]
    shared: SharedFlags,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the daemon's status, or its full state with `--with-data`.
    Status {
        #[arg(long)]
        with_data: bool,
    },
    /// Spawn the daemon as a detached background process.
    Start,
    /// Ask the daemon to shut down gracefully.
    Stop,
    /// Write a default `settings.toml` template.
    Init,
    /// Load the devices file named in `settings.toml` and apply it.
    Reload,
    /// Pipeline sub-commands: load/eject/ready.
    #[command(subcommand)]
    Pipeline(PipelineCommand),
}

#[derive(Subcommand, Debug)]
enum PipelineCommand {
    /// Load a sample onto a pipeline.
    Load { pipeline: String, sampleid: String },
    /// Eject the current sample from a pipeline.
    Eject { pipeline: String },
    /// Mark a pipeline ready to accept a matching job.
    Ready { pipeline: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    exit_on_result(run(cli).await)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let shared = &cli.shared;
    match cli.command {
        Command::Status { with_data } => status(shared, with_data).await,
        Command::Start => start(shared).await,
        Command::Stop => stop(shared).await,
        Command::Init => init(shared).await,
        Command::Reload => reload(shared).await,
        Command::Pipeline(PipelineCommand::Load { pipeline, sampleid }) => {
            pipeline_set(shared, &pipeline, json!({ "sampleid": sampleid })).await
        }
        Command::Pipeline(PipelineCommand::Eject { pipeline }) => {
            pipeline_set(shared, &pipeline, json!({ "sampleid": null })).await
        }
        Command::Pipeline(PipelineCommand::Ready { pipeline }) => {
            pipeline_set(shared, &pipeline, json!({ "ready": true })).await
        }
    }
}

async fn status(shared: &SharedFlags, with_data: bool) -> anyhow::Result<()> {
    let reply = client::call(shared.port, &Request::Status { with_data }, shared.timeout()).await?;
    output::emit(shared.output_format(), &reply.data, || {
        if with_data {
            println!("{}", serde_json::to_string_pretty(&reply.data).unwrap_or_default());
        } else {
            let status = reply.data.as_ref().and_then(|d| d.as_str()).unwrap_or("unknown");
            println!("daemon status: {status}");
        }
    })?;
    Ok(())
}

fn daemon_binary() -> PathBuf {
    if let Ok(path) = std::env::var("TOMATO_DAEMON_BIN") {
        return PathBuf::from(path);
    }
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.join("tomato-daemon")))
        .unwrap_or_else(|| PathBuf::from("tomato-daemon"))
}

async fn start(shared: &SharedFlags) -> anyhow::Result<()> {
    use std::os::unix::process::CommandExt;

    let mut cmd = tokio::process::Command::new(daemon_binary());
    cmd.arg("--port").arg(shared.port.to_string());
    cmd.arg("--app-directory").arg(shared.appdir());
    if let Some(d) = &shared.data_directory {
        cmd.arg("--data-directory").arg(d);
    }
    if let Some(d) = &shared.log_directory {
        cmd.arg("--log-directory").arg(d);
    }
    cmd.process_group(0);
    cmd.kill_on_drop(false);
    cmd.stdin(std::process::Stdio::null());

    let child = cmd.spawn().map_err(|e| ExitError::new(2, format!("failed to spawn daemon: {e}")))?;
    println!("daemon starting on port {} (pid {})", shared.port, child.id().unwrap_or(0));
    Ok(())
}

async fn stop(shared: &SharedFlags) -> anyhow::Result<()> {
    client::call(shared.port, &Request::Stop, shared.timeout()).await?;
    println!("daemon stopping");
    Ok(())
}

async fn init(shared: &SharedFlags) -> anyhow::Result<()> {
    let appdir = shared.appdir();
    let datadir = shared.data_directory.clone().unwrap_or_else(|| appdir.join("data"));
    let path = tomato_storage::config::Settings::write_default(&appdir, &datadir)
        .map_err(|e| ExitError::new(1, e.to_string()))?;
    println!("wrote {}", path.display());
    Ok(())
}

async fn reload(shared: &SharedFlags) -> anyhow::Result<()> {
    let appdir = shared.appdir();
    let settings = tomato_storage::load_settings(&appdir).map_err(|e| ExitError::new(1, e.to_string()))?;
    let file = tomato_storage::load_devices_file(&settings.devices.config).map_err(|e| ExitError::new(1, e.to_string()))?;
    let (devs, pips) = tomato_storage::config::build_devices_and_pipelines(&file).map_err(|e| ExitError::new(1, e.to_string()))?;

    let devices: Vec<_> = devs.into_values().map(|d| serde_json::to_value(d).unwrap_or_default()).collect();
    let pipelines: Vec<_> = pips.into_values().map(|p| serde_json::to_value(p).unwrap_or_default()).collect();
    let req = Request::Setup { settings: json!({}), pipelines, devices };

    let reply = client::call(shared.port, &req, shared.timeout()).await?;
    println!("{}", reply.msg);
    Ok(())
}

async fn pipeline_set(shared: &SharedFlags, pipeline: &str, params: serde_json::Value) -> anyhow::Result<()> {
    let req = Request::Pipeline { pipeline: pipeline.to_string(), params };
    let reply = client::call(shared.port, &req, shared.timeout()).await?;
    output::emit(shared.output_format(), &reply.data, || println!("{}", reply.msg))?;
    Ok(())
}
