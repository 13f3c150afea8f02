// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ketchup`: the job queue CLI (spec §6 "Queue: submit, status, cancel,
//! snapshot, search").

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::json;

use tomato_cli::{client, exit_on_result, output, ExitError, SharedFlags};
use tomato_core::{DaemonSnapshot, JobId};
use tomato_wire::Request;

#[derive(Parser, Debug)]
#[command(name = "ketchup", about = "Submit and track tomato jobs")]
struct Cli {
    #[command(flatten)]
    shared: SharedFlags,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a payload file as a new job.
    Submit {
        payload_file: PathBuf,
        #[arg(long)]
        jobname: Option<String>,
    },
    /// Print one job's record, or every job if no ids are given.
    Status { jobid: Vec<JobId> },
    /// Cancel one or more jobs.
    Cancel { jobid: Vec<JobId> },
    /// Print the on-disk snapshot path(s) recorded for one or more jobs.
    Snapshot { jobid: Vec<JobId> },
    /// Search jobs by a substring of their jobname.
    Search { needle: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    exit_on_result(run(cli).await)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let shared = &cli.shared;
    match cli.command {
        Command::Submit { payload_file, jobname } => submit(shared, &payload_file, jobname).await,
        Command::Status { jobid } => status(shared, jobid).await,
        Command::Cancel { jobid } => cancel(shared, jobid).await,
        Command::Snapshot { jobid } => snapshot(shared, jobid).await,
        Command::Search { needle } => search(shared, &needle).await,
    }
}

fn read_payload(path: &std::path::Path) -> anyhow::Result<serde_json::Value> {
    let body = std::fs::read_to_string(path).map_err(|e| ExitError::new(1, format!("{}: {e}", path.display())))?;
    let is_yaml = matches!(path.extension().and_then(|e| e.to_str()), Some("yml") | Some("yaml"));
    if is_yaml {
        Ok(serde_yaml::from_str(&body).map_err(|e| ExitError::new(1, format!("malformed payload: {e}")))?)
    } else {
        Ok(serde_json::from_str(&body).map_err(|e| ExitError::new(1, format!("malformed payload: {e}")))?)
    }
}

async fn submit(shared: &SharedFlags, payload_file: &std::path::Path, jobname: Option<String>) -> anyhow::Result<()> {
    let payload = read_payload(payload_file)?;
    let mut params = json!({ "payload": payload });
    if let Some(name) = jobname {
        params["jobname"] = json!(name);
    }
    let req = Request::Job { id: None, params };
    let reply = client::call(shared.port, &req, shared.timeout()).await?;
    let id = reply.data.as_ref().and_then(|d| d.get("id")).cloned().unwrap_or_default();
    output::emit(shared.output_format(), &reply.data, || println!("queued job {id}"))?;
    Ok(())
}

async fn fetch_snapshot(shared: &SharedFlags) -> anyhow::Result<DaemonSnapshot> {
    let reply = client::call(shared.port, &Request::Status { with_data: true }, shared.timeout()).await?;
    let snapshot: DaemonSnapshot = serde_json::from_value(reply.data.unwrap_or_default())
        .map_err(|e| ExitError::new(2, format!("malformed daemon snapshot: {e}")))?;
    Ok(snapshot)
}

async fn status(shared: &SharedFlags, ids: Vec<JobId>) -> anyhow::Result<()> {
    if ids.is_empty() {
        let snapshot = fetch_snapshot(shared).await?;
        let jobs: Vec<_> = snapshot.jobs.values().collect();
        output::emit(shared.output_format(), &jobs, || {
            if jobs.is_empty() {
                println!("no jobs");
            }
            for job in &jobs {
                println!(
                    "{:>6}  {:<3}  {}",
                    job.id.map(|id| id.to_string()).unwrap_or_default(),
                    job.status,
                    job.jobname.as_deref().unwrap_or("-"),
                );
            }
        })?;
        return Ok(());
    }

    for id in ids {
        let req = Request::Job { id: Some(id), params: json!({}) };
        let reply = client::call(shared.port, &req, shared.timeout()).await?;
        output::emit(shared.output_format(), &reply.data, || {
            println!("{}", serde_json::to_string_pretty(&reply.data).unwrap_or_default());
        })?;
    }
    Ok(())
}

async fn cancel(shared: &SharedFlags, ids: Vec<JobId>) -> anyhow::Result<()> {
    if ids.is_empty() {
        return Err(ExitError::new(2, "at least one jobid is required").into());
    }
    for id in ids {
        let req = Request::Job { id: Some(id), params: json!({ "cancel": true }) };
        let reply = client::call(shared.port, &req, shared.timeout()).await?;
        println!("job {id}: {}", reply.msg);
    }
    Ok(())
}

async fn snapshot(shared: &SharedFlags, ids: Vec<JobId>) -> anyhow::Result<()> {
    if ids.is_empty() {
        return Err(ExitError::new(2, "at least one jobid is required").into());
    }
    for id in ids {
        let req = Request::Job { id: Some(id), params: json!({}) };
        let reply = client::call(shared.port, &req, shared.timeout()).await?;
        let path = reply.data.as_ref().and_then(|d| d.get("snappath")).and_then(|v| v.as_str());
        match path {
            Some(p) => println!("{id}: {p}"),
            None => println!("{id}: no snapshot recorded yet"),
        }
    }
    Ok(())
}

async fn search(shared: &SharedFlags, needle: &str) -> anyhow::Result<()> {
    let snapshot = fetch_snapshot(shared).await?;
    let matches: Vec<_> = snapshot
        .jobs
        .values()
        .filter(|j| j.jobname.as_deref().is_some_and(|n| n.contains(needle)))
        .collect();
    output::emit(shared.output_format(), &matches, || {
        if matches.is_empty() {
            println!("no jobs matching {needle:?}");
        }
        for job in &matches {
            println!(
                "{:>6}  {:<3}  {}",
                job.id.map(|id| id.to_string()).unwrap_or_default(),
                job.status,
                job.jobname.as_deref().unwrap_or("-"),
            );
        }
    })?;
    Ok(())
}
