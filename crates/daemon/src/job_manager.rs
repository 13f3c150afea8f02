// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job manager: a background tokio task running the reaper, matcher and
//! dispatcher tick in order. Grounded on
//! `original_source/src/tomato/daemon/job.py::manager` and its three
//! helpers `manage_running_pips`, `check_queued_jobs`, `action_queued_jobs`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use tomato_core::process::{pid_alive, terminate};
use tomato_core::{find_matching_pipelines, JobId, JobStatus};
use tomato_storage::{job_dir, write_jobdata, JobData, JobRef};

use crate::state::SharedState;

const TICK: Duration = Duration::from_secs(1);
const KILL_TIMEOUT: Duration = Duration::from_secs(10);

pub struct JobManagerConfig {
    pub jobs_storage: PathBuf,
    pub job_bin: PathBuf,
    pub daemon_port: u16,
}

pub async fn run(state: SharedState, shutdown: CancellationToken, config: JobManagerConfig) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = tokio::time::sleep(TICK) => {}
        }

        reap(&state).await;
        match_queue(&state);
        dispatch(&state, &config).await;
    }
}

/// For every pipeline whose job has died or whose cancel is in flight,
/// finalize the job and clear the pipeline (spec §4.3 step 1).
async fn reap(state: &SharedState) {
    let candidates: Vec<(String, JobId, Option<u32>, JobStatus)> = {
        let snapshot = state.lock();
        snapshot
            .pips
            .iter()
            .filter_map(|(name, pip)| {
                let job_id = pip.jobid?;
                let job = snapshot.jobs.get(&job_id)?;
                Some((name.clone(), job_id, job.pid, job.status))
            })
            .collect()
    };

    for (pip_name, job_id, pid, status) in candidates {
        let alive = pid.map(pid_alive).unwrap_or(false);
        if status == JobStatus::RunDeleteRequested && alive {
            if let Some(pid) = pid {
                let _ = terminate(pid);
            }
            wait_for_exit(pid, KILL_TIMEOUT).await;
            finalize(state, &pip_name, job_id, JobStatus::Cancelled);
        } else if status == JobStatus::Running && !alive {
            finalize(state, &pip_name, job_id, JobStatus::CompletedError);
        } else if status.is_terminal() {
            // The job worker already reported its own terminal status (`c`
            // or `ce`) directly to the daemon; the pipeline it ran on is
            // still holding the claim from dispatch and needs clearing here.
            clear_pipeline(state, &pip_name, job_id);
        }
    }
}

fn clear_pipeline(state: &SharedState, pip_name: &str, job_id: JobId) {
    let mut snapshot = state.lock();
    if let Some(pip) = snapshot.pips.get_mut(pip_name) {
        if pip.jobid == Some(job_id) {
            pip.jobid = None;
            pip.ready = false;
        }
    }
}

async fn wait_for_exit(pid: Option<u32>, timeout: Duration) {
    let Some(pid) = pid else { return };
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if !pid_alive(pid) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}

fn finalize(state: &SharedState, pip_name: &str, job_id: JobId, to: JobStatus) {
    let mut snapshot = state.lock();
    if let Some(job) = snapshot.jobs.get_mut(&job_id) {
        if job.set_status(to).is_ok() {
            job.completed_at = Some(Utc::now());
        }
    }
    if let Some(pip) = snapshot.pips.get_mut(pip_name) {
        pip.jobid = None;
        pip.ready = false;
    }
}

/// Promote `q` jobs that now have at least one matching pipeline to `qw`
/// (spec §4.3 step 2).
fn match_queue(state: &SharedState) {
    let mut snapshot = state.lock();
    let queued: Vec<JobId> =
        snapshot.jobs.iter().filter(|(_, j)| j.status == JobStatus::Queued).map(|(id, _)| *id).collect();

    for id in queued {
        let Some(payload) = snapshot.jobs.get(&id).map(|j| j.payload.clone()) else { continue };
        let has_match = !find_matching_pipelines(snapshot.pips.values(), &snapshot.devs, &payload).is_empty();
        if has_match {
            if let Some(job) = snapshot.jobs.get_mut(&id) {
                let _ = job.set_status(JobStatus::QueuedMatched);
            }
        }
    }
}

/// Greedily pair every `qw` job (ascending id) with the first `ready`
/// pipeline whose `sampleid` matches, each pipeline claimed at most once
/// this tick (spec §4.3 step 3: break only the inner per-pipeline loop, so
/// distinct jobs can each dispatch to a distinct pipeline in the same
/// tick). Pipeline `jobid`/`ready` are committed before the lock is
/// released, so a concurrent `pipeline eject` can never race the claim.
fn build_dispatch_plan(state: &SharedState) -> Vec<(JobId, String)> {
    let mut snapshot = state.lock();

    let mut waiting: Vec<JobId> =
        snapshot.jobs.iter().filter(|(_, j)| j.status == JobStatus::QueuedMatched).map(|(id, _)| *id).collect();
    waiting.sort();

    let mut pip_names: Vec<String> = snapshot.pips.keys().cloned().collect();
    pip_names.sort();

    let mut claimed: BTreeSet<String> = BTreeSet::new();
    let mut plan = Vec::new();

    for job_id in waiting {
        let Some(job) = snapshot.jobs.get(&job_id) else { continue };
        let sample = job.payload.sample.name.clone();
        for name in &pip_names {
            if claimed.contains(name) {
                continue;
            }
            let pip = &snapshot.pips[name];
            if !pip.ready || pip.sampleid.as_deref() != Some(sample.as_str()) {
                continue;
            }
            plan.push((job_id, name.clone()));
            claimed.insert(name.clone());
            break;
        }
    }

    for (job_id, pip_name) in &plan {
        if let Some(pip) = snapshot.pips.get_mut(pip_name) {
            pip.jobid = Some(*job_id);
            pip.ready = false;
        }
    }

    plan
}

async fn dispatch(state: &SharedState, config: &JobManagerConfig) {
    let plan = build_dispatch_plan(state);
    for (job_id, pip_name) in plan {
        execute_dispatch(state, config, job_id, &pip_name).await;
    }
}

fn rollback_claim(state: &SharedState, pip_name: &str) {
    let mut snapshot = state.lock();
    if let Some(pip) = snapshot.pips.get_mut(pip_name) {
        pip.jobid = None;
        pip.ready = true;
    }
}

async fn execute_dispatch(state: &SharedState, config: &JobManagerConfig, job_id: JobId, pip_name: &str) {
    let (pipeline, payload) = {
        let snapshot = state.lock();
        let Some(pipeline) = snapshot.pips.get(pip_name).cloned() else { return };
        let Some(payload) = snapshot.jobs.get(&job_id).map(|j| j.payload.clone()) else { return };
        (pipeline, payload)
    };

    let path = job_dir(&config.jobs_storage, job_id);
    let data = JobData { pipeline, payload, job: JobRef { id: job_id, path: path.clone() } };

    let jobdata_path = match write_jobdata(&config.jobs_storage, &data) {
        Ok(p) => p,
        Err(e) => {
            warn!(job = %job_id, error = %e, "failed to write jobdata, rolling back dispatch");
            rollback_claim(state, pip_name);
            return;
        }
    };

    match spawn_job_worker(&config.job_bin, config.daemon_port, &jobdata_path) {
        Ok(child) => {
            // Not joined: tokio reaps orphaned children in the background.
            let pid = child.id();
            let mut snapshot = state.lock();
            if let Some(job) = snapshot.jobs.get_mut(&job_id) {
                let _ = job.set_status(JobStatus::Running);
                job.executed_at = Some(Utc::now());
                job.jobpath = Some(path);
                job.pid = pid;
            }
        }
        Err(e) => {
            warn!(job = %job_id, error = %e, "failed to spawn job worker, rolling back dispatch");
            rollback_claim(state, pip_name);
        }
    }
}

fn spawn_job_worker(bin: &Path, daemon_port: u16, jobdata_path: &Path) -> std::io::Result<tokio::process::Child> {
    use std::os::unix::process::CommandExt;

    tokio::process::Command::new(bin)
        .arg("--port")
        .arg(daemon_port.to_string())
        .arg(jobdata_path)
        .process_group(0)
        .kill_on_drop(false)
        .spawn()
}

#[cfg(test)]
#[path = "job_manager_tests.rs"]
mod tests;
