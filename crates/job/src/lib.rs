// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tomato-job: one process per running job (spec §4.6). Reads `jobdata.json`,
//! resolves each method role to its driver, runs every role's steps
//! concurrently, and reports the final status back to the daemon.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod error;
pub mod method;
pub mod resolve;

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use tomato_core::{JobId, MethodStep};
use tomato_wire::Request;

pub use error::JobError;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(500);
const CALL_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn run(daemon_port: u16, jobdata_path: &Path) -> Result<(), JobError> {
    let data = tomato_storage::read_jobdata(jobdata_path)?;
    let job_id = data.job.id;
    let job_dir = data.job.path.clone();

    let resolved = resolve::resolve_roles(daemon_port, &data.pipeline).await?;

    let mut by_role: BTreeMap<String, Vec<(usize, MethodStep)>> = BTreeMap::new();
    for (idx, step) in data.payload.method.iter().enumerate() {
        by_role.entry(step.device.clone()).or_default().push((idx, step.clone()));
    }

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn(watch_for_cancel(daemon_port, job_id, cancel.clone()));

    let mut handles = Vec::new();
    for (role, steps) in by_role {
        let Some(resolved_role) = resolved.get(&role) else {
            cancel.cancel();
            return Err(JobError::UnresolvedRole(role));
        };
        let component = resolved_role.component.clone();
        let driver_port = resolved_role.driver_port;
        let pollrate_ms = resolved_role.pollrate_ms;
        let job_dir = job_dir.clone();
        let cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            method::run_role(&role, &component, driver_port, pollrate_ms, &steps, &job_dir, &cancel).await
        }));
    }

    let mut had_error = false;
    let mut all_completed = true;
    for handle in handles {
        match handle.await {
            Ok(Ok(completed)) => all_completed &= completed,
            Ok(Err(e)) => {
                warn!(error = %e, "role poller failed");
                had_error = true;
            }
            Err(e) => {
                warn!(error = %e, "role poller task panicked");
                had_error = true;
            }
        }
    }
    watcher.abort();

    if cancel.is_cancelled() && !had_error {
        info!(job = %job_id, "job cancelled mid-run, leaving status for the reaper");
        return Ok(());
    }

    let status = if had_error || !all_completed { "ce" } else { "c" };
    report_status(daemon_port, job_id, status).await
}

/// Polls the daemon for this job's own status and cancels the shared token
/// the moment it observes `rd` (spec §4.6.1 "`rd` (observed mid-run) aborts
/// the current step's task").
async fn watch_for_cancel(daemon_port: u16, job_id: JobId, cancel: CancellationToken) {
    loop {
        tokio::time::sleep(CANCEL_POLL_INTERVAL).await;
        let req = Request::Job { id: Some(job_id), params: serde_json::json!({}) };
        match tomato_wire::call(daemon_port, &req, CALL_TIMEOUT, 1).await {
            Ok(reply) if reply.success => {
                let status = reply.data.as_ref().and_then(|d| d.get("status")).and_then(|s| s.as_str());
                if status == Some("rd") {
                    cancel.cancel();
                    return;
                }
            }
            Ok(reply) => warn!(job = %job_id, msg = reply.msg, "failed to poll job status"),
            Err(e) => warn!(job = %job_id, error = %e, "failed to reach daemon while polling job status"),
        }
    }
}

async fn report_status(daemon_port: u16, job_id: JobId, status: &str) -> Result<(), JobError> {
    let req = Request::Job { id: Some(job_id), params: serde_json::json!({ "status": status }) };
    let reply = tomato_wire::call(daemon_port, &req, CALL_TIMEOUT, 5).await?;
    if !reply.success {
        warn!(job = %job_id, msg = reply.msg, "daemon rejected final job status report");
    }
    Ok(())
}
