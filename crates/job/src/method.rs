// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-role method execution (spec §4.6.1): one polling task per role,
//! walking that role's steps in order against its driver, appending sampled
//! points to a small columnar buffer and flushing it after each step.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use tomato_core::{Component, MethodStep, Task};
use tomato_wire::ComponentRequest;

use crate::error::JobError;

const CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// One sampled value, tagged with the step and technique that produced it
/// — the Rust replacement for the original's `xarray.Dataset` concatenated
/// along a `uts` axis.
#[derive(Debug, Clone, Serialize)]
pub struct RolePoint {
    pub step: usize,
    pub technique: String,
    pub uts: f64,
    pub val: Value,
}

#[derive(Debug, Default, Serialize)]
pub struct RoleBuffer {
    pub points: Vec<RolePoint>,
}

/// Run every step targeting one role, in order, against its resolved
/// component/driver. Returns `Ok(true)` if the role completed all its
/// steps, `Ok(false)` if it was cancelled mid-step (spec's `rd` abort path).
pub async fn run_role(
    role: &str,
    component: &Component,
    driver_port: u16,
    pollrate_ms: u64,
    steps: &[(usize, MethodStep)],
    job_dir: &Path,
    cancel: &CancellationToken,
) -> Result<bool, JobError> {
    let mut buffer = RoleBuffer::default();

    let register_req = ComponentRequest::DevRegister {
        address: component.address.clone(),
        channel: component.channel,
        role: role.to_string(),
    };
    let reply = tomato_wire::call(driver_port, &register_req, CALL_TIMEOUT, 3).await?;
    if !reply.success {
        return Err(JobError::TaskStart { role: role.to_string(), msg: reply.msg });
    }

    for (step_idx, step) in steps {
        if cancel.is_cancelled() {
            return Ok(false);
        }

        let task = Task {
            technique_name: step.technique.clone(),
            task_params: step.task_params.clone(),
            sampling_interval: step.sampling_interval,
            max_duration: step.max_duration,
        };
        let start_req = ComponentRequest::TaskStart {
            address: component.address.clone(),
            channel: component.channel,
            task: serde_json::to_value(&task)?,
        };
        let reply = tomato_wire::call(driver_port, &start_req, CALL_TIMEOUT, 3).await?;
        if !reply.success {
            return Err(JobError::TaskStart { role: role.to_string(), msg: reply.msg });
        }

        let completed =
            poll_until_done(component, driver_port, pollrate_ms, *step_idx, &step.technique, &mut buffer, cancel)
                .await?;
        write_role_file(job_dir, role, &buffer)?;
        if !completed {
            return Ok(false);
        }
    }
    Ok(true)
}

async fn poll_until_done(
    component: &Component,
    driver_port: u16,
    pollrate_ms: u64,
    step_idx: usize,
    technique: &str,
    buffer: &mut RoleBuffer,
    cancel: &CancellationToken,
) -> Result<bool, JobError> {
    let poll_interval = Duration::from_millis(pollrate_ms.max(1));
    loop {
        tokio::time::sleep(poll_interval).await;

        if cancel.is_cancelled() {
            let stop_req = ComponentRequest::TaskStop { address: component.address.clone(), channel: component.channel };
            if let Err(e) = tomato_wire::call(driver_port, &stop_req, CALL_TIMEOUT, 1).await {
                warn!(error = %e, "failed to stop task after cancellation");
            }
            return Ok(false);
        }

        let data_req = ComponentRequest::TaskData { address: component.address.clone(), channel: component.channel };
        let data_reply = tomato_wire::call(driver_port, &data_req, CALL_TIMEOUT, 3).await?;
        if let Some(points) = data_reply.data.as_ref().and_then(Value::as_array) {
            for point in points {
                let uts = point.get("uts").and_then(Value::as_f64).unwrap_or_default();
                let val = point.get("val").cloned().unwrap_or(Value::Null);
                buffer.points.push(RolePoint { step: step_idx, technique: technique.to_string(), uts, val });
            }
        }

        let status_req = ComponentRequest::TaskStatus { address: component.address.clone(), channel: component.channel };
        let status_reply = tomato_wire::call(driver_port, &status_req, CALL_TIMEOUT, 3).await?;
        let started = status_reply.data.as_ref().and_then(|d| d.get("started")).and_then(Value::as_bool).unwrap_or(false);
        if !started {
            return Ok(true);
        }
    }
}

fn write_role_file(job_dir: &Path, role: &str, buffer: &RoleBuffer) -> Result<PathBuf, JobError> {
    let dir = job_dir.join("data");
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(format!("{role}.json"));
    std::fs::write(&path, serde_json::to_vec_pretty(buffer)?)?;
    Ok(path)
}

#[cfg(test)]
#[path = "method_tests.rs"]
mod tests;
