// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handlers for the six commands the daemon's control socket accepts (spec
//! §4.1 "Public operations"). Every handler takes the shared state and a
//! decoded [`Request`] variant's fields and returns a [`Reply`] — never a
//! panic, matching §7's "a malformed request yields `Reply{success: false}`,
//! never a dropped connection".

use chrono::Utc;
use serde_json::Value;
use tomato_core::{merge_pipelines, reload_conflict, Device, Driver, Job, JobId, JobStatus, Pipeline};
use tomato_wire::Reply;

use crate::state::SharedState;

pub fn status(state: &SharedState, with_data: bool) -> Reply {
    let snapshot = state.lock();
    if with_data {
        Reply::ok_with("status", snapshot.clone())
    } else {
        Reply::ok_with("status", snapshot.status)
    }
}

/// `stop`: refuses while any job is `r` (spec §4.1 "If any Job is in `r`,
/// fails with 'jobs are running'"). The caller (listener) is responsible for
/// cancelling the shutdown token only after this returns success.
pub fn stop(state: &SharedState) -> Reply {
    let mut snapshot = state.lock();
    if snapshot.jobs.values().any(|j| j.status == JobStatus::Running) {
        return Reply::err("jobs are running");
    }
    snapshot.status = tomato_core::DaemonStatus::Stop;
    Reply::ok("stopping")
}

/// `setup`: installs unconditionally in `Bootstrap`, merges safely in
/// `Running` (spec §4.1.1). `settings` is accepted but not itself part of
/// the daemon's mutable state — it only ever configures the driver
/// supervisor/CLI, so it is logged and otherwise ignored here.
pub fn setup(state: &SharedState, _settings: Value, pipelines: Vec<Value>, devices: Vec<Value>) -> Reply {
    let incoming_pips: Result<Vec<Pipeline>, _> = pipelines.into_iter().map(serde_json::from_value).collect();
    let incoming_devs: Result<Vec<Device>, _> = devices.into_iter().map(serde_json::from_value).collect();

    let (incoming_pips, incoming_devs) = match (incoming_pips, incoming_devs) {
        (Ok(p), Ok(d)) => (p, d),
        _ => return Reply::err("malformed setup payload"),
    };

    let mut snapshot = state.lock();
    let incoming_map: std::collections::BTreeMap<String, Pipeline> =
        incoming_pips.into_iter().map(|p| (p.name.clone(), p)).collect();

    if snapshot.status == tomato_core::DaemonStatus::Bootstrap {
        snapshot.pips = incoming_map;
        snapshot.devs = incoming_devs.into_iter().map(|d| (d.name.clone(), d)).collect();
        snapshot.status = tomato_core::DaemonStatus::Running;
        let merged: Vec<Pipeline> = snapshot.pips.values().cloned().collect();
        return Reply::ok_with("installed", merged);
    }

    for (name, cur) in snapshot.pips.iter() {
        if let Some(msg) = reload_conflict(cur, incoming_map.get(name)) {
            return Reply::err(msg);
        }
    }
    let incoming_dev_map: std::collections::BTreeMap<String, Device> =
        incoming_devs.iter().cloned().map(|d| (d.name.clone(), d)).collect();
    for (name, cur_dev) in snapshot.devs.iter() {
        if incoming_dev_map.get(name) != Some(cur_dev) {
            if let Some(msg) = tomato_core::driver_conflict(&cur_dev.driver, &snapshot.devs, &snapshot.pips) {
                return Reply::err(msg);
            }
        }
    }

    let merged = merge_pipelines(&snapshot.pips, &incoming_map);
    snapshot.pips = merged.clone();
    snapshot.devs = incoming_devs.into_iter().map(|d| (d.name.clone(), d)).collect();
    Reply::ok_with("merged", merged.into_values().collect::<Vec<_>>())
}

/// `pipeline(name, params)`: applies the allowed subset of field writes
/// (spec §4.1 "pipeline"). `params` is an object that may carry `sampleid`
/// (string or `null` to eject), `ready` (bool), `jobid` (job id or `null`).
/// An empty/absent `params` is a pure read.
pub fn pipeline(state: &SharedState, name: &str, params: Value) -> Reply {
    let mut snapshot = state.lock();
    let Some(pip) = snapshot.pips.get_mut(name) else {
        return Reply::err(format!("pipeline {name:?} not found"));
    };

    let obj = match params.as_object() {
        Some(o) if !o.is_empty() => o,
        _ => return Reply::ok_with("pipeline", pip.clone()),
    };

    if let Some(v) = obj.get("sampleid") {
        let ejecting = v.is_null();
        if ejecting && pip.is_running() {
            return Reply::err("cannot eject a pipeline with a running job");
        }
        pip.sampleid = v.as_str().map(str::to_string);
    }
    if let Some(v) = obj.get("ready") {
        let ready = v.as_bool().unwrap_or(false);
        if ready && pip.is_running() {
            return Reply::err("cannot mark a pipeline with a running job ready");
        }
        pip.ready = ready;
    }
    if let Some(v) = obj.get("jobid") {
        pip.jobid = if v.is_null() { None } else { serde_json::from_value(v.clone()).ok() };
    }

    Reply::ok_with("pipeline", pip.clone())
}

/// `job(id?, params)`: creates a job when `id` is absent, otherwise mutates
/// the identified job's allowed fields, including the `cancel` convenience
/// that picks the correct target status for the job's current state (spec
/// §4.1 "job status machine").
pub fn job(state: &SharedState, id: Option<JobId>, params: Value) -> Reply {
    match id {
        None => create_job(state, params),
        Some(id) => mutate_job(state, id, params),
    }
}

fn create_job(state: &SharedState, params: Value) -> Reply {
    let Some(obj) = params.as_object() else { return Reply::err("missing job payload") };
    let payload = match obj.get("payload").cloned() {
        Some(v) => match serde_json::from_value(v) {
            Ok(p) => p,
            Err(e) => return Reply::err(format!("malformed payload: {e}")),
        },
        None => return Reply::err("missing job payload"),
    };
    let jobname = obj.get("jobname").and_then(|v| v.as_str()).map(str::to_string);

    let mut snapshot = state.lock();
    let id = snapshot.nextjob;
    snapshot.nextjob = id.next();
    let mut job = Job::new(payload, jobname);
    job.id = Some(id);
    snapshot.jobs.insert(id, job);
    Reply::ok_with("job queued", serde_json::json!({ "id": id }))
}

fn mutate_job(state: &SharedState, id: JobId, params: Value) -> Reply {
    let mut snapshot = state.lock();
    let Some(job) = snapshot.jobs.get_mut(&id) else {
        return Reply::err(format!("job {id} not found"));
    };

    let obj = match params.as_object() {
        Some(o) if !o.is_empty() => o,
        _ => return Reply::ok_with("job", job.clone()),
    };

    if obj.get("cancel").and_then(Value::as_bool) == Some(true) {
        let target = match job.status {
            JobStatus::Queued | JobStatus::QueuedMatched => JobStatus::Cancelled,
            JobStatus::Running => JobStatus::RunDeleteRequested,
            _ => return Reply::err("job is already terminal"),
        };
        if let Err(e) = job.set_status(target) {
            return Reply::err(e.to_string());
        }
        if target == JobStatus::Cancelled {
            job.completed_at = Some(Utc::now());
        }
        return Reply::ok_with("job", job.clone());
    }

    if let Some(v) = obj.get("status") {
        let target: JobStatus = match serde_json::from_value(v.clone()) {
            Ok(s) => s,
            Err(_) => return Reply::err("unknown job status"),
        };
        if let Err(e) = job.set_status(target) {
            return Reply::err(e.to_string());
        }
        if target.is_terminal() {
            job.completed_at = Some(Utc::now());
        }
    }
    if let Some(v) = obj.get("pid") {
        job.pid = v.as_u64().map(|n| n as u32);
    }
    if let Some(v) = obj.get("jobpath") {
        job.jobpath = v.as_str().map(Into::into);
    }
    if let Some(v) = obj.get("respath") {
        job.respath = v.as_str().map(Into::into);
    }
    if let Some(v) = obj.get("snappath") {
        job.snappath = v.as_str().map(Into::into);
    }

    Reply::ok_with("job", job.clone())
}

/// `driver(name, params)`: used both by the driver supervisor's own spawn
/// bookkeeping (in this crate, applied directly against `SharedState` rather
/// than over the wire — see `supervisor.rs`) and by a newly-spawned driver
/// process self-registering its `port`/`pid`/`connected_at`/`settings`.
pub fn driver(state: &SharedState, name: &str, params: Value) -> Reply {
    let mut snapshot = state.lock();
    let drv = snapshot.drvs.entry(name.to_string()).or_insert_with(|| Driver::new(name));

    let Some(obj) = params.as_object() else { return Reply::ok_with("driver", drv.clone()) };
    if let Some(v) = obj.get("port") {
        drv.port = v.as_u64().map(|n| n as u16);
    }
    if let Some(v) = obj.get("pid") {
        drv.pid = v.as_u64().map(|n| n as u32);
    }
    if let Some(v) = obj.get("connected_at") {
        drv.connected_at = serde_json::from_value(v.clone()).ok();
    }
    if let Some(v) = obj.get("spawned_at") {
        drv.spawned_at = serde_json::from_value(v.clone()).ok();
    }
    if let Some(v) = obj.get("settings") {
        if let Some(map) = v.as_object() {
            drv.settings = map.clone();
        }
    }

    Reply::ok_with("driver", drv.clone())
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
