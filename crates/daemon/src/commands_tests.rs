// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::json;
use tomato_core::{Component, DaemonSnapshot, JobId, JobPayload, JobStatus, Pipeline};

use super::*;

fn empty_state() -> SharedState {
    Arc::new(Mutex::new(DaemonSnapshot::bootstrap(10101, 0)))
}

fn pipeline_with_worker(name: &str) -> Pipeline {
    let mut devs = IndexMap::new();
    devs.insert(
        "worker".to_string(),
        Component { name: "counter-1".to_string(), address: "counter-1".to_string(), channel: 0, role: "worker".to_string() },
    );
    Pipeline { name: name.to_string(), ready: false, jobid: None, sampleid: None, devs }
}

#[test]
fn status_without_data_omits_the_snapshot() {
    let state = empty_state();
    let reply = status(&state, false);
    assert!(reply.success);
    assert_eq!(reply.data, Some(json!("bootstrap")));
}

#[test]
fn status_with_data_returns_the_full_snapshot() {
    let state = empty_state();
    let reply = status(&state, true);
    assert!(reply.data.unwrap().get("port").is_some());
}

#[test]
fn stop_rejects_while_a_job_is_running() {
    let state = empty_state();
    let job = tomato_core::Job::builder().status(JobStatus::Running).build();
    state.lock().jobs.insert(JobId(1), job);

    let reply = stop(&state);

    assert!(!reply.success);
    assert_eq!(reply.msg, "jobs are running");
}

#[test]
fn stop_succeeds_with_no_running_jobs() {
    let state = empty_state();
    let reply = stop(&state);
    assert!(reply.success);
    assert_eq!(state.lock().status, tomato_core::DaemonStatus::Stop);
}

#[test]
fn pipeline_load_sets_sampleid() {
    let state = empty_state();
    state.lock().pips.insert("pip-a".to_string(), pipeline_with_worker("pip-a"));

    let reply = pipeline(&state, "pip-a", json!({"sampleid": "s1"}));

    assert!(reply.success);
    assert_eq!(state.lock().pips["pip-a"].sampleid.as_deref(), Some("s1"));
}

#[test]
fn pipeline_eject_is_forbidden_while_running() {
    let state = empty_state();
    let mut pip = pipeline_with_worker("pip-a");
    pip.jobid = Some(JobId(1));
    pip.sampleid = Some("s1".to_string());
    state.lock().pips.insert("pip-a".to_string(), pip);

    let reply = pipeline(&state, "pip-a", json!({"sampleid": null}));

    assert!(!reply.success);
    assert_eq!(state.lock().pips["pip-a"].sampleid.as_deref(), Some("s1"));
}

#[test]
fn pipeline_ready_is_forbidden_while_running() {
    let state = empty_state();
    let mut pip = pipeline_with_worker("pip-a");
    pip.jobid = Some(JobId(1));
    state.lock().pips.insert("pip-a".to_string(), pip);

    let reply = pipeline(&state, "pip-a", json!({"ready": true}));

    assert!(!reply.success);
}

#[test]
fn pipeline_read_with_empty_params_does_not_mutate() {
    let state = empty_state();
    state.lock().pips.insert("pip-a".to_string(), pipeline_with_worker("pip-a"));

    let reply = pipeline(&state, "pip-a", json!({}));

    assert!(reply.success);
}

#[test]
fn pipeline_unknown_name_errors() {
    let state = empty_state();
    let reply = pipeline(&state, "nope", json!({}));
    assert!(!reply.success);
}

#[test]
fn job_create_assigns_sequential_ids() {
    let state = empty_state();
    let payload = serde_json::to_value(JobPayload::test_default()).unwrap();

    let first = job(&state, None, json!({"payload": payload.clone()}));
    let second = job(&state, None, json!({"payload": payload}));

    assert_eq!(first.data.unwrap()["id"], json!(1));
    assert_eq!(second.data.unwrap()["id"], json!(2));
    assert_eq!(state.lock().nextjob, JobId(3));
}

#[test]
fn job_cancel_while_queued_goes_straight_to_cancelled() {
    let state = empty_state();
    state.lock().jobs.insert(JobId(1), tomato_core::Job::builder().status(JobStatus::Queued).build());

    let reply = job(&state, Some(JobId(1)), json!({"cancel": true}));

    assert!(reply.success);
    assert_eq!(state.lock().jobs[&JobId(1)].status, JobStatus::Cancelled);
}

#[test]
fn job_cancel_while_running_requests_delete() {
    let state = empty_state();
    state.lock().jobs.insert(JobId(1), tomato_core::Job::builder().status(JobStatus::Running).build());

    let reply = job(&state, Some(JobId(1)), json!({"cancel": true}));

    assert!(reply.success);
    assert_eq!(state.lock().jobs[&JobId(1)].status, JobStatus::RunDeleteRequested);
}

#[test]
fn job_cancel_on_terminal_job_errors() {
    let state = empty_state();
    state.lock().jobs.insert(JobId(1), tomato_core::Job::builder().status(JobStatus::Completed).build());

    let reply = job(&state, Some(JobId(1)), json!({"cancel": true}));

    assert!(!reply.success);
}

#[test]
fn job_worker_reports_completion_via_status_field() {
    let state = empty_state();
    state.lock().jobs.insert(JobId(1), tomato_core::Job::builder().status(JobStatus::Running).build());

    let reply = job(&state, Some(JobId(1)), json!({"status": "c"}));

    assert!(reply.success);
    let snapshot = state.lock();
    assert_eq!(snapshot.jobs[&JobId(1)].status, JobStatus::Completed);
    assert!(snapshot.jobs[&JobId(1)].completed_at.is_some());
}

#[test]
fn driver_registers_port_and_pid() {
    let state = empty_state();

    let reply = driver(&state, "counter", json!({"port": 5000, "pid": 123}));

    assert!(reply.success);
    let snapshot = state.lock();
    assert_eq!(snapshot.drvs["counter"].port, Some(5000));
    assert_eq!(snapshot.drvs["counter"].pid, Some(123));
}

#[test]
fn setup_in_bootstrap_installs_unconditionally() {
    let state = empty_state();
    let pip = serde_json::to_value(pipeline_with_worker("pip-a")).unwrap();

    let reply = setup(&state, json!({}), vec![pip], vec![]);

    assert!(reply.success);
    let snapshot = state.lock();
    assert_eq!(snapshot.status, tomato_core::DaemonStatus::Running);
    assert!(snapshot.pips.contains_key("pip-a"));
}

#[test]
fn setup_while_running_rejects_deleting_a_running_pipeline() {
    let state = empty_state();
    let mut pip = pipeline_with_worker("pip-a");
    pip.jobid = Some(JobId(1));
    state.lock().pips.insert("pip-a".to_string(), pip);
    state.lock().status = tomato_core::DaemonStatus::Running;

    let reply = setup(&state, json!({}), vec![], vec![]);

    assert!(!reply.success);
    assert_eq!(reply.msg, "reload would delete a running pipeline");
}
