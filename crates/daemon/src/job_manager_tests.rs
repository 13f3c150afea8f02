// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use tomato_core::{Component, DaemonSnapshot, Device, Job, JobId, JobStatus, Pipeline};

use super::*;

fn pipeline_with_worker_role(name: &str, sampleid: Option<&str>, ready: bool) -> Pipeline {
    let mut devs = IndexMap::new();
    devs.insert(
        "worker".to_string(),
        Component { name: "counter-1".to_string(), address: "counter-1".to_string(), channel: 0, role: "worker".to_string() },
    );
    Pipeline { name: name.to_string(), ready, jobid: None, sampleid: sampleid.map(str::to_string), devs }
}

/// The device backing the `counter-1` component referenced by
/// [`pipeline_with_worker_role`], exposing the `count` technique the
/// default test job payload requires.
fn counter_device() -> Device {
    Device {
        name: "counter-1".to_string(),
        driver: "counter".to_string(),
        address: "counter-1".to_string(),
        channels: vec![0],
        capabilities: vec!["count".to_string()],
        pollrate_ms: 1000,
    }
}

fn state_with(pips: Vec<Pipeline>, jobs: Vec<(JobId, Job)>) -> SharedState {
    let mut snapshot = DaemonSnapshot::bootstrap(10101, 0);
    snapshot.devs.insert(counter_device().name.clone(), counter_device());
    for pip in pips {
        snapshot.pips.insert(pip.name.clone(), pip);
    }
    for (id, job) in jobs {
        snapshot.jobs.insert(id, job);
    }
    Arc::new(Mutex::new(snapshot))
}

fn job_with(status: JobStatus, sample: &str) -> Job {
    let mut job = Job::builder().status(status).build();
    job.payload.sample.name = sample.to_string();
    job
}

#[test]
fn match_queue_promotes_queued_jobs_with_a_matching_pipeline() {
    let pip = pipeline_with_worker_role("pip-a", Some("s1"), true);
    let job = job_with(JobStatus::Queued, "s1");
    let state = state_with(vec![pip], vec![(JobId(1), job)]);

    match_queue(&state);

    assert_eq!(state.lock().jobs[&JobId(1)].status, JobStatus::QueuedMatched);
}

#[test]
fn match_queue_leaves_unmatched_jobs_queued() {
    // No pipeline exposes role "worker" here.
    let state = state_with(vec![], vec![(JobId(1), job_with(JobStatus::Queued, "s1"))]);

    match_queue(&state);

    assert_eq!(state.lock().jobs[&JobId(1)].status, JobStatus::Queued);
}

#[test]
fn dispatch_plan_pairs_each_job_with_a_distinct_ready_pipeline() {
    let pip_a = pipeline_with_worker_role("pip-a", Some("s1"), true);
    let pip_b = pipeline_with_worker_role("pip-b", Some("s1"), true);
    let j1 = job_with(JobStatus::QueuedMatched, "s1");
    let j2 = job_with(JobStatus::QueuedMatched, "s1");
    let state = state_with(vec![pip_a, pip_b], vec![(JobId(1), j1), (JobId(2), j2)]);

    let plan = build_dispatch_plan(&state);

    assert_eq!(plan.len(), 2);
    let names: BTreeSet<String> = plan.iter().map(|(_, name)| name.clone()).collect();
    assert_eq!(names, BTreeSet::from(["pip-a".to_string(), "pip-b".to_string()]));

    let snapshot = state.lock();
    assert!(snapshot.pips["pip-a"].jobid.is_some());
    assert!(snapshot.pips["pip-b"].jobid.is_some());
}

#[test]
fn dispatch_plan_skips_a_pipeline_whose_sample_does_not_match() {
    let pip = pipeline_with_worker_role("pip-a", Some("other-sample"), true);
    let job = job_with(JobStatus::QueuedMatched, "s1");
    let state = state_with(vec![pip], vec![(JobId(1), job)]);

    let plan = build_dispatch_plan(&state);

    assert!(plan.is_empty());
}

#[test]
fn dispatch_plan_skips_a_pipeline_that_is_not_ready() {
    let pip = pipeline_with_worker_role("pip-a", Some("s1"), false);
    let job = job_with(JobStatus::QueuedMatched, "s1");
    let state = state_with(vec![pip], vec![(JobId(1), job)]);

    assert!(build_dispatch_plan(&state).is_empty());
}

#[test]
fn finalize_sets_completed_error_and_clears_pipeline() {
    let mut pip = pipeline_with_worker_role("pip-a", Some("s1"), false);
    pip.jobid = Some(JobId(1));
    let job = job_with(JobStatus::Running, "s1");
    let state = state_with(vec![pip], vec![(JobId(1), job)]);

    finalize(&state, "pip-a", JobId(1), JobStatus::CompletedError);

    let snapshot = state.lock();
    assert_eq!(snapshot.jobs[&JobId(1)].status, JobStatus::CompletedError);
    assert!(snapshot.jobs[&JobId(1)].completed_at.is_some());
    assert!(snapshot.pips["pip-a"].jobid.is_none());
    assert!(!snapshot.pips["pip-a"].ready);
}

#[test]
fn clear_pipeline_releases_a_pipeline_whose_job_already_reported_completed() {
    let mut pip = pipeline_with_worker_role("pip-a", Some("s1"), false);
    pip.jobid = Some(JobId(1));
    let job = job_with(JobStatus::Completed, "s1");
    let state = state_with(vec![pip], vec![(JobId(1), job)]);

    clear_pipeline(&state, "pip-a", JobId(1));

    let snapshot = state.lock();
    assert_eq!(snapshot.jobs[&JobId(1)].status, JobStatus::Completed);
    assert!(snapshot.pips["pip-a"].jobid.is_none());
    assert!(!snapshot.pips["pip-a"].ready);
}

#[test]
fn clear_pipeline_is_a_no_op_if_the_pipeline_has_since_been_claimed_by_another_job() {
    let mut pip = pipeline_with_worker_role("pip-a", Some("s1"), false);
    pip.jobid = Some(JobId(2));
    let job = job_with(JobStatus::Completed, "s1");
    let state = state_with(vec![pip], vec![(JobId(1), job)]);

    clear_pipeline(&state, "pip-a", JobId(1));

    let snapshot = state.lock();
    assert_eq!(snapshot.pips["pip-a"].jobid, Some(JobId(2)));
}
