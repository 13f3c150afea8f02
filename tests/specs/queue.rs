//! Queue CLI specs: submit/status/cancel/search against jobs that never
//! get matched to a pipeline — exercising the `q` state and its
//! `cancel`/`search` paths without needing a live driver.

use crate::prelude::*;

const UNMATCHABLE_PAYLOAD: &str = r#"{
  "sample": { "name": "s1" },
  "method": [
    { "device": "nobody-provides-this-role", "technique": "count", "sampling_interval": 1.0, "max_duration": 3.0 }
  ]
}"#;

fn write_payload(dep: &Deployment, body: &str) -> std::path::PathBuf {
    let path = dep.datadir().join("payload.json");
    std::fs::write(&path, body).expect("write payload");
    path
}

#[test]
fn submit_then_status_shows_the_queued_job() {
    let dep = Deployment::new();
    dep.init();
    dep.start();

    let payload = write_payload(&dep, UNMATCHABLE_PAYLOAD);
    let submitted = dep.ketchup().args(&["submit"]).arg(payload.display().to_string()).args(&["--jobname", "spec-job"]).passes();
    assert!(submitted.stdout().contains("queued job"));

    let status = dep.ketchup().args(&["status"]).passes();
    assert!(status.stdout().contains("spec-job"));
}

/// "Submitting a job whose method references a role not provided by any
/// Pipeline: stays in `q` forever" (spec §8 boundary property) — `cancel`
/// must still work against it.
#[test]
fn cancel_of_a_queued_unmatched_job_succeeds_immediately() {
    let dep = Deployment::new();
    dep.init();
    dep.start();

    let payload = write_payload(&dep, UNMATCHABLE_PAYLOAD);
    let submitted = dep.ketchup().args(&["submit"]).arg(payload.display().to_string()).passes();
    let id = submitted.stdout().trim().rsplit(' ').next().unwrap().to_string();

    dep.ketchup().arg("cancel").arg(&id).passes();
    let status = dep.ketchup().arg("status").arg(&id).passes().stdout();
    assert!(status.contains("\"cd\""));
}

#[test]
fn search_filters_by_jobname_substring() {
    let dep = Deployment::new();
    dep.init();
    dep.start();

    let payload = write_payload(&dep, UNMATCHABLE_PAYLOAD);
    dep.ketchup().args(&["submit"]).arg(payload.display().to_string()).args(&["--jobname", "alpha-run"]).passes();
    dep.ketchup().args(&["submit"]).arg(payload.display().to_string()).args(&["--jobname", "beta-run"]).passes();

    let found = dep.ketchup().args(&["search", "alpha"]).passes().stdout();
    assert!(found.contains("alpha-run"));
    assert!(!found.contains("beta-run"));
}

#[test]
fn cancel_requires_at_least_one_jobid() {
    let dep = Deployment::new();
    dep.init();
    dep.start();
    dep.ketchup().args(&["cancel"]).fails();
}
