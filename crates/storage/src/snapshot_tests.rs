// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tomato_core::JobBuilder;

#[test]
fn round_trips_through_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut jobs = Vec::new();
    let mut job = JobBuilder::default().build();
    job.id = Some(JobId(1));
    jobs.push(job);

    let state = StateFile::new(BTreeMap::new(), BTreeMap::new(), jobs, JobId(2));
    save_state(dir.path(), 1234, &state).expect("save");

    let loaded = load_state(dir.path(), 1234).expect("load").expect("present");
    assert_eq!(loaded.nextjob, JobId(2));
    assert_eq!(loaded.jobs.len(), 1);
    assert_eq!(loaded.jobs[0].id, Some(JobId(1)));
}

#[test]
fn missing_file_is_none_not_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let loaded = load_state(dir.path(), 9999).expect("load");
    assert!(loaded.is_none());
}

#[test]
fn rejects_mismatched_schema_version() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = state_file_path(dir.path(), 42);
    std::fs::write(&path, "schema_version = 999\npips = {}\ndevs = {}\njobs = []\nnextjob = 1\n")
        .expect("write");
    let err = load_state(dir.path(), 42).expect_err("should reject");
    assert!(matches!(err, StorageError::SchemaMismatch(_, 999, SCHEMA_VERSION)));
}
