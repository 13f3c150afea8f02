// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job on-disk layout (spec §6 "On-disk job layout"), grounded on
//! `original_source/src/tomato/daemon/job.py::action_queued_jobs`'s
//! `jobargs` shape: `{pipeline, payload, job: {id, path}}`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tomato_core::{JobId, JobPayload, Pipeline};

use crate::error::StorageError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRef {
    pub id: JobId,
    pub path: PathBuf,
}

/// The full contents of `jobdata.json`, the job worker's sole startup input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobData {
    pub pipeline: Pipeline,
    pub payload: JobPayload,
    pub job: JobRef,
}

pub fn job_dir(storage: &Path, id: JobId) -> PathBuf {
    storage.join(id.to_string())
}

pub fn jobdata_path(storage: &Path, id: JobId) -> PathBuf {
    job_dir(storage, id).join("jobdata.json")
}

pub fn data_file_path(storage: &Path, id: JobId, role: &str) -> PathBuf {
    job_dir(storage, id).join("data").join(format!("{role}.json"))
}

pub fn job_log_path(storage: &Path, id: JobId) -> PathBuf {
    job_dir(storage, id).join(format!("job-{id}.log"))
}

pub fn write_jobdata(storage: &Path, data: &JobData) -> Result<PathBuf, StorageError> {
    let dir = job_dir(storage, data.job.id);
    std::fs::create_dir_all(&dir).map_err(|source| StorageError::Io { path: dir.clone(), source })?;
    let path = jobdata_path(storage, data.job.id);
    let body = serde_json::to_vec_pretty(data)?;
    std::fs::write(&path, body).map_err(|source| StorageError::Io { path, source })?;
    Ok(path)
}

pub fn read_jobdata(path: &Path) -> Result<JobData, StorageError> {
    let body = std::fs::read(path).map_err(|source| StorageError::Io { path: path.to_path_buf(), source })?;
    Ok(serde_json::from_slice(&body)?)
}

#[cfg(test)]
#[path = "jobfile_tests.rs"]
mod tests;
