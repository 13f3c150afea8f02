// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon state persistence (spec §4.1.2).
//!
//! On graceful `stop`, the daemon serialises its live pipelines/devices/jobs
//! to `${datadir}/tomato_state_<port>.toml`. On startup, if that file
//! exists it is loaded and the daemon begins in `Bootstrap` status with
//! `jobs`/`nextjob` restored verbatim; `drvs` is never persisted (drivers
//! are always respawned fresh). The file carries an explicit schema tag so
//! a file from an older build is detected and rejected rather than
//! silently misread.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tomato_core::{Device, Job, JobId, Pipeline};

use crate::error::StorageError;

/// Bump whenever the persisted shape changes in a way that would make an
/// older file unsafe to load verbatim.
pub const SCHEMA_VERSION: u32 = 1;

/// The persisted subset of `DaemonSnapshot`. Jobs are stored as a `Vec`
/// rather than a map keyed by `JobId`, since TOML tables require string
/// keys and a numeric newtype key would force an awkward `to_string`
/// round-trip at every save/load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    pub schema_version: u32,
    pub pips: BTreeMap<String, Pipeline>,
    pub devs: BTreeMap<String, Device>,
    pub jobs: Vec<Job>,
    pub nextjob: JobId,
}

impl StateFile {
    pub fn new(
        pips: BTreeMap<String, Pipeline>,
        devs: BTreeMap<String, Device>,
        jobs: Vec<Job>,
        nextjob: JobId,
    ) -> Self {
        Self { schema_version: SCHEMA_VERSION, pips, devs, jobs, nextjob }
    }
}

pub fn state_file_path(datadir: &Path, port: u16) -> PathBuf {
    datadir.join(format!("tomato_state_{port}.toml"))
}

pub fn save_state(datadir: &Path, port: u16, state: &StateFile) -> Result<(), StorageError> {
    std::fs::create_dir_all(datadir).map_err(|source| StorageError::Io { path: datadir.to_path_buf(), source })?;
    let path = state_file_path(datadir, port);
    let body = toml::to_string_pretty(state)?;
    std::fs::write(&path, body).map_err(|source| StorageError::Io { path, source })
}

/// Returns `Ok(None)` if no state file exists yet (fresh datadir).
pub fn load_state(datadir: &Path, port: u16) -> Result<Option<StateFile>, StorageError> {
    let path = state_file_path(datadir, port);
    let body = match std::fs::read_to_string(&path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(StorageError::Io { path, source }),
    };
    let state: StateFile =
        toml::from_str(&body).map_err(|source| StorageError::Toml { path: path.clone(), source })?;
    if state.schema_version != SCHEMA_VERSION {
        return Err(StorageError::SchemaMismatch(path, state.schema_version, SCHEMA_VERSION));
    }
    Ok(Some(state))
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
