// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The daemon's shared in-memory state: a single mutex-guarded
//! `DaemonSnapshot`, the one source of truth every handler, the driver
//! supervisor and the job manager read and mutate (spec §4.1/§5 "the
//! daemon's state mutex is the single serialization point").

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tomato_core::DaemonSnapshot;
use tomato_storage::StateFile;

use crate::error::DaemonError;

pub type SharedState = Arc<Mutex<DaemonSnapshot>>;

/// Build the initial snapshot for a fresh daemon start: restore `pips`,
/// `devs`, `jobs` and `nextjob` from a previous graceful shutdown's state
/// file if one exists, otherwise start empty (spec §4.1.2). `drvs` is never
/// restored — driver records are only ever populated by a live supervisor.
pub fn bootstrap(port: u16, verbosity: u8, datadir: &Path) -> Result<DaemonSnapshot, DaemonError> {
    let mut snapshot = DaemonSnapshot::bootstrap(port, verbosity);
    if let Some(file) = tomato_storage::load_state(datadir, port)? {
        snapshot.pips = file.pips;
        snapshot.devs = file.devs;
        snapshot.nextjob = file.nextjob;
        snapshot.jobs = file.jobs.into_iter().filter_map(|job| job.id.map(|id| (id, job))).collect();
    }
    Ok(snapshot)
}

/// Serialize the live snapshot to `${datadir}/tomato_state_<port>.toml` on
/// graceful shutdown.
pub fn persist(datadir: &Path, snapshot: &DaemonSnapshot) -> Result<(), DaemonError> {
    let jobs: Vec<_> = snapshot.jobs.values().cloned().collect();
    let state = StateFile::new(snapshot.pips.clone(), snapshot.devs.clone(), jobs, snapshot.nextjob);
    tomato_storage::save_state(datadir, snapshot.port, &state)?;
    Ok(())
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
