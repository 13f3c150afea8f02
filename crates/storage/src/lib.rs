// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tomato-storage: on-disk persistence for the daemon snapshot, the
//! `settings.toml`/devices-file configuration, and per-job data files.
//!
//! Grounded on `original_source/src/tomato/tomato/__init__.py` (settings
//! loading, device-file loading, pipeline wildcard expansion) and
//! `original_source/src/tomato/daemon/job.py` (job directory layout).

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod error;
pub mod jobfile;
pub mod snapshot;

pub use config::{load_devices_file, load_settings, DevicesFile, Settings};
pub use error::StorageError;
pub use jobfile::{data_file_path, job_dir, job_log_path, jobdata_path, read_jobdata, write_jobdata, JobData, JobRef};
pub use snapshot::{load_state, save_state, state_file_path, StateFile};
