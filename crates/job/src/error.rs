// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Leaf error type for one `tomato-job` process.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Storage(#[from] tomato_storage::StorageError),

    #[error(transparent)]
    Protocol(#[from] tomato_wire::ProtocolError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("method references role {0:?}, which this pipeline does not have")]
    UnresolvedRole(String),

    #[error("device {0:?} not found in daemon snapshot")]
    UnknownDevice(String),

    #[error("driver {0:?} has no registered port")]
    DriverNotReady(String),

    #[error("driver refused task_start for role {role:?}: {msg}")]
    TaskStart { role: String, msg: String },
}
