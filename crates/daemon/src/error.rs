// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Leaf error type for daemon-internal failures. Control-protocol errors
//! never propagate as panics — a handler returning `Err(DaemonError)` is
//! turned into a `Reply::err` by its caller, never a dropped connection.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error(transparent)]
    Core(#[from] tomato_core::CoreError),

    #[error(transparent)]
    Storage(#[from] tomato_storage::StorageError),

    #[error(transparent)]
    Protocol(#[from] tomato_wire::ProtocolError),

    #[error("io error at {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown driver {0:?}")]
    UnknownDriver(String),

    #[error("failed to spawn {bin}: {source}")]
    Spawn { bin: String, source: std::io::Error },
}
