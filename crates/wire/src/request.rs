// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Requests accepted by the daemon's and each driver's control socket.
//!
//! Grounded on the `cmd` dictionaries sent by
//! `original_source/src/tomato/tomato/__init__.py` and
//! `original_source/src/tomato/daemon/driver.py`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tomato_core::JobId;

/// Commands accepted by the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Request {
    /// Returns the daemon's status; if `with_data`, a full state snapshot.
    Status { with_data: bool },
    /// Requests a graceful shutdown.
    Stop,
    /// Installs or merges settings/pipelines/devices.
    Setup { settings: Value, pipelines: Vec<Value>, devices: Vec<Value> },
    /// Mutates a subset of allowed fields on one pipeline, or reads it if
    /// `params` is empty.
    Pipeline { pipeline: String, params: Value },
    /// Creates a job (when `id` is `None`) or mutates an existing one.
    Job { id: Option<JobId>, params: Value },
    /// Updates or registers a driver record.
    Driver { name: String, params: Value },
}

/// Commands accepted by a driver process's control socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum ComponentRequest {
    Status,
    Stop,
    Settings { settings: Value },
    DevRegister { address: String, channel: u32, role: String },
    CmpTeardown { address: String, channel: u32 },
    CmpReset { address: String, channel: u32 },
    CmpSetAttr { address: String, channel: u32, attr: String, val: Value },
    CmpGetAttr { address: String, channel: u32, attr: String },
    CmpStatus { address: String, channel: u32 },
    CmpAttrs { address: String, channel: u32 },
    CmpCapabilities { address: String, channel: u32 },
    CmpConstants { address: String, channel: u32 },
    CmpLastData { address: String, channel: u32 },
    CmpMeasure { address: String, channel: u32 },
    TaskStart { address: String, channel: u32, task: Value },
    TaskStatus { address: String, channel: u32 },
    TaskStop { address: String, channel: u32 },
    TaskData { address: String, channel: u32 },
}
