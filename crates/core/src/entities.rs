// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Driver, Device, Component, Pipeline and the daemon snapshot — the
//! authoritative records the daemon owns (spec §3 DATA MODEL).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Map;

use crate::job::{Job, JobId};

/// A driver process, one per distinct driver name required by the device
/// set. `port`/`pid` are `None` until the driver supervisor spawns it and
/// the process self-registers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub name: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub pid: Option<u32>,
    #[serde(default)]
    pub spawned_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub connected_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub settings: Map<String, serde_json::Value>,
}

impl Driver {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            port: None,
            pid: None,
            spawned_at: None,
            connected_at: None,
            settings: Map::new(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.pid.map(crate::process::pid_alive).unwrap_or(false)
    }
}

/// A configured physical device: one driver name, an address, a set of
/// channels it exposes, and the capabilities (techniques) it supports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    pub driver: String,
    pub address: String,
    pub channels: Vec<u32>,
    pub capabilities: Vec<String>,
    #[serde(default = "default_pollrate_ms")]
    pub pollrate_ms: u64,
}

fn default_pollrate_ms() -> u64 {
    1000
}

/// One addressable channel of one device, materialised at reload via
/// per-device channel expansion and registered in its driver's devmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub address: String,
    pub channel: u32,
    /// Symbolic role name by which a payload's method refers to this slot.
    pub role: String,
}

/// A named fixed composition of device components reserved for one sample
/// at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub name: String,
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub jobid: Option<JobId>,
    #[serde(default)]
    pub sampleid: Option<String>,
    #[serde(default)]
    pub devs: IndexMap<String, Component>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ready: false, jobid: None, sampleid: None, devs: IndexMap::new() }
    }

    pub fn is_running(&self) -> bool {
        self.jobid.is_some()
    }

    /// Roles this pipeline can serve.
    pub fn roles(&self) -> std::collections::BTreeSet<&str> {
        self.devs.keys().map(String::as_str).collect()
    }
}

/// Daemon process lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DaemonStatus {
    #[serde(rename = "bootstrap")]
    Bootstrap,
    #[serde(rename = "running")]
    Running,
    #[serde(rename = "stop")]
    Stop,
}

crate::simple_display! {
    DaemonStatus {
        Bootstrap => "bootstrap",
        Running => "running",
        Stop => "stop",
    }
}

/// A deep copy of daemon state returned to callers so they can operate
/// without holding the daemon's lock (the "snapshot" of the GLOSSARY).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonSnapshot {
    pub status: DaemonStatus,
    pub port: u16,
    pub verbosity: u8,
    pub pips: BTreeMap<String, Pipeline>,
    pub devs: BTreeMap<String, Device>,
    pub drvs: BTreeMap<String, Driver>,
    pub jobs: BTreeMap<JobId, Job>,
    pub nextjob: JobId,
}

impl DaemonSnapshot {
    pub fn bootstrap(port: u16, verbosity: u8) -> Self {
        Self {
            status: DaemonStatus::Bootstrap,
            port,
            verbosity,
            pips: BTreeMap::new(),
            devs: BTreeMap::new(),
            drvs: BTreeMap::new(),
            jobs: BTreeMap::new(),
            nextjob: JobId(1),
        }
    }
}
