// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Driver supervisor: a background tokio task that keeps exactly one
//! `tomato-driver` process alive per distinct driver name required by the
//! configured device set. Grounded on
//! `original_source/src/tomato/daemon/driver.py::manager`.
//!
//! Runs inside the daemon process and shares `SharedState` directly rather
//! than dialing the daemon's own control socket — the original's
//! request/reply contact with the daemon is collapsed into a direct mutex
//! acquisition since supervisor and daemon are the same process here.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use tomato_core::process::pid_alive;
use tomato_core::Driver;

use crate::state::SharedState;

const BASE_TICK: Duration = Duration::from_secs(2);
const MAX_TICK: Duration = Duration::from_secs(10);
const SPAWN_GRACE: Duration = Duration::from_secs(10);

pub struct SupervisorConfig {
    pub daemon_port: u16,
    pub driver_bin: PathBuf,
}

enum Action {
    None,
    SpawnFresh,
    Respawn(&'static str),
}

pub async fn run(state: SharedState, shutdown: CancellationToken, config: SupervisorConfig) {
    let mut tick = BASE_TICK;
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                stop_all_drivers(&state).await;
                return;
            }
            _ = tokio::time::sleep(tick) => {}
        }

        let required = required_driver_names(&state);
        if required.is_empty() {
            tick = (tick * 2).min(MAX_TICK);
            continue;
        }
        tick = BASE_TICK;

        for name in required {
            reconcile_one(&state, &name, &config).await;
        }
    }
}

fn required_driver_names(state: &SharedState) -> BTreeSet<String> {
    state.lock().devs.values().map(|d| d.driver.clone()).collect()
}

async fn reconcile_one(state: &SharedState, name: &str, config: &SupervisorConfig) {
    let action = {
        let snapshot = state.lock();
        match snapshot.drvs.get(name) {
            None => Action::SpawnFresh,
            Some(drv) => classify(drv),
        }
    };

    match action {
        Action::None => {}
        Action::SpawnFresh => spawn_and_record(state, name, config, None).await,
        Action::Respawn(reason) => spawn_and_record(state, name, config, Some(reason)).await,
    }
}

fn classify(drv: &Driver) -> Action {
    if let Some(pid) = drv.pid {
        if pid_alive(pid) {
            Action::None
        } else {
            Action::Respawn("crashed")
        }
    } else if let Some(spawned_at) = drv.spawned_at {
        let age = Utc::now().signed_duration_since(spawned_at);
        if age.to_std().unwrap_or(Duration::ZERO) > SPAWN_GRACE {
            Action::Respawn("late")
        } else {
            Action::None
        }
    } else {
        Action::SpawnFresh
    }
}

async fn spawn_and_record(state: &SharedState, name: &str, config: &SupervisorConfig, reason: Option<&str>) {
    if let Some(reason) = reason {
        warn!(driver = name, reason, "respawning driver");
    } else {
        info!(driver = name, "spawning driver");
    }

    if let Err(e) = spawn_driver(&config.driver_bin, name, config.daemon_port) {
        warn!(driver = name, error = %e, "failed to spawn driver process");
        return;
    }

    let mut snapshot = state.lock();
    let drv = snapshot.drvs.entry(name.to_string()).or_insert_with(|| Driver::new(name));
    drv.pid = None;
    drv.port = None;
    drv.spawned_at = Some(Utc::now());
}

fn spawn_driver(bin: &Path, name: &str, daemon_port: u16) -> std::io::Result<tokio::process::Child> {
    use std::os::unix::process::CommandExt;

    tokio::process::Command::new(bin)
        .arg("--name")
        .arg(name)
        .arg("--port")
        .arg("0")
        .arg("--daemon-port")
        .arg(daemon_port.to_string())
        .process_group(0)
        .kill_on_drop(false)
        .spawn()
}

async fn stop_all_drivers(state: &SharedState) {
    let ports: Vec<(String, u16)> = {
        let snapshot = state.lock();
        snapshot.drvs.iter().filter_map(|(name, d)| d.port.map(|p| (name.clone(), p))).collect()
    };
    for (name, port) in ports {
        let req = tomato_wire::Request::Stop;
        match tomato_wire::call(port, &req, Duration::from_secs(2), 1).await {
            Ok(reply) if reply.success => info!(driver = name, "driver stopped"),
            Ok(reply) => warn!(driver = name, msg = reply.msg, "driver refused stop"),
            Err(e) => warn!(driver = name, error = %e, "failed to contact driver for stop"),
        }
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
