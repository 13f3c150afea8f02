// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tomato-daemon: the central supervisor that owns cluster state (settings,
//! devices, pipelines, drivers, jobs) and coordinates the driver supervisor
//! and job manager background tasks (spec §4.1).

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod commands;
pub mod error;
pub mod job_manager;
pub mod listener;
pub mod state;
pub mod supervisor;

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub use error::DaemonError;
pub use state::SharedState;

/// Fixed configuration for one daemon run, resolved by the CLI/`main` from
/// flags, `settings.toml` and environment (spec §6 "Config files"); the
/// daemon crate itself never reads a config file directly.
pub struct DaemonConfig {
    pub port: u16,
    pub verbosity: u8,
    pub datadir: PathBuf,
    pub jobs_storage: PathBuf,
    pub driver_bin: PathBuf,
    pub job_bin: PathBuf,
}

/// Start listening, spawn the background tasks, and run until a `stop`
/// command (or external cancellation) is observed, then persist state and
/// return. This is the single entry point `main.rs` calls.
pub async fn run(config: DaemonConfig) -> Result<(), DaemonError> {
    let snapshot = state::bootstrap(config.port, config.verbosity, &config.datadir)?;
    let state: SharedState = Arc::new(Mutex::new(snapshot));

    let tcp = TcpListener::bind(("127.0.0.1", config.port))
        .await
        .map_err(|source| DaemonError::Io { path: PathBuf::from(format!("127.0.0.1:{}", config.port)), source })?;
    let bound_port = tcp.local_addr().map(|a| a.port()).unwrap_or(config.port);
    state.lock().port = bound_port;

    let shutdown = CancellationToken::new();

    let supervisor_handle = tokio::spawn(supervisor::run(
        state.clone(),
        shutdown.clone(),
        supervisor::SupervisorConfig { daemon_port: bound_port, driver_bin: config.driver_bin.clone() },
    ));
    let job_manager_handle = tokio::spawn(job_manager::run(
        state.clone(),
        shutdown.clone(),
        job_manager::JobManagerConfig {
            jobs_storage: config.jobs_storage.clone(),
            job_bin: config.job_bin.clone(),
            daemon_port: bound_port,
        },
    ));

    let listener = listener::Listener::new(tcp, state.clone(), shutdown.clone());
    info!(port = bound_port, "daemon listening");
    listener.run().await;

    // `listener.run()` only returns once `shutdown` has been cancelled (by a
    // successful `stop` command); wait for the background tasks to observe
    // it and drain before persisting, matching spec §4.1.2 "after background
    // tasks have joined".
    let _ = supervisor_handle.await;
    let _ = job_manager_handle.await;

    state::persist(&config.datadir, &state.lock())?;
    info!("daemon stopped");
    Ok(())
}

#[cfg(test)]
mod lib_tests;
