// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tomato-driver: one process per driver name, owning a devmap of
//! component workers and serving a control socket for task start/status/
//! data and component introspection (spec §4.4).

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod component;
pub mod counter;
pub mod devmap;
pub mod error;
pub mod listener;
pub mod registry;

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub use error::DriverError;

/// Start this driver process's control socket, register with the daemon,
/// and serve until stopped. Returns the bound port (mostly useful in
/// tests; `main` doesn't need it once it has registered).
pub async fn run(name: &str, port: u16, daemon_port: u16) -> Result<(), DriverError> {
    let kind = registry::lookup(name)?;
    let devmap = Arc::new(devmap::DevMap::new(kind));

    let tcp = TcpListener::bind(("127.0.0.1", port)).await?;
    let port = tcp.local_addr()?.port();

    register_with_daemon(name, daemon_port, port).await;

    let shutdown = CancellationToken::new();
    let listener = listener::Listener::new(tcp, devmap, shutdown.clone());
    info!(driver = name, port, "driver listening");
    listener.run().await;
    Ok(())
}

async fn register_with_daemon(name: &str, daemon_port: u16, port: u16) {
    let req = tomato_wire::Request::Driver {
        name: name.to_string(),
        params: serde_json::json!({
            "port": port,
            "pid": std::process::id(),
            "connected_at": chrono::Utc::now(),
        }),
    };
    match tomato_wire::call(daemon_port, &req, Duration::from_secs(5), 5).await {
        Ok(reply) if reply.success => info!(driver = name, "registered with daemon"),
        Ok(reply) => tracing::warn!(driver = name, msg = reply.msg, "daemon rejected driver registration"),
        Err(e) => tracing::warn!(driver = name, error = %e, "failed to register with daemon"),
    }
}
