// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A driver process's own control socket: one loopback TCP accept loop
//! decoding [`ComponentRequest`]s and dispatching them against the
//! [`DevMap`] (spec §4.4's command surface). Mirrors `daemon::listener` in
//! shape, since both are the same "framed request/reply over a bound
//! loopback socket" idiom from `tomato_wire`.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tomato_core::{Attr, Task};
use tomato_wire::{decode, read_message, write_response, ComponentRequest, ProtocolError, Reply};

use crate::component::WorkerState;
use crate::devmap::DevMap;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Listener {
    tcp: TcpListener,
    devmap: Arc<DevMap>,
    shutdown: CancellationToken,
}

impl Listener {
    pub fn new(tcp: TcpListener, devmap: Arc<DevMap>, shutdown: CancellationToken) -> Self {
        Self { tcp, devmap, shutdown }
    }

    pub async fn run(self) {
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("driver listener shutting down");
                    return;
                }
                accepted = self.tcp.accept() => {
                    match accepted {
                        Ok((stream, addr)) => {
                            debug!(%addr, "accepted driver control connection");
                            let devmap = self.devmap.clone();
                            let shutdown = self.shutdown.clone();
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, &devmap, &shutdown).await {
                                    warn!(error = %e, "driver control connection error");
                                }
                            });
                        }
                        Err(e) => warn!(error = %e, "accept failed"),
                    }
                }
            }
        }
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    devmap: &DevMap,
    shutdown: &CancellationToken,
) -> Result<(), ProtocolError> {
    let body = tokio::time::timeout(REQUEST_TIMEOUT, read_message(&mut stream))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    let request: ComponentRequest = decode(&body)?;
    let reply = dispatch(devmap, shutdown, request);
    write_response(&mut stream, &reply, REQUEST_TIMEOUT).await
}

fn dispatch(devmap: &DevMap, shutdown: &CancellationToken, request: ComponentRequest) -> Reply {
    match request {
        ComponentRequest::Status => Reply::ok("running"),
        ComponentRequest::Stop => {
            shutdown.cancel();
            Reply::ok("stopping")
        }
        ComponentRequest::Settings { settings } => Reply::ok_with("settings acknowledged", settings),
        ComponentRequest::DevRegister { address, channel, role } => {
            devmap.register(address.clone(), channel);
            Reply::ok_with("registered", json!({ "address": address, "channel": channel, "role": role }))
        }
        ComponentRequest::CmpAttrs { address, channel } => cmp_attrs(devmap, &address, channel),
        ComponentRequest::CmpCapabilities { address, channel } => cmp_capabilities(devmap, &address, channel),
        ComponentRequest::CmpConstants { address, channel } => cmp_constants(devmap, &address, channel),
        ComponentRequest::CmpStatus { address, channel } => cmp_status(devmap, &address, channel),
        ComponentRequest::CmpLastData { address, channel } => cmp_last_data(devmap, &address, channel),
        ComponentRequest::CmpGetAttr { address, channel, attr } => cmp_get_attr(devmap, &address, channel, &attr),
        ComponentRequest::CmpSetAttr { address, channel, attr, val } => cmp_set_attr(devmap, &address, channel, &attr, val),
        ComponentRequest::CmpMeasure { address, channel } => cmp_measure(devmap, &address, channel),
        ComponentRequest::CmpTeardown { address, channel } => match devmap.teardown(&address, channel) {
            Ok(()) => Reply::ok("torn down"),
            Err(e) => Reply::err(e.to_string()),
        },
        ComponentRequest::CmpReset { address, channel } => match devmap.reset(&address, channel) {
            Ok(()) => Reply::ok("reset"),
            Err(e) => Reply::err(e.to_string()),
        },
        ComponentRequest::TaskStart { address, channel, task } => task_start(devmap, &address, channel, task),
        ComponentRequest::TaskStatus { address, channel } => task_status(devmap, &address, channel),
        ComponentRequest::TaskStop { address, channel } => task_stop(devmap, &address, channel),
        ComponentRequest::TaskData { address, channel } => task_data(devmap, &address, channel),
    }
}

fn cmp_attrs(devmap: &DevMap, address: &str, channel: u32) -> Reply {
    match devmap.with_component(address, channel, |w| w.attrs().clone()) {
        Ok(attrs) => Reply::ok_with("attrs", attrs.values().cloned().collect::<Vec<Attr>>()),
        Err(e) => Reply::err(e.to_string()),
    }
}

fn cmp_capabilities(devmap: &DevMap, address: &str, channel: u32) -> Reply {
    match devmap.with_component(address, channel, |w| w.techniques().keys().cloned().collect::<Vec<String>>()) {
        Ok(caps) => Reply::ok_with("capabilities", caps),
        Err(e) => Reply::err(e.to_string()),
    }
}

fn cmp_constants(devmap: &DevMap, address: &str, channel: u32) -> Reply {
    match devmap.with_component(address, channel, |w| w.constants().clone()) {
        Ok(constants) => Reply::ok_with("constants", constants),
        Err(e) => Reply::err(e.to_string()),
    }
}

fn cmp_status(devmap: &DevMap, address: &str, channel: u32) -> Reply {
    match devmap.with_component(address, channel, |w| w.status()) {
        Ok(status) => Reply::ok_with("status", status),
        Err(e) => Reply::err(e.to_string()),
    }
}

fn cmp_last_data(devmap: &DevMap, address: &str, channel: u32) -> Reply {
    match devmap.with_component(address, channel, |w| w.last_data()) {
        Ok(Some(point)) => Reply::ok_with("last data", json!({ "uts": point.uts, "val": point.value })),
        Ok(None) => Reply::ok("no data yet"),
        Err(e) => Reply::err(e.to_string()),
    }
}

fn cmp_get_attr(devmap: &DevMap, address: &str, channel: u32, attr: &str) -> Reply {
    match devmap.with_component(address, channel, |w| w.get_attr(attr)) {
        Ok(Ok(val)) => Reply::ok_with("attr", val),
        Ok(Err(e)) => Reply::err(e.to_string()),
        Err(e) => Reply::err(e.to_string()),
    }
}

fn cmp_set_attr(devmap: &DevMap, address: &str, channel: u32, attr: &str, val: Value) -> Reply {
    match devmap.with_component(address, channel, |w| w.set_attr(attr, &val)) {
        Ok(Ok(coerced)) => Reply::ok_with("attr set", coerced),
        Ok(Err(e)) => Reply::err(e.to_string()),
        Err(e) => Reply::err(e.to_string()),
    }
}

fn cmp_measure(devmap: &DevMap, address: &str, channel: u32) -> Reply {
    let technique = match devmap.with_component(address, channel, |w| w.techniques().keys().next().cloned()) {
        Ok(Some(t)) => t,
        Ok(None) => return Reply::err("driver declares no techniques to measure"),
        Err(e) => return Reply::err(e.to_string()),
    };
    match devmap.with_component(address, channel, |w| w.measure(technique)) {
        Ok(Ok(())) => Reply::ok("measurement requested"),
        Ok(Err(e)) => Reply::err(e.to_string()),
        Err(e) => Reply::err(e.to_string()),
    }
}

fn task_start(devmap: &DevMap, address: &str, channel: u32, task: Value) -> Reply {
    let task: Task = match serde_json::from_value(task) {
        Ok(t) => t,
        Err(e) => return Reply::err(format!("malformed task: {e}")),
    };
    let outcome = devmap.with_component(address, channel, |w| w.start_task(task));
    match outcome {
        Ok(Ok(())) => Reply::ok("task started"),
        Ok(Err(e)) => Reply::err(e.to_string()),
        Err(e) => Reply::err(e.to_string()),
    }
}

fn task_status(devmap: &DevMap, address: &str, channel: u32) -> Reply {
    let outcome = devmap.with_component(address, channel, |w| (w.state(), w.started()));
    match outcome {
        Ok((state, started)) => {
            let state = match state {
                WorkerState::Idle => "idle",
                WorkerState::Preparing => "preparing",
                WorkerState::Running => "running",
                WorkerState::Done => "done",
            };
            Reply::ok_with("task status", json!({ "state": state, "started": started }))
        }
        Err(e) => Reply::err(e.to_string()),
    }
}

fn task_stop(devmap: &DevMap, address: &str, channel: u32) -> Reply {
    match devmap.with_component(address, channel, |w| w.stop_task()) {
        Ok(Ok(())) => Reply::ok("task stop requested"),
        Ok(Err(e)) => Reply::err(e.to_string()),
        Err(e) => Reply::err(e.to_string()),
    }
}

fn task_data(devmap: &DevMap, address: &str, channel: u32) -> Reply {
    match devmap.with_component(address, channel, |w| w.drain_data()) {
        Ok(points) => {
            let data: Vec<Value> = points.into_iter().map(|p| json!({ "uts": p.uts, "val": p.value })).collect();
            Reply::ok_with("task data", data)
        }
        Err(e) => Reply::err(e.to_string()),
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
