// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The daemon's control socket: a loopback TCP accept loop that decodes one
//! framed [`Request`] per connection, dispatches it to `commands`, and
//! writes back one framed [`Reply`] (spec §4.1 "Single-threaded request/
//! reply loop over a bound loopback socket"). Each connection is handled on
//! its own tokio task so a slow/stalled client never blocks another's
//! request, but all command handlers themselves serialize through the
//! state mutex, matching spec §5's single command-applier invariant.

use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tomato_wire::{read_request, write_response, ProtocolError, Reply, Request};

use crate::commands;
use crate::state::SharedState;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Listener {
    tcp: TcpListener,
    state: SharedState,
    shutdown: CancellationToken,
}

impl Listener {
    pub fn new(tcp: TcpListener, state: SharedState, shutdown: CancellationToken) -> Self {
        Self { tcp, state, shutdown }
    }

    pub async fn run(self) {
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("listener shutting down");
                    return;
                }
                accepted = self.tcp.accept() => {
                    match accepted {
                        Ok((stream, addr)) => {
                            debug!(%addr, "accepted control connection");
                            let state = self.state.clone();
                            let shutdown = self.shutdown.clone();
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, &state, &shutdown).await {
                                    log_connection_error(e);
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
    state: &SharedState,
    shutdown: &CancellationToken,
) -> Result<(), ProtocolError> {
    let request = read_request(&mut stream, REQUEST_TIMEOUT).await?;
    let reply = dispatch(state, shutdown, request);
    write_response(&mut stream, &reply, REQUEST_TIMEOUT).await
}

fn dispatch(state: &SharedState, shutdown: &CancellationToken, request: Request) -> Reply {
    match request {
        Request::Status { with_data } => commands::status(state, with_data),
        Request::Stop => {
            let reply = commands::stop(state);
            if reply.success {
                shutdown.cancel();
            }
            reply
        }
        Request::Setup { settings, pipelines, devices } => commands::setup(state, settings, pipelines, devices),
        Request::Pipeline { pipeline, params } => commands::pipeline(state, &pipeline, params),
        Request::Job { id, params } => commands::job(state, id, params),
        Request::Driver { name, params } => commands::driver(state, &name, params),
    }
}

fn log_connection_error(e: ProtocolError) {
    match e {
        ProtocolError::ConnectionClosed => debug!("client disconnected before sending a request"),
        ProtocolError::Timeout => warn!("control connection timed out"),
        other => warn!(error = %other, "control connection error"),
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
