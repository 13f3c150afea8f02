// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A single-shot request/reply call over loopback TCP: open a connection,
//! write one framed request, read one framed [`Reply`], close.
//!
//! This mirrors the original's per-call ZMQ REQ socket usage (each client
//! call opens, sends exactly one message, and waits for exactly one reply)
//! rather than holding a long-lived multiplexed connection, since the
//! protocol never pipelines requests on one socket (spec §5 "client→daemon
//! request/reply carries per-call timeouts").

use std::time::Duration;

use serde::Serialize;
use tokio::net::TcpStream;

use crate::reply::Reply;
use crate::wire::{encode, read_message, write_message, ProtocolError};

/// Send one framed request to `127.0.0.1:<port>` and return its reply.
/// Retries on transient connect failure with exponential backoff up to
/// `max_attempts`, surfacing the last error if every attempt fails (spec
/// §5 "retried with backoff up to a cap; then surfaced as a failure reply
/// naming the endpoint").
pub async fn call<Req: Serialize>(
    port: u16,
    req: &Req,
    timeout: Duration,
    max_attempts: u32,
) -> Result<Reply, ProtocolError> {
    let mut attempt = 0;
    let mut backoff = Duration::from_millis(50);
    loop {
        attempt += 1;
        match call_once(port, req, timeout).await {
            Ok(reply) => return Ok(reply),
            Err(e) if attempt < max_attempts => {
                tokio::time::sleep(backoff).await;
                backoff *= 2;
                tracing::debug!(attempt, port, error = %e, "retrying control call");
            }
            Err(e) => return Err(e),
        }
    }
}

async fn call_once<Req: Serialize>(port: u16, req: &Req, timeout: Duration) -> Result<Reply, ProtocolError> {
    let connect = TcpStream::connect(("127.0.0.1", port));
    let mut stream = tokio::time::timeout(timeout, connect)
        .await
        .map_err(|_| ProtocolError::Timeout)??;

    let body = encode(req)?;
    tokio::time::timeout(timeout, write_message(&mut stream, &body))
        .await
        .map_err(|_| ProtocolError::Timeout)??;

    let reply_body = tokio::time::timeout(timeout, read_message(&mut stream))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    crate::wire::decode(&reply_body)
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
