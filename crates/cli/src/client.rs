// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin wrapper over [`tomato_wire::call`] that turns a transport failure
//! or an unsuccessful [`Reply`] into an [`ExitError`] naming the endpoint
//! (spec §5 "after exhaustion, return a failure reply describing the
//! offline endpoint").

use std::time::Duration;

use serde::Serialize;
use tomato_wire::Reply;

use crate::ExitError;

const MAX_ATTEMPTS: u32 = 3;

/// Send one request to `127.0.0.1:<port>` and return its reply, failing
/// loudly (not silently) if the daemon/driver rejected the command.
pub async fn call<Req: Serialize>(port: u16, req: &Req, timeout: Duration) -> Result<Reply, ExitError> {
    let reply = tomato_wire::call(port, req, timeout, MAX_ATTEMPTS)
        .await
        .map_err(|e| ExitError::new(2, format!("could not reach 127.0.0.1:{port}: {e}")))?;
    if !reply.success {
        return Err(ExitError::new(1, reply.msg));
    }
    Ok(reply)
}

/// Like [`call`] but does not fail on an unsuccessful reply — used by
/// callers (`tomato status`, `ketchup status`) that want to print a
/// failure reply rather than abort.
pub async fn call_lenient<Req: Serialize>(port: u16, req: &Req, timeout: Duration) -> Result<Reply, ExitError> {
    tomato_wire::call(port, req, timeout, MAX_ATTEMPTS)
        .await
        .map_err(|e| ExitError::new(2, format!("could not reach 127.0.0.1:{port}: {e}")))
}
