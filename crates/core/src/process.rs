// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pid-liveness check shared by the driver supervisor and job manager
//! reapers (spec §4.2/§4.3). POSIX-only, matching `psutil.pid_exists` in
//! the original source without pulling in a process-tree-walking crate the
//! dependency stack doesn't otherwise carry.

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

/// Returns true if a process with this pid exists and is reachable by us.
/// Sends signal 0, which performs the existence/permission check without
/// actually signalling the process.
pub fn pid_alive(pid: u32) -> bool {
    signal::kill(Pid::from_raw(pid as i32), Option::<Signal>::None).is_ok()
}

/// Best-effort SIGTERM, used by the job manager reaper before giving up on
/// a cancel-requested job's worker process.
pub fn terminate(pid: u32) -> std::io::Result<()> {
    signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM)
        .map_err(|e| std::io::Error::from_raw_os_error(e as i32))
}
