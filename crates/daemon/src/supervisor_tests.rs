// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::Utc;
use tomato_core::Driver;

use super::*;

#[test]
fn alive_pid_needs_no_action() {
    let mut drv = Driver::new("counter");
    drv.pid = Some(std::process::id());
    assert!(matches!(classify(&drv), Action::None));
}

#[test]
fn dead_pid_is_a_crash_respawn() {
    let mut drv = Driver::new("counter");
    // pid 0 is never a real process id handed out to us; kill(0, 0) targets
    // the caller's process group, not a pid, and on this sandbox returns
    // success, so use a pid far outside any plausible live range instead.
    drv.pid = Some(999_999);
    assert!(matches!(classify(&drv), Action::Respawn("crashed")));
}

#[test]
fn stuck_in_startup_past_the_grace_window_is_a_late_respawn() {
    let mut drv = Driver::new("counter");
    drv.spawned_at = Some(Utc::now() - chrono::Duration::seconds(30));
    assert!(matches!(classify(&drv), Action::Respawn("late")));
}

#[test]
fn freshly_recorded_spawn_is_left_alone() {
    let mut drv = Driver::new("counter");
    drv.spawned_at = Some(Utc::now());
    assert!(matches!(classify(&drv), Action::None));
}

#[test]
fn never_spawned_is_a_fresh_spawn() {
    let drv = Driver::new("counter");
    assert!(matches!(classify(&drv), Action::SpawnFresh));
}
