//! Control CLI specs: lifecycle, pipeline round-trips, reload idempotence.

use crate::prelude::*;

#[test]
fn help_and_bad_subcommand() {
    cli("tomato").args(&["--help"]).passes().stdout_has("Control the tomato daemon");
    cli("tomato").args(&["frobnicate"]).fails();
}

#[test]
fn init_writes_settings_toml() {
    let dep = Deployment::new();
    dep.init();
    assert!(dep.appdir().join("settings.toml").exists());
}

#[test]
fn status_fails_before_start_and_succeeds_after() {
    let dep = Deployment::new();
    dep.init();
    dep.tomato().args(&["status"]).fails();

    dep.start();
    dep.tomato().args(&["status"]).passes().stdout_has("daemon status");
}

#[test]
fn stop_makes_status_unreachable_again() {
    let dep = Deployment::new();
    dep.init();
    dep.start();

    dep.tomato().args(&["stop"]).passes();
    let stopped = wait_for(WAIT_MAX_MS, || !dep.tomato().args(&["status"]).run().succeeded());
    assert!(stopped, "daemon still answering status after stop");
}

/// "`pipeline load X S` then `pipeline eject X` returns Pipeline X to
/// `{sampleid=none, ready=false, jobid=none}`" (spec §8 round-trip property).
#[test]
fn pipeline_load_then_eject_round_trips() {
    let dep = Deployment::new();
    dep.init();
    dep.write_devices(COUNTER_DEVICES_YML);
    dep.start();
    dep.tomato().args(&["reload"]).passes();

    dep.tomato().args(&["pipeline", "load", "robochron-1", "s1"]).passes();
    let loaded = dep.tomato().args(&["status", "--with-data", "--yaml"]).passes();
    assert!(loaded.stdout().contains("sampleid: s1"));

    dep.tomato().args(&["pipeline", "eject", "robochron-1"]).passes();
    let ejected = dep.tomato().args(&["status", "--with-data", "--yaml"]).passes().stdout();
    assert!(ejected.contains("sampleid: null"));
    assert!(ejected.contains("ready: false"));
}

/// "`pipeline ready X` is idempotent" (spec §8).
#[test]
fn pipeline_ready_is_idempotent() {
    let dep = Deployment::new();
    dep.init();
    dep.write_devices(COUNTER_DEVICES_YML);
    dep.start();
    dep.tomato().args(&["reload"]).passes();

    dep.tomato().args(&["pipeline", "ready", "robochron-1"]).passes();
    dep.tomato().args(&["pipeline", "ready", "robochron-1"]).passes();
    let status = dep.tomato().args(&["status", "--with-data", "--yaml"]).passes().stdout();
    assert!(status.contains("ready: true"));
}

/// "`reload` with unchanged configuration is a no-op" (spec §8).
#[test]
fn reload_twice_with_unchanged_devices_succeeds_both_times() {
    let dep = Deployment::new();
    dep.init();
    dep.write_devices(COUNTER_DEVICES_YML);
    dep.start();

    dep.tomato().args(&["reload"]).passes();
    dep.tomato().args(&["reload"]).passes();
}
