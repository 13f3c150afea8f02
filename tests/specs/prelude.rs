//! Test helpers for behavioral specifications.
//!
//! Provides a high-level DSL for driving the three CLI binaries
//! (`tomato`, `ketchup`, `passata`) and the daemon they control.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::{Duration, Instant};

use assert_cmd::Command;

pub const POLL_INTERVAL_MS: u64 = 20;
pub const WAIT_MAX_MS: u64 = 3000;

/// Resolves the path to a workspace binary built alongside this test
/// binary. Mirrors cargo's own `target/<profile>/<name>` layout; falls
/// back to resolving relative to this test binary itself since
/// `CARGO_MANIFEST_DIR` points at `tomato-specs`, not at the crate that
/// owns `name`.
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }
    standard
}

/// Picks a free loopback port by binding an ephemeral listener and
/// releasing it immediately. Racy against other processes in principle,
/// not in practice at this test suite's concurrency.
pub fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    listener.local_addr().expect("local_addr").port()
}

pub fn cli(bin: &str) -> CliBuilder {
    CliBuilder::new(bin)
}

pub struct CliBuilder {
    bin: String,
    args: Vec<String>,
}

impl CliBuilder {
    fn new(bin: &str) -> Self {
        Self { bin: bin.to_string(), args: Vec::new() }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn command(self) -> Command {
        let mut cmd = Command::new(binary_path(&self.bin));
        cmd.args(&self.args);
        cmd
    }

    pub fn passes(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("command should run");
        assert!(
            output.status.success(),
            "expected {:?} to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            cmd.get_args().collect::<Vec<_>>(),
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    pub fn fails(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("command should run");
        assert!(
            !output.status.success(),
            "expected command to fail, but it passed\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    /// Run without asserting on the exit code, for callers that poll.
    pub fn run(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("command should run");
        RunAssert { output }
    }
}

pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn succeeded(&self) -> bool {
        self.output.status.success()
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(stdout.contains(expected), "stdout does not contain {expected:?}\nstdout: {stdout}");
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(stderr.contains(expected), "stderr does not contain {expected:?}\nstderr: {stderr}");
        self
    }
}

pub fn wait_for<F>(timeout_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = Instant::now();
    let timeout = Duration::from_millis(timeout_ms);
    let poll = Duration::from_millis(POLL_INTERVAL_MS);
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(poll);
    }
    false
}

/// A single device/pipeline pair naming the built-in `counter` reference
/// driver on one channel, named `main`.
pub const COUNTER_DEVICES_YML: &str = r#"
devices:
  - name: cnt
    driver: counter
    address: "sim"
    channels: [0]
    capabilities: ["open_circuit_voltage"]

pipelines:
  - name: robochron-1
    devices:
      - tag: counter
        name: cnt
        channel: 0
"#;

/// A temporary deployment: its own app/data directories and a unique
/// loopback port, with the daemon and driver supervisor torn down on
/// drop.
pub struct Deployment {
    appdir: tempfile::TempDir,
    datadir: tempfile::TempDir,
    port: u16,
}

impl Deployment {
    pub fn new() -> Self {
        Self {
            appdir: tempfile::tempdir().expect("tempdir"),
            datadir: tempfile::tempdir().expect("tempdir"),
            port: free_port(),
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn appdir(&self) -> &Path {
        self.appdir.path()
    }

    pub fn datadir(&self) -> &Path {
        self.datadir.path()
    }

    fn shared_args(&self) -> Vec<String> {
        vec![
            "--port".into(),
            self.port.to_string(),
            "--app-directory".into(),
            self.appdir.path().display().to_string(),
            "--data-directory".into(),
            self.datadir.path().display().to_string(),
        ]
    }

    pub fn tomato(&self) -> CliBuilder {
        let mut b = cli("tomato");
        for a in self.shared_args() {
            b = b.arg(a);
        }
        b
    }

    pub fn ketchup(&self) -> CliBuilder {
        let mut b = cli("ketchup");
        for a in self.shared_args() {
            b = b.arg(a);
        }
        b
    }

    pub fn passata(&self) -> CliBuilder {
        let mut b = cli("passata");
        for a in self.shared_args() {
            b = b.arg(a);
        }
        b
    }

    /// Writes `devices.yml` at the path `settings.toml` will reference,
    /// then runs `tomato init` + `tomato reload` against it.
    pub fn write_devices(&self, yaml: &str) {
        std::fs::write(self.appdir.path().join("devices.yml"), yaml).expect("write devices.yml");
    }

    /// `tomato init`. `init`'s default `settings.toml` already points
    /// `devices.config` at `<appdir>/devices.yml`, so [`Self::write_devices`]
    /// only needs to write that file, not touch settings.
    pub fn init(&self) {
        self.tomato().args(&["init"]).passes();
    }

    /// Spawns the daemon detached via `tomato start` and blocks until
    /// `tomato status` reports it reachable.
    pub fn start(&self) -> RunAssert {
        let result = self.tomato().args(&["start"]).passes();
        let reachable = wait_for(WAIT_MAX_MS, || self.tomato().args(&["status"]).run().succeeded());
        assert!(reachable, "daemon never became reachable on port {}", self.port);
        result
    }

    pub fn stop(&self) {
        let _ = self.tomato().args(&["stop"]).run();
    }
}

impl Drop for Deployment {
    fn drop(&mut self) {
        self.stop();
    }
}
