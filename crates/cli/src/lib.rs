// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared plumbing for the three user-facing binaries: `tomato` (control),
//! `ketchup` (queue) and `passata` (component introspection) — spec §6
//! "CLI surface". Each binary is a thin `clap` front-end over the same
//! `tomato_wire::call` request/reply pattern the daemon and drivers use
//! internally.

pub mod client;
pub mod component_addr;
pub mod exit_error;
pub mod output;

pub use exit_error::ExitError;

use std::path::PathBuf;

/// Flags shared by every subcommand of every binary (spec §6 "Shared
/// flags: port, timeout (ms), app-directory, log-directory, data-directory;
/// -v/-q verbosity stacking").
#[derive(Debug, Clone, clap::Args)]
pub struct SharedFlags {
    /// Daemon control port. All three tools must agree on this for one
    /// deployment.
    #[arg(long, default_value_t = default_port())]
    pub port: u16,

    /// Per-call timeout against the daemon/driver, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    pub timeout: u64,

    /// Directory holding `settings.toml`.
    #[arg(long = "app-directory")]
    pub app_directory: Option<PathBuf>,

    /// Overrides the `datadir` from `settings.toml`.
    #[arg(long = "data-directory")]
    pub data_directory: Option<PathBuf>,

    /// Directory for rotating log files.
    #[arg(long = "log-directory")]
    pub log_directory: Option<PathBuf>,

    /// Increase verbosity; repeatable.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Decrease verbosity; repeatable.
    #[arg(short = 'q', long = "quiet", action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Switch human-readable output to structured YAML (spec §6 "--yaml
    /// flag switches human-readable output to structured output").
    #[arg(long)]
    pub yaml: bool,
}

/// The default control port a fresh deployment binds, absent an explicit
/// `--port`. Chosen fixed (not `0`) since every CLI invocation must agree
/// on the same port as the running daemon with no other discovery
/// mechanism in scope (spec §1 "no persistence... beyond"; single-host
/// loopback transport).
pub fn default_port() -> u16 {
    10001
}

pub fn default_appdir() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("tomato")
}

/// Shared `main` tail for all three binaries: run `result`, translate an
/// [`ExitError`] into its carried exit code, and otherwise exit 1 with the
/// error printed to stderr (spec §6 "Exit code 0 on success; non-zero on
/// failure").
pub fn exit_on_result(result: anyhow::Result<()>) -> ! {
    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => match e.downcast_ref::<ExitError>() {
            Some(exit) => {
                if !exit.message.is_empty() {
                    eprintln!("{}", exit.message);
                }
                std::process::exit(exit.code);
            }
            None => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        },
    }
}

impl SharedFlags {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout)
    }

    pub fn appdir(&self) -> PathBuf {
        self.app_directory.clone().unwrap_or_else(default_appdir)
    }

    pub fn output_format(&self) -> output::OutputFormat {
        if self.yaml {
            output::OutputFormat::Yaml
        } else {
            output::OutputFormat::Text
        }
    }
}
