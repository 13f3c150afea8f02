// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `passata`: the component introspection CLI (spec §6 "Component
//! introspection: status, attrs, capabilities, constants, get").

use clap::{Parser, Subcommand};

use tomato_cli::{client, component_addr::ComponentAddr, exit_on_result, output, ExitError, SharedFlags};
use tomato_core::DaemonSnapshot;
use tomato_wire::{ComponentRequest, Request};

#[derive(Parser, Debug)]
#[command(name = "passata", about = "Inspect a component's status, attrs and capabilities")]
struct Cli {
    #[command(flatten)]
    shared: SharedFlags,

    /// Component identified as `<driver>:(<address>,<channel>)`.
    component: ComponentAddr,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the component's live status (including whether it is running).
    Status,
    /// Print the component's attribute schema.
    Attrs,
    /// Print the techniques the component supports.
    Capabilities,
    /// Print the component's fixed, driver-reported constants.
    Constants,
    /// Read one or more attributes by name.
    Get { attr: Vec<String> },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    exit_on_result(run(cli).await)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let shared = &cli.shared;
    let port = driver_port(shared, &cli.component.driver).await?;
    let address = cli.component.address.clone();
    let channel = cli.component.channel;

    match cli.command {
        Command::Status => {
            let req = ComponentRequest::CmpStatus { address, channel };
            let reply = client::call(port, &req, shared.timeout()).await?;
            print_reply(shared, &reply);
        }
        Command::Attrs => {
            let req = ComponentRequest::CmpAttrs { address, channel };
            let reply = client::call(port, &req, shared.timeout()).await?;
            print_reply(shared, &reply);
        }
        Command::Capabilities => {
            let req = ComponentRequest::CmpCapabilities { address, channel };
            let reply = client::call(port, &req, shared.timeout()).await?;
            print_reply(shared, &reply);
        }
        Command::Constants => {
            let req = ComponentRequest::CmpConstants { address, channel };
            let reply = client::call(port, &req, shared.timeout()).await?;
            print_reply(shared, &reply);
        }
        Command::Get { attr } => {
            if attr.is_empty() {
                return Err(ExitError::new(2, "at least one attr name is required").into());
            }
            for name in attr {
                let req = ComponentRequest::CmpGetAttr { address: address.clone(), channel, attr: name.clone() };
                let reply = client::call(port, &req, shared.timeout()).await?;
                let value = reply.data.clone().unwrap_or_default();
                output::emit(shared.output_format(), &value, || println!("{name}: {value}"))?;
            }
        }
    }
    Ok(())
}

/// Resolves a driver name to its live control port via the daemon's full
/// snapshot — `passata` has no other way to learn which port a named
/// driver bound.
async fn driver_port(shared: &SharedFlags, driver: &str) -> anyhow::Result<u16> {
    let reply = client::call(shared.port, &Request::Status { with_data: true }, shared.timeout()).await?;
    let snapshot: DaemonSnapshot = serde_json::from_value(reply.data.unwrap_or_default())
        .map_err(|e| ExitError::new(2, format!("malformed daemon snapshot: {e}")))?;
    let drv = snapshot
        .drvs
        .get(driver)
        .ok_or_else(|| ExitError::new(1, format!("no such driver {driver:?}")))?;
    drv.port.ok_or_else(|| ExitError::new(1, format!("driver {driver:?} has not connected yet")))
}

fn print_reply(shared: &SharedFlags, reply: &tomato_wire::Reply) {
    let data = reply.data.clone().unwrap_or_default();
    let _ = output::emit(shared.output_format(), &data, || {
        println!("{}", serde_json::to_string_pretty(&data).unwrap_or_default());
    });
}
