// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolves each role in a job's pipeline to its owning component and the
//! port of the driver process currently serving it (spec §4.6 "Resolve
//! `pipeline.devs` -> per-role `(component, device, driver.port)`").

use std::collections::BTreeMap;
use std::time::Duration;

use tomato_core::{Component, DaemonSnapshot, Pipeline};
use tomato_wire::Request;

use crate::error::JobError;

const CALL_TIMEOUT: Duration = Duration::from_secs(5);

pub struct ResolvedRole {
    pub component: Component,
    pub driver_port: u16,
    pub pollrate_ms: u64,
}

pub async fn resolve_roles(
    daemon_port: u16,
    pipeline: &Pipeline,
) -> Result<BTreeMap<String, ResolvedRole>, JobError> {
    let reply = tomato_wire::call(daemon_port, &Request::Status { with_data: true }, CALL_TIMEOUT, 5).await?;
    let snapshot: DaemonSnapshot = serde_json::from_value(reply.data.unwrap_or_default())?;

    let mut resolved = BTreeMap::new();
    for (role, component) in &pipeline.devs {
        let device = snapshot.devs.get(&component.name).ok_or_else(|| JobError::UnknownDevice(component.name.clone()))?;
        let driver = snapshot.drvs.get(&device.driver);
        let driver_port = driver
            .and_then(|d| d.port)
            .ok_or_else(|| JobError::DriverNotReady(device.driver.clone()))?;
        resolved.insert(
            role.clone(),
            ResolvedRole { component: component.clone(), driver_port, pollrate_ms: device.pollrate_ms },
        );
    }
    Ok(resolved)
}

#[cfg(test)]
#[path = "resolve_tests.rs"]
mod tests;
