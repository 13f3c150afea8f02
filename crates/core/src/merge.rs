// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reload-safe pipeline merging and method/pipeline matching.
//!
//! Grounded on the original `merge_pipelines`/`find_matching_pipelines`:
//! never stomp a running pipeline, and match jobs to pipelines purely by
//! set-intersection over device roles and capabilities.

use std::collections::BTreeMap;

use crate::entities::{Device, Pipeline};
use crate::payload::JobPayload;

/// Merge an incoming pipeline set into the current one without ever
/// dropping or silently mutating a pipeline that is currently running a
/// job. A pipeline absent from `incoming` is kept only if it is running;
/// a pipeline present in both and unchanged is kept as-is; a pipeline
/// present in both, changed, and idle is replaced; a pipeline present in
/// both, changed, and running is kept (the caller is expected to have
/// already rejected such a `setup` via [`reload_conflicts`]).
pub fn merge_pipelines(
    current: &BTreeMap<String, Pipeline>,
    incoming: &BTreeMap<String, Pipeline>,
) -> BTreeMap<String, Pipeline> {
    let mut out = BTreeMap::new();

    for (name, cur) in current {
        match incoming.get(name) {
            None => {
                if cur.is_running() {
                    out.insert(name.clone(), cur.clone());
                }
            }
            Some(new) => {
                if cur == new {
                    out.insert(name.clone(), cur.clone());
                } else if cur.jobid.is_none() {
                    out.insert(name.clone(), new.clone());
                } else {
                    out.insert(name.clone(), cur.clone());
                }
            }
        }
    }
    for (name, new) in incoming {
        if !current.contains_key(name) {
            out.insert(name.clone(), new.clone());
        }
    }
    out
}

/// A reload would be unsafe for `pipeline` if the incoming definition
/// changes the component mapping of a pipeline that is currently running
/// a job. Returns the precise rejection message from spec §4.1.1, if any.
pub fn reload_conflict(cur: &Pipeline, incoming: Option<&Pipeline>) -> Option<String> {
    if !cur.is_running() {
        return None;
    }
    match incoming {
        None => Some("reload would delete a running pipeline".to_string()),
        Some(new) if new.devs != cur.devs => {
            Some("reload would modify components of a running pipeline".to_string())
        }
        _ => None,
    }
}

/// True if a driver settings change affects a device used by any running
/// pipeline.
pub fn driver_conflict(
    driver_name: &str,
    devs: &BTreeMap<String, Device>,
    pips: &BTreeMap<String, Pipeline>,
) -> Option<String> {
    let affected_devices: Vec<&str> = devs
        .values()
        .filter(|d| d.driver == driver_name)
        .map(|d| d.name.as_str())
        .collect();
    let in_use = pips
        .values()
        .any(|p| p.is_running() && p.devs.values().any(|c| affected_devices.contains(&c.name.as_str())));
    if in_use {
        Some("reload would modify a driver of a device in a running pipeline".to_string())
    } else {
        None
    }
}

/// Pipelines whose component roles cover the method's required roles and
/// whose aggregate capabilities cover the method's required techniques.
pub fn find_matching_pipelines<'a>(
    pipelines: impl IntoIterator<Item = &'a Pipeline>,
    devs: &BTreeMap<String, Device>,
    payload: &JobPayload,
) -> Vec<&'a Pipeline> {
    let req_roles = payload.required_roles();
    let req_techniques = payload.required_techniques();

    pipelines
        .into_iter()
        .filter(|pip| {
            let roles = pip.roles();
            if !req_roles.iter().all(|r| roles.contains(r)) {
                return false;
            }
            let capabs: std::collections::BTreeSet<&str> = pip
                .devs
                .values()
                .filter_map(|c| devs.values().find(|d| d.address == c.address))
                .flat_map(|d| d.capabilities.iter().map(String::as_str))
                .collect();
            req_techniques.iter().all(|t| capabs.contains(t))
        })
        .collect()
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;
