// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! An explicit, compile-time driver registry: name -> factory. Replaces the
//! original's dynamic-import-by-name resolution (`REDESIGN FLAGS`: "dynamic
//! driver discovery is replaced by an explicit driver registry"). Adding a
//! new driver means adding one match arm here.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tomato_core::{Attr, TechniqueSchema};

use crate::component::Sampler;
use crate::error::DriverError;

/// Everything needed to spin up a fresh [`crate::component::ComponentWorker`]
/// for one driver name: its attr/technique schema (shared by every
/// component the driver owns), a fixed constants map (spec §4.4
/// `cmp_constants`) and a factory producing a fresh, independent sampler
/// instance per component.
pub struct DriverKind {
    pub attrs: BTreeMap<String, Attr>,
    pub techniques: BTreeMap<String, TechniqueSchema>,
    pub constants: BTreeMap<String, Value>,
    pub new_sampler: fn() -> Arc<dyn Sampler>,
}

pub fn lookup(name: &str) -> Result<DriverKind, DriverError> {
    match name {
        "counter" => Ok(crate::counter::kind()),
        other => Err(DriverError::UnknownDriverName(other.to_string())),
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
