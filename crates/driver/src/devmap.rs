// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The driver process's `devmap`: every component it has been told about,
//! keyed by `(address, channel)` (spec §4.4 "Owns a devmap: HashMap<(Address,
//! Channel), ComponentWorker>").

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::component::ComponentWorker;
use crate::error::DriverError;
use crate::registry::DriverKind;

pub type ComponentKey = (String, u32);

pub struct DevMap {
    kind: DriverKind,
    components: Mutex<HashMap<ComponentKey, ComponentWorker>>,
}

impl DevMap {
    pub fn new(kind: DriverKind) -> Self {
        Self { kind, components: Mutex::new(HashMap::new()) }
    }

    fn fresh_worker(&self) -> ComponentWorker {
        ComponentWorker::spawn(
            (self.kind.new_sampler)(),
            self.kind.attrs.clone(),
            self.kind.techniques.clone(),
            self.kind.constants.clone(),
        )
    }

    /// Idempotent: a component already known is left untouched.
    pub fn register(&self, address: String, channel: u32) {
        let mut components = self.components.lock();
        if !components.contains_key(&(address.clone(), channel)) {
            let worker = self.fresh_worker();
            components.insert((address, channel), worker);
        }
    }

    pub fn with_component<R>(
        &self,
        address: &str,
        channel: u32,
        f: impl FnOnce(&ComponentWorker) -> R,
    ) -> Result<R, DriverError> {
        let components = self.components.lock();
        let key = (address.to_string(), channel);
        let worker = components
            .get(&key)
            .ok_or_else(|| DriverError::UnknownComponent { address: address.to_string(), channel })?;
        Ok(f(worker))
    }

    /// Join the current worker thread and spawn a fresh one with an empty
    /// cache (spec §4.5.2).
    pub fn reset(&self, address: &str, channel: u32) -> Result<(), DriverError> {
        let mut components = self.components.lock();
        let key = (address.to_string(), channel);
        if components.remove(&key).is_none() {
            return Err(DriverError::UnknownComponent { address: address.to_string(), channel });
        }
        components.insert(key, self.fresh_worker());
        Ok(())
    }

    pub fn is_registered(&self, address: &str, channel: u32) -> bool {
        self.components.lock().contains_key(&(address.to_string(), channel))
    }

    /// `cmp_teardown`: stop any running task, reset, and remove from the
    /// devmap entirely (no replacement worker is spawned, unlike [`reset`]).
    pub fn teardown(&self, address: &str, channel: u32) -> Result<(), DriverError> {
        let mut components = self.components.lock();
        let key = (address.to_string(), channel);
        match components.remove(&key) {
            Some(_) => Ok(()),
            None => Err(DriverError::UnknownComponent { address: address.to_string(), channel }),
        }
    }
}

#[cfg(test)]
#[path = "devmap_tests.rs"]
mod tests;
