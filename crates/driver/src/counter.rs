// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `counter` reference driver, shipped as the default/test driver
//! (spec §4.4), grounded on
//! `original_source/src/tomato/drivers/example_counter/counter.py::Counter`.
//! The original mixed its own sampling cadence into `run_counter`; here the
//! cadence is the generic component worker loop (spec §4.5) and this module
//! supplies only the per-tick value for each technique.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use tomato_core::{Attr, AttrType, TechniqueSchema};

use crate::component::Sampler;
use crate::registry::DriverKind;

struct CounterSampler {
    val: AtomicI64,
}

impl Sampler for CounterSampler {
    fn sample(&self, technique: &str, params: &BTreeMap<String, Value>, elapsed: Duration) -> Value {
        let next = match technique {
            "count" => {
                let delay = params.get("delay").and_then(Value::as_f64).filter(|d| *d > 0.0).unwrap_or(0.5);
                (elapsed.as_secs_f64() / delay).floor() as i64
            }
            "random" => xorshift(elapsed.as_nanos() as u64 ^ self.val.load(Ordering::SeqCst) as u64),
            _ => self.val.load(Ordering::SeqCst),
        };
        self.val.store(next, Ordering::SeqCst);
        Value::from(next)
    }
}

/// A deterministic xorshift64 mixer, not a cryptographic RNG: no `rand`
/// crate is in the dependency stack and the counter driver only needs
/// plausible jitter for its `random` technique.
fn xorshift(seed: u64) -> i64 {
    let mut x = seed ^ 0x9E37_79B9_7F4A_7C15;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    (x % 100) as i64
}

pub fn kind() -> DriverKind {
    let mut attrs = BTreeMap::new();
    attrs.insert(
        "delay".to_string(),
        Attr {
            name: "delay".to_string(),
            ty: AttrType::Float,
            rw: true,
            status: false,
            units: Some("s".to_string()),
            minimum: Some(0.0),
            maximum: None,
            allowed: None,
        },
    );
    attrs.insert(
        "time".to_string(),
        Attr {
            name: "time".to_string(),
            ty: AttrType::Float,
            rw: true,
            status: false,
            units: Some("s".to_string()),
            minimum: Some(0.0),
            maximum: None,
            allowed: None,
        },
    );
    attrs.insert(
        "started".to_string(),
        Attr {
            name: "started".to_string(),
            ty: AttrType::Bool,
            rw: true,
            status: true,
            units: None,
            minimum: None,
            maximum: None,
            allowed: None,
        },
    );
    attrs.insert(
        "val".to_string(),
        Attr {
            name: "val".to_string(),
            ty: AttrType::Int,
            rw: false,
            status: true,
            units: None,
            minimum: None,
            maximum: None,
            allowed: None,
        },
    );

    let mut techniques: BTreeMap<String, TechniqueSchema> = BTreeMap::new();
    let mut count_schema: TechniqueSchema = BTreeMap::new();
    count_schema.insert("delay".to_string(), Some(Value::from(0.5)));
    techniques.insert("count".to_string(), count_schema);
    techniques.insert("random".to_string(), TechniqueSchema::new());

    let mut constants = BTreeMap::new();
    constants.insert("driver".to_string(), Value::from("counter"));
    constants.insert("max_channels".to_string(), Value::from(1));

    DriverKind {
        attrs,
        techniques,
        constants,
        new_sampler: || Arc::new(CounterSampler { val: AtomicI64::new(0) }),
    }
}

#[cfg(test)]
#[path = "counter_tests.rs"]
mod tests;
