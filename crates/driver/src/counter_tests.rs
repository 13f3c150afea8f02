// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use super::*;

#[test]
fn declares_the_four_attrs_from_the_spec() {
    let kind = kind();
    for name in ["delay", "time", "started", "val"] {
        assert!(kind.attrs.contains_key(name), "missing attr {name}");
    }
    assert!(!kind.attrs["val"].rw, "val must be read-only");
    assert!(kind.attrs["delay"].rw);
}

#[test]
fn declares_count_and_random_techniques() {
    let kind = kind();
    assert!(kind.techniques.contains_key("count"));
    assert!(kind.techniques.contains_key("random"));
    assert_eq!(kind.techniques["count"]["delay"], Some(Value::from(0.5)));
}

#[test]
fn count_technique_increases_monotonically_with_elapsed_time() {
    let sampler = CounterSampler { val: AtomicI64::new(0) };
    let params = BTreeMap::new();
    let a = sampler.sample("count", &params, Duration::from_millis(0));
    let b = sampler.sample("count", &params, Duration::from_millis(600));
    assert!(b.as_i64().unwrap() >= a.as_i64().unwrap());
}

#[test]
fn random_technique_stays_within_bounds() {
    let sampler = CounterSampler { val: AtomicI64::new(0) };
    let params = BTreeMap::new();
    for ms in 0..20u64 {
        let v = sampler.sample("random", &params, Duration::from_millis(ms * 37));
        let n = v.as_i64().unwrap();
        assert!((0..100).contains(&n));
    }
}
