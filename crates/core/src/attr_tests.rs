// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use std::collections::BTreeMap;

fn max_attr() -> Attr {
    Attr {
        name: "max".to_string(),
        ty: AttrType::Int,
        rw: true,
        status: false,
        units: None,
        minimum: Some(0.0),
        maximum: Some(100.0),
        allowed: None,
    }
}

#[test]
fn value_within_bounds_is_accepted() {
    assert_eq!(max_attr().coerce_and_check(&json!(50)).unwrap(), json!(50.0));
}

#[test]
fn value_above_max_reports_exact_message() {
    let err = max_attr().coerce_and_check(&json!(200)).unwrap_err();
    assert_eq!(err.to_string(), "val 200 is greater than 100");
}

#[test]
fn value_below_min_reports_exact_message() {
    let err = max_attr().coerce_and_check(&json!(-5)).unwrap_err();
    assert_eq!(err.to_string(), "val -5 is less than 0");
}

#[test]
fn wrong_type_is_rejected() {
    let err = max_attr().coerce_and_check(&json!("fifty")).unwrap_err();
    assert!(matches!(err, CoreError::WrongType(_)));
}

#[test]
fn read_only_attr_rejects_write() {
    let mut val_attr = max_attr();
    val_attr.rw = false;
    let err = val_attr.coerce_and_check(&json!(1)).unwrap_err();
    assert!(matches!(err, CoreError::NotWritable(_)));
}

#[test]
fn allowed_set_rejects_unlisted_value() {
    let mut attr = max_attr();
    attr.allowed = Some(vec![json!(1), json!(2)]);
    let err = attr.coerce_and_check(&json!(3)).unwrap_err();
    assert!(matches!(err, CoreError::NotAllowed(_)));
}

#[test]
fn unknown_technique_is_rejected() {
    let task = Task {
        technique_name: "flux".to_string(),
        task_params: BTreeMap::new(),
        sampling_interval: 1.0,
        max_duration: 3.0,
    };
    let err = validate_task(&task, &BTreeMap::new(), &BTreeMap::new()).unwrap_err();
    assert!(matches!(err, CoreError::UnknownTask(_)));
}

#[test]
fn missing_required_param_is_rejected() {
    let mut techniques = BTreeMap::new();
    let mut schema: TechniqueSchema = BTreeMap::new();
    schema.insert("max".to_string(), None);
    techniques.insert("count".to_string(), schema);

    let mut attrs = BTreeMap::new();
    attrs.insert("max".to_string(), max_attr());

    let task = Task {
        technique_name: "count".to_string(),
        task_params: BTreeMap::new(),
        sampling_interval: 1.0,
        max_duration: 3.0,
    };
    let err = validate_task(&task, &techniques, &attrs).unwrap_err();
    assert!(matches!(err, CoreError::MissingParam(_)));
}

#[test]
fn task_with_defaulted_param_succeeds() {
    let mut techniques = BTreeMap::new();
    let mut schema: TechniqueSchema = BTreeMap::new();
    schema.insert("max".to_string(), Some(json!(10)));
    techniques.insert("count".to_string(), schema);

    let mut attrs = BTreeMap::new();
    attrs.insert("max".to_string(), max_attr());

    let task = Task {
        technique_name: "count".to_string(),
        task_params: BTreeMap::new(),
        sampling_interval: 1.0,
        max_duration: 3.0,
    };
    let coerced = validate_task(&task, &techniques, &attrs).unwrap();
    assert_eq!(coerced.get("max"), Some(&json!(10.0)));
}
