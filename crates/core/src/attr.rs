// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Attr metadata and task validation (spec §4.5/§4.5.1).
//!
//! Grounded on `driverinterface_2_1.Attr`/`ModelInterface.task_validate`:
//! a duck-typed dict there becomes a tagged record here, closed over a
//! fixed set of scalar kinds the validator understands.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;

/// The closed set of scalar kinds an Attr's value can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttrType {
    Bool,
    Int,
    Float,
    Str,
}

/// A named, typed, possibly-bounded, optionally-read-write property of a
/// Component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attr {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: AttrType,
    #[serde(default)]
    pub rw: bool,
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub units: Option<String>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
    #[serde(default)]
    pub allowed: Option<Vec<Value>>,
}

impl Attr {
    /// Coerce `val` to this attr's declared type and check it against the
    /// declared bounds/allowed-set. Returns the exact error message formats
    /// named in spec §4.5.1.
    pub fn coerce_and_check(&self, val: &Value) -> Result<Value, CoreError> {
        if !self.rw {
            return Err(CoreError::NotWritable(self.name.clone()));
        }
        let coerced = match (self.ty, val) {
            (AttrType::Bool, Value::Bool(_)) => val.clone(),
            (AttrType::Int, Value::Number(n)) if n.is_i64() || n.is_u64() => val.clone(),
            (AttrType::Float, Value::Number(n)) => Value::from(n.as_f64().unwrap_or_default()),
            (AttrType::Str, Value::String(_)) => val.clone(),
            _ => return Err(CoreError::WrongType(self.name.clone())),
        };

        if let Some(n) = coerced.as_f64() {
            if let Some(max) = self.maximum {
                if n > max {
                    return Err(CoreError::AboveMax {
                        value: fmt_num(n),
                        max: fmt_num(max),
                    });
                }
            }
            if let Some(min) = self.minimum {
                if n < min {
                    return Err(CoreError::BelowMin {
                        value: fmt_num(n),
                        min: fmt_num(min),
                    });
                }
            }
        }
        if let Some(allowed) = &self.allowed {
            if !allowed.contains(&coerced) {
                return Err(CoreError::NotAllowed(coerced.to_string()));
            }
        }
        Ok(coerced)
    }
}

fn fmt_num(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// One invocation of a technique: `technique_name` plus typed params,
/// `sampling_interval` and `max_duration` both in seconds, `> 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub technique_name: String,
    #[serde(default)]
    pub task_params: BTreeMap<String, Value>,
    pub sampling_interval: f64,
    pub max_duration: f64,
}

/// A technique's required attrs: name -> (attr name, optional default).
pub type TechniqueSchema = BTreeMap<String, Option<Value>>;

/// Validate a [`Task`] against a driver's declared techniques and attrs
/// (spec §4.5.1). Returns the coerced param map on success.
pub fn validate_task(
    task: &Task,
    techniques: &BTreeMap<String, TechniqueSchema>,
    attrs: &BTreeMap<String, Attr>,
) -> Result<BTreeMap<String, Value>, CoreError> {
    let schema = techniques
        .get(&task.technique_name)
        .ok_or_else(|| CoreError::UnknownTask(task.technique_name.clone()))?;

    let mut coerced = BTreeMap::new();
    for (name, default) in schema {
        let raw = match task.task_params.get(name) {
            Some(v) => v,
            None => match default {
                Some(d) => d,
                None => return Err(CoreError::MissingParam(name.clone())),
            },
        };
        let attr = attrs.get(name).ok_or_else(|| CoreError::UnknownAttr(name.clone()))?;
        coerced.insert(name.clone(), attr.coerce_and_check(raw)?);
    }
    Ok(coerced)
}

#[cfg(test)]
#[path = "attr_tests.rs"]
mod tests;
