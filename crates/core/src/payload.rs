// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The declarative unit a client submits: a sample, an ordered method, and
//! output settings. Mirrors the shape the original source read out of
//! `payload["sample"]`/`payload["method"]`/`payload["tomato"]`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub name: String,
    #[serde(default)]
    pub capacity: Option<f64>,
}

/// One step of a method: targets a role ("device" in the original payload
/// schema) with a technique and its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodStep {
    /// Role name, matched against a Pipeline's `devs` mapping.
    pub device: String,
    /// Technique name, matched against the owning Component's capabilities.
    pub technique: String,
    #[serde(default)]
    pub task_params: BTreeMap<String, Value>,
    pub sampling_interval: f64,
    pub max_duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_prefix() -> String {
    "results".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { path: None, prefix: default_prefix() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPayload {
    pub sample: Sample,
    pub method: Vec<MethodStep>,
    #[serde(default)]
    pub tomato: OutputConfig,
}

impl JobPayload {
    /// The set of roles ("device" fields) referenced anywhere in the method.
    pub fn required_roles(&self) -> std::collections::BTreeSet<&str> {
        self.method.iter().map(|s| s.device.as_str()).collect()
    }

    /// The set of techniques referenced anywhere in the method.
    pub fn required_techniques(&self) -> std::collections::BTreeSet<&str> {
        self.method.iter().map(|s| s.technique.as_str()).collect()
    }

    #[cfg(any(test, feature = "test-support"))]
    pub fn test_default() -> Self {
        Self {
            sample: Sample { name: "s1".to_string(), capacity: None },
            method: vec![MethodStep {
                device: "worker".to_string(),
                technique: "count".to_string(),
                task_params: BTreeMap::new(),
                sampling_interval: 1.0,
                max_duration: 3.0,
            }],
            tomato: OutputConfig::default(),
        }
    }
}
