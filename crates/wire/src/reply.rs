// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The single reply envelope every command returns, grounded directly on
//! `original_source/src/tomato/models.py::Reply` — every one of the
//! original's ZMQ calls returns exactly this shape, so it is kept as the
//! one reply type rather than split into per-command response variants.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reply {
    pub success: bool,
    pub msg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Reply {
    pub fn ok(msg: impl Into<String>) -> Self {
        Self { success: true, msg: msg.into(), data: None }
    }

    pub fn ok_with(msg: impl Into<String>, data: impl Serialize) -> Self {
        Self {
            success: true,
            msg: msg.into(),
            data: serde_json::to_value(data).ok(),
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self { success: false, msg: msg.into(), data: None }
    }

    pub fn err_with(msg: impl Into<String>, data: impl Serialize) -> Self {
        Self {
            success: false,
            msg: msg.into(),
            data: serde_json::to_value(data).ok(),
        }
    }
}
