// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tomato-core: shared entities, validation and merge logic for the tomato
//! laboratory-automation orchestrator.

pub mod macros;

pub mod attr;
pub mod entities;
pub mod error;
pub mod job;
pub mod merge;
pub mod payload;
pub mod process;

pub use attr::{validate_task, Attr, AttrType, Task, TechniqueSchema};
pub use entities::{Component, DaemonSnapshot, DaemonStatus, Device, Driver, Pipeline};
pub use error::CoreError;
#[cfg(any(test, feature = "test-support"))]
pub use job::JobBuilder;
pub use job::{Job, JobId, JobStatus};
pub use merge::{driver_conflict, find_matching_pipelines, merge_pipelines, reload_conflict};
pub use payload::{JobPayload, MethodStep, OutputConfig, Sample};
