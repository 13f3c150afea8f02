// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job entity and its status state machine.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::payload::JobPayload;

/// Monotonically-assigned job identifier. Strictly increasing for the life
/// of a deployment, including across daemon restarts (invariant 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl JobId {
    pub fn next(self) -> Self {
        JobId(self.0 + 1)
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for JobId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(JobId(s.parse()?))
    }
}

/// Job status codes, matching the original `q/qw/r/rd/c/cd/ce` vocabulary
/// verbatim so job directories and log lines stay legible against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    #[serde(rename = "q")]
    Queued,
    #[serde(rename = "qw")]
    QueuedMatched,
    #[serde(rename = "r")]
    Running,
    #[serde(rename = "rd")]
    RunDeleteRequested,
    #[serde(rename = "c")]
    Completed,
    #[serde(rename = "cd")]
    Cancelled,
    #[serde(rename = "ce")]
    CompletedError,
}

crate::simple_display! {
    JobStatus {
        Queued => "q",
        QueuedMatched => "qw",
        Running => "r",
        RunDeleteRequested => "rd",
        Completed => "c",
        Cancelled => "cd",
        CompletedError => "ce",
    }
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::CompletedError)
    }

    /// Validates a transition against the state machine in spec §4.1:
    /// `q -> qw -> r -> {c, cd, ce}`, `r -> rd -> cd`, `q -> cd`.
    pub fn validate_transition(self, to: JobStatus) -> Result<(), CoreError> {
        use JobStatus::*;
        let allowed = matches!(
            (self, to),
            (Queued, QueuedMatched)
                | (Queued, Cancelled)
                | (QueuedMatched, Running)
                | (QueuedMatched, Cancelled)
                | (Running, Completed)
                | (Running, Cancelled)
                | (Running, CompletedError)
                | (Running, RunDeleteRequested)
                | (RunDeleteRequested, Cancelled)
        ) || self == to;
        if allowed {
            Ok(())
        } else {
            Err(CoreError::ForbiddenTransition { from: self.to_string(), to: to.to_string() })
        }
    }
}

/// A queued unit of work: payload plus lifecycle/accounting fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Option<JobId>,
    pub payload: JobPayload,
    pub jobname: Option<String>,
    pub pid: Option<u32>,
    pub status: JobStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub executed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub jobpath: Option<PathBuf>,
    pub respath: Option<PathBuf>,
    pub snappath: Option<PathBuf>,
}

impl Job {
    pub fn new(payload: JobPayload, jobname: Option<String>) -> Self {
        Self {
            id: None,
            payload,
            jobname,
            pid: None,
            status: JobStatus::Queued,
            submitted_at: Some(Utc::now()),
            executed_at: None,
            completed_at: None,
            jobpath: None,
            respath: None,
            snappath: None,
        }
    }

    pub fn set_status(&mut self, to: JobStatus) -> Result<(), CoreError> {
        self.status.validate_transition(to)?;
        self.status = to;
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct JobBuilder => Job {
        computed { id: Option<JobId> = None }
        set { payload: crate::payload::JobPayload = crate::payload::JobPayload::test_default() }
        option { jobname: String = None }
        set { pid: Option<u32> = None }
        set { status: JobStatus = JobStatus::Queued }
        set { submitted_at: Option<DateTime<Utc>> = Some(Utc::now()) }
        set { executed_at: Option<DateTime<Utc>> = None }
        set { completed_at: Option<DateTime<Utc>> = None }
        set { jobpath: Option<PathBuf> = None }
        set { respath: Option<PathBuf> = None }
        set { snappath: Option<PathBuf> = None }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
