// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Leaf error type for one `tomato-driver` process.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Core(#[from] tomato_core::CoreError),

    #[error(transparent)]
    Protocol(#[from] tomato_wire::ProtocolError),

    #[error("unknown driver name {0:?}")]
    UnknownDriverName(String),

    #[error("component ({address}, {channel}) is not registered")]
    UnknownComponent { address: String, channel: u32 },

    #[error("component worker is gone")]
    WorkerGone,

    #[error("component is busy running a task")]
    Busy,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
