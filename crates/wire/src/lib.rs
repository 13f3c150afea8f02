// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control protocol for tomato: wire format, requests, and replies.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod reply;
mod request;
mod wire;

pub use client::call;
pub use reply::Reply;
pub use request::{ComponentRequest, Request};
pub use wire::{decode, encode, read_message, read_request, write_message, write_response, ProtocolError};
