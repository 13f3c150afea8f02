// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parses the `<driver>:(<address>,<channel>)` component identifier used
//! by `passata` (spec §6 "Component introspection ... against a component
//! identified by `<driver>:(<address>,<channel>)`").

use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentAddr {
    pub driver: String,
    pub address: String,
    pub channel: u32,
}

impl FromStr for ComponentAddr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (driver, rest) = s
            .split_once(':')
            .ok_or_else(|| format!("{s:?} is not of the form <driver>:(<address>,<channel>)"))?;
        let inner = rest
            .strip_prefix('(')
            .and_then(|r| r.strip_suffix(')'))
            .ok_or_else(|| format!("{s:?} is not of the form <driver>:(<address>,<channel>)"))?;
        let (address, channel) = inner
            .rsplit_once(',')
            .ok_or_else(|| format!("{s:?} is not of the form <driver>:(<address>,<channel>)"))?;
        let channel: u32 = channel
            .trim()
            .parse()
            .map_err(|_| format!("channel {:?} is not a non-negative integer", channel.trim()))?;

        if driver.is_empty() || address.trim().is_empty() {
            return Err(format!("{s:?} is not of the form <driver>:(<address>,<channel>)"));
        }

        Ok(ComponentAddr { driver: driver.to_string(), address: address.trim().to_string(), channel })
    }
}
