// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Human-readable vs. structured (`--yaml`) output switch shared by all
//! three binaries (spec §6 "`--yaml` flag switches human-readable output
//! to structured output").

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Yaml,
}

/// Print `data` as YAML when the format demands it, otherwise hand off to
/// `text_fn` for the human-readable rendering.
pub fn emit<T: Serialize>(format: OutputFormat, data: &T, text_fn: impl FnOnce()) -> anyhow::Result<()> {
    match format {
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(data)?);
        }
        OutputFormat::Text => text_fn(),
    }
    Ok(())
}
