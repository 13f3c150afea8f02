// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `settings.toml` and the devices/pipelines file (spec §6 "Config files"),
//! grounded on `original_source/src/tomato/tomato/__init__.py`
//! (`load_device_file`, `get_pipelines`, `init`, `reload`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use tomato_core::{Component, Device, Pipeline};

use crate::error::StorageError;

/// Parsed `settings.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub datadir: PathBuf,
    pub jobs: JobsSettings,
    pub devices: DevicesSettings,
    #[serde(default)]
    pub drivers: BTreeMap<String, toml::value::Table>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsSettings {
    pub storage: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevicesSettings {
    pub config: PathBuf,
}

impl Settings {
    /// Per-driver settings map, coerced from TOML to the JSON map shape
    /// `Driver::settings` carries (so it round-trips through the wire
    /// protocol the same way the original's `dict` settings did).
    pub fn driver_settings(&self, name: &str) -> Map<String, JsonValue> {
        self.drivers.get(name).map(toml_table_to_json_map).unwrap_or_default()
    }

    /// Write the default `settings.toml` template (`tomato init`).
    pub fn write_default(appdir: &Path, datadir: &Path) -> Result<PathBuf, StorageError> {
        std::fs::create_dir_all(appdir).map_err(|source| StorageError::Io { path: appdir.to_path_buf(), source })?;
        let jobs_storage = datadir.join("Jobs");
        let devices_config = appdir.join("devices.yml");
        let body = format!(
            "# Default settings for tomato\n\
             datadir = '{}'\n\n\
             [jobs]\n\
             storage = '{}'\n\n\
             [devices]\n\
             config = '{}'\n\n\
             [drivers]\n",
            datadir.display(),
            jobs_storage.display(),
            devices_config.display(),
        );
        let path = appdir.join("settings.toml");
        std::fs::write(&path, body).map_err(|source| StorageError::Io { path: path.clone(), source })?;
        Ok(path)
    }
}

pub fn load_settings(appdir: &Path) -> Result<Settings, StorageError> {
    let path = appdir.join("settings.toml");
    let body = match std::fs::read_to_string(&path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StorageError::SettingsMissing(appdir.to_path_buf()))
        }
        Err(source) => return Err(StorageError::Io { path, source }),
    };
    toml::from_str(&body).map_err(|source| StorageError::Toml { path, source })
}

fn toml_table_to_json_map(table: &toml::value::Table) -> Map<String, JsonValue> {
    table.iter().map(|(k, v)| (k.clone(), toml_to_json(v))).collect()
}

fn toml_to_json(value: &toml::Value) -> JsonValue {
    match value {
        toml::Value::String(s) => JsonValue::String(s.clone()),
        toml::Value::Integer(i) => JsonValue::from(*i),
        toml::Value::Float(f) => JsonValue::from(*f),
        toml::Value::Boolean(b) => JsonValue::Bool(*b),
        toml::Value::Datetime(d) => JsonValue::String(d.to_string()),
        toml::Value::Array(a) => JsonValue::Array(a.iter().map(toml_to_json).collect()),
        toml::Value::Table(t) => JsonValue::Object(toml_table_to_json_map(t)),
    }
}

/// One entry of the devices file's `devices` list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDevice {
    pub name: String,
    pub driver: String,
    pub address: String,
    pub channels: Vec<u32>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default = "default_pollrate_ms")]
    pub pollrate_ms: u64,
}

fn default_pollrate_ms() -> u64 {
    1000
}

/// A device entry's `channel` field: either a specific channel id (a
/// non-wildcard pipeline) or the literal `"each"` (a wildcard pipeline,
/// expanded once per channel of the named device — spec §6/§9 "Pipeline
/// wildcard expansion").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelSpec {
    One(u32),
    #[serde(rename = "each")]
    Each,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPipelineDevice {
    pub tag: String,
    pub name: String,
    pub channel: ChannelSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPipeline {
    pub name: String,
    pub devices: Vec<RawPipelineDevice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevicesFile {
    pub devices: Vec<RawDevice>,
    pub pipelines: Vec<RawPipeline>,
}

pub fn load_devices_file(path: &Path) -> Result<DevicesFile, StorageError> {
    let body = std::fs::read_to_string(path).map_err(|source| StorageError::Io { path: path.to_path_buf(), source })?;
    serde_yaml::from_str(&body).map_err(|source| StorageError::Yaml { path: path.to_path_buf(), source })
}

/// Expand a devices file into `Device`s and `Pipeline`s, applying the
/// `*`-in-pipeline-name wildcard expansion: a wildcard pipeline names
/// exactly one device whose `channel` is `ChannelSpec::Each`, and is
/// materialised once per channel of that device with `*` replaced by the
/// channel id.
pub fn build_devices_and_pipelines(
    file: &DevicesFile,
) -> Result<(BTreeMap<String, Device>, BTreeMap<String, Pipeline>), StorageError> {
    let devs: BTreeMap<String, Device> = file
        .devices
        .iter()
        .map(|d| {
            (
                d.name.clone(),
                Device {
                    name: d.name.clone(),
                    driver: d.driver.clone(),
                    address: d.address.clone(),
                    channels: d.channels.clone(),
                    capabilities: d.capabilities.clone(),
                    pollrate_ms: d.pollrate_ms,
                },
            )
        })
        .collect();

    let mut pips = BTreeMap::new();
    for raw in &file.pipelines {
        if raw.name.contains('*') {
            if raw.devices.len() != 1 {
                return Err(StorageError::WildcardTooManyComponents(raw.name.clone()));
            }
            let comp = &raw.devices[0];
            let dev = devs
                .get(&comp.name)
                .ok_or_else(|| StorageError::UnknownComponent { name: raw.name.clone(), component: comp.name.clone() })?;
            for &channel in &dev.channels {
                let name = raw.name.replacen('*', &channel.to_string(), 1);
                let mut devmap = indexmap::IndexMap::new();
                devmap.insert(
                    comp.tag.clone(),
                    Component { name: dev.name.clone(), address: dev.address.clone(), channel, role: comp.tag.clone() },
                );
                pips.insert(name.clone(), Pipeline { name, ready: false, jobid: None, sampleid: None, devs: devmap });
            }
        } else {
            let mut devmap = indexmap::IndexMap::new();
            for comp in &raw.devices {
                let dev = devs.get(&comp.name).ok_or_else(|| StorageError::UnknownComponent {
                    name: raw.name.clone(),
                    component: comp.name.clone(),
                })?;
                let channel = match comp.channel {
                    ChannelSpec::One(c) => c,
                    ChannelSpec::Each => {
                        return Err(StorageError::WildcardTooManyComponents(raw.name.clone()))
                    }
                };
                devmap.insert(
                    comp.tag.clone(),
                    Component { name: dev.name.clone(), address: dev.address.clone(), channel, role: comp.tag.clone() },
                );
            }
            pips.insert(
                raw.name.clone(),
                Pipeline { name: raw.name.clone(), ready: false, jobid: None, sampleid: None, devs: devmap },
            );
        }
    }
    Ok((devs, pips))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
