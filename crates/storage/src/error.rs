// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error at {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    #[error("toml parse error at {path}: {source}")]
    Toml { path: PathBuf, source: toml::de::Error },

    #[error("toml serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("yaml parse error at {path}: {source}")]
    Yaml { path: PathBuf, source: serde_yaml::Error },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("settings file not found in {0}, run 'tomato init' to create one")]
    SettingsMissing(PathBuf),

    #[error("state file at {0} has schema version {1}, expected {2}")]
    SchemaMismatch(PathBuf, u32, u32),

    #[error("pipeline {name:?} references unknown component {component:?}")]
    UnknownComponent { name: String, component: String },

    #[error("more than one component in wildcard pipeline {0:?}")]
    WildcardTooManyComponents(String),
}
