// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./leadflow.toml` > `~/.config/leadflow/leadflow.toml` >
//! `/etc/leadflow/leadflow.toml` with environment variable overrides via `LEADFLOW_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::LeadflowConfig;

/// Top-level sections that environment variables may address.
const SECTIONS: &[&str] = &["service", "storage", "gateway", "intake", "bootstrap"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/leadflow/leadflow.toml` (system-wide)
/// 3. `~/.config/leadflow/leadflow.toml` (user XDG config)
/// 4. `./leadflow.toml` (local directory)
/// 5. `LEADFLOW_*` environment variables
pub fn load_config() -> Result<LeadflowConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<LeadflowConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LeadflowConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<LeadflowConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LeadflowConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(LeadflowConfig::default()))
        .merge(Toml::file("/etc/leadflow/leadflow.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("leadflow/leadflow.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("leadflow.toml"))
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `LEADFLOW_INTAKE_MAX_EMAILS` maps to `intake.max_emails`.
fn env_provider() -> Env {
    Env::prefixed("LEADFLOW_").map(|key| map_env_key(key.as_str()).into())
}

pub(crate) fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
