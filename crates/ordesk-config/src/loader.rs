// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./ordesk.toml` > `~/.config/ordesk/ordesk.toml` > `/etc/ordesk/ordesk.toml`
//! with environment variable overrides via `ORDESK_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::OrdeskConfig;

pub(crate) const SYSTEM_CONFIG: &str = "/etc/ordesk/ordesk.toml";
pub(crate) const LOCAL_CONFIG: &str = "ordesk.toml";

/// Config sections that environment variables may address.
const SECTIONS: &[&str] = &[
    "service",
    "storage",
    "gateway",
    "assignment",
    "chat",
    "crm",
    "checkout",
];

pub(crate) fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("ordesk/ordesk.toml"))
        .unwrap_or_default()
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/ordesk/ordesk.toml` (system-wide)
/// 3. `~/.config/ordesk/ordesk.toml` (user XDG config)
/// 4. `./ordesk.toml` (local directory)
/// 5. `ORDESK_*` environment variables
pub fn load_config() -> Result<OrdeskConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<OrdeskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(OrdeskConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<OrdeskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(OrdeskConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The full layered Figment, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(OrdeskConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Map `ORDESK_<SECTION>_<KEY>` onto `<section>.<key>`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `ORDESK_GATEWAY_BEARER_TOKEN` lands on `gateway.bearer_token`.
fn env_provider() -> Env {
    Env::prefixed("ORDESK_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
