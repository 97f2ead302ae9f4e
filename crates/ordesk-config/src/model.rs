// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Ordesk.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Ordesk configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OrdeskConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Round-robin assignment settings.
    #[serde(default)]
    pub assignment: AssignmentConfig,

    /// Chat channel provisioning settings.
    #[serde(default)]
    pub chat: ChatConfig,

    /// CRM synchronization settings.
    #[serde(default)]
    pub crm: CrmConfig,

    /// Checkout and duplicate-order guard settings.
    #[serde(default)]
    pub checkout: CheckoutConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Name used in logs and the health endpoint.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "ordesk".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("ordesk").join("ordesk.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("ordesk.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Bind host.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bearer token required on every `/v1` route. `None` rejects all requests.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
            bearer_token: None,
        }
    }
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    3180
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AssignmentConfig {
    /// Name of the persisted round-robin cursor row.
    #[serde(default = "default_cursor_name")]
    pub cursor_name: String,
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self {
            cursor_name: default_cursor_name(),
        }
    }
}

fn default_cursor_name() -> String {
    "support".to_string()
}

/// Chat channel provisioning configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    /// Upper bound on a single channel creation request.
    #[serde(default = "default_channel_timeout_ms")]
    pub channel_timeout_ms: u64,

    /// Interval between placeholder backfill sweeps. 0 disables the loop.
    #[serde(default = "default_backfill_interval_secs")]
    pub backfill_interval_secs: u64,

    /// Prefix of the placeholder channel id stored until a real one exists.
    #[serde(default = "default_placeholder_prefix")]
    pub placeholder_prefix: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            channel_timeout_ms: default_channel_timeout_ms(),
            backfill_interval_secs: default_backfill_interval_secs(),
            placeholder_prefix: default_placeholder_prefix(),
        }
    }
}

fn default_channel_timeout_ms() -> u64 {
    3_000
}

fn default_backfill_interval_secs() -> u64 {
    60
}

fn default_placeholder_prefix() -> String {
    "pending-".to_string()
}

/// CRM synchronization configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CrmConfig {
    /// Forward ticket events to the webhook.
    #[serde(default)]
    pub enabled: bool,

    /// Webhook endpoint receiving ticket events as JSON.
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Request timeout for a single webhook call.
    #[serde(default = "default_crm_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            webhook_url: None,
            timeout_secs: default_crm_timeout_secs(),
        }
    }
}

fn default_crm_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CheckoutConfig {
    /// Window during which an identical cart item is rejected as a duplicate.
    #[serde(default = "default_duplicate_window_secs")]
    pub duplicate_window_secs: u64,

    /// Maximum number of items in one checkout.
    #[serde(default = "default_max_items")]
    pub max_items: usize,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            duplicate_window_secs: default_duplicate_window_secs(),
            max_items: default_max_items(),
        }
    }
}

fn default_duplicate_window_secs() -> u64 {
    10
}

fn default_max_items() -> usize {
    20
}
