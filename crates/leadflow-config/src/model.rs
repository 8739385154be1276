// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Leadflow service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Top-level Leadflow configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LeadflowConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP gateway and token settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Lead admission limits and display timezone.
    #[serde(default)]
    pub intake: IntakeConfig,

    /// Initial Super Admin account.
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

/// Service identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
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
    "leadflow".to_string()
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
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("leadflow").join("leadflow.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("leadflow.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// HTTP gateway configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Address to bind the HTTP listener to.
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// HMAC key for bearer tokens. `None` generates an ephemeral key at startup.
    #[serde(default)]
    pub token_secret: Option<String>,

    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u64,

    /// When set, signups must use an email under this domain.
    #[serde(default)]
    pub allowed_email_domain: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            token_secret: None,
            token_ttl_hours: default_token_ttl_hours(),
            allowed_email_domain: None,
        }
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field(
                "token_secret",
                &self.token_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("allowed_email_domain", &self.allowed_email_domain)
            .finish()
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_token_ttl_hours() -> u64 {
    12
}

/// Lead admission and display-time configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IntakeConfig {
    /// Maximum emails per lead.
    #[serde(default = "default_max_emails")]
    pub max_emails: usize,

    /// Maximum phones per lead.
    #[serde(default = "default_max_phones")]
    pub max_phones: usize,

    /// Maximum length of a single comment, in characters.
    #[serde(default = "default_max_comment_len")]
    pub max_comment_len: usize,

    /// Fixed UTC offset used for submitted dates and day/month buckets.
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,

    /// Hours a PENDING signup request lives before it is purged.
    #[serde(default = "default_pending_user_ttl_hours")]
    pub pending_user_ttl_hours: u64,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            max_emails: default_max_emails(),
            max_phones: default_max_phones(),
            max_comment_len: default_max_comment_len(),
            utc_offset: default_utc_offset(),
            pending_user_ttl_hours: default_pending_user_ttl_hours(),
        }
    }
}

fn default_max_emails() -> usize {
    10
}

fn default_max_phones() -> usize {
    10
}

fn default_max_comment_len() -> usize {
    1000
}

fn default_utc_offset() -> String {
    "+05:00".to_string()
}

fn default_pending_user_ttl_hours() -> u64 {
    24
}

/// Initial Super Admin account, applied by `leadflow bootstrap-admin`
/// and at server startup when fully populated.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BootstrapConfig {
    #[serde(default)]
    pub admin_email: Option<String>,

    #[serde(default)]
    pub admin_name: Option<String>,

    #[serde(default)]
    pub admin_password: Option<String>,
}

impl fmt::Debug for BootstrapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapConfig")
            .field("admin_email", &self.admin_email)
            .field("admin_name", &self.admin_name)
            .field(
                "admin_password",
                &self.admin_password.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Parses `+HH:MM` / `-HH:MM` into seconds east of UTC.
pub fn parse_utc_offset(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    let (sign, rest) = match raw.as_bytes().first()? {
        b'+' => (1, &raw[1..]),
        b'-' => (-1, &raw[1..]),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':')?;
    if hours.len() != 2 || minutes.len() != 2 {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 14 || minutes > 59 {
        return None;
    }
    Some(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = LeadflowConfig::default();
        assert_eq!(config.intake.max_emails, 10);
        assert_eq!(config.intake.max_phones, 10);
        assert_eq!(config.intake.max_comment_len, 1000);
        assert_eq!(config.intake.utc_offset, "+05:00");
        assert_eq!(config.gateway.token_ttl_hours, 12);
        assert_eq!(config.intake.pending_user_ttl_hours, 24);
    }

    #[test]
    fn debug_redacts_secrets() {
        let mut config = LeadflowConfig::default();
        config.gateway.token_secret = Some("super-secret-value".into());
        config.bootstrap.admin_password = Some("hunter2".into());
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret-value"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn parses_offsets() {
        assert_eq!(parse_utc_offset("+05:00"), Some(18_000));
        assert_eq!(parse_utc_offset("-03:30"), Some(-12_600));
        assert_eq!(parse_utc_offset("05:00"), None);
        assert_eq!(parse_utc_offset("+5"), None);
        assert_eq!(parse_utc_offset("+25:00"), None);
    }
}
