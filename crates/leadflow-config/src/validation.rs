// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as bind hosts, offsets, caps, and secret lengths.

use crate::diagnostic::ConfigError;
use crate::model::{LeadflowConfig, parse_utc_offset};

/// Hard ceiling for the per-lead email cap.
pub const MAX_EMAILS_CEILING: usize = 100;

/// Longest accepted bearer token lifetime (one year).
pub const MAX_TOKEN_TTL_HOURS: u64 = 24 * 365;

/// Upper bound for `intake.pending_user_ttl_hours`.
pub const MAX_PENDING_TTL_HOURS: u64 = 24 * 365;

/// Minimum token secret length in bytes.
pub const MIN_TOKEN_SECRET_LEN: usize = 32;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &LeadflowConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let host = config.gateway.host.trim();
    if host.is_empty() {
        fail("gateway.host must not be empty".to_string());
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            fail(format!(
                "gateway.host `{host}` is not a valid IP address or hostname"
            ));
        }
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let intake = &config.intake;
    if intake.max_emails < 1 || intake.max_emails > MAX_EMAILS_CEILING {
        fail(format!(
            "intake.max_emails must be between 1 and {MAX_EMAILS_CEILING}, got {}",
            intake.max_emails
        ));
    }
    if intake.max_phones < 1 {
        fail("intake.max_phones must be at least 1".to_string());
    }
    if intake.max_comment_len < 1 {
        fail("intake.max_comment_len must be at least 1".to_string());
    }
    if parse_utc_offset(&intake.utc_offset).is_none() {
        fail(format!(
            "intake.utc_offset `{}` must look like +HH:MM or -HH:MM",
            intake.utc_offset
        ));
    }
    let pending_ttl = intake.pending_user_ttl_hours;
    if pending_ttl == 0 || pending_ttl > MAX_PENDING_TTL_HOURS {
        fail(format!(
            "intake.pending_user_ttl_hours must be between 1 and {MAX_PENDING_TTL_HOURS}, got {pending_ttl}"
        ));
    }

    let ttl = config.gateway.token_ttl_hours;
    if ttl == 0 || ttl > MAX_TOKEN_TTL_HOURS {
        fail(format!(
            "gateway.token_ttl_hours must be between 1 and {MAX_TOKEN_TTL_HOURS}, got {ttl}"
        ));
    }
    if let Some(secret) = &config.gateway.token_secret
        && secret.len() < MIN_TOKEN_SECRET_LEN
    {
        fail(format!(
            "gateway.token_secret must be at least {MIN_TOKEN_SECRET_LEN} bytes"
        ));
    }

    if let Some(email) = &config.bootstrap.admin_email
        && !email.contains('@')
    {
        fail(format!("bootstrap.admin_email `{email}` is not an email address"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
