// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HMAC-SHA256 signed, expiring bearer tokens.
//!
//! Wire format: `<user id>.<expiry unix seconds>.<hex signature>`, where the
//! signature covers `<user id>.<expiry>`.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use tracing::warn;

use leadflow_config::GatewayConfig;
use leadflow_config::validation::MAX_TOKEN_TTL_HOURS;
use leadflow_core::{HealthStatus, LeadflowError, PluginAdapter, UserId};

type HmacSha256 = Hmac<Sha256>;

/// Issues and checks bearer tokens.
pub struct TokenSigner {
    key: SecretString,
    ttl: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("key", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// A freshly issued token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenSigner {
    pub fn new(key: SecretString, ttl: Duration) -> Self {
        Self { key, ttl }
    }

    /// Builds a signer from `[gateway]` settings.
    ///
    /// Without a configured secret a random key is generated, so tokens do
    /// not survive a restart.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let key = match &config.token_secret {
            Some(secret) => SecretString::from(secret.clone()),
            None => {
                warn!("no gateway.token_secret configured; using an ephemeral signing key");
                let mut bytes = [0u8; 32];
                rand::rngs::OsRng.fill_bytes(&mut bytes);
                SecretString::from(hex::encode(bytes))
            }
        };
        let hours = config.token_ttl_hours.clamp(1, MAX_TOKEN_TTL_HOURS);
        Self::new(key, Duration::hours(hours as i64))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn mac(&self) -> Result<HmacSha256, LeadflowError> {
        HmacSha256::new_from_slice(self.key.expose_secret().as_bytes())
            .map_err(|e| LeadflowError::Internal(format!("invalid token key: {e}")))
    }

    /// Signs a token for `user` valid from `now` for the configured TTL.
    pub fn issue(&self, user: &UserId, now: DateTime<Utc>) -> Result<IssuedToken, LeadflowError> {
        let expires_at = now + self.ttl;
        let payload = format!("{}.{}", user.0, expires_at.timestamp());
        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());
        Ok(IssuedToken {
            token: format!("{payload}.{signature}"),
            expires_at,
        })
    }

    /// Returns the user a token was issued to.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<UserId, LeadflowError> {
        let invalid = || LeadflowError::Unauthenticated("Invalid token".into());

        let (payload, signature) = token.rsplit_once('.').ok_or_else(invalid)?;
        let (user, expiry) = payload.rsplit_once('.').ok_or_else(invalid)?;
        if user.is_empty() {
            return Err(invalid());
        }
        let signature = hex::decode(signature).map_err(|_| invalid())?;

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature).map_err(|_| invalid())?;

        let expiry: i64 = expiry.parse().map_err(|_| invalid())?;
        if now.timestamp() >= expiry {
            return Err(LeadflowError::Unauthenticated(
                "Session expired, please login again".into(),
            ));
        }
        Ok(UserId(user.to_string()))
    }
}

#[async_trait]
impl PluginAdapter for TokenSigner {
    fn name(&self) -> &str {
        "hmac-token"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, LeadflowError> {
        self.mac()?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LeadflowError> {
        Ok(())
    }
}
