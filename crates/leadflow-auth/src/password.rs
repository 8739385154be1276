// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Argon2id password hashing.
//!
//! Hashes are stored as PHC strings, so the parameters travel with each hash
//! and a later change of cost settings does not invalidate old accounts.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};

use leadflow_core::LeadflowError;

/// Argon2id hasher with fixed cost parameters.
#[derive(Debug, Clone)]
pub struct Passwords {
    params: Params,
}

impl Default for Passwords {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl Passwords {
    /// Custom cost parameters (memory in KiB, iterations, lanes).
    pub fn with_params(
        memory_cost: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self, LeadflowError> {
        let params = Params::new(memory_cost, iterations, parallelism, None)
            .map_err(|e| LeadflowError::Config(format!("invalid Argon2id parameters: {e}")))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hashes `password` with a fresh random salt into a PHC string.
    pub fn hash(&self, password: &SecretString) -> Result<String, LeadflowError> {
        let mut salt = [0u8; 16];
        rand::rngs::OsRng.fill_bytes(&mut salt);
        let salt = SaltString::encode_b64(&salt)
            .map_err(|e| LeadflowError::Internal(format!("failed to encode salt: {e}")))?;
        let hash = self
            .argon2()
            .hash_password(password.expose_secret().as_bytes(), &salt)
            .map_err(|e| LeadflowError::Internal(format!("Argon2id hashing failed: {e}")))?;
        Ok(hash.to_string())
    }

    /// Checks `password` against a stored PHC string.
    ///
    /// A malformed stored hash never matches.
    pub fn verify(&self, password: &SecretString, stored: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored) else {
            return false;
        };
        self.argon2()
            .verify_password(password.expose_secret().as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> Passwords {
        // Low cost for fast tests.
        Passwords::with_params(1024, 1, 1).unwrap()
    }

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[test]
    fn hash_then_verify() {
        let passwords = fast();
        let hash = passwords.hash(&secret("correct horse")).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(passwords.verify(&secret("correct horse"), &hash));
        assert!(!passwords.verify(&secret("wrong horse"), &hash));
    }

    #[test]
    fn salts_differ_per_hash() {
        let passwords = fast();
        let a = passwords.hash(&secret("same")).unwrap();
        let b = passwords.hash(&secret("same")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn hashes_verify_across_cost_settings() {
        let hash = fast().hash(&secret("pw123456")).unwrap();
        let other = Passwords::with_params(2048, 2, 1).unwrap();
        assert!(other.verify(&secret("pw123456"), &hash));
    }

    #[test]
    fn malformed_hash_never_matches() {
        assert!(!fast().verify(&secret("x"), "not-a-phc-string"));
        assert!(!fast().verify(&secret("x"), ""));
    }

    #[test]
    fn zero_memory_is_rejected() {
        assert!(Passwords::with_params(0, 1, 1).is_err());
    }
}
