// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Accounts and bearer authentication for the Leadflow service.
//!
//! Passwords are stored as Argon2id PHC strings. Bearer tokens are
//! HMAC-SHA256 signed and expire after the configured TTL; every request
//! re-reads the account so approval changes take effect immediately.

pub mod accounts;
pub mod password;
pub mod token;

pub use accounts::{
    Accounts, BootstrapOutcome, LoginRequest, MIN_PASSWORD_LEN, Session, SignupRequest,
};
pub use password::Passwords;
pub use token::{IssuedToken, TokenSigner};
