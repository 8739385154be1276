// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signup, login, bearer authentication and the initial Super Admin.

use std::sync::Arc;

use chrono::Utc;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use leadflow_config::BootstrapConfig;
use leadflow_core::{
    Caller, LeadflowError, Role, Store, User, UserFilter, UserId, UserOrder, UserStatus,
};
use leadflow_pipeline::normalize::{is_valid_email, normalize_email};

use crate::password::Passwords;
use crate::token::TokenSigner;

/// Shortest accepted password, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// A successful login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    /// Token lifetime, e.g. `12h`.
    pub expires_in: String,
    pub user: User,
}

/// What `bootstrap_super_admin` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// An approved Super Admin already exists; nothing changed.
    AlreadyPresent,
    /// An existing account with the bootstrap email was promoted.
    Promoted(UserId),
    Created(UserId),
}

/// Account operations backed by the user store.
#[derive(Clone)]
pub struct Accounts {
    store: Arc<dyn Store>,
    signer: Arc<TokenSigner>,
    passwords: Passwords,
    allowed_domain: Option<String>,
}

impl Accounts {
    pub fn new(
        store: Arc<dyn Store>,
        signer: Arc<TokenSigner>,
        passwords: Passwords,
        allowed_domain: Option<String>,
    ) -> Self {
        let allowed_domain = allowed_domain
            .map(|d| d.trim().trim_start_matches('@').to_lowercase())
            .filter(|d| !d.is_empty());
        Self {
            store,
            signer,
            passwords,
            allowed_domain,
        }
    }

    pub fn signer(&self) -> &Arc<TokenSigner> {
        &self.signer
    }

    fn check_email(&self, email: &str) -> Result<(), LeadflowError> {
        if !is_valid_email(email) {
            return Err(LeadflowError::invalid("email", "Invalid email"));
        }
        if let Some(domain) = &self.allowed_domain
            && !email.ends_with(&format!("@{domain}"))
        {
            return Err(LeadflowError::invalid(
                "email",
                format!("Only @{domain} emails are allowed"),
            ));
        }
        Ok(())
    }

    /// Runs argon2 on the blocking pool.
    async fn hash(&self, password: SecretString) -> Result<String, LeadflowError> {
        let passwords = self.passwords.clone();
        tokio::task::spawn_blocking(move || passwords.hash(&password))
            .await
            .map_err(|e| LeadflowError::Internal(format!("hashing task failed: {e}")))?
    }

    async fn verify(&self, password: SecretString, stored: String) -> Result<bool, LeadflowError> {
        let passwords = self.passwords.clone();
        tokio::task::spawn_blocking(move || passwords.verify(&password, &stored))
            .await
            .map_err(|e| LeadflowError::Internal(format!("verify task failed: {e}")))
    }

    /// Records a PENDING signup request. The role is chosen on approval.
    pub async fn signup(&self, request: SignupRequest) -> Result<User, LeadflowError> {
        let name = request.name.trim().to_string();
        let email = normalize_email(&request.email);
        if name.is_empty()
            || email.is_empty()
            || request.password.is_empty()
            || request.confirm_password.is_empty()
        {
            return Err(LeadflowError::invalid("body", "All fields are required"));
        }
        self.check_email(&email)?;
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(LeadflowError::invalid(
                "password",
                format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
            ));
        }
        if request.password != request.confirm_password {
            return Err(LeadflowError::invalid(
                "confirmPassword",
                "Passwords do not match",
            ));
        }
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(LeadflowError::invalid("email", "Email already registered"));
        }

        let password_hash = self.hash(SecretString::from(request.password)).await?;
        let user = User {
            id: UserId::generate(),
            name,
            email,
            role: None,
            status: UserStatus::Pending,
            password_hash,
            reports_to: None,
            approved_by: None,
            approved_at: None,
            created_at: Utc::now(),
        };
        self.store.insert_user(&user).await?;
        info!(user_id = %user.id, "signup request recorded");
        Ok(user)
    }

    /// Issues a token for an approved account.
    pub async fn login(&self, request: LoginRequest) -> Result<Session, LeadflowError> {
        let email = normalize_email(&request.email);
        if email.is_empty() || request.password.is_empty() {
            return Err(LeadflowError::invalid(
                "body",
                "Email and password are required",
            ));
        }
        self.check_email(&email)?;

        let Some(user) = self.store.find_user_by_email(&email).await? else {
            debug!("login for unknown email");
            return Err(LeadflowError::Unauthenticated(INVALID_CREDENTIALS.into()));
        };
        if user.status != UserStatus::Approved {
            return Err(LeadflowError::Forbidden(
                "Your account is not approved yet".into(),
            ));
        }
        let matches = self
            .verify(SecretString::from(request.password), user.password_hash.clone())
            .await?;
        if !matches {
            warn!(user_id = %user.id, "login with wrong password");
            return Err(LeadflowError::Unauthenticated(INVALID_CREDENTIALS.into()));
        }

        let issued = self.signer.issue(&user.id, Utc::now())?;
        info!(user_id = %user.id, "login");
        Ok(Session {
            token: issued.token,
            expires_in: format!("{}h", self.signer.ttl().num_hours()),
            user,
        })
    }

    /// Resolves a bearer token to the acting caller.
    ///
    /// The account must still be APPROVED and hold a role; a token outlives
    /// neither a deletion nor a demotion.
    pub async fn authenticate(&self, token: &str) -> Result<Caller, LeadflowError> {
        let id = self.signer.verify(token, Utc::now())?;
        let user = self
            .store
            .get_user(&id)
            .await?
            .ok_or_else(|| LeadflowError::Unauthenticated("User not found".into()))?;
        if user.status != UserStatus::Approved {
            return Err(LeadflowError::Forbidden(
                "Your account is not approved yet".into(),
            ));
        }
        let role = user
            .role
            .ok_or_else(|| LeadflowError::Forbidden("No role assigned".into()))?;
        Ok(Caller::new(user.id, role))
    }

    /// Ensures an approved Super Admin exists.
    ///
    /// Does nothing when one already does. Otherwise promotes the account
    /// with the bootstrap email, or creates it.
    pub async fn bootstrap_super_admin(
        &self,
        config: &BootstrapConfig,
    ) -> Result<BootstrapOutcome, LeadflowError> {
        let existing = self
            .store
            .list_users(
                &UserFilter {
                    role: Some(Role::SuperAdmin),
                    status: Some(UserStatus::Approved),
                    reports_to: None,
                },
                UserOrder::Id,
            )
            .await?;
        if !existing.is_empty() {
            debug!("super admin already present");
            return Ok(BootstrapOutcome::AlreadyPresent);
        }

        let email = config
            .admin_email
            .as_deref()
            .map(normalize_email)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| LeadflowError::Config("bootstrap.admin_email is not set".into()))?;
        if !is_valid_email(&email) {
            return Err(LeadflowError::Config(format!(
                "bootstrap.admin_email `{email}` is not a valid email"
            )));
        }
        let now = Utc::now();

        if let Some(mut user) = self.store.find_user_by_email(&email).await? {
            user.role = Some(Role::SuperAdmin);
            user.status = UserStatus::Approved;
            user.approved_at = Some(now);
            self.store.update_user(&user).await?;
            info!(user_id = %user.id, "existing account promoted to super admin");
            return Ok(BootstrapOutcome::Promoted(user.id));
        }

        let password = config
            .admin_password
            .as_ref()
            .filter(|p| p.chars().count() >= MIN_PASSWORD_LEN)
            .ok_or_else(|| {
                LeadflowError::Config(format!(
                    "bootstrap.admin_password must be set and at least {MIN_PASSWORD_LEN} characters"
                ))
            })?;
        let password_hash = self.hash(SecretString::from(password.clone())).await?;
        let user = User {
            id: UserId::generate(),
            name: config
                .admin_name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .unwrap_or("Super Admin")
                .to_string(),
            email,
            role: Some(Role::SuperAdmin),
            status: UserStatus::Approved,
            password_hash,
            reports_to: None,
            approved_by: None,
            approved_at: Some(now),
            created_at: now,
        };
        self.store.insert_user(&user).await?;
        info!(user_id = %user.id, "super admin created");
        Ok(BootstrapOutcome::Created(user.id))
    }
}
