// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` wires a temp SQLite database into the same services the
//! binary builds, using a low-cost password hasher so seeding users is fast.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tempfile::TempDir;

use leadflow_auth::{Accounts, Passwords, SignupRequest, TokenSigner};
use leadflow_config::{IntakeConfig, LeadflowConfig, StorageConfig};
use leadflow_core::{Caller, LeadId, LeadflowError, Role, StorageAdapter, UserId, UserStore};
use leadflow_pipeline::{LeadDraft, LeadPipeline, SourceDraft, UserDirectory};
use leadflow_storage::SqliteStore;

/// Password given to every user seeded by the harness.
pub const TEST_PASSWORD: &str = "harness-pass";

const TEST_TOKEN_SECRET: &str = "leadflow-test-harness-token-secret";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    intake: IntakeConfig,
    allowed_email_domain: Option<String>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            intake: IntakeConfig::default(),
            allowed_email_domain: None,
        }
    }

    /// Override admission limits or the display offset.
    pub fn with_intake(mut self, intake: IntakeConfig) -> Self {
        self.intake = intake;
        self
    }

    /// Restrict signups to one email domain.
    pub fn with_allowed_email_domain(mut self, domain: &str) -> Self {
        self.allowed_email_domain = Some(domain.to_string());
        self
    }

    pub async fn build(self) -> Result<TestHarness, LeadflowError> {
        let temp_dir = TempDir::new().map_err(LeadflowError::storage)?;
        let storage = StorageConfig {
            database_path: temp_dir
                .path()
                .join("test.db")
                .to_string_lossy()
                .into_owned(),
            wal_mode: true,
        };

        let store = Arc::new(SqliteStore::new(storage.clone()));
        store.initialize().await?;

        let pipeline = LeadPipeline::new(store.clone(), &self.intake)?;
        let directory = UserDirectory::new(store.clone());
        let signer = Arc::new(TokenSigner::new(
            TEST_TOKEN_SECRET.to_string().into(),
            Duration::hours(12),
        ));
        let accounts = Accounts::new(
            store.clone(),
            signer,
            Passwords::with_params(1024, 1, 1)?,
            self.allowed_email_domain.clone(),
        );

        let mut config = LeadflowConfig {
            storage,
            intake: self.intake,
            ..LeadflowConfig::default()
        };
        config.gateway.token_secret = Some(TEST_TOKEN_SECRET.to_string());
        config.gateway.allowed_email_domain = self.allowed_email_domain;

        Ok(TestHarness {
            store,
            pipeline,
            directory,
            accounts,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment backed by a temp database.
pub struct TestHarness {
    /// SQLite store (temp DB, cleaned up on drop).
    pub store: Arc<SqliteStore>,
    pub pipeline: LeadPipeline,
    pub directory: UserDirectory,
    pub accounts: Accounts,
    /// Configuration matching the services above.
    pub config: LeadflowConfig,
    _temp_dir: TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Harness with default settings.
    pub async fn new() -> Result<Self, LeadflowError> {
        Self::builder().build().await
    }

    /// Email the harness assigns to a seeded user named `name`.
    pub fn email_for(&self, name: &str) -> String {
        let local: String = name
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '.' })
            .collect();
        let domain = self
            .config
            .gateway
            .allowed_email_domain
            .as_deref()
            .map(|d| d.trim_start_matches('@'))
            .unwrap_or("leadflow.test");
        format!("{local}@{domain}")
    }

    /// Signs up `name` and approves it as `role`.
    pub async fn approved_user(&self, name: &str, role: Role) -> Result<Caller, LeadflowError> {
        let user = self
            .accounts
            .signup(SignupRequest {
                name: name.to_string(),
                email: self.email_for(name),
                password: TEST_PASSWORD.to_string(),
                confirm_password: TEST_PASSWORD.to_string(),
            })
            .await?;
        self.store
            .approve_pending_user(&user.id, role, &UserId("harness".into()), Utc::now())
            .await?
            .ok_or_else(|| LeadflowError::Internal(format!("could not approve {name}")))?;
        Ok(Caller::new(user.id, role))
    }

    /// Points `lqs` at `manager`.
    pub async fn report_to(&self, lqs: &[&Caller], manager: &Caller) -> Result<(), LeadflowError> {
        let ids: Vec<UserId> = lqs.iter().map(|c| c.id.clone()).collect();
        self.store.set_reports_to(&ids, Some(&manager.id)).await?;
        Ok(())
    }

    /// A bearer token for `caller`.
    pub fn token_for(&self, caller: &Caller) -> Result<String, LeadflowError> {
        Ok(self.accounts.signer().issue(&caller.id, Utc::now())?.token)
    }

    /// A draft with one web source.
    pub fn draft(name: &str, emails: &[&str], phones: &[&str]) -> LeadDraft {
        LeadDraft {
            name: name.to_string(),
            location: None,
            emails: emails.iter().map(|e| e.to_string()).collect(),
            phones: phones.iter().map(|p| p.to_string()).collect(),
            sources: vec![SourceDraft {
                name: "website".into(),
                link: "https://prospect.example/contact".into(),
            }],
        }
    }

    /// Creates a DM-stage lead owned by `dm`.
    pub async fn create_lead(
        &self,
        dm: &Caller,
        name: &str,
        emails: &[&str],
        phones: &[&str],
    ) -> Result<LeadId, LeadflowError> {
        let created = self
            .pipeline
            .create_lead(dm, &Self::draft(name, emails, phones))
            .await?;
        Ok(created.lead_id)
    }
}

#[cfg(test)]
mod tests {
    use leadflow_core::{LeadStore, Stage};

    use super::*;

    #[tokio::test]
    async fn seeded_users_can_log_in() {
        let harness = TestHarness::new().await.unwrap();
        let dm = harness.approved_user("Dana Miner", Role::DataMiner).await.unwrap();
        assert_eq!(harness.email_for("Dana Miner"), "dana.miner@leadflow.test");

        let session = harness
            .accounts
            .login(leadflow_auth::LoginRequest {
                email: harness.email_for("Dana Miner"),
                password: TEST_PASSWORD.into(),
            })
            .await
            .unwrap();
        let caller = harness.accounts.authenticate(&session.token).await.unwrap();
        assert_eq!(caller, dm);
    }

    #[tokio::test]
    async fn seeded_leads_start_in_dm() {
        let harness = TestHarness::new().await.unwrap();
        let dm = harness.approved_user("dm", Role::DataMiner).await.unwrap();
        let id = harness
            .create_lead(&dm, "Acme", &["ops@acme.example"], &[])
            .await
            .unwrap();
        let lead = harness.store.get_lead(&id).await.unwrap().unwrap();
        assert_eq!(lead.stage, Stage::Dm);
        assert_eq!(lead.created_by, dm.id);
    }

    #[tokio::test]
    async fn domain_restriction_applies_to_seeded_emails() {
        let harness = TestHarness::builder()
            .with_allowed_email_domain("acme.io")
            .build()
            .await
            .unwrap();
        assert_eq!(harness.email_for("Lee"), "lee@acme.io");
        harness.approved_user("Lee", Role::Verifier).await.unwrap();
    }
}
