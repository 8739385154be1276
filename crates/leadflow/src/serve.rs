// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `leadflow serve` command implementation.
//!
//! Opens the SQLite store, wires the pipeline, user directory and accounts
//! into the gateway, and runs until SIGINT/SIGTERM. A background task
//! purges signup requests left pending past their TTL.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use leadflow_auth::{Accounts, BootstrapOutcome, Passwords, TokenSigner};
use leadflow_config::LeadflowConfig;
use leadflow_core::{LeadflowError, PluginAdapter, StorageAdapter, UserStore};
use leadflow_gateway::{GatewayState, ServerConfig};
use leadflow_pipeline::{LeadPipeline, UserDirectory};
use leadflow_storage::SqliteStore;

use crate::shutdown;

/// How often expired signup requests are swept.
const PURGE_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Everything the commands need, built from one config.
pub(crate) struct Services {
    pub store: Arc<SqliteStore>,
    pub pipeline: LeadPipeline,
    pub directory: UserDirectory,
    pub accounts: Accounts,
    pub signer: Arc<TokenSigner>,
}

impl Services {
    pub async fn open(config: &LeadflowConfig) -> Result<Self, LeadflowError> {
        let store = Arc::new(SqliteStore::new(config.storage.clone()));
        store.initialize().await?;
        debug!(path = %config.storage.database_path, "storage initialized");

        let pipeline = LeadPipeline::new(store.clone(), &config.intake)?;
        let directory = UserDirectory::new(store.clone());
        let signer = Arc::new(TokenSigner::from_config(&config.gateway));
        let accounts = Accounts::new(
            store.clone(),
            signer.clone(),
            Passwords::default(),
            config.gateway.allowed_email_domain.clone(),
        );

        Ok(Self {
            store,
            pipeline,
            directory,
            accounts,
            signer,
        })
    }

    pub async fn close(&self) -> Result<(), LeadflowError> {
        self.signer.shutdown().await?;
        self.store.close().await
    }
}

/// Runs the `leadflow serve` command.
pub async fn run_serve(config: LeadflowConfig) -> Result<(), LeadflowError> {
    info!(name = %config.service.name, "starting leadflow serve");

    let services = Services::open(&config).await?;

    if config.bootstrap.admin_email.is_some() {
        match services
            .accounts
            .bootstrap_super_admin(&config.bootstrap)
            .await
        {
            Ok(outcome) => log_bootstrap(&outcome),
            Err(e) => warn!(error = %e, "super admin bootstrap skipped"),
        }
    }

    let cancel = shutdown::install_signal_handler();

    // Bounded by config validation.
    let ttl = chrono::Duration::hours(
        i64::try_from(config.intake.pending_user_ttl_hours).unwrap_or(24),
    );
    let purge = tokio::spawn(run_purge_loop(
        services.store.clone(),
        ttl,
        PURGE_INTERVAL,
        cancel.clone(),
    ));

    let state = GatewayState::new(
        services.pipeline.clone(),
        services.directory.clone(),
        services.accounts.clone(),
    );
    let server_config = ServerConfig::from(&config.gateway);
    let server_cancel = cancel.clone();
    let served = leadflow_gateway::start_server(&server_config, state, async move {
        server_cancel.cancelled().await;
    })
    .await;

    cancel.cancel();
    if let Err(e) = purge.await {
        error!(error = %e, "purge task panicked");
    }
    services.close().await?;
    info!("leadflow stopped");
    served
}

pub(crate) fn log_bootstrap(outcome: &BootstrapOutcome) {
    match outcome {
        BootstrapOutcome::AlreadyPresent => debug!("super admin already present"),
        BootstrapOutcome::Promoted(id) => info!(user_id = %id, "super admin promoted"),
        BootstrapOutcome::Created(id) => info!(user_id = %id, "super admin created"),
    }
}

/// Deletes signup requests still pending `ttl` after creation.
pub(crate) async fn purge_expired_requests(
    store: &dyn UserStore,
    ttl: chrono::Duration,
    now: DateTime<Utc>,
) -> Result<usize, LeadflowError> {
    let purged = store.purge_expired_pending_users(now - ttl).await?;
    if purged > 0 {
        info!(count = purged, "expired signup requests purged");
    }
    Ok(purged)
}

async fn run_purge_loop(
    store: Arc<SqliteStore>,
    ttl: chrono::Duration,
    every: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(every);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(e) = purge_expired_requests(store.as_ref(), ttl, Utc::now()).await {
                    warn!(error = %e, "pending request purge failed");
                }
            }
        }
    }
    debug!("purge task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_auth::SignupRequest;
    use leadflow_test_utils::{TEST_PASSWORD, TestHarness};
    use tracing_test::traced_test;

    async fn pending_signup(harness: &TestHarness, name: &str) {
        harness
            .accounts
            .signup(SignupRequest {
                name: name.to_string(),
                email: harness.email_for(name),
                password: TEST_PASSWORD.to_string(),
                confirm_password: TEST_PASSWORD.to_string(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    #[traced_test]
    async fn purge_removes_stale_requests_and_logs() {
        let harness = TestHarness::new().await.unwrap();
        pending_signup(&harness, "Stale Signup").await;

        let ttl = chrono::Duration::hours(24);
        let fresh = purge_expired_requests(harness.store.as_ref(), ttl, Utc::now())
            .await
            .unwrap();
        assert_eq!(fresh, 0);
        assert!(!logs_contain("expired signup requests purged"));

        let later = Utc::now() + chrono::Duration::hours(25);
        let purged = purge_expired_requests(harness.store.as_ref(), ttl, later)
            .await
            .unwrap();
        assert_eq!(purged, 1);
        assert!(logs_contain("expired signup requests purged"));
        assert!(harness.directory.pending_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn purge_keeps_approved_users() {
        let harness = TestHarness::new().await.unwrap();
        harness
            .approved_user("Dana Miner", leadflow_core::Role::DataMiner)
            .await
            .unwrap();

        let later = Utc::now() + chrono::Duration::days(30);
        let ttl = chrono::Duration::hours(1);
        let purged = purge_expired_requests(harness.store.as_ref(), ttl, later)
            .await
            .unwrap();
        assert_eq!(purged, 0);
    }

    #[tokio::test]
    async fn purge_loop_stops_on_cancel() {
        let harness = TestHarness::new().await.unwrap();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_purge_loop(
            harness.store.clone(),
            chrono::Duration::hours(24),
            Duration::from_millis(10),
            cancel.clone(),
        ));
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn services_open_and_close_on_a_fresh_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = LeadflowConfig::default();
        config.storage.database_path =
            dir.path().join("serve.db").to_string_lossy().into_owned();

        let services = Services::open(&config).await.unwrap();
        assert!(services.directory.pending_requests().await.unwrap().is_empty());
        services.close().await.unwrap();
    }
}
