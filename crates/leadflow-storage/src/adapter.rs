// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the storage traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use leadflow_config::model::StorageConfig;
use leadflow_core::{
    HealthStatus, Lead, LeadFilter, LeadId, LeadOrder, LeadStore, LeadflowError, LqStatus, Page,
    PluginAdapter, Role, SequenceStore, Stage, StorageAdapter, User, UserFilter, UserId,
    UserOrder, UserStore,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed store.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`StorageAdapter::initialize`].
pub struct SqliteStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStore {
    /// Create a new store with the given configuration.
    ///
    /// The database connection is not opened until [`StorageAdapter::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, LeadflowError> {
        self.db.get().ok_or_else(|| LeadflowError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    async fn checkpoint(&self, db: &Database) -> Result<(), LeadflowError> {
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, LeadflowError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> { conn.execute_batch("SELECT 1;") })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LeadflowError> {
        if let Some(db) = self.db.get() {
            self.checkpoint(db).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStore {
    async fn initialize(&self) -> Result<(), LeadflowError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| LeadflowError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), LeadflowError> {
        let db = self.db()?;
        self.checkpoint(db).await
    }
}

#[async_trait]
impl LeadStore for SqliteStore {
    async fn insert_lead(&self, lead: &Lead) -> Result<(), LeadflowError> {
        queries::leads::insert_lead(self.db()?, lead).await
    }

    async fn get_lead(&self, id: &LeadId) -> Result<Option<Lead>, LeadflowError> {
        queries::leads::get_lead(self.db()?, id).await
    }

    async fn save_lead(&self, lead: &Lead) -> Result<(), LeadflowError> {
        queries::leads::save_lead(self.db()?, lead).await
    }

    async fn save_leads_batch(
        &self,
        expected: Stage,
        leads: &[Lead],
    ) -> Result<usize, LeadflowError> {
        queries::leads::save_leads_batch(self.db()?, expected, leads).await
    }

    async fn list_leads(
        &self,
        filter: &LeadFilter,
        order: LeadOrder,
        page: Option<Page>,
    ) -> Result<Vec<Lead>, LeadflowError> {
        queries::leads::list_leads(self.db()?, filter, order, page).await
    }

    async fn count_leads(&self, filter: &LeadFilter) -> Result<u64, LeadflowError> {
        queries::leads::count_leads(self.db()?, filter).await
    }

    async fn count_by_lq_status(
        &self,
        filter: &LeadFilter,
    ) -> Result<Vec<(LqStatus, u64)>, LeadflowError> {
        queries::leads::count_by_lq_status(self.db()?, filter).await
    }

    async fn existing_emails(&self, normalized: &[String]) -> Result<Vec<String>, LeadflowError> {
        queries::leads::existing_emails(self.db()?, normalized).await
    }

    async fn existing_phones(&self, normalized: &[String]) -> Result<Vec<String>, LeadflowError> {
        queries::leads::existing_phones(self.db()?, normalized).await
    }
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn insert_user(&self, user: &User) -> Result<(), LeadflowError> {
        if queries::users::insert_user(self.db()?, user).await? {
            Ok(())
        } else {
            Err(LeadflowError::invalid("email", "Email already registered"))
        }
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>, LeadflowError> {
        queries::users::get_user(self.db()?, id).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, LeadflowError> {
        queries::users::find_user_by_email(self.db()?, email).await
    }

    async fn list_users(
        &self,
        filter: &UserFilter,
        order: UserOrder,
    ) -> Result<Vec<User>, LeadflowError> {
        queries::users::list_users(self.db()?, filter, order).await
    }

    async fn update_user(&self, user: &User) -> Result<(), LeadflowError> {
        queries::users::update_user(self.db()?, user).await
    }

    async fn approve_pending_user(
        &self,
        id: &UserId,
        role: Role,
        approved_by: &UserId,
        at: DateTime<Utc>,
    ) -> Result<Option<User>, LeadflowError> {
        queries::users::approve_pending_user(self.db()?, id, role, approved_by, at).await
    }

    async fn delete_pending_user(&self, id: &UserId) -> Result<bool, LeadflowError> {
        queries::users::delete_pending_user(self.db()?, id).await
    }

    async fn set_reports_to(
        &self,
        ids: &[UserId],
        manager: Option<&UserId>,
    ) -> Result<usize, LeadflowError> {
        queries::users::set_reports_to(self.db()?, ids, manager).await
    }

    async fn purge_expired_pending_users(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<usize, LeadflowError> {
        queries::users::purge_expired_pending_users(self.db()?, cutoff).await
    }
}

#[async_trait]
impl SequenceStore for SqliteStore {
    async fn next_block(&self, key: &str, size: u64) -> Result<u64, LeadflowError> {
        queries::counters::next_block(self.db()?, key, size).await
    }
}
