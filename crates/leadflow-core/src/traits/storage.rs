// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage traits for persistence backends (SQLite, etc.).
//!
//! The pipeline only ever talks to `Arc<dyn Store>`; each narrow trait maps
//! to one logical collection (leads, users, named counters).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::LeadflowError;
use crate::model::{Lead, User};
use crate::traits::adapter::PluginAdapter;
use crate::types::{LeadId, LqStatus, Role, Stage, UserId, UserStatus};

/// Lifecycle hooks for storage backends.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), LeadflowError>;

    /// Closes the storage backend, flushing pending writes and releasing connections.
    async fn close(&self) -> Result<(), LeadflowError>;
}

/// Offset pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub skip: u32,
}

/// Conjunctive filter over the lead collection. `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadFilter {
    pub stage: Option<Stage>,
    pub assigned_to: Option<UserId>,
    pub created_by: Option<UserId>,
    pub lq_status: Option<LqStatus>,
    /// Inclusive lower bound on `created_at`.
    pub created_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`.
    pub created_until: Option<DateTime<Utc>>,
}

impl LeadFilter {
    pub fn in_stage(stage: Stage) -> Self {
        Self {
            stage: Some(stage),
            ..Self::default()
        }
    }

    pub fn assigned(stage: Stage, user: &UserId) -> Self {
        Self {
            stage: Some(stage),
            assigned_to: Some(user.clone()),
            ..Self::default()
        }
    }
}

/// Sort order for lead listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadOrder {
    /// Newest first by creation time.
    CreatedDesc,
    /// Oldest first by creation time.
    CreatedAsc,
    /// Most recently assigned first.
    AssignedDesc,
}

/// Filter over the user collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
    pub reports_to: Option<UserId>,
}

/// Sort order for user listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserOrder {
    /// Stable id order, used for round-robin pools.
    Id,
    Name,
    CreatedDesc,
}

/// Lead collection with a multi-valued contact index.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Inserts a new lead and its contact index rows.
    async fn insert_lead(&self, lead: &Lead) -> Result<(), LeadflowError>;

    async fn get_lead(&self, id: &LeadId) -> Result<Option<Lead>, LeadflowError>;

    /// Persists `lead` if its stored version still equals `lead.version`.
    ///
    /// Returns [`LeadflowError::PreconditionFailed`] when another writer got
    /// there first. The contact index is rewritten in the same transaction.
    async fn save_lead(&self, lead: &Lead) -> Result<(), LeadflowError>;

    /// Persists every lead still in `expected` stage at its loaded version,
    /// in one transaction. Stale rows are skipped; returns how many were written.
    async fn save_leads_batch(&self, expected: Stage, leads: &[Lead])
    -> Result<usize, LeadflowError>;

    async fn list_leads(
        &self,
        filter: &LeadFilter,
        order: LeadOrder,
        page: Option<Page>,
    ) -> Result<Vec<Lead>, LeadflowError>;

    async fn count_leads(&self, filter: &LeadFilter) -> Result<u64, LeadflowError>;

    /// Lead counts grouped by `lq_status` under `filter`.
    async fn count_by_lq_status(
        &self,
        filter: &LeadFilter,
    ) -> Result<Vec<(LqStatus, u64)>, LeadflowError>;

    /// Subset of `normalized` emails already stored on any lead.
    async fn existing_emails(&self, normalized: &[String]) -> Result<Vec<String>, LeadflowError>;

    /// Subset of `normalized` phones already stored on any lead.
    async fn existing_phones(&self, normalized: &[String]) -> Result<Vec<String>, LeadflowError>;
}

/// User account collection.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user. A taken email yields [`LeadflowError::InvalidInput`].
    async fn insert_user(&self, user: &User) -> Result<(), LeadflowError>;

    async fn get_user(&self, id: &UserId) -> Result<Option<User>, LeadflowError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, LeadflowError>;

    async fn list_users(
        &self,
        filter: &UserFilter,
        order: UserOrder,
    ) -> Result<Vec<User>, LeadflowError>;

    /// Overwrites every mutable column of an existing user.
    async fn update_user(&self, user: &User) -> Result<(), LeadflowError>;

    /// Approves `id` with `role` only while it is still PENDING.
    async fn approve_pending_user(
        &self,
        id: &UserId,
        role: Role,
        approved_by: &UserId,
        at: DateTime<Utc>,
    ) -> Result<Option<User>, LeadflowError>;

    /// Hard-deletes `id` only while it is still PENDING.
    async fn delete_pending_user(&self, id: &UserId) -> Result<bool, LeadflowError>;

    /// Sets `reports_to` on the approved Lead Qualifiers among `ids`.
    async fn set_reports_to(
        &self,
        ids: &[UserId],
        manager: Option<&UserId>,
    ) -> Result<usize, LeadflowError>;

    /// Deletes PENDING users created before `cutoff`.
    async fn purge_expired_pending_users(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<usize, LeadflowError>;
}

/// Named monotonic counters backing round-robin pools.
#[async_trait]
pub trait SequenceStore: Send + Sync {
    /// Atomically advances `key` by `size` and returns the first sequence
    /// number of the reserved block.
    async fn next_block(&self, key: &str, size: u64) -> Result<u64, LeadflowError>;
}

/// Everything the pipeline needs from a backend.
pub trait Store: StorageAdapter + LeadStore + UserStore + SequenceStore {}

impl<T> Store for T where T: StorageAdapter + LeadStore + UserStore + SequenceStore {}
