// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stage machine operations, grouped by the role that owns each stage.
//!
//! Every operation loads the lead, checks the stage and ownership
//! precondition, mutates the in-memory copy and persists it with a
//! version-guarded save. A failed check leaves the stored lead untouched.

pub mod intake;
pub mod manager;
pub mod qualifier;
pub mod review;
pub mod verifier;

use std::sync::Arc;

use leadflow_config::IntakeConfig;
use leadflow_core::{Caller, Lead, LeadFilter, LeadId, LeadOrder, LeadflowError, Page, Stage, Store};
use tracing::debug;

use crate::assignment::RoundRobin;
use crate::clock::DisplayClock;
use crate::duplicates::DuplicateIndex;
use crate::paging::{LeadPage, PageInfo};
use crate::validation::AdmissionRules;

const NOT_OWNED: &str = "Lead not found / not assigned to you";

/// Save attempts for append-style updates before a lost race is reported.
const UPDATE_ATTEMPTS: u32 = 8;

/// Entry point for every lead operation.
#[derive(Clone)]
pub struct LeadPipeline {
    store: Arc<dyn Store>,
    rules: AdmissionRules,
    clock: DisplayClock,
    duplicates: DuplicateIndex,
    round_robin: RoundRobin,
    max_comment_len: usize,
}

impl LeadPipeline {
    pub fn new(store: Arc<dyn Store>, config: &IntakeConfig) -> Result<Self, LeadflowError> {
        Ok(Self {
            rules: AdmissionRules::from(config),
            clock: DisplayClock::from_config(config)?,
            duplicates: DuplicateIndex::new(store.clone()),
            round_robin: RoundRobin::new(store.clone()),
            max_comment_len: config.max_comment_len,
            store,
        })
    }

    pub fn clock(&self) -> &DisplayClock {
        &self.clock
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Loads `id` only if it sits in `stage`.
    async fn load_in_stage(&self, id: &LeadId, stage: Stage) -> Result<Lead, LeadflowError> {
        match self.store.get_lead(id).await? {
            Some(lead) if lead.stage == stage => Ok(lead),
            _ => Err(LeadflowError::NotFoundOrNotOwned(format!(
                "Lead not found in {stage} stage"
            ))),
        }
    }

    /// Loads `id` only if it sits in `stage` and is assigned to `caller`.
    ///
    /// Absent, wrong-stage and foreign leads are indistinguishable.
    async fn load_owned(
        &self,
        id: &LeadId,
        stage: Stage,
        caller: &Caller,
    ) -> Result<Lead, LeadflowError> {
        match self.store.get_lead(id).await? {
            Some(lead) if lead.stage == stage && lead.is_assigned_to(&caller.id) => Ok(lead),
            _ => Err(LeadflowError::NotFoundOrNotOwned(NOT_OWNED.into())),
        }
    }

    /// Loads an owned lead, applies `apply` and saves it.
    ///
    /// When another writer saves first, the lead is reloaded and `apply`
    /// runs again on the fresh copy, so concurrent appends all land. The
    /// stage and ownership check is repeated on every attempt.
    async fn update_owned<T, F>(
        &self,
        id: &LeadId,
        stage: Stage,
        caller: &Caller,
        mut apply: F,
    ) -> Result<(Lead, T), LeadflowError>
    where
        F: FnMut(&mut Lead) -> Result<T, LeadflowError> + Send,
        T: Send,
    {
        let mut attempt = 1;
        loop {
            let mut lead = self.load_owned(id, stage, caller).await?;
            let out = apply(&mut lead)?;
            match self.store.save_lead(&lead).await {
                Ok(()) => return Ok((lead, out)),
                Err(e) if e.is_concurrent_modification() && attempt < UPDATE_ATTEMPTS => {
                    debug!(lead_id = %id, attempt, "lead changed during update, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Trims a comment and enforces the length cap. Empty text is rejected.
    fn comment_text(&self, field: &str, raw: &str) -> Result<String, LeadflowError> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(LeadflowError::invalid(field, "Comment is required"));
        }
        if text.chars().count() > self.max_comment_len {
            return Err(LeadflowError::invalid(field, "Comment too long"));
        }
        Ok(text.to_string())
    }

    async fn page_of(
        &self,
        filter: &LeadFilter,
        order: LeadOrder,
        page: Page,
    ) -> Result<LeadPage, LeadflowError> {
        let (leads, total) = tokio::try_join!(
            self.store.list_leads(filter, order, Some(page)),
            self.store.count_leads(filter),
        )?;
        Ok(LeadPage {
            leads,
            pagination: PageInfo::new(page, total),
        })
    }
}
