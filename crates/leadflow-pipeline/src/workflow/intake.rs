// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data Miner intake: lead creation, live duplicate checks and stats.

use serde::Serialize;
use tracing::{info, warn};

use leadflow_core::{
    Caller, Lead, LeadEmail, LeadFilter, LeadId, LeadflowError, LqStatus, PaymentStatus, Stage,
};

use super::LeadPipeline;
use crate::duplicates::LiveCheck;
use crate::validation::LeadDraft;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedLead {
    pub lead_id: LeadId,
    pub submitted_date: String,
    pub submitted_time: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DmStats {
    pub today_count: u64,
    pub month_count: u64,
}

impl LeadPipeline {
    /// Admits `draft` as a new DM-stage lead owned by `caller`.
    ///
    /// Any normalized contact already present on another lead fails the whole
    /// call with [`LeadflowError::Conflict`]; nothing is written.
    pub async fn create_lead(
        &self,
        caller: &Caller,
        draft: &LeadDraft,
    ) -> Result<CreatedLead, LeadflowError> {
        let admitted = self.rules.admit(draft)?;

        let duplicates = self
            .duplicates
            .find_duplicates(&admitted.normalized_emails(), &admitted.normalized_phones())
            .await?;
        if !duplicates.is_empty() {
            warn!(
                caller = %caller.id,
                emails = duplicates.duplicate_emails.len(),
                phones = duplicates.duplicate_phones.len(),
                "lead rejected: duplicate contacts"
            );
            return Err(LeadflowError::Conflict { duplicates });
        }

        let stamp = self.clock.now();
        let lead = Lead {
            id: LeadId::generate(),
            name: admitted.name,
            location: admitted.location,
            emails: admitted
                .emails
                .into_iter()
                .map(|c| LeadEmail::pending(c.raw, c.normalized))
                .collect(),
            phones: admitted.phones.iter().map(|c| c.raw.clone()).collect(),
            phones_normalized: admitted.phones.into_iter().map(|c| c.normalized).collect(),
            sources: admitted.sources.into_iter().take(1).collect(),
            stage: Stage::Dm,
            status: PaymentStatus::Unpaid,
            lq_status: LqStatus::Pending,
            assigned_to: None,
            assigned_to_role: None,
            assigned_at: None,
            verified_completed_at: None,
            lq_updated_at: None,
            lq_updated_by: None,
            response_source: None,
            rejection: None,
            comments: Vec::new(),
            upsales: Vec::new(),
            created_by: caller.id.clone(),
            created_at: stamp.at,
            submitted_date: stamp.date.clone(),
            submitted_time: stamp.time.clone(),
            updated_at: stamp.at,
            version: 0,
        };
        self.store.insert_lead(&lead).await?;

        info!(
            lead_id = %lead.id,
            caller = %caller.id,
            emails = lead.emails.len(),
            phones = lead.phones.len(),
            "lead created"
        );
        Ok(CreatedLead {
            lead_id: lead.id,
            submitted_date: stamp.date,
            submitted_time: stamp.time,
        })
    }

    pub async fn check_duplicate_live(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<LiveCheck, LeadflowError> {
        self.duplicates.check_live(email, phone).await
    }

    /// Leads created by `caller` today and this month, in the display offset.
    pub async fn dm_stats(&self, caller: &Caller) -> Result<DmStats, LeadflowError> {
        let today = self.clock.today();
        let (day_start, day_end) = self.clock.day_bounds(today)?;
        let (month_start, month_end) = self.clock.month_bounds(today)?;

        let window = |from, until| LeadFilter {
            created_by: Some(caller.id.clone()),
            created_from: Some(from),
            created_until: Some(until),
            ..LeadFilter::default()
        };
        let day = window(day_start, day_end);
        let month = window(month_start, month_end);

        let (today_count, month_count) = tokio::try_join!(
            self.store.count_leads(&day),
            self.store.count_leads(&month),
        )?;
        Ok(DmStats {
            today_count,
            month_count,
        })
    }
}
