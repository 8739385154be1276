// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Super Admin review of Manager rejection requests.

use serde::{Deserialize, Serialize};
use tracing::info;

use leadflow_core::{Caller, Lead, LeadFilter, LeadId, LeadOrder, LeadflowError, Stage};

use super::LeadPipeline;
use crate::stage::advance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RejectionVerdict {
    /// Reject the lead for good.
    Approve,
    /// Clear the request; the lead stays with its Manager.
    Dismiss,
}

impl LeadPipeline {
    /// MANAGER-stage leads with an open rejection request, newest assignment first.
    pub async fn pending_rejections(&self) -> Result<Vec<Lead>, LeadflowError> {
        let leads = self
            .store
            .list_leads(
                &LeadFilter::in_stage(Stage::Manager),
                LeadOrder::AssignedDesc,
                None,
            )
            .await?;
        Ok(leads.into_iter().filter(|l| l.rejection.is_some()).collect())
    }

    pub async fn review_rejection(
        &self,
        caller: &Caller,
        id: &LeadId,
        verdict: RejectionVerdict,
    ) -> Result<Stage, LeadflowError> {
        let mut lead = match self.store.get_lead(id).await? {
            Some(lead) if lead.stage == Stage::Manager && lead.rejection.is_some() => lead,
            _ => {
                return Err(LeadflowError::NotFoundOrNotOwned(
                    "No pending rejection request for this lead".into(),
                ));
            }
        };

        let now = self.clock.now().at;
        match verdict {
            RejectionVerdict::Approve => advance(&mut lead, Stage::Rejected, now)?,
            RejectionVerdict::Dismiss => {
                lead.rejection = None;
                lead.updated_at = now;
            }
        }
        self.store.save_lead(&lead).await?;

        info!(lead_id = %lead.id, caller = %caller.id, ?verdict, stage = %lead.stage, "rejection reviewed");
        Ok(lead.stage)
    }
}
