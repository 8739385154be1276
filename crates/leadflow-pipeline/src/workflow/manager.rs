// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Manager stage: decisions, rejection requests and payments.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::info;

use leadflow_core::{
    Caller, LeadFilter, LeadId, LeadOrder, LeadflowError, Page, PaymentStatus, RejectionRequest,
    Stage, Upsale,
};

use super::LeadPipeline;
use crate::paging::LeadPage;
use crate::stage::advance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Accept,
    Reject,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionOutcome {
    pub stage: Stage,
    pub rejection_requested: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub total_upsell_amount: f64,
    pub upsell_entries: usize,
    pub status: PaymentStatus,
}

impl LeadPipeline {
    /// MANAGER-stage leads assigned to the caller, most recently assigned first.
    pub async fn list_manager_leads(
        &self,
        caller: &Caller,
        page: Page,
    ) -> Result<LeadPage, LeadflowError> {
        self.page_of(
            &LeadFilter::assigned(Stage::Manager, &caller.id),
            LeadOrder::AssignedDesc,
            page,
        )
        .await
    }

    /// ACCEPT closes the lead as DONE. REJECT only requests rejection.
    pub async fn decide(
        &self,
        caller: &Caller,
        id: &LeadId,
        decision: Decision,
        comment: &str,
    ) -> Result<DecisionOutcome, LeadflowError> {
        match decision {
            Decision::Reject => {
                self.request_rejection(caller, id, comment).await?;
                Ok(DecisionOutcome {
                    stage: Stage::Manager,
                    rejection_requested: true,
                })
            }
            Decision::Accept => {
                let text = self.comment_text("comment", comment)?;
                let mut lead = self.load_owned(id, Stage::Manager, caller).await?;
                let stamp = self.clock.now();
                lead.push_comment(text, &caller.id, caller.role, &stamp);
                advance(&mut lead, Stage::Done, stamp.at)?;
                self.store.save_lead(&lead).await?;
                info!(lead_id = %lead.id, caller = %caller.id, "lead accepted");
                Ok(DecisionOutcome {
                    stage: lead.stage,
                    rejection_requested: false,
                })
            }
        }
    }

    /// Flags the lead for Super Admin review. The stage does not change.
    pub async fn request_rejection(
        &self,
        caller: &Caller,
        id: &LeadId,
        comment: &str,
    ) -> Result<RejectionRequest, LeadflowError> {
        let text = self.comment_text("comment", comment)?;
        let (lead, request) = self
            .update_owned(id, Stage::Manager, caller, |lead| {
                if lead.rejection.is_some() {
                    return Err(LeadflowError::PreconditionFailed(
                        "Rejection already requested for this lead".into(),
                    ));
                }
                let stamp = self.clock.now();
                let request = RejectionRequest {
                    requested_by: caller.id.clone(),
                    requested_at: stamp.at,
                };
                lead.push_comment(text.clone(), &caller.id, caller.role, &stamp);
                lead.rejection = Some(request.clone());
                lead.updated_at = stamp.at;
                Ok(request)
            })
            .await?;

        info!(lead_id = %lead.id, caller = %caller.id, "rejection requested");
        Ok(request)
    }

    /// Appends an upsell entry and marks the lead PAID.
    ///
    /// Repeat calls on a PAID lead append another entry; the status stays PAID.
    pub async fn record_payment(
        &self,
        caller: &Caller,
        id: &LeadId,
        amount: f64,
        comment: &str,
    ) -> Result<PaymentReceipt, LeadflowError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(LeadflowError::invalid("amount", "Valid amount required"));
        }
        let text = self.comment_text("comment", comment)?;
        let (lead, ()) = self
            .update_owned(id, Stage::Manager, caller, |lead| {
                let now = self.clock.now().at;
                lead.upsales.push(Upsale {
                    amount,
                    comment: text.clone(),
                    added_by: caller.id.clone(),
                    added_at: now,
                });
                lead.status = PaymentStatus::Paid;
                lead.updated_at = now;
                Ok(())
            })
            .await?;

        let receipt = PaymentReceipt {
            total_upsell_amount: lead.total_upsell(),
            upsell_entries: lead.upsales.len(),
            status: lead.status,
        };
        info!(
            lead_id = %lead.id,
            caller = %caller.id,
            amount,
            total = receipt.total_upsell_amount,
            "payment recorded"
        );
        Ok(receipt)
    }
}
