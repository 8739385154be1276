// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Verifier stage: email review (DM -> Verifier) and the batch fan-out to
//! Lead Qualifiers (Verifier -> LQ).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use leadflow_core::{
    Caller, EmailStatus, LeadFilter, LeadId, LeadOrder, LeadflowError, Page, Role, Stage,
    UserFilter, UserOrder, UserStatus,
};

use super::LeadPipeline;
use crate::assignment::LQ_POOL;
use crate::normalize::normalize_email;
use crate::paging::LeadPage;
use crate::stage::advance;

/// Verdict for one email, keyed by its normalized address.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailDecision {
    pub normalized: String,
    pub status: EmailStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    pub updated_count: usize,
    pub stage: Stage,
}

#[derive(Debug, Clone, Serialize)]
pub struct Distribution {
    /// Leads moved to LQ.
    pub count: usize,
    /// Leads that changed under the batch and were left for the next run.
    pub skipped: usize,
}

impl LeadPipeline {
    /// DM-stage leads, newest first.
    pub async fn list_dm(&self, page: Page) -> Result<LeadPage, LeadflowError> {
        self.page_of(&LeadFilter::in_stage(Stage::Dm), LeadOrder::CreatedDesc, page)
            .await
    }

    /// Applies a decision to every email on a DM lead and moves it to Verifier.
    ///
    /// All-or-nothing: if any email lacks a decision the lead is left as is
    /// and [`LeadflowError::IncompleteReview`] reports how many are missing.
    /// A lead without emails passes with no decisions.
    pub async fn review_emails(
        &self,
        caller: &Caller,
        id: &LeadId,
        decisions: &[EmailDecision],
    ) -> Result<ReviewOutcome, LeadflowError> {
        let mut lead = self.load_in_stage(id, Stage::Dm).await?;

        let mut verdicts = HashMap::with_capacity(decisions.len());
        for decision in decisions {
            if decision.status == EmailStatus::Pending {
                return Err(LeadflowError::invalid(
                    "emails",
                    "Email status must be ACTIVE, BOUNCED or DEAD",
                ));
            }
            verdicts.insert(normalize_email(&decision.normalized), decision.status);
        }

        let missing_count = lead
            .emails
            .iter()
            .filter(|e| !verdicts.contains_key(&e.normalized))
            .count();
        if missing_count > 0 {
            return Err(LeadflowError::IncompleteReview { missing_count });
        }

        let stamp = self.clock.now();
        for email in &mut lead.emails {
            if let Some(status) = verdicts.get(&email.normalized) {
                email.status = *status;
                email.verified_by = Some(caller.id.clone());
                email.verified_at = Some(stamp.at);
            }
        }
        let updated_count = lead.emails.len();
        advance(&mut lead, Stage::Verifier, stamp.at)?;
        self.store.save_lead(&lead).await?;

        info!(lead_id = %lead.id, caller = %caller.id, updated_count, "lead verified");
        Ok(ReviewOutcome {
            updated_count,
            stage: lead.stage,
        })
    }

    /// Moves every Verifier-stage lead to LQ, round-robin over approved
    /// Lead Qualifiers in id order, oldest lead first.
    pub async fn distribute_to_qualifiers(
        &self,
        caller: &Caller,
    ) -> Result<Distribution, LeadflowError> {
        let mut leads = self
            .store
            .list_leads(&LeadFilter::in_stage(Stage::Verifier), LeadOrder::CreatedAsc, None)
            .await?;
        if leads.is_empty() {
            return Err(LeadflowError::NotFoundOrNotOwned("No leads to move".into()));
        }

        let pool = self
            .store
            .list_users(
                &UserFilter {
                    role: Some(Role::LeadQualifier),
                    status: Some(UserStatus::Approved),
                    reports_to: None,
                },
                UserOrder::Id,
            )
            .await?;
        if pool.is_empty() {
            return Err(LeadflowError::ResourceExhausted("No LQs available".into()));
        }

        let assignees = self.round_robin.assign(LQ_POOL, &pool, leads.len()).await?;
        let now = self.clock.now().at;
        for (lead, lq) in leads.iter_mut().zip(assignees) {
            lead.assigned_to = Some(lq.id.clone());
            lead.assigned_to_role = Some(Role::LeadQualifier);
            lead.assigned_at = Some(now);
            lead.verified_completed_at = Some(now);
            advance(lead, Stage::Lq, now)?;
        }

        let count = self.store.save_leads_batch(Stage::Verifier, &leads).await?;
        if count == 0 {
            return Err(LeadflowError::NotFoundOrNotOwned("No leads to move".into()));
        }
        let skipped = leads.len() - count;
        if skipped > 0 {
            warn!(skipped, "leads changed during distribution and were skipped");
        }
        info!(caller = %caller.id, count, pool_size = pool.len(), "leads distributed to LQ");
        Ok(Distribution { count, skipped })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use leadflow_core::{ErrorKind, LeadStore, UserId};

    use crate::workflow::fixtures::Fixture;

    use super::*;

    fn decide(pairs: &[(&str, EmailStatus)]) -> Vec<EmailDecision> {
        pairs
            .iter()
            .map(|(n, s)| EmailDecision {
                normalized: n.to_string(),
                status: *s,
            })
            .collect()
    }

    #[tokio::test]
    async fn partial_review_changes_nothing() {
        let fx = Fixture::new().await;
        let dm = fx.user("dm-1", Role::DataMiner).await;
        let verifier = fx.user("v-1", Role::Verifier).await;
        let id = fx.lead(&dm, &["a@x.com", "b@x.com", "c@x.com"], &[]).await;

        let err = fx
            .pipeline
            .review_emails(
                &verifier,
                &id,
                &decide(&[("a@x.com", EmailStatus::Active), ("B@X.com", EmailStatus::Dead)]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LeadflowError::IncompleteReview { missing_count: 1 }));

        let lead = fx.store.get_lead(&id).await.unwrap().unwrap();
        assert_eq!(lead.stage, Stage::Dm);
        assert!(lead.emails.iter().all(|e| e.status == EmailStatus::Pending));
    }

    #[tokio::test]
    async fn full_review_moves_to_verifier() {
        let fx = Fixture::new().await;
        let dm = fx.user("dm-1", Role::DataMiner).await;
        let verifier = fx.user("v-1", Role::Verifier).await;
        let id = fx.lead(&dm, &["a@x.com", "b@x.com"], &[]).await;

        let outcome = fx
            .pipeline
            .review_emails(
                &verifier,
                &id,
                &decide(&[("a@x.com", EmailStatus::Active), ("b@x.com", EmailStatus::Bounced)]),
            )
            .await
            .unwrap();
        assert_eq!(outcome.updated_count, 2);
        assert_eq!(outcome.stage, Stage::Verifier);

        let lead = fx.store.get_lead(&id).await.unwrap().unwrap();
        assert_eq!(lead.emails[1].status, EmailStatus::Bounced);
        assert_eq!(lead.emails[0].verified_by, Some(verifier.id.clone()));

        let again = fx
            .pipeline
            .review_emails(&verifier, &id, &[])
            .await
            .unwrap_err();
        assert_eq!(again.kind(), ErrorKind::NotFoundOrNotOwned);
    }

    #[tokio::test]
    async fn phone_only_lead_needs_no_decisions() {
        let fx = Fixture::new().await;
        let dm = fx.user("dm-1", Role::DataMiner).await;
        let verifier = fx.user("v-1", Role::Verifier).await;
        let id = fx.lead(&dm, &[], &["5550101"]).await;

        let outcome = fx.pipeline.review_emails(&verifier, &id, &[]).await.unwrap();
        assert_eq!(outcome.updated_count, 0);
        assert_eq!(outcome.stage, Stage::Verifier);
    }

    #[tokio::test]
    async fn pending_is_not_a_decision() {
        let fx = Fixture::new().await;
        let dm = fx.user("dm-1", Role::DataMiner).await;
        let verifier = fx.user("v-1", Role::Verifier).await;
        let id = fx.lead(&dm, &["a@x.com"], &[]).await;
        let err = fx
            .pipeline
            .review_emails(&verifier, &id, &decide(&[("a@x.com", EmailStatus::Pending)]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn list_dm_pages_newest_first() {
        let fx = Fixture::new().await;
        let dm = fx.user("dm-1", Role::DataMiner).await;
        for i in 0..3 {
            let email = format!("p{i}@x.com");
            fx.lead(&dm, &[email.as_str()], &[]).await;
        }
        let page = fx.pipeline.list_dm(Page { limit: 2, skip: 0 }).await.unwrap();
        assert_eq!(page.leads.len(), 2);
        assert_eq!(page.pagination.total, 3);
        assert!(page.leads[0].created_at >= page.leads[1].created_at);
    }

    async fn verified_leads(fx: &Fixture, n: usize) -> Vec<LeadId> {
        let dm = fx.user("dm-x", Role::DataMiner).await;
        let verifier = Caller::new(UserId("v-x".into()), Role::Verifier);
        let mut ids = Vec::new();
        for i in 0..n {
            let phone = (1000 + i).to_string();
            let id = fx.lead(&dm, &[], &[phone.as_str()]).await;
            fx.pipeline.review_emails(&verifier, &id, &[]).await.unwrap();
            ids.push(id);
        }
        ids
    }

    #[tokio::test]
    async fn distribution_is_round_robin() {
        let fx = Fixture::new().await;
        let admin = fx.user("admin", Role::Admin).await;
        for id in ["lq-a", "lq-b", "lq-c"] {
            fx.user(id, Role::LeadQualifier).await;
        }
        fx.user_with_status("lq-0-pending", Role::LeadQualifier, UserStatus::Pending)
            .await;
        let ids = verified_leads(&fx, 7).await;

        let dist = fx.pipeline.distribute_to_qualifiers(&admin).await.unwrap();
        assert_eq!(dist.count, 7);
        assert_eq!(dist.skipped, 0);

        let mut per_lq: HashMap<String, usize> = HashMap::new();
        for id in &ids {
            let lead = fx.store.get_lead(id).await.unwrap().unwrap();
            assert_eq!(lead.stage, Stage::Lq);
            assert_eq!(lead.assigned_to_role, Some(Role::LeadQualifier));
            assert!(lead.verified_completed_at.is_some());
            *per_lq.entry(lead.assigned_to.unwrap().0).or_default() += 1;
        }
        assert!(!per_lq.contains_key("lq-0-pending"));
        let mut counts: Vec<usize> = per_lq.values().copied().collect();
        counts.sort_unstable();
        assert_eq!(counts, vec![2, 2, 3]);

        let err = fx.pipeline.distribute_to_qualifiers(&admin).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFoundOrNotOwned);
        assert_eq!(err.to_string(), "No leads to move");
    }

    #[tokio::test]
    async fn consecutive_batches_continue_the_rotation() {
        let fx = Fixture::new().await;
        let admin = fx.user("admin", Role::Admin).await;
        fx.user("lq-a", Role::LeadQualifier).await;
        fx.user("lq-b", Role::LeadQualifier).await;

        let first = verified_leads(&fx, 1).await;
        fx.pipeline.distribute_to_qualifiers(&admin).await.unwrap();
        let dm = fx.user("dm-y", Role::DataMiner).await;
        let second = fx.lead(&dm, &[], &["2000"]).await;
        fx.pipeline.review_emails(&admin, &second, &[]).await.unwrap();
        fx.pipeline.distribute_to_qualifiers(&admin).await.unwrap();

        let a = fx.store.get_lead(&first[0]).await.unwrap().unwrap();
        let b = fx.store.get_lead(&second).await.unwrap().unwrap();
        assert_ne!(a.assigned_to, b.assigned_to);
    }

    #[tokio::test]
    async fn empty_pool_is_exhausted() {
        let fx = Fixture::new().await;
        let admin = fx.user("admin", Role::Admin).await;
        let ids = verified_leads(&fx, 2).await;

        let err = fx.pipeline.distribute_to_qualifiers(&admin).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResourceExhausted);
        let lead = fx.store.get_lead(&ids[0]).await.unwrap().unwrap();
        assert_eq!(lead.stage, Stage::Verifier);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn racing_batches_never_report_an_empty_success() {
        let fx = Fixture::new().await;
        let admin = fx.user("admin", Role::Admin).await;
        fx.user("lq-a", Role::LeadQualifier).await;
        let ids = verified_leads(&fx, 3).await;

        let (a, b) = tokio::join!(
            fx.pipeline.distribute_to_qualifiers(&admin),
            fx.pipeline.distribute_to_qualifiers(&admin),
        );
        let mut moved = 0;
        for outcome in [a, b] {
            match outcome {
                Ok(dist) => {
                    assert!(dist.count > 0);
                    moved += dist.count;
                }
                Err(e) => assert_eq!(e.kind(), ErrorKind::NotFoundOrNotOwned),
            }
        }
        assert_eq!(moved, ids.len());
    }
}
