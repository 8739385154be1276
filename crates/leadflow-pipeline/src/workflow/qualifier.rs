// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lead Qualifier stage: status, comments and the hand-off to a Manager.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tracing::info;

use leadflow_core::{
    Caller, ContactRef, Lead, LeadFilter, LeadId, LeadOrder, LeadflowError, LqStatus, ResponseSource,
    Role, Stage, UserFilter, UserId, UserOrder, UserStatus,
};

use super::LeadPipeline;
use crate::normalize::{normalize_email, normalize_phone};
use crate::paging::{PageInfo, PageRequest};
use crate::stage::advance;

/// Query parameters of the LQ lead list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LqListQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub today: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
    #[serde(default)]
    pub skip: Option<String>,
}

impl LqListQuery {
    fn today(&self) -> bool {
        matches!(
            self.today.as_deref().map(str::trim),
            Some("true") | Some("1")
        )
    }

    fn status(&self) -> Result<Option<LqStatus>, LeadflowError> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => LqStatus::from_str(raw)
                .map(Some)
                .map_err(|_| LeadflowError::invalid("status", "Invalid status filter")),
        }
    }

    fn page(&self) -> PageRequest {
        PageRequest {
            limit: self.limit.clone(),
            skip: self.skip.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LqListing {
    pub leads: Vec<Lead>,
    /// Per-status totals over the date window, ignoring the status filter.
    pub counts: BTreeMap<String, u64>,
    pub pagination: PageInfo,
}

/// Contacts the prospect answered on, plus an optional hand-off note.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(default)]
    pub selected_emails: Vec<String>,
    #[serde(default)]
    pub selected_phones: Vec<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Handoff {
    pub lead_id: LeadId,
    pub assigned_to: UserId,
    pub email_count: usize,
    pub phone_count: usize,
    pub response_source: ResponseSource,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManagerSummary {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

impl LeadPipeline {
    /// The caller's LQ-stage leads, most recently assigned first.
    pub async fn list_qualifier_leads(
        &self,
        caller: &Caller,
        query: &LqListQuery,
    ) -> Result<LqListing, LeadflowError> {
        let status = query.status()?;
        let (created_from, created_until) =
            self.clock
                .filter_range(query.today(), query.from.as_deref(), query.to.as_deref())?;
        let page = query.page().resolve();

        let window = LeadFilter {
            created_from,
            created_until,
            ..LeadFilter::assigned(Stage::Lq, &caller.id)
        };
        let filter = LeadFilter {
            lq_status: status,
            ..window.clone()
        };

        let (leads, total, grouped) = tokio::try_join!(
            self.store.list_leads(&filter, LeadOrder::AssignedDesc, Some(page)),
            self.store.count_leads(&filter),
            self.store.count_by_lq_status(&window),
        )?;

        let mut counts: BTreeMap<String, u64> =
            LqStatus::iter().map(|s| (s.to_string(), 0)).collect();
        for (status, n) in grouped {
            *counts.entry(status.to_string()).or_default() += n;
        }

        Ok(LqListing {
            leads,
            counts,
            pagination: PageInfo::new(page, total),
        })
    }

    /// Sets the qualifier disposition. PENDING is only ever the initial value.
    pub async fn set_lq_status(
        &self,
        caller: &Caller,
        id: &LeadId,
        raw: &str,
    ) -> Result<LqStatus, LeadflowError> {
        let status = LqStatus::from_str(raw.trim())
            .ok()
            .filter(|s| *s != LqStatus::Pending)
            .ok_or_else(|| LeadflowError::invalid("lqStatus", "Invalid lqStatus"))?;

        let mut lead = self.load_owned(id, Stage::Lq, caller).await?;
        let now = self.clock.now().at;
        lead.lq_status = status;
        lead.lq_updated_at = Some(now);
        lead.lq_updated_by = Some(caller.id.clone());
        lead.updated_at = now;
        self.store.save_lead(&lead).await?;

        info!(lead_id = %lead.id, caller = %caller.id, lq_status = %status, "lq status updated");
        Ok(status)
    }

    /// Appends a qualifier comment and returns the new comment count.
    pub async fn add_lq_comment(
        &self,
        caller: &Caller,
        id: &LeadId,
        text: &str,
    ) -> Result<usize, LeadflowError> {
        let text = self.comment_text("text", text)?;
        let (lead, ()) = self
            .update_owned(id, Stage::Lq, caller, |lead| {
                let stamp = self.clock.now();
                lead.push_comment(text.clone(), &caller.id, caller.role, &stamp);
                lead.lq_updated_at = Some(stamp.at);
                lead.lq_updated_by = Some(caller.id.clone());
                lead.updated_at = stamp.at;
                Ok(())
            })
            .await?;
        Ok(lead.comments.len())
    }

    /// Hands a QUALIFIED lead to the caller's reporting Manager.
    ///
    /// The lead's contacts are narrowed to the selection; unselected emails
    /// and phones are discarded.
    pub async fn submit_to_manager(
        &self,
        caller: &Caller,
        id: &LeadId,
        submission: &Submission,
    ) -> Result<Handoff, LeadflowError> {
        let note = submission
            .comment
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .map(|c| self.comment_text("comment", c))
            .transpose()?;

        let mut lead = self.load_owned(id, Stage::Lq, caller).await?;
        if lead.lq_status != LqStatus::Qualified {
            return Err(LeadflowError::PreconditionFailed(
                "Lead must be QUALIFIED before submitting to a manager".into(),
            ));
        }

        let mut email_idx: Vec<usize> = Vec::new();
        for selected in &submission.selected_emails {
            let wanted = normalize_email(selected);
            if wanted.is_empty() {
                continue;
            }
            let pos = lead
                .emails
                .iter()
                .position(|e| e.normalized == wanted)
                .ok_or_else(|| {
                    LeadflowError::invalid(
                        "selectedEmails",
                        format!("Selected email not found in this lead: {}", selected.trim()),
                    )
                })?;
            if !email_idx.contains(&pos) {
                email_idx.push(pos);
            }
        }

        let mut phone_idx: Vec<usize> = Vec::new();
        for selected in &submission.selected_phones {
            let raw = selected.trim();
            if raw.is_empty() {
                continue;
            }
            let wanted = normalize_phone(raw);
            let pos = lead
                .phones
                .iter()
                .enumerate()
                .position(|(i, stored)| {
                    stored.trim() == raw
                        || (!wanted.is_empty()
                            && lead.phones_normalized.get(i).is_some_and(|n| *n == wanted))
                })
                .ok_or_else(|| {
                    LeadflowError::invalid(
                        "selectedPhones",
                        format!("Selected phone not found in this lead: {raw}"),
                    )
                })?;
            if !phone_idx.contains(&pos) {
                phone_idx.push(pos);
            }
        }

        if email_idx.is_empty() && phone_idx.is_empty() {
            return Err(LeadflowError::invalid(
                "selectedEmails,selectedPhones",
                "Select at least one email or phone",
            ));
        }

        let manager = self.reporting_manager(&caller.id).await?;

        let stamp = self.clock.now();
        let emails: Vec<_> = email_idx.iter().map(|&i| lead.emails[i].clone()).collect();
        let phones: Vec<String> = phone_idx.iter().map(|&i| lead.phones[i].clone()).collect();
        let phones_normalized: Vec<String> = phone_idx
            .iter()
            .map(|&i| {
                lead.phones_normalized
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| normalize_phone(&lead.phones[i]))
            })
            .collect();

        let response_source = ResponseSource {
            email: emails.first().map(|e| ContactRef {
                value: e.value.clone(),
                normalized: e.normalized.clone(),
            }),
            phone: phones.first().zip(phones_normalized.first()).map(|(v, n)| ContactRef {
                value: v.clone(),
                normalized: n.clone(),
            }),
            selected_by: caller.id.clone(),
            selected_at: stamp.at,
            selected_date: stamp.date.clone(),
            selected_time: stamp.time.clone(),
        };

        lead.emails = emails;
        lead.phones = phones;
        lead.phones_normalized = phones_normalized;
        if let Some(note) = note {
            lead.push_comment(note, &caller.id, caller.role, &stamp);
        }
        lead.response_source = Some(response_source.clone());
        lead.assigned_to = Some(manager.clone());
        lead.assigned_to_role = Some(Role::Manager);
        lead.assigned_at = Some(stamp.at);
        lead.lq_updated_at = Some(stamp.at);
        lead.lq_updated_by = Some(caller.id.clone());
        advance(&mut lead, Stage::Manager, stamp.at)?;
        self.store.save_lead(&lead).await?;

        info!(
            lead_id = %lead.id,
            caller = %caller.id,
            manager = %manager,
            "lead submitted to manager"
        );
        Ok(Handoff {
            lead_id: lead.id,
            assigned_to: manager,
            email_count: lead.emails.len(),
            phone_count: lead.phones.len(),
            response_source,
        })
    }

    /// The approved Manager that `lq` reports to.
    async fn reporting_manager(&self, lq: &UserId) -> Result<UserId, LeadflowError> {
        let manager_id = self
            .store
            .get_user(lq)
            .await?
            .and_then(|u| u.reports_to)
            .ok_or_else(|| {
                LeadflowError::PreconditionFailed("No manager assigned to you".into())
            })?;
        match self.store.get_user(&manager_id).await? {
            Some(m) if m.is_approved_as(Role::Manager) => Ok(m.id),
            _ => Err(LeadflowError::PreconditionFailed(
                "Your manager is not an approved Manager".into(),
            )),
        }
    }

    /// Approved Managers by name.
    pub async fn managers(&self) -> Result<Vec<ManagerSummary>, LeadflowError> {
        let users = self
            .store
            .list_users(
                &UserFilter {
                    role: Some(Role::Manager),
                    status: Some(UserStatus::Approved),
                    reports_to: None,
                },
                UserOrder::Name,
            )
            .await?;
        Ok(users
            .into_iter()
            .map(|u| ManagerSummary {
                id: u.id,
                name: u.name,
                email: u.email,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use leadflow_core::{EmailStatus, ErrorKind, LeadStore, UserStore};

    use crate::workflow::fixtures::Fixture;
    use crate::workflow::verifier::EmailDecision;

    use super::*;

    struct Scene {
        fx: Fixture,
        lq: Caller,
        manager: Caller,
        lead: LeadId,
    }

    /// One lead with emails [a, b] and phones [p, q], assigned to `lq-1`,
    /// who reports to `mgr-1`.
    async fn scene() -> Scene {
        let fx = Fixture::new().await;
        let dm = fx.user("dm-1", Role::DataMiner).await;
        let verifier = fx.user("v-1", Role::Verifier).await;
        let lq = fx.user("lq-1", Role::LeadQualifier).await;
        let manager = fx.user("mgr-1", Role::Manager).await;
        fx.store
            .set_reports_to(&[lq.id.clone()], Some(&manager.id))
            .await
            .unwrap();

        let lead = fx
            .lead(&dm, &["A@x.com", "b@x.com"], &["+1 555 0100", "555-0199"])
            .await;
        let decisions: Vec<EmailDecision> = ["a@x.com", "b@x.com"]
            .iter()
            .map(|n| EmailDecision {
                normalized: n.to_string(),
                status: EmailStatus::Active,
            })
            .collect();
        fx.pipeline
            .review_emails(&verifier, &lead, &decisions)
            .await
            .unwrap();
        fx.pipeline.distribute_to_qualifiers(&verifier).await.unwrap();
        Scene {
            fx,
            lq,
            manager,
            lead,
        }
    }

    fn selection(emails: &[&str], phones: &[&str]) -> Submission {
        Submission {
            selected_emails: emails.iter().map(|s| s.to_string()).collect(),
            selected_phones: phones.iter().map(|s| s.to_string()).collect(),
            comment: None,
        }
    }

    #[tokio::test]
    async fn status_and_comment_stamp_lq_fields() {
        let s = scene().await;
        let status = s
            .fx
            .pipeline
            .set_lq_status(&s.lq, &s.lead, "reached")
            .await
            .unwrap();
        assert_eq!(status, LqStatus::InConversation);

        let count = s
            .fx
            .pipeline
            .add_lq_comment(&s.lq, &s.lead, "  called, will follow up ")
            .await
            .unwrap();
        assert_eq!(count, 1);

        let lead = s.fx.store.get_lead(&s.lead).await.unwrap().unwrap();
        assert_eq!(lead.comments[0].text, "called, will follow up");
        assert_eq!(lead.comments[0].created_by_role, Role::LeadQualifier);
        assert_eq!(lead.lq_updated_by, Some(s.lq.id.clone()));
        assert_eq!(lead.stage, Stage::Lq);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_comments_both_survive() {
        let s = scene().await;
        let pipeline = &s.fx.pipeline;
        let (a, b) = tokio::join!(
            pipeline.add_lq_comment(&s.lq, &s.lead, "first"),
            pipeline.add_lq_comment(&s.lq, &s.lead, "second"),
        );
        let mut counts = vec![a.unwrap(), b.unwrap()];
        counts.sort_unstable();
        assert_eq!(counts, vec![1, 2]);

        let lead = s.fx.store.get_lead(&s.lead).await.unwrap().unwrap();
        let mut texts: Vec<&str> = lead.comments.iter().map(|c| c.text.as_str()).collect();
        texts.sort_unstable();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn status_and_comment_input_checks() {
        let s = scene().await;
        for raw in ["PENDING", "bogus", ""] {
            let err = s
                .fx
                .pipeline
                .set_lq_status(&s.lq, &s.lead, raw)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
        let long = "x".repeat(1001);
        for text in ["   ", long.as_str()] {
            let err = s
                .fx
                .pipeline
                .add_lq_comment(&s.lq, &s.lead, text)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
        assert!(
            s.fx.pipeline
                .add_lq_comment(&s.lq, &s.lead, &"y".repeat(1000))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn other_qualifiers_cannot_touch_the_lead() {
        let s = scene().await;
        let intruder = s.fx.user("lq-2", Role::LeadQualifier).await;
        let err = s
            .fx
            .pipeline
            .set_lq_status(&intruder, &s.lead, "DEAD")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFoundOrNotOwned);
        assert_eq!(err.to_string(), "Lead not found / not assigned to you");
    }

    #[tokio::test]
    async fn submit_requires_qualified() {
        let s = scene().await;
        let err = s
            .fx
            .pipeline
            .submit_to_manager(&s.lq, &s.lead, &selection(&["a@x.com"], &[]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
    }

    #[tokio::test]
    async fn submit_narrows_contacts_to_selection() {
        let s = scene().await;
        s.fx.pipeline
            .set_lq_status(&s.lq, &s.lead, "QUALIFIED")
            .await
            .unwrap();

        let mut pick = selection(&[" a@X.com"], &["15550100"]);
        pick.comment = Some("replied on email".into());
        let handoff = s
            .fx
            .pipeline
            .submit_to_manager(&s.lq, &s.lead, &pick)
            .await
            .unwrap();
        assert_eq!(handoff.assigned_to, s.manager.id);
        assert_eq!(handoff.email_count, 1);
        assert_eq!(handoff.phone_count, 1);

        let lead = s.fx.store.get_lead(&s.lead).await.unwrap().unwrap();
        assert_eq!(lead.stage, Stage::Manager);
        assert_eq!(lead.assigned_to_role, Some(Role::Manager));
        assert_eq!(lead.emails.len(), 1);
        assert_eq!(lead.emails[0].value, "A@x.com");
        assert_eq!(lead.phones, vec!["+1 555 0100"]);
        assert_eq!(lead.phones_normalized, vec!["15550100"]);
        let source = lead.response_source.unwrap();
        assert_eq!(source.email.unwrap().normalized, "a@x.com");
        assert_eq!(source.phone.unwrap().normalized, "15550100");
        assert_eq!(lead.comments.last().unwrap().text, "replied on email");

        // The dropped contacts no longer block new intake.
        let dm = Caller::new(UserId("dm-1".into()), Role::DataMiner);
        s.fx.lead(&dm, &["b@x.com"], &["555-0199"]).await;
    }

    #[tokio::test]
    async fn submit_rejects_foreign_or_empty_selection() {
        let s = scene().await;
        s.fx.pipeline
            .set_lq_status(&s.lq, &s.lead, "QUALIFIED")
            .await
            .unwrap();

        for pick in [
            selection(&["zzz@x.com"], &[]),
            selection(&[], &["999"]),
            selection(&[" "], &[]),
        ] {
            let err = s
                .fx
                .pipeline
                .submit_to_manager(&s.lq, &s.lead, &pick)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
        let lead = s.fx.store.get_lead(&s.lead).await.unwrap().unwrap();
        assert_eq!(lead.emails.len(), 2);
        assert_eq!(lead.stage, Stage::Lq);
    }

    #[tokio::test]
    async fn submit_requires_an_approved_reporting_manager() {
        let s = scene().await;
        s.fx.pipeline
            .set_lq_status(&s.lq, &s.lead, "QUALIFIED")
            .await
            .unwrap();
        s.fx.store.set_reports_to(&[s.lq.id.clone()], None).await.unwrap();

        let err = s
            .fx
            .pipeline
            .submit_to_manager(&s.lq, &s.lead, &selection(&["a@x.com"], &[]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
        assert_eq!(err.to_string(), "No manager assigned to you");
    }

    #[tokio::test]
    async fn listing_filters_and_counts() {
        let s = scene().await;
        let all = s
            .fx
            .pipeline
            .list_qualifier_leads(&s.lq, &LqListQuery::default())
            .await
            .unwrap();
        assert_eq!(all.leads.len(), 1);
        assert_eq!(all.pagination.total, 1);
        assert_eq!(all.counts["PENDING"], 1);
        assert_eq!(all.counts["QUALIFIED"], 0);
        assert_eq!(all.counts.len(), 4);

        let query = LqListQuery {
            status: Some("dead".into()),
            today: Some("true".into()),
            ..LqListQuery::default()
        };
        let dead = s
            .fx
            .pipeline
            .list_qualifier_leads(&s.lq, &query)
            .await
            .unwrap();
        assert!(dead.leads.is_empty());
        assert_eq!(dead.pagination.total, 0);
        assert_eq!(dead.counts["PENDING"], 1);

        let bad = LqListQuery {
            status: Some("LOST".into()),
            ..LqListQuery::default()
        };
        let err = s
            .fx
            .pipeline
            .list_qualifier_leads(&s.lq, &bad)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn managers_directory_lists_approved_only() {
        let s = scene().await;
        s.fx.user_with_status("mgr-0", Role::Manager, UserStatus::Pending)
            .await;
        let managers = s.fx.pipeline.managers().await.unwrap();
        assert_eq!(managers.len(), 1);
        assert_eq!(managers[0].id, s.manager.id);
    }
}
