// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistent entities: leads, their embedded records, and user accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{
    EmailStatus, LeadId, LqStatus, PaymentStatus, Role, Stage, UserId, UserStatus,
};

/// Wall-clock instant paired with its display-timezone date and time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamp {
    pub at: DateTime<Utc>,
    /// `YYYY-MM-DD` in the display timezone.
    pub date: String,
    /// `HH:MM:SS` in the display timezone.
    pub time: String,
}

/// One email address attached to a lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadEmail {
    pub value: String,
    pub normalized: String,
    pub status: EmailStatus,
    pub verified_by: Option<UserId>,
    pub verified_at: Option<DateTime<Utc>>,
}

impl LeadEmail {
    pub fn pending(value: String, normalized: String) -> Self {
        Self {
            value,
            normalized,
            status: EmailStatus::Pending,
            verified_by: None,
            verified_at: None,
        }
    }
}

/// Where a lead was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub link: String,
}

/// Append-only note on a lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub text: String,
    pub created_by: UserId,
    pub created_by_role: Role,
    pub created_at: DateTime<Utc>,
    pub created_date: String,
    pub created_time: String,
}

/// A contact chosen as the channel that produced a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRef {
    pub value: String,
    pub normalized: String,
}

/// The email and/or phone the prospect responded through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSource {
    pub email: Option<ContactRef>,
    pub phone: Option<ContactRef>,
    pub selected_by: UserId,
    pub selected_at: DateTime<Utc>,
    pub selected_date: String,
    pub selected_time: String,
}

/// Pending request from a Manager to reject a lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectionRequest {
    pub requested_by: UserId,
    pub requested_at: DateTime<Utc>,
}

/// A payment recorded against a lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Upsale {
    pub amount: f64,
    pub comment: String,
    pub added_by: UserId,
    pub added_at: DateTime<Utc>,
}

/// A prospect moving through the stage machine.
///
/// `version` is not part of the stored document; the storage layer loads it
/// from its own column and bumps it on every successful save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: LeadId,
    pub name: String,
    #[serde(default)]
    pub location: String,
    pub emails: Vec<LeadEmail>,
    pub phones: Vec<String>,
    pub phones_normalized: Vec<String>,
    pub sources: Vec<Source>,
    pub stage: Stage,
    pub status: PaymentStatus,
    pub lq_status: LqStatus,
    pub assigned_to: Option<UserId>,
    pub assigned_to_role: Option<Role>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub verified_completed_at: Option<DateTime<Utc>>,
    pub lq_updated_at: Option<DateTime<Utc>>,
    pub lq_updated_by: Option<UserId>,
    pub response_source: Option<ResponseSource>,
    pub rejection: Option<RejectionRequest>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub upsales: Vec<Upsale>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub submitted_date: String,
    pub submitted_time: String,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub version: i64,
}

impl Lead {
    /// Normalized emails in insertion order.
    pub fn normalized_emails(&self) -> impl Iterator<Item = &str> {
        self.emails.iter().map(|e| e.normalized.as_str())
    }

    /// Appends a comment. Comments are never edited or removed.
    pub fn push_comment(&mut self, text: String, by: &UserId, role: Role, stamp: &Stamp) {
        self.comments.push(Comment {
            text,
            created_by: by.clone(),
            created_by_role: role,
            created_at: stamp.at,
            created_date: stamp.date.clone(),
            created_time: stamp.time.clone(),
        });
    }

    /// Sum of every recorded upsale amount.
    pub fn total_upsell(&self) -> f64 {
        self.upsales.iter().map(|u| u.amount).sum()
    }

    /// Whether `user` currently owns this lead.
    pub fn is_assigned_to(&self, user: &UserId) -> bool {
        self.assigned_to.as_ref() == Some(user)
    }
}

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Option<Role>,
    pub status: UserStatus,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub reports_to: Option<UserId>,
    pub approved_by: Option<UserId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// True when the account is approved and holds `role`.
    pub fn is_approved_as(&self, role: Role) -> bool {
        self.status == UserStatus::Approved && self.role == Some(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamp() -> Stamp {
        Stamp {
            at: Utc::now(),
            date: "2026-01-02".into(),
            time: "10:00:00".into(),
        }
    }

    pub(crate) fn sample_lead() -> Lead {
        let now = Utc::now();
        Lead {
            id: LeadId("lead-1".into()),
            name: "Acme".into(),
            location: String::new(),
            emails: vec![LeadEmail::pending("A@x.com".into(), "a@x.com".into())],
            phones: vec!["+1 (555) 010".into()],
            phones_normalized: vec!["1555010".into()],
            sources: vec![Source {
                name: "web".into(),
                link: "https://acme.example".into(),
            }],
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
            comments: vec![],
            upsales: vec![],
            created_by: UserId("dm-1".into()),
            created_at: now,
            submitted_date: "2026-01-02".into(),
            submitted_time: "10:00:00".into(),
            updated_at: now,
            version: 3,
        }
    }

    #[test]
    fn version_is_not_serialized() {
        let lead = sample_lead();
        let json = serde_json::to_value(&lead).unwrap();
        assert!(json.get("version").is_none());
        assert_eq!(json["stage"], "DM");
        assert_eq!(json["lqStatus"], "PENDING");
        let back: Lead = serde_json::from_value(json).unwrap();
        assert_eq!(back.version, 0);
    }

    #[test]
    fn comments_append_with_author_role() {
        let mut lead = sample_lead();
        lead.push_comment("hi".into(), &UserId("m".into()), Role::Manager, &stamp());
        lead.push_comment("again".into(), &UserId("m".into()), Role::Manager, &stamp());
        assert_eq!(lead.comments.len(), 2);
        assert_eq!(lead.comments[0].text, "hi");
        assert_eq!(lead.comments[1].created_by_role, Role::Manager);
    }

    #[test]
    fn total_upsell_sums_amounts() {
        let mut lead = sample_lead();
        for amount in [100.0, 50.5] {
            lead.upsales.push(Upsale {
                amount,
                comment: "c".into(),
                added_by: UserId("m".into()),
                added_at: Utc::now(),
            });
        }
        assert!((lead.total_upsell() - 150.5).abs() < f64::EPSILON);
    }

    #[test]
    fn password_hash_never_serialized() {
        let user = User {
            id: UserId("u".into()),
            name: "U".into(),
            email: "u@x.com".into(),
            role: Some(Role::Verifier),
            status: UserStatus::Approved,
            password_hash: "secret".into(),
            reports_to: None,
            approved_by: None,
            approved_at: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret"));
        assert!(user.is_approved_as(Role::Verifier));
        assert!(!user.is_approved_as(Role::Manager));
    }
}
